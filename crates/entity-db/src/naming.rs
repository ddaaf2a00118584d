//! Application ⇄ storage name translation.
//!
//! Entities speak camelCase (`sourceId`), tables speak snake_case
//! (`source_id`). The translation is purely syntactic: an uppercase letter
//! becomes `_` + its lowercase form and back again, nothing is renamed.
//!
//! The round trip is exact for names built from lowercase-leading words,
//! digits and single case boundaries. Acronyms (`HTTPCode`) and
//! segments starting with a digit (`a_1b`) fall outside that set.

use crate::Row;

/// Convert an application field name to its storage column name.
///
/// ```
/// use entity_db::naming::to_snake_case;
///
/// assert_eq!(to_snake_case("sourceId"), "source_id");
/// assert_eq!(to_snake_case("value"), "value");
/// ```
pub fn to_snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for ch in name.chars() {
        if ch.is_uppercase() {
            if !out.is_empty() {
                out.push('_');
            }
            out.extend(ch.to_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

/// Convert a storage column name to its application field name.
///
/// ```
/// use entity_db::naming::to_camel_case;
///
/// assert_eq!(to_camel_case("modified_at"), "modifiedAt");
/// assert_eq!(to_camel_case("id"), "id");
/// ```
pub fn to_camel_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper_next = false;
    for ch in name.chars() {
        if ch == '_' && !out.is_empty() {
            upper_next = true;
            continue;
        }
        if upper_next {
            out.extend(ch.to_uppercase());
            upper_next = false;
        } else {
            out.push(ch);
        }
    }
    // a trailing underscore has nothing to capitalize; keep it
    if upper_next {
        out.push('_');
    }
    out
}

/// Rewrite the top-level keys of every row with `convert`.
///
/// Values are moved as-is; JSON payloads stored in a column keep their own
/// key spelling.
pub fn convert_row_keys(rows: Vec<Row>, convert: fn(&str) -> String) -> Vec<Row> {
    rows.into_iter()
        .map(|row| {
            row.into_iter()
                .map(|(key, value)| (convert(&key), value))
                .collect()
        })
        .collect()
}
