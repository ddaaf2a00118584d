//! Parameter-set construction.
//!
//! Every write and lookup statement is assembled from a [`QueryParamSet`]:
//! column names are translated and quoted into the SQL text, values only ever
//! travel as bound parameters behind `$n` placeholders.

use crate::naming::to_snake_case;
use crate::value::DbValue;

/// The three parallel sequences one statement is built from.
///
/// For entries `[("sourceId", guid), ("value", 1718.5)]`:
/// - fields: `["\"source_id\"", "\"value\""]`
/// - values: `[guid, 1718.5]`
/// - placeholders: `["$1", "$2"]`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct QueryParamSet {
    pub fields: Vec<String>,
    pub values: Vec<DbValue>,
    pub placeholders: Vec<String>,
}

impl QueryParamSet {
    /// Build from `(field, value)` entries in application naming,
    /// numbering placeholders from `$1`.
    pub fn build<S: AsRef<str>>(entries: Vec<(S, DbValue)>) -> Self {
        Self::build_from(entries, 1)
    }

    /// Same as [`build`](Self::build) but numbering from `$first`.
    pub fn build_from<S: AsRef<str>>(entries: Vec<(S, DbValue)>, first: usize) -> Self {
        let mut set = Self {
            fields: Vec::with_capacity(entries.len()),
            values: Vec::with_capacity(entries.len()),
            placeholders: Vec::with_capacity(entries.len()),
        };
        for (index, (field, value)) in entries.into_iter().enumerate() {
            set.fields.push(quote_ident(&to_snake_case(field.as_ref())));
            set.values.push(value);
            set.placeholders.push(format!("${}", first + index));
        }
        set
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// `"col"=$n` pairs, as used by `WHERE` conditions and `SET` lists.
    pub fn assignments(&self) -> Vec<String> {
        self.fields
            .iter()
            .zip(&self.placeholders)
            .map(|(field, placeholder)| format!("{field}={placeholder}"))
            .collect()
    }

    /// Values joined for log output.
    pub fn values_for_log(&self) -> String {
        self.values
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Double-quote an identifier, doubling any embedded quote.
pub fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}
