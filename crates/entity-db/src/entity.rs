//! The `Entity` trait — the contract every stored record type must fulfil.
//!
//! An entity declares its shape once, as a list of [`Field`] descriptors.
//! Statements are built from that closed list, never from runtime
//! inspection of arbitrary values.

use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

use crate::value::DbValue;

/// Describes one persisted field of `T`.
///
/// The extractor returns `None` when the field is *absent* on this instance
/// (it is then left out of every write) and `Some(DbValue::Null)` for an
/// explicit null (written as `NULL`).
pub struct Field<T> {
    name: &'static str,
    extract: fn(&T) -> Option<DbValue>,
}

impl<T> Field<T> {
    /// `name` is the application (camelCase) field name; its column is
    /// derived with [`to_snake_case`](crate::naming::to_snake_case).
    pub const fn new(name: &'static str, extract: fn(&T) -> Option<DbValue>) -> Self {
        Self { name, extract }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn value_of(&self, entity: &T) -> Option<DbValue> {
        (self.extract)(entity)
    }
}

/// A record bound to exactly one table.
///
/// Rows coming back from storage are key-translated to camelCase and then
/// deserialized, so implementors usually carry
/// `#[serde(rename_all = "camelCase")]`.
///
/// ```
/// use entity_db::{DbValue, Entity, Field};
/// use serde::{Deserialize, Serialize};
/// use uuid::Uuid;
///
/// #[derive(Serialize, Deserialize)]
/// #[serde(rename_all = "camelCase")]
/// struct Quote {
///     id: Option<Uuid>,
///     source_id: Option<String>,
///     value: Option<f64>,
/// }
///
/// impl Entity for Quote {
///     fn id(&self) -> Option<Uuid> {
///         self.id
///     }
///
///     fn fields() -> Vec<Field<Self>> {
///         vec![
///             Field::new("id", |q: &Quote| q.id.map(DbValue::from)),
///             Field::new("sourceId", |q: &Quote| q.source_id.clone().map(DbValue::from)),
///             Field::new("value", |q: &Quote| q.value.map(DbValue::from)),
///         ]
///     }
/// }
///
/// let quote = Quote { id: None, source_id: Some("s".into()), value: None };
/// let names: Vec<_> = quote.entries().into_iter().map(|(name, _)| name).collect();
/// assert_eq!(names, vec!["sourceId"]);
/// ```
pub trait Entity: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// The row identifier, when this instance has one.
    fn id(&self) -> Option<Uuid>;

    /// Every persisted field, in declaration order.
    fn fields() -> Vec<Field<Self>>;

    /// `(field, value)` pairs for the fields present on this instance.
    fn entries(&self) -> Vec<(&'static str, DbValue)> {
        Self::fields()
            .iter()
            .filter_map(|field| field.value_of(self).map(|value| (field.name(), value)))
            .collect()
    }
}
