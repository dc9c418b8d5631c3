//! View model contract
//!
//! Screens are application objects behind `Arc<dyn ViewModel>`. The stack
//! compares them by identity, never by value.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::any::{Any, TypeId};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Flat bookmark parameters carried in the URL query string
pub type Parameters = BTreeMap<String, QueryValue>;

/// Shared handle to a screen
pub type ViewModelRef = Arc<dyn ViewModel>;

/// A typed query string value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QueryValue {
    Null,
    Bool(bool),
    Number(f64),
    /// Dates travel as `M/D/YYYY`
    Date(NaiveDate),
    Text(String),
    /// Not representable in a query string, skipped when formatting
    List(Vec<QueryValue>),
}

impl QueryValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            QueryValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            QueryValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            QueryValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            QueryValue::Date(d) => Some(*d),
            _ => None,
        }
    }

    /// Whether the codec can write this value into a URL
    pub fn is_scalar(&self) -> bool {
        !matches!(self, QueryValue::Null | QueryValue::List(_))
    }
}

impl From<&str> for QueryValue {
    fn from(value: &str) -> Self {
        QueryValue::Text(value.to_string())
    }
}

impl From<String> for QueryValue {
    fn from(value: String) -> Self {
        QueryValue::Text(value)
    }
}

impl From<f64> for QueryValue {
    fn from(value: f64) -> Self {
        QueryValue::Number(value)
    }
}

impl From<i32> for QueryValue {
    fn from(value: i32) -> Self {
        QueryValue::Number(f64::from(value))
    }
}

impl From<bool> for QueryValue {
    fn from(value: bool) -> Self {
        QueryValue::Bool(value)
    }
}

impl From<NaiveDate> for QueryValue {
    fn from(value: NaiveDate) -> Self {
        QueryValue::Date(value)
    }
}

/// Opaque id joining a stack entry to its history entry
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateId(String);

impl StateId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for StateId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub trait AsAny {
    fn as_any(&self) -> &dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A navigable screen.
///
/// Every attribute is optional. A plain struct with `impl ViewModel for X {}`
/// is a valid, non-bookmarkable screen.
pub trait ViewModel: AsAny + fmt::Debug + Send + Sync {
    /// Instance-level logical type name. Takes precedence over the resolver's
    /// registration table.
    fn type_name(&self) -> Option<&str> {
        None
    }

    /// Explicit template name, bypassing type name resolution
    fn view_name(&self) -> Option<&str> {
        None
    }

    /// Only bookmarkable screens are written to and rebuilt from URLs
    fn bookmarkable(&self) -> bool {
        false
    }

    fn parameters(&self) -> Parameters {
        Parameters::new()
    }

    /// Expired screens are evicted when history returns to them
    fn expired(&self) -> bool {
        false
    }
}

/// Concrete type of the object behind a view model reference
pub fn type_id_of(view_model: &dyn ViewModel) -> TypeId {
    view_model.as_any().type_id()
}

pub fn downcast_ref<T: Any>(view_model: &dyn ViewModel) -> Option<&T> {
    view_model.as_any().downcast_ref::<T>()
}

pub fn same_item(a: &ViewModelRef, b: &ViewModelRef) -> bool {
    Arc::ptr_eq(a, b)
}

/// Index of `item` in `items` by identity
pub fn position_of(items: &[ViewModelRef], item: &ViewModelRef) -> Option<usize> {
    items.iter().position(|candidate| same_item(candidate, item))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Home;

    impl ViewModel for Home {}

    #[derive(Debug)]
    struct Detail;

    impl ViewModel for Detail {}

    #[test]
    fn test_identity_not_value() {
        let a: ViewModelRef = Arc::new(Home);
        let b: ViewModelRef = Arc::new(Home);

        assert!(same_item(&a, &a.clone()));
        assert!(!same_item(&a, &b));
        assert_eq!(position_of(&[b.clone(), a.clone()], &a), Some(1));
    }

    #[test]
    fn test_concrete_type_id() {
        let home: ViewModelRef = Arc::new(Home);
        let detail: ViewModelRef = Arc::new(Detail);

        assert_eq!(type_id_of(home.as_ref()), TypeId::of::<Home>());
        assert_ne!(type_id_of(detail.as_ref()), TypeId::of::<Home>());
        assert!(downcast_ref::<Detail>(detail.as_ref()).is_some());
    }

    #[test]
    fn test_state_ids_are_unique() {
        assert_ne!(StateId::generate(), StateId::generate());
    }
}
