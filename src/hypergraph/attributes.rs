//! Attribute bags for nodes and hyperedges.
//!
//! The original design this models allows arbitrary attributes on nodes and
//! hyperedges. Here attributes are a string-keyed, insertion-ordered map of
//! tagged-union values. The one attribute every hyperedge must have, its
//! weight, doubles as a typed `f64` field on the hyperedge itself for the
//! shortest-path hot loop; the store keeps the field and the bag's
//! `"weight"` entry in sync on every insertion and merge.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::hypergraph::Map;

/// A single attribute value.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum AttrValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

/// Attribute bag: attribute name to value, insertion-ordered.
pub type Attrs = Map<String, AttrValue>;

impl From<bool> for AttrValue {
    fn from(v: bool) -> Self {
        AttrValue::Bool(v)
    }
}

impl From<i64> for AttrValue {
    fn from(v: i64) -> Self {
        AttrValue::Int(v)
    }
}

impl From<f64> for AttrValue {
    fn from(v: f64) -> Self {
        AttrValue::Float(v)
    }
}

impl From<&str> for AttrValue {
    fn from(v: &str) -> Self {
        AttrValue::Text(v.to_owned())
    }
}

impl From<String> for AttrValue {
    fn from(v: String) -> Self {
        AttrValue::Text(v)
    }
}

impl AttrValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttrValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            AttrValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            AttrValue::Float(v) => Some(*v),
            AttrValue::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            AttrValue::Text(v) => Some(v),
            _ => None,
        }
    }
}

/// Builds an [`Attrs`] bag from `(name, value)` pairs.
pub fn attrs<K: Into<String>, V: Into<AttrValue>>(pairs: impl IntoIterator<Item = (K, V)>) -> Attrs {
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{attrs, AttrValue};

    #[test]
    fn conversions_round_trip() {
        assert_eq!(AttrValue::from(true).as_bool(), Some(true));
        assert_eq!(AttrValue::from(7i64).as_int(), Some(7));
        assert_eq!(AttrValue::from(2.5).as_float(), Some(2.5));
        assert_eq!(AttrValue::from(3i64).as_float(), Some(3.0));
        assert_eq!(AttrValue::from("red").as_text(), Some("red"));
        assert_eq!(AttrValue::from(1i64).as_text(), None);
    }

    #[test]
    fn attrs_builder_preserves_insertion_order() {
        let bag = attrs([("color", "red"), ("label", "sink")]);
        let keys: Vec<&str> = bag.keys().map(String::as_str).collect();
        assert_eq!(keys, ["color", "label"]);
    }
}
