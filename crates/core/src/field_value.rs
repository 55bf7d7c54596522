use serde::{Deserialize, Serialize};

use crate::geometry::Geometry;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum FieldValue {
    Null,
    Text(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Bytes(Vec<u8>),
    Geometry(Geometry),
}

impl PartialEq for FieldValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::Integer(a), Self::Integer(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a.total_cmp(b).is_eq(),
            (Self::Boolean(a), Self::Boolean(b)) => a == b,
            (Self::Bytes(a), Self::Bytes(b)) => a == b,
            (Self::Geometry(a), Self::Geometry(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for FieldValue {}

impl FieldValue {
    /// Text used when this value acts as a join identifier.
    /// `None` for values that cannot identify a row.
    pub fn key_text(&self) -> Option<String> {
        match self {
            FieldValue::Text(s) => Some(s.clone()),
            FieldValue::Integer(n) => Some(n.to_string()),
            FieldValue::Float(f) => Some(f.to_string()),
            FieldValue::Boolean(b) => Some(b.to_string()),
            FieldValue::Null | FieldValue::Bytes(_) | FieldValue::Geometry(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wkt;

    #[test]
    fn float_equality_is_bitwise() {
        assert_eq!(FieldValue::Float(f64::NAN), FieldValue::Float(f64::NAN));
        assert_ne!(FieldValue::Float(0.0), FieldValue::Float(-0.0));
        assert_ne!(FieldValue::Integer(1), FieldValue::Float(1.0));
    }

    #[test]
    fn key_text_by_variant() {
        assert_eq!(FieldValue::Integer(42).key_text().as_deref(), Some("42"));
        assert_eq!(FieldValue::Float(42.0).key_text().as_deref(), Some("42"));
        assert_eq!(FieldValue::Text("Ames".into()).key_text().as_deref(), Some("Ames"));
        assert_eq!(FieldValue::Null.key_text(), None);
        assert_eq!(FieldValue::Bytes(vec![1]).key_text(), None);
    }

    #[test]
    fn msgpack_keeps_geometry() {
        let geometry = wkt::parse("POLYGON((0 0,0 1,1 1,0 0))").unwrap();
        let value = FieldValue::Geometry(geometry);
        let bytes = rmp_serde::to_vec(&value).unwrap();
        assert_eq!(rmp_serde::from_slice::<FieldValue>(&bytes).unwrap(), value);
    }
}
