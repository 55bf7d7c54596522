pub mod error;
pub mod field_value;
pub mod geometry;
pub mod join_key;
pub mod record;
pub mod wkt;

pub use error::CoreError;
pub use field_value::FieldValue;
pub use geometry::{Coord, Geometry, Ring};
pub use join_key::{JoinKey, KeyNormalization};
pub use record::*;
