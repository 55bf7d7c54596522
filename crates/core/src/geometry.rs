use std::fmt;

use serde::{Deserialize, Serialize};

/// A single `(x, y)` vertex. Both components are finite.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Coord {
    pub x: f64,
    pub y: f64,
}

impl Coord {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl PartialEq for Coord {
    fn eq(&self, other: &Self) -> bool {
        self.x.total_cmp(&other.x).is_eq() && self.y.total_cmp(&other.y).is_eq()
    }
}

impl Eq for Coord {}

/// A closed ring: at least 4 points, first == last.
///
/// Decoding goes through [`Ring::closed`], so serialized rings are held to
/// the same rules as parsed ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "Vec<Coord>", try_from = "Vec<Coord>")]
pub struct Ring(Vec<Coord>);

impl Ring {
    pub const MIN_POINTS: usize = 4;

    /// Closes the ring if needed and checks the point count.
    /// Returns the closed point count on failure.
    pub fn closed(mut points: Vec<Coord>) -> Result<Self, usize> {
        // `-0` and `0` are the same vertex.
        if let (Some(first), Some(last)) = (points.first().copied(), points.last().copied())
            && (first.x != last.x || first.y != last.y)
        {
            points.push(first);
        }
        if points.len() < Self::MIN_POINTS {
            return Err(points.len());
        }
        Ok(Self(points))
    }

    pub fn points(&self) -> &[Coord] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Ring> for Vec<Coord> {
    fn from(ring: Ring) -> Self {
        ring.0
    }
}

impl TryFrom<Vec<Coord>> for Ring {
    type Error = String;

    fn try_from(points: Vec<Coord>) -> Result<Self, Self::Error> {
        if let Some(c) = points.iter().find(|c| !c.x.is_finite() || !c.y.is_finite()) {
            return Err(format!("non-finite coordinate ({} {})", c.x, c.y));
        }
        Ring::closed(points).map_err(|n| {
            format!("ring has {n} points after closing, needs at least {}", Ring::MIN_POINTS)
        })
    }
}

/// A polygon: an outer ring followed by zero or more inner rings.
///
/// Built by [`crate::wkt::parse`] or by decoding, both of which uphold the
/// ring invariants and reject an empty ring list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawGeometry")]
pub struct Geometry {
    rings: Vec<Ring>,
}

#[derive(Deserialize)]
struct RawGeometry {
    rings: Vec<Ring>,
}

impl TryFrom<RawGeometry> for Geometry {
    type Error = String;

    fn try_from(raw: RawGeometry) -> Result<Self, Self::Error> {
        if raw.rings.is_empty() {
            return Err("polygon has no rings".to_string());
        }
        Ok(Self { rings: raw.rings })
    }
}

impl Geometry {
    pub(crate) fn from_rings(rings: Vec<Ring>) -> Self {
        debug_assert!(!rings.is_empty());
        Self { rings }
    }

    pub fn rings(&self) -> &[Ring] {
        &self.rings
    }

    pub fn exterior(&self) -> &Ring {
        &self.rings[0]
    }

    pub fn interiors(&self) -> &[Ring] {
        &self.rings[1..]
    }

    /// Canonical WKT text, e.g. `POLYGON((0 0,0 1,1 1,1 0,0 0))`.
    pub fn to_wkt(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Geometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("POLYGON(")?;
        for (i, ring) in self.rings.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            f.write_str("(")?;
            for (j, c) in ring.points().iter().enumerate() {
                if j > 0 {
                    f.write_str(",")?;
                }
                write!(f, "{} {}", c.x, c.y)?;
            }
            f.write_str(")")?;
        }
        f.write_str(")")
    }
}
