//! Well-known-text reader for `POLYGON` geometries.
//!
//! Only the 2D polygon subtype is accepted. Rings missing their closing point
//! are closed here; a ring that still has fewer than four points is rejected.

use crate::error::CoreError;
use crate::geometry::{Coord, Geometry, Ring};

/// Parse a WKT `POLYGON` into a [`Geometry`].
pub fn parse(text: &str) -> Result<Geometry, CoreError> {
    let mut cursor = Cursor::new(text);
    cursor.skip_ws();

    let keyword_at = cursor.pos;
    let keyword = cursor.word();
    if keyword.is_empty() {
        return Err(CoreError::malformed(keyword_at, "expected geometry type"));
    }
    if !keyword.eq_ignore_ascii_case("POLYGON") {
        return Err(CoreError::malformed(
            keyword_at,
            format!("unsupported geometry type `{keyword}`, expected POLYGON"),
        ));
    }

    cursor.skip_ws();
    let tag_at = cursor.pos;
    let tag = cursor.word();
    if !tag.is_empty() {
        return Err(CoreError::malformed(
            tag_at,
            format!("unsupported POLYGON modifier `{tag}`"),
        ));
    }

    cursor.expect(b'(')?;
    let mut rings = vec![ring(&mut cursor)?];
    while cursor.eat(b',') {
        rings.push(ring(&mut cursor)?);
    }
    cursor.expect(b')')?;

    cursor.skip_ws();
    if !cursor.at_end() {
        return Err(CoreError::malformed(cursor.pos, "trailing input after polygon"));
    }
    Ok(Geometry::from_rings(rings))
}

fn ring(cursor: &mut Cursor<'_>) -> Result<Ring, CoreError> {
    cursor.expect(b'(')?;
    let start = cursor.pos;
    let mut points = vec![coord(cursor)?];
    while cursor.eat(b',') {
        points.push(coord(cursor)?);
    }
    cursor.expect(b')')?;
    Ring::closed(points).map_err(|count| {
        CoreError::malformed(
            start,
            format!(
                "ring has {count} points after closing, needs at least {}",
                Ring::MIN_POINTS
            ),
        )
    })
}

fn coord(cursor: &mut Cursor<'_>) -> Result<Coord, CoreError> {
    let x = cursor.number()?;
    let y = cursor.number()?;
    cursor.skip_ws();
    if cursor.peek().is_some_and(is_number_byte) {
        return Err(CoreError::malformed(
            cursor.pos,
            "coordinate has more than two ordinates",
        ));
    }
    Ok(Coord::new(x, y))
}

fn is_number_byte(b: u8) -> bool {
    b.is_ascii_digit() || matches!(b, b'+' | b'-' | b'.' | b'e' | b'E')
}

struct Cursor<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(text: &'a str) -> Self {
        Self { text, pos: 0 }
    }

    fn peek(&self) -> Option<u8> {
        self.text.as_bytes().get(self.pos).copied()
    }

    fn at_end(&self) -> bool {
        self.pos >= self.text.len()
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(|b| b.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    fn take_while(&mut self, pred: impl Fn(u8) -> bool) -> &'a str {
        let start = self.pos;
        while self.peek().is_some_and(&pred) {
            self.pos += 1;
        }
        &self.text[start..self.pos]
    }

    fn word(&mut self) -> &'a str {
        self.take_while(|b| b.is_ascii_alphabetic())
    }

    fn eat(&mut self, byte: u8) -> bool {
        self.skip_ws();
        if self.peek() == Some(byte) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, byte: u8) -> Result<(), CoreError> {
        if self.eat(byte) {
            return Ok(());
        }
        let found = match self.text[self.pos..].chars().next() {
            Some(c) => format!("`{c}`"),
            None => "end of input".to_string(),
        };
        Err(CoreError::malformed(
            self.pos,
            format!("expected `{}`, found {found}", byte as char),
        ))
    }

    fn number(&mut self) -> Result<f64, CoreError> {
        self.skip_ws();
        let start = self.pos;
        let token = self.take_while(is_number_byte);
        if token.is_empty() {
            return Err(CoreError::malformed(start, "expected a number"));
        }
        match token.parse::<f64>() {
            Ok(value) if value.is_finite() => Ok(value),
            Ok(_) => Err(CoreError::malformed(
                start,
                format!("coordinate `{token}` is not finite"),
            )),
            Err(_) => Err(CoreError::malformed(
                start,
                format!("invalid coordinate `{token}`"),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reason(text: &str) -> String {
        match parse(text) {
            Err(CoreError::MalformedGeometry { reason, .. }) => reason,
            other => panic!("expected malformed geometry, got {other:?}"),
        }
    }

    #[test]
    fn parses_closed_square() {
        let g = parse("POLYGON((0 0,0 1,1 1,1 0,0 0))").unwrap();
        assert_eq!(g.rings().len(), 1);
        assert_eq!(g.exterior().len(), 5);
        assert_eq!(g.exterior().points()[2], Coord::new(1.0, 1.0));
    }

    #[test]
    fn keyword_and_whitespace_are_lenient() {
        let g = parse("  polygon ( ( 0 0 , 0 1 ,\n 1 1 , 0 0 ) )  ").unwrap();
        assert_eq!(g.exterior().len(), 4);
    }

    #[test]
    fn inner_rings_are_kept_in_order() {
        let g = parse("POLYGON((0 0,10 0,10 10,0 10,0 0),(2 2,3 2,3 3,2 2),(5 5,6 5,6 6,5 5))")
            .unwrap();
        assert_eq!(g.rings().len(), 3);
        assert_eq!(g.interiors().len(), 2);
        assert_eq!(g.interiors()[1].points()[0], Coord::new(5.0, 5.0));
    }

    #[test]
    fn open_triangle_is_closed_to_four_points() {
        let g = parse("POLYGON((0 0,0 1,1 1))").unwrap();
        assert_eq!(g.exterior().len(), 4);
        assert_eq!(g.to_wkt(), "POLYGON((0 0,0 1,1 1,0 0))");
    }

    #[test]
    fn negative_zero_counts_as_closing_point() {
        let g = parse("POLYGON((0 0,1 0,1 1,-0 0))").unwrap();
        assert_eq!(g.exterior().len(), 4);
    }

    #[test]
    fn two_point_ring_is_rejected() {
        assert!(reason("POLYGON((0 0,1 1))").contains("3 points after closing"));
    }

    #[test]
    fn scientific_and_signed_coordinates() {
        let g = parse("POLYGON((-1.5e2 +2,1E-3 4,-7 -8,-1.5e2 2))").unwrap();
        assert_eq!(g.exterior().points()[0], Coord::new(-150.0, 2.0));
        assert_eq!(g.exterior().points()[1], Coord::new(0.001, 4.0));
    }

    #[test]
    fn rejects_other_geometry_types() {
        assert!(reason("MULTIPOLYGON(((0 0,0 1,1 1,0 0)))").contains("MULTIPOLYGON"));
        assert!(reason("POINT(1 2)").contains("POINT"));
        assert!(reason("").contains("expected geometry type"));
    }

    #[test]
    fn rejects_empty_and_dimension_tags() {
        assert!(reason("POLYGON EMPTY").contains("EMPTY"));
        assert!(reason("POLYGON Z((0 0 0,0 1 0,1 1 0,0 0 0))").contains("`Z`"));
        assert!(reason("POLYGON((0 0 0,0 1 0,1 1 0,0 0 0))").contains("more than two"));
    }

    #[test]
    fn rejects_bad_coordinates() {
        assert!(reason("POLYGON((0 0,0 x,1 1,0 0))").contains("expected a number"));
        assert!(reason("POLYGON((0 0,0 1,1 1,0))").contains("expected a number"));
        assert!(reason("POLYGON((0 0,0 1e999,1 1,0 0))").contains("not finite"));
        assert!(reason("POLYGON((0 0,0 1-,1 1,0 0))").contains("invalid coordinate"));
    }

    #[test]
    fn rejects_unbalanced_and_trailing_input() {
        assert!(reason("POLYGON((0 0,0 1,1 1,0 0)").contains("end of input"));
        assert!(reason("POLYGON((0 0,0 1,1 1,0 0)) extra").contains("trailing"));
        assert!(reason("POLYGON(0 0,0 1,1 1,0 0)").contains("expected `(`"));
    }

    #[test]
    fn error_offset_points_at_problem() {
        match parse("POLYGON((0 0,0 ?,1 1,0 0))") {
            Err(CoreError::MalformedGeometry { offset, .. }) => assert_eq!(offset, 15),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn parse_is_deterministic() {
        let text = "POLYGON((3.25 1,4 1,4 2,3.25 1))";
        assert_eq!(parse(text).unwrap(), parse(text).unwrap());
    }

    #[test]
    fn canonical_wkt_reparses_to_same_geometry() {
        let g = parse("POLYGON ((0.1 0.2, 0.3 0.4, 0.5 0.6, 0.1 0.2))").unwrap();
        assert_eq!(parse(&g.to_wkt()).unwrap(), g);
    }
}
