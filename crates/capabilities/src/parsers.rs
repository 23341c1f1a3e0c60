//! Value parsers for computed fields.
//!
//! Each [`ParserKind`] turns the positional XPath results of a computed field
//! into one [`Value`]; each [`ReverseParserKind`] splits a value back into
//! one string per input for projection.

use chrono::{DateTime, NaiveDate, Utc};
use geo::BoundingRect;
use thiserror::Error;

use ows_common::{BoundingBox, SrsName};

use crate::mapping::ServiceType;
use crate::record::Value;

/// Known WGS84 SRID for geographic bounding boxes in capabilities.
const WGS84: u32 = 4326;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseValueError {
    #[error("Expected {expected} inputs, got {found}")]
    InputCount { expected: usize, found: usize },

    #[error("Missing input {0}")]
    MissingInput(usize),

    #[error("Invalid number: {0}")]
    InvalidNumber(String),

    #[error("Invalid boolean: {0}")]
    InvalidBoolean(String),

    #[error("Invalid SRS name: {0}")]
    InvalidSrs(String),

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("Unknown service type: {0}")]
    UnknownServiceType(String),

    #[error("Cannot reverse {found} with {parser}")]
    UnexpectedValue {
        parser: &'static str,
        found: &'static str,
    },
}

pub type ParserFn = fn(&[Option<String>]) -> Result<Value, ParseValueError>;
pub type ReverseParserFn = fn(&Value) -> Result<Vec<Option<String>>, ParseValueError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserKind {
    BooleanFromString,
    /// `minx, miny, maxx, maxy` -> WGS84 polygon
    BoundingBoxFromCorners,
    /// `"lon lat"` lower and upper corner -> WGS84 polygon
    BoundingBoxFromOwsCorners,
    SridFromSrsName,
    AuthorityFromSrsName,
    Timestamp,
    ServiceTypeFromName,
}

impl ParserKind {
    pub fn function(self) -> ParserFn {
        match self {
            ParserKind::BooleanFromString => boolean_from_string,
            ParserKind::BoundingBoxFromCorners => bounding_box_from_corners,
            ParserKind::BoundingBoxFromOwsCorners => bounding_box_from_ows_corners,
            ParserKind::SridFromSrsName => srid_from_srs_name,
            ParserKind::AuthorityFromSrsName => authority_from_srs_name,
            ParserKind::Timestamp => timestamp,
            ParserKind::ServiceTypeFromName => service_type_from_name,
        }
    }

    pub fn parse(self, inputs: &[Option<String>]) -> Result<Value, ParseValueError> {
        (self.function())(inputs)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReverseParserKind {
    BooleanToDigit,
    BoundingBoxToCorners,
    BoundingBoxToOwsCorners,
    TimestampToString,
}

impl ReverseParserKind {
    pub fn function(self) -> ReverseParserFn {
        match self {
            ReverseParserKind::BooleanToDigit => boolean_to_digit,
            ReverseParserKind::BoundingBoxToCorners => bounding_box_to_corners,
            ReverseParserKind::BoundingBoxToOwsCorners => bounding_box_to_ows_corners,
            ReverseParserKind::TimestampToString => timestamp_to_string,
        }
    }

    pub fn reverse(self, value: &Value) -> Result<Vec<Option<String>>, ParseValueError> {
        (self.function())(value)
    }
}

// === Parsers ===

fn expect_inputs(inputs: &[Option<String>], expected: usize) -> Result<(), ParseValueError> {
    if inputs.len() != expected {
        return Err(ParseValueError::InputCount {
            expected,
            found: inputs.len(),
        });
    }
    Ok(())
}

fn all_missing(inputs: &[Option<String>]) -> bool {
    inputs.iter().all(Option::is_none)
}

fn required(inputs: &[Option<String>], index: usize) -> Result<&str, ParseValueError> {
    inputs
        .get(index)
        .and_then(|v| v.as_deref())
        .map(str::trim)
        .ok_or(ParseValueError::MissingInput(index))
}

fn number(text: &str) -> Result<f64, ParseValueError> {
    text.trim()
        .parse()
        .map_err(|_| ParseValueError::InvalidNumber(text.to_string()))
}

fn boolean_from_string(inputs: &[Option<String>]) -> Result<Value, ParseValueError> {
    expect_inputs(inputs, 1)?;
    if all_missing(inputs) {
        return Ok(Value::Null);
    }
    let text = required(inputs, 0)?;
    parse_boolean(text).map(Value::Boolean)
}

/// `1`/`0`/`true`/`false`, case-insensitive.
pub fn parse_boolean(text: &str) -> Result<bool, ParseValueError> {
    match text.trim().to_ascii_lowercase().as_str() {
        "1" | "true" => Ok(true),
        "0" | "false" => Ok(false),
        _ => Err(ParseValueError::InvalidBoolean(text.to_string())),
    }
}

fn wgs84_box(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Value {
    Value::Geometry(BoundingBox::new(min_x, min_y, max_x, max_y).to_geometry(Some(WGS84)))
}

fn bounding_box_from_corners(inputs: &[Option<String>]) -> Result<Value, ParseValueError> {
    expect_inputs(inputs, 4)?;
    if all_missing(inputs) {
        return Ok(Value::Null);
    }
    let mut values = [0.0_f64; 4];
    for (index, value) in values.iter_mut().enumerate() {
        *value = number(required(inputs, index)?)?;
    }
    Ok(wgs84_box(values[0], values[1], values[2], values[3]))
}

fn corner(text: &str) -> Result<(f64, f64), ParseValueError> {
    let mut parts = text.split_whitespace();
    match (parts.next(), parts.next(), parts.next()) {
        (Some(x), Some(y), None) => Ok((number(x)?, number(y)?)),
        _ => Err(ParseValueError::InvalidNumber(text.to_string())),
    }
}

fn bounding_box_from_ows_corners(inputs: &[Option<String>]) -> Result<Value, ParseValueError> {
    expect_inputs(inputs, 2)?;
    if all_missing(inputs) {
        return Ok(Value::Null);
    }
    let (min_x, min_y) = corner(required(inputs, 0)?)?;
    let (max_x, max_y) = corner(required(inputs, 1)?)?;
    Ok(wgs84_box(min_x, min_y, max_x, max_y))
}

fn srs_name(inputs: &[Option<String>]) -> Result<Option<SrsName>, ParseValueError> {
    expect_inputs(inputs, 1)?;
    if all_missing(inputs) {
        return Ok(None);
    }
    let text = required(inputs, 0)?;
    SrsName::parse(text)
        .map(Some)
        .map_err(|_| ParseValueError::InvalidSrs(text.to_string()))
}

fn srid_from_srs_name(inputs: &[Option<String>]) -> Result<Value, ParseValueError> {
    Ok(match srs_name(inputs)? {
        Some(name) => Value::Integer(i64::from(name.code)),
        None => Value::Null,
    })
}

fn authority_from_srs_name(inputs: &[Option<String>]) -> Result<Value, ParseValueError> {
    Ok(match srs_name(inputs)? {
        Some(name) => Value::String(name.authority),
        None => Value::Null,
    })
}

fn timestamp(inputs: &[Option<String>]) -> Result<Value, ParseValueError> {
    expect_inputs(inputs, 1)?;
    if all_missing(inputs) {
        return Ok(Value::Null);
    }
    let text = required(inputs, 0)?;
    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Ok(Value::DateTime(parsed.with_timezone(&Utc)));
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Value::DateTime(naive.and_utc()))
        .ok_or_else(|| ParseValueError::InvalidTimestamp(text.to_string()))
}

fn service_type_from_name(inputs: &[Option<String>]) -> Result<Value, ParseValueError> {
    expect_inputs(inputs, 1)?;
    if all_missing(inputs) {
        return Ok(Value::Null);
    }
    let text = required(inputs, 0)?;
    ServiceType::parse(text)
        .map(|service| Value::String(service.as_str().to_string()))
        .ok_or_else(|| ParseValueError::UnknownServiceType(text.to_string()))
}

// === Reverse parsers ===

fn value_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::String(_) => "string",
        Value::Integer(_) => "integer",
        Value::Float(_) => "float",
        Value::Boolean(_) => "boolean",
        Value::DateTime(_) => "timestamp",
        Value::Geometry(_) => "geometry",
    }
}

fn boolean_to_digit(value: &Value) -> Result<Vec<Option<String>>, ParseValueError> {
    match value {
        Value::Boolean(b) => Ok(vec![Some(if *b { "1" } else { "0" }.to_string())]),
        other => Err(ParseValueError::UnexpectedValue {
            parser: "BooleanToDigit",
            found: value_name(other),
        }),
    }
}

fn bounds(value: &Value, parser: &'static str) -> Result<geo::Rect<f64>, ParseValueError> {
    let unexpected = || ParseValueError::UnexpectedValue {
        parser,
        found: value_name(value),
    };
    let geometry = value.as_geometry().ok_or_else(unexpected)?;
    let polygons = geometry.polygons();
    let multi = geo::MultiPolygon::new(polygons.into_iter().cloned().collect());
    multi.bounding_rect().ok_or_else(unexpected)
}

fn bounding_box_to_corners(value: &Value) -> Result<Vec<Option<String>>, ParseValueError> {
    let rect = bounds(value, "BoundingBoxToCorners")?;
    Ok([rect.min().x, rect.min().y, rect.max().x, rect.max().y]
        .iter()
        .map(|v| Some(v.to_string()))
        .collect())
}

fn bounding_box_to_ows_corners(value: &Value) -> Result<Vec<Option<String>>, ParseValueError> {
    let rect = bounds(value, "BoundingBoxToOwsCorners")?;
    Ok(vec![
        Some(format!("{} {}", rect.min().x, rect.min().y)),
        Some(format!("{} {}", rect.max().x, rect.max().y)),
    ])
}

fn timestamp_to_string(value: &Value) -> Result<Vec<Option<String>>, ParseValueError> {
    match value {
        Value::DateTime(dt) => Ok(vec![Some(dt.to_rfc3339())]),
        other => Err(ParseValueError::UnexpectedValue {
            parser: "TimestampToString",
            found: value_name(other),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(values: &[Option<&str>]) -> Vec<Option<String>> {
        values.iter().map(|v| v.map(str::to_string)).collect()
    }

    #[test]
    fn test_boolean() {
        let parse = ParserKind::BooleanFromString;
        assert_eq!(parse.parse(&inputs(&[Some("1")])), Ok(Value::Boolean(true)));
        assert_eq!(parse.parse(&inputs(&[Some("FALSE")])), Ok(Value::Boolean(false)));
        assert_eq!(parse.parse(&inputs(&[None])), Ok(Value::Null));
        assert!(parse.parse(&inputs(&[Some("maybe")])).is_err());
    }

    #[test]
    fn test_bbox_from_corners() {
        let value = ParserKind::BoundingBoxFromCorners
            .parse(&inputs(&[Some("5.8"), Some("47.2"), Some("15.0"), Some("55.1")]))
            .unwrap();
        let geometry = value.as_geometry().unwrap();
        assert_eq!(geometry.srid, Some(4326));

        let corners = ReverseParserKind::BoundingBoxToCorners.reverse(&value).unwrap();
        assert_eq!(corners, inputs(&[Some("5.8"), Some("47.2"), Some("15"), Some("55.1")]));
    }

    #[test]
    fn test_bbox_partial_input_is_error() {
        let result = ParserKind::BoundingBoxFromCorners
            .parse(&inputs(&[Some("5.8"), None, Some("15.0"), Some("55.1")]));
        assert_eq!(result, Err(ParseValueError::MissingInput(1)));
    }

    #[test]
    fn test_bbox_from_ows_corners() {
        let value = ParserKind::BoundingBoxFromOwsCorners
            .parse(&inputs(&[Some("-180 -90"), Some("180 90")]))
            .unwrap();
        let corners = ReverseParserKind::BoundingBoxToOwsCorners.reverse(&value).unwrap();
        assert_eq!(corners, inputs(&[Some("-180 -90"), Some("180 90")]));
        assert!(ParserKind::BoundingBoxFromOwsCorners
            .parse(&inputs(&[Some("1 2 3"), Some("4 5")]))
            .is_err());
    }

    #[test]
    fn test_srs_names() {
        let input = inputs(&[Some("urn:ogc:def:crs:EPSG::25832")]);
        assert_eq!(ParserKind::SridFromSrsName.parse(&input), Ok(Value::Integer(25832)));
        assert_eq!(
            ParserKind::AuthorityFromSrsName.parse(&input),
            Ok(Value::String("EPSG".to_string()))
        );
        assert!(ParserKind::SridFromSrsName.parse(&inputs(&[Some("garbage")])).is_err());
    }

    #[test]
    fn test_timestamp() {
        let value = ParserKind::Timestamp.parse(&inputs(&[Some("2024-01-15")])).unwrap();
        let reversed = ReverseParserKind::TimestampToString.reverse(&value).unwrap();
        assert_eq!(reversed, inputs(&[Some("2024-01-15T00:00:00+00:00")]));
        assert!(ParserKind::Timestamp.parse(&inputs(&[Some("yesterday")])).is_err());
    }

    #[test]
    fn test_service_type() {
        assert_eq!(
            ParserKind::ServiceTypeFromName.parse(&inputs(&[Some("OGC:WMS")])),
            Ok(Value::String("WMS".to_string()))
        );
    }

    #[test]
    fn test_wrong_input_count() {
        assert_eq!(
            ParserKind::BooleanFromString.parse(&[]),
            Err(ParseValueError::InputCount {
                expected: 1,
                found: 0
            })
        );
    }

    #[test]
    fn test_reverse_rejects_wrong_type() {
        assert!(ReverseParserKind::BoundingBoxToCorners
            .reverse(&Value::String("x".to_string()))
            .is_err());
        assert_eq!(
            ReverseParserKind::BooleanToDigit.reverse(&Value::Boolean(false)),
            Ok(vec![Some("0".to_string())])
        );
    }
}
