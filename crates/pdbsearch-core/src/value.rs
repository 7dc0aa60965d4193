//! Attribute values and ranges.
//!
//! [`Value`] is the payload of attribute comparisons and facet filters. It
//! serializes to the plain JSON the search service expects (dates as
//! `YYYY-MM-DD`, ranges as `{from, to, include_lower, include_upper}`).

use crate::error::{Result, SearchError};
use chrono::NaiveDate;
use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;

/// A value compared against an attribute.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Date(NaiveDate),
    List(Vec<Value>),
    Range(Range),
}

impl Value {
    /// Numbers and dates: the values ordering operators accept.
    pub fn is_number_like(&self) -> bool {
        matches!(self, Value::Int(_) | Value::Float(_) | Value::Date(_))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Short name of the variant, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Str(_) => "string",
            Value::Int(_) => "integer",
            Value::Float(_) => "float",
            Value::Bool(_) => "boolean",
            Value::Date(_) => "date",
            Value::List(_) => "list",
            Value::Range(_) => "range",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => write!(f, "{s:?}"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Float(n) => write!(f, "{n}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Date(d) => write!(f, "{d}"),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Value::Range(r) => write!(f, "{r}"),
        }
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v.into())
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Int(v.into())
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Value::Date(v)
    }
}

impl From<Range> for Value {
    fn from(v: Range) -> Self {
        Value::Range(v)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value> + Clone> From<&[T]> for Value {
    fn from(v: &[T]) -> Self {
        Value::List(v.iter().cloned().map(Into::into).collect())
    }
}

// ---------------------------------------------------------------------------
// Range
// ---------------------------------------------------------------------------

/// One end of a [`Range`]: a number, or a string (dates and date math such as
/// `now-1y` are strings on the wire).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Bound {
    Number(f64),
    Text(String),
}

impl Bound {
    /// Order two bounds when they are comparable: both numbers, or both ISO
    /// calendar dates. Anything else (date math, mixed kinds) is `None`.
    pub fn partial_cmp_bound(&self, other: &Bound) -> Option<Ordering> {
        match (self, other) {
            (Bound::Number(a), Bound::Number(b)) => a.partial_cmp(b),
            (Bound::Text(a), Bound::Text(b)) => {
                let a = NaiveDate::parse_from_str(a, "%Y-%m-%d").ok()?;
                let b = NaiveDate::parse_from_str(b, "%Y-%m-%d").ok()?;
                Some(a.cmp(&b))
            }
            _ => None,
        }
    }
}

impl fmt::Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bound::Number(n) => write!(f, "{n}"),
            Bound::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<f64> for Bound {
    fn from(v: f64) -> Self {
        Bound::Number(v)
    }
}

impl From<i64> for Bound {
    fn from(v: i64) -> Self {
        Bound::Number(v as f64)
    }
}

impl From<i32> for Bound {
    fn from(v: i32) -> Self {
        Bound::Number(v.into())
    }
}

impl From<&str> for Bound {
    fn from(v: &str) -> Self {
        Bound::Text(v.to_string())
    }
}

impl From<NaiveDate> for Bound {
    fn from(v: NaiveDate) -> Self {
        Bound::Text(v.format("%Y-%m-%d").to_string())
    }
}

/// A half-open interval. Either end may be open.
///
/// Used as the value of the `range` operator and as a bucket of `range` /
/// `date_range` facets. Facet buckets must leave the `include_*` flags unset.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Range {
    #[serde(rename = "from", skip_serializing_if = "Option::is_none")]
    pub start: Option<Bound>,
    #[serde(rename = "to", skip_serializing_if = "Option::is_none")]
    pub end: Option<Bound>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_lower: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_upper: Option<bool>,
}

impl Range {
    pub fn new(start: Option<Bound>, end: Option<Bound>) -> Self {
        Self {
            start,
            end,
            ..Self::default()
        }
    }

    /// `[start, end)`
    pub fn between(start: impl Into<Bound>, end: impl Into<Bound>) -> Self {
        Self::new(Some(start.into()), Some(end.into()))
    }

    /// `[start, ∞)`
    pub fn starting_at(start: impl Into<Bound>) -> Self {
        Self::new(Some(start.into()), None)
    }

    /// `(-∞, end)`
    pub fn ending_at(end: impl Into<Bound>) -> Self {
        Self::new(None, Some(end.into()))
    }

    pub fn include_lower(mut self, include: bool) -> Self {
        self.include_lower = Some(include);
        self
    }

    pub fn include_upper(mut self, include: bool) -> Self {
        self.include_upper = Some(include);
        self
    }

    /// Number bounds must be finite; NaN and infinities have no JSON form.
    pub fn check_bounds(&self) -> Result<()> {
        for bound in [&self.start, &self.end].into_iter().flatten() {
            if let Bound::Number(n) = bound {
                if !n.is_finite() {
                    return Err(SearchError::OutOfRangeParameter {
                        parameter: "range bound",
                        value: n.to_string(),
                        allowed: "a finite number".to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    /// A range with both ends present must have `start < end`.
    pub fn is_ordered(&self) -> bool {
        match (&self.start, &self.end) {
            (Some(start), Some(end)) => !matches!(
                start.partial_cmp_bound(end),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            _ => true,
        }
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lower = if self.include_lower == Some(false) { "(" } else { "[" };
        let upper = if self.include_upper == Some(true) { "]" } else { ")" };
        let start = self.start.as_ref().map(ToString::to_string).unwrap_or_default();
        let end = self.end.as_ref().map(ToString::to_string).unwrap_or_default();
        write!(f, "{lower}{start}, {end}{upper}")
    }
}
