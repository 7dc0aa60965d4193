//! Facets — server-side aggregations of the matching results.
//!
//! A [`Facet`] buckets results by one attribute. A [`FilterFacet`] restricts
//! the results a set of nested facets sees. Both are validated when built and
//! serialize to the `request_options.facets` entries of a request.

use crate::attribute::Service;
use crate::error::{Result, SearchError};
use crate::query::LogicalOperator;
use crate::term::{AttributeQuery, Operator};
use crate::value::{Range, Value};
use serde::Serialize;

const DEFAULT_MIN_INTERVAL_POPULATION: u64 = 1;
const MAX_NUM_INTERVALS: u64 = 65_536;
const MAX_PRECISION_THRESHOLD: u64 = 40_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationType {
    Terms,
    Histogram,
    DateHistogram,
    Range,
    DateRange,
    Cardinality,
}

impl AggregationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AggregationType::Terms => "terms",
            AggregationType::Histogram => "histogram",
            AggregationType::DateHistogram => "date_histogram",
            AggregationType::Range => "range",
            AggregationType::DateRange => "date_range",
            AggregationType::Cardinality => "cardinality",
        }
    }
}

/// Bucket width: a number for `histogram`, a calendar unit (`year`, `month`,
/// `week`, `day`) for `date_histogram`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Interval {
    Number(f64),
    Calendar(String),
}

impl From<f64> for Interval {
    fn from(v: f64) -> Self {
        Interval::Number(v)
    }
}

impl From<i64> for Interval {
    fn from(v: i64) -> Self {
        Interval::Number(v as f64)
    }
}

impl From<i32> for Interval {
    fn from(v: i32) -> Self {
        Interval::Number(v.into())
    }
}

impl From<&str> for Interval {
    fn from(v: &str) -> Self {
        Interval::Calendar(v.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Facet {
    name: String,
    aggregation_type: AggregationType,
    attribute: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    interval: Option<Interval>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    ranges: Vec<Range>,
    #[serde(skip_serializing_if = "Option::is_none")]
    min_interval_population: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_num_intervals: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    precision_threshold: Option<u64>,
    #[serde(rename = "facets", skip_serializing_if = "Vec::is_empty")]
    nested: Vec<FacetItem>,
}

impl Facet {
    pub fn builder(
        name: impl Into<String>,
        aggregation_type: AggregationType,
        attribute: impl Into<String>,
    ) -> FacetBuilder {
        FacetBuilder {
            name: name.into(),
            aggregation_type,
            attribute: attribute.into(),
            interval: None,
            ranges: Vec::new(),
            min_interval_population: None,
            max_num_intervals: None,
            precision_threshold: None,
            nested: Vec::new(),
        }
    }

    /// Buckets per distinct value.
    pub fn terms(name: impl Into<String>, attribute: impl Into<String>) -> Result<Self> {
        Self::builder(name, AggregationType::Terms, attribute).build()
    }

    pub fn histogram(
        name: impl Into<String>,
        attribute: impl Into<String>,
        interval: impl Into<Interval>,
    ) -> Result<Self> {
        Self::builder(name, AggregationType::Histogram, attribute)
            .interval(interval)
            .build()
    }

    pub fn date_histogram(
        name: impl Into<String>,
        attribute: impl Into<String>,
        interval: impl Into<String>,
    ) -> Result<Self> {
        Self::builder(name, AggregationType::DateHistogram, attribute)
            .interval(Interval::Calendar(interval.into()))
            .build()
    }

    pub fn range(
        name: impl Into<String>,
        attribute: impl Into<String>,
        ranges: impl IntoIterator<Item = Range>,
    ) -> Result<Self> {
        Self::builder(name, AggregationType::Range, attribute)
            .ranges(ranges)
            .build()
    }

    pub fn date_range(
        name: impl Into<String>,
        attribute: impl Into<String>,
        ranges: impl IntoIterator<Item = Range>,
    ) -> Result<Self> {
        Self::builder(name, AggregationType::DateRange, attribute)
            .ranges(ranges)
            .build()
    }

    /// Approximate count of distinct values.
    pub fn cardinality(name: impl Into<String>, attribute: impl Into<String>) -> Result<Self> {
        Self::builder(name, AggregationType::Cardinality, attribute).build()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn aggregation_type(&self) -> AggregationType {
        self.aggregation_type
    }
}

#[derive(Debug, Clone)]
pub struct FacetBuilder {
    name: String,
    aggregation_type: AggregationType,
    attribute: String,
    interval: Option<Interval>,
    ranges: Vec<Range>,
    min_interval_population: Option<u64>,
    max_num_intervals: Option<u64>,
    precision_threshold: Option<u64>,
    nested: Vec<FacetItem>,
}

impl FacetBuilder {
    pub fn interval(mut self, interval: impl Into<Interval>) -> Self {
        self.interval = Some(interval.into());
        self
    }

    pub fn ranges(mut self, ranges: impl IntoIterator<Item = Range>) -> Self {
        self.ranges.extend(ranges);
        self
    }

    pub fn min_interval_population(mut self, n: u64) -> Self {
        self.min_interval_population = Some(n);
        self
    }

    pub fn max_num_intervals(mut self, n: u64) -> Self {
        self.max_num_intervals = Some(n);
        self
    }

    pub fn precision_threshold(mut self, n: u64) -> Self {
        self.precision_threshold = Some(n);
        self
    }

    /// Aggregate each bucket further.
    pub fn nested(mut self, facet: impl Into<FacetItem>) -> Self {
        self.nested.push(facet.into());
        self
    }

    pub fn build(self) -> Result<Facet> {
        if self.name.trim().is_empty() {
            return Err(SearchError::MissingRequiredField {
                field: "name",
                context: "facet",
            });
        }
        if self.attribute.trim().is_empty() {
            return Err(SearchError::MissingRequiredField {
                field: "attribute",
                context: "facet",
            });
        }
        let kind = self.aggregation_type;
        let not_for = |option: &str| {
            SearchError::InvalidOption(format!(
                "`{option}` does not apply to {} facets",
                kind.as_str()
            ))
        };

        match (kind, &self.interval) {
            (AggregationType::Histogram, Some(Interval::Number(n))) if *n > 0.0 => {}
            (AggregationType::Histogram, Some(Interval::Number(n))) => {
                return Err(SearchError::OutOfRangeParameter {
                    parameter: "interval",
                    value: n.to_string(),
                    allowed: "> 0".to_string(),
                })
            }
            (AggregationType::DateHistogram, Some(Interval::Calendar(unit))) if !unit.trim().is_empty() => {}
            (AggregationType::Histogram | AggregationType::DateHistogram, Some(other)) => {
                return Err(SearchError::InvalidOption(format!(
                    "interval {other:?} does not suit a {} facet",
                    kind.as_str()
                )))
            }
            (AggregationType::Histogram | AggregationType::DateHistogram, None) => {
                return Err(SearchError::MissingRequiredField {
                    field: "interval",
                    context: "histogram facet",
                })
            }
            (_, Some(_)) => return Err(not_for("interval")),
            (_, None) => {}
        }

        match kind {
            AggregationType::Range | AggregationType::DateRange => {
                if self.ranges.is_empty() {
                    return Err(SearchError::MissingRequiredField {
                        field: "ranges",
                        context: "range facet",
                    });
                }
                for r in &self.ranges {
                    r.check_bounds()?;
                    if r.start.is_none() && r.end.is_none() {
                        return Err(SearchError::InvalidOption(
                            "facet range has neither end".to_string(),
                        ));
                    }
                    if !r.is_ordered() {
                        return Err(SearchError::InvalidOption(format!(
                            "facet range {r} is empty"
                        )));
                    }
                    if r.include_lower.is_some() || r.include_upper.is_some() {
                        return Err(SearchError::InvalidOption(format!(
                            "facet range {r} must not set include_lower/include_upper"
                        )));
                    }
                }
            }
            _ if !self.ranges.is_empty() => return Err(not_for("ranges")),
            _ => {}
        }

        let min_interval_population = match (kind, self.min_interval_population) {
            (AggregationType::Terms | AggregationType::Histogram | AggregationType::DateHistogram, n) => Some(n.unwrap_or(DEFAULT_MIN_INTERVAL_POPULATION)),
            (_, Some(_)) => return Err(not_for("min_interval_population")),
            (_, None) => None,
        };

        let max_num_intervals = match (kind, self.max_num_intervals) {
            (AggregationType::Terms, Some(n)) if n > MAX_NUM_INTERVALS => {
                return Err(SearchError::OutOfRangeParameter {
                    parameter: "max_num_intervals",
                    value: n.to_string(),
                    allowed: format!("<= {MAX_NUM_INTERVALS}"),
                })
            }
            (AggregationType::Terms, n) => Some(n.unwrap_or(MAX_NUM_INTERVALS)),
            (_, Some(_)) => return Err(not_for("max_num_intervals")),
            (_, None) => None,
        };

        let precision_threshold = match (kind, self.precision_threshold) {
            (AggregationType::Cardinality, Some(n)) if n > MAX_PRECISION_THRESHOLD => {
                return Err(SearchError::OutOfRangeParameter {
                    parameter: "precision_threshold",
                    value: n.to_string(),
                    allowed: format!("<= {MAX_PRECISION_THRESHOLD}"),
                })
            }
            (AggregationType::Cardinality, n) => Some(n.unwrap_or(MAX_PRECISION_THRESHOLD)),
            (_, Some(_)) => return Err(not_for("precision_threshold")),
            (_, None) => None,
        };

        Ok(Facet {
            name: self.name,
            aggregation_type: kind,
            attribute: self.attribute,
            interval: self.interval,
            ranges: self.ranges,
            min_interval_population,
            max_num_intervals,
            precision_threshold,
            nested: self.nested,
        })
    }
}

/// An entry of a facet list: a plain facet or a filter facet.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FacetItem {
    Facet(Facet),
    Filter(FilterFacet),
}

impl From<Facet> for FacetItem {
    fn from(f: Facet) -> Self {
        FacetItem::Facet(f)
    }
}

impl From<FilterFacet> for FacetItem {
    fn from(f: FilterFacet) -> Self {
        FacetItem::Filter(f)
    }
}

// ---------------------------------------------------------------------------
// Filters
// ---------------------------------------------------------------------------

/// Filter applied before the nested facets aggregate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterFacet {
    filter: Filter,
    facets: Vec<FacetItem>,
}

impl FilterFacet {
    pub fn new(
        filter: impl Into<Filter>,
        facets: impl IntoIterator<Item = FacetItem>,
    ) -> Result<Self> {
        let facets: Vec<FacetItem> = facets.into_iter().collect();
        if facets.is_empty() {
            return Err(SearchError::MissingRequiredField {
                field: "facets",
                context: "filter facet",
            });
        }
        Ok(Self {
            filter: filter.into(),
            facets,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Filter {
    Terminal(TerminalFilter),
    Group(GroupFilter),
}

impl From<TerminalFilter> for Filter {
    fn from(f: TerminalFilter) -> Self {
        Filter::Terminal(f)
    }
}

impl From<GroupFilter> for Filter {
    fn from(f: GroupFilter) -> Self {
        Filter::Group(f)
    }
}

/// An attribute condition on the structure attribute service. Text
/// operators (`contains_*`) are not available in filters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TerminalFilter {
    service: Service,
    parameters: FilterParameters,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
struct FilterParameters {
    attribute: String,
    operator: Operator,
    negation: bool,
    case_sensitive: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<Value>,
}

impl TerminalFilter {
    pub fn new(attribute: impl Into<String>, operator: Operator, value: Option<Value>) -> Result<Self> {
        let attribute = attribute.into();
        if matches!(operator, Operator::ContainsPhrase | Operator::ContainsWords) {
            return Err(SearchError::InvalidOperatorForAttribute {
                attribute,
                operator: operator.to_string(),
                reason: "not available in facet filters".to_string(),
            });
        }
        // Same value rules as an attribute query.
        AttributeQuery::new(attribute.clone(), operator, value.clone(), Service::Text)?;
        Ok(Self {
            service: Service::Text,
            parameters: FilterParameters {
                attribute,
                operator,
                negation: false,
                case_sensitive: false,
                value,
            },
        })
    }

    pub fn negated(mut self) -> Self {
        self.parameters.negation = !self.parameters.negation;
        self
    }

    pub fn case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.parameters.case_sensitive = case_sensitive;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupFilter {
    logical_operator: LogicalOperator,
    nodes: Vec<Filter>,
}

impl GroupFilter {
    pub fn new(
        logical_operator: LogicalOperator,
        nodes: impl IntoIterator<Item = Filter>,
    ) -> Result<Self> {
        let nodes: Vec<Filter> = nodes.into_iter().collect();
        if nodes.len() < 2 {
            return Err(SearchError::InvalidOption(format!(
                "a filter group needs at least two nodes, got {}",
                nodes.len()
            )));
        }
        Ok(Self {
            logical_operator,
            nodes,
        })
    }
}
