//! Parsed search responses.
//!
//! The service returns results as bare identifier strings (compact
//! verbosity) or as objects with an `identifier`, a `score` and, when
//! verbose, match details. [`ResultHit`] accepts both.

use crate::error::TransportError;
use serde::Deserialize;
use serde_json::{Map, Value};

/// One result row.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "RawHit")]
pub struct ResultHit {
    pub identifier: String,
    pub score: Option<f64>,
    /// Everything else the service sent for this hit.
    pub extra: Map<String, Value>,
}

impl ResultHit {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            score: None,
            extra: Map::new(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawHit {
    Id(String),
    Full {
        identifier: String,
        #[serde(default)]
        score: Option<f64>,
        #[serde(flatten)]
        extra: Map<String, Value>,
    },
}

impl From<RawHit> for ResultHit {
    fn from(raw: RawHit) -> Self {
        match raw {
            RawHit::Id(identifier) => ResultHit::new(identifier),
            RawHit::Full {
                identifier,
                score,
                extra,
            } => ResultHit {
                identifier,
                score,
                extra,
            },
        }
    }
}

/// One aggregation of a facet response.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FacetResult {
    pub name: String,
    #[serde(default, alias = "groups")]
    pub buckets: Vec<FacetBucket>,
    /// Single-valued aggregations (cardinality) report here.
    #[serde(default)]
    pub value: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FacetBucket {
    pub label: Value,
    pub population: u64,
    #[serde(default)]
    pub facets: Vec<FacetResult>,
}

/// One group of a grouped search.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ResultGroup {
    pub identifier: String,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub result_set: Vec<ResultHit>,
}

/// Groups returned by a grouped search.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct GroupedResults {
    #[serde(default)]
    pub total_count: u64,
    #[serde(default)]
    pub group_by_count: u64,
    #[serde(default)]
    pub group_set: Vec<ResultGroup>,
}

/// The parts of a response document this crate reads.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub total_count: u64,
    #[serde(default)]
    pub result_set: Vec<ResultHit>,
    #[serde(default)]
    pub facets: Vec<FacetResult>,
    #[serde(default)]
    pub group_by_count: u64,
    #[serde(default)]
    pub group_set: Vec<ResultGroup>,
}

impl SearchResponse {
    pub fn parse(document: Value) -> Result<Self, TransportError> {
        serde_json::from_value(document).map_err(|e| TransportError::Malformed(e.to_string()))
    }

    pub fn into_groups(self) -> GroupedResults {
        GroupedResults {
            total_count: self.total_count,
            group_by_count: self.group_by_count,
            group_set: self.group_set,
        }
    }
}
