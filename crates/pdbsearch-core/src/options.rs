//! Request options — everything about an execution that is not the query.
//!
//! [`RequestOptions`] is built with chained setters and checked as a whole by
//! [`RequestOptions::validate`], which the executor calls before any request
//! is sent.

use crate::error::{Result, SearchError};
use crate::facet::FacetItem;
use serde::Serialize;

/// The kind of object the search returns identifiers for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReturnType {
    #[default]
    Entry,
    Assembly,
    PolymerEntity,
    NonPolymerEntity,
    PolymerInstance,
    MolDefinition,
}

impl ReturnType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReturnType::Entry => "entry",
            ReturnType::Assembly => "assembly",
            ReturnType::PolymerEntity => "polymer_entity",
            ReturnType::NonPolymerEntity => "non_polymer_entity",
            ReturnType::PolymerInstance => "polymer_instance",
            ReturnType::MolDefinition => "mol_definition",
        }
    }
}

impl std::str::FromStr for ReturnType {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self> {
        Ok(match s {
            "entry" => ReturnType::Entry,
            "assembly" => ReturnType::Assembly,
            "polymer_entity" => ReturnType::PolymerEntity,
            "non_polymer_entity" => ReturnType::NonPolymerEntity,
            "polymer_instance" => ReturnType::PolymerInstance,
            "mol_definition" => ReturnType::MolDefinition,
            other => return Err(SearchError::InvalidOption(format!("unknown return type: {other}"))),
        })
    }
}

/// Experimental structures, computed structure models, or both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    Experimental,
    Computational,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verbosity {
    /// Identifiers only.
    #[default]
    Compact,
    /// Identifiers and scores.
    Minimal,
    /// Identifiers, scores and per-service match details.
    Verbose,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sort {
    sort_by: String,
    direction: SortDirection,
}

impl Sort {
    /// Sort by an attribute, or by `score`.
    pub fn new(sort_by: impl Into<String>, direction: SortDirection) -> Result<Self> {
        let sort_by = sort_by.into();
        if sort_by.trim().is_empty() {
            return Err(SearchError::MissingRequiredField {
                field: "sort_by",
                context: "sort",
            });
        }
        Ok(Self { sort_by, direction })
    }

    pub fn asc(sort_by: impl Into<String>) -> Result<Self> {
        Self::new(sort_by, SortDirection::Asc)
    }

    pub fn desc(sort_by: impl Into<String>) -> Result<Self> {
        Self::new(sort_by, SortDirection::Desc)
    }
}

// ---------------------------------------------------------------------------
// Group-by
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupByMethod {
    MatchingDepositGroupId,
    SequenceIdentity,
    MatchingUniprotAccession,
}

impl GroupByMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            GroupByMethod::MatchingDepositGroupId => "matching_deposit_group_id",
            GroupByMethod::SequenceIdentity => "sequence_identity",
            GroupByMethod::MatchingUniprotAccession => "matching_uniprot_accession",
        }
    }

    /// The return type the method groups.
    fn return_type(&self) -> ReturnType {
        match self {
            GroupByMethod::MatchingDepositGroupId => ReturnType::Entry,
            GroupByMethod::SequenceIdentity | GroupByMethod::MatchingUniprotAccession => {
                ReturnType::PolymerEntity
            }
        }
    }
}

const SIMILARITY_CUTOFFS: [u8; 6] = [100, 95, 90, 70, 50, 30];

/// Server-side clustering of the results.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupBy {
    aggregation_method: GroupByMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    similarity_cutoff: Option<u8>,
    #[serde(rename = "ranking_criteria_type", skip_serializing_if = "Option::is_none")]
    ranking: Option<Sort>,
}

impl GroupBy {
    /// Entries deposited together as a group. Entry results only.
    pub fn deposit_group() -> Self {
        Self {
            aggregation_method: GroupByMethod::MatchingDepositGroupId,
            similarity_cutoff: None,
            ranking: None,
        }
    }

    /// Polymer entities clustered at a sequence identity percentage, one of
    /// 100, 95, 90, 70, 50 or 30.
    pub fn sequence_identity(similarity_cutoff: u8) -> Result<Self> {
        if !SIMILARITY_CUTOFFS.contains(&similarity_cutoff) {
            return Err(SearchError::OutOfRangeParameter {
                parameter: "similarity_cutoff",
                value: similarity_cutoff.to_string(),
                allowed: format!("{SIMILARITY_CUTOFFS:?}"),
            });
        }
        Ok(Self {
            aggregation_method: GroupByMethod::SequenceIdentity,
            similarity_cutoff: Some(similarity_cutoff),
            ranking: None,
        })
    }

    /// Polymer entities sharing a UniProt accession.
    pub fn uniprot_accession() -> Self {
        Self {
            aggregation_method: GroupByMethod::MatchingUniprotAccession,
            similarity_cutoff: None,
            ranking: None,
        }
    }

    /// Order members within each group.
    pub fn ranked_by(mut self, sort: Sort) -> Self {
        self.ranking = Some(sort);
        self
    }

    pub fn method(&self) -> GroupByMethod {
        self.aggregation_method
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupByReturnType {
    /// One representative identifier per group.
    Representatives,
    /// Every group with all its members.
    Groups,
}

// ---------------------------------------------------------------------------
// RequestOptions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct RequestOptions {
    pub(crate) return_type: ReturnType,
    pub(crate) rows: Option<usize>,
    pub(crate) limit: Option<usize>,
    pub(crate) sort: Vec<Sort>,
    pub(crate) facets: Vec<FacetItem>,
    pub(crate) group_by: Option<GroupBy>,
    pub(crate) group_by_return_type: Option<GroupByReturnType>,
    pub(crate) content_types: Vec<ContentType>,
    pub(crate) verbosity: Verbosity,
    pub(crate) return_all_hits: bool,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self::new(ReturnType::Entry)
    }
}

impl RequestOptions {
    /// Compact experimental results of `return_type`.
    pub fn new(return_type: ReturnType) -> Self {
        Self {
            return_type,
            rows: None,
            limit: None,
            sort: Vec::new(),
            facets: Vec::new(),
            group_by: None,
            group_by_return_type: None,
            content_types: vec![ContentType::Experimental],
            verbosity: Verbosity::Compact,
            return_all_hits: false,
        }
    }

    /// Page size. Defaults to the executor's configured size.
    pub fn rows(mut self, rows: usize) -> Self {
        self.rows = Some(rows);
        self
    }

    /// Stop after this many results.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn sort(mut self, sort: Sort) -> Self {
        self.sort.push(sort);
        self
    }

    pub fn facet(mut self, facet: impl Into<FacetItem>) -> Self {
        self.facets.push(facet.into());
        self
    }

    pub fn group_by(mut self, group_by: GroupBy) -> Self {
        self.group_by = Some(group_by);
        self
    }

    pub fn group_by_return_type(mut self, return_type: GroupByReturnType) -> Self {
        self.group_by_return_type = Some(return_type);
        self
    }

    /// Replace the content types searched.
    pub fn content_types(mut self, types: impl IntoIterator<Item = ContentType>) -> Self {
        self.content_types = types.into_iter().collect();
        self
    }

    pub fn verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Return every hit instead of the service's default cap.
    pub fn return_all_hits(mut self, all: bool) -> Self {
        self.return_all_hits = all;
        self
    }

    pub fn return_type(&self) -> ReturnType {
        self.return_type
    }

    pub fn facets(&self) -> &[FacetItem] {
        &self.facets
    }

    pub fn group_by_options(&self) -> Option<&GroupBy> {
        self.group_by.as_ref()
    }

    /// Check option combinations the service would reject.
    pub fn validate(&self) -> Result<()> {
        if self.rows == Some(0) {
            return Err(SearchError::OutOfRangeParameter {
                parameter: "rows",
                value: "0".to_string(),
                allowed: ">= 1".to_string(),
            });
        }
        if self.limit == Some(0) {
            return Err(SearchError::OutOfRangeParameter {
                parameter: "limit",
                value: "0".to_string(),
                allowed: ">= 1".to_string(),
            });
        }
        if self.content_types.is_empty() {
            return Err(SearchError::InvalidOption(
                "results_content_type needs at least one content type".to_string(),
            ));
        }
        if let Some(group_by) = &self.group_by {
            let required = group_by.aggregation_method.return_type();
            if self.return_type != required {
                return Err(SearchError::InvalidOption(format!(
                    "group_by {} needs return type {}, not {}",
                    group_by.aggregation_method.as_str(),
                    required.as_str(),
                    self.return_type.as_str()
                )));
            }
        } else if self.group_by_return_type.is_some() {
            return Err(SearchError::InvalidOption(
                "group_by_return_type needs group_by".to_string(),
            ));
        }
        Ok(())
    }
}
