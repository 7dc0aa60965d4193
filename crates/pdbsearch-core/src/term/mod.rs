//! Terminals — atomic search conditions.
//!
//! Each kind of search has its own validated payload struct; [`Terminal`] is
//! the sum over them. Construction validates everything the service would
//! reject, so a `Terminal` that exists is always well-formed. Terminals are
//! immutable: [`Terminal::negate`] returns a new value.

mod attribute;
mod chemical;
mod sequence;
mod structure;

pub use attribute::AttributeQuery;
pub use chemical::{ChemSimilarityQuery, ChemicalMatchType, DescriptorType};
pub use sequence::{PatternType, SeqMotifQuery, SequenceQuery, SequenceType};
pub use structure::{
    AtomPairingScheme, MotifPruningStrategy, Residue, ShapeOperator, StructMotifQuery,
    StructMotifQueryBuilder, StructSimilarityQuery, StructSimilarityQueryBuilder,
    StructureInput, StructureSource, TargetSearchSpace,
};

use crate::attribute::Service;
use crate::error::{Result, SearchError};
use serde::Serialize;
use std::fmt;
use std::path::Path;

/// Comparison operators of attribute queries and facet filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    ExactMatch,
    ContainsPhrase,
    ContainsWords,
    Greater,
    GreaterOrEqual,
    Less,
    LessOrEqual,
    Equals,
    In,
    Exists,
    Range,
}

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::ExactMatch => "exact_match",
            Operator::ContainsPhrase => "contains_phrase",
            Operator::ContainsWords => "contains_words",
            Operator::Greater => "greater",
            Operator::GreaterOrEqual => "greater_or_equal",
            Operator::Less => "less",
            Operator::LessOrEqual => "less_or_equal",
            Operator::Equals => "equals",
            Operator::In => "in",
            Operator::Exists => "exists",
            Operator::Range => "range",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Operator {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self> {
        Ok(match s {
            "exact_match" => Operator::ExactMatch,
            "contains_phrase" => Operator::ContainsPhrase,
            "contains_words" => Operator::ContainsWords,
            "greater" => Operator::Greater,
            "greater_or_equal" => Operator::GreaterOrEqual,
            "less" => Operator::Less,
            "less_or_equal" => Operator::LessOrEqual,
            "equals" => Operator::Equals,
            "in" => Operator::In,
            "exists" => Operator::Exists,
            "range" => Operator::Range,
            other => return Err(SearchError::InvalidOption(format!("unknown operator: {other}"))),
        })
    }
}

// ---------------------------------------------------------------------------
// Full text
// ---------------------------------------------------------------------------

/// Free-text search over all indexed text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FullTextQuery {
    value: String,
}

impl FullTextQuery {
    pub fn new(value: impl Into<String>) -> Result<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(SearchError::MissingRequiredField {
                field: "value",
                context: "full text query",
            });
        }
        Ok(Self { value })
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

// ---------------------------------------------------------------------------
// Terminal
// ---------------------------------------------------------------------------

/// An atomic search condition.
#[derive(Debug, Clone, PartialEq)]
pub enum Terminal {
    FullText(FullTextQuery),
    Attribute(AttributeQuery),
    Sequence(SequenceQuery),
    SeqMotif(SeqMotifQuery),
    StructSimilarity(StructSimilarityQuery),
    StructMotif(StructMotifQuery),
    ChemSimilarity(ChemSimilarityQuery),
}

impl Terminal {
    /// Shorthand for a full-text terminal.
    pub fn full_text(value: impl Into<String>) -> Result<Self> {
        FullTextQuery::new(value).map(Terminal::FullText)
    }

    pub fn service(&self) -> Service {
        match self {
            Terminal::FullText(_) => Service::FullText,
            Terminal::Attribute(q) => q.service(),
            Terminal::Sequence(_) => Service::Sequence,
            Terminal::SeqMotif(_) => Service::SeqMotif,
            Terminal::StructSimilarity(_) => Service::Structure,
            Terminal::StructMotif(_) => Service::StrucMotif,
            Terminal::ChemSimilarity(_) => Service::Chemical,
        }
    }

    pub fn is_negated(&self) -> bool {
        matches!(self, Terminal::Attribute(q) if q.negation())
    }

    /// Flip the negation flag. Only attribute services honor negation; any
    /// other kind is a composition error.
    pub fn negate(&self) -> Result<Terminal> {
        match self {
            Terminal::Attribute(q) => Ok(Terminal::Attribute(q.negated())),
            other => Err(SearchError::UnsupportedNegation(other.service().as_str())),
        }
    }

    /// The `parameters` object of the request document.
    ///
    /// Fails for structure terminals whose local file has not been uploaded
    /// yet; see [`Terminal::resolve_upload`].
    pub fn parameters(&self) -> Result<serde_json::Value> {
        let params = match self {
            Terminal::FullText(q) => serde_json::to_value(q),
            Terminal::Attribute(q) => serde_json::to_value(q),
            Terminal::Sequence(q) => serde_json::to_value(q),
            Terminal::SeqMotif(q) => serde_json::to_value(q),
            Terminal::StructSimilarity(q) => return q.parameters(),
            Terminal::StructMotif(q) => return q.parameters(),
            Terminal::ChemSimilarity(q) => serde_json::to_value(q),
        };
        params.map_err(|e| SearchError::Schema(e.to_string()))
    }

    /// Whether this terminal reads a local file that must be uploaded before
    /// the request can be sent.
    pub fn needs_upload(&self) -> bool {
        match self {
            Terminal::StructSimilarity(q) => q.source().is_local(),
            Terminal::StructMotif(q) => q.source().is_local(),
            _ => false,
        }
    }

    /// Replace a local file source with the URL returned by `upload`.
    ///
    /// `upload` receives the path and file format and returns the URL of the
    /// uploaded copy, which the service reads as `bcif`. Returns `None` when
    /// nothing needed uploading.
    pub fn resolve_upload<F>(&self, upload: F) -> Result<Option<Terminal>>
    where
        F: FnOnce(&Path, &str) -> Result<String>,
    {
        let resolved = match self {
            Terminal::StructSimilarity(q) => match q.source().resolve_upload(upload)? {
                Some(source) => Terminal::StructSimilarity(q.with_source(source)),
                None => return Ok(None),
            },
            Terminal::StructMotif(q) => match q.source().resolve_upload(upload)? {
                Some(source) => Terminal::StructMotif(q.with_source(source)),
                None => return Ok(None),
            },
            _ => return Ok(None),
        };
        Ok(Some(resolved))
    }
}

impl fmt::Display for Terminal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Terminal::FullText(q) => write!(f, "full_text({:?})", q.value()),
            Terminal::Attribute(q) => write!(f, "{q}"),
            Terminal::Sequence(q) => write!(f, "sequence({} residues)", q.value().len()),
            Terminal::SeqMotif(q) => write!(f, "seqmotif({:?})", q.value()),
            Terminal::StructSimilarity(q) => write!(f, "structure({})", q.source()),
            Terminal::StructMotif(q) => {
                write!(f, "strucmotif({}, {} residues)", q.source(), q.residues().len())
            }
            Terminal::ChemSimilarity(q) => write!(f, "chemical({:?})", q.value()),
        }
    }
}

macro_rules! terminal_from {
    ($($variant:ident => $ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Terminal {
                fn from(q: $ty) -> Self {
                    Terminal::$variant(q)
                }
            }
        )*
    };
}

terminal_from! {
    FullText => FullTextQuery,
    Attribute => AttributeQuery,
    Sequence => SequenceQuery,
    SeqMotif => SeqMotifQuery,
    StructSimilarity => StructSimilarityQuery,
    StructMotif => StructMotifQuery,
    ChemSimilarity => ChemSimilarityQuery,
}
