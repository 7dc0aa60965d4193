use crate::error::{Result, SearchError};
use serde::Serialize;

const MIN_SEQUENCE_RESIDUES: usize = 25;
const MIN_MOTIF_CHARACTERS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SequenceType {
    #[default]
    Protein,
    Dna,
    Rna,
}

/// How a sequence motif pattern is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternType {
    #[default]
    Simple,
    Prosite,
    Regex,
}

/// Sequence similarity search (MMseqs2 on the service side).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SequenceQuery {
    evalue_cutoff: f64,
    identity_cutoff: f64,
    sequence_type: SequenceType,
    value: String,
}

impl SequenceQuery {
    /// A protein sequence query with the service defaults (e-value 0.1, no
    /// identity cutoff).
    pub fn new(value: impl Into<String>) -> Result<Self> {
        Self::with_options(value, SequenceType::Protein, 0.1, 0.0)
    }

    pub fn with_options(
        value: impl Into<String>,
        sequence_type: SequenceType,
        evalue_cutoff: f64,
        identity_cutoff: f64,
    ) -> Result<Self> {
        let value = value.into();
        let residues = value.chars().filter(|c| !c.is_whitespace()).count();
        if residues < MIN_SEQUENCE_RESIDUES {
            return Err(SearchError::OutOfRangeParameter {
                parameter: "value",
                value: format!("{residues} residues"),
                allowed: format!("at least {MIN_SEQUENCE_RESIDUES} residues"),
            });
        }
        if !(0.0..=1.0).contains(&identity_cutoff) {
            return Err(SearchError::OutOfRangeParameter {
                parameter: "identity_cutoff",
                value: identity_cutoff.to_string(),
                allowed: "[0, 1]".to_string(),
            });
        }
        if evalue_cutoff.is_nan() || evalue_cutoff < 0.0 {
            return Err(SearchError::OutOfRangeParameter {
                parameter: "evalue_cutoff",
                value: evalue_cutoff.to_string(),
                allowed: ">= 0".to_string(),
            });
        }
        Ok(Self {
            evalue_cutoff,
            identity_cutoff,
            sequence_type,
            value,
        })
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn sequence_type(&self) -> SequenceType {
        self.sequence_type
    }
}

/// Sequence motif search, e.g. `C-x(2,4)-C-x(3)-[LIVMFYWC]` in PROSITE form.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeqMotifQuery {
    value: String,
    pattern_type: PatternType,
    sequence_type: SequenceType,
}

impl SeqMotifQuery {
    pub fn new(
        value: impl Into<String>,
        pattern_type: PatternType,
        sequence_type: SequenceType,
    ) -> Result<Self> {
        let value = value.into();
        if value.chars().count() < MIN_MOTIF_CHARACTERS {
            return Err(SearchError::OutOfRangeParameter {
                parameter: "value",
                value: format!("{value:?}"),
                allowed: format!("at least {MIN_MOTIF_CHARACTERS} characters"),
            });
        }
        Ok(Self {
            value,
            pattern_type,
            sequence_type,
        })
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn pattern_type(&self) -> PatternType {
        self.pattern_type
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    const HEMOGLOBIN: &str = "VLSPADKTNVKAAWGKVGAHAGEYGAEALERMFLSFPTTKTYFPHF";

    #[test]
    fn sequence_defaults_serialize() {
        let q = SequenceQuery::new(HEMOGLOBIN).unwrap();
        assert_eq!(
            serde_json::to_value(&q).unwrap(),
            json!({
                "evalue_cutoff": 0.1,
                "identity_cutoff": 0.0,
                "sequence_type": "protein",
                "value": HEMOGLOBIN,
            })
        );
    }

    #[test]
    fn sequence_needs_25_residues() {
        assert!(SequenceQuery::new(&HEMOGLOBIN[..24]).is_err());
        assert!(SequenceQuery::new(&HEMOGLOBIN[..25]).is_ok());
    }

    #[test]
    fn sequence_cutoffs_are_bounded() {
        let err = SequenceQuery::with_options(HEMOGLOBIN, SequenceType::Protein, 0.1, 1.5).unwrap_err();
        assert!(matches!(
            err,
            SearchError::OutOfRangeParameter { parameter: "identity_cutoff", .. }
        ));
        let err = SequenceQuery::with_options(HEMOGLOBIN, SequenceType::Dna, -1.0, 0.5).unwrap_err();
        assert!(matches!(
            err,
            SearchError::OutOfRangeParameter { parameter: "evalue_cutoff", .. }
        ));
        assert!(SequenceQuery::with_options(HEMOGLOBIN, SequenceType::Rna, 0.0, 1.0).is_ok());
    }

    #[test]
    fn motif_needs_two_characters() {
        assert!(SeqMotifQuery::new("C", PatternType::Simple, SequenceType::Protein).is_err());
        let q = SeqMotifQuery::new("C-x(2,4)-C", PatternType::Prosite, SequenceType::Protein).unwrap();
        assert_eq!(
            serde_json::to_value(&q).unwrap(),
            json!({"value": "C-x(2,4)-C", "pattern_type": "prosite", "sequence_type": "protein"})
        );
    }
}
