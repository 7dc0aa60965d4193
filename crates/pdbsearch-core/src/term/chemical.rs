use crate::error::{Result, SearchError};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DescriptorType {
    InChI,
    #[serde(rename = "SMILES")]
    Smiles,
}

/// How a chemical descriptor is compared against the component dictionary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChemicalMatchType {
    /// Similar ligands, stereospecific.
    #[default]
    GraphRelaxedStereo,
    /// Similar ligands, including stereoisomers.
    GraphRelaxed,
    /// Similar ligands, quick screen.
    FingerprintSimilarity,
    /// Substructure, stereospecific.
    SubStructGraphRelaxedStereo,
    /// Substructure, including stereoisomers.
    SubStructGraphRelaxed,
    GraphExact,
}

/// Chemical similarity search by formula or by descriptor.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChemSimilarityQuery {
    Formula {
        value: String,
        match_subset: bool,
    },
    Descriptor {
        value: String,
        descriptor_type: DescriptorType,
        match_type: ChemicalMatchType,
    },
}

impl ChemSimilarityQuery {
    /// Molecular formula search, e.g. `C12 H22 O11`. With `match_subset`, the
    /// formula may be part of a larger one.
    pub fn formula(value: impl Into<String>, match_subset: bool) -> Result<Self> {
        Ok(ChemSimilarityQuery::Formula {
            value: non_empty(value.into())?,
            match_subset,
        })
    }

    /// SMILES or InChI descriptor search.
    pub fn descriptor(
        value: impl Into<String>,
        descriptor_type: DescriptorType,
        match_type: ChemicalMatchType,
    ) -> Result<Self> {
        Ok(ChemSimilarityQuery::Descriptor {
            value: non_empty(value.into())?,
            descriptor_type,
            match_type,
        })
    }

    pub fn value(&self) -> &str {
        match self {
            ChemSimilarityQuery::Formula { value, .. } => value,
            ChemSimilarityQuery::Descriptor { value, .. } => value,
        }
    }
}

fn non_empty(value: String) -> Result<String> {
    if value.trim().is_empty() {
        return Err(SearchError::MissingRequiredField {
            field: "value",
            context: "chemical similarity query",
        });
    }
    Ok(value)
}
