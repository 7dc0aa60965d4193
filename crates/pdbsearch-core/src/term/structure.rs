//! Structure similarity and structure motif terminals.
//!
//! Both read a query structure from exactly one [`StructureSource`]. Local
//! files cannot be sent to the service directly; the session uploads them
//! first (see [`StructureSource::resolve_upload`]).

use crate::error::{Result, SearchError};
use serde::Serialize;
use serde_json::{json, Map};
use std::fmt;
use std::path::{Path, PathBuf};

const MIN_MOTIF_RESIDUES: usize = 2;
const MAX_MOTIF_RESIDUES: usize = 10;
const MAX_EXCHANGES_PER_RESIDUE: usize = 4;
const MAX_EXCHANGES_PER_QUERY: usize = 16;
const MAX_TOLERANCE: u8 = 3;

/// Format the service reads uploaded files as.
const UPLOADED_FORMAT: &str = "bcif";

/// Residue codes allowed as motif exchanges: the standard amino acids,
/// nucleotides and the unknown placeholders.
static EXCHANGE_CODES: phf::Set<&'static str> = phf::phf_set! {
    "ALA", "CYS", "ASP", "GLU", "PHE", "GLY", "HIS", "ILE", "LYS", "LEU",
    "MET", "ASN", "PYL", "PRO", "GLN", "ARG", "SER", "THR", "SEC", "VAL",
    "TRP", "TYR",
    "DA", "DC", "DG", "DI", "DT", "DU",
    "A", "C", "G", "I", "U",
    "UNK", "N",
};

// ---------------------------------------------------------------------------
// Source
// ---------------------------------------------------------------------------

/// Where the query structure comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum StructureSource {
    EntryId(String),
    FileUrl { url: String, format: String },
    FilePath { path: PathBuf, format: String },
}

impl StructureSource {
    /// Pick the source from optional fields, exactly one of which must be set.
    /// File sources also need a format such as `cif`, `bcif` or `pdb`.
    pub fn from_fields(
        entry_id: Option<String>,
        file_url: Option<String>,
        file_path: Option<PathBuf>,
        format: Option<String>,
        context: &'static str,
    ) -> Result<Self> {
        let mut set = Vec::new();
        if entry_id.is_some() {
            set.push("entry_id");
        }
        if file_url.is_some() {
            set.push("file_url");
        }
        if file_path.is_some() {
            set.push("file_path");
        }
        if set.len() > 1 {
            return Err(SearchError::ConflictingFields { fields: set, context });
        }

        let format = format.filter(|f| !f.trim().is_empty());
        let require_format = || {
            format.clone().ok_or(SearchError::MissingRequiredField {
                field: "file_format",
                context,
            })
        };

        match (entry_id, file_url, file_path) {
            (Some(id), _, _) if !id.trim().is_empty() => Ok(StructureSource::EntryId(id)),
            (None, Some(url), _) if !url.trim().is_empty() => Ok(StructureSource::FileUrl {
                url,
                format: require_format()?,
            }),
            (None, None, Some(path)) => Ok(StructureSource::FilePath {
                path,
                format: require_format()?,
            }),
            _ => Err(SearchError::MissingRequiredField {
                field: "entry_id, file_url or file_path",
                context,
            }),
        }
    }

    pub fn is_local(&self) -> bool {
        matches!(self, StructureSource::FilePath { .. })
    }

    /// Upload a local file and return the equivalent URL source.
    ///
    /// `upload` gets the path and the file's own format and returns the
    /// download URL. Returns `None` for sources that are not local.
    pub fn resolve_upload<F>(&self, upload: F) -> Result<Option<StructureSource>>
    where
        F: FnOnce(&Path, &str) -> Result<String>,
    {
        match self {
            StructureSource::FilePath { path, format } => {
                let url = upload(path, format)?;
                Ok(Some(StructureSource::FileUrl {
                    url,
                    format: UPLOADED_FORMAT.to_string(),
                }))
            }
            _ => Ok(None),
        }
    }

    /// The `value` object for remote sources, without the similarity input
    /// selector. Local files have no wire form.
    fn base_value(&self) -> Result<Map<String, serde_json::Value>> {
        let mut value = Map::new();
        match self {
            StructureSource::EntryId(id) => {
                value.insert("entry_id".into(), json!(id));
            }
            StructureSource::FileUrl { url, format } => {
                value.insert("url".into(), json!(url));
                value.insert("format".into(), json!(format));
            }
            StructureSource::FilePath { .. } => {
                return Err(SearchError::MissingRequiredField {
                    field: "file_url",
                    context: "structure file that has not been uploaded",
                })
            }
        }
        Ok(value)
    }
}

impl fmt::Display for StructureSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StructureSource::EntryId(id) => f.write_str(id),
            StructureSource::FileUrl { url, .. } => f.write_str(url),
            StructureSource::FilePath { path, .. } => write!(f, "{}", path.display()),
        }
    }
}

// ---------------------------------------------------------------------------
// Structure similarity
// ---------------------------------------------------------------------------

/// Which part of an entry is compared. Ignored for file sources.
#[derive(Debug, Clone, PartialEq)]
pub enum StructureInput {
    AssemblyId(String),
    ChainId(String),
}

impl Default for StructureInput {
    fn default() -> Self {
        StructureInput::AssemblyId("1".to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeOperator {
    #[default]
    StrictShapeMatch,
    RelaxedShapeMatch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetSearchSpace {
    #[default]
    Assembly,
    PolymerEntityInstance,
}

/// Global shape similarity (BioZernike descriptors).
#[derive(Debug, Clone, PartialEq)]
pub struct StructSimilarityQuery {
    source: StructureSource,
    input: StructureInput,
    operator: ShapeOperator,
    target_search_space: TargetSearchSpace,
}

impl StructSimilarityQuery {
    pub fn builder() -> StructSimilarityQueryBuilder {
        StructSimilarityQueryBuilder::default()
    }

    /// Compare against assembly 1 of an entry with the default settings.
    pub fn entry(entry_id: impl Into<String>) -> Result<Self> {
        Self::builder().entry_id(entry_id).build()
    }

    pub fn source(&self) -> &StructureSource {
        &self.source
    }

    pub fn operator(&self) -> ShapeOperator {
        self.operator
    }

    pub fn with_source(&self, source: StructureSource) -> Self {
        Self {
            source,
            ..self.clone()
        }
    }

    pub fn parameters(&self) -> Result<serde_json::Value> {
        let mut value = self.source.base_value()?;
        if let StructureSource::EntryId(_) = self.source {
            match &self.input {
                StructureInput::AssemblyId(id) => value.insert("assembly_id".into(), json!(id)),
                StructureInput::ChainId(id) => value.insert("asym_id".into(), json!(id)),
            };
        }
        Ok(json!({
            "operator": self.operator,
            "target_search_space": self.target_search_space,
            "value": value,
        }))
    }
}

#[derive(Debug, Clone, Default)]
pub struct StructSimilarityQueryBuilder {
    entry_id: Option<String>,
    file_url: Option<String>,
    file_path: Option<PathBuf>,
    file_format: Option<String>,
    input: StructureInput,
    operator: ShapeOperator,
    target_search_space: TargetSearchSpace,
}

impl StructSimilarityQueryBuilder {
    pub fn entry_id(mut self, id: impl Into<String>) -> Self {
        self.entry_id = Some(id.into());
        self
    }

    pub fn file_url(mut self, url: impl Into<String>) -> Self {
        self.file_url = Some(url.into());
        self
    }

    pub fn file_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.file_path = Some(path.into());
        self
    }

    pub fn file_format(mut self, format: impl Into<String>) -> Self {
        self.file_format = Some(format.into());
        self
    }

    pub fn assembly_id(mut self, id: impl Into<String>) -> Self {
        self.input = StructureInput::AssemblyId(id.into());
        self
    }

    pub fn chain_id(mut self, id: impl Into<String>) -> Self {
        self.input = StructureInput::ChainId(id.into());
        self
    }

    pub fn operator(mut self, operator: ShapeOperator) -> Self {
        self.operator = operator;
        self
    }

    pub fn target_search_space(mut self, space: TargetSearchSpace) -> Self {
        self.target_search_space = space;
        self
    }

    pub fn build(self) -> Result<StructSimilarityQuery> {
        let source = StructureSource::from_fields(
            self.entry_id,
            self.file_url,
            self.file_path,
            self.file_format,
            "structure similarity query",
        )?;
        Ok(StructSimilarityQuery {
            source,
            input: self.input,
            operator: self.operator,
            target_search_space: self.target_search_space,
        })
    }
}

// ---------------------------------------------------------------------------
// Structure motif
// ---------------------------------------------------------------------------

/// One position of a structure motif, optionally with the residue types
/// allowed to replace it.
#[derive(Debug, Clone, PartialEq)]
pub struct Residue {
    chain_id: String,
    struct_oper_id: String,
    label_seq_id: i64,
    exchanges: Vec<String>,
}

impl Residue {
    pub fn new<I, S>(
        chain_id: impl Into<String>,
        struct_oper_id: impl Into<String>,
        label_seq_id: i64,
        exchanges: I,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let chain_id = chain_id.into();
        let struct_oper_id = struct_oper_id.into();
        if chain_id.is_empty() {
            return Err(SearchError::MissingRequiredField {
                field: "chain_id",
                context: "motif residue",
            });
        }
        if struct_oper_id.is_empty() {
            return Err(SearchError::MissingRequiredField {
                field: "struct_oper_id",
                context: "motif residue",
            });
        }
        if label_seq_id < 1 {
            return Err(SearchError::OutOfRangeParameter {
                parameter: "label_seq_id",
                value: label_seq_id.to_string(),
                allowed: ">= 1".to_string(),
            });
        }

        let exchanges = exchanges
            .into_iter()
            .map(|code| {
                let code = code.as_ref().trim().to_ascii_uppercase();
                if EXCHANGE_CODES.contains(code.as_str()) {
                    Ok(code)
                } else {
                    Err(SearchError::UnknownExchangeCode(code))
                }
            })
            .collect::<Result<Vec<_>>>()?;
        if exchanges.len() > MAX_EXCHANGES_PER_RESIDUE {
            return Err(SearchError::TooManyExchanges {
                count: exchanges.len(),
                max: MAX_EXCHANGES_PER_RESIDUE,
                scope: "per residue",
            });
        }

        Ok(Self {
            chain_id,
            struct_oper_id,
            label_seq_id,
            exchanges,
        })
    }

    /// A residue without exchanges.
    pub fn at(
        chain_id: impl Into<String>,
        struct_oper_id: impl Into<String>,
        label_seq_id: i64,
    ) -> Result<Self> {
        Self::new(chain_id, struct_oper_id, label_seq_id, std::iter::empty::<&str>())
    }

    pub fn exchanges(&self) -> &[String] {
        &self.exchanges
    }

    fn residue_id(&self) -> serde_json::Value {
        json!({
            "label_asym_id": self.chain_id,
            "struct_oper_id": self.struct_oper_id,
            "label_seq_id": self.label_seq_id,
        })
    }
}

impl fmt::Display for Residue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}:{}", self.chain_id, self.label_seq_id, self.struct_oper_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AtomPairingScheme {
    All,
    Backbone,
    #[default]
    SideChain,
    PseudoAtoms,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MotifPruningStrategy {
    None,
    #[default]
    Kruskal,
}

/// Search for a small arrangement of residues (a motif) in other structures.
#[derive(Debug, Clone, PartialEq)]
pub struct StructMotifQuery {
    source: StructureSource,
    residues: Vec<Residue>,
    backbone_distance_tolerance: u8,
    side_chain_distance_tolerance: u8,
    angle_tolerance: u8,
    rmsd_cutoff: f64,
    atom_pairing_scheme: AtomPairingScheme,
    motif_pruning_strategy: MotifPruningStrategy,
    allowed_structures: Vec<String>,
    excluded_structures: Vec<String>,
    limit: Option<u32>,
}

impl StructMotifQuery {
    pub fn builder() -> StructMotifQueryBuilder {
        StructMotifQueryBuilder::default()
    }

    pub fn source(&self) -> &StructureSource {
        &self.source
    }

    pub fn residues(&self) -> &[Residue] {
        &self.residues
    }

    pub fn with_source(&self, source: StructureSource) -> Self {
        Self {
            source,
            ..self.clone()
        }
    }

    pub fn parameters(&self) -> Result<serde_json::Value> {
        let mut value = self.source.base_value()?;
        value.insert(
            "residue_ids".into(),
            self.residues.iter().map(Residue::residue_id).collect(),
        );

        let mut params = Map::new();
        params.insert("value".into(), value.into());
        params.insert("backbone_distance_tolerance".into(), json!(self.backbone_distance_tolerance));
        params.insert("side_chain_distance_tolerance".into(), json!(self.side_chain_distance_tolerance));
        params.insert("angle_tolerance".into(), json!(self.angle_tolerance));
        params.insert("rmsd_cutoff".into(), json!(self.rmsd_cutoff));
        params.insert("atom_pairing_scheme".into(), json!(self.atom_pairing_scheme));
        params.insert("motif_pruning_strategy".into(), json!(self.motif_pruning_strategy));
        if !self.allowed_structures.is_empty() {
            params.insert("allowed_structures".into(), json!(self.allowed_structures));
        }
        if !self.excluded_structures.is_empty() {
            params.insert("excluded_structures".into(), json!(self.excluded_structures));
        }
        let exchanges: Vec<_> = self
            .residues
            .iter()
            .filter(|r| !r.exchanges.is_empty())
            .map(|r| json!({"residue_id": r.residue_id(), "allowed": r.exchanges}))
            .collect();
        if !exchanges.is_empty() {
            params.insert("exchanges".into(), exchanges.into());
        }
        if let Some(limit) = self.limit {
            params.insert("limit".into(), json!(limit));
        }
        Ok(params.into())
    }
}

#[derive(Debug, Clone)]
pub struct StructMotifQueryBuilder {
    entry_id: Option<String>,
    file_url: Option<String>,
    file_path: Option<PathBuf>,
    file_format: Option<String>,
    residues: Vec<Residue>,
    backbone_distance_tolerance: u8,
    side_chain_distance_tolerance: u8,
    angle_tolerance: u8,
    rmsd_cutoff: f64,
    atom_pairing_scheme: AtomPairingScheme,
    motif_pruning_strategy: MotifPruningStrategy,
    allowed_structures: Vec<String>,
    excluded_structures: Vec<String>,
    limit: Option<u32>,
}

impl Default for StructMotifQueryBuilder {
    fn default() -> Self {
        Self {
            entry_id: None,
            file_url: None,
            file_path: None,
            file_format: None,
            residues: Vec::new(),
            backbone_distance_tolerance: 1,
            side_chain_distance_tolerance: 1,
            angle_tolerance: 1,
            rmsd_cutoff: 2.0,
            atom_pairing_scheme: AtomPairingScheme::default(),
            motif_pruning_strategy: MotifPruningStrategy::default(),
            allowed_structures: Vec::new(),
            excluded_structures: Vec::new(),
            limit: None,
        }
    }
}

impl StructMotifQueryBuilder {
    pub fn entry_id(mut self, id: impl Into<String>) -> Self {
        self.entry_id = Some(id.into());
        self
    }

    pub fn file_url(mut self, url: impl Into<String>) -> Self {
        self.file_url = Some(url.into());
        self
    }

    pub fn file_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.file_path = Some(path.into());
        self
    }

    pub fn file_format(mut self, format: impl Into<String>) -> Self {
        self.file_format = Some(format.into());
        self
    }

    pub fn residue(mut self, residue: Residue) -> Self {
        self.residues.push(residue);
        self
    }

    pub fn residues(mut self, residues: impl IntoIterator<Item = Residue>) -> Self {
        self.residues.extend(residues);
        self
    }

    /// Backbone distance tolerance in Å, 0-3.
    pub fn backbone_distance_tolerance(mut self, tolerance: u8) -> Self {
        self.backbone_distance_tolerance = tolerance;
        self
    }

    /// Side chain distance tolerance in Å, 0-3.
    pub fn side_chain_distance_tolerance(mut self, tolerance: u8) -> Self {
        self.side_chain_distance_tolerance = tolerance;
        self
    }

    /// Angle tolerance in multiples of 20°, 0-3.
    pub fn angle_tolerance(mut self, tolerance: u8) -> Self {
        self.angle_tolerance = tolerance;
        self
    }

    pub fn rmsd_cutoff(mut self, cutoff: f64) -> Self {
        self.rmsd_cutoff = cutoff;
        self
    }

    pub fn atom_pairing_scheme(mut self, scheme: AtomPairingScheme) -> Self {
        self.atom_pairing_scheme = scheme;
        self
    }

    pub fn motif_pruning_strategy(mut self, strategy: MotifPruningStrategy) -> Self {
        self.motif_pruning_strategy = strategy;
        self
    }

    pub fn allowed_structures<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_structures = ids.into_iter().map(Into::into).collect();
        self
    }

    pub fn excluded_structures<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excluded_structures = ids.into_iter().map(Into::into).collect();
        self
    }

    /// Stop the motif search after this many hits.
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn build(self) -> Result<StructMotifQuery> {
        const CONTEXT: &str = "structure motif query";

        let source = StructureSource::from_fields(
            self.entry_id,
            self.file_url,
            self.file_path,
            self.file_format,
            CONTEXT,
        )?;

        let count = self.residues.len();
        if !(MIN_MOTIF_RESIDUES..=MAX_MOTIF_RESIDUES).contains(&count) {
            return Err(SearchError::ResidueCount {
                count,
                min: MIN_MOTIF_RESIDUES,
                max: MAX_MOTIF_RESIDUES,
            });
        }
        let exchanges: usize = self.residues.iter().map(|r| r.exchanges.len()).sum();
        if exchanges > MAX_EXCHANGES_PER_QUERY {
            return Err(SearchError::TooManyExchanges {
                count: exchanges,
                max: MAX_EXCHANGES_PER_QUERY,
                scope: "per query",
            });
        }

        for (parameter, tolerance) in [
            ("backbone_distance_tolerance", self.backbone_distance_tolerance),
            ("side_chain_distance_tolerance", self.side_chain_distance_tolerance),
            ("angle_tolerance", self.angle_tolerance),
        ] {
            if tolerance > MAX_TOLERANCE {
                return Err(SearchError::OutOfRangeParameter {
                    parameter,
                    value: tolerance.to_string(),
                    allowed: format!("0..={MAX_TOLERANCE}"),
                });
            }
        }
        if !self.rmsd_cutoff.is_finite() || self.rmsd_cutoff < 0.0 {
            return Err(SearchError::OutOfRangeParameter {
                parameter: "rmsd_cutoff",
                value: self.rmsd_cutoff.to_string(),
                allowed: ">= 0".to_string(),
            });
        }
        if self.limit == Some(0) {
            return Err(SearchError::OutOfRangeParameter {
                parameter: "limit",
                value: "0".to_string(),
                allowed: ">= 1".to_string(),
            });
        }

        Ok(StructMotifQuery {
            source,
            residues: self.residues,
            backbone_distance_tolerance: self.backbone_distance_tolerance,
            side_chain_distance_tolerance: self.side_chain_distance_tolerance,
            angle_tolerance: self.angle_tolerance,
            rmsd_cutoff: self.rmsd_cutoff,
            atom_pairing_scheme: self.atom_pairing_scheme,
            motif_pruning_strategy: self.motif_pruning_strategy,
            allowed_structures: self.allowed_structures,
            excluded_structures: self.excluded_structures,
            limit: self.limit,
        })
    }
}
