//! Attribute registry — the searchable field names of both attribute services.
//!
//! Built by walking the services' JSON schema documents: every leaf property
//! (string, number, integer, date, boolean) becomes an [`Attribute`] named by
//! its dotted path. Names are kept in a `BTreeMap` for exact lookup and in an
//! FST set for dotted-prefix scans.
//!
//! The process-wide registry ([`global`]) is built once on first use. A remote
//! schema that cannot be fetched falls back to the copy bundled with the
//! crate.

use crate::attribute::{Attribute, Service};
use crate::error::{Result, SearchError};
use crate::transport::SchemaSource;
use fst::automaton::Str;
use fst::{Automaton, IntoStreamer, Streamer};
use regex::Regex;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::OnceLock;

const BUNDLED_STRUCTURE_SCHEMA: &str = include_str!("../resources/structure_schema.json");
const BUNDLED_CHEMICAL_SCHEMA: &str = include_str!("../resources/chemical_schema.json");

static GLOBAL: OnceLock<AttributeRegistry> = OnceLock::new();

/// Searchable attributes, indexed by name.
#[derive(Debug, Clone)]
pub struct AttributeRegistry {
    attributes: BTreeMap<String, Attribute>,
    index: fst::Set<Vec<u8>>,
}

impl AttributeRegistry {
    /// Build from schema documents, each tagged with the service it describes.
    /// A name present in several documents belongs to all their services.
    pub fn from_schemas<'a>(schemas: impl IntoIterator<Item = (Service, &'a Value)>) -> Result<Self> {
        let mut found: BTreeMap<String, (Vec<Service>, Option<String>)> = BTreeMap::new();
        for (service, schema) in schemas {
            let mut leaves = Vec::new();
            walk(schema, String::new(), &mut leaves)?;
            for (name, description) in leaves {
                let entry = found.entry(name).or_default();
                entry.0.push(service);
                if entry.1.is_none() {
                    entry.1 = description;
                }
            }
        }

        let attributes: BTreeMap<String, Attribute> = found
            .into_iter()
            .map(|(name, (services, description))| {
                let attr = Attribute::with_services(name.clone(), services, description);
                (name, attr)
            })
            .collect();
        // BTreeMap iteration is already in the lexicographic order fst needs.
        let index = fst::Set::from_iter(attributes.keys())?;

        Ok(Self { attributes, index })
    }

    /// The schemas bundled with the crate.
    pub fn bundled() -> Result<Self> {
        let structure = parse_schema(BUNDLED_STRUCTURE_SCHEMA)?;
        let chemical = parse_schema(BUNDLED_CHEMICAL_SCHEMA)?;
        Self::from_schemas([(Service::Text, &structure), (Service::TextChem, &chemical)])
    }

    /// Fetch both schemas from `source`, substituting the bundled copy for any
    /// schema that cannot be fetched or walked.
    pub fn load(source: &dyn SchemaSource) -> Result<Self> {
        let structure = fetch_or_bundled(source, Service::Text, BUNDLED_STRUCTURE_SCHEMA)?;
        let chemical = fetch_or_bundled(source, Service::TextChem, BUNDLED_CHEMICAL_SCHEMA)?;
        let registry =
            Self::from_schemas([(Service::Text, &structure), (Service::TextChem, &chemical)])?;
        tracing::info!(attributes = registry.len(), "attribute registry loaded");
        Ok(registry)
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// All attributes in name order.
    pub fn iter(&self) -> impl Iterator<Item = &Attribute> {
        self.attributes.values()
    }

    /// Exact lookup.
    pub fn resolve(&self, name: &str) -> Result<&Attribute> {
        self.attributes
            .get(name)
            .ok_or_else(|| SearchError::AttributeNotFound(name.to_string()))
    }

    /// Attributes whose name matches `pattern` anywhere (regex, case
    /// sensitive). A plain substring is a valid pattern.
    pub fn search(&self, pattern: &str) -> Result<impl Iterator<Item = &Attribute> + '_> {
        let re = Regex::new(pattern)?;
        Ok(self.attributes.values().filter(move |a| re.is_match(a.name())))
    }

    /// The attribute itself if `name` is a full name, otherwise every attribute
    /// under the dotted prefix (`rcsb_entry_info` → `rcsb_entry_info.*`).
    pub fn details(&self, name: &str) -> Vec<&Attribute> {
        if let Some(attr) = self.attributes.get(name) {
            return vec![attr];
        }
        let prefix = format!("{}.", name.trim_end_matches('.'));
        let matcher = Str::new(&prefix).starts_with();
        let mut stream = self.index.search(matcher).into_stream();

        let mut out = Vec::new();
        while let Some(key) = stream.next() {
            if let Some(attr) = std::str::from_utf8(key).ok().and_then(|k| self.attributes.get(k)) {
                out.push(attr);
            }
        }
        out
    }

    /// The single service that answers `name`.
    pub fn service_of(&self, name: &str) -> Result<Service> {
        self.resolve(name)?.service()
    }
}

/// The process-wide registry, built from the bundled schemas on first use
/// unless [`init_global`] ran first.
pub fn global() -> &'static AttributeRegistry {
    GLOBAL.get_or_init(|| match AttributeRegistry::bundled() {
        Ok(registry) => registry,
        Err(e) => {
            tracing::warn!(error = %e, "bundled schema unusable; attribute registry is empty");
            empty()
        }
    })
}

/// Build the process-wide registry from `source`. Has no effect once the
/// registry exists; returns whichever registry is installed.
pub fn init_global(source: &dyn SchemaSource) -> &'static AttributeRegistry {
    GLOBAL.get_or_init(|| {
        AttributeRegistry::load(source).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "attribute registry could not be built; it is empty");
            empty()
        })
    })
}

fn empty() -> AttributeRegistry {
    AttributeRegistry {
        attributes: BTreeMap::new(),
        index: fst::SetBuilder::memory().into_set(),
    }
}

fn parse_schema(raw: &str) -> Result<Value> {
    serde_json::from_str(raw).map_err(|e| SearchError::Schema(e.to_string()))
}

fn fetch_or_bundled(source: &dyn SchemaSource, service: Service, bundled: &str) -> Result<Value> {
    match source.fetch_schema(service) {
        Ok(schema) => {
            // Reject documents we cannot walk here so the fallback still applies.
            let mut probe = Vec::new();
            match walk(&schema, String::new(), &mut probe) {
                Ok(()) => {
                    tracing::info!(%service, attributes = probe.len(), "schema fetched");
                    Ok(schema)
                }
                Err(e) => {
                    tracing::warn!(%service, error = %e, "remote schema unusable, using bundled copy");
                    parse_schema(bundled)
                }
            }
        }
        Err(e) => {
            tracing::warn!(%service, error = %e, "schema fetch failed, using bundled copy");
            parse_schema(bundled)
        }
    }
}

/// Collect `(dotted name, description)` for every leaf under `node`.
fn walk(node: &Value, path: String, out: &mut Vec<(String, Option<String>)>) -> Result<()> {
    for combinator in ["anyOf", "oneOf", "allOf"] {
        if let Some(Value::Array(variants)) = node.get(combinator) {
            let before = out.len();
            for variant in variants {
                walk(variant, path.clone(), out)?;
            }
            // Variants usually repeat the same leaf; keep one.
            let mut seen = std::collections::HashSet::new();
            let mut i = before;
            while i < out.len() {
                if seen.insert(out[i].0.clone()) {
                    i += 1;
                } else {
                    out.remove(i);
                }
            }
            return Ok(());
        }
    }

    let kind = node.get("type").and_then(Value::as_str).unwrap_or("object");
    match kind {
        "string" | "number" | "integer" | "date" | "boolean" => {
            if path.is_empty() {
                return Err(SearchError::Schema("schema root is not an object".to_string()));
            }
            let description = node
                .get("description")
                .and_then(Value::as_str)
                .map(str::to_string);
            out.push((path, description));
            Ok(())
        }
        "array" => match node.get("items") {
            Some(items) => walk(items, path, out),
            None => Err(SearchError::Schema(format!("array `{path}` has no items"))),
        },
        "object" => {
            let Some(Value::Object(properties)) = node.get("properties") else {
                return Ok(());
            };
            for (child, child_node) in properties {
                let child_path = if path.is_empty() {
                    child.clone()
                } else {
                    format!("{path}.{child}")
                };
                walk(child_node, child_path, out)?;
            }
            Ok(())
        }
        other => Err(SearchError::Schema(format!(
            "unrecognized type `{other}` at `{path}`"
        ))),
    }
}
