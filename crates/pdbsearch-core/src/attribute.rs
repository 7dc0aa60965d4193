//! Searchable attributes and the search services that answer them.
//!
//! An [`Attribute`] names a dot-delimited field (`exptl.method`) together with
//! the attribute service(s) that know it. Attributes built by hand default to
//! the structure service; attributes from the
//! [`AttributeRegistry`](crate::registry::AttributeRegistry) carry whatever the
//! schema says, which may be both services.
//!
//! # Comparison constructors
//!
//! Rust comparison operators must return `bool`, so the original operator
//! overloads map to named methods instead:
//!
//! | Method          | Operator sent                               |
//! |-----------------|---------------------------------------------|
//! | `eq_to(str)`    | `exact_match`                               |
//! | `eq_to(number)` | `equals`                                    |
//! | `ne_to(v)`      | negated `eq_to(v)`                          |
//! | `contains(str)` | `contains_phrase`                           |
//! | `contains(list)`| `contains_words`                            |
//! | `greater(v)` …  | `greater`, `greater_or_equal`, `less`, …    |
//! | `exists()`      | `exists`                                    |
//! | `in_values(v)`  | `in`                                        |
//!
//! Every method goes through [`AttributeQuery::new`], so a term built here is
//! identical to one built explicitly from the same inputs.

use crate::error::{Result, SearchError};
use crate::term::{AttributeQuery, Operator, Terminal};
use crate::value::{Range, Value};
use serde::Serialize;
use std::fmt;

/// A search service of the remote API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Service {
    /// Structure attribute search.
    Text,
    /// Chemical attribute search.
    TextChem,
    FullText,
    Sequence,
    #[serde(rename = "seqmotif")]
    SeqMotif,
    Structure,
    #[serde(rename = "strucmotif")]
    StrucMotif,
    Chemical,
}

impl Service {
    pub fn as_str(&self) -> &'static str {
        match self {
            Service::Text => "text",
            Service::TextChem => "text_chem",
            Service::FullText => "full_text",
            Service::Sequence => "sequence",
            Service::SeqMotif => "seqmotif",
            Service::Structure => "structure",
            Service::StrucMotif => "strucmotif",
            Service::Chemical => "chemical",
        }
    }

    /// Whether attribute queries may target this service.
    pub fn is_attribute_service(&self) -> bool {
        matches!(self, Service::Text | Service::TextChem)
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A searchable field, e.g. `rcsb_entry_info.resolution_combined`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Attribute {
    name: String,
    /// Sorted, deduplicated, never empty.
    services: Vec<Service>,
    description: Option<String>,
}

impl Attribute {
    /// A structure attribute (`text` service).
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            services: vec![Service::Text],
            description: None,
        }
    }

    /// A chemical attribute (`text_chem` service).
    pub fn chemical(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            services: vec![Service::TextChem],
            description: None,
        }
    }

    /// An attribute known to the given services. An empty service list falls
    /// back to the structure service.
    pub fn with_services(
        name: impl Into<String>,
        services: impl IntoIterator<Item = Service>,
        description: Option<String>,
    ) -> Self {
        let mut services: Vec<Service> = services.into_iter().collect();
        services.sort();
        services.dedup();
        if services.is_empty() {
            services.push(Service::Text);
        }
        Self {
            name: name.into(),
            services,
            description,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn services(&self) -> &[Service] {
        &self.services
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// The single service this attribute belongs to.
    ///
    /// Fails with [`SearchError::AmbiguousAttribute`] when the name is valid
    /// in more than one service.
    pub fn service(&self) -> Result<Service> {
        match self.services.as_slice() {
            [only] => Ok(*only),
            several => Err(SearchError::AmbiguousAttribute {
                name: self.name.clone(),
                services: several
                    .iter()
                    .map(Service::as_str)
                    .collect::<Vec<_>>()
                    .join(", "),
            }),
        }
    }

    /// Pin an ambiguous attribute to one of its services.
    pub fn in_service(&self, service: Service) -> Self {
        Self {
            name: self.name.clone(),
            services: vec![service],
            description: self.description.clone(),
        }
    }

    // -----------------------------------------------------------------------
    // Term constructors
    // -----------------------------------------------------------------------

    /// Build an attribute comparison with an explicit operator.
    pub fn query(&self, operator: Operator, value: Option<Value>) -> Result<Terminal> {
        AttributeQuery::new(self.name.clone(), operator, value, self.service()?)
            .map(Terminal::Attribute)
    }

    pub fn exact_match(&self, value: impl Into<String>) -> Result<Terminal> {
        self.query(Operator::ExactMatch, Some(Value::Str(value.into())))
    }

    /// Match any of the words. A list of words is joined with spaces.
    pub fn contains_words(&self, value: impl Into<Value>) -> Result<Terminal> {
        let value = match value.into() {
            Value::List(words) => {
                let words = words
                    .iter()
                    .map(|w| {
                        w.as_str().map(str::to_string).ok_or_else(|| {
                            SearchError::InvalidOperatorForAttribute {
                                attribute: self.name.clone(),
                                operator: Operator::ContainsWords.to_string(),
                                reason: format!("expected words, got {}", w.kind()),
                            }
                        })
                    })
                    .collect::<Result<Vec<_>>>()?;
                Value::Str(words.join(" "))
            }
            other => other,
        };
        self.query(Operator::ContainsWords, Some(value))
    }

    pub fn contains_phrase(&self, value: impl Into<String>) -> Result<Terminal> {
        self.query(Operator::ContainsPhrase, Some(Value::Str(value.into())))
    }

    pub fn greater(&self, value: impl Into<Value>) -> Result<Terminal> {
        self.query(Operator::Greater, Some(value.into()))
    }

    pub fn greater_or_equal(&self, value: impl Into<Value>) -> Result<Terminal> {
        self.query(Operator::GreaterOrEqual, Some(value.into()))
    }

    pub fn less(&self, value: impl Into<Value>) -> Result<Terminal> {
        self.query(Operator::Less, Some(value.into()))
    }

    pub fn less_or_equal(&self, value: impl Into<Value>) -> Result<Terminal> {
        self.query(Operator::LessOrEqual, Some(value.into()))
    }

    pub fn equals(&self, value: impl Into<Value>) -> Result<Terminal> {
        self.query(Operator::Equals, Some(value.into()))
    }

    pub fn range(&self, range: Range) -> Result<Terminal> {
        self.query(Operator::Range, Some(Value::Range(range)))
    }

    pub fn exists(&self) -> Result<Terminal> {
        self.query(Operator::Exists, None)
    }

    pub fn in_values(&self, values: impl Into<Value>) -> Result<Terminal> {
        self.query(Operator::In, Some(values.into()))
    }

    // -----------------------------------------------------------------------
    // Operator-style shortcuts
    // -----------------------------------------------------------------------

    /// `attr == value`: strings map to `exact_match`, numbers and dates to
    /// `equals`.
    pub fn eq_to(&self, value: impl Into<Value>) -> Result<Terminal> {
        match value.into() {
            Value::Str(s) => self.exact_match(s),
            v if v.is_number_like() => self.equals(v),
            v => Err(SearchError::InvalidOperatorForAttribute {
                attribute: self.name.clone(),
                operator: "==".to_string(),
                reason: format!("cannot compare with a {}", v.kind()),
            }),
        }
    }

    /// `attr != value`: the negation of [`eq_to`](Self::eq_to).
    pub fn ne_to(&self, value: impl Into<Value>) -> Result<Terminal> {
        self.eq_to(value)?.negate()
    }

    /// `value in attr`: strings map to `contains_phrase`, lists of strings to
    /// `contains_words`.
    pub fn contains(&self, value: impl Into<Value>) -> Result<Terminal> {
        match value.into() {
            Value::Str(s) => self.contains_phrase(s),
            list @ Value::List(_) => self.contains_words(list),
            v => Err(SearchError::InvalidOperatorForAttribute {
                attribute: self.name.clone(),
                operator: "in".to_string(),
                reason: format!("cannot search text for a {}", v.kind()),
            }),
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl From<&str> for Attribute {
    fn from(name: &str) -> Self {
        Attribute::new(name)
    }
}
