use super::Operator;
use crate::attribute::Service;
use crate::error::{Result, SearchError};
use crate::registry::AttributeRegistry;
use crate::value::Value;
use serde::Serialize;
use std::fmt;

/// Compares one attribute of a structure or chemical component to a value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttributeQuery {
    attribute: String,
    operator: Operator,
    negation: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<Value>,
    #[serde(skip)]
    service: Service,
}

impl AttributeQuery {
    /// Build a comparison against an explicit service.
    ///
    /// The value must suit the operator: `exists` takes none, `in` a list,
    /// `range` an ordered [`Range`](crate::value::Range), ordering operators a
    /// number, date or date string, and the text operators a string.
    pub fn new(
        attribute: impl Into<String>,
        operator: Operator,
        value: Option<Value>,
        service: Service,
    ) -> Result<Self> {
        let attribute = attribute.into();
        if attribute.is_empty() {
            return Err(SearchError::MissingRequiredField {
                field: "attribute",
                context: "attribute query",
            });
        }
        if !service.is_attribute_service() {
            return Err(SearchError::InvalidOption(format!(
                "{service} is not an attribute search service"
            )));
        }
        check_value(&attribute, operator, value.as_ref())?;
        Ok(Self {
            attribute,
            operator,
            negation: false,
            value,
            service,
        })
    }

    /// Build a comparison, taking the service from the registry unless one is
    /// given explicitly.
    ///
    /// Without an explicit service the attribute must be known to the
    /// registry and belong to exactly one service.
    pub fn resolve(
        registry: &AttributeRegistry,
        attribute: &str,
        operator: Operator,
        value: Option<Value>,
        service: Option<Service>,
    ) -> Result<Self> {
        let service = match service {
            Some(service) => service,
            None => registry.service_of(attribute)?,
        };
        Self::new(attribute, operator, value, service)
    }

    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    pub fn operator(&self) -> Operator {
        self.operator
    }

    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    pub fn negation(&self) -> bool {
        self.negation
    }

    pub fn service(&self) -> Service {
        self.service
    }

    /// The same comparison with the negation flag flipped.
    pub fn negated(&self) -> Self {
        Self {
            negation: !self.negation,
            ..self.clone()
        }
    }
}

fn check_value(attribute: &str, operator: Operator, value: Option<&Value>) -> Result<()> {
    let invalid = |reason: String| SearchError::InvalidOperatorForAttribute {
        attribute: attribute.to_string(),
        operator: operator.to_string(),
        reason,
    };

    if operator == Operator::Exists {
        return match value {
            None => Ok(()),
            Some(v) => Err(invalid(format!("exists takes no value, got a {}", v.kind()))),
        };
    }
    let Some(value) = value else {
        return Err(SearchError::MissingRequiredField {
            field: "value",
            context: "attribute query",
        });
    };

    match operator {
        Operator::Exists => {}
        Operator::ExactMatch | Operator::ContainsPhrase | Operator::ContainsWords => {
            if !matches!(value, Value::Str(_)) {
                return Err(invalid(format!("expected a string, got a {}", value.kind())));
            }
        }
        Operator::Greater | Operator::GreaterOrEqual | Operator::Less | Operator::LessOrEqual => {
            if !(value.is_number_like() || matches!(value, Value::Str(_))) {
                return Err(invalid(format!(
                    "expected a number or date, got a {}",
                    value.kind()
                )));
            }
        }
        Operator::Equals => {
            if !(value.is_number_like() || matches!(value, Value::Bool(_))) {
                return Err(invalid(format!(
                    "expected a number, date or boolean, got a {}",
                    value.kind()
                )));
            }
        }
        Operator::In => match value {
            Value::List(items) if !items.is_empty() => {}
            Value::List(_) => return Err(invalid("needs at least one value".to_string())),
            other => return Err(invalid(format!("expected a list, got a {}", other.kind()))),
        },
        Operator::Range => match value {
            Value::Range(r) if r.start.is_none() && r.end.is_none() => {
                return Err(invalid("range has neither end".to_string()))
            }
            Value::Range(r) if !r.is_ordered() => {
                return Err(invalid(format!("range {r} is empty")))
            }
            Value::Range(r) => r.check_bounds()?,
            other => return Err(invalid(format!("expected a range, got a {}", other.kind()))),
        },
    }
    Ok(())
}

impl fmt::Display for AttributeQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negation {
            write!(f, "~")?;
        }
        write!(f, "{} {}", self.attribute, self.operator)?;
        if let Some(value) = &self.value {
            write!(f, " {value}")?;
        }
        Ok(())
    }
}
