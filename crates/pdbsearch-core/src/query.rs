//! Query expressions — terminals composed with AND / OR.
//!
//! A [`Query`] is an immutable tree. Combining queries builds a new tree that
//! shares the operands' subtrees through `Arc`, so composition never copies
//! whole trees and never mutates an operand.
//!
//! # Normal form
//!
//! Groups hold at least two children and never hold a child group with their
//! own operator: `(a & b) & c` is stored as one AND group `[a, b, c]`. NOT is
//! not a node type. It is pushed down onto terminals (attribute terminals
//! carry a negation flag) and through groups by De Morgan's laws. Negating a
//! normal-form tree flips every level, which keeps operators alternating, so
//! the result is already in normal form.
//!
//! # Operators
//!
//! | Expression | Meaning                          | Output          |
//! |------------|----------------------------------|-----------------|
//! | `a & b`    | intersection                     | `Query`         |
//! | `a \| b`   | union                            | `Query`         |
//! | `!a`       | negation                         | `Result<Query>` |
//! | `a - b`    | difference, `a & !b`             | `Result<Query>` |
//! | `a ^ b`    | symmetric difference             | `Result<Query>` |
//!
//! Negation fails for terminals the remote service cannot negate, hence the
//! `Result` outputs. The same operations exist as free functions ([`and`],
//! [`or`], [`negate`], [`difference`], [`symmetric_difference`]).

use crate::attribute::Attribute;
use crate::error::Result;
use crate::term::Terminal;
use crate::value::{Range, Value};
use serde::Serialize;
use serde_json::json;
use std::fmt;
use std::ops::{BitAnd, BitOr, BitXor, Not, Sub};
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogicalOperator {
    And,
    Or,
}

impl LogicalOperator {
    pub fn flip(self) -> Self {
        match self {
            LogicalOperator::And => LogicalOperator::Or,
            LogicalOperator::Or => LogicalOperator::And,
        }
    }

    fn symbol(self) -> &'static str {
        match self {
            LogicalOperator::And => " & ",
            LogicalOperator::Or => " | ",
        }
    }
}

/// A boolean combination of two or more queries.
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    operator: LogicalOperator,
    nodes: Vec<Query>,
}

impl Group {
    pub fn operator(&self) -> LogicalOperator {
        self.operator
    }

    pub fn nodes(&self) -> &[Query] {
        &self.nodes
    }
}

/// A search expression: one terminal or a group of sub-expressions.
#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    Terminal(Arc<Terminal>),
    Group(Arc<Group>),
}

impl Query {
    /// Combine `queries` with one operator. `None` for an empty input; a single
    /// query is returned unchanged.
    pub fn combine<I>(operator: LogicalOperator, queries: I) -> Option<Query>
    where
        I: IntoIterator,
        I::Item: Into<Query>,
    {
        let mut nodes = Vec::new();
        for q in queries {
            splice_into(&mut nodes, operator, q.into());
        }
        match nodes.len() {
            0 => None,
            1 => nodes.pop(),
            _ => Some(Query::Group(Arc::new(Group { operator, nodes }))),
        }
    }

    /// AND over all queries.
    pub fn all<I>(queries: I) -> Option<Query>
    where
        I: IntoIterator,
        I::Item: Into<Query>,
    {
        Self::combine(LogicalOperator::And, queries)
    }

    /// OR over all queries.
    pub fn any<I>(queries: I) -> Option<Query>
    where
        I: IntoIterator,
        I::Item: Into<Query>,
    {
        Self::combine(LogicalOperator::Or, queries)
    }

    pub fn and(&self, other: impl Into<Query>) -> Query {
        binary(LogicalOperator::And, self.clone(), other.into())
    }

    pub fn or(&self, other: impl Into<Query>) -> Query {
        binary(LogicalOperator::Or, self.clone(), other.into())
    }

    /// NOT, pushed down to the terminals.
    pub fn negate(&self) -> Result<Query> {
        match self {
            Query::Terminal(t) => Ok(Query::Terminal(Arc::new(t.negate()?))),
            Query::Group(g) => {
                let nodes = g.nodes.iter().map(Query::negate).collect::<Result<Vec<_>>>()?;
                Ok(Query::Group(Arc::new(Group {
                    operator: g.operator.flip(),
                    nodes,
                })))
            }
        }
    }

    /// `self & !other`
    pub fn difference(&self, other: impl Into<Query>) -> Result<Query> {
        Ok(self.and(other.into().negate()?))
    }

    /// `(self & !other) | (!self & other)`
    pub fn symmetric_difference(&self, other: impl Into<Query>) -> Result<Query> {
        let other = other.into();
        let left = self.and(other.negate()?);
        let right = self.negate()?.and(other);
        Ok(left.or(right))
    }

    /// Start a fluent AND with an attribute comparison:
    /// `q.and_attribute("exptl.method").exact_match("NMR")`.
    pub fn and_attribute(&self, attribute: impl Into<Attribute>) -> PartialQuery {
        PartialQuery {
            query: self.clone(),
            operator: LogicalOperator::And,
            attribute: attribute.into(),
        }
    }

    /// Start a fluent OR with an attribute comparison.
    pub fn or_attribute(&self, attribute: impl Into<Attribute>) -> PartialQuery {
        PartialQuery {
            query: self.clone(),
            operator: LogicalOperator::Or,
            attribute: attribute.into(),
        }
    }

    /// Terminals in depth-first order, the order node ids are assigned in.
    pub fn terminals(&self) -> Vec<&Terminal> {
        let mut out = Vec::new();
        collect_terminals(self, &mut out);
        out
    }

    /// The `query` object of a request document. Terminals get `node_id`s
    /// numbered from 0 in depth-first order.
    pub fn to_json(&self) -> Result<serde_json::Value> {
        let mut next_id = 0;
        self.node_json(&mut next_id)
    }

    fn node_json(&self, next_id: &mut usize) -> Result<serde_json::Value> {
        match self {
            Query::Terminal(t) => {
                let node_id = *next_id;
                *next_id += 1;
                Ok(json!({
                    "type": "terminal",
                    "service": t.service(),
                    "parameters": t.parameters()?,
                    "node_id": node_id,
                }))
            }
            Query::Group(g) => {
                let nodes = g
                    .nodes
                    .iter()
                    .map(|n| n.node_json(next_id))
                    .collect::<Result<Vec<_>>>()?;
                Ok(json!({
                    "type": "group",
                    "logical_operator": g.operator,
                    "nodes": nodes,
                }))
            }
        }
    }

    pub fn needs_upload(&self) -> bool {
        self.terminals().iter().any(|t| t.needs_upload())
    }

    /// Replace every local structure file with an uploaded copy. Subtrees
    /// without local files are shared with `self`.
    pub fn resolve_uploads<F>(&self, upload: &mut F) -> Result<Query>
    where
        F: FnMut(&Path, &str) -> Result<String>,
    {
        match self {
            Query::Terminal(t) => match t.resolve_upload(|path, format| upload(path, format))? {
                Some(resolved) => Ok(Query::Terminal(Arc::new(resolved))),
                None => Ok(self.clone()),
            },
            Query::Group(g) => {
                if !self.needs_upload() {
                    return Ok(self.clone());
                }
                let nodes = g
                    .nodes
                    .iter()
                    .map(|n| n.resolve_uploads(upload))
                    .collect::<Result<Vec<_>>>()?;
                Ok(Query::Group(Arc::new(Group {
                    operator: g.operator,
                    nodes,
                })))
            }
        }
    }
}

fn splice_into(nodes: &mut Vec<Query>, operator: LogicalOperator, q: Query) {
    match q {
        Query::Group(g) if g.operator == operator => nodes.extend(g.nodes.iter().cloned()),
        other => nodes.push(other),
    }
}

fn binary(operator: LogicalOperator, a: Query, b: Query) -> Query {
    let mut nodes = Vec::with_capacity(2);
    splice_into(&mut nodes, operator, a);
    splice_into(&mut nodes, operator, b);
    Query::Group(Arc::new(Group { operator, nodes }))
}

fn collect_terminals<'a>(q: &'a Query, out: &mut Vec<&'a Terminal>) {
    match q {
        Query::Terminal(t) => out.push(t),
        Query::Group(g) => g.nodes.iter().for_each(|n| collect_terminals(n, out)),
    }
}

pub fn and(a: impl Into<Query>, b: impl Into<Query>) -> Query {
    binary(LogicalOperator::And, a.into(), b.into())
}

pub fn or(a: impl Into<Query>, b: impl Into<Query>) -> Query {
    binary(LogicalOperator::Or, a.into(), b.into())
}

pub fn negate(a: impl Into<Query>) -> Result<Query> {
    a.into().negate()
}

pub fn difference(a: impl Into<Query>, b: impl Into<Query>) -> Result<Query> {
    a.into().difference(b)
}

pub fn symmetric_difference(a: impl Into<Query>, b: impl Into<Query>) -> Result<Query> {
    a.into().symmetric_difference(b)
}

impl From<Terminal> for Query {
    fn from(t: Terminal) -> Self {
        Query::Terminal(Arc::new(t))
    }
}

impl From<&Query> for Query {
    fn from(q: &Query) -> Self {
        q.clone()
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Query::Terminal(t) => write!(f, "{t}"),
            Query::Group(g) => {
                write!(f, "(")?;
                for (i, node) in g.nodes.iter().enumerate() {
                    if i > 0 {
                        f.write_str(g.operator.symbol())?;
                    }
                    write!(f, "{node}")?;
                }
                write!(f, ")")
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Operator overloads
// ---------------------------------------------------------------------------

macro_rules! query_ops {
    ($($lhs:ty),*) => {
        $(
            impl<R: Into<Query>> BitAnd<R> for $lhs {
                type Output = Query;
                fn bitand(self, rhs: R) -> Query {
                    and(self, rhs)
                }
            }

            impl<R: Into<Query>> BitOr<R> for $lhs {
                type Output = Query;
                fn bitor(self, rhs: R) -> Query {
                    or(self, rhs)
                }
            }

            impl<R: Into<Query>> Sub<R> for $lhs {
                type Output = Result<Query>;
                fn sub(self, rhs: R) -> Result<Query> {
                    difference(self, rhs)
                }
            }

            impl<R: Into<Query>> BitXor<R> for $lhs {
                type Output = Result<Query>;
                fn bitxor(self, rhs: R) -> Result<Query> {
                    symmetric_difference(self, rhs)
                }
            }

            impl Not for $lhs {
                type Output = Result<Query>;
                fn not(self) -> Result<Query> {
                    negate(self)
                }
            }
        )*
    };
}

query_ops!(Query, &Query, Terminal);

// ---------------------------------------------------------------------------
// Fluent partial queries
// ---------------------------------------------------------------------------

/// A query waiting for one more attribute comparison. Completing it combines
/// the new terminal with the pending operator.
#[derive(Debug, Clone, PartialEq)]
pub struct PartialQuery {
    query: Query,
    operator: LogicalOperator,
    attribute: Attribute,
}

impl PartialQuery {
    fn complete(self, term: Result<Terminal>) -> Result<Query> {
        Ok(binary(self.operator, self.query, term?.into()))
    }

    pub fn exact_match(self, value: impl Into<String>) -> Result<Query> {
        let term = self.attribute.exact_match(value);
        self.complete(term)
    }

    pub fn contains_words(self, value: impl Into<Value>) -> Result<Query> {
        let term = self.attribute.contains_words(value);
        self.complete(term)
    }

    pub fn contains_phrase(self, value: impl Into<String>) -> Result<Query> {
        let term = self.attribute.contains_phrase(value);
        self.complete(term)
    }

    pub fn greater(self, value: impl Into<Value>) -> Result<Query> {
        let term = self.attribute.greater(value);
        self.complete(term)
    }

    pub fn greater_or_equal(self, value: impl Into<Value>) -> Result<Query> {
        let term = self.attribute.greater_or_equal(value);
        self.complete(term)
    }

    pub fn less(self, value: impl Into<Value>) -> Result<Query> {
        let term = self.attribute.less(value);
        self.complete(term)
    }

    pub fn less_or_equal(self, value: impl Into<Value>) -> Result<Query> {
        let term = self.attribute.less_or_equal(value);
        self.complete(term)
    }

    pub fn equals(self, value: impl Into<Value>) -> Result<Query> {
        let term = self.attribute.equals(value);
        self.complete(term)
    }

    pub fn range(self, range: Range) -> Result<Query> {
        let term = self.attribute.range(range);
        self.complete(term)
    }

    pub fn exists(self) -> Result<Query> {
        let term = self.attribute.exists();
        self.complete(term)
    }

    pub fn in_values(self, values: impl Into<Value>) -> Result<Query> {
        let term = self.attribute.in_values(values);
        self.complete(term)
    }

    pub fn eq_to(self, value: impl Into<Value>) -> Result<Query> {
        let term = self.attribute.eq_to(value);
        self.complete(term)
    }

    /// Combines with the negated comparison, not the negated query.
    pub fn ne_to(self, value: impl Into<Value>) -> Result<Query> {
        let term = self.attribute.ne_to(value);
        self.complete(term)
    }

    pub fn contains(self, value: impl Into<Value>) -> Result<Query> {
        let term = self.attribute.contains(value);
        self.complete(term)
    }
}
