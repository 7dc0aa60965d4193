//! pdbsearch-core — query model and execution core for the RCSB PDB search API.
//!
//! # Architecture
//!
//! ```text
//! Attribute / Terminal ──► Query ──► Executor ──► Session ──► identifiers
//!        ▲                              │
//!  AttributeRegistry              Transport (pdbsearch-http, or a test stub)
//! ```
//!
//! Everything here is pure data plus validation. The only I/O happens through
//! the [`Transport`] and [`SchemaSource`] traits.

pub mod attribute;
pub mod config;
pub mod error;
pub mod facet;
pub mod options;
pub mod query;
pub mod registry;
pub mod request;
pub mod response;
pub mod session;
pub mod term;
pub mod transport;
pub mod value;

pub use attribute::{Attribute, Service};
pub use config::ClientConfig;
pub use error::{Result, SearchError, TransportError};
pub use facet::{AggregationType, Facet, FacetItem, Filter, FilterFacet, GroupFilter, TerminalFilter};
pub use options::{GroupBy, RequestOptions, ReturnType, Sort};
pub use query::{LogicalOperator, PartialQuery, Query};
pub use registry::AttributeRegistry;
pub use response::{FacetResult, GroupedResults, ResultHit};
pub use session::{Executor, Session, SessionState};
pub use term::{Operator, Terminal};
pub use transport::{SchemaSource, Transport};
pub use value::{Range, Value};
