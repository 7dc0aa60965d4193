//! pdbsearch — query builder and paginated client for the RCSB PDB search API.
//!
//! This crate re-exports the query model from `pdbsearch-core` and the HTTP
//! transport from `pdbsearch-http`, so integration tests, benchmarks and the
//! binary share one import path.
//!
//! # Architecture
//!
//! ```text
//! Attribute ──► Terminal ──► Query ──► Executor ──► Session ──► identifiers
//!                                         │
//!                                   HttpTransport
//! ```
//!
//! ```no_run
//! use pdbsearch::{Attribute, ClientConfig, Executor, HttpTransport, Query, RequestOptions};
//!
//! # fn main() -> pdbsearch::Result<()> {
//! let transport = HttpTransport::new(&ClientConfig::defaults())?;
//! let executor = Executor::new(transport);
//!
//! let method = Attribute::new("exptl.method");
//! let resolution = Attribute::new("rcsb_entry_info.resolution_combined");
//! let query: Query = method.exact_match("X-RAY DIFFRACTION")?.into();
//! let query = query & resolution.less(2.0)?;
//!
//! for id in query.exec(&executor, RequestOptions::default())? {
//!     println!("{}", id?);
//! }
//! # Ok(())
//! # }
//! ```

pub use pdbsearch_core::*;
pub use pdbsearch_http::HttpTransport;
