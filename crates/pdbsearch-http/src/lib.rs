//! pdbsearch-http — blocking HTTP transport for the RCSB PDB search API.
//!
//! [`HttpTransport`] implements both collaborator traits of
//! `pdbsearch-core`: it executes search requests and fetches the attribute
//! schemas.

pub mod transport;

pub use transport::HttpTransport;
