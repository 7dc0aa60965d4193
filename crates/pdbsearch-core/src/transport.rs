//! Collaborator interfaces: the query transport and the schema source.
//!
//! The core never performs I/O itself. A [`Session`](crate::session::Session)
//! hands serialized request documents to a [`Transport`]; the
//! [`AttributeRegistry`](crate::registry::AttributeRegistry) asks a
//! [`SchemaSource`] for schema documents. `pdbsearch-http` implements both over
//! HTTP; tests script them.

use crate::attribute::Service;
use crate::error::TransportError;
use serde_json::Value;
use std::path::Path;

/// Executes search requests against the remote service.
pub trait Transport {
    /// Send `request` to the endpoint at `path`.
    ///
    /// Returns `Ok(None)` when the service reports no results (HTTP 204), and
    /// the parsed response document otherwise. No retries.
    fn execute(&self, path: &str, request: &Value) -> Result<Option<Value>, TransportError>;

    /// Upload a local structure file and return a URL the service can read
    /// it from.
    fn upload(&self, path: &Path, format: &str) -> Result<String, TransportError> {
        let _ = format;
        Err(TransportError::Unsupported(format!(
            "uploading {}",
            path.display()
        )))
    }
}

impl<T: Transport + ?Sized> Transport for &T {
    fn execute(&self, path: &str, request: &Value) -> Result<Option<Value>, TransportError> {
        (**self).execute(path, request)
    }

    fn upload(&self, path: &Path, format: &str) -> Result<String, TransportError> {
        (**self).upload(path, format)
    }
}

/// Supplies the JSON schema document describing one attribute service.
pub trait SchemaSource {
    fn fetch_schema(&self, service: Service) -> Result<Value, TransportError>;
}
