//! Scripted in-memory [`Transport`] for session tests.
//!
//! Each `execute` call pops the next scripted reply and records the request
//! document it was given. Running past the end of the script is a connection
//! error, so an unexpected extra fetch fails the test loudly.

use pdbsearch::{Transport, TransportError};
use serde_json::{json, Value};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};

type Reply = Result<Option<Value>, TransportError>;

#[derive(Debug, Default)]
pub struct StubTransport {
    replies: RefCell<VecDeque<Reply>>,
    requests: RefCell<Vec<(String, Value)>>,
    uploads: RefCell<Vec<(PathBuf, String)>>,
}

impl StubTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reply with a page of compact identifiers.
    pub fn page(self, total_count: u64, ids: &[&str]) -> Self {
        self.reply(Ok(Some(page_document(total_count, ids))))
    }

    /// Reply with HTTP 204.
    pub fn no_content(self) -> Self {
        self.reply(Ok(None))
    }

    pub fn document(self, document: Value) -> Self {
        self.reply(Ok(Some(document)))
    }

    pub fn fail(self, error: TransportError) -> Self {
        self.reply(Err(error))
    }

    pub fn reply(self, reply: Reply) -> Self {
        self.replies.borrow_mut().push_back(reply);
        self
    }

    /// Request documents in the order they were sent.
    pub fn requests(&self) -> Vec<Value> {
        self.requests.borrow().iter().map(|(_, r)| r.clone()).collect()
    }

    pub fn paths(&self) -> Vec<String> {
        self.requests.borrow().iter().map(|(p, _)| p.clone()).collect()
    }

    pub fn request_count(&self) -> usize {
        self.requests.borrow().len()
    }

    /// `paginate.start` of every request that had one.
    pub fn page_starts(&self) -> Vec<u64> {
        self.requests
            .borrow()
            .iter()
            .filter_map(|(_, r)| r["request_options"]["paginate"]["start"].as_u64())
            .collect()
    }

    pub fn uploads(&self) -> Vec<(PathBuf, String)> {
        self.uploads.borrow().clone()
    }
}

impl Transport for StubTransport {
    fn execute(&self, path: &str, request: &Value) -> Result<Option<Value>, TransportError> {
        self.requests
            .borrow_mut()
            .push((path.to_string(), request.clone()));
        self.replies
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::Connection("stub script exhausted".to_string())))
    }

    fn upload(&self, path: &Path, format: &str) -> Result<String, TransportError> {
        self.uploads
            .borrow_mut()
            .push((path.to_path_buf(), format.to_string()));
        Ok(format!("https://uploads.test/download/{}", self.uploads.borrow().len()))
    }
}

pub fn page_document(total_count: u64, ids: &[&str]) -> Value {
    json!({
        "query_id": "stub",
        "result_type": "entry",
        "total_count": total_count,
        "result_set": ids,
    })
}
