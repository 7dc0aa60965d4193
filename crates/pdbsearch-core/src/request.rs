//! Request documents sent to the search endpoint.

use crate::options::RequestOptions;
use serde_json::{json, Map, Value};

/// Path of the search endpoint, relative to the service's base URL.
pub const DEFAULT_QUERY_PATH: &str = "/rcsbsearch/v2/query";

/// What one request asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestMode {
    /// One page of results.
    Page { start: usize, rows: usize },
    /// Only `total_count`.
    Count,
    /// Facet buckets, no result rows.
    Facets,
}

/// A fresh request id: a v4 UUID as 32 hex digits.
pub fn new_query_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Assemble the request document around an already serialized query.
pub fn build_request(query: &Value, options: &RequestOptions, query_id: &str, mode: RequestMode) -> Value {
    let mut request_options = Map::new();

    match mode {
        RequestMode::Page { start, rows } => {
            request_options.insert("paginate".into(), json!({"start": start, "rows": rows}));
        }
        RequestMode::Count => {
            request_options.insert("return_counts".into(), json!(true));
        }
        RequestMode::Facets => {
            request_options.insert("paginate".into(), json!({"start": 0, "rows": 0}));
        }
    }

    request_options.insert("results_content_type".into(), json!(options.content_types));
    if mode != RequestMode::Count {
        request_options.insert("results_verbosity".into(), json!(options.verbosity));
        if !options.sort.is_empty() {
            request_options.insert("sort".into(), json!(options.sort));
        }
        if !options.facets.is_empty() {
            request_options.insert("facets".into(), json!(options.facets));
        }
        if let Some(group_by) = &options.group_by {
            request_options.insert("group_by".into(), json!(group_by));
        }
        if let Some(return_type) = options.group_by_return_type {
            request_options.insert("group_by_return_type".into(), json!(return_type));
        }
    }
    if options.return_all_hits {
        request_options.insert("return_all_hits".into(), json!(true));
    }

    json!({
        "query": query,
        "return_type": options.return_type,
        "request_info": {"query_id": query_id, "src": "ui"},
        "request_options": request_options,
    })
}
