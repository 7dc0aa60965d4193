//! Domain-specific assertion macros for pdbsearch harnesses.

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Assert that an expression fails with a `SearchError` matching `pattern`.
///
/// ```rust
/// assert_search_err!(Residue::new("A", "1", 0, ["ALA"]), SearchError::OutOfRangeParameter { .. });
/// ```
#[macro_export]
macro_rules! assert_search_err {
    ($expr:expr, $pattern:pat) => {{
        match $expr {
            Err(e @ $pattern) => e,
            Err(other) => panic!(
                "assert_search_err! failed:\n  expected: {}\n  actual:   {:?}",
                stringify!($pattern),
                other
            ),
            Ok(value) => panic!(
                "assert_search_err! failed: expected {}, got Ok({:?})",
                stringify!($pattern),
                value
            ),
        }
    }};
}

// ---------------------------------------------------------------------------
// Request documents
// ---------------------------------------------------------------------------

/// Assert the `paginate` window of a request document.
#[macro_export]
macro_rules! assert_paginate {
    ($request:expr, $start:expr, $rows:expr) => {{
        let request: &serde_json::Value = &$request;
        let expected = serde_json::json!({"start": $start, "rows": $rows});
        let actual = &request["request_options"]["paginate"];
        if *actual != expected {
            panic!(
                "assert_paginate! failed:\n  expected: {}\n  actual:   {}\n  request:  {}",
                expected, actual, request
            );
        }
    }};
}

/// Assert that every terminal of a serialized query carries `service`.
#[macro_export]
macro_rules! assert_all_services {
    ($query_json:expr, $service:expr) => {{
        fn walk(node: &serde_json::Value, out: &mut Vec<String>) {
            match node["type"].as_str() {
                Some("terminal") => out.push(node["service"].as_str().unwrap_or("").to_string()),
                Some("group") => {
                    for child in node["nodes"].as_array().into_iter().flatten() {
                        walk(child, out);
                    }
                }
                _ => {}
            }
        }
        let mut services = Vec::new();
        walk(&$query_json, &mut services);
        if services.is_empty() || services.iter().any(|s| s != $service) {
            panic!(
                "assert_all_services! failed: expected every terminal on {:?}, got {:?}",
                $service, services
            );
        }
    }};
}
