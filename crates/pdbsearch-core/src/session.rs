//! Query execution — the paging session and the single-request paths.
//!
//! An [`Executor`] pairs a [`Transport`] with the endpoint path and default
//! page size. [`Executor::session`] returns a [`Session`]: a pull-based
//! cursor over the results that fetches pages on demand.
//!
//! # Session states
//!
//! ```text
//! Fresh ──first fetch──▶ Paging ──fetch──▶ Paging
//!   │                      │
//!   └────────┬─────────────┘
//!            ├─ empty page / 204 / offset ≥ total / limit ──▶ Exhausted
//!            └─ transport or parse error ──────────────────▶ Failed
//! ```
//!
//! Offsets only move forward, in steps of `rows`. Pulling from an exhausted
//! session yields nothing. Pulling from a failed one returns the same error
//! again; the `Iterator` impl reports it once and then ends. Nothing is
//! retried: starting over needs a new session.

use crate::config::ClientConfig;
use crate::error::{Result, SearchError};
use crate::options::{GroupByReturnType, RequestOptions};
use crate::query::Query;
use crate::request::{build_request, new_query_id, RequestMode, DEFAULT_QUERY_PATH};
use crate::response::{FacetResult, GroupedResults, ResultHit, SearchResponse};
use crate::transport::Transport;
use serde_json::Value;
use std::collections::VecDeque;
use std::path::Path;

const DEFAULT_ROWS: usize = 10_000;

/// Observable state of a [`Session`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Fresh,
    Paging,
    Exhausted,
    Failed,
}

#[derive(Debug)]
enum State {
    Fresh,
    Paging,
    Exhausted,
    Failed(SearchError),
}

// ---------------------------------------------------------------------------
// Executor
// ---------------------------------------------------------------------------

/// Runs queries through a transport.
#[derive(Debug, Clone)]
pub struct Executor<T> {
    transport: T,
    path: String,
    rows: usize,
}

impl<T: Transport> Executor<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            path: DEFAULT_QUERY_PATH.to_string(),
            rows: DEFAULT_ROWS,
        }
    }

    /// Endpoint path and default page size from the client configuration.
    pub fn from_config(transport: T, config: &ClientConfig) -> Self {
        Self {
            transport,
            path: config.service.query_path.clone(),
            rows: config.paging.rows.max(1),
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Default page size for sessions whose options do not set one.
    pub fn with_rows(mut self, rows: usize) -> Self {
        self.rows = rows.max(1);
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Validate `options` and open a session. No request is sent until the
    /// first pull.
    ///
    /// Grouped results (`group_by_return_type` [`GroupByReturnType::Groups`])
    /// carry no identifier list and are only available through
    /// [`Executor::groups`].
    pub fn session(&self, query: &Query, options: RequestOptions) -> Result<Session<'_, T>> {
        options.validate()?;
        if options.group_by_return_type == Some(GroupByReturnType::Groups) {
            return Err(SearchError::InvalidOption(
                "group_by_return_type groups needs Executor::groups".to_string(),
            ));
        }
        let rows = options.rows.unwrap_or(self.rows);
        Ok(Session {
            executor: self,
            query: query.clone(),
            query_json: None,
            query_id: new_query_id(),
            options,
            rows,
            state: State::Fresh,
            next_start: 0,
            total_count: None,
            buffer: VecDeque::new(),
            yielded: 0,
            fetches: 0,
            error_reported: false,
        })
    }

    /// Number of results, from a single request.
    pub fn count(&self, query: &Query, options: &RequestOptions) -> Result<u64> {
        options.validate()?;
        let query_json = self.prepare(query)?;
        let request = build_request(&query_json, options, &new_query_id(), RequestMode::Count);
        tracing::debug!(path = %self.path, "counting results");
        match self.transport.execute(&self.path, &request)? {
            Some(document) => Ok(SearchResponse::parse(document)?.total_count),
            None => Ok(0),
        }
    }

    /// Facet buckets for the facets in `options`, from a single request.
    pub fn facets(&self, query: &Query, options: &RequestOptions) -> Result<Vec<FacetResult>> {
        options.validate()?;
        if options.facets.is_empty() {
            return Err(SearchError::InvalidOption(
                "a facet request needs at least one facet".to_string(),
            ));
        }
        let query_json = self.prepare(query)?;
        let request = build_request(&query_json, options, &new_query_id(), RequestMode::Facets);
        tracing::debug!(path = %self.path, facets = options.facets.len(), "requesting facets");
        match self.transport.execute(&self.path, &request)? {
            Some(document) => Ok(SearchResponse::parse(document)?.facets),
            None => Ok(Vec::new()),
        }
    }

    /// The first page of groups of a grouped search.
    pub fn groups(&self, query: &Query, options: &RequestOptions) -> Result<GroupedResults> {
        options.validate()?;
        if options.group_by.is_none() {
            return Err(SearchError::InvalidOption(
                "a grouped request needs group_by".to_string(),
            ));
        }
        let query_json = self.prepare(query)?;
        let rows = options.rows.unwrap_or(self.rows);
        let request = build_request(
            &query_json,
            options,
            &new_query_id(),
            RequestMode::Page { start: 0, rows },
        );
        tracing::debug!(path = %self.path, rows, "requesting groups");
        match self.transport.execute(&self.path, &request)? {
            Some(document) => Ok(SearchResponse::parse(document)?.into_groups()),
            None => Ok(GroupedResults::default()),
        }
    }

    /// The request document a session would send for its first page, with a
    /// fresh query id. Local structure files are uploaded to build it.
    pub fn request_document(&self, query: &Query, options: &RequestOptions) -> Result<Value> {
        options.validate()?;
        let query_json = self.prepare(query)?;
        let rows = options.rows.unwrap_or(self.rows);
        Ok(build_request(
            &query_json,
            options,
            &new_query_id(),
            RequestMode::Page { start: 0, rows },
        ))
    }

    /// Upload local files, then serialize.
    fn prepare(&self, query: &Query) -> Result<Value> {
        if !query.needs_upload() {
            return query.to_json();
        }
        let resolved = query.resolve_uploads(&mut |path: &Path, format: &str| {
            tracing::info!(path = %path.display(), format, "uploading structure file");
            Ok(self.transport.upload(path, format)?)
        })?;
        resolved.to_json()
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// A lazy, forward-only cursor over the results of one query execution.
///
/// Iterating yields identifiers; [`Session::hits`] yields full
/// [`ResultHit`]s. Both resume where the previous pull stopped.
#[derive(Debug)]
pub struct Session<'e, T> {
    executor: &'e Executor<T>,
    query: Query,
    query_json: Option<Value>,
    query_id: String,
    options: RequestOptions,
    rows: usize,
    state: State,
    next_start: usize,
    total_count: Option<u64>,
    buffer: VecDeque<ResultHit>,
    yielded: usize,
    fetches: usize,
    error_reported: bool,
}

impl<'e, T: Transport> Session<'e, T> {
    pub fn state(&self) -> SessionState {
        match self.state {
            State::Fresh => SessionState::Fresh,
            State::Paging => SessionState::Paging,
            State::Exhausted => SessionState::Exhausted,
            State::Failed(_) => SessionState::Failed,
        }
    }

    pub fn query_id(&self) -> &str {
        &self.query_id
    }

    /// Total number of results, known after the first fetch.
    pub fn total_count(&self) -> Option<u64> {
        self.total_count
    }

    /// Number of requests sent so far.
    pub fn fetches(&self) -> usize {
        self.fetches
    }

    /// Whether a pull can still produce results.
    pub fn has_more(&self) -> bool {
        !self.buffer.is_empty() || matches!(self.state, State::Fresh | State::Paging)
    }

    /// Everything buffered, fetching the next page first if the buffer is
    /// empty. An empty batch means the session is exhausted.
    pub fn next_batch(&mut self) -> Result<Vec<ResultHit>> {
        if self.buffer.is_empty() {
            match &self.state {
                State::Exhausted => return Ok(Vec::new()),
                State::Failed(e) => return Err(e.clone()),
                State::Fresh | State::Paging => self.fetch_page()?,
            }
        }
        self.yielded += self.buffer.len();
        Ok(self.buffer.drain(..).collect())
    }

    /// Iterate over full result rows instead of identifiers.
    pub fn hits(&mut self) -> Hits<'_, 'e, T> {
        Hits { session: self }
    }

    fn next_hit(&mut self) -> Option<Result<ResultHit>> {
        loop {
            if let Some(hit) = self.buffer.pop_front() {
                self.yielded += 1;
                return Some(Ok(hit));
            }
            match &self.state {
                State::Exhausted => return None,
                State::Failed(e) => {
                    if self.error_reported {
                        return None;
                    }
                    self.error_reported = true;
                    return Some(Err(e.clone()));
                }
                State::Fresh | State::Paging => {
                    if let Err(e) = self.fetch_page() {
                        self.error_reported = true;
                        return Some(Err(e));
                    }
                }
            }
        }
    }

    /// Fetch the page at `next_start` into the buffer and advance the state.
    /// Only called with an empty buffer in `Fresh` or `Paging`.
    fn fetch_page(&mut self) -> Result<()> {
        match self.try_fetch_page() {
            Ok(()) => Ok(()),
            Err(e) => {
                tracing::debug!(query_id = %self.query_id, error = %e, "session failed");
                self.state = State::Failed(e.clone());
                Err(e)
            }
        }
    }

    fn try_fetch_page(&mut self) -> Result<()> {
        let query_json = match self.query_json.take() {
            Some(json) => json,
            None => self.executor.prepare(&self.query)?,
        };
        let start = self.next_start;
        let request = build_request(
            &query_json,
            &self.options,
            &self.query_id,
            RequestMode::Page {
                start,
                rows: self.rows,
            },
        );
        self.query_json = Some(query_json);

        tracing::debug!(query_id = %self.query_id, start, rows = self.rows, "fetching page");
        let response = self.executor.transport.execute(&self.executor.path, &request);
        self.fetches += 1;
        self.next_start += self.rows;

        let response = match response? {
            Some(document) => SearchResponse::parse(document)?,
            None => {
                tracing::debug!(query_id = %self.query_id, start, "no content");
                self.total_count.get_or_insert(0);
                self.state = State::Exhausted;
                return Ok(());
            }
        };

        let total = response.total_count;
        let mut hits = response.result_set;
        let received = hits.len();
        self.total_count = Some(total);
        tracing::debug!(query_id = %self.query_id, start, received, total, "page received");

        if received == 0 {
            self.state = State::Exhausted;
            return Ok(());
        }
        let more_on_server = (self.next_start as u64) < total;
        if received < self.rows && more_on_server {
            tracing::warn!(
                query_id = %self.query_id,
                start,
                received,
                rows = self.rows,
                total,
                "short page before the end of the results"
            );
        }

        let mut limit_reached = false;
        if let Some(limit) = self.options.limit {
            let remaining = limit.saturating_sub(self.yielded);
            if hits.len() >= remaining {
                hits.truncate(remaining);
                limit_reached = true;
            }
        }
        self.buffer.extend(hits);

        self.state = if limit_reached || !more_on_server {
            State::Exhausted
        } else {
            State::Paging
        };
        Ok(())
    }
}

/// Yields identifiers in result order.
///
/// A failed fetch is yielded once as `Some(Err(_))`; later calls return
/// `None`, the same as an exhausted session. Check [`Session::state`] to
/// tell the two apart, or use [`Session::next_batch`], which returns the
/// error on every call.
impl<T: Transport> Iterator for Session<'_, T> {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_hit().map(|hit| hit.map(|h| h.identifier))
    }
}

/// Iterator over the full result rows of a [`Session`].
pub struct Hits<'s, 'e, T> {
    session: &'s mut Session<'e, T>,
}

impl<T: Transport> Iterator for Hits<'_, '_, T> {
    type Item = Result<ResultHit>;

    fn next(&mut self) -> Option<Self::Item> {
        self.session.next_hit()
    }
}

// ---------------------------------------------------------------------------
// Query entry points
// ---------------------------------------------------------------------------

impl Query {
    /// Open a paging session for this query.
    pub fn exec<'e, T: Transport>(
        &self,
        executor: &'e Executor<T>,
        options: RequestOptions,
    ) -> Result<Session<'e, T>> {
        executor.session(self, options)
    }

    pub fn count<T: Transport>(&self, executor: &Executor<T>, options: &RequestOptions) -> Result<u64> {
        executor.count(self, options)
    }

    pub fn facets<T: Transport>(
        &self,
        executor: &Executor<T>,
        options: &RequestOptions,
    ) -> Result<Vec<FacetResult>> {
        executor.facets(self, options)
    }

    pub fn groups<T: Transport>(
        &self,
        executor: &Executor<T>,
        options: &RequestOptions,
    ) -> Result<GroupedResults> {
        executor.groups(self, options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;
    use crate::term::Terminal;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::cell::RefCell;

    /// Serves scripted responses in order and records each request.
    struct Scripted {
        responses: RefCell<VecDeque<std::result::Result<Option<Value>, TransportError>>>,
        requests: RefCell<Vec<Value>>,
    }

    impl Scripted {
        fn new(
            responses: impl IntoIterator<Item = std::result::Result<Option<Value>, TransportError>>,
        ) -> Self {
            Self {
                responses: RefCell::new(responses.into_iter().collect()),
                requests: RefCell::new(Vec::new()),
            }
        }

        fn starts(&self) -> Vec<u64> {
            self.requests
                .borrow()
                .iter()
                .map(|r| r["request_options"]["paginate"]["start"].as_u64().unwrap())
                .collect()
        }
    }

    impl Transport for Scripted {
        fn execute(&self, _path: &str, request: &Value) -> std::result::Result<Option<Value>, TransportError> {
            self.requests.borrow_mut().push(request.clone());
            self.responses
                .borrow_mut()
                .pop_front()
                .unwrap_or_else(|| Err(TransportError::Connection("script exhausted".to_string())))
        }
    }

    fn page(total: u64, ids: &[&str]) -> std::result::Result<Option<Value>, TransportError> {
        Ok(Some(json!({"total_count": total, "result_set": ids})))
    }

    fn query() -> Query {
        Terminal::full_text("thymidine kinase").unwrap().into()
    }

    #[test]
    fn pages_until_total_count() {
        let executor = Executor::new(Scripted::new([
            page(5, &["A", "B"]),
            page(5, &["C", "D"]),
            page(5, &["E"]),
        ]));
        let mut session = executor.session(&query(), RequestOptions::default().rows(2)).unwrap();
        assert_eq!(session.state(), SessionState::Fresh);

        let ids: Vec<String> = session.by_ref().collect::<Result<_>>().unwrap();
        assert_eq!(ids, vec!["A", "B", "C", "D", "E"]);
        assert_eq!(session.fetches(), 3);
        assert_eq!(session.state(), SessionState::Exhausted);
        assert_eq!(executor.transport().starts(), vec![0, 2, 4]);
        // re-entering does not restart
        assert_eq!(session.next(), None);
        assert_eq!(session.fetches(), 3);
    }

    #[test]
    fn failure_keeps_earlier_results() {
        let executor = Executor::new(Scripted::new([
            page(5, &["A", "B"]),
            Err(TransportError::Status {
                status: 500,
                body: "boom".to_string(),
            }),
        ]));
        let mut session = executor.session(&query(), RequestOptions::default().rows(2)).unwrap();
        assert_eq!(session.next(), Some(Ok("A".to_string())));
        assert_eq!(session.next(), Some(Ok("B".to_string())));
        assert!(matches!(session.next(), Some(Err(SearchError::Transport(_)))));
        assert_eq!(session.state(), SessionState::Failed);
        assert_eq!(session.next(), None);
        // batch pulls keep re-raising
        assert!(session.next_batch().is_err());
        assert!(session.next_batch().is_err());
        assert_eq!(session.fetches(), 2);
    }

    #[test]
    fn no_content_means_no_results() {
        let executor = Executor::new(Scripted::new([Ok(None)]));
        let mut session = executor.session(&query(), RequestOptions::default()).unwrap();
        assert_eq!(session.next(), None);
        assert_eq!(session.total_count(), Some(0));
        assert!(!session.has_more());
    }

    #[test]
    fn limit_stops_paging() {
        let executor = Executor::new(Scripted::new([page(10, &["A", "B", "C"]), page(10, &["D", "E", "F"])]));
        let mut session = executor
            .session(&query(), RequestOptions::default().rows(3).limit(4))
            .unwrap();
        let ids: Vec<String> = session.by_ref().collect::<Result<_>>().unwrap();
        assert_eq!(ids, vec!["A", "B", "C", "D"]);
        assert_eq!(session.fetches(), 2);
    }

    #[test]
    fn batches_drain_pages() {
        let executor = Executor::new(Scripted::new([page(3, &["A", "B"]), page(3, &["C"])]));
        let mut session = executor.session(&query(), RequestOptions::default().rows(2)).unwrap();
        assert!(session.has_more());
        assert_eq!(session.next_batch().unwrap().len(), 2);
        assert_eq!(session.next_batch().unwrap(), vec![ResultHit::new("C")]);
        assert!(session.next_batch().unwrap().is_empty());
        assert!(!session.has_more());
    }

    #[test]
    fn count_is_one_request() {
        let executor = Executor::new(Scripted::new([Ok(Some(json!({"total_count": 1234})))]));
        assert_eq!(query().count(&executor, &RequestOptions::default()).unwrap(), 1234);
        let requests = executor.transport().requests.borrow();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0]["request_options"]["return_counts"], true);
    }

    #[test]
    fn invalid_options_fail_before_io() {
        let executor = Executor::new(Scripted::new([]));
        let opts = RequestOptions::default().limit(0);
        assert!(executor.session(&query(), opts.clone()).is_err());
        assert!(executor.count(&query(), &opts).is_err());
        assert!(executor.facets(&query(), &RequestOptions::default()).is_err());
        assert!(executor.transport().requests.borrow().is_empty());
    }

    #[test]
    fn query_id_is_stable_within_a_session() {
        let executor = Executor::new(Scripted::new([page(4, &["A", "B"]), page(4, &["C", "D"])]));
        let mut session = executor.session(&query(), RequestOptions::default().rows(2)).unwrap();
        let _ = session.by_ref().count();
        let requests = executor.transport().requests.borrow();
        assert_eq!(requests[0]["request_info"]["query_id"], session.query_id());
        assert_eq!(requests[1]["request_info"]["query_id"], session.query_id());
    }
}
