//! `reqwest::blocking` implementation of [`Transport`] and [`SchemaSource`].
//!
//! Requests go out as `GET <base_url><path>?json=<compact request document>`.
//! A single transport spaces its requests at least `1 / requests_per_second`
//! apart; concurrent callers queue on the throttle.

use pdbsearch_core::config::ClientConfig;
use pdbsearch_core::{SchemaSource, Service, Transport, TransportError};
use reqwest::blocking::{multipart, Client, Response};
use reqwest::StatusCode;
use serde_json::Value;
use std::path::Path;
use std::sync::Mutex;
use std::time::{Duration, Instant};

pub struct HttpTransport {
    client: Client,
    base_url: String,
    structure_schema_url: String,
    chemical_schema_url: String,
    upload_url: String,
    download_url: String,
    min_interval: Option<Duration>,
    last_request: Mutex<Option<Instant>>,
}

impl HttpTransport {
    /// Build a transport from the `[service]` and `[http]` sections.
    pub fn new(config: &ClientConfig) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.http.timeout_secs))
            .user_agent(config.http.user_agent.clone())
            .build()
            .map_err(|e| TransportError::Connection(format!("building HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.service.base_url.trim_end_matches('/').to_string(),
            structure_schema_url: config.service.structure_schema_url.clone(),
            chemical_schema_url: config.service.chemical_schema_url.clone(),
            upload_url: config.service.upload_url.clone(),
            download_url: config.service.download_url.clone(),
            min_interval: min_interval(config.http.requests_per_second),
            last_request: Mutex::new(None),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Block until the next request is allowed.
    fn throttle(&self) {
        let Some(interval) = self.min_interval else {
            return;
        };
        let mut last = self
            .last_request
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < interval {
                std::thread::sleep(interval - elapsed);
            }
        }
        *last = Some(Instant::now());
    }

    fn get_json(&self, url: &str, query: Option<&str>) -> Result<Option<Value>, TransportError> {
        self.throttle();
        let mut request = self.client.get(url);
        if let Some(json) = query {
            request = request.query(&[("json", json)]);
        }
        let response = request.send().map_err(connection_error)?;
        read_document(response)
    }
}

impl Transport for HttpTransport {
    fn execute(&self, path: &str, request: &Value) -> Result<Option<Value>, TransportError> {
        let url = format!("{}{}", self.base_url, path);
        let body = request.to_string();
        tracing::debug!(%url, bytes = body.len(), "sending search request");
        let document = self.get_json(&url, Some(&body))?;
        if document.is_none() {
            tracing::debug!(%url, "search returned no content");
        }
        Ok(document)
    }

    fn upload(&self, path: &Path, format: &str) -> Result<String, TransportError> {
        let form = multipart::Form::new()
            .text("format", format.to_string())
            .file("file", path)
            .map_err(|e| TransportError::Connection(format!("reading {}: {e}", path.display())))?;

        self.throttle();
        tracing::debug!(url = %self.upload_url, path = %path.display(), "uploading file");
        let response = self
            .client
            .post(&self.upload_url)
            .multipart(form)
            .send()
            .map_err(connection_error)?;

        let document = read_document(response)?
            .ok_or_else(|| TransportError::Malformed("empty upload response".to_string()))?;
        let key = document
            .get("key")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                TransportError::Malformed("upload response has no `key`; check the file format".to_string())
            })?;
        Ok(format!("{}{}", self.download_url, key))
    }
}

impl SchemaSource for HttpTransport {
    fn fetch_schema(&self, service: Service) -> Result<Value, TransportError> {
        let url = match service {
            Service::TextChem => &self.chemical_schema_url,
            _ => &self.structure_schema_url,
        };
        tracing::debug!(%url, %service, "fetching schema");
        self.get_json(url, None)?
            .ok_or_else(|| TransportError::Malformed(format!("empty schema document from {url}")))
    }
}

fn min_interval(requests_per_second: u32) -> Option<Duration> {
    (requests_per_second > 0).then(|| Duration::from_nanos(1_000_000_000 / u64::from(requests_per_second)))
}

fn connection_error(err: reqwest::Error) -> TransportError {
    TransportError::Connection(err.to_string())
}

fn read_document(response: Response) -> Result<Option<Value>, TransportError> {
    let status = response.status();
    if status == StatusCode::NO_CONTENT {
        return Ok(None);
    }
    let body = response.text().map_err(connection_error)?;
    if !status.is_success() {
        return Err(TransportError::Status {
            status: status.as_u16(),
            body,
        });
    }
    serde_json::from_str(&body)
        .map(Some)
        .map_err(|e| TransportError::Malformed(e.to_string()))
}
