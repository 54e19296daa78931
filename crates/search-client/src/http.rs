use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::StatusCode;
use url::Url;

use crate::backend::SearchBackend;
use crate::error::{Error, Result};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

fn is_2xx(status: StatusCode) -> bool {
    status.is_success()
}

/// HTTP wrapper over a pool of base URLs with basic auth and a 60
/// second request timeout (spec.md §4.1).
pub struct HttpSearchClient {
    client: Client,
    base_urls: Vec<Url>,
    next: AtomicUsize,
    user: String,
    password: String,
}

impl HttpSearchClient {
    pub fn new(base_urls: Vec<Url>, user: impl Into<String>, password: impl Into<String>) -> Result<Self> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            base_urls,
            next: AtomicUsize::new(0),
            user: user.into(),
            password: password.into(),
        })
    }

    fn base_url(&self) -> &Url {
        let idx = self.next.fetch_add(1, Ordering::Relaxed) % self.base_urls.len();
        &self.base_urls[idx]
    }

    fn url(&self, path: &str) -> Result<Url> {
        Ok(self.base_url().join(path)?)
    }

    fn request(
        &self,
        method: reqwest::Method,
        path: &str,
        body: Option<&str>,
    ) -> Result<reqwest::blocking::Response> {
        let url = self.url(path)?;
        let mut req = self
            .client
            .request(method, url)
            .basic_auth(&self.user, Some(&self.password))
            .header("Content-Type", "application/json");
        if let Some(b) = body {
            req = req.body(b.to_string());
        }
        Ok(req.send()?)
    }

    fn require_2xx(resp: reqwest::blocking::Response) -> Result<String> {
        let status = resp.status();
        let body = resp.text()?;
        if is_2xx(status) {
            Ok(body)
        } else {
            Err(Error::ResponseCode {
                code: status.as_u16(),
                body,
            })
        }
    }

    fn assert_no_bulk_errors(body: &str) -> Result<()> {
        let parsed: serde_json::Value = serde_json::from_str(body)?;
        let errors = parsed.get("errors").and_then(|v| v.as_bool()).unwrap_or(true);
        if errors {
            Err(Error::BulkErrors { body: body.to_string() })
        } else {
            Ok(())
        }
    }
}

impl SearchBackend for HttpSearchClient {
    fn head(&self, path: &str) -> Result<bool> {
        let resp = self.request(reqwest::Method::HEAD, path, None)?;
        match resp.status() {
            StatusCode::OK => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            other => Err(Error::ResponseCode {
                code: other.as_u16(),
                body: String::new(),
            }),
        }
    }

    fn index(&self, index: &str, body: &str, id: Option<&str>) -> Result<()> {
        let path = match id {
            Some(id) => format!("{index}/_doc/{id}"),
            None => format!("{index}/_doc"),
        };
        let resp = self.request(reqwest::Method::PUT, &path, Some(body))?;
        Self::require_2xx(resp)?;
        Ok(())
    }

    fn create(&self, index: &str, body: &str, id: &str) -> Result<u16> {
        let path = format!("{index}/_doc/{id}/_create");
        let resp = self.request(reqwest::Method::PUT, &path, Some(body))?;
        let status = resp.status();
        if is_2xx(status) || status == StatusCode::CONFLICT {
            Ok(status.as_u16())
        } else {
            let body = resp.text()?;
            Err(Error::ResponseCode {
                code: status.as_u16(),
                body,
            })
        }
    }

    fn get(&self, index: &str, id: &str) -> Result<Option<serde_json::Value>> {
        let path = format!("{index}/_doc/{id}");
        let resp = self.request(reqwest::Method::GET, &path, None)?;
        match resp.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if is_2xx(status) => Ok(Some(serde_json::from_str(&resp.text()?)?)),
            status => Err(Error::ResponseCode {
                code: status.as_u16(),
                body: resp.text().unwrap_or_default(),
            }),
        }
    }

    fn search(&self, index: &str, query: &str) -> Result<serde_json::Value> {
        let path = format!("{index}/_search");
        let resp = self.request(reqwest::Method::GET, &path, Some(query))?;
        let body = Self::require_2xx(resp)?;
        Ok(serde_json::from_str(&body)?)
    }

    fn count(&self, index: &str, query: Option<&str>) -> Result<u64> {
        let path = format!("{index}/_doc/_count");
        let resp = self.request(reqwest::Method::GET, &path, query)?;
        let body = Self::require_2xx(resp)?;
        let parsed: serde_json::Value = serde_json::from_str(&body)?;
        Ok(parsed.get("count").and_then(|v| v.as_u64()).unwrap_or(0))
    }

    fn update(&self, index: &str, id: &str, body: &str) -> Result<()> {
        let path = format!("{index}/_doc/{id}/_update");
        let resp = self.request(reqwest::Method::POST, &path, Some(body))?;
        Self::require_2xx(resp)?;
        Ok(())
    }

    fn delete_by_query(&self, index: &str, query: &str) -> Result<()> {
        let path = format!("{index}/_doc/_delete_by_query");
        let resp = self.request(reqwest::Method::POST, &path, Some(query))?;
        Self::require_2xx(resp)?;
        Ok(())
    }

    fn delete_index(&self, index: &str) -> Result<()> {
        let resp = self.request(reqwest::Method::DELETE, index, None)?;
        match resp.status() {
            StatusCode::NOT_FOUND => Ok(()),
            status if is_2xx(status) => Ok(()),
            status => Err(Error::ResponseCode {
                code: status.as_u16(),
                body: resp.text().unwrap_or_default(),
            }),
        }
    }

    fn create_index(&self, index: &str, mapping: &str) -> Result<()> {
        let resp = self.request(reqwest::Method::PUT, index, Some(mapping))?;
        Self::require_2xx(resp)?;
        Ok(())
    }

    fn bulk(&self, ndjson: &str) -> Result<()> {
        let resp = self.request(reqwest::Method::POST, "_bulk", Some(ndjson))?;
        let body = Self::require_2xx(resp)?;
        Self::assert_no_bulk_errors(&body)
    }

    fn bulk_index(&self, index: &str, ndjson: &str) -> Result<()> {
        let path = format!("{index}/_bulk");
        let resp = self.request(reqwest::Method::POST, &path, Some(ndjson))?;
        let body = Self::require_2xx(resp)?;
        Self::assert_no_bulk_errors(&body)
    }
}
