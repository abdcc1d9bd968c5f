use reqwest::{Method, Url};
use serde_json::Value;
use tracing::{debug, warn};

use crate::client::{build_url, decode_response, default_headers, parse_base_url, retry_after_header};
use crate::retry::RetryPolicy;
use crate::{ClientConfig, ClientError};

/// Generic blocking JSON REST client.
///
/// This is the synchronous counterpart of [`crate::ApiClient`]: same headers,
/// retry policy and error mapping, but it blocks the calling thread.
#[derive(Debug)]
pub struct BlockingApiClient {
    base_url: Url,
    http: reqwest::blocking::Client,
    retry: RetryPolicy,
    debug: bool,
}

impl BlockingApiClient {
    /// Creates a new client from the given configuration.
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let http = reqwest::blocking::Client::builder()
            .default_headers(default_headers(config)?)
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            base_url: parse_base_url(&config.base_url)?,
            http,
            retry: RetryPolicy::from_config(config),
            debug: config.debug,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Sends a `GET` request with query parameters and parses the response as JSON.
    pub fn get_json(&self, path: &str, query: &[(String, String)]) -> Result<Value, ClientError> {
        self.request_json_with_query(Method::GET, path, query, None)
    }

    /// Sends a `GET` request to an absolute URL, such as a pagination `nextHref`.
    pub fn get_json_url(&self, href: &str, query: &[(String, String)]) -> Result<Value, ClientError> {
        let url = Url::parse(href).map_err(|_| ClientError::InvalidPath(href.to_owned()))?;
        self.send(&Method::GET, &url, query, None)
    }

    /// Sends a `POST` request with a JSON body and parses the response as JSON.
    pub fn post_json(&self, path: &str, body: Value) -> Result<Value, ClientError> {
        self.request_json(Method::POST, path, Some(body))
    }

    /// Sends a `PUT` request with a JSON body and parses the response as JSON.
    pub fn put_json(&self, path: &str, body: Value) -> Result<Value, ClientError> {
        self.request_json(Method::PUT, path, Some(body))
    }

    /// Sends a `DELETE` request and parses the response as JSON.
    pub fn delete_json(&self, path: &str) -> Result<Value, ClientError> {
        self.request_json(Method::DELETE, path, None)
    }

    /// Sends a request and parses the response as JSON.
    pub fn request_json(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, ClientError> {
        self.request_json_with_query(method, path, &[], body)
    }

    /// Sends a request with query parameters and parses the response as JSON.
    ///
    /// Returns [`Value::Null`] for successful responses with an empty body.
    pub fn request_json_with_query(
        &self,
        method: Method,
        path: &str,
        query: &[(String, String)],
        body: Option<Value>,
    ) -> Result<Value, ClientError> {
        let url = build_url(&self.base_url, path)?;
        self.send(&method, &url, query, body.as_ref())
    }

    fn send(
        &self,
        method: &Method,
        url: &Url,
        query: &[(String, String)],
        body: Option<&Value>,
    ) -> Result<Value, ClientError> {
        debug!(%method, %url, "sending request");
        if self.debug {
            debug!(?query, body = ?body, "request payload");
        }

        let mut attempt = 0;
        loop {
            let error = match self.send_once(method, url, query, body) {
                Ok(value) => return Ok(value),
                Err(error) => error,
            };

            let Some(delay) = self.retry.delay_for(&error, attempt) else {
                return Err(error);
            };
            warn!(
                %url,
                attempt = attempt + 1,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                "{error}; retrying"
            );
            std::thread::sleep(delay);
            attempt += 1;
        }
    }

    fn send_once(
        &self,
        method: &Method,
        url: &Url,
        query: &[(String, String)],
        body: Option<&Value>,
    ) -> Result<Value, ClientError> {
        let mut request = self.http.request(method.clone(), url.clone());

        if !query.is_empty() {
            request = request.query(query);
        }

        if let Some(json_body) = body {
            request = request.json(json_body);
        }

        let response = request.send()?;
        let status = response.status();
        let retry_after = retry_after_header(response.headers());
        if self.debug {
            debug!(%status, headers = ?response.headers(), "response received");
        }

        let payload = response.text()?;
        if self.debug {
            debug!(body = %payload, "response body");
        }

        decode_response(status, retry_after.as_deref(), &payload)
    }
}
