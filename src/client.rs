use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, RETRY_AFTER};
use reqwest::{Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::entity::ListResponse;
use crate::retry::RetryPolicy;
use crate::{ClientConfig, ClientError};

/// Generic async JSON REST client for the API.
///
/// Handles authentication headers, timeouts, retries and status mapping.
/// Typed access to entities lives in [`crate::EntityRepository`] and
/// [`crate::MoySklad`], which are built on top of this client.
///
/// Cloning is cheap: clones share one connection pool.
#[derive(Clone, Debug)]
pub struct ApiClient {
    base_url: Url,
    http: reqwest::Client,
    retry: RetryPolicy,
    debug: bool,
}

impl ApiClient {
    /// Creates a new client from the given configuration.
    ///
    /// The base URL is normalized to include a trailing slash, so relative
    /// endpoint paths join correctly.
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
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

    /// Returns the normalized API root.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Sends a `GET` request with query parameters and parses the response as JSON.
    pub async fn get_json(&self, path: &str, query: &[(String, String)]) -> Result<Value, ClientError> {
        self.request_json_with_query(Method::GET, path, query, None).await
    }

    /// Sends a `GET` request to an absolute URL, such as a pagination `nextHref`.
    pub async fn get_json_url(&self, href: &str, query: &[(String, String)]) -> Result<Value, ClientError> {
        let url = Url::parse(href).map_err(|_| ClientError::InvalidPath(href.to_owned()))?;
        self.send(Method::GET, url, query, None).await
    }

    /// Reads every page of a list endpoint, following `meta.nextHref` until
    /// it is absent or empty.
    pub async fn get_all_rows<R: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> Result<Vec<R>, ClientError> {
        let mut page: ListResponse<R> = serde_json::from_value(self.get_json(path, query).await?)?;
        let mut rows = std::mem::take(&mut page.rows);
        let mut pages = 1_usize;

        while let Some(next) = page.meta.next_href.take().filter(|href| !href.is_empty()) {
            page = serde_json::from_value(self.get_json_url(&next, &[]).await?)?;
            rows.append(&mut page.rows);
            pages += 1;
        }

        debug!(path, pages, rows = rows.len(), "fetched all pages");
        Ok(rows)
    }

    /// Sends a `POST` request with a JSON body and parses the response as JSON.
    pub async fn post_json(&self, path: &str, body: Value) -> Result<Value, ClientError> {
        self.request_json(Method::POST, path, Some(body)).await
    }

    /// Sends a `PUT` request with a JSON body and parses the response as JSON.
    pub async fn put_json(&self, path: &str, body: Value) -> Result<Value, ClientError> {
        self.request_json(Method::PUT, path, Some(body)).await
    }

    /// Sends a `DELETE` request and parses the response as JSON.
    pub async fn delete_json(&self, path: &str) -> Result<Value, ClientError> {
        self.request_json(Method::DELETE, path, None).await
    }

    /// Sends a request and parses the response as JSON.
    ///
    /// Use [`Self::request_json_with_query`] when query parameters are needed.
    pub async fn request_json(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, ClientError> {
        self.request_json_with_query(method, path, &[], body).await
    }

    /// Sends a request with query parameters and parses the response as JSON.
    ///
    /// Returns [`Value::Null`] for successful responses with an empty body.
    pub async fn request_json_with_query(
        &self,
        method: Method,
        path: &str,
        query: &[(String, String)],
        body: Option<Value>,
    ) -> Result<Value, ClientError> {
        let url = build_url(&self.base_url, path)?;
        self.send(method, url, query, body.as_ref()).await
    }

    async fn send(
        &self,
        method: Method,
        url: Url,
        query: &[(String, String)],
        body: Option<&Value>,
    ) -> Result<Value, ClientError> {
        debug!(%method, %url, "sending request");
        if self.debug {
            debug!(?query, body = ?body, "request payload");
        }

        let mut attempt = 0;
        loop {
            let error = match self.send_once(method.clone(), url.clone(), query, body).await {
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
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    async fn send_once(
        &self,
        method: Method,
        url: Url,
        query: &[(String, String)],
        body: Option<&Value>,
    ) -> Result<Value, ClientError> {
        let mut request = self.http.request(method, url);

        if !query.is_empty() {
            request = request.query(query);
        }

        if let Some(json_body) = body {
            request = request.json(json_body);
        }

        let response = request.send().await?;
        let status = response.status();
        let retry_after = retry_after_header(response.headers());
        if self.debug {
            debug!(%status, headers = ?response.headers(), "response received");
        }

        let payload = response.text().await?;
        if self.debug {
            debug!(body = %payload, "response body");
        }

        decode_response(status, retry_after.as_deref(), &payload)
    }
}

/// Headers attached to every request.
pub(crate) fn default_headers(config: &ClientConfig) -> Result<HeaderMap, ClientError> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

    if let Some(token) = &config.token {
        let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|_| ClientError::InvalidToken)?;
        value.set_sensitive(true);
        headers.insert(AUTHORIZATION, value);
    }

    Ok(headers)
}

pub(crate) fn parse_base_url(base_url: &str) -> Result<Url, ClientError> {
    let parsed = Url::parse(base_url).map_err(|_| ClientError::InvalidBaseUrl(base_url.to_owned()))?;
    Ok(ensure_trailing_slash(parsed))
}

pub(crate) fn build_url(base_url: &Url, path: &str) -> Result<Url, ClientError> {
    let relative = path.trim_start_matches('/');
    base_url
        .join(relative)
        .map_err(|_| ClientError::InvalidPath(path.to_owned()))
}

pub(crate) fn retry_after_header(headers: &HeaderMap) -> Option<String> {
    headers
        .get(RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned)
}

/// Turns a response into JSON or the error its status maps to.
pub(crate) fn decode_response(
    status: StatusCode,
    retry_after: Option<&str>,
    payload: &str,
) -> Result<Value, ClientError> {
    if !status.is_success() {
        return Err(ClientError::from_response(status, retry_after, payload));
    }

    if payload.trim().is_empty() {
        Ok(Value::Null)
    } else {
        Ok(serde_json::from_str(payload)?)
    }
}

fn ensure_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let mut path = url.path().to_owned();
        path.push('/');
        url.set_path(&path);
    }
    url
}

#[cfg(test)]
mod tests {
    use reqwest::StatusCode;
    use reqwest::header::AUTHORIZATION;
    use serde_json::{Value, json};

    use std::net::TcpListener;
    use std::time::{Duration, Instant};

    use mockito::Matcher;

    use super::{ApiClient, build_url, decode_response, default_headers};
    use crate::{ClientConfig, ClientError};

    fn mock_client(server: &mockito::ServerGuard, retry_count: u32) -> ApiClient {
        let config = ClientConfig::new("token")
            .with_base_url(server.url())
            .with_retry_count(retry_count)
            .with_retry_delay(Duration::from_millis(1));
        ApiClient::new(&config).expect("valid config")
    }

    #[test]
    fn joins_paths_from_base_with_nested_prefix() {
        let client = ApiClient::new(&ClientConfig::default()).expect("valid config");
        let resolved = build_url(client.base_url(), "/entity/product").expect("valid path");
        assert_eq!(
            resolved.as_str(),
            "https://api.moysklad.ru/api/remap/1.2/entity/product"
        );
    }

    #[test]
    fn rejects_relative_base_url() {
        let config = ClientConfig::default().with_base_url("not a url");
        let error = ApiClient::new(&config).expect_err("base url must be absolute");
        assert!(matches!(error, ClientError::InvalidBaseUrl(url) if url == "not a url"));
    }

    #[test]
    fn authorization_header_is_bearer_and_sensitive() {
        let headers = default_headers(&ClientConfig::new("abc")).expect("valid token");
        let value = headers.get(AUTHORIZATION).expect("authorization header");
        assert_eq!(value.to_str().expect("ascii"), "Bearer abc");
        assert!(value.is_sensitive());

        let anonymous = default_headers(&ClientConfig::default()).expect("no token");
        assert!(anonymous.get(AUTHORIZATION).is_none());
    }

    #[test]
    fn rejects_token_with_newline() {
        let error = default_headers(&ClientConfig::new("abc\ndef")).expect_err("invalid header");
        assert!(matches!(error, ClientError::InvalidToken));
    }

    #[test]
    fn empty_success_body_is_null() {
        let value = decode_response(StatusCode::OK, None, "  ").expect("success");
        assert_eq!(value, Value::Null);

        let value = decode_response(StatusCode::CREATED, None, r#"{"id":"1"}"#).expect("success");
        assert_eq!(value, json!({"id": "1"}));
    }

    #[tokio::test]
    async fn get_json_sends_token_and_query() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/entity/product")
            .match_header("authorization", "Bearer token")
            .match_header("accept", "application/json")
            .match_query(Matcher::UrlEncoded("limit".into(), "5".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"rows":[]}"#)
            .create_async()
            .await;

        let client = mock_client(&server, 1);
        let value = client
            .get_json("/entity/product", &[("limit".to_owned(), "5".to_owned())])
            .await
            .expect("request succeeds");

        mock.assert_async().await;
        assert_eq!(value, json!({"rows": []}));
    }

    #[tokio::test]
    async fn rate_limited_request_is_retried() {
        let mut server = mockito::Server::new_async().await;
        let limited = server
            .mock("GET", "/context")
            .with_status(429)
            .with_header("retry-after", "0")
            .with_body(r#"{"errors":[{"error":"slow down"}]}"#)
            .expect(1)
            .create_async()
            .await;
        let ok = server
            .mock("GET", "/context")
            .with_status(200)
            .with_body(r#"{"employee":{}}"#)
            .expect(1)
            .create_async()
            .await;

        let value = mock_client(&server, 3)
            .get_json("context", &[])
            .await
            .expect("second attempt succeeds");

        limited.assert_async().await;
        ok.assert_async().await;
        assert_eq!(value, json!({"employee": {}}));
    }

    #[tokio::test]
    async fn gives_up_after_configured_attempts() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/context")
            .with_status(429)
            .with_header("retry-after", "0")
            .expect(2)
            .create_async()
            .await;

        let error = mock_client(&server, 2)
            .get_json("context", &[])
            .await
            .expect_err("rate limit persists");

        mock.assert_async().await;
        assert!(matches!(error, ClientError::RateLimited { .. }));
    }

    #[tokio::test]
    async fn validation_errors_are_not_retried() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/entity/product")
            .match_body(Matcher::Json(json!({"name": ""})))
            .with_status(412)
            .with_body(r#"{"errors":[{"error":"name is required","code":3000}]}"#)
            .expect(1)
            .create_async()
            .await;

        let error = mock_client(&server, 3)
            .post_json("entity/product", json!({"name": ""}))
            .await
            .expect_err("rejected");

        mock.assert_async().await;
        assert!(matches!(&error, ClientError::Validation(api) if api.message == "name is required"));
        assert_eq!(error.status(), Some(StatusCode::PRECONDITION_FAILED));
    }

    #[tokio::test]
    async fn delete_with_empty_body_returns_null() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("DELETE", "/entity/product/p1")
            .with_status(200)
            .create_async()
            .await;

        let value = mock_client(&server, 1)
            .delete_json("entity/product/p1")
            .await
            .expect("deleted");

        mock.assert_async().await;
        assert_eq!(value, Value::Null);
    }

    #[tokio::test]
    async fn next_href_is_requested_verbatim() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/entity/product")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("limit".into(), "1".into()),
                Matcher::UrlEncoded("offset".into(), "1".into()),
            ]))
            .with_status(200)
            .with_body(r#"{"rows":[{"name":"b"}]}"#)
            .create_async()
            .await;

        let href = format!("{}/entity/product?limit=1&offset=1", server.url());
        let value = mock_client(&server, 1)
            .get_json_url(&href, &[])
            .await
            .expect("page");

        mock.assert_async().await;
        assert_eq!(value["rows"][0]["name"], "b");
    }

    #[tokio::test]
    async fn get_all_rows_collects_untyped_pages() {
        let mut server = mockito::Server::new_async().await;
        let next = format!("{}/entity/store?offset=1", server.url());
        let first = server
            .mock("GET", "/entity/store")
            .match_query(Matcher::UrlEncoded("offset".into(), "0".into()))
            .with_status(200)
            .with_body(json!({"meta": {"href": "h", "nextHref": next}, "rows": [{"id": "s1"}]}).to_string())
            .create_async()
            .await;
        let second = server
            .mock("GET", "/entity/store")
            .match_query(Matcher::UrlEncoded("offset".into(), "1".into()))
            .with_status(200)
            .with_body(r#"{"meta":{"href":"h","nextHref":""},"rows":[{"id":"s2"}]}"#)
            .create_async()
            .await;

        let rows: Vec<Value> = mock_client(&server, 1)
            .get_all_rows("entity/store", &[("offset".to_owned(), "0".to_owned())])
            .await
            .expect("all rows");

        first.assert_async().await;
        second.assert_async().await;
        assert_eq!(rows, vec![json!({"id": "s1"}), json!({"id": "s2"})]);
    }

    #[tokio::test]
    async fn connection_failures_back_off_exponentially() {
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").expect("free port");
            listener.local_addr().expect("bound address").port()
        };
        let delay = Duration::from_millis(40);
        let config = ClientConfig::new("token")
            .with_base_url(format!("http://127.0.0.1:{port}"))
            .with_retry_count(3)
            .with_retry_delay(delay);
        let client = ApiClient::new(&config).expect("valid config");

        let started = Instant::now();
        let error = client.get_json("context", &[]).await.expect_err("nothing listens");

        assert!(matches!(&error, ClientError::Request(source) if source.is_connect()));
        assert!(started.elapsed() >= delay + delay * 2);
    }
}
