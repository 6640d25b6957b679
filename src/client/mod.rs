//! Async REST client for the clinical backend.
//!
//! One `impl ApiClient` block per resource lives in the sibling modules. Every
//! call is a single request/response exchange: nothing is retried, cached or
//! coordinated with other in-flight calls.

mod medications;
mod patients;
mod records;
mod statistics;
mod treatments;
mod users;

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, CONTENT_TYPE, USER_AGENT};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";

#[derive(Clone, Debug)]
pub struct ClientOptions {
    pub base_url: String,
    /// `None` keeps the HTTP client's own default.
    pub timeout_seconds: Option<u64>,
    pub proxy: Option<String>,
    /// Extra header sent with every request, `Key: Value`.
    pub header: Option<String>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_seconds: None,
            proxy: None,
            header: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid base URL '{url}': {message}")]
    InvalidBaseUrl { url: String, message: String },

    #[error("invalid header '{header}', expected 'Key: Value'")]
    InvalidHeader { header: String },

    #[error("failed to build HTTP client: {source}")]
    HttpClientBuild {
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to setup proxy: {proxy}: {source}")]
    ProxySetup {
        proxy: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{method} {path} failed: {source}")]
    Request {
        method: Method,
        path: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{method} {path} returned {status}")]
    Status {
        method: Method,
        path: String,
        status: StatusCode,
    },

    #[error("{method} {path} returned an unexpected body: {source}")]
    Decode {
        method: Method,
        path: String,
        #[source]
        source: reqwest::Error,
    },
}

impl ClientError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(options: ClientOptions) -> Result<Self, ClientError> {
        let base_url = normalize_base_url(&options.base_url)?;
        let http = build_http_client(&options)?;
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&(impl Serialize + ?Sized)>,
    ) -> Result<reqwest::Response, ClientError> {
        let url = self.url(path);
        tracing::debug!(%method, %url, "sending request");

        let mut request = self.http.request(method.clone(), &url);
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send().await.map_err(|e| ClientError::Request {
            method: method.clone(),
            path: path.to_string(),
            source: e,
        })?;

        let status = response.status();
        tracing::debug!(%method, %url, status = status.as_u16(), "received response");
        if !status.is_success() {
            return Err(ClientError::Status {
                method,
                path: path.to_string(),
                status,
            });
        }
        Ok(response)
    }

    async fn decode<T: DeserializeOwned>(
        method: Method,
        path: &str,
        response: reqwest::Response,
    ) -> Result<T, ClientError> {
        response.json::<T>().await.map_err(|e| ClientError::Decode {
            method,
            path: path.to_string(),
            source: e,
        })
    }

    pub(crate) async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let response = self.send(Method::GET, path, None::<&()>).await?;
        Self::decode(Method::GET, path, response).await
    }

    pub(crate) async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.send(Method::POST, path, Some(body)).await?;
        Self::decode(Method::POST, path, response).await
    }

    /// Sends a body and ignores whatever the backend answers with.
    pub(crate) async fn send_only<B>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<(), ClientError>
    where
        B: Serialize + ?Sized,
    {
        self.send(method, path, Some(body)).await?;
        Ok(())
    }

    pub(crate) async fn delete(&self, path: &str) -> Result<(), ClientError> {
        self.send(Method::DELETE, path, None::<&()>).await?;
        Ok(())
    }
}

fn normalize_base_url(raw: &str) -> Result<String, ClientError> {
    let trimmed = raw.trim();
    let parsed = reqwest::Url::parse(trimmed).map_err(|e| ClientError::InvalidBaseUrl {
        url: raw.to_string(),
        message: e.to_string(),
    })?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(ClientError::InvalidBaseUrl {
            url: raw.to_string(),
            message: "expected an http or https URL".to_string(),
        });
    }
    Ok(trimmed.trim_end_matches('/').to_string())
}

pub fn parse_header(raw: &str) -> Result<(HeaderName, HeaderValue), ClientError> {
    let invalid = || ClientError::InvalidHeader {
        header: raw.to_string(),
    };
    let (key, value) = raw.split_once(':').ok_or_else(invalid)?;
    let name = HeaderName::from_bytes(key.trim().as_bytes()).map_err(|_| invalid())?;
    let value = HeaderValue::from_str(value.trim()).map_err(|_| invalid())?;
    Ok((name, value))
}

fn build_http_client(options: &ClientOptions) -> Result<reqwest::Client, ClientError> {
    let mut headers = HeaderMap::new();
    headers.insert(
        USER_AGENT,
        HeaderValue::from_static(concat!("clinadmin/", env!("CARGO_PKG_VERSION"))),
    );
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    if let Some(raw) = options.header.as_deref().filter(|h| !h.trim().is_empty()) {
        let (name, value) = parse_header(raw)?;
        headers.insert(name, value);
    }

    let mut builder = reqwest::Client::builder().default_headers(headers);
    if let Some(seconds) = options.timeout_seconds {
        builder = builder.timeout(Duration::from_secs(seconds));
    }

    match options.proxy.as_deref().filter(|p| !p.trim().is_empty()) {
        Some(proxy) => {
            let proxy_cfg = reqwest::Proxy::all(proxy).map_err(|e| ClientError::ProxySetup {
                proxy: proxy.to_string(),
                source: e,
            })?;
            builder = builder.proxy(proxy_cfg);
        }
        // Only an explicit proxy is honoured; environment proxies are ignored.
        None => builder = builder.no_proxy(),
    }

    builder
        .build()
        .map_err(|e| ClientError::HttpClientBuild { source: e })
}
