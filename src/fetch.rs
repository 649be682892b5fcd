//! HTTP helper for talking to the hosted auth and database services

use reqwest::{header::{HeaderMap, HeaderValue}, Client, Method, RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use std::collections::BTreeMap;
use url::Url;

use crate::error::Error;

pub(crate) const CLIENT_INFO: &str = concat!("campus-vibe/", env!("CARGO_PKG_VERSION"));

/// Helper for building and executing HTTP requests
pub struct FetchBuilder<'a> {
    client: &'a Client,
    url: String,
    method: Method,
    headers: HeaderMap,
    query_params: BTreeMap<String, String>,
    body: Option<Vec<u8>>,
}

impl<'a> FetchBuilder<'a> {
    /// Create a new FetchBuilder
    pub fn new(client: &'a Client, url: &str, method: Method) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        headers.insert("X-Client-Info", HeaderValue::from_static(CLIENT_INFO));

        Self {
            client,
            url: url.to_string(),
            method,
            headers,
            query_params: BTreeMap::new(),
            body: None,
        }
    }

    /// Add a header to the request
    pub fn header(mut self, name: &'static str, value: &str) -> Self {
        if let Ok(value) = HeaderValue::from_str(value) {
            self.headers.insert(name, value);
        }
        self
    }

    /// Add bearer token authentication to the request
    pub fn bearer_auth(self, token: &str) -> Self {
        self.header("Authorization", &format!("Bearer {}", token))
    }

    /// Add a single query parameter
    pub fn query(mut self, key: &str, value: &str) -> Self {
        self.query_params.insert(key.to_string(), value.to_string());
        self
    }

    /// Add a JSON body to the request
    pub fn json<T: Serialize>(mut self, body: &T) -> Result<Self, Error> {
        let json = serde_json::to_vec(body)?;
        self.body = Some(json);
        Ok(self)
    }

    fn build(&self) -> Result<RequestBuilder, Error> {
        let mut url = Url::parse(&self.url)?;

        if !self.query_params.is_empty() {
            let mut query_pairs = url.query_pairs_mut();
            for (key, value) in &self.query_params {
                query_pairs.append_pair(key, value);
            }
        }

        let mut req = self.client.request(self.method.clone(), url.as_str());
        req = req.headers(self.headers.clone());

        if let Some(body) = &self.body {
            req = req.body(body.clone());
        }

        Ok(req)
    }

    /// Execute the request and parse the response as JSON
    pub async fn execute<T: DeserializeOwned>(&self) -> Result<T, Error> {
        let response = self.send_checked().await?;
        let result = response.json::<T>().await?;
        Ok(result)
    }

    /// Execute the request, discarding any response body
    pub async fn execute_empty(&self) -> Result<(), Error> {
        self.send_checked().await?;
        Ok(())
    }

    /// Execute the request and return the raw response
    pub async fn execute_raw(&self) -> Result<Response, Error> {
        let req = self.build()?;
        let response = req.send().await?;
        Ok(response)
    }

    async fn send_checked(&self) -> Result<Response, Error> {
        let response = self.execute_raw().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        log::debug!("{} {} failed with {}: {}", self.method, self.url, status, text);
        Err(status_error(status, text))
    }
}

/// Translate a failed HTTP status into the crate error taxonomy
pub(crate) fn status_error(status: StatusCode, body: String) -> Error {
    let message = format!("Request failed with status {}: {}", status, body);
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Error::Auth(message),
        StatusCode::REQUEST_TIMEOUT | StatusCode::TOO_MANY_REQUESTS => Error::TransientStore(message),
        s if s.is_server_error() => Error::TransientStore(message),
        _ => Error::General(message),
    }
}

/// Helper for creating HTTP requests
pub struct Fetch;

impl Fetch {
    /// Create a GET request
    pub fn get<'a>(client: &'a Client, url: &str) -> FetchBuilder<'a> {
        FetchBuilder::new(client, url, Method::GET)
    }

    /// Create a POST request
    pub fn post<'a>(client: &'a Client, url: &str) -> FetchBuilder<'a> {
        FetchBuilder::new(client, url, Method::POST)
    }

    /// Create a PATCH request
    pub fn patch<'a>(client: &'a Client, url: &str) -> FetchBuilder<'a> {
        FetchBuilder::new(client, url, Method::PATCH)
    }
}
