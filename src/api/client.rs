//! Transport adapter over reqwest
//!
//! Carries the session cookie jar and attaches the anti-forgery token to
//! every mutating request. All failure shapes are normalized into
//! [`ApiError`] here so the per-entity thunks stay branch-free.

use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::RwLock;
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::config::ClientConfig;
use crate::errors::ApiError;

const CSRF_HEADER: &str = "XSRF-Token";

pub struct ApiClient {
    http: reqwest::Client,
    base: Url,
    csrf_token: RwLock<Option<String>>,
}

impl ApiClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base: config.base_url.clone(),
            csrf_token: RwLock::new(None),
        })
    }

    /// Store the anti-forgery token handed out by the backend; it rides
    /// along on every subsequent non-GET request.
    pub fn set_csrf_token(&self, token: impl Into<String>) {
        if let Ok(mut slot) = self.csrf_token.write() {
            *slot = Some(token.into());
        }
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let request = self.http.get(self.endpoint(path)?);
        self.execute(request).await
    }

    pub async fn get_json_query<T, Q>(&self, path: &str, query: &Q) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let request = self.http.get(self.endpoint(path)?).query(query);
        self.execute(request).await
    }

    pub async fn post_json<T, B>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let request = self.mutating(Method::POST, path)?.json(body);
        self.execute(request).await
    }

    pub async fn put_json<T, B>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let request = self.mutating(Method::PUT, path)?.json(body);
        self.execute(request).await
    }

    pub async fn delete_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let request = self.mutating(Method::DELETE, path)?;
        self.execute(request).await
    }

    /// DELETE where the response body is irrelevant to the caller.
    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        let request = self.mutating(Method::DELETE, path)?;
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_error_body(status, &body))
        }
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.base.join(path)?)
    }

    fn mutating(&self, method: Method, path: &str) -> Result<RequestBuilder, ApiError> {
        let mut request = self.http.request(method, self.endpoint(path)?);
        let token = self.csrf_token.read().ok().and_then(|slot| slot.clone());
        if let Some(token) = token {
            request = request.header(CSRF_HEADER, token);
        }
        Ok(request)
    }

    async fn execute<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;
        debug!(%status, bytes = body.len(), "api response");

        if status.is_success() {
            serde_json::from_str(&body)
                .map_err(|e| ApiError::Server(format!("malformed response body: {e}")))
        } else {
            Err(ApiError::from_error_body(status, &body))
        }
    }
}
