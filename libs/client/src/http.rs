//! HTTP client for the Rentora services
//!
//! The client owns the "attach this token to every outgoing request"
//! rule and the 401 teardown path. Interested parties register a
//! callback at construction time; there is no ambient broadcast event
//! to subscribe to after the fact.

use std::sync::{Arc, RwLock};

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use common::auth::Role;

use crate::session::{IdentityVerifier, UserProfile, VerifyError};

type UnauthorizedObserver = Box<dyn Fn() + Send + Sync>;

/// Errors surfaced by the HTTP client
#[derive(Error, Debug)]
pub enum ClientError {
    /// The server answered 401; observers have already been notified
    #[error("Request rejected as unauthenticated")]
    Unauthorized,

    /// The server rejected the request with an error body
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Transport-level failure
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Successful login payload from the auth service
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user_id: Uuid,
    pub username: String,
    pub role: Role,
    pub email: String,
}

impl LoginResponse {
    /// The profile carried by the login response
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.user_id,
            username: self.username.clone(),
            email: self.email.clone(),
            role: self.role,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// Builder for [`ApiClient`]
pub struct ApiClientBuilder {
    base_url: String,
    observers: Vec<UnauthorizedObserver>,
}

impl ApiClientBuilder {
    /// Start a builder for the given service base URL
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            base_url,
            observers: Vec::new(),
        }
    }

    /// Register a callback invoked whenever any request answers 401
    pub fn on_unauthorized(mut self, observer: impl Fn() + Send + Sync + 'static) -> Self {
        self.observers.push(Box::new(observer));
        self
    }

    /// Build the client
    pub fn build(self) -> Result<ApiClient, ClientError> {
        let http = reqwest::Client::builder().build()?;
        Ok(ApiClient {
            http,
            base_url: self.base_url,
            token: Arc::new(RwLock::new(None)),
            observers: Arc::new(self.observers),
        })
    }
}

/// HTTP client carrying the session token on every request
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: Arc<RwLock<Option<String>>>,
    observers: Arc<Vec<UnauthorizedObserver>>,
}

impl ApiClient {
    /// Set the token attached to every subsequent request
    pub fn set_token(&self, token: &str) {
        *self.token.write().expect("token lock poisoned") = Some(token.to_string());
    }

    /// Stop attaching a token
    pub fn clear_token(&self) {
        *self.token.write().expect("token lock poisoned") = None;
    }

    fn current_token(&self) -> Option<String> {
        self.token.read().expect("token lock poisoned").clone()
    }

    pub(crate) fn notify_unauthorized(&self) {
        debug!("Request rejected with 401, notifying {} observers", self.observers.len());
        self.clear_token();
        for observer in self.observers.iter() {
            observer();
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Map a response, routing 401 through the teardown path
    async fn handle<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, ClientError> {
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            self.notify_unauthorized();
            return Err(ClientError::Unauthorized);
        }

        if !status.is_success() {
            let message = response
                .json::<ErrorBody>()
                .await
                .map(|b| b.error)
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json().await?)
    }

    /// Log in; on success the token is attached to subsequent requests
    pub async fn login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<LoginResponse, ClientError> {
        let response = self
            .http
            .post(self.url("/auth/login"))
            .json(&serde_json::json!({
                "username": username,
                "password": password,
            }))
            .send()
            .await?;

        // A failed login is not a session teardown; only requests made
        // with an attached token route through the observer path
        if response.status() == StatusCode::UNAUTHORIZED {
            let message = response
                .json::<ErrorBody>()
                .await
                .map(|b| b.error)
                .unwrap_or_else(|_| "Invalid username or password".to_string());
            return Err(ClientError::Api {
                status: 401,
                message,
            });
        }

        let login: LoginResponse = self.handle(response).await?;
        self.set_token(&login.token);
        Ok(login)
    }

    /// Fetch the profile for the currently attached token
    pub async fn me(&self) -> Result<UserProfile, ClientError> {
        let mut request = self.http.get(self.url("/auth/me"));
        if let Some(token) = self.current_token() {
            request = request.bearer_auth(token);
        }
        let response = request.send().await?;
        self.handle(response).await
    }
}

impl IdentityVerifier for ApiClient {
    /// Who-am-I check with an explicit token, used by the session
    /// bootstrap; the session manager's authenticated callback installs
    /// the token as the default rule once verification succeeds
    async fn verify(&self, token: &str) -> Result<UserProfile, VerifyError> {
        let response = self
            .http
            .get(self.url("/auth/me"))
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| VerifyError::Unavailable(e.to_string()))?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(VerifyError::Unauthorized),
            status if status.is_success() => response
                .json::<UserProfile>()
                .await
                .map_err(|e| VerifyError::Unavailable(e.to_string())),
            status => Err(VerifyError::Unavailable(format!(
                "Unexpected status {}",
                status
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_builder_normalizes_base_url() {
        let client = ApiClientBuilder::new("http://localhost:3000///")
            .build()
            .unwrap();
        assert_eq!(client.url("/auth/me"), "http://localhost:3000/auth/me");
    }

    #[test]
    fn test_unauthorized_notifies_observers_and_clears_token() {
        let fired = Arc::new(AtomicUsize::new(0));
        let fired_clone = fired.clone();

        let client = ApiClientBuilder::new("http://localhost:3000")
            .on_unauthorized(move || {
                fired_clone.fetch_add(1, Ordering::SeqCst);
            })
            .build()
            .unwrap();

        client.set_token("tok");
        client.notify_unauthorized();

        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert_eq!(client.current_token(), None);
    }

    #[test]
    fn test_multiple_observers_all_fire() {
        let count = Arc::new(AtomicUsize::new(0));
        let a = count.clone();
        let b = count.clone();

        let client = ApiClientBuilder::new("http://localhost:3000")
            .on_unauthorized(move || {
                a.fetch_add(1, Ordering::SeqCst);
            })
            .on_unauthorized(move || {
                b.fetch_add(1, Ordering::SeqCst);
            })
            .build()
            .unwrap();

        client.notify_unauthorized();
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }
}
