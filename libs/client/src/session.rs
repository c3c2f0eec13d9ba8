//! Client session state machine
//!
//! A single watch channel holds the session state; every part of the app
//! observes the same store instead of mutating scattered flags. The
//! bootstrap verification races a fixed timeout so the UI never hangs on
//! a dead network: the loser of the race is simply discarded.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::watch;
use tracing::{info, warn};
use uuid::Uuid;

use common::auth::Role;

use crate::token_store::TokenStore;

/// Upper bound on the bootstrap verification call
pub const DEFAULT_VERIFY_TIMEOUT: Duration = Duration::from_secs(5);

/// Identity of the logged-in user, as confirmed by the token issuer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: Role,
}

/// Session lifecycle states
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    /// No session; also the forced result of a rejected token
    Unauthenticated,
    /// A stored token is being verified against the issuer
    Checking,
    /// Verification succeeded
    Authenticated(UserProfile),
    /// Verification failed for a non-auth reason (network, timeout);
    /// the app stays usable in a degraded mode
    Error(String),
}

/// Failure modes of a token verification call
#[derive(Error, Debug, Clone, PartialEq)]
pub enum VerifyError {
    /// The issuer rejected the token (401/403); the stored token is dead
    #[error("Token rejected by the issuer")]
    Unauthorized,
    /// The issuer could not be reached or answered abnormally
    #[error("Verification unavailable: {0}")]
    Unavailable(String),
}

/// Confirms a token against the issuer's who-am-I endpoint
pub trait IdentityVerifier {
    fn verify(
        &self,
        token: &str,
    ) -> impl Future<Output = Result<UserProfile, VerifyError>> + Send;
}

type AuthenticatedCallback = Arc<dyn Fn(&str) + Send + Sync>;

/// Reactive holder of the session state
///
/// Cheap to clone; all clones share the same underlying channel and
/// token store.
pub struct SessionManager<V> {
    verifier: V,
    store: Arc<dyn TokenStore>,
    tx: Arc<watch::Sender<SessionState>>,
    verify_timeout: Duration,
    on_authenticated: Option<AuthenticatedCallback>,
}

impl<V: Clone> Clone for SessionManager<V> {
    fn clone(&self) -> Self {
        Self {
            verifier: self.verifier.clone(),
            store: self.store.clone(),
            tx: self.tx.clone(),
            verify_timeout: self.verify_timeout,
            on_authenticated: self.on_authenticated.clone(),
        }
    }
}

impl<V: IdentityVerifier> SessionManager<V> {
    /// Create a manager; the initial state is Checking when a token is
    /// stored, Unauthenticated otherwise
    pub fn new(verifier: V, store: Arc<dyn TokenStore>) -> Self {
        let initial = if store.token().is_some() {
            SessionState::Checking
        } else {
            SessionState::Unauthenticated
        };
        let (tx, _rx) = watch::channel(initial);

        Self {
            verifier,
            store,
            tx: Arc::new(tx),
            verify_timeout: DEFAULT_VERIFY_TIMEOUT,
            on_authenticated: None,
        }
    }

    /// Override the bootstrap verification timeout
    pub fn with_verify_timeout(mut self, timeout: Duration) -> Self {
        self.verify_timeout = timeout;
        self
    }

    /// Register a callback fired with the session token whenever the
    /// session becomes Authenticated
    ///
    /// Wire this to [`crate::http::ApiClient::set_token`] so a restored
    /// session attaches its token to outgoing requests the same way a
    /// fresh login does.
    pub fn on_authenticated(mut self, callback: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.on_authenticated = Some(Arc::new(callback));
        self
    }

    fn notify_authenticated(&self, token: &str) {
        if let Some(callback) = &self.on_authenticated {
            callback(token);
        }
    }

    /// Subscribe to session state changes
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.tx.subscribe()
    }

    /// Snapshot of the current state
    pub fn state(&self) -> SessionState {
        self.tx.borrow().clone()
    }

    fn set_state(&self, state: SessionState) {
        // send_replace never fails even with no subscribers
        self.tx.send_replace(state);
    }

    /// Resolve the stored token into a session state
    ///
    /// Verification races the configured timeout; on timeout the state
    /// resolves to Error rather than sticking in Checking, and the losing
    /// call is dropped without cancellation.
    pub async fn bootstrap(&self) {
        let Some(token) = self.store.token() else {
            self.set_state(SessionState::Unauthenticated);
            return;
        };

        self.set_state(SessionState::Checking);

        match tokio::time::timeout(self.verify_timeout, self.verifier.verify(&token)).await {
            Ok(Ok(profile)) => {
                info!("Session restored for user {}", profile.username);
                // The restored token must flow to outgoing requests just
                // like a fresh login's would
                self.notify_authenticated(&token);
                self.set_state(SessionState::Authenticated(profile));
            }
            Ok(Err(VerifyError::Unauthorized)) => {
                // The token is dead; holding on to it would just repeat
                // the failure on the next start
                if let Err(e) = self.store.clear_token() {
                    warn!("Failed to clear rejected token: {}", e);
                }
                self.set_state(SessionState::Unauthenticated);
            }
            Ok(Err(VerifyError::Unavailable(msg))) => {
                warn!("Session verification unavailable: {}", msg);
                self.set_state(SessionState::Error(msg));
            }
            Err(_) => {
                warn!("Session verification timed out");
                self.set_state(SessionState::Error(
                    "Session verification timed out".to_string(),
                ));
            }
        }
    }

    /// Record a successful login: persist the token and go Authenticated
    pub fn complete_login(&self, token: &str, profile: UserProfile) {
        if let Err(e) = self.store.save_token(token) {
            warn!("Failed to persist session token: {}", e);
        }
        self.notify_authenticated(token);
        self.set_state(SessionState::Authenticated(profile));
    }

    /// Tear the session down: drop the token and go Unauthenticated
    ///
    /// Also the target of the 401 observer on the HTTP client, so any
    /// rejected request forces the same teardown path.
    pub fn logout(&self) {
        if let Err(e) = self.store.clear_token() {
            warn!("Failed to clear session token: {}", e);
        }
        self.set_state(SessionState::Unauthenticated);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token_store::MemoryTokenStore;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn profile() -> UserProfile {
        UserProfile {
            id: Uuid::new_v4(),
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            role: Role::Tenant,
        }
    }

    /// Scripted verifier with an optional artificial delay
    #[derive(Clone)]
    struct MockVerifier {
        outcome: Result<UserProfile, VerifyError>,
        delay: Duration,
        calls: Arc<AtomicUsize>,
    }

    impl MockVerifier {
        fn new(outcome: Result<UserProfile, VerifyError>) -> Self {
            Self {
                outcome,
                delay: Duration::ZERO,
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }

        fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }
    }

    impl IdentityVerifier for MockVerifier {
        async fn verify(&self, _token: &str) -> Result<UserProfile, VerifyError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.outcome.clone()
        }
    }

    fn store_with_token() -> Arc<MemoryTokenStore> {
        let store = Arc::new(MemoryTokenStore::new());
        store.save_token("stored-token").unwrap();
        store
    }

    #[tokio::test]
    async fn bootstrap_without_token_goes_unauthenticated() {
        let verifier = MockVerifier::new(Ok(profile()));
        let calls = verifier.calls.clone();
        let manager = SessionManager::new(verifier, Arc::new(MemoryTokenStore::new()));

        assert_eq!(manager.state(), SessionState::Unauthenticated);
        manager.bootstrap().await;

        assert_eq!(manager.state(), SessionState::Unauthenticated);
        // No token, so verification never ran
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn bootstrap_with_valid_token_authenticates() {
        let expected = profile();
        let manager = SessionManager::new(
            MockVerifier::new(Ok(expected.clone())),
            store_with_token(),
        );

        assert_eq!(manager.state(), SessionState::Checking);
        manager.bootstrap().await;
        assert_eq!(manager.state(), SessionState::Authenticated(expected));
    }

    #[tokio::test]
    async fn rejected_token_is_cleared_and_session_forced_down() {
        let store = store_with_token();
        let manager = SessionManager::new(
            MockVerifier::new(Err(VerifyError::Unauthorized)),
            store.clone(),
        );

        manager.bootstrap().await;

        assert_eq!(manager.state(), SessionState::Unauthenticated);
        assert_eq!(store.token(), None);
    }

    #[tokio::test]
    async fn unavailable_verifier_degrades_to_error_and_keeps_token() {
        let store = store_with_token();
        let manager = SessionManager::new(
            MockVerifier::new(Err(VerifyError::Unavailable("connection refused".into()))),
            store.clone(),
        );

        manager.bootstrap().await;

        assert_eq!(
            manager.state(),
            SessionState::Error("connection refused".to_string())
        );
        // A network blip must not destroy a possibly-valid token
        assert_eq!(store.token(), Some("stored-token".to_string()));
    }

    #[tokio::test]
    async fn slow_verification_loses_the_race() {
        let store = store_with_token();
        let manager = SessionManager::new(
            MockVerifier::new(Ok(profile())).with_delay(Duration::from_secs(60)),
            store.clone(),
        )
        .with_verify_timeout(Duration::from_millis(20));

        manager.bootstrap().await;

        assert_eq!(
            manager.state(),
            SessionState::Error("Session verification timed out".to_string())
        );
        assert_eq!(store.token(), Some("stored-token".to_string()));
    }

    #[tokio::test]
    async fn login_and_logout_transitions() {
        let store = Arc::new(MemoryTokenStore::new());
        let manager = SessionManager::new(MockVerifier::new(Ok(profile())), store.clone());
        let expected = profile();

        manager.complete_login("fresh-token", expected.clone());
        assert_eq!(manager.state(), SessionState::Authenticated(expected));
        assert_eq!(store.token(), Some("fresh-token".to_string()));

        manager.logout();
        assert_eq!(manager.state(), SessionState::Unauthenticated);
        assert_eq!(store.token(), None);
    }

    #[tokio::test]
    async fn restored_session_installs_the_outgoing_token() {
        let attached: Arc<std::sync::Mutex<Option<String>>> =
            Arc::new(std::sync::Mutex::new(None));
        let sink = attached.clone();

        let manager = SessionManager::new(MockVerifier::new(Ok(profile())), store_with_token())
            .on_authenticated(move |token| {
                *sink.lock().unwrap() = Some(token.to_string());
            });

        manager.bootstrap().await;

        assert!(matches!(manager.state(), SessionState::Authenticated(_)));
        // The verified token now rides on outgoing requests
        assert_eq!(
            *attached.lock().unwrap(),
            Some("stored-token".to_string())
        );
    }

    #[tokio::test]
    async fn rejected_token_never_reaches_the_outgoing_rule() {
        let attached: Arc<std::sync::Mutex<Option<String>>> =
            Arc::new(std::sync::Mutex::new(None));
        let sink = attached.clone();

        let manager = SessionManager::new(
            MockVerifier::new(Err(VerifyError::Unauthorized)),
            store_with_token(),
        )
        .on_authenticated(move |token| {
            *sink.lock().unwrap() = Some(token.to_string());
        });

        manager.bootstrap().await;

        assert_eq!(manager.state(), SessionState::Unauthenticated);
        assert_eq!(*attached.lock().unwrap(), None);
    }

    #[tokio::test]
    async fn login_fires_the_outgoing_token_callback() {
        let attached: Arc<std::sync::Mutex<Option<String>>> =
            Arc::new(std::sync::Mutex::new(None));
        let sink = attached.clone();

        let manager = SessionManager::new(
            MockVerifier::new(Ok(profile())),
            Arc::new(MemoryTokenStore::new()),
        )
        .on_authenticated(move |token| {
            *sink.lock().unwrap() = Some(token.to_string());
        });

        manager.complete_login("fresh-token", profile());

        assert_eq!(*attached.lock().unwrap(), Some("fresh-token".to_string()));
    }

    #[tokio::test]
    async fn subscribers_observe_transitions() {
        let manager = SessionManager::new(
            MockVerifier::new(Err(VerifyError::Unauthorized)),
            store_with_token(),
        );
        let mut rx = manager.subscribe();

        manager.bootstrap().await;

        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow(), SessionState::Unauthenticated);
    }
}
