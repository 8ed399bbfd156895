/*
[INPUT]:  Wallet directory, auth negotiator, session store, URL launcher
[OUTPUT]: Cached per-wallet bearer tokens and availability state
[POS]:    Session layer - orchestrator for multi-wallet authentication
[UPDATE]: When session caching, probing, or hand-off behavior changes
*/

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared, join_all};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::auth::{AuthNegotiator, WalletDirectory, token};
use crate::deeplink::{ServicesLink, UrlLauncher};
use crate::http::{ApiClient, Result, SessionError};
use crate::session::SessionStore;
use crate::types::ServicePage;

type AuthFuture = Shared<BoxFuture<'static, Result<String>>>;

/// Orchestrates per-wallet sessions with the services backend.
///
/// Cheap to clone; clones share the session map, the in-flight registry and
/// the observable state.
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<Inner>,
}

struct Inner {
    negotiator: AuthNegotiator,
    store: SessionStore,
    wallets: Arc<dyn WalletDirectory>,
    launcher: Arc<dyn UrlLauncher>,
    link: ServicesLink,
    locale: String,
    sessions: Mutex<HashMap<String, String>>,
    pending: Mutex<HashMap<String, AuthFuture>>,
    in_flight: AtomicUsize,
    processing_tx: watch::Sender<bool>,
    available_tx: watch::Sender<bool>,
}

impl SessionManager {
    /// Create a manager and hydrate the session map from the store
    pub async fn new(
        negotiator: AuthNegotiator,
        store: SessionStore,
        wallets: Arc<dyn WalletDirectory>,
        launcher: Arc<dyn UrlLauncher>,
    ) -> Self {
        Self::with_link(
            negotiator,
            store,
            wallets,
            launcher,
            ServicesLink::default(),
            "en",
        )
        .await
    }

    /// Create a manager with an explicit web flow composer and locale
    pub async fn with_link(
        negotiator: AuthNegotiator,
        store: SessionStore,
        wallets: Arc<dyn WalletDirectory>,
        launcher: Arc<dyn UrlLauncher>,
        link: ServicesLink,
        locale: &str,
    ) -> Self {
        let sessions = store.load().await;
        let (processing_tx, _) = watch::channel(false);
        let (available_tx, _) = watch::channel(true);

        Self {
            inner: Arc::new(Inner {
                negotiator,
                store,
                wallets,
                launcher,
                link,
                locale: locale.to_string(),
                sessions: Mutex::new(sessions),
                pending: Mutex::new(HashMap::new()),
                in_flight: AtomicUsize::new(0),
                processing_tx,
                available_tx,
            }),
        }
    }

    /// Get a valid bearer token for a wallet, authenticating on demand.
    ///
    /// A cached unexpired token is returned without a network call.
    /// Concurrent callers for the same wallet share a single authentication
    /// attempt and observe the same outcome. The session map is left
    /// untouched when authentication fails.
    pub async fn access_token(&self, wallet_id: &str) -> Result<String> {
        if let Some(cached) = self.inner.cached_token(wallet_id) {
            return Ok(cached);
        }

        self.join_or_start_authentication(wallet_id).await
    }

    /// Drop a wallet's cached token (server reported it unauthorized).
    ///
    /// The next `access_token` call re-authenticates. The removal is visible
    /// to subsequent callers before persistence completes.
    pub async fn reset_access_token(&self, wallet_id: &str) {
        let snapshot = {
            let mut sessions = self.inner.sessions.lock().unwrap();
            if sessions.remove(wallet_id).is_none() {
                return;
            }
            sessions.clone()
        };

        if let Err(e) = self.inner.store.save(&snapshot).await {
            warn!(error = %e, wallet_id, "failed to persist session reset");
        }
        debug!(wallet_id, "session invalidated");
    }

    /// Probe connectivity for a set of wallets and derive availability.
    ///
    /// All wallets authenticate concurrently. Success for every wallet sets
    /// availability; a geo-restriction on any wallet clears it without
    /// raising. Other failures propagate and leave availability untouched.
    /// Safe to re-run whenever the wallet set changes.
    pub async fn connect(&self, wallet_ids: &[String]) -> Result<()> {
        if wallet_ids.is_empty() {
            return Ok(());
        }

        let probes = wallet_ids.iter().map(|id| self.access_token(id));
        let results = join_all(probes).await;

        if results
            .iter()
            .any(|r| matches!(r, Err(SessionError::GeoRestricted)))
        {
            info!("service geo-restricted for this user");
            self.inner.available_tx.send_replace(false);
            return Ok(());
        }

        if let Some(Err(e)) = results.into_iter().find(|r| r.is_err()) {
            return Err(e);
        }

        self.inner.available_tx.send_replace(true);
        Ok(())
    }

    /// Clear every session, in memory and durable (full logout)
    pub async fn reset(&self) {
        self.inner.sessions.lock().unwrap().clear();
        if let Err(e) = self.inner.store.clear().await {
            warn!(error = %e, "failed to clear session store");
        }
        info!("all sessions cleared");
    }

    /// Open the backend's embedded web flow for a wallet.
    ///
    /// Obtains a token (authenticating if needed), composes the hand-off URL
    /// and fires it at the OS launcher without awaiting the launch.
    pub async fn open_services(
        &self,
        wallet_id: &str,
        balance: &str,
        service: ServicePage,
    ) -> Result<()> {
        let token = self.access_token(wallet_id).await?;
        let url = self
            .inner
            .link
            .service_url(&token, balance, service, &self.inner.locale);

        self.inner.launcher.open_url(url.as_str());
        Ok(())
    }

    /// Whether any authentication is currently in flight
    pub fn is_processing(&self) -> bool {
        *self.inner.processing_tx.borrow()
    }

    /// Whether the backend is reachable and not geo-blocking this user
    pub fn is_available(&self) -> bool {
        *self.inner.available_tx.borrow()
    }

    /// Observe processing-state changes (UI gating)
    pub fn processing_changes(&self) -> watch::Receiver<bool> {
        self.inner.processing_tx.subscribe()
    }

    /// Observe availability changes
    pub fn availability_changes(&self) -> watch::Receiver<bool> {
        self.inner.available_tx.subscribe()
    }

    /// Get the underlying API client
    pub(crate) fn client(&self) -> &ApiClient {
        self.inner.negotiator.client()
    }

    fn join_or_start_authentication(&self, wallet_id: &str) -> AuthFuture {
        let mut pending = self.inner.pending.lock().unwrap();
        if let Some(existing) = pending.get(wallet_id) {
            return existing.clone();
        }

        let inner = Arc::clone(&self.inner);
        let id = wallet_id.to_string();
        let future = async move {
            let _guard = ProcessingGuard::enter(&inner);
            let result = inner.authenticate_wallet(&id).await;
            inner.pending.lock().unwrap().remove(&id);
            result
        }
        .boxed()
        .shared();

        pending.insert(wallet_id.to_string(), future.clone());
        future
    }
}

impl Inner {
    fn cached_token(&self, wallet_id: &str) -> Option<String> {
        let sessions = self.sessions.lock().unwrap();
        let cached = sessions.get(wallet_id)?;
        token::is_valid(Some(cached.as_str())).then(|| cached.clone())
    }

    async fn authenticate_wallet(&self, wallet_id: &str) -> Result<String> {
        // A racer may have finished between the cache check and registry
        // insert; skip the round trip in that case.
        if let Some(cached) = self.cached_token(wallet_id) {
            return Ok(cached);
        }

        let wallet = self
            .wallets
            .wallet(wallet_id)
            .ok_or_else(|| SessionError::Config(format!("unknown wallet: {wallet_id}")))?;

        let token = self.negotiator.authenticate(wallet.as_ref()).await?;

        let snapshot = {
            let mut sessions = self.sessions.lock().unwrap();
            sessions.insert(wallet_id.to_string(), token.clone());
            sessions.clone()
        };
        if let Err(e) = self.store.save(&snapshot).await {
            warn!(error = %e, wallet_id, "failed to persist session");
        }

        info!(wallet_id, "session established");
        Ok(token)
    }
}

/// Tracks in-flight authentications for the processing observable
struct ProcessingGuard {
    inner: Arc<Inner>,
}

impl ProcessingGuard {
    fn enter(inner: &Arc<Inner>) -> Self {
        if inner.in_flight.fetch_add(1, Ordering::SeqCst) == 0 {
            inner.processing_tx.send_replace(true);
        }
        Self {
            inner: Arc::clone(inner),
        }
    }
}

impl Drop for ProcessingGuard {
    fn drop(&mut self) {
        if self.inner.in_flight.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.inner.processing_tx.send_replace(false);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::auth::{MockWallet, StaticWalletDirectory, WalletAccount};
    use crate::deeplink::RecordingLauncher;
    use crate::http::ClientConfig;
    use crate::session::MemoryStore;
    use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
    use chrono::Utc;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn make_jwt(exp: i64) -> String {
        let header = URL_SAFE_NO_PAD.encode(
            serde_json::to_vec(&serde_json::json!({"alg": "HS256", "typ": "JWT"})).unwrap(),
        );
        let payload =
            URL_SAFE_NO_PAD.encode(serde_json::to_vec(&serde_json::json!({"exp": exp})).unwrap());
        format!("{header}.{payload}.signature")
    }

    async fn test_manager(server: &MockServer, wallets: Vec<Arc<MockWallet>>) -> SessionManager {
        let client =
            ApiClient::with_config_and_base_url(ClientConfig::default(), &server.uri()).unwrap();
        let directory = StaticWalletDirectory::new(
            wallets
                .into_iter()
                .map(|w| w as Arc<dyn WalletAccount>)
                .collect(),
        );

        SessionManager::new(
            AuthNegotiator::new(client),
            SessionStore::new(Arc::new(MemoryStore::new())),
            Arc::new(directory),
            Arc::new(RecordingLauncher::new()),
        )
        .await
    }

    fn mount_auth_flow(token: &str) -> Vec<Mock> {
        vec![
            Mock::given(method("GET"))
                .and(path("/v1/auth/sign-message"))
                .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                    "message": "challenge",
                }))),
            Mock::given(method("POST"))
                .and(path("/v1/auth/sign-in"))
                .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                    "accessToken": token,
                }))),
        ]
    }

    #[tokio::test]
    async fn test_second_call_hits_cache() {
        let server = MockServer::start().await;
        let token = make_jwt(Utc::now().timestamp() + 3600);

        for mock in mount_auth_flow(&token) {
            mock.expect(1).mount(&server).await;
        }

        let manager =
            test_manager(&server, vec![Arc::new(MockWallet::new("w1", "bc1qa", "sig"))]).await;

        let first = manager.access_token("w1").await.unwrap();
        let second = manager.access_token("w1").await.unwrap();
        assert_eq!(first, token);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_unknown_wallet_is_config_error() {
        let server = MockServer::start().await;
        let manager = test_manager(&server, vec![]).await;

        let err = manager.access_token("missing").await.unwrap_err();
        assert!(matches!(err, SessionError::Config(_)));
    }

    #[tokio::test]
    async fn test_failure_leaves_session_map_untouched() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/auth/sign-message"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "message": "challenge",
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/auth/sign-in"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let manager =
            test_manager(&server, vec![Arc::new(MockWallet::new("w1", "bc1qa", "sig"))]).await;

        let err = manager.access_token("w1").await.unwrap_err();
        assert_eq!(err, SessionError::GeoRestricted);
        assert!(manager.inner.sessions.lock().unwrap().is_empty());
        assert!(manager.inner.pending.lock().unwrap().is_empty());
        assert!(!manager.is_processing());
    }
}
