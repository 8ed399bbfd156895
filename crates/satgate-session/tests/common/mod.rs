/*
[INPUT]:  Test configuration and mock server requirements
[OUTPUT]: Shared test utilities, fixtures, and mock helpers
[POS]:    Test infrastructure - shared across all test modules
[UPDATE]: When adding new test patterns or fixtures
*/

//! Common test utilities for satgate-session tests

use std::sync::Arc;

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::Utc;
use satgate_session::{
    ApiClient, AuthNegotiator, ClientConfig, MemoryStore, MockWallet, RecordingLauncher,
    SessionManager, SessionStore, StaticWalletDirectory, WalletAccount,
};
use wiremock::MockServer;

/// Setup a mock HTTP server for testing
pub async fn setup_mock_server() -> MockServer {
    MockServer::start().await
}

/// Fabricate an unsigned JWT with the given expiry claim
pub fn make_jwt(exp: i64) -> String {
    let header = URL_SAFE_NO_PAD
        .encode(serde_json::to_vec(&serde_json::json!({"alg": "HS256", "typ": "JWT"})).unwrap());
    let payload =
        URL_SAFE_NO_PAD.encode(serde_json::to_vec(&serde_json::json!({"exp": exp})).unwrap());
    format!("{header}.{payload}.signature")
}

/// JWT valid for another hour
pub fn fresh_jwt() -> String {
    make_jwt(Utc::now().timestamp() + 3600)
}

/// JWT whose expiry is already in the past
#[allow(dead_code)]
pub fn expired_jwt() -> String {
    make_jwt(Utc::now().timestamp() - 60)
}

/// Everything a session manager test needs to inspect afterwards
#[allow(dead_code)]
pub struct TestHarness {
    pub manager: SessionManager,
    pub kv: Arc<MemoryStore>,
    pub launcher: Arc<RecordingLauncher>,
}

/// Build a manager over a mock server, wallet set and fresh in-memory store
#[allow(dead_code)]
pub async fn setup_manager(server: &MockServer, wallets: Vec<Arc<MockWallet>>) -> TestHarness {
    let kv = Arc::new(MemoryStore::new());
    setup_manager_with_kv(server, wallets, kv).await
}

/// Build a manager over an existing key-value store (restart scenarios)
#[allow(dead_code)]
pub async fn setup_manager_with_kv(
    server: &MockServer,
    wallets: Vec<Arc<MockWallet>>,
    kv: Arc<MemoryStore>,
) -> TestHarness {
    let client =
        ApiClient::with_config_and_base_url(ClientConfig::default(), &server.uri()).unwrap();
    let directory = StaticWalletDirectory::new(
        wallets
            .into_iter()
            .map(|w| w as Arc<dyn WalletAccount>)
            .collect(),
    );
    let launcher = Arc::new(RecordingLauncher::new());

    let manager = SessionManager::new(
        AuthNegotiator::new(client),
        SessionStore::new(kv.clone()),
        Arc::new(directory),
        launcher.clone(),
    )
    .await;

    TestHarness {
        manager,
        kv,
        launcher,
    }
}
