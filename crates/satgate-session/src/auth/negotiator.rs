/*
[INPUT]:  Wallet accounts and the backend auth endpoints
[OUTPUT]: Bearer tokens for authenticated sessions
[POS]:    Auth layer - orchestrates the challenge/response flow
[UPDATE]: When auth endpoints or flow steps change
*/

use reqwest::Method;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::auth::{AuthMaterial, WalletAccount};
use crate::http::{ApiClient, Result, SessionError};
use crate::types::{AuthResult, SignMessageResponse};

/// Wallet label sent with sign-in/sign-up payloads
const WALLET_NAME: &str = "Satgate Bitcoin";

/// Language symbol applied to freshly created accounts
const DEFAULT_LANGUAGE: &str = "EN";

/// Executes the challenge/response protocol against the backend.
///
/// Performs exactly one round trip per step and never retries internally;
/// retry policy belongs to the session manager.
#[derive(Debug, Clone)]
pub struct AuthNegotiator {
    client: ApiClient,
    wallet_name: String,
    default_language: String,
}

impl AuthNegotiator {
    /// Create a negotiator with the default wallet branding
    pub fn new(client: ApiClient) -> Self {
        Self::with_branding(client, WALLET_NAME, DEFAULT_LANGUAGE)
    }

    /// Create a negotiator with an explicit wallet label and account language
    pub fn with_branding(client: ApiClient, wallet_name: &str, default_language: &str) -> Self {
        Self {
            client,
            wallet_name: wallet_name.to_string(),
            default_language: default_language.to_string(),
        }
    }

    /// Get the underlying API client
    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    /// Fetch the challenge message the wallet must sign.
    ///
    /// GET /v1/auth/sign-message?address={address}
    pub async fn fetch_challenge(&self, address: &str) -> Result<String> {
        let builder = self
            .client
            .request(Method::GET, "/v1/auth/sign-message")?
            .query(&[("address", address)]);

        let response: SignMessageResponse = self.client.send_json(builder).await?;
        Ok(response.message)
    }

    /// Submit a signature for an existing account.
    ///
    /// POST /v1/auth/sign-in
    pub async fn sign_in(&self, address: &str, signature: &str) -> Result<AuthResult> {
        let builder = self
            .client
            .request(Method::POST, "/v1/auth/sign-in")?
            .json(&self.credentials_body(address, signature));

        self.client.send_json(builder).await
    }

    /// Create an account for an address unknown to the backend.
    ///
    /// POST /v1/auth/sign-up
    pub async fn sign_up(&self, address: &str, signature: &str) -> Result<AuthResult> {
        let builder = self
            .client
            .request(Method::POST, "/v1/auth/sign-up")?
            .json(&self.credentials_body(address, signature));

        self.client.send_json(builder).await
    }

    /// Complete authentication flow for a wallet.
    ///
    /// 1. Resolve the wallet's authentication material
    /// 2. Fetch and sign a challenge (challenge wallets only)
    /// 3. Sign in, falling back to sign-up when the identity is unknown
    /// 4. Apply account defaults to a freshly created account (best effort)
    pub async fn authenticate(&self, wallet: &dyn WalletAccount) -> Result<String> {
        let (address, signature) = match wallet.auth_material()? {
            AuthMaterial::Challenge { address } => {
                let message = self.fetch_challenge(&address).await?;
                let signature = wallet.sign_message(&message, &address).await?;
                (address, signature)
            }
            AuthMaterial::OwnershipProof { address, proof } => (address, proof),
        };

        self.create_session(&address, &signature).await
    }

    /// Sign in, negotiating account creation when the backend does not know
    /// the address. Geo-restriction surfaces as-is and never falls back.
    async fn create_session(&self, address: &str, signature: &str) -> Result<String> {
        match self.sign_in(address, signature).await {
            Ok(auth) => {
                debug!(address, "signed in");
                Ok(auth.access_token)
            }
            Err(SessionError::UnknownIdentity) => {
                info!(address, "identity unknown, creating account");
                let auth = self.sign_up(address, signature).await?;
                self.apply_account_defaults(&auth.access_token).await;
                Ok(auth.access_token)
            }
            Err(e) => Err(e),
        }
    }

    /// Best-effort post-sign-up step: set the preferred language on the new
    /// account. Failures are logged and never escalate.
    async fn apply_account_defaults(&self, token: &str) {
        let body = json!({ "language": self.default_language });
        let outcome = match self
            .client
            .request_with_bearer(Method::PUT, "/v1/user", token)
        {
            Ok(builder) => self.client.send_empty(builder.json(&body)).await,
            Err(e) => Err(e),
        };

        if let Err(e) = outcome {
            warn!(error = %e, "account defaults update failed");
        }
    }

    fn credentials_body(&self, address: &str, signature: &str) -> serde_json::Value {
        json!({
            "address": address,
            "signature": signature,
            "wallet": self.wallet_name,
        })
    }
}
