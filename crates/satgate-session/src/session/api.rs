/*
[INPUT]:  Wallet-scoped API calls requiring a bearer token
[OUTPUT]: Typed backend responses with transparent re-authentication
[POS]:    Session layer - authenticated endpoint access
[UPDATE]: When adding authenticated endpoints or changing retry policy
*/

use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::http::{Result, SessionError};
use crate::session::SessionManager;
use crate::types::{Language, SellInfo, SellPaymentInfo, SellRoute};

impl SessionManager {
    /// Perform an authenticated call for a wallet.
    ///
    /// On a 401 the cached token is dropped and the call retried once with a
    /// freshly negotiated token; a second rejection is fatal for the call.
    pub async fn call<T: DeserializeOwned>(
        &self,
        wallet_id: &str,
        method: Method,
        endpoint: &str,
    ) -> Result<T> {
        self.call_with_body(wallet_id, method, endpoint, None).await
    }

    /// Perform an authenticated call with a JSON body
    pub async fn call_with_body<T: DeserializeOwned>(
        &self,
        wallet_id: &str,
        method: Method,
        endpoint: &str,
        body: Option<Value>,
    ) -> Result<T> {
        match self
            .authorized_request(wallet_id, method.clone(), endpoint, body.clone())
            .await
        {
            Err(SessionError::Unauthorized) => {
                debug!(wallet_id, "token rejected, re-authenticating");
                self.reset_access_token(wallet_id).await;
                self.authorized_request(wallet_id, method, endpoint, body)
                    .await
                    .map_err(|e| match e {
                        SessionError::Unauthorized => SessionError::Auth(
                            "token rejected after re-authentication".to_string(),
                        ),
                        other => other,
                    })
            }
            other => other,
        }
    }

    /// Languages supported by the backend
    ///
    /// GET /v1/language
    pub async fn get_languages(&self) -> Result<Vec<Language>> {
        let builder = self.client().request(Method::GET, "/v1/language")?;
        self.client().send_json(builder).await
    }

    /// Open a sell route for a wallet
    ///
    /// PUT /v1/sell/paymentInfos
    pub async fn sell_payment_infos(
        &self,
        wallet_id: &str,
        info: &SellPaymentInfo,
    ) -> Result<SellRoute> {
        self.call_with_body(
            wallet_id,
            Method::PUT,
            "/v1/sell/paymentInfos",
            Some(serde_json::to_value(info)?),
        )
        .await
    }

    /// Details of an existing sell route
    ///
    /// GET /v1/sell/{id}
    pub async fn sell_info(&self, wallet_id: &str, id: u64) -> Result<SellInfo> {
        self.call(wallet_id, Method::GET, &format!("/v1/sell/{id}"))
            .await
    }

    async fn authorized_request<T: DeserializeOwned>(
        &self,
        wallet_id: &str,
        method: Method,
        endpoint: &str,
        body: Option<Value>,
    ) -> Result<T> {
        let token = self.access_token(wallet_id).await?;
        let mut builder = self.client().request_with_bearer(method, endpoint, &token)?;
        if let Some(body) = &body {
            builder = builder.json(body);
        }

        self.client().send_json(builder).await
    }
}
