/*
[INPUT]:  Backend REST schema definitions
[OUTPUT]: Typed request/response bodies with serde support
[POS]:    Data layer - wire types for the services backend
[UPDATE]: When the backend schema changes or new endpoints are added
*/

use serde::{Deserialize, Serialize};

/// Challenge returned by the sign-message endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct SignMessageResponse {
    pub message: String,
}

/// Result of a successful sign-in or sign-up
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResult {
    #[serde(rename = "accessToken")]
    pub access_token: String,
}

/// Account language entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Language {
    pub id: u32,
    pub name: String,
    pub symbol: String,
    #[serde(rename = "foreignName")]
    pub foreign_name: String,
    pub enable: bool,
}

/// Page selector for the backend's embedded web flow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServicePage {
    Buy,
    Sell,
}

impl ServicePage {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServicePage::Buy => "buy",
            ServicePage::Sell => "sell",
        }
    }
}

/// Payment details for opening a sell route
#[derive(Debug, Clone, Serialize)]
pub struct SellPaymentInfo {
    pub iban: String,
    pub currency: String,
    pub asset: String,
    pub amount: f64,
}

/// Sell route opened by the backend
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SellRoute {
    #[serde(rename = "routeId")]
    pub route_id: u64,
    pub deposit: String,
    pub fee: f64,
    #[serde(rename = "minVolume")]
    pub min_volume: f64,
    #[serde(rename = "estimatedAmount")]
    pub estimated_amount: f64,
}

/// Deposit endpoint of an existing sell route
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DepositInfo {
    pub id: u64,
    pub address: String,
}

/// Details of an existing sell route
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SellInfo {
    pub deposit: DepositInfo,
    pub iban: String,
    pub currency: String,
    pub fee: f64,
}
