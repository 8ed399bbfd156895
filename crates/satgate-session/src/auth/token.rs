/*
[INPUT]:  Bearer token strings (JWTs issued by the services backend)
[OUTPUT]: Expiry claims and validity checks without signature verification
[POS]:    Auth layer - token lifetime inspection
[UPDATE]: When the backend changes token format or expiry claims
*/

use base64::{
    Engine as _,
    engine::general_purpose::{URL_SAFE, URL_SAFE_NO_PAD},
};
use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;

/// Claims inspected by the client. The backend signs its tokens; the client
/// only ever reads the expiry.
#[derive(Debug, Deserialize)]
struct Claims {
    exp: Option<i64>,
}

/// Decode the expiry claim of a JWT without validating its signature.
///
/// Returns `None` if the token does not decode or carries no `exp` claim.
pub fn decode_expiry(token: &str) -> Option<DateTime<Utc>> {
    decode_claims(token)?
        .exp
        .and_then(|exp| Utc.timestamp_opt(exp, 0).single())
}

/// Whether a cached token can still be presented to the backend.
///
/// Absent or undecodable tokens are invalid. A decodable token without an
/// `exp` claim never expires.
pub fn is_valid(token: Option<&str>) -> bool {
    let Some(token) = token else {
        return false;
    };

    match decode_claims(token) {
        Some(Claims { exp: Some(exp) }) => match Utc.timestamp_opt(exp, 0).single() {
            Some(expires_at) => Utc::now() < expires_at,
            None => false,
        },
        Some(Claims { exp: None }) => true,
        None => false,
    }
}

fn decode_claims(token: &str) -> Option<Claims> {
    let payload_b64 = token.trim().split('.').nth(1)?;
    let payload = URL_SAFE_NO_PAD
        .decode(payload_b64)
        .or_else(|_| URL_SAFE.decode(payload_b64))
        .ok()?;

    serde_json::from_slice(&payload).ok()
}
