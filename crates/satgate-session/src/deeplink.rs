/*
[INPUT]:  Session token, balance and page context
[OUTPUT]: Percent-encoded hand-off URL for the embedded web flow
[POS]:    Hand-off layer - deep-link composition and launching seam
[UPDATE]: When the web flow's query contract changes
*/

use std::sync::Mutex;

use url::Url;

use crate::http::Result;
use crate::types::ServicePage;

/// Production base URL of the embedded web flow
const SERVICES_BASE_URL: &str = "https://services.satgate.io";

/// Deep link back into the app after the web flow completes
const REDIRECT_URI: &str = "satgate://";

/// Composes hand-off URLs into the backend's embedded web flow.
#[derive(Debug, Clone)]
pub struct ServicesLink {
    base_url: Url,
    redirect_uri: String,
}

impl ServicesLink {
    /// Create a composer against an explicit web flow URL (tests, staging)
    pub fn new(base_url: &str, redirect_uri: &str) -> Result<Self> {
        Ok(Self {
            base_url: Url::parse(base_url)?,
            redirect_uri: redirect_uri.to_string(),
        })
    }

    /// Build the web-flow URL carrying the session and wallet context.
    ///
    /// Every dynamic component is percent-encoded. Pure; malformed base URLs
    /// are rejected at construction time.
    pub fn service_url(
        &self,
        token: &str,
        balance: &str,
        service: ServicePage,
        locale: &str,
    ) -> Url {
        let mut url = self.base_url.clone();
        url.query_pairs_mut()
            .append_pair("session", token)
            .append_pair("blockchain", "Bitcoin")
            .append_pair("balances", &format!("{balance}@BTC"))
            .append_pair("service", service.as_str())
            .append_pair("lang", locale)
            .append_pair("redirect-uri", &self.redirect_uri);

        url
    }
}

impl Default for ServicesLink {
    fn default() -> Self {
        Self {
            base_url: Url::parse(SERVICES_BASE_URL).expect("static services URL"),
            redirect_uri: REDIRECT_URI.to_string(),
        }
    }
}

/// OS URL launching capability. Fire-and-forget; launches are not awaited.
pub trait UrlLauncher: Send + Sync {
    fn open_url(&self, url: &str);
}

/// Launcher that records opened URLs (tests)
#[derive(Debug, Default)]
pub struct RecordingLauncher {
    opened: Mutex<Vec<String>>,
}

impl RecordingLauncher {
    pub fn new() -> Self {
        Self::default()
    }

    /// URLs opened so far, in order
    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().unwrap().clone()
    }
}

impl UrlLauncher for RecordingLauncher {
    fn open_url(&self, url: &str) {
        self.opened.lock().unwrap().push(url.to_string());
    }
}
