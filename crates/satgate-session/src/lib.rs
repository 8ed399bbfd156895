/*
[INPUT]:  Crate modules and public type definitions
[OUTPUT]: Public satgate session crate surface
[POS]:    Crate root - module wiring
[UPDATE]: When public modules or exports change
*/

pub mod auth;
pub mod deeplink;
pub mod http;
pub mod session;
pub mod types;

// Re-export commonly used types from auth
pub use auth::{
    AuthMaterial,
    AuthNegotiator,
    MockWallet,
    StaticWalletDirectory,
    WalletAccount,
    WalletDirectory,
    token,
};

// Re-export commonly used types from http
pub use http::{
    ApiClient,
    ClientConfig,
    Result,
    SessionError,
};

// Re-export commonly used types from session
pub use session::{
    FileStore,
    KeyValueStore,
    MemoryStore,
    SessionManager,
    SessionStore,
};

// Re-export the hand-off surface
pub use deeplink::{RecordingLauncher, ServicesLink, UrlLauncher};

// Re-export all wire types
pub use types::*;
