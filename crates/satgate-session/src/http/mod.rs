/*
[INPUT]:  HTTP client configuration and backend endpoints
[OUTPUT]: HTTP responses and typed API results
[POS]:    HTTP layer - REST communication with the services backend
[UPDATE]: When adding new endpoints or changing client behavior
*/

pub mod client;
pub mod error;

pub use client::{ApiClient, ClientConfig};
pub use error::{Result, SessionError};
