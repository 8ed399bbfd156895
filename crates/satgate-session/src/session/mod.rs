/*
[INPUT]:  Authenticated wallets and durable storage
[OUTPUT]: Cached multi-wallet sessions and availability state
[POS]:    Session layer - lifecycle of per-wallet bearer tokens
[UPDATE]: When session caching or persistence behavior changes
*/

pub mod api;
pub mod manager;
pub mod store;

pub use manager::SessionManager;
pub use store::{FileStore, KeyValueStore, MemoryStore, SessionStore};
