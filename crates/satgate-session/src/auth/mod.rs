/*
[INPUT]:  Wallet accounts and backend auth endpoints
[OUTPUT]: Authentication flows and token inspection
[POS]:    Auth layer - challenge/response protocol
[UPDATE]: When the auth flow or wallet abstraction changes
*/

pub mod negotiator;
pub mod token;
pub mod wallet;

pub use negotiator::AuthNegotiator;
pub use wallet::{
    AuthMaterial, MockWallet, StaticWalletDirectory, WalletAccount, WalletDirectory,
};
