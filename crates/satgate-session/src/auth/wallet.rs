/*
[INPUT]:  Wallet identity and signing capability
[OUTPUT]: Authentication material and message signatures
[POS]:    Auth layer - wallet integration abstraction
[UPDATE]: When adding new wallet kinds or changing the proof strategy
*/

use std::sync::Arc;

use async_trait::async_trait;

use crate::http::{Result, SessionError};

/// How a wallet proves control of its address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthMaterial {
    /// Sign a fresh backend-issued challenge with the wallet key
    Challenge { address: String },

    /// Present a pre-established address and ownership-proof signature.
    /// No challenge round trip is needed for these wallets.
    OwnershipProof { address: String, proof: String },
}

/// Trait for wallets that can authenticate with the services backend.
///
/// Implement this for each wallet kind. Signing is async to support
/// hardware-backed keys and user confirmation prompts.
#[async_trait]
pub trait WalletAccount: Send + Sync {
    /// Stable identifier of this wallet within the app
    fn wallet_id(&self) -> &str;

    /// Resolve the material this wallet authenticates with.
    ///
    /// Wallet kinds without an authentication strategy return
    /// [`SessionError::UnsupportedWallet`].
    fn auth_material(&self) -> Result<AuthMaterial>;

    /// Sign a message with the key controlling `address`
    async fn sign_message(&self, message: &str, address: &str) -> Result<String>;
}

/// Lookup of live wallets by identifier
pub trait WalletDirectory: Send + Sync {
    fn wallet(&self, wallet_id: &str) -> Option<Arc<dyn WalletAccount>>;
}

/// Directory over a fixed set of wallets
#[derive(Clone, Default)]
pub struct StaticWalletDirectory {
    wallets: Vec<Arc<dyn WalletAccount>>,
}

impl StaticWalletDirectory {
    pub fn new(wallets: Vec<Arc<dyn WalletAccount>>) -> Self {
        Self { wallets }
    }
}

impl WalletDirectory for StaticWalletDirectory {
    fn wallet(&self, wallet_id: &str) -> Option<Arc<dyn WalletAccount>> {
        self.wallets
            .iter()
            .find(|w| w.wallet_id() == wallet_id)
            .cloned()
    }
}

/// Mock wallet for testing
#[derive(Debug, Clone)]
pub struct MockWallet {
    wallet_id: String,
    material: Option<AuthMaterial>,
    signature: Option<String>,
}

impl MockWallet {
    /// Challenge-signing wallet with a predetermined signature
    pub fn new(wallet_id: &str, address: &str, signature: &str) -> Self {
        Self {
            wallet_id: wallet_id.to_string(),
            material: Some(AuthMaterial::Challenge {
                address: address.to_string(),
            }),
            signature: Some(signature.to_string()),
        }
    }

    /// Wallet that authenticates with a stored ownership proof
    pub fn with_ownership_proof(wallet_id: &str, address: &str, proof: &str) -> Self {
        Self {
            wallet_id: wallet_id.to_string(),
            material: Some(AuthMaterial::OwnershipProof {
                address: address.to_string(),
                proof: proof.to_string(),
            }),
            signature: None,
        }
    }

    /// Wallet kind without an authentication strategy
    pub fn unsupported(wallet_id: &str) -> Self {
        Self {
            wallet_id: wallet_id.to_string(),
            material: None,
            signature: None,
        }
    }

    /// Wallet whose signer declines every request
    pub fn declining(wallet_id: &str, address: &str) -> Self {
        Self {
            wallet_id: wallet_id.to_string(),
            material: Some(AuthMaterial::Challenge {
                address: address.to_string(),
            }),
            signature: None,
        }
    }
}

#[async_trait]
impl WalletAccount for MockWallet {
    fn wallet_id(&self) -> &str {
        &self.wallet_id
    }

    fn auth_material(&self) -> Result<AuthMaterial> {
        self.material
            .clone()
            .ok_or_else(|| SessionError::UnsupportedWallet(self.wallet_id.clone()))
    }

    async fn sign_message(&self, _message: &str, _address: &str) -> Result<String> {
        self.signature
            .clone()
            .ok_or_else(|| SessionError::Signing("user declined".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_wallet_signs() {
        let wallet = MockWallet::new("w1", "bc1qmain", "sig-1");

        assert_eq!(wallet.wallet_id(), "w1");
        assert_eq!(
            wallet.auth_material().unwrap(),
            AuthMaterial::Challenge {
                address: "bc1qmain".to_string()
            }
        );

        let signature = wallet.sign_message("challenge", "bc1qmain").await.unwrap();
        assert_eq!(signature, "sig-1");
    }

    #[tokio::test]
    async fn test_declining_wallet_fails_signing() {
        let wallet = MockWallet::declining("w1", "bc1qmain");
        let err = wallet.sign_message("challenge", "bc1qmain").await.unwrap_err();
        assert!(matches!(err, SessionError::Signing(_)));
    }

    #[test]
    fn test_unsupported_wallet_kind() {
        let wallet = MockWallet::unsupported("w-taproot");
        let err = wallet.auth_material().unwrap_err();
        assert_eq!(err, SessionError::UnsupportedWallet("w-taproot".to_string()));
    }

    #[test]
    fn test_static_directory_lookup() {
        let directory = StaticWalletDirectory::new(vec![
            Arc::new(MockWallet::new("w1", "bc1qa", "sig-a")),
            Arc::new(MockWallet::new("w2", "bc1qb", "sig-b")),
        ]);

        assert!(directory.wallet("w2").is_some());
        assert!(directory.wallet("w3").is_none());
    }
}
