// Player key management

use crate::core::{hash160, script::p2wpkh_script_pubkey, Network};
use crate::error::{Error, Result};
use crate::wallet::Address;
use rand::rngs::OsRng;
use secp256k1::{PublicKey, Secp256k1, SecretKey};

/// Compressed-pubkey marker appended to the WIF payload
const WIF_COMPRESSED: u8 = 0x01;

/// The player's key. It is only used to derive the payout address: the
/// puzzle script itself needs no signature.
#[derive(Clone)]
pub struct PlayerKey {
    pub secret_key: SecretKey,
    pub public_key: PublicKey,
    pub network: Network,
}

impl PlayerKey {
    /// Generate a fresh key
    pub fn generate(network: Network) -> Self {
        let secp = Secp256k1::new();
        let mut rng = OsRng;

        let secret_key = SecretKey::new(&mut rng);
        let public_key = secret_key.public_key(&secp);

        Self {
            secret_key,
            public_key,
            network,
        }
    }

    /// Import a Base58Check WIF private key
    pub fn from_wif(wif: &str, network: Network) -> Result<Self> {
        let payload = bs58::decode(wif.trim())
            .with_check(None)
            .into_vec()
            .map_err(|e| Error::InvalidKey(format!("Invalid WIF encoding: {}", e)))?;

        let (prefix, body) = payload
            .split_first()
            .ok_or_else(|| Error::InvalidKey("Empty WIF payload".to_string()))?;

        if *prefix != network.wif_prefix() {
            return Err(Error::InvalidKey(format!(
                "WIF prefix 0x{:02x} does not match network {} (expected 0x{:02x})",
                prefix,
                network,
                network.wif_prefix()
            )));
        }

        // Segwit outputs require compressed keys
        let secret_bytes = match body {
            [key @ .., WIF_COMPRESSED] if key.len() == 32 => key,
            _ => {
                return Err(Error::InvalidKey(
                    "WIF must encode a 32-byte key with the compressed flag".to_string(),
                ));
            }
        };

        let secp = Secp256k1::new();
        let secret_key = SecretKey::from_slice(secret_bytes)
            .map_err(|e| Error::InvalidKey(format!("Invalid secret key: {}", e)))?;
        let public_key = secret_key.public_key(&secp);

        Ok(Self {
            secret_key,
            public_key,
            network,
        })
    }

    /// Export as compressed WIF
    pub fn to_wif(&self) -> String {
        let mut payload = Vec::with_capacity(34);
        payload.push(self.network.wif_prefix());
        payload.extend_from_slice(&self.secret_key.secret_bytes());
        payload.push(WIF_COMPRESSED);
        bs58::encode(payload).with_check().into_string()
    }

    /// Compressed public key bytes
    pub fn pubkey_bytes(&self) -> [u8; 33] {
        self.public_key.serialize()
    }

    pub fn pubkey_hash(&self) -> [u8; 20] {
        hash160(&self.pubkey_bytes())
    }

    /// P2WPKH output script
    pub fn script_pubkey(&self) -> Vec<u8> {
        p2wpkh_script_pubkey(&self.pubkey_hash())
    }

    /// P2WPKH payout address
    pub fn p2wpkh_address(&self) -> Result<Address> {
        Address::from_witness_program(self.network, 0, &self.pubkey_hash())
    }
}
