// Submission envelope: application discriminator + codec bytes, signed by the caller

use crate::identity::{Address, Keypair, PublicKey, Signature, Signer};
use crate::option::{Action, ActionCodec};
use serde::{Deserialize, Serialize};

/// Discriminator routing transactions to the option application
pub const OPTIONS_APP: &str = "options";

const SIGNING_DOMAIN: &[u8] = b"optledger-tx:";

/// An application transaction as handed to the host
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppTx {
    app: String,
    data: Vec<u8>,
}

impl AppTx {
    pub fn new(app: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            app: app.into(),
            data,
        }
    }

    /// Wrap an option action for the options application
    pub fn options(action: &Action) -> Self {
        Self::new(OPTIONS_APP, ActionCodec::encode(action))
    }

    pub fn app(&self) -> &str {
        &self.app
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        postcard::to_allocvec(self).unwrap_or_default()
    }
}

/// A transaction signed by its caller, with a per-account sequence number
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedTx {
    signer: PublicKey,
    sequence: u64,
    app_tx: AppTx,
    signature: Signature,
}

impl SignedTx {
    pub fn sign(keypair: &Keypair, sequence: u64, app_tx: AppTx) -> Self {
        let signature = Signer::sign(keypair, &signing_bytes(&app_tx, sequence));
        Self {
            signer: keypair.public_key(),
            sequence,
            app_tx,
            signature,
        }
    }

    pub fn from_parts(signer: PublicKey, sequence: u64, app_tx: AppTx, signature: Signature) -> Self {
        Self {
            signer,
            sequence,
            app_tx,
            signature,
        }
    }

    pub fn signer(&self) -> &PublicKey {
        &self.signer
    }

    /// Address of the account that signed
    pub fn caller(&self) -> Address {
        Address::from_public_key(&self.signer)
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn app_tx(&self) -> &AppTx {
        &self.app_tx
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub fn verify(&self) -> bool {
        Signer::verify(&self.signer, &signing_bytes(&self.app_tx, self.sequence), &self.signature)
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        postcard::to_allocvec(self).unwrap_or_default()
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, postcard::Error> {
        postcard::from_bytes(bytes)
    }
}

fn signing_bytes(app_tx: &AppTx, sequence: u64) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(SIGNING_DOMAIN.len() + 8 + app_tx.data.len() + 16);
    bytes.extend_from_slice(SIGNING_DOMAIN);
    bytes.extend_from_slice(&sequence.to_le_bytes());
    bytes.extend_from_slice(&app_tx.to_bytes());
    bytes
}
