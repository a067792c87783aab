//! HMAC-SHA256 message signing and chain-hash tamper evidence (C12).
//!
//! Canonical serialisation is `role|\u{1e}|content`: the record
//! separator is not a character either field can contain innocently, so
//! there's no ambiguity between `role="a|b"` and a role/content split at
//! a different offset.

use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::error::{IntegrityError, Result};

type HmacSha256 = Hmac<Sha256>;

const RECORD_SEPARATOR: char = '\u{1e}';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
    Tool,
}

impl Role {
    fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
            Role::Tool => "tool",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    fn canonical(&self) -> String {
        format!("{}|{}|{}", self.role.as_str(), RECORD_SEPARATOR, self.content)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignedMessage {
    pub message: Message,
    /// Lowercase hex HMAC, or empty when `assistant_only` suppressed it
    /// for a non-assistant role.
    pub signature: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignedConversation {
    pub messages: Vec<SignedMessage>,
    pub chain_hash: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyResult {
    pub valid: bool,
    pub tampered_indices: Vec<usize>,
    pub chain_valid: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct SignConfig {
    pub assistant_only: bool,
}

impl Default for SignConfig {
    fn default() -> Self {
        Self { assistant_only: true }
    }
}

/// Holds the session secret and signs/verifies messages against it.
/// Algorithm is fixed at HMAC-SHA256; the spec leaves room for a
/// configurable MAC but SHA-256 is the only one this crate's dependency
/// stack carries, and nothing in the corpus pulls in a second digest.
pub struct Signer {
    secret: Vec<u8>,
}

impl Signer {
    pub fn new(secret: impl AsRef<[u8]>) -> Result<Self> {
        let secret = secret.as_ref().to_vec();
        if secret.is_empty() {
            return Err(IntegrityError::EmptySecret);
        }
        Ok(Self { secret })
    }

    fn mac(&self) -> Result<HmacSha256> {
        HmacSha256::new_from_slice(&self.secret).map_err(|_| IntegrityError::InvalidKeyLength)
    }

    /// MAC over the canonical serialisation of a single message.
    pub fn sign(&self, message: &Message) -> Result<String> {
        let mut mac = self.mac()?;
        mac.update(message.canonical().as_bytes());
        Ok(hex_encode(&mac.finalize().into_bytes()))
    }

    pub fn sign_conversation(
        &self,
        messages: &[Message],
        config: SignConfig,
    ) -> Result<SignedConversation> {
        let mut signed = Vec::with_capacity(messages.len());
        for message in messages {
            let signature = if config.assistant_only && message.role != Role::Assistant {
                String::new()
            } else {
                self.sign(message)?
            };
            signed.push(SignedMessage {
                message: message.clone(),
                signature,
            });
        }
        let chain_hash = self.chain_hash(&signed)?;
        Ok(SignedConversation {
            messages: signed,
            chain_hash,
        })
    }

    fn chain_hash(&self, signed: &[SignedMessage]) -> Result<String> {
        let mut mac = self.mac()?;
        for entry in signed {
            mac.update(entry.message.role.as_str().as_bytes());
            mac.update(&[RECORD_SEPARATOR as u8]);
            mac.update(entry.message.content.as_bytes());
            mac.update(&[RECORD_SEPARATOR as u8]);
            mac.update(entry.signature.as_bytes());
        }
        Ok(hex_encode(&mac.finalize().into_bytes()))
    }

    /// Recompute per-message signatures (skipping empty-signature slots,
    /// which mark entries the signer never signed in the first place),
    /// then recompute the chain hash.
    pub fn verify_conversation(&self, signed: &SignedConversation) -> Result<VerifyResult> {
        let mut tampered_indices = Vec::new();
        for (index, entry) in signed.messages.iter().enumerate() {
            if entry.signature.is_empty() {
                continue;
            }
            let expected = self.sign(&entry.message)?;
            if expected != entry.signature {
                tampered_indices.push(index);
            }
        }
        let expected_chain = self.chain_hash(&signed.messages)?;
        let chain_valid = expected_chain == signed.chain_hash;
        let valid = chain_valid && tampered_indices.is_empty();
        Ok(VerifyResult {
            valid,
            tampered_indices,
            chain_valid,
        })
    }
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
