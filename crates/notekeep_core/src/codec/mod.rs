//! At-rest transform applied to the serialized buffer.
//!
//! # Responsibility
//! - Turn the serialized buffer into armored text and back.
//! - Stay ignorant of JSON and note structure; payloads are opaque bytes.
//!
//! # Invariants
//! - `decode(encode(x)) == x` for every byte sequence, including empty.

use std::error::Error;
use std::fmt::{Display, Formatter};

mod aes_cfb;

pub use aes_cfb::{AesCfbCodec, CodecConfig, CODEC_IV_LEN, CODEC_KEY_LEN};

/// Reversible transform between plaintext and the persisted representation.
pub trait BufferCodec {
    /// Encodes plaintext into the bytes written to disk.
    fn encode(&self, plain: &[u8]) -> Vec<u8>;

    /// Reverses [`BufferCodec::encode`].
    fn decode(&self, stored: &[u8]) -> Result<Vec<u8>, CodecError>;

    /// Short identifier used in diagnostics.
    fn codec_id(&self) -> &'static str;
}

/// Failure while decoding persisted bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Stored text is not valid base64.
    Armor { codec_id: &'static str, detail: String },
}

impl Display for CodecError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Armor { codec_id, detail } => {
                write!(f, "invalid armor (codec={codec_id}): {detail}")
            }
        }
    }
}

impl Error for CodecError {}
