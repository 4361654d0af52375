//! AES-256-CFB stream transform with base64 armor.
//!
//! Every write uses the same key and IV, so this is obfuscation rather than
//! confidentiality. The compat constants keep files written by earlier
//! releases readable.

use super::{BufferCodec, CodecError};
use aes::Aes256;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use cfb_mode::cipher::{AsyncStreamCipher, KeyIvInit};
use std::fmt::{Debug, Formatter};

type Aes256CfbEnc = cfb_mode::Encryptor<Aes256>;
type Aes256CfbDec = cfb_mode::Decryptor<Aes256>;

pub const CODEC_KEY_LEN: usize = 32;
pub const CODEC_IV_LEN: usize = 16;

const COMPAT_KEY: &[u8; CODEC_KEY_LEN] = b"ebee6254-d04e-4e51-be09-d0c7c8d4";
const COMPAT_IV: [u8; CODEC_IV_LEN] = [
    35, 46, 57, 24, 85, 35, 24, 74, 87, 35, 88, 98, 66, 32, 14, 5,
];

/// Key material for [`AesCfbCodec`].
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct CodecConfig {
    key: [u8; CODEC_KEY_LEN],
    iv: [u8; CODEC_IV_LEN],
}

impl CodecConfig {
    pub fn new(key: [u8; CODEC_KEY_LEN], iv: [u8; CODEC_IV_LEN]) -> Self {
        Self { key, iv }
    }

    /// Key and IV used by every data file written so far.
    pub fn compat() -> Self {
        Self::new(*COMPAT_KEY, COMPAT_IV)
    }
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self::compat()
    }
}

impl Debug for CodecConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodecConfig")
            .field("key", &"<redacted>")
            .field("iv", &"<redacted>")
            .finish()
    }
}

/// Full-block CFB over AES-256, armored as standard padded base64.
#[derive(Debug, Clone, Default)]
pub struct AesCfbCodec {
    config: CodecConfig,
}

impl AesCfbCodec {
    pub fn new(config: CodecConfig) -> Self {
        Self { config }
    }
}

impl BufferCodec for AesCfbCodec {
    fn encode(&self, plain: &[u8]) -> Vec<u8> {
        let mut buf = plain.to_vec();
        Aes256CfbEnc::new(&self.config.key.into(), &self.config.iv.into()).encrypt(&mut buf);
        STANDARD.encode(buf).into_bytes()
    }

    fn decode(&self, stored: &[u8]) -> Result<Vec<u8>, CodecError> {
        // Hand-edited files commonly gain a trailing newline.
        let trimmed = stored.trim_ascii();
        let mut buf = STANDARD
            .decode(trimmed)
            .map_err(|err| CodecError::Armor {
                codec_id: self.codec_id(),
                detail: err.to_string(),
            })?;
        Aes256CfbDec::new(&self.config.key.into(), &self.config.iv.into()).decrypt(&mut buf);
        Ok(buf)
    }

    fn codec_id(&self) -> &'static str {
        "aes256-cfb-b64"
    }
}
