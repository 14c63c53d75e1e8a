// Update codec - wire and log form of a ChainUpdate
//
// Frame: one format byte, then the postcard body. Text forms wrap the same
// frame in hex or URL-safe base64.

use crate::event::ChainUpdate;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use thiserror::Error;

/// Format byte written in front of every encoded update
pub const FORMAT_VERSION: u8 = 1;

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("Failed to encode update: {0}")]
    EncodeError(String),

    #[error("Failed to decode update: {0}")]
    DecodeError(String),

    #[error("Unsupported update format {0}, expected {FORMAT_VERSION}")]
    UnsupportedVersion(u8),

    #[error("Invalid hex string: {0}")]
    InvalidHex(String),

    #[error("Invalid base64 string: {0}")]
    InvalidBase64(String),
}

pub struct UpdateCodec;

impl UpdateCodec {
    /// Encode to a versioned binary frame
    pub fn encode(update: &ChainUpdate) -> Result<Vec<u8>, CodecError> {
        let body = postcard::to_allocvec(update).map_err(|e| CodecError::EncodeError(e.to_string()))?;
        let mut frame = Vec::with_capacity(body.len() + 1);
        frame.push(FORMAT_VERSION);
        frame.extend_from_slice(&body);
        Ok(frame)
    }

    /// Decode a versioned binary frame
    pub fn decode(frame: &[u8]) -> Result<ChainUpdate, CodecError> {
        match frame.split_first() {
            None => Err(CodecError::DecodeError("empty frame".to_string())),
            Some((&FORMAT_VERSION, body)) => {
                postcard::from_bytes(body).map_err(|e| CodecError::DecodeError(e.to_string()))
            }
            Some((&version, _)) => Err(CodecError::UnsupportedVersion(version)),
        }
    }

    pub fn encode_hex(update: &ChainUpdate) -> Result<String, CodecError> {
        Self::encode(update).map(hex::encode)
    }

    pub fn decode_hex(text: &str) -> Result<ChainUpdate, CodecError> {
        let frame = hex::decode(text.trim()).map_err(|e| CodecError::InvalidHex(e.to_string()))?;
        Self::decode(&frame)
    }

    pub fn encode_base64(update: &ChainUpdate) -> Result<String, CodecError> {
        Self::encode(update).map(|frame| URL_SAFE_NO_PAD.encode(frame))
    }

    pub fn decode_base64(text: &str) -> Result<ChainUpdate, CodecError> {
        let frame = URL_SAFE_NO_PAD
            .decode(text.trim())
            .map_err(|e| CodecError::InvalidBase64(e.to_string()))?;
        Self::decode(&frame)
    }
}
