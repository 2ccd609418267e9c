use bincode::{Decode, Encode};
use thiserror::Error;

use crate::DrawOperation;

pub const HISTORY_FILE_MAGIC: [u8; 4] = *b"SBHF";
pub const HISTORY_FILE_VERSION: u32 = 1;
const HISTORY_HEADER_LEN: usize = HISTORY_FILE_MAGIC.len() + std::mem::size_of::<u32>();

/// Persisted canvas history. `next_sequence` survives clears so ordinals
/// never repeat across restarts.
#[derive(Clone, Debug, Default, PartialEq, Encode, Decode, serde::Serialize, serde::Deserialize)]
pub struct HistoryFileData {
    pub next_sequence: u64,
    pub operations: Vec<DrawOperation>,
}

#[derive(Debug, Error)]
pub enum HistoryFileError {
    #[error("not a history file")]
    InvalidHeader,
    #[error("unsupported history file version {0}")]
    UnsupportedVersion(u32),
    #[error("failed to decode history body: {0}")]
    Decode(#[from] bincode::error::DecodeError),
    #[error("failed to encode history body: {0}")]
    Encode(#[from] bincode::error::EncodeError),
}

pub fn encode_history_file(data: &HistoryFileData) -> Result<Vec<u8>, HistoryFileError> {
    let body = bincode::encode_to_vec(data, bincode::config::standard())?;
    let mut payload = Vec::with_capacity(HISTORY_HEADER_LEN + body.len());
    payload.extend_from_slice(&HISTORY_FILE_MAGIC);
    payload.extend_from_slice(&HISTORY_FILE_VERSION.to_le_bytes());
    payload.extend_from_slice(&body);
    Ok(payload)
}

pub fn decode_history_file(payload: &[u8]) -> Result<HistoryFileData, HistoryFileError> {
    if payload.len() < HISTORY_HEADER_LEN || !payload.starts_with(&HISTORY_FILE_MAGIC) {
        return Err(HistoryFileError::InvalidHeader);
    }
    let version = u32::from_le_bytes(
        payload[HISTORY_FILE_MAGIC.len()..HISTORY_HEADER_LEN]
            .try_into()
            .map_err(|_| HistoryFileError::InvalidHeader)?,
    );
    let body = &payload[HISTORY_HEADER_LEN..];
    match version {
        1 => Ok(bincode::decode_from_slice(body, bincode::config::standard())?.0),
        _ => Err(HistoryFileError::UnsupportedVersion(version)),
    }
}
