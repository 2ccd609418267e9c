use axum::extract::ws::Message;
use syncboard_shared::{ClientMessage, ServerMessage, WireFormat};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("invalid json frame: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid binary frame: {0}")]
    Decode(#[from] bincode::error::DecodeError),
    #[error("failed to encode binary frame: {0}")]
    Encode(#[from] bincode::error::EncodeError),
}

pub fn encode(format: WireFormat, message: &ServerMessage) -> Result<Message, CodecError> {
    Ok(match format {
        WireFormat::Json => Message::Text(serde_json::to_string(message)?),
        WireFormat::Bincode => {
            Message::Binary(bincode::encode_to_vec(message, bincode::config::standard())?)
        }
    })
}

/// Text frames are JSON and binary frames are bincode, whatever the
/// connection's outbound format. Returns `None` for control frames.
pub fn decode(message: &Message) -> Option<Result<ClientMessage, CodecError>> {
    match message {
        Message::Text(text) => Some(serde_json::from_str(text).map_err(CodecError::from)),
        Message::Binary(data) => Some(
            bincode::decode_from_slice(data, bincode::config::standard())
                .map(|(message, _)| message)
                .map_err(CodecError::from),
        ),
        _ => None,
    }
}
