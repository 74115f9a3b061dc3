//! Standard response envelope shared by all Bookteria services.

use serde::Deserialize;
use thiserror::Error;

/// Response envelope.
///
/// Success responses carry the payload under `result`; error responses carry
/// a human-readable `message`. Both fields are optional on the wire, so the
/// envelope deserializes from either shape.
#[derive(Clone, Debug, Deserialize)]
pub struct Envelope<T> {
    /// Payload, present on success.
    pub result: Option<T>,

    /// Server-supplied message, present on failure.
    pub message: Option<String>,
}

impl<T> Envelope<T> {
    /// Unwrap the payload.
    ///
    /// # Errors
    ///
    /// Returns `EnvelopeError::Message` with the server-supplied message when
    /// the envelope carries no payload, or `EnvelopeError::Empty` when it
    /// carries neither payload nor message.
    pub fn into_result(self) -> Result<T, EnvelopeError> {
        match self.result {
            Some(value) => Ok(value),
            None => Err(self
                .message
                .map_or(EnvelopeError::Empty, EnvelopeError::Message)),
        }
    }
}

/// Failure to unwrap a response envelope.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum EnvelopeError {
    /// The envelope carried a server message instead of a payload.
    #[error("{0}")]
    Message(String),

    /// The envelope carried neither payload nor message.
    #[error("response envelope carried no result")]
    Empty,
}

/// Best-effort extraction of the `message` field from a raw error body.
///
/// Returns `None` when the body is not JSON or carries no message; callers
/// fall back to a generic text in that case.
#[must_use]
pub fn error_message(body: &[u8]) -> Option<String> {
    #[derive(Deserialize)]
    struct ErrorBody {
        message: Option<String>,
    }

    serde_json::from_slice::<ErrorBody>(body)
        .ok()
        .and_then(|parsed| parsed.message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_unwraps_result() {
        let envelope: Envelope<u32> = serde_json::from_str(r#"{"result": 7}"#).unwrap();
        assert_eq!(envelope.into_result(), Ok(7));
    }

    #[test]
    fn test_envelope_surfaces_server_message() {
        let envelope: Envelope<u32> =
            serde_json::from_str(r#"{"message": "Invalid credentials"}"#).unwrap();
        assert_eq!(
            envelope.into_result(),
            Err(EnvelopeError::Message("Invalid credentials".to_string()))
        );
    }

    #[test]
    fn test_empty_envelope() {
        let envelope: Envelope<u32> = serde_json::from_str("{}").unwrap();
        assert_eq!(envelope.into_result(), Err(EnvelopeError::Empty));
    }

    #[test]
    fn test_error_message_extraction() {
        assert_eq!(
            error_message(br#"{"message": "boom", "code": 1004}"#),
            Some("boom".to_string())
        );
        assert_eq!(error_message(b"<html>502</html>"), None);
        assert_eq!(error_message(b"{}"), None);
    }
}
