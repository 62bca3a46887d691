use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AppError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Body parsing error: {0}")]
    BodyParsing(String),

    #[error("Request cancelled")]
    Cancelled,

    #[error("Not found: {0}")]
    NotFound(String),
}

impl AppError {
    /// Message surfaced to the view layer, without the variant prefix.
    pub fn message(&self) -> String {
        match self {
            AppError::Transport(m)
            | AppError::BodyParsing(m)
            | AppError::NotFound(m) => m.clone(),
            AppError::HttpStatus { body, .. } => body.clone(),
            AppError::Cancelled => "request cancelled".into(),
        }
    }
}

/// Helper for mapping any transport level error into `AppError::Transport`
pub fn transport_error<E: ToString>(err: E) -> AppError {
    AppError::Transport(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_strips_variant_prefix() {
        let err = AppError::HttpStatus {
            status: 502,
            body: "bad gateway".into(),
        };
        assert_eq!(err.to_string(), "HTTP 502: bad gateway");
        assert_eq!(err.message(), "bad gateway");
        assert_eq!(transport_error("boom").message(), "boom");
        assert_eq!(AppError::BodyParsing("eof".into()).message(), "eof");
    }
}
