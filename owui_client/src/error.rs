use reqwest::StatusCode;

/// Failures surfaced by the client: transport problems, authentication
/// rejections, and remote API errors mapped from HTTP status codes.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("authentication rejected ({status}): {message}")]
    Auth { status: u16, message: String },

    #[error("not found: {message}")]
    NotFound { message: String },

    #[error("rate limited: {message}")]
    RateLimited { message: String },

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("failed to decode payload: {0}")]
    Decode(String),
}

impl ClientError {
    pub fn from_status(status: StatusCode, message: String) -> Self {
        match status.as_u16() {
            401 | 403 => ClientError::Auth {
                status: status.as_u16(),
                message,
            },
            404 => ClientError::NotFound { message },
            429 => ClientError::RateLimited { message },
            code => ClientError::Api {
                status: code,
                message,
            },
        }
    }

    /// Stable machine-readable tag for this failure.
    pub fn kind(&self) -> &'static str {
        match self {
            ClientError::Auth { .. } => "auth",
            ClientError::NotFound { .. } => "not_found",
            ClientError::RateLimited { .. } => "rate_limited",
            ClientError::Api { .. } => "remote",
            ClientError::Transport(_) => "transport",
            ClientError::Decode(_) => "decode",
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::Decode(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_map_to_kinds() {
        let cases = [
            (StatusCode::UNAUTHORIZED, "auth"),
            (StatusCode::FORBIDDEN, "auth"),
            (StatusCode::NOT_FOUND, "not_found"),
            (StatusCode::TOO_MANY_REQUESTS, "rate_limited"),
            (StatusCode::INTERNAL_SERVER_ERROR, "remote"),
            (StatusCode::BAD_REQUEST, "remote"),
        ];
        for (status, kind) in cases {
            let err = ClientError::from_status(status, "boom".into());
            assert_eq!(err.kind(), kind, "status {status}");
        }
    }
}
