use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// No structured response: connection, TLS or timeout failures
    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    #[error("status code: {status} {status_text}\n\nbody: {body}")]
    Remote {
        status: u16,
        status_text: String,
        body: String,
    },

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("request cancelled")]
    Cancelled,
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Remote { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_error_renders_status_and_body() {
        let err = ApiError::Remote {
            status: 422,
            status_text: "Unprocessable Entity".to_string(),
            body: r#"{"code":"validation"}"#.to_string(),
        };
        assert_eq!(
            err.to_string(),
            "status code: 422 Unprocessable Entity\n\nbody: {\"code\":\"validation\"}"
        );
        assert!(!err.is_not_found());
    }

    #[test]
    fn not_found_is_detected() {
        let err = ApiError::Remote {
            status: 404,
            status_text: "Not Found".to_string(),
            body: String::new(),
        };
        assert!(err.is_not_found());
        assert!(!ApiError::Cancelled.is_not_found());
    }
}
