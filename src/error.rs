use std::fmt::{self, Display, Formatter};

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};

use crate::upstream::UpstreamError;

/// Client-facing failure taxonomy. Terminal: once a failure is classified it
/// is never retried, only reported.
///
/// The carried strings on `UpstreamUnreachable` and `Internal` are for the
/// server log; `Display` substitutes fixed text so transport details and raw
/// upstream bodies never reach the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    InvalidInput(String),
    AdmissionCapExceeded,
    RateLimitExceeded,
    UpstreamUnreachable(String),
    UpstreamRejected { status: u16, message: String },
    ServiceUnavailable(String),
    Internal(String),
}

impl GatewayError {
    pub fn http_status(&self) -> u16 {
        match self {
            GatewayError::InvalidInput(_) => 400,
            GatewayError::AdmissionCapExceeded => 429,
            GatewayError::RateLimitExceeded => 429,
            GatewayError::UpstreamUnreachable(_) => 500,
            GatewayError::UpstreamRejected { status, .. } => *status,
            GatewayError::ServiceUnavailable(_) => 500,
            GatewayError::Internal(_) => 500,
        }
    }
}

impl Display for GatewayError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            GatewayError::InvalidInput(message) => write!(f, "{message}"),
            GatewayError::AdmissionCapExceeded => {
                write!(f, "Too many requests from this client. Please slow down.")
            }
            GatewayError::RateLimitExceeded => write!(
                f,
                "The assistant is handling too many requests right now. Please try again shortly."
            ),
            GatewayError::UpstreamUnreachable(_) => {
                write!(f, "The assistant service could not be reached.")
            }
            GatewayError::UpstreamRejected { message, .. } => write!(f, "{message}"),
            GatewayError::ServiceUnavailable(message) => write!(f, "{message}"),
            GatewayError::Internal(_) => write!(f, "An internal error occurred."),
        }
    }
}

impl std::error::Error for GatewayError {}

impl ResponseError for GatewayError {
    fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .content_type("text/plain; charset=utf-8")
            .body(self.to_string())
    }
}

/// Pure mapping from a raw upstream failure to the client-facing taxonomy.
pub fn classify(failure: UpstreamError) -> GatewayError {
    match failure {
        UpstreamError::RateLimited => GatewayError::RateLimitExceeded,
        UpstreamError::Rejected { status, message } => GatewayError::UpstreamRejected {
            status,
            message: message
                .unwrap_or_else(|| "The assistant service rejected the request.".to_string()),
        },
        UpstreamError::Unreachable(detail) => GatewayError::UpstreamUnreachable(detail),
        UpstreamError::Malformed(detail) => GatewayError::Internal(detail),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limited_maps_to_429_with_a_fixed_message() {
        let classified = classify(UpstreamError::RateLimited);
        assert_eq!(classified, GatewayError::RateLimitExceeded);
        assert_eq!(classified.http_status(), 429);
        assert!(!classified.to_string().is_empty());
    }

    #[test]
    fn rejection_mirrors_status_and_forwards_the_embedded_message() {
        let classified = classify(UpstreamError::Rejected {
            status: 401,
            message: Some("invalid api key".to_string()),
        });
        assert_eq!(classified.http_status(), 401);
        assert_eq!(classified.to_string(), "invalid api key");
    }

    #[test]
    fn rejection_without_a_message_gets_a_generic_fallback() {
        let classified = classify(UpstreamError::Rejected {
            status: 503,
            message: None,
        });
        assert_eq!(classified.http_status(), 503);
        assert_eq!(
            classified.to_string(),
            "The assistant service rejected the request."
        );
    }

    #[test]
    fn transport_failures_map_to_500_without_leaking_detail() {
        let classified = classify(UpstreamError::Unreachable(
            "connection refused (os error 111)".to_string(),
        ));
        assert_eq!(classified.http_status(), 500);
        assert!(!classified.to_string().contains("os error"));
    }

    #[test]
    fn malformed_payloads_are_internal_errors() {
        let classified = classify(UpstreamError::Malformed("missing choices".to_string()));
        assert_eq!(classified, GatewayError::Internal("missing choices".to_string()));
        assert_eq!(classified.http_status(), 500);
        assert_eq!(classified.to_string(), "An internal error occurred.");
    }

    #[test]
    fn response_bodies_are_plain_text() {
        let response = GatewayError::AdmissionCapExceeded.error_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        let content_type = response
            .headers()
            .get(actix_web::http::header::CONTENT_TYPE)
            .unwrap();
        assert_eq!(content_type, "text/plain; charset=utf-8");
    }
}
