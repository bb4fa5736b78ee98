use actix_web::http::StatusCode;
use actix_web::http::header::ContentType;
use actix_web::{HttpResponse, ResponseError};
use tracing::error;

use crate::errors::ShortenerError;

impl ResponseError for ShortenerError {
    fn status_code(&self) -> StatusCode {
        match self {
            ShortenerError::NotFound(_) => StatusCode::NOT_FOUND,
            ShortenerError::InvalidIdentifier(_) | ShortenerError::Validation(_) => {
                StatusCode::BAD_REQUEST
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if !self.is_client_error() {
            error!("Request failed: {} {}", self.code(), self);
        }
        HttpResponse::build(self.status_code())
            .content_type(ContentType::plaintext())
            .body(self.format_simple())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ShortenerError::not_found("x").status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ShortenerError::invalid_identifier("x").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ShortenerError::validation("x").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ShortenerError::storage_io("x").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ShortenerError::constraint_violation("x").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
