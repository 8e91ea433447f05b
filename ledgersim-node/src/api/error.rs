use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use ledgersim_common::LedgerError;

/// `LedgerError` as an HTTP response: `{"error": kind, "message": text}`.
#[derive(Debug)]
pub struct ApiError(pub LedgerError);

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self.0 {
            LedgerError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            LedgerError::UnknownPeer(_) | LedgerError::UnknownBlock { .. } => StatusCode::NOT_FOUND,
            LedgerError::ChainCompromised { .. }
            | LedgerError::ConsensusNotReached { .. }
            | LedgerError::VerdictConflict { .. } => StatusCode::CONFLICT,
            LedgerError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorBody {
            error: self.0.kind(),
            message: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledgersim_common::PeerId;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (LedgerError::InvalidInput("x".into()), StatusCode::BAD_REQUEST),
            (LedgerError::UnknownPeer(PeerId::from("A")), StatusCode::NOT_FOUND),
            (
                LedgerError::ConsensusNotReached { index: 1, confirmed: 0, total: 2, threshold: 67 },
                StatusCode::CONFLICT,
            ),
            (LedgerError::Persistence("disk".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError(err).status(), status);
        }
    }
}
