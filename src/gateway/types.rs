//! API response envelope and error mapping
//!
//! - `ApiResponse<T>`: unified `{success, data?, error?, isIdempotentReplay?}`
//!   wrapper
//! - `ApiResult<T>`: type alias for handler return types
//! - `ApiError`: unified error type with IntoResponse and the engine-error
//!   status mapping

use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use utoipa::ToSchema;

use crate::wallet::EngineError;

// ============================================================================
// Unified API Response Format
// ============================================================================

/// Unified API response wrapper
///
/// - success: whether the request produced a result
/// - data: the result (present on success)
/// - error: short message (present on failure)
/// - isIdempotentReplay: set on write endpoints only
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    #[schema(example = true)]
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_idempotent_replay: Option<bool>,
}

impl<T> ApiResponse<T> {
    /// Create success response
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            is_idempotent_replay: None,
        }
    }

    /// Create success response flagged with replay status
    pub fn success_with_replay(data: T, is_replay: bool) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            is_idempotent_replay: Some(is_replay),
        }
    }

    /// Create error response
    pub fn error(msg: impl Into<String>) -> ApiResponse<()> {
        ApiResponse {
            success: false,
            data: None,
            error: Some(msg.into()),
            is_idempotent_replay: None,
        }
    }
}

// ============================================================================
// ApiResult: DRY Type Alias for Handlers
// ============================================================================

/// Type alias for handler return types - reduces boilerplate
pub type ApiResult<T> =
    Result<(StatusCode, Json<ApiResponse<T>>), (StatusCode, Json<ApiResponse<()>>)>;

/// Helper to create success response (200 OK)
#[inline]
pub fn ok<T: Serialize>(data: T) -> ApiResult<T> {
    Ok((StatusCode::OK, Json(ApiResponse::success(data))))
}

/// Helper to create created response (201 CREATED)
#[inline]
pub fn created<T: Serialize>(data: T) -> ApiResult<T> {
    Ok((StatusCode::CREATED, Json(ApiResponse::success(data))))
}

/// Helper for write endpoints: 201 on fresh execution, 200 on replay
#[inline]
pub fn write_result<T: Serialize>(data: T, is_replay: bool) -> ApiResult<T> {
    let status = if is_replay {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };
    Ok((
        status,
        Json(ApiResponse::success_with_replay(data, is_replay)),
    ))
}

// ============================================================================
// ApiError: Unified Error Type
// ============================================================================

/// Unified API error type with automatic IntoResponse
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// 400 Bad Request
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, msg)
    }

    /// 404 Not Found
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, msg)
    }

    /// 409 Conflict
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, msg)
    }

    /// 422 Unprocessable Entity
    pub fn unprocessable(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, msg)
    }

    /// 500 Internal Server Error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, msg)
    }

    /// Convert to handler error tuple
    pub fn into_err<T>(self) -> ApiResult<T> {
        Err((self.status, Json(ApiResponse::<()>::error(self.message))))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let body = Json(ApiResponse::<()>::error(self.message));
        (self.status, body).into_response()
    }
}

/// Enable ? operator for ApiError in handler functions
impl From<ApiError> for (StatusCode, Json<ApiResponse<()>>) {
    fn from(err: ApiError) -> Self {
        (err.status, Json(ApiResponse::<()>::error(err.message)))
    }
}

/// The engine-error status mapping
///
/// | Error kind                              | HTTP |
/// |-----------------------------------------|------|
/// | validation / bad input                  | 400  |
/// | AssetNotFound / WalletNotFound          | 404  |
/// | InsufficientBalance                     | 422  |
/// | TransactionConflict                     | 409  |
/// | anything else                           | 500  |
impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match &err {
            EngineError::Validation(_)
            | EngineError::InvalidTransfer(_)
            | EngineError::InvalidAmount(_)
            | EngineError::AmountExceedsLimit(_)
            | EngineError::WalletInactive
            | EngineError::AccountInactive(_)
            | EngineError::AssetMismatch => ApiError::bad_request(err.to_string()),

            EngineError::AssetNotFound(_)
            | EngineError::WalletNotFound { .. }
            | EngineError::AccountNotFound(_) => ApiError::not_found(err.to_string()),

            EngineError::InsufficientBalance => ApiError::unprocessable(err.to_string()),

            EngineError::TransactionConflict => ApiError::conflict(err.to_string()),

            EngineError::Store(e) => {
                tracing::error!(error = %e, "store error surfaced to gateway");
                ApiError::internal("internal store error")
            }
            EngineError::InternalStore(reason) => {
                tracing::error!(reason = %reason, "internal store error surfaced to gateway");
                ApiError::internal("internal store error")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::MoneyError;

    #[test]
    fn test_engine_error_status_mapping() {
        let cases: Vec<(EngineError, StatusCode)> = vec![
            (
                EngineError::Validation("bad".into()),
                StatusCode::BAD_REQUEST,
            ),
            (
                EngineError::InvalidAmount(MoneyError::NotPositive),
                StatusCode::BAD_REQUEST,
            ),
            (
                EngineError::InvalidTransfer("same account".into()),
                StatusCode::BAD_REQUEST,
            ),
            (
                EngineError::AssetNotFound("GOLD".into()),
                StatusCode::NOT_FOUND,
            ),
            (
                EngineError::WalletNotFound {
                    user_id: "alice".into(),
                    asset_code: "GOLD".into(),
                },
                StatusCode::NOT_FOUND,
            ),
            (
                EngineError::InsufficientBalance,
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (EngineError::TransactionConflict, StatusCode::CONFLICT),
            (
                EngineError::InternalStore("oops".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            let api: ApiError = err.into();
            assert_eq!(api.status, expected);
        }
    }

    #[test]
    fn test_envelope_shape() {
        let resp = ApiResponse::success_with_replay("x", true);
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["data"], "x");
        assert_eq!(json["isIdempotentReplay"], true);
        assert!(json.get("error").is_none());

        let err = ApiResponse::<()>::error("boom");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "boom");
        assert!(json.get("data").is_none());
        assert!(json.get("isIdempotentReplay").is_none());
    }
}
