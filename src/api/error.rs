// ==========================================
// 아동 상담 의뢰 관리 시스템 - API 계층 오류 타입
// ==========================================
// 책임: 도메인 오류 코드를 HTTP 동등 상태로 변환
// 매핑: 부재 → 404, 전이/검증 → 400, 권한 → 403,
//       회기 중복/동시 수정 → 409, 저장소 장애 → 500
// ==========================================

use crate::domain::error::{DomainError, ErrorCode};
use serde::Serialize;
use thiserror::Error;

/// API 계층 오류
#[derive(Error, Debug, Clone, Serialize)]
#[error("[{status}] {code}: {message}")]
pub struct ApiError {
    /// HTTP 동등 상태 코드
    pub status: u16,
    /// 기계 판독용 오류 코드
    pub code: String,
    /// 사람이 읽는 메시지
    pub message: String,
}

/// Result 타입 별칭
pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    /// 경계 입력 오류 (잘못된 상태 문자열 등)
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: 400,
            code: "BAD_REQUEST".to_string(),
            message: message.into(),
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        let status = match err.code {
            ErrorCode::RequestNotFound
            | ErrorCode::ReportNotFound
            | ErrorCode::RecommendationNotFound => 404,
            ErrorCode::InvalidStatusTransition
            | ErrorCode::InvalidFormData
            | ErrorCode::MissingCounselContent
            | ErrorCode::InvalidFeedback => 400,
            ErrorCode::DuplicateSessionNumber | ErrorCode::ConcurrentModification => 409,
            ErrorCode::Unauthorized => 403,
            ErrorCode::StorageFailure => 500,
        };
        Self {
            status,
            code: err.code.as_str().to_string(),
            message: err.message,
        }
    }
}
