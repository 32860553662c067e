// ==========================================
// 아동 상담 의뢰 관리 시스템 - 도메인 오류 타입
// ==========================================
// 원칙: 예상 가능한 업무 규칙 위반은 panic 이 아니라 DomainResult 로 반환
// 도구: thiserror 파생 매크로
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// ==========================================
// ErrorCode - 기계 판독용 오류 코드
// ==========================================
// 호출자는 메시지 파싱 없이 코드로 분기한다.
// 전송 계층은 코드를 HTTP 상태로 변환한다 (api::error 참고).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // ===== 부재 (not found) =====
    RequestNotFound,        // 상담 의뢰 없음
    ReportNotFound,         // 상담 보고서 없음
    RecommendationNotFound, // 추천 항목 없음

    // ===== 상태 전이 =====
    InvalidStatusTransition, // 현재 상태에서 허용되지 않는 전이

    // ===== 검증 =====
    InvalidFormData,       // 의뢰서 필드 검증 실패 (필드별 메시지)
    MissingCounselContent, // 상담 사유/내용 공백
    InvalidFeedback,       // 보호자 피드백 공백
    DuplicateSessionNumber, // 회기 번호 중복

    // ===== 권한 =====
    Unauthorized, // 행위자가 리소스 소유자가 아님

    // ===== 동시성 =====
    ConcurrentModification, // 낙관적 잠금 충돌

    // ===== 저장소/기타 =====
    StorageFailure, // 저장소 계층 오류 전파
}

impl ErrorCode {
    /// 코드 문자열 (로그/전송용)
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::RequestNotFound => "REQUEST_NOT_FOUND",
            ErrorCode::ReportNotFound => "REPORT_NOT_FOUND",
            ErrorCode::RecommendationNotFound => "RECOMMENDATION_NOT_FOUND",
            ErrorCode::InvalidStatusTransition => "INVALID_STATUS_TRANSITION",
            ErrorCode::InvalidFormData => "INVALID_FORM_DATA",
            ErrorCode::MissingCounselContent => "MISSING_COUNSEL_CONTENT",
            ErrorCode::InvalidFeedback => "INVALID_FEEDBACK",
            ErrorCode::DuplicateSessionNumber => "DUPLICATE_SESSION_NUMBER",
            ErrorCode::Unauthorized => "UNAUTHORIZED",
            ErrorCode::ConcurrentModification => "CONCURRENT_MODIFICATION",
            ErrorCode::StorageFailure => "STORAGE_FAILURE",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// DomainError - 코드 + 사람이 읽는 메시지
// ==========================================
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("[{code}] {message}")]
pub struct DomainError {
    /// 기계 판독용 코드
    pub code: ErrorCode,
    /// 사람이 읽는 메시지 (부재 오류는 조회 ID 포함)
    pub message: String,
}

/// 도메인 연산 Result 별칭
pub type DomainResult<T> = Result<T, DomainError>;

impl DomainError {
    /// 코드와 메시지로 오류 생성
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// 상담 의뢰 부재
    pub fn request_not_found(id: &str) -> Self {
        Self::new(
            ErrorCode::RequestNotFound,
            format!("상담 의뢰를 찾을 수 없습니다: id={}", id),
        )
    }

    /// 상담 보고서 부재
    pub fn report_not_found(id: &str) -> Self {
        Self::new(
            ErrorCode::ReportNotFound,
            format!("상담 보고서를 찾을 수 없습니다: id={}", id),
        )
    }

    /// 허용되지 않는 상태 전이
    pub fn invalid_transition(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidStatusTransition, message)
    }

    /// 의뢰서 필드 검증 실패
    pub fn invalid_form(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidFormData, message)
    }

    /// 권한 없음
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthorized, message)
    }

    /// 저장소 오류 전파용
    pub fn storage(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::StorageFailure, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_as_str() {
        assert_eq!(
            ErrorCode::InvalidStatusTransition.as_str(),
            "INVALID_STATUS_TRANSITION"
        );
        assert_eq!(
            ErrorCode::DuplicateSessionNumber.as_str(),
            "DUPLICATE_SESSION_NUMBER"
        );
    }

    #[test]
    fn test_error_display_includes_code_and_message() {
        let err = DomainError::report_not_found("r-001");
        let text = err.to_string();
        assert!(text.contains("REPORT_NOT_FOUND"));
        assert!(text.contains("r-001"));
    }

    #[test]
    fn test_error_code_serde_screaming_case() {
        let json = serde_json::to_string(&ErrorCode::ConcurrentModification).unwrap();
        assert_eq!(json, "\"CONCURRENT_MODIFICATION\"");
    }
}
