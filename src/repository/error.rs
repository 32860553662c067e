// ==========================================
// 아동 상담 의뢰 관리 시스템 - 저장소 계층 오류 타입
// ==========================================
// 도구: thiserror 파생 매크로
// ==========================================

use crate::domain::error::{DomainError, ErrorCode};
use thiserror::Error;

/// 저장소 계층 오류 타입
#[derive(Error, Debug)]
pub enum RepositoryError {
    // ===== 동시성 제어 오류 =====
    #[error("낙관적 잠금 충돌: {entity} id={id}, expected_version={expected}, actual_version={actual}")]
    OptimisticLockFailure {
        entity: String,
        id: String,
        expected: i64,
        actual: i64,
    },

    // ===== 데이터베이스 오류 =====
    #[error("레코드 없음: {entity} id={id}")]
    NotFound { entity: String, id: String },

    #[error("데이터베이스 잠금 획득 실패: {0}")]
    LockError(String),

    #[error("데이터베이스 질의 실패: {0}")]
    DatabaseQueryError(String),

    #[error("유일성 제약 위반: {0}")]
    UniqueConstraintViolation(String),

    #[error("외래키 제약 위반: {0}")]
    ForeignKeyViolation(String),

    // ===== 저장 데이터 복원 오류 =====
    #[error("필드 값 오류 (field={field}): {message}")]
    FieldValueError { field: String, message: String },

    // ===== 통용 오류 =====
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// rusqlite 오류 변환
impl From<rusqlite::Error> for RepositoryError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(_, Some(msg)) => {
                if msg.contains("UNIQUE") {
                    RepositoryError::UniqueConstraintViolation(msg)
                } else if msg.contains("FOREIGN KEY") {
                    RepositoryError::ForeignKeyViolation(msg)
                } else {
                    RepositoryError::DatabaseQueryError(msg)
                }
            }
            _ => RepositoryError::DatabaseQueryError(err.to_string()),
        }
    }
}

// 유스케이스 경계에서의 도메인 오류 변환
//
// 낙관적 잠금 충돌은 CONCURRENT_MODIFICATION 코드로, 나머지는
// STORAGE_FAILURE 로 노출한다. 회기 유일성 위반은 유스케이스가
// 사전 검사로 DUPLICATE_SESSION_NUMBER 를 먼저 돌려주므로 여기서는
// 저장 계층 최후 방어선의 메시지만 전달한다.
impl From<RepositoryError> for DomainError {
    fn from(err: RepositoryError) -> Self {
        match &err {
            RepositoryError::OptimisticLockFailure { .. } => DomainError::new(
                ErrorCode::ConcurrentModification,
                format!("동시 수정 충돌이 발생했습니다: {}", err),
            ),
            _ => DomainError::storage(err.to_string()),
        }
    }
}

/// Result 타입 별칭
pub type RepositoryResult<T> = Result<T, RepositoryError>;
