// ==========================================
// 아동 상담 의뢰 관리 시스템 - 핵심 라이브러리
// ==========================================
// 시스템 정위: 상담 의뢰/보고서 워크플로 백엔드 (전송 셸은 외부)
// 기술 스택: Rust + SQLite
// ==========================================

// ==========================================
// 모듈 선언
// ==========================================

// 도메인 계층 - 집계 루트와 타입
pub mod domain;

// 데이터 저장소 계층 - 데이터 접근
pub mod repository;

// 유스케이스 계층 - 업무 절차
pub mod use_cases;

// 외부 협력자 포트
pub mod external;

// 설정 계층
pub mod config;

// 데이터베이스 기반 시설 (연결 초기화/PRAGMA/스키마 통일)
pub mod db;

// 로그 시스템
pub mod logging;

// API 계층 - 업무 인터페이스
pub mod api;

// ==========================================
// 핵심 타입 재노출
// ==========================================

// 도메인 타입
pub use domain::types::{
    CareType, ConsentState, CounselReportStatus, CounselRequestStatus, IntegratedReportStatus,
    PsychRiskLevel,
};

// 도메인 집계/엔티티
pub use domain::{
    ConsentRecord, CounselReport, CounselRequest, CounselRequestForm,
    CounselRequestRecommendation, DomainError, DomainResult, ErrorCode, PsychStatusLog,
};

// 저장소
pub use repository::{
    ConsentLedgerRepository, CounselReportRepository, CounselRequestRepository, Paginated,
    PsychStatusLogRepository, RecommendationRepository, RepositoryError, RepositoryResult,
};

// 유스케이스
pub use use_cases::{
    ApproveCounselReportUseCase, CreateCounselReportUseCase, CreateCounselRequestUseCase,
    ManageCounselRequestUseCase, RequestIntegratedReportUseCase, ReviewCounselReportUseCase,
    SelectRecommendedInstitutionUseCase, SubmitCounselReportUseCase,
};

// API
pub use api::{ApiError, ApiResult, CounselCaseApi};

// ==========================================
// 상수 정의
// ==========================================

// 시스템 버전
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 시스템 이름
pub const APP_NAME: &str = "아동 상담 의뢰 관리 시스템";
