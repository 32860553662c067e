// ==========================================
// 아동 상담 의뢰 관리 시스템 - API 계층
// ==========================================
// 책임: 전송 셸(HTTP 컨트롤러)이 그대로 노출할 업무 인터페이스
// ==========================================

pub mod counsel_api;
pub mod dto;
pub mod error;

pub use counsel_api::CounselCaseApi;
pub use dto::{
    ConsentRecordView, CounselReportView, CounselRequestView, PsychStatusLogView,
    RecommendationView,
};
pub use error::{ApiError, ApiResult};
