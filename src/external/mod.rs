// ==========================================
// 아동 상담 의뢰 관리 시스템 - 외부 협력자 포트
// ==========================================
// 책임: AI 추천/통합 보고서 생성/검사 결과 조회/보호자 관계 확인의
//       호출 계약 정의. 구현(HTTP 클라이언트 등)은 이 크레이트 밖이다
// 원칙: 외부 호출 실패는 호출 유스케이스가 잡아서 로그로 남기고,
//       본 연산(의뢰/보고서 생성)의 성공 여부에는 영향을 주지 않는다
// ==========================================

pub mod assessment;
pub mod guardian_auth;
pub mod recommendation_client;
pub mod report_generator;

pub use assessment::{AssessmentResultClient, LatestAssessment};
pub use guardian_auth::GuardianAuthorizationPort;
pub use recommendation_client::{
    RecommendationClient, RecommendationContext, RecommendedInstitution,
};
pub use report_generator::{GeneratedReport, IntegratedReportGenerator, IntegratedReportInput};
