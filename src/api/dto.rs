// ==========================================
// 아동 상담 의뢰 관리 시스템 - API 조회 DTO
// ==========================================
// 책임: 집계 루트를 전송용 뷰로 변환. 직렬화는 camelCase
// ==========================================

use crate::domain::counsel_report::CounselReport;
use crate::domain::counsel_request::CounselRequest;
use crate::domain::form_data::CounselRequestForm;
use crate::domain::ledger::{ConsentRecord, PsychStatusLog};
use crate::domain::recommendation::CounselRequestRecommendation;
use crate::domain::types::{
    CareType, CounselReportStatus, CounselRequestStatus, IntegratedReportStatus,
};
use crate::repository::Paginated;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

// ==========================================
// CounselRequestView - 의뢰 조회 뷰
// ==========================================
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CounselRequestView {
    pub id: String,
    pub child_id: String,
    pub guardian_id: Option<String>,
    pub status: CounselRequestStatus,
    pub center_name: String,
    pub care_type: CareType,
    pub request_date: NaiveDate,
    pub matched_institution_id: Option<String>,
    pub matched_counselor_id: Option<String>,
    pub integrated_report_s3_key: Option<String>,
    pub integrated_report_status: Option<IntegratedReportStatus>,
    pub rejected_reason: Option<String>,
    pub form_data: CounselRequestForm,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&CounselRequest> for CounselRequestView {
    fn from(request: &CounselRequest) -> Self {
        Self {
            id: request.id().to_string(),
            child_id: request.child_id().to_string(),
            guardian_id: request.guardian_id().map(str::to_string),
            status: request.status(),
            center_name: request.center_name().to_string(),
            care_type: request.care_type(),
            request_date: request.request_date(),
            matched_institution_id: request.matched_institution_id().map(str::to_string),
            matched_counselor_id: request.matched_counselor_id().map(str::to_string),
            integrated_report_s3_key: request.integrated_report_s3_key().map(str::to_string),
            integrated_report_status: request.integrated_report_status(),
            rejected_reason: request.rejected_reason().map(str::to_string),
            form_data: request.form().clone(),
            created_at: request.created_at(),
            updated_at: request.updated_at(),
        }
    }
}

// ==========================================
// CounselReportView - 보고서 조회 뷰
// ==========================================
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CounselReportView {
    pub id: String,
    pub counsel_request_id: String,
    pub child_id: String,
    pub counselor_id: Option<String>,
    pub institution_id: Option<String>,
    pub session_number: i32,
    pub report_date: NaiveDate,
    pub center_name: String,
    pub counselor_signature: Option<String>,
    pub counsel_reason: String,
    pub counsel_content: String,
    pub center_feedback: Option<String>,
    pub home_feedback: Option<String>,
    pub attachment_urls: Vec<String>,
    pub status: CounselReportStatus,
    pub submitted_at: Option<DateTime<Utc>>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub guardian_feedback: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&CounselReport> for CounselReportView {
    fn from(report: &CounselReport) -> Self {
        Self {
            id: report.id().to_string(),
            counsel_request_id: report.counsel_request_id().to_string(),
            child_id: report.child_id().to_string(),
            counselor_id: report.counselor_id().map(str::to_string),
            institution_id: report.institution_id().map(str::to_string),
            session_number: report.session_number(),
            report_date: report.report_date(),
            center_name: report.center_name().to_string(),
            counselor_signature: report.counselor_signature().map(str::to_string),
            counsel_reason: report.counsel_reason().to_string(),
            counsel_content: report.counsel_content().to_string(),
            center_feedback: report.center_feedback().map(str::to_string),
            home_feedback: report.home_feedback().map(str::to_string),
            attachment_urls: report.attachment_urls().to_vec(),
            status: report.status(),
            submitted_at: report.submitted_at(),
            reviewed_at: report.reviewed_at(),
            guardian_feedback: report.guardian_feedback().map(str::to_string),
            created_at: report.created_at(),
            updated_at: report.updated_at(),
        }
    }
}

// ==========================================
// RecommendationView - 추천 항목 조회 뷰
// ==========================================
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationView {
    pub id: String,
    pub counsel_request_id: String,
    pub institution_id: String,
    pub score: f64,
    pub reason: String,
    pub rank: i32,
    pub selected: bool,
    pub created_at: DateTime<Utc>,
}

impl From<&CounselRequestRecommendation> for RecommendationView {
    fn from(rec: &CounselRequestRecommendation) -> Self {
        Self {
            id: rec.id.clone(),
            counsel_request_id: rec.counsel_request_id.clone(),
            institution_id: rec.institution_id.clone(),
            score: rec.score,
            reason: rec.reason.clone(),
            rank: rec.rank,
            selected: rec.selected,
            created_at: rec.created_at,
        }
    }
}

// ==========================================
// 대장 뷰 (동의/심리 상태는 도메인 구조를 그대로 직렬화)
// ==========================================
pub type ConsentRecordView = ConsentRecord;
pub type PsychStatusLogView = PsychStatusLog;

/// 페이지 결과의 항목 변환
pub fn map_page<T, V: for<'a> From<&'a T>>(page: Paginated<T>) -> Paginated<V> {
    Paginated {
        items: page.items.iter().map(V::from).collect(),
        total: page.total,
        page: page.page,
        limit: page.limit,
    }
}
