// ==========================================
// 아동 상담 의뢰 관리 시스템 - 상담 보고서 집계 루트
// ==========================================
// 책임: 회기별 보고서 생명주기. DRAFT → SUBMITTED → REVIEWED → APPROVED
// 제약: 전이는 엄격한 정방향, 건너뜀/역행/재진입 불가
// 제약: 회기 번호의 (의뢰, 회기) 유일성은 생성 유스케이스가 저장소 조회로 보장
// ==========================================

use crate::domain::error::{DomainError, DomainResult, ErrorCode};
use crate::domain::types::CounselReportStatus;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// NewCounselReport - 생성 입력
// ==========================================
#[derive(Debug, Clone)]
pub struct NewCounselReport {
    pub id: String,
    pub counsel_request_id: String,
    pub child_id: String,
    pub counselor_id: Option<String>,   // 구세대 경로에서만 채워짐
    pub institution_id: Option<String>, // 구세대 경로에서만 채워짐
    pub session_number: i32,            // 회기 번호 (1 이상)
    pub report_date: NaiveDate,         // 상담 실시일
    pub center_name: String,
    pub counselor_signature: Option<String>,
    pub counsel_reason: String,  // 상담 사유
    pub counsel_content: String, // 상담 내용
    pub center_feedback: Option<String>, // 기관 전달 사항
    pub home_feedback: Option<String>,   // 가정 전달 사항
    pub attachment_urls: Vec<String>,    // 첨부 파일 참조 (순서 유지)
}

// ==========================================
// CounselReport - 상담 보고서
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct CounselReport {
    // ===== 식별/참조 =====
    id: String,
    counsel_request_id: String,
    child_id: String,
    counselor_id: Option<String>,
    institution_id: Option<String>,

    // ===== 회기 정보 =====
    session_number: i32,
    report_date: NaiveDate,

    // ===== 본문 =====
    center_name: String,
    counselor_signature: Option<String>,
    counsel_reason: String,
    counsel_content: String,
    center_feedback: Option<String>,
    home_feedback: Option<String>,
    attachment_urls: Vec<String>,

    // ===== 상태 =====
    status: CounselReportStatus,
    submitted_at: Option<DateTime<Utc>>,
    reviewed_at: Option<DateTime<Utc>>,
    guardian_feedback: Option<String>, // 승인 시에만 기록

    // ===== 동시성 제어 =====
    version: i64,

    // ===== 감사 필드 =====
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

// ==========================================
// CounselReportSnapshot - 영속화/복원용 평면 구조
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CounselReportSnapshot {
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
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CounselReport {
    // ==========================================
    // 생성/복원
    // ==========================================

    /// 보고서 생성, DRAFT 로 시작
    ///
    /// 상담 사유/내용이 공백이면 MISSING_COUNSEL_CONTENT 로 실패한다.
    pub fn create(props: NewCounselReport) -> DomainResult<Self> {
        if props.session_number < 1 {
            return Err(DomainError::invalid_form(format!(
                "회기 번호는 1 이상이어야 합니다: session={}",
                props.session_number
            )));
        }
        if props.counsel_reason.trim().is_empty() {
            return Err(DomainError::new(
                ErrorCode::MissingCounselContent,
                "상담 사유는 비어 있을 수 없습니다",
            ));
        }
        if props.counsel_content.trim().is_empty() {
            return Err(DomainError::new(
                ErrorCode::MissingCounselContent,
                "상담 내용은 비어 있을 수 없습니다",
            ));
        }

        let now = Utc::now();
        Ok(Self {
            id: props.id,
            counsel_request_id: props.counsel_request_id,
            child_id: props.child_id,
            counselor_id: props.counselor_id,
            institution_id: props.institution_id,
            session_number: props.session_number,
            report_date: props.report_date,
            center_name: props.center_name,
            counselor_signature: props.counselor_signature,
            counsel_reason: props.counsel_reason,
            counsel_content: props.counsel_content,
            center_feedback: props.center_feedback,
            home_feedback: props.home_feedback,
            attachment_urls: props.attachment_urls,
            status: CounselReportStatus::Draft,
            submitted_at: None,
            reviewed_at: None,
            guardian_feedback: None,
            version: 0,
            created_at: now,
            updated_at: now,
        })
    }

    /// 저장소 복원 (신뢰 경로, 재검증 없음)
    pub fn restore(snapshot: CounselReportSnapshot) -> Self {
        Self {
            id: snapshot.id,
            counsel_request_id: snapshot.counsel_request_id,
            child_id: snapshot.child_id,
            counselor_id: snapshot.counselor_id,
            institution_id: snapshot.institution_id,
            session_number: snapshot.session_number,
            report_date: snapshot.report_date,
            center_name: snapshot.center_name,
            counselor_signature: snapshot.counselor_signature,
            counsel_reason: snapshot.counsel_reason,
            counsel_content: snapshot.counsel_content,
            center_feedback: snapshot.center_feedback,
            home_feedback: snapshot.home_feedback,
            attachment_urls: snapshot.attachment_urls,
            status: snapshot.status,
            submitted_at: snapshot.submitted_at,
            reviewed_at: snapshot.reviewed_at,
            guardian_feedback: snapshot.guardian_feedback,
            version: snapshot.version,
            created_at: snapshot.created_at,
            updated_at: snapshot.updated_at,
        }
    }

    /// 영속화용 스냅샷
    pub fn snapshot(&self) -> CounselReportSnapshot {
        CounselReportSnapshot {
            id: self.id.clone(),
            counsel_request_id: self.counsel_request_id.clone(),
            child_id: self.child_id.clone(),
            counselor_id: self.counselor_id.clone(),
            institution_id: self.institution_id.clone(),
            session_number: self.session_number,
            report_date: self.report_date,
            center_name: self.center_name.clone(),
            counselor_signature: self.counselor_signature.clone(),
            counsel_reason: self.counsel_reason.clone(),
            counsel_content: self.counsel_content.clone(),
            center_feedback: self.center_feedback.clone(),
            home_feedback: self.home_feedback.clone(),
            attachment_urls: self.attachment_urls.clone(),
            status: self.status,
            submitted_at: self.submitted_at,
            reviewed_at: self.reviewed_at,
            guardian_feedback: self.guardian_feedback.clone(),
            version: self.version,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    // ==========================================
    // 상태 전이
    // ==========================================

    /// 제출: DRAFT → SUBMITTED, submitted_at 기록
    pub fn submit(&mut self) -> DomainResult<()> {
        if self.status != CounselReportStatus::Draft {
            return Err(DomainError::invalid_transition(format!(
                "보고서 제출은 DRAFT 상태에서만 가능합니다 (현재: {})",
                self.status
            )));
        }
        self.status = CounselReportStatus::Submitted;
        self.submitted_at = Some(Utc::now());
        self.touch();
        Ok(())
    }

    /// 검토 완료: SUBMITTED → REVIEWED, reviewed_at 기록
    pub fn mark_as_reviewed(&mut self) -> DomainResult<()> {
        if self.status != CounselReportStatus::Submitted {
            return Err(DomainError::invalid_transition(format!(
                "보고서 검토 처리는 SUBMITTED 상태에서만 가능합니다 (현재: {})",
                self.status
            )));
        }
        self.status = CounselReportStatus::Reviewed;
        self.reviewed_at = Some(Utc::now());
        self.touch();
        Ok(())
    }

    /// 보호자 승인: REVIEWED → APPROVED, 피드백 기록
    ///
    /// 상태 검사가 먼저다. 상태가 올바를 때에만 피드백 공백 검사를 수행하고,
    /// 피드백 문자열은 입력 그대로 저장한다 (trim 은 공백 판정에만 사용).
    pub fn approve_with_feedback(&mut self, feedback: &str) -> DomainResult<()> {
        if self.status != CounselReportStatus::Reviewed {
            return Err(DomainError::invalid_transition(format!(
                "보고서 승인은 REVIEWED 상태에서만 가능합니다 (현재: {})",
                self.status
            )));
        }
        if feedback.trim().is_empty() {
            return Err(DomainError::new(
                ErrorCode::InvalidFeedback,
                "보호자 피드백은 공백일 수 없습니다",
            ));
        }
        self.status = CounselReportStatus::Approved;
        self.guardian_feedback = Some(feedback.to_string());
        self.touch();
        Ok(())
    }

    /// 초안 본문 수정: DRAFT 에서만 허용
    pub fn update_draft(
        &mut self,
        counsel_reason: String,
        counsel_content: String,
        center_feedback: Option<String>,
        home_feedback: Option<String>,
        attachment_urls: Vec<String>,
    ) -> DomainResult<()> {
        if self.status != CounselReportStatus::Draft {
            return Err(DomainError::invalid_transition(format!(
                "보고서 본문 수정은 DRAFT 상태에서만 가능합니다 (현재: {})",
                self.status
            )));
        }
        if counsel_reason.trim().is_empty() {
            return Err(DomainError::new(
                ErrorCode::MissingCounselContent,
                "상담 사유는 비어 있을 수 없습니다",
            ));
        }
        if counsel_content.trim().is_empty() {
            return Err(DomainError::new(
                ErrorCode::MissingCounselContent,
                "상담 내용은 비어 있을 수 없습니다",
            ));
        }
        self.counsel_reason = counsel_reason;
        self.counsel_content = counsel_content;
        self.center_feedback = center_feedback;
        self.home_feedback = home_feedback;
        self.attachment_urls = attachment_urls;
        self.touch();
        Ok(())
    }

    // ==========================================
    // 조회 접근자
    // ==========================================

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn counsel_request_id(&self) -> &str {
        &self.counsel_request_id
    }

    pub fn child_id(&self) -> &str {
        &self.child_id
    }

    pub fn counselor_id(&self) -> Option<&str> {
        self.counselor_id.as_deref()
    }

    pub fn institution_id(&self) -> Option<&str> {
        self.institution_id.as_deref()
    }

    pub fn session_number(&self) -> i32 {
        self.session_number
    }

    pub fn report_date(&self) -> NaiveDate {
        self.report_date
    }

    pub fn center_name(&self) -> &str {
        &self.center_name
    }

    pub fn counselor_signature(&self) -> Option<&str> {
        self.counselor_signature.as_deref()
    }

    pub fn counsel_reason(&self) -> &str {
        &self.counsel_reason
    }

    pub fn counsel_content(&self) -> &str {
        &self.counsel_content
    }

    pub fn center_feedback(&self) -> Option<&str> {
        self.center_feedback.as_deref()
    }

    pub fn home_feedback(&self) -> Option<&str> {
        self.home_feedback.as_deref()
    }

    pub fn attachment_urls(&self) -> &[String] {
        &self.attachment_urls
    }

    pub fn status(&self) -> CounselReportStatus {
        self.status
    }

    pub fn submitted_at(&self) -> Option<DateTime<Utc>> {
        self.submitted_at
    }

    pub fn reviewed_at(&self) -> Option<DateTime<Utc>> {
        self.reviewed_at
    }

    pub fn guardian_feedback(&self) -> Option<&str> {
        self.guardian_feedback.as_deref()
    }

    pub fn version(&self) -> i64 {
        self.version
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// 성공한 변경마다 updated_at 갱신
    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
