// ==========================================
// 아동 상담 의뢰 관리 시스템 - 상담 보고서 유스케이스
// ==========================================
// 책임: 보고서 생성/제출/검토/승인 절차와 교차 집계 권한 검사
// 권한 경계:
// - 제출: 행위 상담사 == 보고서의 작성 상담사 (도메인 전이 호출 이전에 검사)
// - 검토/승인: 행위 보호자가 해당 아동의 보호자인지 GuardianAuthorizationPort 로 확인
// ==========================================

use crate::domain::counsel_report::{CounselReport, NewCounselReport};
use crate::domain::error::{DomainError, DomainResult, ErrorCode};
use crate::external::GuardianAuthorizationPort;
use crate::repository::{CounselReportRepository, RepositoryError};
use chrono::NaiveDate;
use std::sync::Arc;
use uuid::Uuid;

// ==========================================
// CreateCounselReportUseCase
// ==========================================

/// 보고서 생성 입력
#[derive(Debug, Clone)]
pub struct CreateCounselReportInput {
    pub counsel_request_id: String,
    pub child_id: String,
    pub counselor_id: Option<String>,
    pub institution_id: Option<String>,
    pub session_number: Option<i32>, // None 이면 다음 회기 번호 자동 부여
    pub report_date: NaiveDate,
    pub center_name: String,
    pub counselor_signature: Option<String>,
    pub counsel_reason: String,
    pub counsel_content: String,
    pub center_feedback: Option<String>,
    pub home_feedback: Option<String>,
    pub attachment_urls: Vec<String>,
}

pub struct CreateCounselReportUseCase {
    report_repo: Arc<CounselReportRepository>,
}

impl CreateCounselReportUseCase {
    /// 유스케이스 인스턴스 생성
    pub fn new(report_repo: Arc<CounselReportRepository>) -> Self {
        Self { report_repo }
    }

    /// 보고서 생성
    ///
    /// (의뢰, 회기) 중복을 집계 생성 전에 저장소 조회로 차단한다.
    /// 저장 시점의 UNIQUE 위반(동시 생성 경합)도 같은 코드로 변환한다.
    pub fn execute(&self, input: CreateCounselReportInput) -> DomainResult<CounselReport> {
        let session_number = match input.session_number {
            Some(n) => n,
            None => self
                .report_repo
                .get_next_session_number(&input.counsel_request_id)?,
        };

        if self
            .report_repo
            .find_by_request_and_session(&input.counsel_request_id, session_number)?
            .is_some()
        {
            return Err(Self::duplicate_session(&input.counsel_request_id, session_number));
        }

        let report = CounselReport::create(NewCounselReport {
            id: Uuid::new_v4().to_string(),
            counsel_request_id: input.counsel_request_id.clone(),
            child_id: input.child_id,
            counselor_id: input.counselor_id,
            institution_id: input.institution_id,
            session_number,
            report_date: input.report_date,
            center_name: input.center_name,
            counselor_signature: input.counselor_signature,
            counsel_reason: input.counsel_reason,
            counsel_content: input.counsel_content,
            center_feedback: input.center_feedback,
            home_feedback: input.home_feedback,
            attachment_urls: input.attachment_urls,
        })?;

        match self.report_repo.save(&report) {
            Ok(_) => Ok(report),
            Err(RepositoryError::UniqueConstraintViolation(_)) => {
                Err(Self::duplicate_session(&input.counsel_request_id, session_number))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn duplicate_session(counsel_request_id: &str, session_number: i32) -> DomainError {
        DomainError::new(
            ErrorCode::DuplicateSessionNumber,
            format!(
                "이미 등록된 회기 번호입니다: request_id={}, session={}",
                counsel_request_id, session_number
            ),
        )
    }
}

// ==========================================
// SubmitCounselReportUseCase
// ==========================================
pub struct SubmitCounselReportUseCase {
    report_repo: Arc<CounselReportRepository>,
}

impl SubmitCounselReportUseCase {
    /// 유스케이스 인스턴스 생성
    pub fn new(report_repo: Arc<CounselReportRepository>) -> Self {
        Self { report_repo }
    }

    /// 보고서 제출
    ///
    /// 소유권 검사(행위 상담사 == 작성 상담사)가 도메인 submit() 보다 먼저다.
    pub fn execute(
        &self,
        report_id: &str,
        acting_counselor_id: &str,
    ) -> DomainResult<CounselReport> {
        let mut report = load_report(&self.report_repo, report_id)?;

        match report.counselor_id() {
            Some(owner) if owner == acting_counselor_id => {}
            Some(_) => {
                return Err(DomainError::unauthorized(format!(
                    "해당 보고서의 작성 상담사가 아닙니다: counselor_id={}",
                    acting_counselor_id
                )));
            }
            None => {
                return Err(DomainError::unauthorized(format!(
                    "보고서에 작성 상담사가 지정되어 있지 않아 제출 권한을 확인할 수 없습니다: report_id={}",
                    report_id
                )));
            }
        }

        report.submit()?;
        self.report_repo.save(&report)?;
        Ok(report)
    }
}

// ==========================================
// ReviewCounselReportUseCase
// ==========================================
pub struct ReviewCounselReportUseCase {
    report_repo: Arc<CounselReportRepository>,
    guardian_auth: Arc<dyn GuardianAuthorizationPort>,
}

impl ReviewCounselReportUseCase {
    /// 유스케이스 인스턴스 생성
    pub fn new(
        report_repo: Arc<CounselReportRepository>,
        guardian_auth: Arc<dyn GuardianAuthorizationPort>,
    ) -> Self {
        Self {
            report_repo,
            guardian_auth,
        }
    }

    /// 보고서 검토 처리 (보호자)
    pub fn execute(
        &self,
        report_id: &str,
        acting_guardian_id: &str,
    ) -> DomainResult<CounselReport> {
        let mut report = load_report(&self.report_repo, report_id)?;
        ensure_guardian(&*self.guardian_auth, acting_guardian_id, report.child_id())?;

        report.mark_as_reviewed()?;
        self.report_repo.save(&report)?;
        Ok(report)
    }
}

// ==========================================
// ApproveCounselReportUseCase
// ==========================================
pub struct ApproveCounselReportUseCase {
    report_repo: Arc<CounselReportRepository>,
    guardian_auth: Arc<dyn GuardianAuthorizationPort>,
}

impl ApproveCounselReportUseCase {
    /// 유스케이스 인스턴스 생성
    pub fn new(
        report_repo: Arc<CounselReportRepository>,
        guardian_auth: Arc<dyn GuardianAuthorizationPort>,
    ) -> Self {
        Self {
            report_repo,
            guardian_auth,
        }
    }

    /// 보고서 승인 (보호자 피드백 필수)
    pub fn execute(
        &self,
        report_id: &str,
        acting_guardian_id: &str,
        feedback: &str,
    ) -> DomainResult<CounselReport> {
        let mut report = load_report(&self.report_repo, report_id)?;
        ensure_guardian(&*self.guardian_auth, acting_guardian_id, report.child_id())?;

        report.approve_with_feedback(feedback)?;
        self.report_repo.save(&report)?;
        tracing::info!(report_id = %report_id, "보호자 승인 완료");
        Ok(report)
    }
}

// ==========================================
// 공용 헬퍼
// ==========================================

fn load_report(
    report_repo: &CounselReportRepository,
    report_id: &str,
) -> DomainResult<CounselReport> {
    report_repo
        .find_by_id(report_id)?
        .ok_or_else(|| DomainError::report_not_found(report_id))
}

fn ensure_guardian(
    guardian_auth: &dyn GuardianAuthorizationPort,
    guardian_id: &str,
    child_id: &str,
) -> DomainResult<()> {
    if !guardian_auth.is_guardian_of(guardian_id, child_id) {
        return Err(DomainError::unauthorized(format!(
            "해당 아동의 보호자가 아닙니다: guardian_id={}",
            guardian_id
        )));
    }
    Ok(())
}
