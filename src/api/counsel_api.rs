// ==========================================
// 아동 상담 의뢰 관리 시스템 - 업무 API 파사드
// ==========================================
// 책임: 조립 루트. 저장소/유스케이스를 구성하고 전송 계층(HTTP 셸)이
//       1:1 로 노출할 업무 연산을 제공한다
// 원칙: 얇은 통과 계층. 업무 규칙은 도메인/유스케이스에만 있다
// ==========================================

use crate::api::dto::{
    map_page, ConsentRecordView, CounselReportView, CounselRequestView, PsychStatusLogView,
    RecommendationView,
};
use crate::api::error::{ApiError, ApiResult};
use crate::domain::ledger::{ConsentRecord, PsychStatusLog};
use crate::domain::types::{CounselRequestStatus, PsychRiskLevel};
use crate::external::{
    AssessmentResultClient, GuardianAuthorizationPort, IntegratedReportGenerator,
    RecommendationClient,
};
use crate::repository::{
    ConsentLedgerRepository, CounselReportRepository, CounselRequestRepository, Paginated,
    PsychStatusLogRepository, RecommendationRepository,
};
use crate::use_cases::{
    ApproveCounselReportUseCase, CreateCounselReportInput, CreateCounselReportUseCase,
    CreateCounselRequestInput, CreateCounselRequestUseCase, ManageCounselRequestUseCase,
    RequestIntegratedReportUseCase, ReviewCounselReportUseCase,
    SelectRecommendedInstitutionUseCase, SubmitCounselReportUseCase,
};
use rusqlite::Connection;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

// ==========================================
// CounselCaseApi - 업무 API 파사드
// ==========================================
pub struct CounselCaseApi {
    request_repo: Arc<CounselRequestRepository>,
    report_repo: Arc<CounselReportRepository>,
    recommendation_repo: Arc<RecommendationRepository>,
    consent_repo: Arc<ConsentLedgerRepository>,
    psych_repo: Arc<PsychStatusLogRepository>,

    create_request: CreateCounselRequestUseCase,
    select_institution: SelectRecommendedInstitutionUseCase,
    manage_request: ManageCounselRequestUseCase,
    integrated_report: RequestIntegratedReportUseCase,
    create_report: CreateCounselReportUseCase,
    submit_report: SubmitCounselReportUseCase,
    review_report: ReviewCounselReportUseCase,
    approve_report: ApproveCounselReportUseCase,
}

impl CounselCaseApi {
    /// 조립 루트: 연결과 외부 포트로 전체 구성
    pub fn new(
        conn: Arc<Mutex<Connection>>,
        recommendation_client: Arc<dyn RecommendationClient>,
        assessment_client: Arc<dyn AssessmentResultClient>,
        report_generator: Arc<dyn IntegratedReportGenerator>,
        guardian_auth: Arc<dyn GuardianAuthorizationPort>,
    ) -> Self {
        let request_repo = Arc::new(CounselRequestRepository::new(conn.clone()));
        let report_repo = Arc::new(CounselReportRepository::new(conn.clone()));
        let recommendation_repo = Arc::new(RecommendationRepository::new(conn.clone()));
        let consent_repo = Arc::new(ConsentLedgerRepository::new(conn.clone()));
        let psych_repo = Arc::new(PsychStatusLogRepository::new(conn));

        Self {
            create_request: CreateCounselRequestUseCase::new(
                request_repo.clone(),
                recommendation_repo.clone(),
                recommendation_client,
                assessment_client,
            ),
            select_institution: SelectRecommendedInstitutionUseCase::new(
                request_repo.clone(),
                recommendation_repo.clone(),
            ),
            manage_request: ManageCounselRequestUseCase::new(request_repo.clone()),
            integrated_report: RequestIntegratedReportUseCase::new(
                request_repo.clone(),
                report_generator,
            ),
            create_report: CreateCounselReportUseCase::new(report_repo.clone()),
            submit_report: SubmitCounselReportUseCase::new(report_repo.clone()),
            review_report: ReviewCounselReportUseCase::new(
                report_repo.clone(),
                guardian_auth.clone(),
            ),
            approve_report: ApproveCounselReportUseCase::new(report_repo.clone(), guardian_auth),
            request_repo,
            report_repo,
            recommendation_repo,
            consent_repo,
            psych_repo,
        }
    }

    // ==========================================
    // 의뢰 (CounselRequest)
    // ==========================================

    /// 의뢰 접수 (추천 보강 포함)
    pub async fn create_counsel_request(
        &self,
        input: CreateCounselRequestInput,
    ) -> ApiResult<CounselRequestView> {
        let request = self.create_request.execute(input).await?;
        Ok(CounselRequestView::from(&request))
    }

    /// 의뢰 단건 조회
    pub fn get_counsel_request(&self, id: &str) -> ApiResult<CounselRequestView> {
        let request = self
            .request_repo
            .find_by_id(id)
            .map_err(crate::domain::DomainError::from)?
            .ok_or_else(|| crate::domain::DomainError::request_not_found(id))?;
        Ok(CounselRequestView::from(&request))
    }

    /// 의뢰 목록 페이지 조회 (상태 필터 선택)
    pub fn list_counsel_requests(
        &self,
        page: i64,
        limit: i64,
        status: Option<&str>,
    ) -> ApiResult<Paginated<CounselRequestView>> {
        let status = status
            .map(|s| {
                CounselRequestStatus::from_str(s)
                    .ok_or_else(|| ApiError::bad_request(format!("알 수 없는 의뢰 상태: {}", s)))
            })
            .transpose()?;
        let result = self
            .request_repo
            .find_all(page, limit, status)
            .map_err(crate::domain::DomainError::from)?;
        Ok(map_page(result))
    }

    /// 의뢰서 수정
    pub fn update_counsel_request_form(
        &self,
        id: &str,
        form: crate::domain::CounselRequestForm,
    ) -> ApiResult<CounselRequestView> {
        let request = self.manage_request.update_form_data(id, form)?;
        Ok(CounselRequestView::from(&request))
    }

    /// 상담 시작
    pub fn start_counseling(&self, id: &str) -> ApiResult<CounselRequestView> {
        Ok(CounselRequestView::from(
            &self.manage_request.start_counseling(id)?,
        ))
    }

    /// 상담 완료
    pub fn complete_counseling(&self, id: &str) -> ApiResult<CounselRequestView> {
        Ok(CounselRequestView::from(
            &self.manage_request.complete_counseling(id)?,
        ))
    }

    /// 의뢰 반려
    pub fn reject_counsel_request(
        &self,
        id: &str,
        reason: Option<&str>,
    ) -> ApiResult<CounselRequestView> {
        Ok(CounselRequestView::from(
            &self.manage_request.reject(id, reason)?,
        ))
    }

    /// 관리자 강제 상태 전환
    pub fn admin_force_status(
        &self,
        id: &str,
        new_status: &str,
        reason: &str,
        actor: &str,
    ) -> ApiResult<CounselRequestView> {
        let new_status = CounselRequestStatus::from_str(new_status)
            .ok_or_else(|| ApiError::bad_request(format!("알 수 없는 의뢰 상태: {}", new_status)))?;
        Ok(CounselRequestView::from(&self.manage_request.admin_force_status(
            id, new_status, reason, actor,
        )?))
    }

    /// 직접 매칭 (구 버전 경로)
    pub fn match_counsel_request_legacy(
        &self,
        id: &str,
        institution_id: &str,
        counselor_id: &str,
    ) -> ApiResult<CounselRequestView> {
        Ok(CounselRequestView::from(&self.manage_request.match_with_legacy(
            id,
            institution_id,
            counselor_id,
        )?))
    }

    /// 통합 보고서 생성 요청
    pub async fn request_integrated_report(&self, id: &str) -> ApiResult<CounselRequestView> {
        let request = self.integrated_report.execute(id).await?;
        Ok(CounselRequestView::from(&request))
    }

    // ==========================================
    // 추천 (Recommendation)
    // ==========================================

    /// 의뢰별 추천 목록 (순위 순)
    pub fn list_recommendations(
        &self,
        counsel_request_id: &str,
    ) -> ApiResult<Vec<RecommendationView>> {
        let recs = self
            .recommendation_repo
            .find_by_counsel_request_id(counsel_request_id)
            .map_err(crate::domain::DomainError::from)?;
        Ok(recs.iter().map(RecommendationView::from).collect())
    }

    /// 추천 기관 선택 (의뢰 MATCHED 전이 포함)
    pub fn select_recommended_institution(
        &self,
        counsel_request_id: &str,
        institution_id: &str,
    ) -> ApiResult<CounselRequestView> {
        let request = self
            .select_institution
            .execute(counsel_request_id, institution_id)?;
        Ok(CounselRequestView::from(&request))
    }

    // ==========================================
    // 보고서 (CounselReport)
    // ==========================================

    /// 보고서 생성
    pub fn create_counsel_report(
        &self,
        input: CreateCounselReportInput,
    ) -> ApiResult<CounselReportView> {
        let report = self.create_report.execute(input)?;
        Ok(CounselReportView::from(&report))
    }

    /// 보고서 단건 조회
    pub fn get_counsel_report(&self, id: &str) -> ApiResult<CounselReportView> {
        let report = self
            .report_repo
            .find_by_id(id)
            .map_err(crate::domain::DomainError::from)?
            .ok_or_else(|| crate::domain::DomainError::report_not_found(id))?;
        Ok(CounselReportView::from(&report))
    }

    /// 의뢰별 보고서 목록 (회기 순)
    pub fn list_counsel_reports(
        &self,
        counsel_request_id: &str,
    ) -> ApiResult<Vec<CounselReportView>> {
        let reports = self
            .report_repo
            .find_by_counsel_request_id(counsel_request_id)
            .map_err(crate::domain::DomainError::from)?;
        Ok(reports.iter().map(CounselReportView::from).collect())
    }

    /// 보고서 제출 (상담사)
    pub fn submit_counsel_report(
        &self,
        report_id: &str,
        acting_counselor_id: &str,
    ) -> ApiResult<CounselReportView> {
        let report = self.submit_report.execute(report_id, acting_counselor_id)?;
        Ok(CounselReportView::from(&report))
    }

    /// 보고서 검토 (보호자)
    pub fn review_counsel_report(
        &self,
        report_id: &str,
        acting_guardian_id: &str,
    ) -> ApiResult<CounselReportView> {
        let report = self.review_report.execute(report_id, acting_guardian_id)?;
        Ok(CounselReportView::from(&report))
    }

    /// 보고서 승인 (보호자 피드백 필수)
    pub fn approve_counsel_report(
        &self,
        report_id: &str,
        acting_guardian_id: &str,
        feedback: &str,
    ) -> ApiResult<CounselReportView> {
        let report = self
            .approve_report
            .execute(report_id, acting_guardian_id, feedback)?;
        Ok(CounselReportView::from(&report))
    }

    // ==========================================
    // 대장 (동의 / 심리 상태)
    // ==========================================

    /// 동의/철회 기록
    pub fn record_consent(
        &self,
        child_id: &str,
        guardian_id: Option<&str>,
        consent_type: &str,
        granted: bool,
        note: Option<&str>,
    ) -> ApiResult<ConsentRecordView> {
        let id = Uuid::new_v4().to_string();
        let mut record = if granted {
            ConsentRecord::granted(id, child_id, guardian_id.map(str::to_string), consent_type)
        } else {
            ConsentRecord::revoked(id, child_id, guardian_id.map(str::to_string), consent_type)
        };
        if let Some(note) = note {
            record = record.with_note(note);
        }
        self.consent_repo
            .append(&record)
            .map_err(crate::domain::DomainError::from)?;
        Ok(record)
    }

    /// 아동별 동의 이력
    pub fn list_consent_history(&self, child_id: &str) -> ApiResult<Vec<ConsentRecordView>> {
        Ok(self
            .consent_repo
            .find_by_child_id(child_id)
            .map_err(crate::domain::DomainError::from)?)
    }

    /// 심리 위험 상태 기록
    pub fn record_psych_status(
        &self,
        child_id: &str,
        level: &str,
        reason: Option<&str>,
        recorded_by: Option<&str>,
    ) -> ApiResult<PsychStatusLogView> {
        let level = PsychRiskLevel::from_str(level)
            .ok_or_else(|| ApiError::bad_request(format!("알 수 없는 심리 위험 등급: {}", level)))?;
        let mut log = PsychStatusLog::new(Uuid::new_v4().to_string(), child_id, level);
        if let Some(reason) = reason {
            log = log.with_reason(reason);
        }
        if let Some(actor) = recorded_by {
            log = log.with_recorded_by(actor);
        }
        self.psych_repo
            .append(&log)
            .map_err(crate::domain::DomainError::from)?;
        Ok(log)
    }

    /// 아동의 현재(최신) 심리 위험 상태
    pub fn get_latest_psych_status(
        &self,
        child_id: &str,
    ) -> ApiResult<Option<PsychStatusLogView>> {
        Ok(self
            .psych_repo
            .find_latest_by_child_id(child_id)
            .map_err(crate::domain::DomainError::from)?)
    }
}
