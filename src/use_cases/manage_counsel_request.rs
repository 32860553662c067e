// ==========================================
// 아동 상담 의뢰 관리 시스템 - 의뢰 운영 유스케이스
// ==========================================
// 책임: 접수 이후 의뢰의 단순 전이/수정 경로 (적재 → 도메인 메서드 → 저장)
// ==========================================

use crate::domain::counsel_request::CounselRequest;
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::form_data::CounselRequestForm;
use crate::domain::types::CounselRequestStatus;
use crate::repository::CounselRequestRepository;
use std::sync::Arc;

// ==========================================
// ManageCounselRequestUseCase
// ==========================================
pub struct ManageCounselRequestUseCase {
    request_repo: Arc<CounselRequestRepository>,
}

impl ManageCounselRequestUseCase {
    /// 유스케이스 인스턴스 생성
    pub fn new(request_repo: Arc<CounselRequestRepository>) -> Self {
        Self { request_repo }
    }

    /// 의뢰서 수정 (PENDING 전용, 검색 필드 재파생)
    pub fn update_form_data(
        &self,
        counsel_request_id: &str,
        form: CounselRequestForm,
    ) -> DomainResult<CounselRequest> {
        let mut request = self.load(counsel_request_id)?;
        request.update_form_data(form)?;
        self.request_repo.save(&request)?;
        Ok(request)
    }

    /// 상담 시작 (MATCHED → IN_PROGRESS)
    pub fn start_counseling(&self, counsel_request_id: &str) -> DomainResult<CounselRequest> {
        let mut request = self.load(counsel_request_id)?;
        request.start_counseling()?;
        self.request_repo.save(&request)?;
        Ok(request)
    }

    /// 상담 완료 (IN_PROGRESS → COMPLETED)
    pub fn complete_counseling(&self, counsel_request_id: &str) -> DomainResult<CounselRequest> {
        let mut request = self.load(counsel_request_id)?;
        request.complete_counseling()?;
        self.request_repo.save(&request)?;
        tracing::info!(request_id = %counsel_request_id, "상담 완료 처리");
        Ok(request)
    }

    /// 의뢰 반려
    pub fn reject(
        &self,
        counsel_request_id: &str,
        reason: Option<&str>,
    ) -> DomainResult<CounselRequest> {
        let mut request = self.load(counsel_request_id)?;
        request.reject(reason)?;
        self.request_repo.save(&request)?;
        tracing::info!(
            request_id = %counsel_request_id,
            reason = reason.unwrap_or("-"),
            "의뢰 반려 처리"
        );
        Ok(request)
    }

    /// 관리자 강제 상태 전환
    ///
    /// 길이 검증된 사유가 필수이며, 감사 목적으로 운영자/사유를 로그에 남긴다.
    pub fn admin_force_status(
        &self,
        counsel_request_id: &str,
        new_status: CounselRequestStatus,
        reason: &str,
        actor: &str,
    ) -> DomainResult<CounselRequest> {
        let mut request = self.load(counsel_request_id)?;
        let previous = request.status();
        request.admin_force_status(new_status, reason)?;
        self.request_repo.save(&request)?;
        tracing::warn!(
            request_id = %counsel_request_id,
            actor = %actor,
            from = %previous,
            to = %new_status,
            reason = %reason,
            "관리자 강제 상태 전환"
        );
        Ok(request)
    }

    /// 직접 매칭 (구 버전 경로, PENDING → MATCHED)
    ///
    /// 추천 단계 없이 기관/상담사를 동시 지정하던 이전 세대 워크플로.
    /// 신규 호출자는 추천 선택 유스케이스를 사용할 것.
    pub fn match_with_legacy(
        &self,
        counsel_request_id: &str,
        institution_id: &str,
        counselor_id: &str,
    ) -> DomainResult<CounselRequest> {
        let mut request = self.load(counsel_request_id)?;
        request.match_with(institution_id, counselor_id)?;
        self.request_repo.save(&request)?;
        Ok(request)
    }

    fn load(&self, counsel_request_id: &str) -> DomainResult<CounselRequest> {
        self.request_repo
            .find_by_id(counsel_request_id)?
            .ok_or_else(|| DomainError::request_not_found(counsel_request_id))
    }
}
