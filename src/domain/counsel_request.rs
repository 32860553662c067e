// ==========================================
// 아동 상담 의뢰 관리 시스템 - 상담 의뢰 집계 루트
// ==========================================
// 책임: 의뢰 생명주기 상태 전이, 의뢰서 검증, 검색 필드 파생
// 제약: 상태/필드 변경은 명명된 전이 메서드로만 수행
// 제약: 파생 필드(center_name/care_type/request_date)는 의뢰서 값과 항상 일치,
//       생성/수정 시 재계산되며 독립적으로 설정되지 않는다
// ==========================================

use crate::domain::error::{DomainError, DomainResult};
use crate::domain::form_data::CounselRequestForm;
use crate::domain::types::{CareType, CounselRequestStatus, IntegratedReportStatus};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// 관리자 강제 전환 사유 최소 길이 (문자 수 기준)
pub const FORCE_STATUS_REASON_MIN_CHARS: usize = 10;

// ==========================================
// CounselRequest - 상담 의뢰
// ==========================================
// 필드는 비공개. 저장소 복원은 restore(), 영속화는 snapshot() 경유
#[derive(Debug, Clone, PartialEq)]
pub struct CounselRequest {
    // ===== 식별/참조 =====
    id: String,                  // 외부 생성 식별자 (UUID 등 불투명 문자열)
    child_id: String,            // 아동 참조
    guardian_id: Option<String>, // 보호자 참조

    // ===== 상태 =====
    status: CounselRequestStatus,

    // ===== 의뢰서 문서 =====
    form: CounselRequestForm,

    // ===== 파생 검색 필드 (의뢰서에서 재계산) =====
    center_name: String,
    care_type: CareType,
    request_date: NaiveDate,

    // ===== 매칭 결과 =====
    matched_institution_id: Option<String>,
    matched_counselor_id: Option<String>,

    // ===== 통합 보고서 (외부 생성기 추적) =====
    integrated_report_s3_key: Option<String>,
    integrated_report_status: Option<IntegratedReportStatus>,

    // ===== 반려 사유 =====
    rejected_reason: Option<String>,

    // ===== 동시성 제어 =====
    version: i64, // 낙관적 잠금, 저장 시 비교-교환

    // ===== 감사 필드 =====
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

// ==========================================
// CounselRequestSnapshot - 영속화/복원용 평면 구조
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CounselRequestSnapshot {
    pub id: String,
    pub child_id: String,
    pub guardian_id: Option<String>,
    pub status: CounselRequestStatus,
    pub form: CounselRequestForm,
    pub center_name: String,
    pub care_type: CareType,
    pub request_date: NaiveDate,
    pub matched_institution_id: Option<String>,
    pub matched_counselor_id: Option<String>,
    pub integrated_report_s3_key: Option<String>,
    pub integrated_report_status: Option<IntegratedReportStatus>,
    pub rejected_reason: Option<String>,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CounselRequest {
    // ==========================================
    // 생성/복원
    // ==========================================

    /// 의뢰 생성
    ///
    /// 의뢰서를 검증하고 검색 필드를 파생한 뒤 PENDING 상태로 시작한다.
    /// 검증 실패 시 먼저 위반된 규칙의 필드별 메시지로 실패한다.
    pub fn create(
        id: impl Into<String>,
        child_id: impl Into<String>,
        guardian_id: Option<String>,
        form: CounselRequestForm,
    ) -> DomainResult<Self> {
        form.validate()?;
        let request_date = form.derived_request_date()?;
        let now = Utc::now();

        Ok(Self {
            id: id.into(),
            child_id: child_id.into(),
            guardian_id,
            status: CounselRequestStatus::Pending,
            center_name: form.cover_info.center_name.clone(),
            care_type: form.basic_info.care_type,
            request_date,
            form,
            matched_institution_id: None,
            matched_counselor_id: None,
            integrated_report_s3_key: None,
            integrated_report_status: None,
            rejected_reason: None,
            version: 0,
            created_at: now,
            updated_at: now,
        })
    }

    /// 저장소 복원 (신뢰 경로, 재검증 없음)
    pub fn restore(snapshot: CounselRequestSnapshot) -> Self {
        Self {
            id: snapshot.id,
            child_id: snapshot.child_id,
            guardian_id: snapshot.guardian_id,
            status: snapshot.status,
            form: snapshot.form,
            center_name: snapshot.center_name,
            care_type: snapshot.care_type,
            request_date: snapshot.request_date,
            matched_institution_id: snapshot.matched_institution_id,
            matched_counselor_id: snapshot.matched_counselor_id,
            integrated_report_s3_key: snapshot.integrated_report_s3_key,
            integrated_report_status: snapshot.integrated_report_status,
            rejected_reason: snapshot.rejected_reason,
            version: snapshot.version,
            created_at: snapshot.created_at,
            updated_at: snapshot.updated_at,
        }
    }

    /// 영속화용 스냅샷
    pub fn snapshot(&self) -> CounselRequestSnapshot {
        CounselRequestSnapshot {
            id: self.id.clone(),
            child_id: self.child_id.clone(),
            guardian_id: self.guardian_id.clone(),
            status: self.status,
            form: self.form.clone(),
            center_name: self.center_name.clone(),
            care_type: self.care_type,
            request_date: self.request_date,
            matched_institution_id: self.matched_institution_id.clone(),
            matched_counselor_id: self.matched_counselor_id.clone(),
            integrated_report_s3_key: self.integrated_report_s3_key.clone(),
            integrated_report_status: self.integrated_report_status,
            rejected_reason: self.rejected_reason.clone(),
            version: self.version,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    // ==========================================
    // 상태 전이
    // ==========================================

    /// 추천 완료: PENDING → RECOMMENDED
    pub fn mark_as_recommended(&mut self) -> DomainResult<()> {
        if self.status != CounselRequestStatus::Pending {
            return Err(DomainError::invalid_transition(format!(
                "추천 완료 처리는 PENDING 상태에서만 가능합니다 (현재: {})",
                self.status
            )));
        }
        self.status = CounselRequestStatus::Recommended;
        self.touch();
        Ok(())
    }

    /// 기관 선택: RECOMMENDED → MATCHED
    ///
    /// 추천 목록 포함 여부 확인은 선택 유스케이스의 책임이다.
    pub fn select_institution(&mut self, institution_id: &str) -> DomainResult<()> {
        if self.status != CounselRequestStatus::Recommended {
            return Err(DomainError::invalid_transition(format!(
                "기관 선택은 RECOMMENDED 상태에서만 가능합니다 (현재: {})",
                self.status
            )));
        }
        if institution_id.trim().is_empty() {
            return Err(DomainError::invalid_form("기관 ID는 공백일 수 없습니다"));
        }
        self.status = CounselRequestStatus::Matched;
        self.matched_institution_id = Some(institution_id.to_string());
        self.touch();
        Ok(())
    }

    /// 직접 매칭 (구 버전 경로): PENDING → MATCHED
    ///
    /// 추천 단계를 거치지 않고 기관과 상담사를 동시에 지정하던 이전 세대
    /// 워크플로. 호출자 이관 완료 전까지 동작을 그대로 유지한다.
    /// 신규 코드는 select_institution() 을 사용할 것.
    pub fn match_with(&mut self, institution_id: &str, counselor_id: &str) -> DomainResult<()> {
        if self.status != CounselRequestStatus::Pending {
            return Err(DomainError::invalid_transition(format!(
                "직접 매칭은 PENDING 상태에서만 가능합니다 (현재: {})",
                self.status
            )));
        }
        self.status = CounselRequestStatus::Matched;
        self.matched_institution_id = Some(institution_id.to_string());
        self.matched_counselor_id = Some(counselor_id.to_string());
        self.touch();
        Ok(())
    }

    /// 상담 시작: MATCHED → IN_PROGRESS
    pub fn start_counseling(&mut self) -> DomainResult<()> {
        if self.status != CounselRequestStatus::Matched {
            return Err(DomainError::invalid_transition(format!(
                "상담 시작은 MATCHED 상태에서만 가능합니다 (현재: {})",
                self.status
            )));
        }
        self.status = CounselRequestStatus::InProgress;
        self.touch();
        Ok(())
    }

    /// 상담 완료: IN_PROGRESS → COMPLETED
    pub fn complete_counseling(&mut self) -> DomainResult<()> {
        if self.status != CounselRequestStatus::InProgress {
            return Err(DomainError::invalid_transition(format!(
                "상담 완료는 IN_PROGRESS 상태에서만 가능합니다 (현재: {})",
                self.status
            )));
        }
        self.status = CounselRequestStatus::Completed;
        self.touch();
        Ok(())
    }

    /// 반려: COMPLETED 를 제외한 모든 상태 → REJECTED
    pub fn reject(&mut self, reason: Option<&str>) -> DomainResult<()> {
        if self.status == CounselRequestStatus::Completed {
            return Err(DomainError::invalid_transition(
                "완료된 의뢰는 반려할 수 없습니다",
            ));
        }
        self.status = CounselRequestStatus::Rejected;
        self.rejected_reason = reason.map(|r| r.to_string());
        self.touch();
        Ok(())
    }

    /// 의뢰서 수정: PENDING 에서만 허용
    ///
    /// 재검증 후 문서를 교체하고 검색 필드를 재파생한다.
    pub fn update_form_data(&mut self, form: CounselRequestForm) -> DomainResult<()> {
        if self.status != CounselRequestStatus::Pending {
            return Err(DomainError::invalid_transition(format!(
                "의뢰서 수정은 PENDING 상태에서만 가능합니다 (현재: {})",
                self.status
            )));
        }
        form.validate()?;
        let request_date = form.derived_request_date()?;

        self.center_name = form.cover_info.center_name.clone();
        self.care_type = form.basic_info.care_type;
        self.request_date = request_date;
        self.form = form;
        self.touch();
        Ok(())
    }

    /// 관리자 강제 상태 전환 (운영자 전용 탈출구)
    ///
    /// 정방향 체인을 우회하지만 COMPLETED 는 정상 흐름으로만 도달/이탈
    /// 가능한 보호 종결 상태로 취급한다. 규칙 위반별로 별도 메시지로 실패:
    /// 1. 현재 상태가 COMPLETED 가 아닐 것
    /// 2. 대상 상태가 COMPLETED 가 아닐 것
    /// 3. 사유가 공백 제거 후 10자 이상일 것 (바이트가 아닌 문자 수)
    /// 4. 대상 상태가 현재 상태와 다를 것
    pub fn admin_force_status(
        &mut self,
        new_status: CounselRequestStatus,
        reason: &str,
    ) -> DomainResult<()> {
        if self.status == CounselRequestStatus::Completed {
            return Err(DomainError::invalid_transition(
                "완료된 의뢰의 상태는 변경할 수 없습니다",
            ));
        }
        if new_status == CounselRequestStatus::Completed {
            return Err(DomainError::invalid_transition(
                "관리자 강제 전환으로는 COMPLETED 상태로 변경할 수 없습니다",
            ));
        }
        if reason.trim().chars().count() < FORCE_STATUS_REASON_MIN_CHARS {
            return Err(DomainError::invalid_form(format!(
                "상태 변경 사유는 {}자 이상이어야 합니다",
                FORCE_STATUS_REASON_MIN_CHARS
            )));
        }
        if new_status == self.status {
            return Err(DomainError::invalid_transition(
                "현재 상태와 동일한 상태로는 변경할 수 없습니다",
            ));
        }
        self.status = new_status;
        self.touch();
        Ok(())
    }

    // ==========================================
    // 통합 보고서 추적
    // ==========================================

    /// 통합 보고서 생성 시작 표시
    pub fn begin_integrated_report(&mut self) {
        self.integrated_report_status = Some(IntegratedReportStatus::Processing);
        self.touch();
    }

    /// 통합 보고서 생성 완료, S3 키 확보
    pub fn complete_integrated_report(&mut self, s3_key: &str) -> DomainResult<()> {
        if s3_key.trim().is_empty() {
            return Err(DomainError::invalid_form(
                "통합 보고서 S3 키는 공백일 수 없습니다",
            ));
        }
        self.integrated_report_status = Some(IntegratedReportStatus::Completed);
        self.integrated_report_s3_key = Some(s3_key.to_string());
        self.touch();
        Ok(())
    }

    /// 통합 보고서 생성 실패 표시
    pub fn fail_integrated_report(&mut self) {
        self.integrated_report_status = Some(IntegratedReportStatus::Failed);
        self.touch();
    }

    // ==========================================
    // 조회 접근자
    // ==========================================

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn child_id(&self) -> &str {
        &self.child_id
    }

    pub fn guardian_id(&self) -> Option<&str> {
        self.guardian_id.as_deref()
    }

    pub fn status(&self) -> CounselRequestStatus {
        self.status
    }

    pub fn form(&self) -> &CounselRequestForm {
        &self.form
    }

    pub fn center_name(&self) -> &str {
        &self.center_name
    }

    pub fn care_type(&self) -> CareType {
        self.care_type
    }

    pub fn request_date(&self) -> NaiveDate {
        self.request_date
    }

    pub fn matched_institution_id(&self) -> Option<&str> {
        self.matched_institution_id.as_deref()
    }

    pub fn matched_counselor_id(&self) -> Option<&str> {
        self.matched_counselor_id.as_deref()
    }

    pub fn integrated_report_s3_key(&self) -> Option<&str> {
        self.integrated_report_s3_key.as_deref()
    }

    pub fn integrated_report_status(&self) -> Option<IntegratedReportStatus> {
        self.integrated_report_status
    }

    pub fn rejected_reason(&self) -> Option<&str> {
        self.rejected_reason.as_deref()
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
