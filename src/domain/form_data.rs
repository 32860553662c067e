// ==========================================
// 아동 상담 의뢰 관리 시스템 - 의뢰서 문서 모델
// ==========================================
// 용도: 의뢰(CounselRequest)가 보유하는 중첩 문서. JSON 컬럼으로 저장
// 제약: 경계(DTO) 계층에서 형태 검증을 마친 값 객체로 취급하고,
//       집계는 알려진 경로만 읽는다 (coverInfo.centerName 등)
// 직렬화: 원 전송 형식과 동일한 camelCase
// ==========================================

use crate::domain::error::{DomainError, DomainResult, ErrorCode};
use crate::domain::types::CareType;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ==========================================
// RequestDate - 의뢰일 (연/월/일 분리 입력)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestDate {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

impl RequestDate {
    /// 달력 날짜로 변환 (범위 검증 통과 후에도 2월 31일 등은 실패)
    pub fn to_naive_date(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, self.day)
    }
}

// ==========================================
// CoverInfo - 표지 정보
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverInfo {
    pub request_date: RequestDate, // 의뢰일
    pub center_name: String,       // 의뢰 기관(센터)명
    pub counselor_name: String,    // 담당 상담사명
}

// ==========================================
// ChildInfo - 아동 기본 정보
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChildInfo {
    pub name: String,           // 아동 이름
    pub gender: Option<String>, // 성별
    pub age: Option<i32>,       // 나이
    pub grade: Option<String>,  // 학년
}

// ==========================================
// ProtectedChildInfo - 보호 아동 부가 정보 (선택)
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtectedChildInfo {
    pub facility_name: Option<String>,     // 보호 시설명
    pub guardian_relation: Option<String>, // 보호자 관계
}

// ==========================================
// BasicInfo - 기본 정보
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BasicInfo {
    pub child_info: ChildInfo,                      // 아동 정보
    pub care_type: CareType,                        // 보호 구분
    pub priority_reason: Option<String>,            // 우선 사유 (PRIORITY 필수)
    pub protected_child: Option<ProtectedChildInfo>, // 보호 아동 부가 정보
}

// ==========================================
// PsychologicalInfo - 심리 정보
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PsychologicalInfo {
    pub emotional_state: Option<String>,   // 정서 상태
    pub behavioral_traits: Option<String>, // 행동 특성
    pub peer_relation: Option<String>,     // 또래 관계
    pub special_notes: Option<String>,     // 특이 사항
}

// ==========================================
// RequestMotivation - 의뢰 동기
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestMotivation {
    pub motivation: String,            // 의뢰 동기
    pub expectations: Option<String>,  // 기대 사항
}

// ==========================================
// AssessmentSummary - 첨부 심리검사 요약
// ==========================================
// KPRC / CRTES-R / SDQ-A 등 구조화 요약
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentSummary {
    pub assessment_type: String,           // 검사 유형 (KPRC 등)
    pub score: Option<f64>,                // 점수
    pub level: Option<String>,             // 등급
    #[serde(default)]
    pub summary_lines: Vec<String>,        // 요약문
    pub expert_opinion: Option<String>,    // 전문가 소견
    #[serde(default)]
    pub key_findings: Vec<String>,         // 주요 발견
    #[serde(default)]
    pub recommendations: Vec<String>,      // 권고 사항
    pub confidence_score: Option<f64>,     // 신뢰도
}

// ==========================================
// TestResults - 검사 결과 묶음
// ==========================================
// 구세대 단일 필드(kprcSummary 등)와 신세대 첨부 목록이 공존한다.
// 호출자 이관 완료 전까지 양쪽 모두 유지 (구 필드는 구 버전 경로 전용)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResults {
    #[serde(default)]
    pub attached_assessments: Vec<AssessmentSummary>, // 신세대: 첨부 검사 목록
    pub kprc_summary: Option<String>,                 // 구세대: KPRC 요약
    pub assessment_report_s3_key: Option<String>,     // 구세대: 검사 보고서 파일 키
}

// ==========================================
// ConsentInfo - 동의 정보
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsentInfo {
    pub privacy_agreed: bool,              // 개인정보 처리 동의
    pub third_party_agreed: Option<bool>,  // 제3자 제공 동의
    pub guardian_signature: Option<String>, // 보호자 서명
    pub agreed_at: Option<NaiveDate>,      // 동의 일자
}

// ==========================================
// CounselRequestForm - 의뢰서 전체 문서
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CounselRequestForm {
    pub cover_info: CoverInfo,                 // 표지
    pub basic_info: BasicInfo,                 // 기본 정보
    pub psychological_info: PsychologicalInfo, // 심리 정보
    pub request_motivation: RequestMotivation, // 의뢰 동기
    pub test_results: Option<TestResults>,     // 검사 결과 (선택)
    pub consent: ConsentInfo,                  // 동의
}

impl CounselRequestForm {
    /// 의뢰서 검증
    ///
    /// 규칙 순서 (먼저 실패한 규칙의 메시지로 즉시 반환, 오류 누적 없음):
    /// 1. 기관명 존재
    /// 2. 상담사명 존재
    /// 3. 아동 이름 존재
    /// 4. 의뢰일 월 범위 (1~12)
    /// 5. 의뢰일 일 범위 (1~31)
    /// 6. 달력상 실존 날짜
    /// 7. PRIORITY 인 경우 우선 사유 존재
    pub fn validate(&self) -> DomainResult<()> {
        if self.cover_info.center_name.trim().is_empty() {
            return Err(DomainError::invalid_form("기관명(centerName)은 필수입니다"));
        }
        if self.cover_info.counselor_name.trim().is_empty() {
            return Err(DomainError::invalid_form(
                "상담사명(counselorName)은 필수입니다",
            ));
        }
        if self.basic_info.child_info.name.trim().is_empty() {
            return Err(DomainError::invalid_form("아동 이름은 필수입니다"));
        }

        let date = &self.cover_info.request_date;
        if !(1..=12).contains(&date.month) {
            return Err(DomainError::invalid_form(format!(
                "의뢰일의 월(month)은 1~12 범위여야 합니다: month={}",
                date.month
            )));
        }
        if !(1..=31).contains(&date.day) {
            return Err(DomainError::invalid_form(format!(
                "의뢰일의 일(day)은 1~31 범위여야 합니다: day={}",
                date.day
            )));
        }
        if date.to_naive_date().is_none() {
            return Err(DomainError::invalid_form(format!(
                "달력에 존재하지 않는 날짜입니다: {}-{}-{}",
                date.year, date.month, date.day
            )));
        }

        if self.basic_info.care_type == CareType::Priority {
            let has_reason = self
                .basic_info
                .priority_reason
                .as_deref()
                .map(|r| !r.trim().is_empty())
                .unwrap_or(false);
            if !has_reason {
                return Err(DomainError::invalid_form(
                    "우선 보호 대상(PRIORITY)은 우선 사유(priorityReason)가 필요합니다",
                ));
            }
        }

        Ok(())
    }

    /// 검증 통과를 전제로 의뢰일을 달력 날짜로 파생
    pub fn derived_request_date(&self) -> DomainResult<NaiveDate> {
        self.cover_info.request_date.to_naive_date().ok_or_else(|| {
            DomainError::new(
                ErrorCode::InvalidFormData,
                format!(
                    "달력에 존재하지 않는 날짜입니다: {}-{}-{}",
                    self.cover_info.request_date.year,
                    self.cover_info.request_date.month,
                    self.cover_info.request_date.day
                ),
            )
        })
    }

    /// 첨부 검사 존재 여부 (추천 문맥 보강 판단용)
    pub fn has_attached_assessments(&self) -> bool {
        self.test_results
            .as_ref()
            .map(|t| !t.attached_assessments.is_empty() || t.kprc_summary.is_some())
            .unwrap_or(false)
    }
}
