// ==========================================
// 아동 상담 의뢰 관리 시스템 - 도메인 타입 정의
// ==========================================
// 원칙: 상태는 열거형으로 고정, 전이는 집계 루트의 명명된 메서드로만 수행
// 직렬화 형식: SCREAMING_SNAKE_CASE (저장소/전송 계층과 일치)
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 상담 의뢰 상태 (Counsel Request Status)
// ==========================================
// 정방향 체인: PENDING → RECOMMENDED → MATCHED → IN_PROGRESS → COMPLETED
// REJECTED 는 COMPLETED 이전 어느 상태에서든 진입 가능
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CounselRequestStatus {
    Pending,     // 접수 완료, 추천 대기
    Recommended, // AI 기관 추천 완료
    Matched,     // 기관 매칭 완료
    InProgress,  // 상담 진행 중
    Completed,   // 상담 완료 (보호 종결 상태)
    Rejected,    // 반려
}

impl fmt::Display for CounselRequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl CounselRequestStatus {
    /// 문자열에서 상태 파싱 (저장소 복원용)
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "PENDING" => Some(CounselRequestStatus::Pending),
            "RECOMMENDED" => Some(CounselRequestStatus::Recommended),
            "MATCHED" => Some(CounselRequestStatus::Matched),
            "IN_PROGRESS" => Some(CounselRequestStatus::InProgress),
            "COMPLETED" => Some(CounselRequestStatus::Completed),
            "REJECTED" => Some(CounselRequestStatus::Rejected),
            _ => None,
        }
    }

    /// 데이터베이스 저장용 문자열
    pub fn to_db_str(&self) -> &'static str {
        match self {
            CounselRequestStatus::Pending => "PENDING",
            CounselRequestStatus::Recommended => "RECOMMENDED",
            CounselRequestStatus::Matched => "MATCHED",
            CounselRequestStatus::InProgress => "IN_PROGRESS",
            CounselRequestStatus::Completed => "COMPLETED",
            CounselRequestStatus::Rejected => "REJECTED",
        }
    }
}

// ==========================================
// 상담 보고서 상태 (Counsel Report Status)
// ==========================================
// 정방향 체인: DRAFT → SUBMITTED → REVIEWED → APPROVED (건너뜀/역행 불가)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CounselReportStatus {
    Draft,     // 작성 중
    Submitted, // 제출 완료
    Reviewed,  // 검토 완료
    Approved,  // 보호자 승인 완료
}

impl fmt::Display for CounselReportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl CounselReportStatus {
    /// 문자열에서 상태 파싱 (저장소 복원용)
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "DRAFT" => Some(CounselReportStatus::Draft),
            "SUBMITTED" => Some(CounselReportStatus::Submitted),
            "REVIEWED" => Some(CounselReportStatus::Reviewed),
            "APPROVED" => Some(CounselReportStatus::Approved),
            _ => None,
        }
    }

    /// 데이터베이스 저장용 문자열
    pub fn to_db_str(&self) -> &'static str {
        match self {
            CounselReportStatus::Draft => "DRAFT",
            CounselReportStatus::Submitted => "SUBMITTED",
            CounselReportStatus::Reviewed => "REVIEWED",
            CounselReportStatus::Approved => "APPROVED",
        }
    }
}

// ==========================================
// 보호 구분 (Care Type)
// ==========================================
// 아동의 지원/우선 분류. PRIORITY 는 우선 사유(priorityReason) 필수
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CareType {
    Priority, // 우선 보호 대상
    General,  // 일반
    Special,  // 특별 지원 대상
}

impl fmt::Display for CareType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl CareType {
    /// 문자열에서 보호 구분 파싱
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "PRIORITY" => Some(CareType::Priority),
            "GENERAL" => Some(CareType::General),
            "SPECIAL" => Some(CareType::Special),
            _ => None,
        }
    }

    /// 데이터베이스 저장용 문자열
    pub fn to_db_str(&self) -> &'static str {
        match self {
            CareType::Priority => "PRIORITY",
            CareType::General => "GENERAL",
            CareType::Special => "SPECIAL",
        }
    }
}

// ==========================================
// 통합 보고서 생성 상태 (Integrated Report Status)
// ==========================================
// 외부 생성기의 진행 상태. 의뢰 생성 성공 여부와는 독립
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntegratedReportStatus {
    Pending,    // 생성 요청 전
    Processing, // 생성 중
    Completed,  // 생성 완료 (S3 키 확보)
    Failed,     // 생성 실패
}

impl fmt::Display for IntegratedReportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl IntegratedReportStatus {
    /// 문자열에서 상태 파싱
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(IntegratedReportStatus::Pending),
            "processing" => Some(IntegratedReportStatus::Processing),
            "completed" => Some(IntegratedReportStatus::Completed),
            "failed" => Some(IntegratedReportStatus::Failed),
            _ => None,
        }
    }

    /// 데이터베이스 저장용 문자열
    pub fn to_db_str(&self) -> &'static str {
        match self {
            IntegratedReportStatus::Pending => "pending",
            IntegratedReportStatus::Processing => "processing",
            IntegratedReportStatus::Completed => "completed",
            IntegratedReportStatus::Failed => "failed",
        }
    }
}

// ==========================================
// 심리 위험 등급 (Psych Risk Level)
// ==========================================
// 아동별 심리 상태 이력의 등급. 등급제, 점수제 아님
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PsychRiskLevel {
    Normal,  // 안정
    Caution, // 관심 필요
    Risk,    // 위험
}

impl fmt::Display for PsychRiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl PsychRiskLevel {
    /// 문자열에서 등급 파싱
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "NORMAL" => Some(PsychRiskLevel::Normal),
            "CAUTION" => Some(PsychRiskLevel::Caution),
            "RISK" => Some(PsychRiskLevel::Risk),
            _ => None,
        }
    }

    /// 데이터베이스 저장용 문자열
    pub fn to_db_str(&self) -> &'static str {
        match self {
            PsychRiskLevel::Normal => "NORMAL",
            PsychRiskLevel::Caution => "CAUTION",
            PsychRiskLevel::Risk => "RISK",
        }
    }
}

// ==========================================
// 동의 상태 (Consent State)
// ==========================================
// 개인정보 처리 동의 대장의 항목 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConsentState {
    Granted, // 동의
    Revoked, // 철회
}

impl fmt::Display for ConsentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl ConsentState {
    /// 문자열에서 상태 파싱
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "GRANTED" => Some(ConsentState::Granted),
            "REVOKED" => Some(ConsentState::Revoked),
            _ => None,
        }
    }

    /// 데이터베이스 저장용 문자열
    pub fn to_db_str(&self) -> &'static str {
        match self {
            ConsentState::Granted => "GRANTED",
            ConsentState::Revoked => "REVOKED",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_status_roundtrip() {
        for s in [
            CounselRequestStatus::Pending,
            CounselRequestStatus::Recommended,
            CounselRequestStatus::Matched,
            CounselRequestStatus::InProgress,
            CounselRequestStatus::Completed,
            CounselRequestStatus::Rejected,
        ] {
            assert_eq!(CounselRequestStatus::from_str(s.to_db_str()), Some(s));
        }
        assert_eq!(CounselRequestStatus::from_str("UNKNOWN"), None);
    }

    #[test]
    fn test_report_status_roundtrip() {
        for s in [
            CounselReportStatus::Draft,
            CounselReportStatus::Submitted,
            CounselReportStatus::Reviewed,
            CounselReportStatus::Approved,
        ] {
            assert_eq!(CounselReportStatus::from_str(s.to_db_str()), Some(s));
        }
    }

    #[test]
    fn test_integrated_report_status_lowercase() {
        // 통합 보고서 상태는 소문자 표기를 유지한다
        assert_eq!(IntegratedReportStatus::Processing.to_db_str(), "processing");
        assert_eq!(
            IntegratedReportStatus::from_str("FAILED"),
            Some(IntegratedReportStatus::Failed)
        );
    }

    #[test]
    fn test_psych_risk_level_ordering() {
        assert!(PsychRiskLevel::Normal < PsychRiskLevel::Caution);
        assert!(PsychRiskLevel::Caution < PsychRiskLevel::Risk);
    }
}
