// ==========================================
// 아동 상담 의뢰 관리 시스템 - 동의 대장/심리 상태 이력
// ==========================================
// 원칙: 두 기록 모두 append-only. 수정/삭제 연산은 존재하지 않는다
// ==========================================

use crate::domain::types::{ConsentState, PsychRiskLevel};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// ConsentRecord - 개인정보 처리 동의 대장 항목
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsentRecord {
    pub id: String,                  // 항목 ID (UUID)
    pub child_id: String,            // 대상 아동
    pub guardian_id: Option<String>, // 동의 주체 보호자
    pub consent_type: String,        // 동의 항목 (privacy / thirdParty 등)
    pub state: ConsentState,         // 동의/철회
    pub note: Option<String>,        // 비고
    pub recorded_at: DateTime<Utc>,  // 기록 시각
}

impl ConsentRecord {
    /// 동의 항목 기록
    pub fn granted(
        id: impl Into<String>,
        child_id: impl Into<String>,
        guardian_id: Option<String>,
        consent_type: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            child_id: child_id.into(),
            guardian_id,
            consent_type: consent_type.into(),
            state: ConsentState::Granted,
            note: None,
            recorded_at: Utc::now(),
        }
    }

    /// 철회 항목 기록
    pub fn revoked(
        id: impl Into<String>,
        child_id: impl Into<String>,
        guardian_id: Option<String>,
        consent_type: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            child_id: child_id.into(),
            guardian_id,
            consent_type: consent_type.into(),
            state: ConsentState::Revoked,
            note: None,
            recorded_at: Utc::now(),
        }
    }

    /// 비고 설정
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

// ==========================================
// PsychStatusLog - 아동 심리 위험 상태 이력 항목
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PsychStatusLog {
    pub id: String,                  // 항목 ID (UUID)
    pub child_id: String,            // 대상 아동
    pub level: PsychRiskLevel,       // 위험 등급
    pub reason: Option<String>,      // 판정 근거
    pub recorded_by: Option<String>, // 기록자 (상담사/시스템)
    pub recorded_at: DateTime<Utc>,  // 기록 시각
}

impl PsychStatusLog {
    /// 상태 이력 기록
    pub fn new(
        id: impl Into<String>,
        child_id: impl Into<String>,
        level: PsychRiskLevel,
    ) -> Self {
        Self {
            id: id.into(),
            child_id: child_id.into(),
            level,
            reason: None,
            recorded_by: None,
            recorded_at: Utc::now(),
        }
    }

    /// 판정 근거 설정
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// 기록자 설정
    pub fn with_recorded_by(mut self, actor: impl Into<String>) -> Self {
        self.recorded_by = Some(actor.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_consent_record_builders() {
        let record = ConsentRecord::granted(
            "consent-001",
            "child-001",
            Some("guardian-001".to_string()),
            "privacy",
        )
        .with_note("의뢰 접수 시 서면 동의");

        assert_eq!(record.state, ConsentState::Granted);
        assert_eq!(record.note.as_deref(), Some("의뢰 접수 시 서면 동의"));
    }

    #[test]
    fn test_psych_status_log_builders() {
        let log = PsychStatusLog::new("log-001", "child-001", PsychRiskLevel::Caution)
            .with_reason("KPRC 불안 척도 상승")
            .with_recorded_by("counselor-001");

        assert_eq!(log.level, PsychRiskLevel::Caution);
        assert_eq!(log.recorded_by.as_deref(), Some("counselor-001"));
    }
}
