// ==========================================
// 아동 상담 의뢰 관리 시스템 - 동의 대장/심리 상태 이력 저장소
// ==========================================
// 원칙: append-only. 수정/삭제 메서드를 제공하지 않는다
// ==========================================

use crate::domain::ledger::{ConsentRecord, PsychStatusLog};
use crate::domain::types::{ConsentState, PsychRiskLevel};
use crate::repository::codec::{fmt_ts, parse_ts};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

// ==========================================
// ConsentLedgerRepository - 동의 대장 저장소
// ==========================================
pub struct ConsentLedgerRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ConsentLedgerRepository {
    /// 저장소 인스턴스 생성
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 동의 항목 추가
    pub fn append(&self, record: &ConsentRecord) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"INSERT INTO consent_record (
                id, child_id, guardian_id, consent_type, state, note, recorded_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?)"#,
            params![
                &record.id,
                &record.child_id,
                &record.guardian_id,
                &record.consent_type,
                record.state.to_db_str(),
                &record.note,
                fmt_ts(record.recorded_at),
            ],
        )?;
        Ok(())
    }

    /// 아동별 동의 이력 (기록 순)
    pub fn find_by_child_id(&self, child_id: &str) -> RepositoryResult<Vec<ConsentRecord>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, child_id, guardian_id, consent_type, state, note, recorded_at
             FROM consent_record WHERE child_id = ? ORDER BY recorded_at ASC",
        )?;
        let raws = stmt
            .query_map(params![child_id], Self::map_row)?
            .collect::<Result<Vec<_>, _>>()?;
        raws.into_iter().map(Self::to_record).collect()
    }

    fn map_row(row: &Row<'_>) -> rusqlite::Result<RawConsentRow> {
        Ok(RawConsentRow {
            id: row.get(0)?,
            child_id: row.get(1)?,
            guardian_id: row.get(2)?,
            consent_type: row.get(3)?,
            state: row.get(4)?,
            note: row.get(5)?,
            recorded_at: row.get(6)?,
        })
    }

    fn to_record(raw: RawConsentRow) -> RepositoryResult<ConsentRecord> {
        let state =
            ConsentState::from_str(&raw.state).ok_or_else(|| RepositoryError::FieldValueError {
                field: "state".to_string(),
                message: format!("알 수 없는 동의 상태: {}", raw.state),
            })?;
        Ok(ConsentRecord {
            id: raw.id,
            child_id: raw.child_id,
            guardian_id: raw.guardian_id,
            consent_type: raw.consent_type,
            state,
            note: raw.note,
            recorded_at: parse_ts("recorded_at", &raw.recorded_at)?,
        })
    }
}

struct RawConsentRow {
    id: String,
    child_id: String,
    guardian_id: Option<String>,
    consent_type: String,
    state: String,
    note: Option<String>,
    recorded_at: String,
}

// ==========================================
// PsychStatusLogRepository - 심리 상태 이력 저장소
// ==========================================
pub struct PsychStatusLogRepository {
    conn: Arc<Mutex<Connection>>,
}

impl PsychStatusLogRepository {
    /// 저장소 인스턴스 생성
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 상태 이력 추가
    pub fn append(&self, log: &PsychStatusLog) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"INSERT INTO psych_status_log (
                id, child_id, level, reason, recorded_by, recorded_at
            ) VALUES (?, ?, ?, ?, ?, ?)"#,
            params![
                &log.id,
                &log.child_id,
                log.level.to_db_str(),
                &log.reason,
                &log.recorded_by,
                fmt_ts(log.recorded_at),
            ],
        )?;
        Ok(())
    }

    /// 아동별 상태 이력 (기록 순)
    pub fn find_by_child_id(&self, child_id: &str) -> RepositoryResult<Vec<PsychStatusLog>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, child_id, level, reason, recorded_by, recorded_at
             FROM psych_status_log WHERE child_id = ? ORDER BY recorded_at ASC",
        )?;
        let raws = stmt
            .query_map(params![child_id], Self::map_row)?
            .collect::<Result<Vec<_>, _>>()?;
        raws.into_iter().map(Self::to_log).collect()
    }

    /// 아동의 최신 상태 항목
    pub fn find_latest_by_child_id(
        &self,
        child_id: &str,
    ) -> RepositoryResult<Option<PsychStatusLog>> {
        let conn = self.get_conn()?;
        let raw = conn
            .query_row(
                "SELECT id, child_id, level, reason, recorded_by, recorded_at
                 FROM psych_status_log WHERE child_id = ?
                 ORDER BY recorded_at DESC LIMIT 1",
                params![child_id],
                Self::map_row,
            )
            .optional()?;
        raw.map(Self::to_log).transpose()
    }

    fn map_row(row: &Row<'_>) -> rusqlite::Result<RawPsychRow> {
        Ok(RawPsychRow {
            id: row.get(0)?,
            child_id: row.get(1)?,
            level: row.get(2)?,
            reason: row.get(3)?,
            recorded_by: row.get(4)?,
            recorded_at: row.get(5)?,
        })
    }

    fn to_log(raw: RawPsychRow) -> RepositoryResult<PsychStatusLog> {
        let level = PsychRiskLevel::from_str(&raw.level).ok_or_else(|| {
            RepositoryError::FieldValueError {
                field: "level".to_string(),
                message: format!("알 수 없는 심리 위험 등급: {}", raw.level),
            }
        })?;
        Ok(PsychStatusLog {
            id: raw.id,
            child_id: raw.child_id,
            level,
            reason: raw.reason,
            recorded_by: raw.recorded_by,
            recorded_at: parse_ts("recorded_at", &raw.recorded_at)?,
        })
    }
}

struct RawPsychRow {
    id: String,
    child_id: String,
    level: String,
    reason: Option<String>,
    recorded_by: Option<String>,
    recorded_at: String,
}
