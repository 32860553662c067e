// ==========================================
// 아동 상담 의뢰 관리 시스템 - 상담 보고서 저장소
// ==========================================
// 책임: counsel_report 테이블 CRUD/조회
// 제약: (counsel_request_id, session_number) 유일성은 UNIQUE 제약이 최후 방어
// ==========================================

use crate::domain::counsel_report::{CounselReport, CounselReportSnapshot};
use crate::domain::types::CounselReportStatus;
use crate::repository::codec::{fmt_date, fmt_ts, parse_date, parse_ts};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::Paginated;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

/// 조회 컬럼 목록 (map_row 와 순서 일치)
const SELECT_COLUMNS: &str = r#"id, counsel_request_id, child_id, counselor_id, institution_id,
       session_number, report_date, center_name, counselor_signature,
       counsel_reason, counsel_content, center_feedback, home_feedback,
       attachment_urls_json, status, submitted_at, reviewed_at,
       guardian_feedback, version, created_at, updated_at"#;

// ==========================================
// CounselReportRepository - 상담 보고서 저장소
// ==========================================
pub struct CounselReportRepository {
    conn: Arc<Mutex<Connection>>,
}

/// 행에서 추출한 원시 값 (열거형/날짜 변환 전)
struct RawReportRow {
    id: String,
    counsel_request_id: String,
    child_id: String,
    counselor_id: Option<String>,
    institution_id: Option<String>,
    session_number: i32,
    report_date: String,
    center_name: String,
    counselor_signature: Option<String>,
    counsel_reason: String,
    counsel_content: String,
    center_feedback: Option<String>,
    home_feedback: Option<String>,
    attachment_urls_json: String,
    status: String,
    submitted_at: Option<String>,
    reviewed_at: Option<String>,
    guardian_feedback: Option<String>,
    version: i64,
    created_at: String,
    updated_at: String,
}

impl CounselReportRepository {
    /// 저장소 인스턴스 생성
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 데이터베이스 연결 획득
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 보고서 저장 (신규 INSERT 또는 비교-교환 UPDATE)
    ///
    /// # 반환
    /// 저장 후 행의 version
    pub fn save(&self, report: &CounselReport) -> RepositoryResult<i64> {
        let snap = report.snapshot();
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        let actual: Option<i64> = tx
            .query_row(
                "SELECT version FROM counsel_report WHERE id = ?",
                params![&snap.id],
                |row| row.get(0),
            )
            .optional()?;

        let attachments_json = Self::attachments_to_json(&snap)?;
        let new_version = match actual {
            None => {
                tx.execute(
                    r#"INSERT INTO counsel_report (
                        id, counsel_request_id, child_id, counselor_id, institution_id,
                        session_number, report_date, center_name, counselor_signature,
                        counsel_reason, counsel_content, center_feedback, home_feedback,
                        attachment_urls_json, status, submitted_at, reviewed_at,
                        guardian_feedback, version, created_at, updated_at
                    ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
                    params![
                        &snap.id,
                        &snap.counsel_request_id,
                        &snap.child_id,
                        &snap.counselor_id,
                        &snap.institution_id,
                        snap.session_number,
                        fmt_date(snap.report_date),
                        &snap.center_name,
                        &snap.counselor_signature,
                        &snap.counsel_reason,
                        &snap.counsel_content,
                        &snap.center_feedback,
                        &snap.home_feedback,
                        attachments_json,
                        snap.status.to_db_str(),
                        snap.submitted_at.map(fmt_ts),
                        snap.reviewed_at.map(fmt_ts),
                        &snap.guardian_feedback,
                        snap.version,
                        fmt_ts(snap.created_at),
                        fmt_ts(snap.updated_at),
                    ],
                )?;
                snap.version
            }
            Some(actual) => {
                if actual != snap.version {
                    return Err(RepositoryError::OptimisticLockFailure {
                        entity: "CounselReport".to_string(),
                        id: snap.id.clone(),
                        expected: snap.version,
                        actual,
                    });
                }
                tx.execute(
                    r#"UPDATE counsel_report
                       SET counsel_reason = ?, counsel_content = ?,
                           center_feedback = ?, home_feedback = ?,
                           attachment_urls_json = ?, counselor_signature = ?,
                           status = ?, submitted_at = ?, reviewed_at = ?,
                           guardian_feedback = ?, version = version + 1, updated_at = ?
                       WHERE id = ? AND version = ?"#,
                    params![
                        &snap.counsel_reason,
                        &snap.counsel_content,
                        &snap.center_feedback,
                        &snap.home_feedback,
                        attachments_json,
                        &snap.counselor_signature,
                        snap.status.to_db_str(),
                        snap.submitted_at.map(fmt_ts),
                        snap.reviewed_at.map(fmt_ts),
                        &snap.guardian_feedback,
                        fmt_ts(snap.updated_at),
                        &snap.id,
                        snap.version,
                    ],
                )?;
                snap.version + 1
            }
        };

        tx.commit()?;
        Ok(new_version)
    }

    /// id 로 보고서 조회
    pub fn find_by_id(&self, id: &str) -> RepositoryResult<Option<CounselReport>> {
        let conn = self.get_conn()?;
        let raw = conn
            .query_row(
                &format!("SELECT {} FROM counsel_report WHERE id = ?", SELECT_COLUMNS),
                params![id],
                Self::map_row,
            )
            .optional()?;
        raw.map(Self::to_report).transpose()
    }

    /// (의뢰, 회기) 쌍으로 조회 (회기 중복 사전 검사용)
    pub fn find_by_request_and_session(
        &self,
        counsel_request_id: &str,
        session_number: i32,
    ) -> RepositoryResult<Option<CounselReport>> {
        let conn = self.get_conn()?;
        let raw = conn
            .query_row(
                &format!(
                    "SELECT {} FROM counsel_report
                     WHERE counsel_request_id = ? AND session_number = ?",
                    SELECT_COLUMNS
                ),
                params![counsel_request_id, session_number],
                Self::map_row,
            )
            .optional()?;
        raw.map(Self::to_report).transpose()
    }

    /// 의뢰별 보고서 목록 (회기 순)
    pub fn find_by_counsel_request_id(
        &self,
        counsel_request_id: &str,
    ) -> RepositoryResult<Vec<CounselReport>> {
        self.query_list(
            &format!(
                "SELECT {} FROM counsel_report
                 WHERE counsel_request_id = ? ORDER BY session_number ASC",
                SELECT_COLUMNS
            ),
            params![counsel_request_id],
        )
    }

    /// 아동별 보고서 목록
    pub fn find_by_child_id(&self, child_id: &str) -> RepositoryResult<Vec<CounselReport>> {
        self.query_list(
            &format!(
                "SELECT {} FROM counsel_report WHERE child_id = ? ORDER BY created_at DESC",
                SELECT_COLUMNS
            ),
            params![child_id],
        )
    }

    /// 상담사별 보고서 페이지 조회
    pub fn find_by_counselor_id(
        &self,
        counselor_id: &str,
        page: i64,
        limit: i64,
    ) -> RepositoryResult<Paginated<CounselReport>> {
        self.query_page(
            "counselor_id = ?",
            &[&counselor_id as &dyn rusqlite::ToSql],
            page,
            limit,
        )
    }

    /// 기관별 보고서 페이지 조회
    pub fn find_by_institution_id(
        &self,
        institution_id: &str,
        page: i64,
        limit: i64,
    ) -> RepositoryResult<Paginated<CounselReport>> {
        self.query_page(
            "institution_id = ?",
            &[&institution_id as &dyn rusqlite::ToSql],
            page,
            limit,
        )
    }

    /// 상태별 보고서 페이지 조회
    pub fn find_by_status(
        &self,
        status: CounselReportStatus,
        page: i64,
        limit: i64,
    ) -> RepositoryResult<Paginated<CounselReport>> {
        let status_str = status.to_db_str();
        self.query_page(
            "status = ?",
            &[&status_str as &dyn rusqlite::ToSql],
            page,
            limit,
        )
    }

    /// 보고서 삭제 (도메인 로직은 호출하지 않는 운영용 경로)
    pub fn delete(&self, id: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute("DELETE FROM counsel_report WHERE id = ?", params![id])?;
        Ok(())
    }

    /// 다음 회기 번호 (MAX + 1, 없으면 1)
    pub fn get_next_session_number(&self, counsel_request_id: &str) -> RepositoryResult<i32> {
        let conn = self.get_conn()?;
        let max: Option<i32> = conn.query_row(
            "SELECT MAX(session_number) FROM counsel_report WHERE counsel_request_id = ?",
            params![counsel_request_id],
            |row| row.get(0),
        )?;
        Ok(max.unwrap_or(0) + 1)
    }

    /// 의뢰별 보고서 건수
    pub fn count_by_counsel_request_id(&self, counsel_request_id: &str) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let count = conn.query_row(
            "SELECT COUNT(*) FROM counsel_report WHERE counsel_request_id = ?",
            params![counsel_request_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    // ==========================================
    // 내부 헬퍼
    // ==========================================

    fn query_list(
        &self,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> RepositoryResult<Vec<CounselReport>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(sql)?;
        let raws = stmt
            .query_map(params, Self::map_row)?
            .collect::<Result<Vec<_>, _>>()?;
        raws.into_iter().map(Self::to_report).collect()
    }

    fn query_page(
        &self,
        where_clause: &str,
        bind: &[&dyn rusqlite::ToSql],
        page: i64,
        limit: i64,
    ) -> RepositoryResult<Paginated<CounselReport>> {
        let page = page.max(1);
        let limit = limit.max(1);
        let offset = (page - 1) * limit;
        let conn = self.get_conn()?;

        let total: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM counsel_report WHERE {}", where_clause),
            rusqlite::params_from_iter(bind.iter()),
            |row| row.get(0),
        )?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM counsel_report WHERE {}
             ORDER BY created_at DESC LIMIT {} OFFSET {}",
            SELECT_COLUMNS, where_clause, limit, offset
        ))?;
        let raws = stmt
            .query_map(rusqlite::params_from_iter(bind.iter()), Self::map_row)?
            .collect::<Result<Vec<_>, _>>()?;
        let items = raws
            .into_iter()
            .map(Self::to_report)
            .collect::<RepositoryResult<Vec<_>>>()?;

        Ok(Paginated {
            items,
            total,
            page,
            limit,
        })
    }

    fn attachments_to_json(snap: &CounselReportSnapshot) -> RepositoryResult<String> {
        serde_json::to_string(&snap.attachment_urls).map_err(|e| {
            RepositoryError::FieldValueError {
                field: "attachment_urls_json".to_string(),
                message: format!("첨부 목록 직렬화 실패: {}", e),
            }
        })
    }

    fn map_row(row: &Row<'_>) -> rusqlite::Result<RawReportRow> {
        Ok(RawReportRow {
            id: row.get(0)?,
            counsel_request_id: row.get(1)?,
            child_id: row.get(2)?,
            counselor_id: row.get(3)?,
            institution_id: row.get(4)?,
            session_number: row.get(5)?,
            report_date: row.get(6)?,
            center_name: row.get(7)?,
            counselor_signature: row.get(8)?,
            counsel_reason: row.get(9)?,
            counsel_content: row.get(10)?,
            center_feedback: row.get(11)?,
            home_feedback: row.get(12)?,
            attachment_urls_json: row.get(13)?,
            status: row.get(14)?,
            submitted_at: row.get(15)?,
            reviewed_at: row.get(16)?,
            guardian_feedback: row.get(17)?,
            version: row.get(18)?,
            created_at: row.get(19)?,
            updated_at: row.get(20)?,
        })
    }

    fn to_report(raw: RawReportRow) -> RepositoryResult<CounselReport> {
        let status = CounselReportStatus::from_str(&raw.status).ok_or_else(|| {
            RepositoryError::FieldValueError {
                field: "status".to_string(),
                message: format!("알 수 없는 보고서 상태: {}", raw.status),
            }
        })?;
        let attachment_urls: Vec<String> = serde_json::from_str(&raw.attachment_urls_json)
            .map_err(|e| RepositoryError::FieldValueError {
                field: "attachment_urls_json".to_string(),
                message: format!("첨부 목록 역직렬화 실패: {}", e),
            })?;

        Ok(CounselReport::restore(CounselReportSnapshot {
            id: raw.id,
            counsel_request_id: raw.counsel_request_id,
            child_id: raw.child_id,
            counselor_id: raw.counselor_id,
            institution_id: raw.institution_id,
            session_number: raw.session_number,
            report_date: parse_date("report_date", &raw.report_date)?,
            center_name: raw.center_name,
            counselor_signature: raw.counselor_signature,
            counsel_reason: raw.counsel_reason,
            counsel_content: raw.counsel_content,
            center_feedback: raw.center_feedback,
            home_feedback: raw.home_feedback,
            attachment_urls,
            status,
            submitted_at: raw
                .submitted_at
                .as_deref()
                .map(|s| parse_ts("submitted_at", s))
                .transpose()?,
            reviewed_at: raw
                .reviewed_at
                .as_deref()
                .map(|s| parse_ts("reviewed_at", s))
                .transpose()?,
            guardian_feedback: raw.guardian_feedback,
            version: raw.version,
            created_at: parse_ts("created_at", &raw.created_at)?,
            updated_at: parse_ts("updated_at", &raw.updated_at)?,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::domain::counsel_report::NewCounselReport;
    use chrono::NaiveDate;

    fn setup_repo() -> CounselReportRepository {
        let conn = db::open_in_memory_connection().unwrap();
        db::init_schema(&conn).unwrap();
        CounselReportRepository::new(Arc::new(Mutex::new(conn)))
    }

    fn new_report(id: &str, request_id: &str, session: i32) -> CounselReport {
        CounselReport::create(NewCounselReport {
            id: id.to_string(),
            counsel_request_id: request_id.to_string(),
            child_id: "child-001".to_string(),
            counselor_id: Some("counselor-001".to_string()),
            institution_id: Some("inst-001".to_string()),
            session_number: session,
            report_date: NaiveDate::from_ymd_opt(2025, 4, 7).unwrap(),
            center_name: "행복지역아동센터".to_string(),
            counselor_signature: None,
            counsel_reason: "또래 갈등 상황에서의 정서 조절 어려움".to_string(),
            counsel_content: "감정 카드 활용 회기 진행".to_string(),
            center_feedback: None,
            home_feedback: None,
            attachment_urls: vec!["attachments/a.pdf".to_string()],
        })
        .unwrap()
    }

    #[test]
    fn test_save_and_roundtrip() {
        let repo = setup_repo();
        let report = new_report("report-001", "req-001", 1);
        repo.save(&report).unwrap();

        let loaded = repo.find_by_id("report-001").unwrap().unwrap();
        assert_eq!(loaded, report);
    }

    #[test]
    fn test_transition_persists_timestamps() {
        let repo = setup_repo();
        let report = new_report("report-001", "req-001", 1);
        repo.save(&report).unwrap();

        let mut loaded = repo.find_by_id("report-001").unwrap().unwrap();
        loaded.submit().unwrap();
        repo.save(&loaded).unwrap();

        let reloaded = repo.find_by_id("report-001").unwrap().unwrap();
        assert_eq!(reloaded.status(), CounselReportStatus::Submitted);
        assert!(reloaded.submitted_at().is_some());
    }

    #[test]
    fn test_unique_constraint_blocks_duplicate_session() {
        let repo = setup_repo();
        repo.save(&new_report("report-001", "req-001", 1)).unwrap();

        let err = repo.save(&new_report("report-002", "req-001", 1)).unwrap_err();
        assert!(matches!(err, RepositoryError::UniqueConstraintViolation(_)));
    }

    #[test]
    fn test_next_session_number() {
        let repo = setup_repo();
        assert_eq!(repo.get_next_session_number("req-001").unwrap(), 1);

        repo.save(&new_report("report-001", "req-001", 1)).unwrap();
        repo.save(&new_report("report-002", "req-001", 2)).unwrap();
        assert_eq!(repo.get_next_session_number("req-001").unwrap(), 3);
        assert_eq!(repo.count_by_counsel_request_id("req-001").unwrap(), 2);
    }

    #[test]
    fn test_find_by_request_orders_by_session() {
        let repo = setup_repo();
        repo.save(&new_report("report-002", "req-001", 2)).unwrap();
        repo.save(&new_report("report-001", "req-001", 1)).unwrap();

        let reports = repo.find_by_counsel_request_id("req-001").unwrap();
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].session_number(), 1);
        assert_eq!(reports[1].session_number(), 2);
    }

    #[test]
    fn test_paginated_queries() {
        let repo = setup_repo();
        for i in 1..=4 {
            repo.save(&new_report(&format!("report-{:03}", i), "req-001", i))
                .unwrap();
        }

        let by_counselor = repo.find_by_counselor_id("counselor-001", 1, 3).unwrap();
        assert_eq!(by_counselor.items.len(), 3);
        assert_eq!(by_counselor.total, 4);

        let by_status = repo
            .find_by_status(CounselReportStatus::Draft, 2, 3)
            .unwrap();
        assert_eq!(by_status.items.len(), 1);

        let by_institution = repo.find_by_institution_id("inst-001", 1, 10).unwrap();
        assert_eq!(by_institution.total, 4);
    }

    #[test]
    fn test_save_conflict_on_stale_version() {
        let repo = setup_repo();
        repo.save(&new_report("report-001", "req-001", 1)).unwrap();

        let mut first = repo.find_by_id("report-001").unwrap().unwrap();
        let mut second = repo.find_by_id("report-001").unwrap().unwrap();

        first.submit().unwrap();
        repo.save(&first).unwrap();

        second.submit().unwrap();
        let err = repo.save(&second).unwrap_err();
        assert!(matches!(err, RepositoryError::OptimisticLockFailure { .. }));
    }
}
