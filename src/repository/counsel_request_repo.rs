// ==========================================
// 아동 상담 의뢰 관리 시스템 - 상담 의뢰 저장소
// ==========================================
// 책임: counsel_request 테이블 CRUD/조회
// 제약: save 는 version 컬럼 비교-교환. 충돌 시 OptimisticLockFailure
// ==========================================

use crate::domain::counsel_request::{CounselRequest, CounselRequestSnapshot};
use crate::domain::types::{CareType, CounselRequestStatus, IntegratedReportStatus};
use crate::repository::codec::{fmt_date, fmt_ts, parse_date, parse_ts};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::Paginated;
use chrono::{Duration, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

/// 조회 컬럼 목록 (map_row 와 순서 일치)
const SELECT_COLUMNS: &str = r#"id, child_id, guardian_id, status, form_json,
       center_name, care_type, request_date,
       matched_institution_id, matched_counselor_id,
       integrated_report_s3_key, integrated_report_status,
       rejected_reason, version, created_at, updated_at"#;

// ==========================================
// CounselRequestRepository - 상담 의뢰 저장소
// ==========================================
pub struct CounselRequestRepository {
    conn: Arc<Mutex<Connection>>,
}

/// 행에서 추출한 원시 값 (열거형/날짜 변환 전)
struct RawRequestRow {
    id: String,
    child_id: String,
    guardian_id: Option<String>,
    status: String,
    form_json: String,
    center_name: String,
    care_type: String,
    request_date: String,
    matched_institution_id: Option<String>,
    matched_counselor_id: Option<String>,
    integrated_report_s3_key: Option<String>,
    integrated_report_status: Option<String>,
    rejected_reason: Option<String>,
    version: i64,
    created_at: String,
    updated_at: String,
}

impl CounselRequestRepository {
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

    /// 의뢰 저장 (신규 INSERT 또는 비교-교환 UPDATE)
    ///
    /// # 동시성 제어
    /// 기존 행은 version 일치 시에만 갱신하고 version 을 1 올린다.
    /// 불일치 시 OptimisticLockFailure 를 반환한다.
    ///
    /// # 반환
    /// 저장 후 행의 version
    pub fn save(&self, request: &CounselRequest) -> RepositoryResult<i64> {
        let snap = request.snapshot();
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        let actual: Option<i64> = tx
            .query_row(
                "SELECT version FROM counsel_request WHERE id = ?",
                params![&snap.id],
                |row| row.get(0),
            )
            .optional()?;

        let new_version = match actual {
            None => {
                tx.execute(
                    r#"INSERT INTO counsel_request (
                        id, child_id, guardian_id, status, form_json,
                        center_name, care_type, request_date,
                        matched_institution_id, matched_counselor_id,
                        integrated_report_s3_key, integrated_report_status,
                        rejected_reason, version, created_at, updated_at
                    ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
                    params![
                        &snap.id,
                        &snap.child_id,
                        &snap.guardian_id,
                        snap.status.to_db_str(),
                        Self::form_to_json(&snap)?,
                        &snap.center_name,
                        snap.care_type.to_db_str(),
                        fmt_date(snap.request_date),
                        &snap.matched_institution_id,
                        &snap.matched_counselor_id,
                        &snap.integrated_report_s3_key,
                        snap.integrated_report_status.map(|s| s.to_db_str()),
                        &snap.rejected_reason,
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
                        entity: "CounselRequest".to_string(),
                        id: snap.id.clone(),
                        expected: snap.version,
                        actual,
                    });
                }
                tx.execute(
                    r#"UPDATE counsel_request
                       SET child_id = ?, guardian_id = ?, status = ?, form_json = ?,
                           center_name = ?, care_type = ?, request_date = ?,
                           matched_institution_id = ?, matched_counselor_id = ?,
                           integrated_report_s3_key = ?, integrated_report_status = ?,
                           rejected_reason = ?, version = version + 1, updated_at = ?
                       WHERE id = ? AND version = ?"#,
                    params![
                        &snap.child_id,
                        &snap.guardian_id,
                        snap.status.to_db_str(),
                        Self::form_to_json(&snap)?,
                        &snap.center_name,
                        snap.care_type.to_db_str(),
                        fmt_date(snap.request_date),
                        &snap.matched_institution_id,
                        &snap.matched_counselor_id,
                        &snap.integrated_report_s3_key,
                        snap.integrated_report_status.map(|s| s.to_db_str()),
                        &snap.rejected_reason,
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

    /// id 로 의뢰 조회
    pub fn find_by_id(&self, id: &str) -> RepositoryResult<Option<CounselRequest>> {
        let conn = self.get_conn()?;
        let raw = conn
            .query_row(
                &format!("SELECT {} FROM counsel_request WHERE id = ?", SELECT_COLUMNS),
                params![id],
                Self::map_row,
            )
            .optional()?;
        raw.map(Self::to_request).transpose()
    }

    /// 아동별 의뢰 목록
    pub fn find_by_child_id(&self, child_id: &str) -> RepositoryResult<Vec<CounselRequest>> {
        self.query_list(
            &format!(
                "SELECT {} FROM counsel_request WHERE child_id = ? ORDER BY created_at DESC",
                SELECT_COLUMNS
            ),
            params![child_id],
        )
    }

    /// 보호자별 의뢰 목록
    pub fn find_by_guardian_id(&self, guardian_id: &str) -> RepositoryResult<Vec<CounselRequest>> {
        self.query_list(
            &format!(
                "SELECT {} FROM counsel_request WHERE guardian_id = ? ORDER BY created_at DESC",
                SELECT_COLUMNS
            ),
            params![guardian_id],
        )
    }

    /// 상태별 의뢰 목록
    pub fn find_by_status(
        &self,
        status: CounselRequestStatus,
    ) -> RepositoryResult<Vec<CounselRequest>> {
        self.query_list(
            &format!(
                "SELECT {} FROM counsel_request WHERE status = ? ORDER BY created_at DESC",
                SELECT_COLUMNS
            ),
            params![status.to_db_str()],
        )
    }

    /// 매칭 기관별 의뢰 목록
    pub fn find_by_institution_id(
        &self,
        institution_id: &str,
    ) -> RepositoryResult<Vec<CounselRequest>> {
        self.query_list(
            &format!(
                "SELECT {} FROM counsel_request WHERE matched_institution_id = ? ORDER BY created_at DESC",
                SELECT_COLUMNS
            ),
            params![institution_id],
        )
    }

    /// 매칭 상담사별 의뢰 목록
    pub fn find_by_counselor_id(
        &self,
        counselor_id: &str,
    ) -> RepositoryResult<Vec<CounselRequest>> {
        self.query_list(
            &format!(
                "SELECT {} FROM counsel_request WHERE matched_counselor_id = ? ORDER BY created_at DESC",
                SELECT_COLUMNS
            ),
            params![counselor_id],
        )
    }

    /// 전체 의뢰 페이지 조회 (상태 필터 선택)
    pub fn find_all(
        &self,
        page: i64,
        limit: i64,
        status: Option<CounselRequestStatus>,
    ) -> RepositoryResult<Paginated<CounselRequest>> {
        let page = page.max(1);
        let limit = limit.max(1);
        let offset = (page - 1) * limit;
        let conn = self.get_conn()?;

        let (total, raws): (i64, Vec<RawRequestRow>) = match status {
            Some(status) => {
                let total = conn.query_row(
                    "SELECT COUNT(*) FROM counsel_request WHERE status = ?",
                    params![status.to_db_str()],
                    |row| row.get(0),
                )?;
                let mut stmt = conn.prepare(&format!(
                    "SELECT {} FROM counsel_request WHERE status = ?
                     ORDER BY created_at DESC LIMIT ? OFFSET ?",
                    SELECT_COLUMNS
                ))?;
                let raws = stmt
                    .query_map(params![status.to_db_str(), limit, offset], Self::map_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                (total, raws)
            }
            None => {
                let total =
                    conn.query_row("SELECT COUNT(*) FROM counsel_request", [], |row| row.get(0))?;
                let mut stmt = conn.prepare(&format!(
                    "SELECT {} FROM counsel_request ORDER BY created_at DESC LIMIT ? OFFSET ?",
                    SELECT_COLUMNS
                ))?;
                let raws = stmt
                    .query_map(params![limit, offset], Self::map_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                (total, raws)
            }
        };

        let items = raws
            .into_iter()
            .map(Self::to_request)
            .collect::<RepositoryResult<Vec<_>>>()?;

        Ok(Paginated {
            items,
            total,
            page,
            limit,
        })
    }

    /// 의뢰 삭제 (도메인 로직은 호출하지 않는 운영용 경로)
    pub fn delete(&self, id: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute("DELETE FROM counsel_request WHERE id = ?", params![id])?;
        Ok(())
    }

    /// 보호자별/상태별 건수
    pub fn count_by_guardian_id_and_status(
        &self,
        guardian_id: &str,
        status: CounselRequestStatus,
    ) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let count = conn.query_row(
            "SELECT COUNT(*) FROM counsel_request WHERE guardian_id = ? AND status = ?",
            params![guardian_id, status.to_db_str()],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// 보호자별 최근 N일 내 접수 의뢰
    pub fn find_recent_by_guardian_id(
        &self,
        guardian_id: &str,
        days: i64,
    ) -> RepositoryResult<Vec<CounselRequest>> {
        let cutoff = fmt_ts(Utc::now() - Duration::days(days));
        self.query_list(
            &format!(
                "SELECT {} FROM counsel_request
                 WHERE guardian_id = ? AND created_at >= ?
                 ORDER BY created_at DESC",
                SELECT_COLUMNS
            ),
            params![guardian_id, cutoff],
        )
    }

    // ==========================================
    // 내부 헬퍼
    // ==========================================

    fn query_list(
        &self,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> RepositoryResult<Vec<CounselRequest>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(sql)?;
        let raws = stmt
            .query_map(params, Self::map_row)?
            .collect::<Result<Vec<_>, _>>()?;
        raws.into_iter().map(Self::to_request).collect()
    }

    fn form_to_json(snap: &CounselRequestSnapshot) -> RepositoryResult<String> {
        serde_json::to_string(&snap.form).map_err(|e| RepositoryError::FieldValueError {
            field: "form_json".to_string(),
            message: format!("의뢰서 직렬화 실패: {}", e),
        })
    }

    fn map_row(row: &Row<'_>) -> rusqlite::Result<RawRequestRow> {
        Ok(RawRequestRow {
            id: row.get(0)?,
            child_id: row.get(1)?,
            guardian_id: row.get(2)?,
            status: row.get(3)?,
            form_json: row.get(4)?,
            center_name: row.get(5)?,
            care_type: row.get(6)?,
            request_date: row.get(7)?,
            matched_institution_id: row.get(8)?,
            matched_counselor_id: row.get(9)?,
            integrated_report_s3_key: row.get(10)?,
            integrated_report_status: row.get(11)?,
            rejected_reason: row.get(12)?,
            version: row.get(13)?,
            created_at: row.get(14)?,
            updated_at: row.get(15)?,
        })
    }

    fn to_request(raw: RawRequestRow) -> RepositoryResult<CounselRequest> {
        let status = CounselRequestStatus::from_str(&raw.status).ok_or_else(|| {
            RepositoryError::FieldValueError {
                field: "status".to_string(),
                message: format!("알 수 없는 의뢰 상태: {}", raw.status),
            }
        })?;
        let care_type =
            CareType::from_str(&raw.care_type).ok_or_else(|| RepositoryError::FieldValueError {
                field: "care_type".to_string(),
                message: format!("알 수 없는 보호 구분: {}", raw.care_type),
            })?;
        let integrated_report_status = raw
            .integrated_report_status
            .as_deref()
            .map(|s| {
                IntegratedReportStatus::from_str(s).ok_or_else(|| {
                    RepositoryError::FieldValueError {
                        field: "integrated_report_status".to_string(),
                        message: format!("알 수 없는 통합 보고서 상태: {}", s),
                    }
                })
            })
            .transpose()?;
        let form = serde_json::from_str(&raw.form_json).map_err(|e| {
            RepositoryError::FieldValueError {
                field: "form_json".to_string(),
                message: format!("의뢰서 역직렬화 실패: {}", e),
            }
        })?;

        Ok(CounselRequest::restore(CounselRequestSnapshot {
            id: raw.id,
            child_id: raw.child_id,
            guardian_id: raw.guardian_id,
            status,
            form,
            center_name: raw.center_name,
            care_type,
            request_date: parse_date("request_date", &raw.request_date)?,
            matched_institution_id: raw.matched_institution_id,
            matched_counselor_id: raw.matched_counselor_id,
            integrated_report_s3_key: raw.integrated_report_s3_key,
            integrated_report_status,
            rejected_reason: raw.rejected_reason,
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
    use crate::domain::form_data::fixtures::valid_form;

    fn setup_repo() -> CounselRequestRepository {
        let conn = db::open_in_memory_connection().unwrap();
        db::init_schema(&conn).unwrap();
        CounselRequestRepository::new(Arc::new(Mutex::new(conn)))
    }

    fn new_request(id: &str) -> CounselRequest {
        CounselRequest::create(id, "child-001", Some("guardian-001".to_string()), valid_form())
            .unwrap()
    }

    #[test]
    fn test_save_and_find_by_id_roundtrip() {
        let repo = setup_repo();
        let request = new_request("req-001");
        repo.save(&request).unwrap();

        let loaded = repo.find_by_id("req-001").unwrap().unwrap();
        assert_eq!(loaded, request);
    }

    #[test]
    fn test_find_by_id_missing_returns_none() {
        let repo = setup_repo();
        assert!(repo.find_by_id("req-none").unwrap().is_none());
    }

    #[test]
    fn test_save_update_bumps_version() {
        let repo = setup_repo();
        let request = new_request("req-001");
        repo.save(&request).unwrap();

        let mut loaded = repo.find_by_id("req-001").unwrap().unwrap();
        loaded.mark_as_recommended().unwrap();
        let new_version = repo.save(&loaded).unwrap();
        assert_eq!(new_version, loaded.version() + 1);

        let reloaded = repo.find_by_id("req-001").unwrap().unwrap();
        assert_eq!(reloaded.status(), CounselRequestStatus::Recommended);
        assert_eq!(reloaded.version(), new_version);
    }

    #[test]
    fn test_save_conflict_on_stale_version() {
        let repo = setup_repo();
        repo.save(&new_request("req-001")).unwrap();

        // 같은 행을 두 벌 적재해 각각 변경
        let mut first = repo.find_by_id("req-001").unwrap().unwrap();
        let mut second = repo.find_by_id("req-001").unwrap().unwrap();

        first.mark_as_recommended().unwrap();
        repo.save(&first).unwrap();

        second.reject(Some("중복 접수")).unwrap();
        let err = repo.save(&second).unwrap_err();
        assert!(matches!(
            err,
            RepositoryError::OptimisticLockFailure { .. }
        ));

        // 먼저 저장된 쪽이 유지된다
        let current = repo.find_by_id("req-001").unwrap().unwrap();
        assert_eq!(current.status(), CounselRequestStatus::Recommended);
    }

    #[test]
    fn test_find_by_status_and_count() {
        let repo = setup_repo();
        repo.save(&new_request("req-001")).unwrap();
        repo.save(&new_request("req-002")).unwrap();

        let mut third = new_request("req-003");
        third.mark_as_recommended().unwrap();
        repo.save(&third).unwrap();

        let pending = repo.find_by_status(CounselRequestStatus::Pending).unwrap();
        assert_eq!(pending.len(), 2);

        let count = repo
            .count_by_guardian_id_and_status("guardian-001", CounselRequestStatus::Pending)
            .unwrap();
        assert_eq!(count, 2);
    }

    #[test]
    fn test_find_all_pagination() {
        let repo = setup_repo();
        for i in 0..5 {
            repo.save(&new_request(&format!("req-{:03}", i))).unwrap();
        }

        let page1 = repo.find_all(1, 2, None).unwrap();
        assert_eq!(page1.items.len(), 2);
        assert_eq!(page1.total, 5);
        assert_eq!(page1.total_pages(), 3);

        let page3 = repo.find_all(3, 2, None).unwrap();
        assert_eq!(page3.items.len(), 1);

        let filtered = repo
            .find_all(1, 10, Some(CounselRequestStatus::Rejected))
            .unwrap();
        assert_eq!(filtered.total, 0);
    }

    #[test]
    fn test_find_recent_by_guardian_id() {
        let repo = setup_repo();
        repo.save(&new_request("req-001")).unwrap();

        let recent = repo.find_recent_by_guardian_id("guardian-001", 7).unwrap();
        assert_eq!(recent.len(), 1);

        let none = repo.find_recent_by_guardian_id("guardian-999", 7).unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn test_delete() {
        let repo = setup_repo();
        repo.save(&new_request("req-001")).unwrap();
        repo.delete("req-001").unwrap();
        assert!(repo.find_by_id("req-001").unwrap().is_none());
    }
}
