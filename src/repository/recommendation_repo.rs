// ==========================================
// 아동 상담 의뢰 관리 시스템 - 기관 추천 저장소
// ==========================================
// 책임: counsel_request_recommendation 테이블 CRUD/조회
// 제약: 추천 배치는 saveAll 로 단일 트랜잭션 저장
// ==========================================

use crate::domain::recommendation::CounselRequestRecommendation;
use crate::repository::codec::{fmt_ts, parse_ts};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

/// 조회 컬럼 목록 (map_row 와 순서 일치)
const SELECT_COLUMNS: &str =
    "id, counsel_request_id, institution_id, score, reason, rank_no, selected, created_at";

// ==========================================
// RecommendationRepository - 기관 추천 저장소
// ==========================================
pub struct RecommendationRepository {
    conn: Arc<Mutex<Connection>>,
}

impl RecommendationRepository {
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

    /// 추천 항목 단건 저장 (INSERT OR REPLACE)
    ///
    /// 추천 항목은 selected 플래그 외에는 불변이므로 id 기준 교체로 충분하다.
    pub fn save(&self, rec: &CounselRequestRecommendation) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        Self::upsert(&conn, rec)?;
        Ok(())
    }

    /// 추천 배치 저장 (단일 트랜잭션)
    pub fn save_all(&self, recs: &[CounselRequestRecommendation]) -> RepositoryResult<()> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;
        for rec in recs {
            Self::upsert(&tx, rec)?;
        }
        tx.commit()?;
        Ok(())
    }

    /// 의뢰별 추천 목록 (순위 순)
    pub fn find_by_counsel_request_id(
        &self,
        counsel_request_id: &str,
    ) -> RepositoryResult<Vec<CounselRequestRecommendation>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM counsel_request_recommendation
             WHERE counsel_request_id = ? ORDER BY rank_no ASC",
            SELECT_COLUMNS
        ))?;
        let raws = stmt
            .query_map(params![counsel_request_id], Self::map_row)?
            .collect::<Result<Vec<_>, _>>()?;
        raws.into_iter().map(Self::to_recommendation).collect()
    }

    /// id 로 추천 항목 조회
    pub fn find_by_id(&self, id: &str) -> RepositoryResult<Option<CounselRequestRecommendation>> {
        let conn = self.get_conn()?;
        let raw = conn
            .query_row(
                &format!(
                    "SELECT {} FROM counsel_request_recommendation WHERE id = ?",
                    SELECT_COLUMNS
                ),
                params![id],
                Self::map_row,
            )
            .optional()?;
        raw.map(Self::to_recommendation).transpose()
    }

    /// 의뢰별 선택된 추천 항목 조회
    pub fn find_selected_by_counsel_request_id(
        &self,
        counsel_request_id: &str,
    ) -> RepositoryResult<Option<CounselRequestRecommendation>> {
        let conn = self.get_conn()?;
        let raw = conn
            .query_row(
                &format!(
                    "SELECT {} FROM counsel_request_recommendation
                     WHERE counsel_request_id = ? AND selected = 1
                     ORDER BY rank_no ASC LIMIT 1",
                    SELECT_COLUMNS
                ),
                params![counsel_request_id],
                Self::map_row,
            )
            .optional()?;
        raw.map(Self::to_recommendation).transpose()
    }

    /// 의뢰별 추천 전체 삭제 (재추천 시 초기화)
    pub fn delete_by_counsel_request_id(&self, counsel_request_id: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "DELETE FROM counsel_request_recommendation WHERE counsel_request_id = ?",
            params![counsel_request_id],
        )?;
        Ok(())
    }

    // ==========================================
    // 내부 헬퍼
    // ==========================================

    fn upsert(conn: &Connection, rec: &CounselRequestRecommendation) -> RepositoryResult<()> {
        conn.execute(
            r#"INSERT OR REPLACE INTO counsel_request_recommendation (
                id, counsel_request_id, institution_id, score, reason,
                rank_no, selected, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)"#,
            params![
                &rec.id,
                &rec.counsel_request_id,
                &rec.institution_id,
                rec.score,
                &rec.reason,
                rec.rank,
                rec.selected,
                fmt_ts(rec.created_at),
            ],
        )?;
        Ok(())
    }

    fn map_row(row: &Row<'_>) -> rusqlite::Result<RawRecommendationRow> {
        Ok(RawRecommendationRow {
            id: row.get(0)?,
            counsel_request_id: row.get(1)?,
            institution_id: row.get(2)?,
            score: row.get(3)?,
            reason: row.get(4)?,
            rank: row.get(5)?,
            selected: row.get(6)?,
            created_at: row.get(7)?,
        })
    }

    fn to_recommendation(
        raw: RawRecommendationRow,
    ) -> RepositoryResult<CounselRequestRecommendation> {
        Ok(CounselRequestRecommendation {
            id: raw.id,
            counsel_request_id: raw.counsel_request_id,
            institution_id: raw.institution_id,
            score: raw.score,
            reason: raw.reason,
            rank: raw.rank,
            selected: raw.selected,
            created_at: parse_ts("created_at", &raw.created_at)?,
        })
    }
}

/// 행에서 추출한 원시 값
struct RawRecommendationRow {
    id: String,
    counsel_request_id: String,
    institution_id: String,
    score: f64,
    reason: String,
    rank: i32,
    selected: bool,
    created_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::domain::counsel_request::CounselRequest;
    use crate::domain::form_data::fixtures::valid_form;
    use crate::domain::recommendation::build_recommendation_batch;
    use crate::repository::CounselRequestRepository;

    fn setup() -> (RecommendationRepository, CounselRequestRepository) {
        let conn = db::open_in_memory_connection().unwrap();
        db::init_schema(&conn).unwrap();
        let conn = Arc::new(Mutex::new(conn));
        (
            RecommendationRepository::new(conn.clone()),
            CounselRequestRepository::new(conn),
        )
    }

    fn seed_request(request_repo: &CounselRequestRepository, id: &str) {
        let request = CounselRequest::create(id, "child-001", None, valid_form()).unwrap();
        request_repo.save(&request).unwrap();
    }

    #[test]
    fn test_save_all_and_find_in_rank_order() {
        let (repo, request_repo) = setup();
        seed_request(&request_repo, "req-001");

        let batch = build_recommendation_batch(
            "req-001",
            &[
                ("inst-1".to_string(), 0.95, "최적".to_string()),
                ("inst-2".to_string(), 0.81, "차선".to_string()),
                ("inst-3".to_string(), 0.60, "후보".to_string()),
            ],
        )
        .unwrap();
        repo.save_all(&batch).unwrap();

        let loaded = repo.find_by_counsel_request_id("req-001").unwrap();
        assert_eq!(loaded.len(), 3);
        assert_eq!(loaded[0].institution_id, "inst-1");
        assert_eq!(loaded[0].rank, 1);
        assert_eq!(loaded[2].rank, 3);
    }

    #[test]
    fn test_selected_lookup() {
        let (repo, request_repo) = setup();
        seed_request(&request_repo, "req-001");

        let mut batch = build_recommendation_batch(
            "req-001",
            &[
                ("inst-1".to_string(), 0.95, "최적".to_string()),
                ("inst-2".to_string(), 0.81, "차선".to_string()),
            ],
        )
        .unwrap();
        repo.save_all(&batch).unwrap();

        assert!(repo
            .find_selected_by_counsel_request_id("req-001")
            .unwrap()
            .is_none());

        batch[1].select();
        repo.save(&batch[1]).unwrap();

        let selected = repo
            .find_selected_by_counsel_request_id("req-001")
            .unwrap()
            .unwrap();
        assert_eq!(selected.institution_id, "inst-2");
        assert!(selected.selected);
    }

    #[test]
    fn test_delete_by_request() {
        let (repo, request_repo) = setup();
        seed_request(&request_repo, "req-001");

        let batch = build_recommendation_batch(
            "req-001",
            &[("inst-1".to_string(), 0.9, "사유".to_string())],
        )
        .unwrap();
        repo.save_all(&batch).unwrap();

        repo.delete_by_counsel_request_id("req-001").unwrap();
        assert!(repo
            .find_by_counsel_request_id("req-001")
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_foreign_key_requires_request_row() {
        let (repo, _request_repo) = setup();
        // 의뢰 행 없이 추천 저장은 외래키 위반
        let batch = build_recommendation_batch(
            "req-missing",
            &[("inst-1".to_string(), 0.9, "사유".to_string())],
        )
        .unwrap();
        assert!(repo.save_all(&batch).is_err());
    }
}
