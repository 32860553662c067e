// ==========================================
// 아동 상담 의뢰 관리 시스템 - SQLite 연결 초기화
// ==========================================
// 목표:
// - 모든 Connection::open 의 PRAGMA 동작 통일 (외래키 일부만 켜지는 상황 방지)
// - busy_timeout 통일로 동시 쓰기 시 산발적 busy 오류 완화
// - 스키마 생성 단일 진입점 (테스트/운영 공용)
// ==========================================

use rusqlite::Connection;
use std::time::Duration;

/// 기본 busy_timeout (밀리초)
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// SQLite 연결의 통일 PRAGMA 적용
///
/// - foreign_keys 는 연결마다 개별 활성화가 필요하다
/// - busy_timeout 도 연결마다 개별 설정이 필요하다
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// SQLite 연결을 열고 통일 설정 적용
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 메모리 연결 생성 (테스트용)
pub fn open_in_memory_connection() -> rusqlite::Result<Connection> {
    let conn = Connection::open_in_memory()?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 스키마 초기화
///
/// 모든 테이블/인덱스를 IF NOT EXISTS 로 생성한다. 운영 초기 구동과
/// 테스트 셋업이 같은 경로를 쓴다.
///
/// 유일성 제약:
/// - counsel_report (counsel_request_id, session_number): 회기 중복은
///   유스케이스 사전 검사에 더해 저장 계층에서도 차단된다
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS counsel_request (
            id                       TEXT PRIMARY KEY,
            child_id                 TEXT NOT NULL,
            guardian_id              TEXT,
            status                   TEXT NOT NULL,
            form_json                TEXT NOT NULL,
            center_name              TEXT NOT NULL,
            care_type                TEXT NOT NULL,
            request_date             TEXT NOT NULL,
            matched_institution_id   TEXT,
            matched_counselor_id     TEXT,
            integrated_report_s3_key TEXT,
            integrated_report_status TEXT,
            rejected_reason          TEXT,
            version                  INTEGER NOT NULL DEFAULT 0,
            created_at               TEXT NOT NULL,
            updated_at               TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_counsel_request_child
            ON counsel_request(child_id);
        CREATE INDEX IF NOT EXISTS idx_counsel_request_guardian
            ON counsel_request(guardian_id);
        CREATE INDEX IF NOT EXISTS idx_counsel_request_status
            ON counsel_request(status);

        CREATE TABLE IF NOT EXISTS counsel_request_recommendation (
            id                 TEXT PRIMARY KEY,
            counsel_request_id TEXT NOT NULL REFERENCES counsel_request(id) ON DELETE CASCADE,
            institution_id     TEXT NOT NULL,
            score              REAL NOT NULL,
            reason             TEXT NOT NULL,
            rank_no            INTEGER NOT NULL,
            selected           INTEGER NOT NULL DEFAULT 0,
            created_at         TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_recommendation_request
            ON counsel_request_recommendation(counsel_request_id);

        CREATE TABLE IF NOT EXISTS counsel_report (
            id                  TEXT PRIMARY KEY,
            counsel_request_id  TEXT NOT NULL,
            child_id            TEXT NOT NULL,
            counselor_id        TEXT,
            institution_id      TEXT,
            session_number      INTEGER NOT NULL,
            report_date         TEXT NOT NULL,
            center_name         TEXT NOT NULL,
            counselor_signature TEXT,
            counsel_reason      TEXT NOT NULL,
            counsel_content     TEXT NOT NULL,
            center_feedback     TEXT,
            home_feedback       TEXT,
            attachment_urls_json TEXT NOT NULL,
            status              TEXT NOT NULL,
            submitted_at        TEXT,
            reviewed_at         TEXT,
            guardian_feedback   TEXT,
            version             INTEGER NOT NULL DEFAULT 0,
            created_at          TEXT NOT NULL,
            updated_at          TEXT NOT NULL,
            UNIQUE (counsel_request_id, session_number)
        );

        CREATE INDEX IF NOT EXISTS idx_counsel_report_request
            ON counsel_report(counsel_request_id);
        CREATE INDEX IF NOT EXISTS idx_counsel_report_child
            ON counsel_report(child_id);

        CREATE TABLE IF NOT EXISTS consent_record (
            id           TEXT PRIMARY KEY,
            child_id     TEXT NOT NULL,
            guardian_id  TEXT,
            consent_type TEXT NOT NULL,
            state        TEXT NOT NULL,
            note         TEXT,
            recorded_at  TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_consent_record_child
            ON consent_record(child_id);

        CREATE TABLE IF NOT EXISTS psych_status_log (
            id          TEXT PRIMARY KEY,
            child_id    TEXT NOT NULL,
            level       TEXT NOT NULL,
            reason      TEXT,
            recorded_by TEXT,
            recorded_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_psych_status_child
            ON psych_status_log(child_id);
        "#,
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_schema_idempotent() {
        let conn = open_in_memory_connection().unwrap();
        init_schema(&conn).unwrap();
        // 재실행해도 오류 없어야 한다
        init_schema(&conn).unwrap();

        let table_count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name IN (
                    'counsel_request', 'counsel_request_recommendation',
                    'counsel_report', 'consent_record', 'psych_status_log')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(table_count, 5);
    }

    #[test]
    fn test_session_number_unique_constraint() {
        let conn = open_in_memory_connection().unwrap();
        init_schema(&conn).unwrap();

        let insert = r#"INSERT INTO counsel_report (
            id, counsel_request_id, child_id, session_number, report_date,
            center_name, counsel_reason, counsel_content, attachment_urls_json,
            status, version, created_at, updated_at
        ) VALUES (?, 'req-1', 'child-1', 1, '2025-04-07', '센터', '사유', '내용', '[]',
                  'DRAFT', 0, '2025-04-07T00:00:00Z', '2025-04-07T00:00:00Z')"#;

        conn.execute(insert, ["report-1"]).unwrap();
        let dup = conn.execute(insert, ["report-2"]);
        assert!(dup.is_err());
    }
}
