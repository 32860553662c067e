// ==========================================
// 아동 상담 의뢰 관리 시스템 - 저장 값 변환 공용 유틸
// ==========================================
// 책임: 타임스탬프/날짜의 저장 문자열 포맷 통일
// 형식: UTC 타임스탬프는 RFC3339(마이크로초, Z 표기)로 고정 폭 저장해
//       문자열 비교가 시간 순서와 일치하도록 한다. 날짜는 %Y-%m-%d
// ==========================================

use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};

/// UTC 타임스탬프 → 저장 문자열
pub(crate) fn fmt_ts(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// 저장 문자열 → UTC 타임스탬프
pub(crate) fn parse_ts(field: &str, s: &str) -> RepositoryResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::FieldValueError {
            field: field.to_string(),
            message: format!("타임스탬프 파싱 실패: {} ({})", s, e),
        })
}

/// 날짜 → 저장 문자열
pub(crate) fn fmt_date(d: NaiveDate) -> String {
    d.format("%Y-%m-%d").to_string()
}

/// 저장 문자열 → 날짜
pub(crate) fn parse_date(field: &str, s: &str) -> RepositoryResult<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| RepositoryError::FieldValueError {
        field: field.to_string(),
        message: format!("날짜 파싱 실패: {} ({})", s, e),
    })
}
