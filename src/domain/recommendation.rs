// ==========================================
// 아동 상담 의뢰 관리 시스템 - 기관 추천 엔티티
// ==========================================
// 용도: AI 추천 완료 시 후보 기관별로 한 건씩 일괄 생성
// 제약: select() 외에는 불변. "의뢰당 선택 1건" 불변식은
//       선택 유스케이스가 보장한다 (엔티티 단독으로는 강제 불가)
// ==========================================

use crate::domain::error::{DomainError, DomainResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// CounselRequestRecommendation - 추천 항목
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CounselRequestRecommendation {
    pub id: String,                 // 추천 항목 ID (UUID)
    pub counsel_request_id: String, // 소유 의뢰 참조
    pub institution_id: String,     // 후보 기관
    pub score: f64,                 // 적합도 점수 (0~1)
    pub reason: String,             // 추천 근거 (자유 서술)
    pub rank: i32,                  // 순위 (1 = 최적)
    pub selected: bool,             // 선택 여부 (기본 false)
    pub created_at: DateTime<Utc>,
}

impl CounselRequestRecommendation {
    /// 추천 항목 생성
    pub fn new(
        id: impl Into<String>,
        counsel_request_id: impl Into<String>,
        institution_id: impl Into<String>,
        score: f64,
        reason: impl Into<String>,
        rank: i32,
    ) -> DomainResult<Self> {
        if !(0.0..=1.0).contains(&score) {
            return Err(DomainError::invalid_form(format!(
                "추천 점수는 0과 1 사이여야 합니다: score={}",
                score
            )));
        }
        if rank < 1 {
            return Err(DomainError::invalid_form(format!(
                "추천 순위는 1 이상이어야 합니다: rank={}",
                rank
            )));
        }
        Ok(Self {
            id: id.into(),
            counsel_request_id: counsel_request_id.into(),
            institution_id: institution_id.into(),
            score,
            reason: reason.into(),
            rank,
            selected: false,
            created_at: Utc::now(),
        })
    }

    /// 선택 표시
    ///
    /// 대상 기관이 추천 목록에 포함되는지의 확인은 호출 유스케이스가 마친 뒤다.
    pub fn select(&mut self) {
        self.selected = true;
    }
}

/// 순위가 매겨진 후보 목록을 추천 배치로 변환
///
/// 입력 순서가 곧 순위다 (첫 번째 = rank 1). 점수/순위 검증에 실패하는
/// 항목이 하나라도 있으면 배치 전체가 실패한다.
pub fn build_recommendation_batch(
    counsel_request_id: &str,
    candidates: &[(String, f64, String)], // (institution_id, score, reason)
) -> DomainResult<Vec<CounselRequestRecommendation>> {
    candidates
        .iter()
        .enumerate()
        .map(|(idx, (institution_id, score, reason))| {
            CounselRequestRecommendation::new(
                uuid::Uuid::new_v4().to_string(),
                counsel_request_id,
                institution_id.clone(),
                *score,
                reason.clone(),
                (idx + 1) as i32,
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_defaults_unselected() {
        let rec = CounselRequestRecommendation::new(
            "rec-001",
            "req-001",
            "inst-001",
            0.92,
            "이동 거리와 전문 분야 적합",
            1,
        )
        .unwrap();
        assert!(!rec.selected);
        assert_eq!(rec.rank, 1);
    }

    #[test]
    fn test_score_out_of_range_fails() {
        assert!(
            CounselRequestRecommendation::new("r", "q", "i", 1.2, "사유", 1).is_err()
        );
        assert!(
            CounselRequestRecommendation::new("r", "q", "i", -0.1, "사유", 1).is_err()
        );
    }

    #[test]
    fn test_rank_must_be_positive() {
        assert!(CounselRequestRecommendation::new("r", "q", "i", 0.5, "사유", 0).is_err());
    }

    #[test]
    fn test_select_flips_flag() {
        let mut rec =
            CounselRequestRecommendation::new("r", "q", "i", 0.5, "사유", 2).unwrap();
        rec.select();
        assert!(rec.selected);
    }

    #[test]
    fn test_build_batch_assigns_ranks_in_order() {
        let batch = build_recommendation_batch(
            "req-001",
            &[
                ("inst-1".to_string(), 0.95, "최적".to_string()),
                ("inst-2".to_string(), 0.81, "차선".to_string()),
                ("inst-3".to_string(), 0.60, "후보".to_string()),
            ],
        )
        .unwrap();

        assert_eq!(batch.len(), 3);
        assert_eq!(batch[0].rank, 1);
        assert_eq!(batch[2].rank, 3);
        assert!(batch.iter().all(|r| !r.selected));
        assert!(batch.iter().all(|r| r.counsel_request_id == "req-001"));
    }
}
