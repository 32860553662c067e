// ==========================================
// 아동 상담 의뢰 관리 시스템 - 검사 결과 조회 포트
// ==========================================
// 용도: 접수 의뢰서에 검사 요약이 없을 때 최신 채점 결과로 추천 문맥 보강
// ==========================================

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// 아동의 최신 채점 검사 결과
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LatestAssessment {
    pub assessment_type: String, // 검사 유형 (KPRC / CRTES-R / SDQ-A 등)
    pub score: f64,
    pub level: String,
    pub summary: String,
}

/// 검사 결과 조회 포트
#[async_trait]
pub trait AssessmentResultClient: Send + Sync {
    /// 아동의 최신 채점 결과 조회 (없으면 None)
    async fn find_latest_by_child_id(
        &self,
        child_id: &str,
    ) -> anyhow::Result<Option<LatestAssessment>>;
}
