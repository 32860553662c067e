// ==========================================
// 아동 상담 의뢰 관리 시스템 - AI 기관 추천 포트
// ==========================================

use crate::domain::form_data::AssessmentSummary;
use crate::domain::types::CareType;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// 추천 요청 문맥 (의뢰 + 아동 + 검사 요약)
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationContext {
    pub counsel_request_id: String,
    pub child_id: String,
    pub care_type: CareType,
    pub center_name: String,
    pub psychological_summary: Option<String>,
    pub assessments: Vec<AssessmentSummary>,
}

/// 외부 서비스가 돌려주는 추천 후보 (점수 내림차순)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendedInstitution {
    pub institution_id: String,
    pub score: f64,  // 0~1
    pub reason: String,
}

/// AI 기관 추천 요청 포트
#[async_trait]
pub trait RecommendationClient: Send + Sync {
    /// 의뢰 문맥으로 후보 기관 목록 요청
    async fn request_recommendations(
        &self,
        context: &RecommendationContext,
    ) -> anyhow::Result<Vec<RecommendedInstitution>>;
}
