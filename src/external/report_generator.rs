// ==========================================
// 아동 상담 의뢰 관리 시스템 - 통합 보고서 생성 포트
// ==========================================

use crate::domain::form_data::AssessmentSummary;
use async_trait::async_trait;
use serde::Serialize;

/// 통합 보고서 생성 입력
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegratedReportInput {
    pub counsel_request_id: String,
    pub child_id: String,
    pub child_name: String,
    pub assessments: Vec<AssessmentSummary>,
}

/// 생성 결과 (저장 위치 키)
#[derive(Debug, Clone)]
pub struct GeneratedReport {
    pub s3_key: String,
}

/// 통합 보고서 생성 포트
#[async_trait]
pub trait IntegratedReportGenerator: Send + Sync {
    /// 의뢰/검사 문맥으로 결합 문서 생성
    async fn generate(&self, input: &IntegratedReportInput) -> anyhow::Result<GeneratedReport>;
}
