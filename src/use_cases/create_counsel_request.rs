// ==========================================
// 아동 상담 의뢰 관리 시스템 - 의뢰 접수 유스케이스
// ==========================================
// 책임: 의뢰 생성 + 접수 직후 외부 보강 (AI 기관 추천, 검사 문맥 보강)
// 원칙: 외부 보강은 최선 노력. 보강 실패는 로그만 남기고
//       이미 저장된 의뢰의 접수 성공을 되돌리지 않는다
// ==========================================

use crate::domain::counsel_request::CounselRequest;
use crate::domain::error::DomainResult;
use crate::domain::form_data::{AssessmentSummary, CounselRequestForm};
use crate::domain::recommendation::build_recommendation_batch;
use crate::external::{AssessmentResultClient, RecommendationClient, RecommendationContext};
use crate::repository::{CounselRequestRepository, RecommendationRepository};
use std::sync::Arc;
use uuid::Uuid;

/// 의뢰 접수 입력
#[derive(Debug, Clone)]
pub struct CreateCounselRequestInput {
    pub child_id: String,
    pub guardian_id: Option<String>,
    pub form: CounselRequestForm,
}

// ==========================================
// CreateCounselRequestUseCase
// ==========================================
pub struct CreateCounselRequestUseCase {
    request_repo: Arc<CounselRequestRepository>,
    recommendation_repo: Arc<RecommendationRepository>,
    recommendation_client: Arc<dyn RecommendationClient>,
    assessment_client: Arc<dyn AssessmentResultClient>,
}

impl CreateCounselRequestUseCase {
    /// 유스케이스 인스턴스 생성
    pub fn new(
        request_repo: Arc<CounselRequestRepository>,
        recommendation_repo: Arc<RecommendationRepository>,
        recommendation_client: Arc<dyn RecommendationClient>,
        assessment_client: Arc<dyn AssessmentResultClient>,
    ) -> Self {
        Self {
            request_repo,
            recommendation_repo,
            recommendation_client,
            assessment_client,
        }
    }

    /// 의뢰 접수
    ///
    /// 1. 의뢰서 검증 후 PENDING 의뢰 저장 (여기까지가 접수 성공의 기준)
    /// 2. 추천 문맥 구성 (검사 요약이 없으면 최신 채점 결과로 보강 시도)
    /// 3. AI 추천 요청 → 추천 배치 저장 → 의뢰를 RECOMMENDED 로 전이
    /// 2~3 단계의 실패는 잡아서 경고 로그로 남기고 접수 결과에 전파하지 않는다.
    pub async fn execute(&self, input: CreateCounselRequestInput) -> DomainResult<CounselRequest> {
        let id = Uuid::new_v4().to_string();
        let request =
            CounselRequest::create(&id, &input.child_id, input.guardian_id, input.form)?;
        self.request_repo.save(&request)?;
        tracing::info!(request_id = %id, child_id = %request.child_id(), "상담 의뢰 접수 완료");

        if let Err(e) = self.try_recommend(&id).await {
            tracing::warn!(
                request_id = %id,
                error = %e,
                "기관 추천 보강 실패, 의뢰는 PENDING 으로 유지"
            );
        }

        match self.request_repo.find_by_id(&id)? {
            Some(latest) => Ok(latest),
            None => Ok(request),
        }
    }

    /// 추천 보강 시도
    async fn try_recommend(&self, request_id: &str) -> anyhow::Result<()> {
        let mut request = self
            .request_repo
            .find_by_id(request_id)?
            .ok_or_else(|| anyhow::anyhow!("접수 직후 의뢰 재조회 실패: id={}", request_id))?;

        let context = self.build_context(&request).await;
        let candidates = self
            .recommendation_client
            .request_recommendations(&context)
            .await?;
        if candidates.is_empty() {
            tracing::info!(request_id = %request_id, "추천 후보 없음, PENDING 유지");
            return Ok(());
        }

        let ranked: Vec<(String, f64, String)> = candidates
            .iter()
            .map(|c| (c.institution_id.clone(), c.score, c.reason.clone()))
            .collect();
        let batch = build_recommendation_batch(request_id, &ranked)?;
        self.recommendation_repo.save_all(&batch)?;

        request.mark_as_recommended()?;
        self.request_repo.save(&request)?;
        tracing::info!(
            request_id = %request_id,
            candidates = batch.len(),
            "기관 추천 완료, RECOMMENDED 전이"
        );
        Ok(())
    }

    /// 추천 문맥 구성
    ///
    /// 의뢰서에 첨부 검사가 없으면 검사 결과 서비스의 최신 채점 결과로
    /// 보강한다. 조회 실패는 경고 로그 후 보강 없이 진행한다.
    async fn build_context(&self, request: &CounselRequest) -> RecommendationContext {
        let mut assessments: Vec<AssessmentSummary> = request
            .form()
            .test_results
            .as_ref()
            .map(|t| t.attached_assessments.clone())
            .unwrap_or_default();

        if !request.form().has_attached_assessments() {
            match self
                .assessment_client
                .find_latest_by_child_id(request.child_id())
                .await
            {
                Ok(Some(latest)) => {
                    assessments.push(AssessmentSummary {
                        assessment_type: latest.assessment_type,
                        score: Some(latest.score),
                        level: Some(latest.level),
                        summary_lines: vec![latest.summary],
                        expert_opinion: None,
                        key_findings: vec![],
                        recommendations: vec![],
                        confidence_score: None,
                    });
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(
                        child_id = %request.child_id(),
                        error = %e,
                        "검사 결과 조회 실패, 보강 없이 추천 진행"
                    );
                }
            }
        }

        RecommendationContext {
            counsel_request_id: request.id().to_string(),
            child_id: request.child_id().to_string(),
            care_type: request.care_type(),
            center_name: request.center_name().to_string(),
            psychological_summary: request.form().psychological_info.emotional_state.clone(),
            assessments,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::domain::form_data::fixtures::valid_form;
    use crate::domain::types::CounselRequestStatus;
    use crate::external::{LatestAssessment, RecommendedInstitution};
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct StubRecommendationClient {
        candidates: Vec<RecommendedInstitution>,
        fail: bool,
    }

    #[async_trait]
    impl RecommendationClient for StubRecommendationClient {
        async fn request_recommendations(
            &self,
            _context: &RecommendationContext,
        ) -> anyhow::Result<Vec<RecommendedInstitution>> {
            if self.fail {
                anyhow::bail!("추천 서비스 응답 없음");
            }
            Ok(self.candidates.clone())
        }
    }

    struct StubAssessmentClient {
        latest: Option<LatestAssessment>,
    }

    #[async_trait]
    impl AssessmentResultClient for StubAssessmentClient {
        async fn find_latest_by_child_id(
            &self,
            _child_id: &str,
        ) -> anyhow::Result<Option<LatestAssessment>> {
            Ok(self.latest.clone())
        }
    }

    fn setup(
        candidates: Vec<RecommendedInstitution>,
        fail: bool,
    ) -> (
        CreateCounselRequestUseCase,
        Arc<CounselRequestRepository>,
        Arc<RecommendationRepository>,
    ) {
        let conn = db::open_in_memory_connection().unwrap();
        db::init_schema(&conn).unwrap();
        let conn = Arc::new(Mutex::new(conn));
        let request_repo = Arc::new(CounselRequestRepository::new(conn.clone()));
        let recommendation_repo = Arc::new(RecommendationRepository::new(conn));

        let use_case = CreateCounselRequestUseCase::new(
            request_repo.clone(),
            recommendation_repo.clone(),
            Arc::new(StubRecommendationClient { candidates, fail }),
            Arc::new(StubAssessmentClient { latest: None }),
        );
        (use_case, request_repo, recommendation_repo)
    }

    fn two_candidates() -> Vec<RecommendedInstitution> {
        vec![
            RecommendedInstitution {
                institution_id: "inst-1".to_string(),
                score: 0.94,
                reason: "전문 분야 적합".to_string(),
            },
            RecommendedInstitution {
                institution_id: "inst-2".to_string(),
                score: 0.78,
                reason: "이동 거리 근접".to_string(),
            },
        ]
    }

    #[tokio::test]
    async fn test_create_with_recommendations() {
        let (use_case, _request_repo, recommendation_repo) = setup(two_candidates(), false);

        let created = use_case
            .execute(CreateCounselRequestInput {
                child_id: "child-001".to_string(),
                guardian_id: Some("guardian-001".to_string()),
                form: valid_form(),
            })
            .await
            .unwrap();

        assert_eq!(created.status(), CounselRequestStatus::Recommended);

        let recs = recommendation_repo
            .find_by_counsel_request_id(created.id())
            .unwrap();
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0].institution_id, "inst-1");
        assert_eq!(recs[0].rank, 1);
        assert!(recs.iter().all(|r| !r.selected));
    }

    #[tokio::test]
    async fn test_create_succeeds_even_if_recommendation_fails() {
        let (use_case, request_repo, recommendation_repo) = setup(vec![], true);

        let created = use_case
            .execute(CreateCounselRequestInput {
                child_id: "child-001".to_string(),
                guardian_id: None,
                form: valid_form(),
            })
            .await
            .unwrap();

        // 외부 실패에도 접수는 성공, PENDING 으로 저장 유지
        assert_eq!(created.status(), CounselRequestStatus::Pending);
        assert!(request_repo.find_by_id(created.id()).unwrap().is_some());
        assert!(recommendation_repo
            .find_by_counsel_request_id(created.id())
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_create_with_empty_candidates_stays_pending() {
        let (use_case, _request_repo, _recommendation_repo) = setup(vec![], false);

        let created = use_case
            .execute(CreateCounselRequestInput {
                child_id: "child-001".to_string(),
                guardian_id: None,
                form: valid_form(),
            })
            .await
            .unwrap();

        assert_eq!(created.status(), CounselRequestStatus::Pending);
    }

    #[tokio::test]
    async fn test_create_invalid_form_persists_nothing() {
        let (use_case, request_repo, _recommendation_repo) = setup(two_candidates(), false);

        let mut form = valid_form();
        form.cover_info.center_name = String::new();
        let err = use_case
            .execute(CreateCounselRequestInput {
                child_id: "child-001".to_string(),
                guardian_id: None,
                form,
            })
            .await
            .unwrap_err();
        assert!(err.message.contains("centerName"));

        let all = request_repo.find_all(1, 10, None).unwrap();
        assert_eq!(all.total, 0);
    }

    #[tokio::test]
    async fn test_assessment_backfill_enters_context() {
        // 검사 보강 경로: 의뢰서에 첨부 검사가 없어도 최신 채점 결과가
        // 추천 문맥에 포함된다 (여기서는 호출이 무사히 완료되는지 검증)
        let conn = db::open_in_memory_connection().unwrap();
        db::init_schema(&conn).unwrap();
        let conn = Arc::new(Mutex::new(conn));
        let request_repo = Arc::new(CounselRequestRepository::new(conn.clone()));
        let recommendation_repo = Arc::new(RecommendationRepository::new(conn));

        let use_case = CreateCounselRequestUseCase::new(
            request_repo,
            recommendation_repo.clone(),
            Arc::new(StubRecommendationClient {
                candidates: two_candidates(),
                fail: false,
            }),
            Arc::new(StubAssessmentClient {
                latest: Some(LatestAssessment {
                    assessment_type: "KPRC".to_string(),
                    score: 62.0,
                    level: "주의".to_string(),
                    summary: "불안 척도 상승".to_string(),
                }),
            }),
        );

        let created = use_case
            .execute(CreateCounselRequestInput {
                child_id: "child-001".to_string(),
                guardian_id: None,
                form: valid_form(),
            })
            .await
            .unwrap();
        assert_eq!(created.status(), CounselRequestStatus::Recommended);
    }
}
