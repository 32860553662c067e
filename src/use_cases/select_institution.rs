// ==========================================
// 아동 상담 의뢰 관리 시스템 - 추천 기관 선택 유스케이스
// ==========================================
// 책임: 추천 항목 선택과 의뢰의 MATCHED 전이를 하나의 절차로 수행
// 절차 순서가 곧 교차 집계 정합성의 근거다: 추천 선택 표시를 먼저
// 영속화한 뒤 의뢰 전이를 저장한다
// ==========================================

use crate::domain::counsel_request::CounselRequest;
use crate::domain::error::{DomainError, DomainResult, ErrorCode};
use crate::domain::types::CounselRequestStatus;
use crate::repository::{CounselRequestRepository, RecommendationRepository};
use std::sync::Arc;

// ==========================================
// SelectRecommendedInstitutionUseCase
// ==========================================
pub struct SelectRecommendedInstitutionUseCase {
    request_repo: Arc<CounselRequestRepository>,
    recommendation_repo: Arc<RecommendationRepository>,
}

impl SelectRecommendedInstitutionUseCase {
    /// 유스케이스 인스턴스 생성
    pub fn new(
        request_repo: Arc<CounselRequestRepository>,
        recommendation_repo: Arc<RecommendationRepository>,
    ) -> Self {
        Self {
            request_repo,
            recommendation_repo,
        }
    }

    /// 추천 기관 선택
    ///
    /// 1. 의뢰 존재 + RECOMMENDED 상태 확인
    ///    (PENDING 에서의 선택은 부재 오류가 아니라 업무 규칙 오류)
    /// 2. 추천 목록 조회, 비어 있으면 "추천 먼저" 오류
    /// 3. 선택 기관이 추천 목록에 있는지 확인
    /// 4. 해당 추천 항목 select() 후 영속화
    /// 5. 의뢰 select_institution() 성공 시 영속화 (MATCHED)
    pub fn execute(
        &self,
        counsel_request_id: &str,
        institution_id: &str,
    ) -> DomainResult<CounselRequest> {
        let mut request = self
            .request_repo
            .find_by_id(counsel_request_id)?
            .ok_or_else(|| DomainError::request_not_found(counsel_request_id))?;

        if request.status() != CounselRequestStatus::Recommended {
            return Err(DomainError::invalid_transition(format!(
                "기관 선택은 RECOMMENDED 상태에서만 가능합니다 (현재: {})",
                request.status()
            )));
        }

        let mut recommendations = self
            .recommendation_repo
            .find_by_counsel_request_id(counsel_request_id)?;
        if recommendations.is_empty() {
            return Err(DomainError::new(
                ErrorCode::RecommendationNotFound,
                format!(
                    "추천 목록이 없습니다. 기관 추천을 먼저 수행하세요: request_id={}",
                    counsel_request_id
                ),
            ));
        }

        let target = recommendations
            .iter_mut()
            .find(|r| r.institution_id == institution_id)
            .ok_or_else(|| {
                DomainError::new(
                    ErrorCode::RecommendationNotFound,
                    format!(
                        "선택한 기관이 추천 목록에 없습니다: institution_id={}",
                        institution_id
                    ),
                )
            })?;

        target.select();
        self.recommendation_repo.save(target)?;

        request.select_institution(institution_id)?;
        self.request_repo.save(&request)?;

        tracing::info!(
            request_id = %counsel_request_id,
            institution_id = %institution_id,
            "추천 기관 선택 완료, MATCHED 전이"
        );
        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::domain::form_data::fixtures::valid_form;
    use crate::domain::recommendation::build_recommendation_batch;
    use std::sync::Mutex;

    struct Fixture {
        use_case: SelectRecommendedInstitutionUseCase,
        request_repo: Arc<CounselRequestRepository>,
        recommendation_repo: Arc<RecommendationRepository>,
    }

    fn setup() -> Fixture {
        let conn = db::open_in_memory_connection().unwrap();
        db::init_schema(&conn).unwrap();
        let conn = Arc::new(Mutex::new(conn));
        let request_repo = Arc::new(CounselRequestRepository::new(conn.clone()));
        let recommendation_repo = Arc::new(RecommendationRepository::new(conn));
        Fixture {
            use_case: SelectRecommendedInstitutionUseCase::new(
                request_repo.clone(),
                recommendation_repo.clone(),
            ),
            request_repo,
            recommendation_repo,
        }
    }

    /// RECOMMENDED 의뢰 + 3개 추천 준비
    fn seed_recommended(fx: &Fixture, request_id: &str) {
        let mut request =
            CounselRequest::create(request_id, "child-001", None, valid_form()).unwrap();
        request.mark_as_recommended().unwrap();
        fx.request_repo.save(&request).unwrap();

        let batch = build_recommendation_batch(
            request_id,
            &[
                ("institution-1".to_string(), 0.95, "1순위".to_string()),
                ("institution-2".to_string(), 0.82, "2순위".to_string()),
                ("institution-3".to_string(), 0.64, "3순위".to_string()),
            ],
        )
        .unwrap();
        fx.recommendation_repo.save_all(&batch).unwrap();
    }

    #[test]
    fn test_select_marks_one_and_matches_request() {
        let fx = setup();
        seed_recommended(&fx, "req-001");

        let updated = fx.use_case.execute("req-001", "institution-2").unwrap();
        assert_eq!(updated.status(), CounselRequestStatus::Matched);
        assert_eq!(updated.matched_institution_id(), Some("institution-2"));

        // 선택 플래그는 대상 1건만 true
        let recs = fx
            .recommendation_repo
            .find_by_counsel_request_id("req-001")
            .unwrap();
        let selected: Vec<_> = recs.iter().filter(|r| r.selected).collect();
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].institution_id, "institution-2");

        let stored = fx.request_repo.find_by_id("req-001").unwrap().unwrap();
        assert_eq!(stored.status(), CounselRequestStatus::Matched);
    }

    #[test]
    fn test_select_unlisted_institution_mutates_nothing() {
        let fx = setup();
        seed_recommended(&fx, "req-001");

        let err = fx.use_case.execute("req-001", "institution-99").unwrap_err();
        assert_eq!(err.code, ErrorCode::RecommendationNotFound);
        assert!(err.message.contains("institution-99"));

        // 의뢰/추천 모두 변경 없음
        let stored = fx.request_repo.find_by_id("req-001").unwrap().unwrap();
        assert_eq!(stored.status(), CounselRequestStatus::Recommended);
        let recs = fx
            .recommendation_repo
            .find_by_counsel_request_id("req-001")
            .unwrap();
        assert!(recs.iter().all(|r| !r.selected));
    }

    #[test]
    fn test_select_on_pending_is_business_error_not_not_found() {
        let fx = setup();
        let request = CounselRequest::create("req-001", "child-001", None, valid_form()).unwrap();
        fx.request_repo.save(&request).unwrap();

        let err = fx.use_case.execute("req-001", "institution-1").unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidStatusTransition);
    }

    #[test]
    fn test_select_missing_request_is_not_found() {
        let fx = setup();
        let err = fx.use_case.execute("req-none", "institution-1").unwrap_err();
        assert_eq!(err.code, ErrorCode::RequestNotFound);
        assert!(err.message.contains("req-none"));
    }

    #[test]
    fn test_select_without_recommendations_requires_recommend_first() {
        let fx = setup();
        let mut request =
            CounselRequest::create("req-001", "child-001", None, valid_form()).unwrap();
        request.mark_as_recommended().unwrap();
        fx.request_repo.save(&request).unwrap();

        let err = fx.use_case.execute("req-001", "institution-1").unwrap_err();
        assert_eq!(err.code, ErrorCode::RecommendationNotFound);
        assert!(err.message.contains("먼저"));
    }
}
