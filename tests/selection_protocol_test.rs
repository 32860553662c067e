// ==========================================
// 추천 기관 선택 프로토콜 테스트
// ==========================================
// 선택 절차의 경계 사례: 목록 밖 기관, PENDING 선택, 부재 의뢰
// ==========================================


use counsel_backend::use_cases::CreateCounselRequestInput;
use counsel_backend::{CounselCaseApi, CounselRequestStatus};
use std::sync::Arc;
use test_helpers::*;

async fn create_request(api: &CounselCaseApi) -> String {
    api.create_counsel_request(CreateCounselRequestInput {
        child_id: "child-001".to_string(),
        guardian_id: Some("guardian-001".to_string()),
        form: sample_form(),
    })
    .await
    .unwrap()
    .id
}

#[tokio::test]
async fn test_select_institution_not_in_list_mutates_nothing() {
    let api = build_api();
    let request_id = create_request(&api).await;

    let err = api
        .select_recommended_institution(&request_id, "institution-99")
        .unwrap_err();
    assert_eq!(err.status, 404);
    assert_eq!(err.code, "RECOMMENDATION_NOT_FOUND");

    // 의뢰도 추천도 변경 없음
    let view = api.get_counsel_request(&request_id).unwrap();
    assert_eq!(view.status, CounselRequestStatus::Recommended);
    assert!(api
        .list_recommendations(&request_id)
        .unwrap()
        .iter()
        .all(|r| !r.selected));
}

#[tokio::test]
async fn test_select_while_pending_is_business_error() {
    // 추천 서비스 장애로 PENDING 에 머무른 의뢰
    let api = CounselCaseApi::new(
        test_connection(),
        Arc::new(StubRecommendationClient {
            candidates: vec![],
            fail: true,
        }),
        Arc::new(StubAssessmentClient { latest: None }),
        Arc::new(StubReportGenerator { fail: false }),
        Arc::new(PairGuardianAuth {
            guardian_id: "guardian-001",
            child_id: "child-001",
        }),
    );
    let request_id = create_request(&api).await;

    // 부재(404)가 아니라 업무 규칙 오류(400)
    let err = api
        .select_recommended_institution(&request_id, "institution-1")
        .unwrap_err();
    assert_eq!(err.status, 400);
    assert_eq!(err.code, "INVALID_STATUS_TRANSITION");
}

#[test]
fn test_select_missing_request_is_not_found() {
    let api = build_api();
    let err = api
        .select_recommended_institution("req-none", "institution-1")
        .unwrap_err();
    assert_eq!(err.status, 404);
    assert_eq!(err.code, "REQUEST_NOT_FOUND");
}

#[tokio::test]
async fn test_reselect_after_match_is_rejected() {
    let api = build_api();
    let request_id = create_request(&api).await;

    api.select_recommended_institution(&request_id, "institution-1")
        .unwrap();

    // MATCHED 이후의 재선택은 상태 전이 오류, 기존 선택은 유지
    let err = api
        .select_recommended_institution(&request_id, "institution-2")
        .unwrap_err();
    assert_eq!(err.status, 400);

    let recs = api.list_recommendations(&request_id).unwrap();
    let selected: Vec<_> = recs.iter().filter(|r| r.selected).collect();
    assert_eq!(selected.len(), 1);
    assert_eq!(selected[0].institution_id, "institution-1");
}
