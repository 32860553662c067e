// ==========================================
// 상담 보고서 생명주기 E2E 테스트
// ==========================================
// 생성(회기 중복 차단) → 제출(상담사 소유권) → 검토/승인(보호자 권한,
// 피드백 게이트)을 API 파사드로 검증
// ==========================================


use chrono::NaiveDate;
use counsel_backend::use_cases::CreateCounselReportInput;
use counsel_backend::{CounselCaseApi, CounselReportStatus};
use test_helpers::*;

fn report_input(session: Option<i32>) -> CreateCounselReportInput {
    CreateCounselReportInput {
        counsel_request_id: "req-001".to_string(),
        child_id: "child-001".to_string(),
        counselor_id: Some("counselor-001".to_string()),
        institution_id: Some("institution-1".to_string()),
        session_number: session,
        report_date: NaiveDate::from_ymd_opt(2025, 4, 7).unwrap(),
        center_name: "행복지역아동센터".to_string(),
        counselor_signature: None,
        counsel_reason: "또래 갈등 상황에서의 정서 조절 어려움".to_string(),
        counsel_content: "감정 카드 활용 회기 진행, 분노 상황 재구성 연습".to_string(),
        center_feedback: Some("센터 내 또래 활동 관찰 요청".to_string()),
        home_feedback: None,
        attachment_urls: vec!["attachments/session-1/sheet.pdf".to_string()],
    }
}

fn create_report(api: &CounselCaseApi, session: Option<i32>) -> String {
    api.create_counsel_report(report_input(session)).unwrap().id
}

#[test]
fn test_report_lifecycle_happy_path() {
    let api = build_api();
    let report_id = create_report(&api, Some(1));

    let view = api.get_counsel_report(&report_id).unwrap();
    assert_eq!(view.status, CounselReportStatus::Draft);
    assert_eq!(view.session_number, 1);

    let submitted = api
        .submit_counsel_report(&report_id, "counselor-001")
        .unwrap();
    assert_eq!(submitted.status, CounselReportStatus::Submitted);
    assert!(submitted.submitted_at.is_some());

    let reviewed = api
        .review_counsel_report(&report_id, "guardian-001")
        .unwrap();
    assert_eq!(reviewed.status, CounselReportStatus::Reviewed);
    assert!(reviewed.reviewed_at.is_some());

    let approved = api
        .approve_counsel_report(&report_id, "guardian-001", "좋습니다")
        .unwrap();
    assert_eq!(approved.status, CounselReportStatus::Approved);
    assert_eq!(approved.guardian_feedback.as_deref(), Some("좋습니다"));

    // 전이가 언급하지 않는 필드는 그대로다
    assert_eq!(approved.counsel_reason, report_input(None).counsel_reason);
    assert_eq!(approved.attachment_urls.len(), 1);
}

#[test]
fn test_duplicate_session_conflict() {
    let api = build_api();
    create_report(&api, Some(1));

    let err = api.create_counsel_report(report_input(Some(1))).unwrap_err();
    assert_eq!(err.status, 409);
    assert_eq!(err.code, "DUPLICATE_SESSION_NUMBER");

    // 두 번째 행은 저장되지 않는다
    assert_eq!(api.list_counsel_reports("req-001").unwrap().len(), 1);
}

#[test]
fn test_auto_session_numbering() {
    let api = build_api();
    create_report(&api, None);
    let second_id = create_report(&api, None);

    let second = api.get_counsel_report(&second_id).unwrap();
    assert_eq!(second.session_number, 2);

    let reports = api.list_counsel_reports("req-001").unwrap();
    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0].session_number, 1);
    assert_eq!(reports[1].session_number, 2);
}

#[test]
fn test_submit_ownership_enforced() {
    let api = build_api();
    let report_id = create_report(&api, Some(1));

    let err = api
        .submit_counsel_report(&report_id, "counselor-999")
        .unwrap_err();
    assert_eq!(err.status, 403);
    assert_eq!(err.code, "UNAUTHORIZED");

    // 실패한 제출은 상태를 건드리지 않는다
    let view = api.get_counsel_report(&report_id).unwrap();
    assert_eq!(view.status, CounselReportStatus::Draft);
}

#[test]
fn test_guardian_authorization_on_review_and_approve() {
    let api = build_api();
    let report_id = create_report(&api, Some(1));
    api.submit_counsel_report(&report_id, "counselor-001")
        .unwrap();

    let err = api
        .review_counsel_report(&report_id, "guardian-999")
        .unwrap_err();
    assert_eq!(err.status, 403);

    api.review_counsel_report(&report_id, "guardian-001")
        .unwrap();

    let err = api
        .approve_counsel_report(&report_id, "guardian-999", "좋습니다")
        .unwrap_err();
    assert_eq!(err.status, 403);
}

#[test]
fn test_feedback_gate_and_forward_only_chain() {
    let api = build_api();
    let report_id = create_report(&api, Some(1));

    // 건너뜀 금지: DRAFT 에서의 검토/승인은 400
    let err = api
        .review_counsel_report(&report_id, "guardian-001")
        .unwrap_err();
    assert_eq!(err.status, 400);
    assert_eq!(err.code, "INVALID_STATUS_TRANSITION");

    api.submit_counsel_report(&report_id, "counselor-001")
        .unwrap();
    api.review_counsel_report(&report_id, "guardian-001")
        .unwrap();

    // 공백 피드백은 400 INVALID_FEEDBACK
    let err = api
        .approve_counsel_report(&report_id, "guardian-001", "   ")
        .unwrap_err();
    assert_eq!(err.status, 400);
    assert_eq!(err.code, "INVALID_FEEDBACK");

    api.approve_counsel_report(&report_id, "guardian-001", "좋습니다")
        .unwrap();

    // 재진입 금지: APPROVED → APPROVED 도 상태 전이 오류
    let err = api
        .approve_counsel_report(&report_id, "guardian-001", "다시 승인")
        .unwrap_err();
    assert_eq!(err.status, 400);
    assert_eq!(err.code, "INVALID_STATUS_TRANSITION");
}

#[test]
fn test_blank_content_rejected_on_create() {
    let api = build_api();
    let mut input = report_input(Some(1));
    input.counsel_content = "   ".to_string();

    let err = api.create_counsel_report(input).unwrap_err();
    assert_eq!(err.status, 400);
    assert_eq!(err.code, "MISSING_COUNSEL_CONTENT");
}
