// ==========================================
// 아동 상담 의뢰 관리 시스템 - 통합 보고서 생성 유스케이스
// ==========================================
// 책임: 외부 생성기 호출과 의뢰의 생성 상태 추적
// 원칙: 생성 실패는 상태만 failed 로 남기고 연산 자체는 성공으로 끝난다
// ==========================================

use crate::domain::counsel_request::CounselRequest;
use crate::domain::error::{DomainError, DomainResult};
use crate::external::{IntegratedReportGenerator, IntegratedReportInput};
use crate::repository::CounselRequestRepository;
use std::sync::Arc;

// ==========================================
// RequestIntegratedReportUseCase
// ==========================================
pub struct RequestIntegratedReportUseCase {
    request_repo: Arc<CounselRequestRepository>,
    generator: Arc<dyn IntegratedReportGenerator>,
}

impl RequestIntegratedReportUseCase {
    /// 유스케이스 인스턴스 생성
    pub fn new(
        request_repo: Arc<CounselRequestRepository>,
        generator: Arc<dyn IntegratedReportGenerator>,
    ) -> Self {
        Self {
            request_repo,
            generator,
        }
    }

    /// 통합 보고서 생성 요청
    ///
    /// processing 표시를 먼저 저장한 뒤 생성기를 호출한다. 결과에 따라
    /// completed(S3 키 확보) 또는 failed 로 마감하며, 생성 실패가
    /// 의뢰 자체를 실패시키지는 않는다.
    pub async fn execute(&self, counsel_request_id: &str) -> DomainResult<CounselRequest> {
        let mut request = self.load(counsel_request_id)?;
        request.begin_integrated_report();
        self.request_repo.save(&request)?;

        let input = IntegratedReportInput {
            counsel_request_id: request.id().to_string(),
            child_id: request.child_id().to_string(),
            child_name: request.form().basic_info.child_info.name.clone(),
            assessments: request
                .form()
                .test_results
                .as_ref()
                .map(|t| t.attached_assessments.clone())
                .unwrap_or_default(),
        };

        match self.generator.generate(&input).await {
            Ok(generated) => {
                let mut latest = self.load(counsel_request_id)?;
                latest.complete_integrated_report(&generated.s3_key)?;
                self.request_repo.save(&latest)?;
                tracing::info!(
                    request_id = %counsel_request_id,
                    s3_key = %generated.s3_key,
                    "통합 보고서 생성 완료"
                );
                Ok(latest)
            }
            Err(e) => {
                tracing::warn!(
                    request_id = %counsel_request_id,
                    error = %e,
                    "통합 보고서 생성 실패"
                );
                let mut latest = self.load(counsel_request_id)?;
                latest.fail_integrated_report();
                self.request_repo.save(&latest)?;
                Ok(latest)
            }
        }
    }

    fn load(&self, counsel_request_id: &str) -> DomainResult<CounselRequest> {
        self.request_repo
            .find_by_id(counsel_request_id)?
            .ok_or_else(|| DomainError::request_not_found(counsel_request_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::domain::form_data::fixtures::valid_form;
    use crate::domain::types::IntegratedReportStatus;
    use crate::external::GeneratedReport;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct StubGenerator {
        fail: bool,
    }

    #[async_trait]
    impl IntegratedReportGenerator for StubGenerator {
        async fn generate(
            &self,
            input: &IntegratedReportInput,
        ) -> anyhow::Result<GeneratedReport> {
            if self.fail {
                anyhow::bail!("생성기 응답 없음");
            }
            Ok(GeneratedReport {
                s3_key: format!("reports/{}/integrated.pdf", input.counsel_request_id),
            })
        }
    }

    fn setup(fail: bool) -> (RequestIntegratedReportUseCase, Arc<CounselRequestRepository>) {
        let conn = db::open_in_memory_connection().unwrap();
        db::init_schema(&conn).unwrap();
        let repo = Arc::new(CounselRequestRepository::new(Arc::new(Mutex::new(conn))));
        (
            RequestIntegratedReportUseCase::new(repo.clone(), Arc::new(StubGenerator { fail })),
            repo,
        )
    }

    fn seed(repo: &CounselRequestRepository, id: &str) {
        let request = CounselRequest::create(id, "child-001", None, valid_form()).unwrap();
        repo.save(&request).unwrap();
    }

    #[tokio::test]
    async fn test_generation_success_records_key() {
        let (use_case, repo) = setup(false);
        seed(&repo, "req-001");

        let updated = use_case.execute("req-001").await.unwrap();
        assert_eq!(
            updated.integrated_report_status(),
            Some(IntegratedReportStatus::Completed)
        );
        assert_eq!(
            updated.integrated_report_s3_key(),
            Some("reports/req-001/integrated.pdf")
        );
    }

    #[tokio::test]
    async fn test_generation_failure_marks_failed_without_error() {
        let (use_case, repo) = setup(true);
        seed(&repo, "req-001");

        // 생성 실패는 오류가 아니라 failed 상태로 끝난다
        let updated = use_case.execute("req-001").await.unwrap();
        assert_eq!(
            updated.integrated_report_status(),
            Some(IntegratedReportStatus::Failed)
        );
        assert_eq!(updated.integrated_report_s3_key(), None);

        let stored = repo.find_by_id("req-001").unwrap().unwrap();
        assert_eq!(
            stored.integrated_report_status(),
            Some(IntegratedReportStatus::Failed)
        );
    }

    #[tokio::test]
    async fn test_missing_request_not_found() {
        let (use_case, _repo) = setup(false);
        assert!(use_case.execute("req-none").await.is_err());
    }
}
