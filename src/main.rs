// ==========================================
// 아동 상담 의뢰 관리 시스템 - 운영 진입점
// ==========================================
// 책임: 로그/설정 초기화, 데이터베이스 스키마 준비
// 전송 셸(HTTP)은 별도 배포 단위가 이 라이브러리를 조립해 사용한다
// ==========================================

use counsel_backend::config::ConfigManager;
use counsel_backend::{db, logging};

fn main() -> anyhow::Result<()> {
    // 로그 시스템 초기화
    logging::init();

    tracing::info!("==================================================");
    tracing::info!("{}", counsel_backend::APP_NAME);
    tracing::info!("시스템 버전: {}", counsel_backend::VERSION);
    tracing::info!("==================================================");

    // 설정 적재
    let config_manager = ConfigManager::new(ConfigManager::default_config_path());
    let config = config_manager.load()?;
    tracing::info!("데이터베이스 경로: {}", config.db_path);

    // 데이터베이스 연결 및 스키마 준비
    let conn = db::open_sqlite_connection(&config.db_path)?;
    db::init_schema(&conn)?;

    tracing::info!("데이터베이스 초기화 완료");
    Ok(())
}
