// ==========================================
// 아동 상담 의뢰 관리 시스템 - 시스템 설정
// ==========================================
// 책임: JSON 설정 파일 적재/저장. 파일이 없으면 기본값으로 동작
// ==========================================

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// 시스템 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// 데이터베이스 파일 경로
    pub db_path: String,
    /// 목록 조회 기본 페이지 크기
    pub default_page_size: i64,
    /// 목록 조회 최대 페이지 크기
    pub max_page_size: i64,
    /// 보호자별 최근 의뢰 조회 기간 (일)
    pub recent_window_days: i64,
    /// AI 추천 서비스 엔드포인트
    pub recommendation_endpoint: Option<String>,
    /// 통합 보고서 생성기 엔드포인트
    pub report_generator_endpoint: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: "counsel_backend.db".to_string(),
            default_page_size: 20,
            max_page_size: 100,
            recent_window_days: 30,
            recommendation_endpoint: None,
            report_generator_endpoint: None,
        }
    }
}

// ==========================================
// ConfigManager - 설정 파일 관리자
// ==========================================
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// 지정 경로의 설정 관리자 생성
    pub fn new(config_path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: config_path.into(),
        }
    }

    /// 기본 설정 파일 경로 (데이터 디렉터리 하위)
    pub fn default_config_path() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("counsel-backend")
            .join("config.json")
    }

    /// 설정 적재 (파일이 없으면 기본값)
    pub fn load(&self) -> anyhow::Result<AppConfig> {
        if !self.config_path.exists() {
            tracing::info!(
                path = %self.config_path.display(),
                "설정 파일 없음, 기본값 사용"
            );
            return Ok(AppConfig::default());
        }
        let raw = fs::read_to_string(&self.config_path)?;
        let config: AppConfig = serde_json::from_str(&raw)?;
        Ok(config)
    }

    /// 설정 저장 (상위 디렉터리 생성 포함)
    pub fn save(&self, config: &AppConfig) -> anyhow::Result<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let raw = serde_json::to_string_pretty(config)?;
        fs::write(&self.config_path, raw)?;
        Ok(())
    }

    /// 설정 파일 경로
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }
}
