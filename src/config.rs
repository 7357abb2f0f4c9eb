use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::correction::{CorrectionParameters, SolverSettings};

/// 기본 설정 파일 경로.
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// 애플리케이션 설정을 표현한다. 빠진 항목은 기본값으로 채운다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 언어 코드 (auto/ko/en)
    pub language: String,
    /// 언어팩(TOML) 디렉터리
    pub lang_pack_dir: Option<String>,
    /// 레코드를 병렬로 보정할지 여부
    pub parallel: bool,
    /// 비교 그래프 PNG를 함께 저장할지 여부
    pub write_plot: bool,
    /// 배치 보정 파라미터 (sidedness, 열 컨덕턴스)
    pub correction: CorrectionParameters,
    /// 뉴턴 솔버 설정
    pub solver: SolverSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            language: "auto".into(),
            lang_pack_dir: None,
            parallel: true,
            write_plot: false,
            correction: CorrectionParameters::default(),
            solver: SolverSettings::default(),
        }
    }
}

/// 설정 로드/저장 시 발생 가능한 오류를 표현한다.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 파일 입출력 오류
    #[error("파일 입출력 오류: {0}")]
    Io(#[from] std::io::Error),
    /// TOML 역직렬화 오류
    #[error("설정 파싱 오류: {0}")]
    Parse(#[from] toml::de::Error),
    /// TOML 직렬화 오류
    #[error("설정 직렬화 오류: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// 설정 파일을 로드하거나 없으면 기본 설정을 생성한다.
pub fn load_or_default(path: &Path) -> Result<Config, ConfigError> {
    if path.exists() {
        let content = fs::read_to_string(path)?;
        let cfg: Config = toml::from_str(&content)?;
        log::debug!("config loaded from {}", path.display());
        Ok(cfg)
    } else {
        let cfg = Config::default();
        cfg.save_to(path)?;
        log::info!("default config written to {}", path.display());
        Ok(cfg)
    }
}

impl Config {
    /// 지정한 경로에 설정을 저장한다.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// 설정을 config.toml에 저장한다.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(Path::new(DEFAULT_CONFIG_PATH))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_falls_back_to_defaults() {
        let cfg: Config = toml::from_str("language = \"en\"\n[correction]\nstomatal_sidedness = 2.0\n")
            .expect("parse");
        assert_eq!(cfg.language, "en");
        assert_eq!(cfg.correction.stomatal_sidedness, 2.0);
        assert_eq!(
            cfg.correction.thermal_conductance,
            CorrectionParameters::DEFAULT_THERMAL_CONDUCTANCE
        );
        assert_eq!(cfg.solver, SolverSettings::default());
        assert!(cfg.parallel);
        assert!(!cfg.write_plot);
    }

    #[test]
    fn default_config_serializes_back() {
        let text = toml::to_string_pretty(&Config::default()).expect("serialize");
        let back: Config = toml::from_str(&text).expect("parse");
        assert_eq!(back, Config::default());
    }
}
