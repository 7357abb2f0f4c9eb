use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::air::PsychrometricConstants;
use crate::config::{Config, ConfigError};
use crate::correction::{BatchCorrector, BatchReport, CorrectionModel, ParameterError, RecordInput};
use crate::io::{self, RawTable, TableError};
use crate::report::{self, ComparisonSeries, CorrectionSummary, PlotError};

/// 비교 그래프 PNG 크기 (픽셀).
pub const PLOT_SIZE: (u32, u32) = (1200, 600);

/// 애플리케이션 실행 중 발생 가능한 오류를 표현한다.
#[derive(Debug, Error)]
pub enum AppError {
    /// 파일 입출력 오류
    #[error("입출력 오류: {0}")]
    Io(#[from] std::io::Error),
    /// 설정 저장/로드 오류
    #[error("설정 오류: {0}")]
    Config(#[from] ConfigError),
    /// 측정 파일 읽기/쓰기 오류
    #[error("측정 파일 오류: {0}")]
    Table(#[from] TableError),
    /// 보정 파라미터 범위 오류
    #[error("보정 파라미터 오류: {0}")]
    Parameter(#[from] ParameterError),
    /// 그래프 저장 오류
    #[error("그래프 오류: {0}")]
    Plot(#[from] PlotError),
}

/// 파일 하나를 보정한 결과 묶음.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub table: RawTable,
    pub inputs: Vec<RecordInput>,
    pub report: BatchReport,
    pub series: ComparisonSeries,
    pub summary: CorrectionSummary,
}

impl RunOutcome {
    /// 보정 파일을 입력 파일 옆에 쓴다.
    pub fn write_corrected(&self, input_path: &Path) -> Result<PathBuf, AppError> {
        Ok(io::write_corrected_file(input_path, &self.table, &self.report)?)
    }

    /// 비교 그래프를 입력 파일 옆에 쓴다. 수렴한 레코드가 없으면 None.
    pub fn write_plot(&self, input_path: &Path) -> Result<Option<PathBuf>, AppError> {
        if self.series.is_empty() {
            log::warn!("no converged records, comparison plot skipped");
            return Ok(None);
        }
        let path = io::plot_path(input_path);
        report::render_comparison_png(&self.series, &path, PLOT_SIZE)?;
        Ok(Some(path))
    }
}

/// 설정에 맞는 배치 보정기를 만든다.
pub fn build_corrector(config: &Config) -> Result<BatchCorrector, AppError> {
    let model = CorrectionModel::new(PsychrometricConstants::LI600, config.correction)?;
    Ok(BatchCorrector::new(model, config.solver).parallel(config.parallel))
}

/// 이미 읽은 테이블을 보정한다.
pub fn correct_table(table: RawTable, config: &Config) -> Result<RunOutcome, AppError> {
    let corrector = build_corrector(config)?;
    let inputs = table.records();
    log::info!(
        "correcting {} records (sidedness {}, C {} W/°C)",
        inputs.len(),
        config.correction.stomatal_sidedness,
        config.correction.thermal_conductance
    );
    let report = corrector.correct(&inputs);
    let series = ComparisonSeries::from_report(&inputs, &report, corrector.model().constants());
    let summary = CorrectionSummary::new(&report, &series);
    Ok(RunOutcome {
        table,
        inputs,
        report,
        series,
        summary,
    })
}

/// 파일을 읽어 보정한다. 결과 파일은 쓰지 않는다.
pub fn correct_file(input_path: &Path, config: &Config) -> Result<RunOutcome, AppError> {
    let table = io::read_table(input_path)?;
    correct_table(table, config)
}

/// 출력까지 마친 실행 결과.
#[derive(Debug, Clone)]
pub struct RunArtifacts {
    pub outcome: RunOutcome,
    pub output_path: PathBuf,
    pub plot_path: Option<PathBuf>,
}

/// 읽기 → 보정 → 보정 파일 쓰기 → (설정 시) 그래프 저장.
pub fn run(input_path: &Path, config: &Config) -> Result<RunArtifacts, AppError> {
    let outcome = correct_file(input_path, config)?;
    let output_path = outcome.write_corrected(input_path)?;
    let plot_path = if config.write_plot {
        outcome.write_plot(input_path)?
    } else {
        None
    };
    Ok(RunArtifacts {
        outcome,
        output_path,
        plot_path,
    })
}
