//! 보정 전후 비교 요약과 그래프.

pub mod plot;
pub mod regression;

use crate::air::PsychrometricConstants;
use crate::correction::{BatchReport, BatchSummary, CorrectionResult, RecordInput};

pub use plot::{render_comparison_png, PlotError};
pub use regression::{linear_fit, LinearFit};

/// 수렴한 행만 모은 (보정 전, 보정 후) 점 모음.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComparisonSeries {
    /// (gsw 원본, gsw_corrected)
    pub gsw: Vec<(f64, f64)>,
    /// (입구 W, 보정된 챔버 W)
    pub w_chamber: Vec<(f64, f64)>,
}

impl ComparisonSeries {
    pub fn from_report(
        inputs: &[RecordInput],
        report: &BatchReport,
        constants: &PsychrometricConstants,
    ) -> Self {
        let mut series = Self::default();
        for (input, result) in inputs.iter().zip(report.results()) {
            if let (Ok(r), CorrectionResult::Converged(s)) = (input, result) {
                series.gsw.push((r.gsw_raw, s.gsw_corrected));
                let w_in = constants.mole_fraction(r.t_in_c, r.rh_in, r.p_atm_kpa);
                series.w_chamber.push((w_in, s.w_chamber));
            }
        }
        series
    }

    pub fn is_empty(&self) -> bool {
        self.gsw.is_empty()
    }
}

/// CLI/GUI에 보여줄 배치 요약.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrectionSummary {
    pub batch: BatchSummary,
    /// 실패 행 번호 (데이터 1행 = 1)
    pub failed_rows: Vec<usize>,
    pub mean_gsw_raw: Option<f64>,
    pub mean_gsw_corrected: Option<f64>,
    pub gsw_fit: Option<LinearFit>,
    pub w_chamber_fit: Option<LinearFit>,
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, n) = values
        .filter(|v| v.is_finite())
        .fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if n == 0 {
        None
    } else {
        Some(sum / n as f64)
    }
}

impl CorrectionSummary {
    pub fn new(report: &BatchReport, series: &ComparisonSeries) -> Self {
        Self {
            batch: report.summary(),
            failed_rows: report.failed_indices().into_iter().map(|i| i + 1).collect(),
            mean_gsw_raw: mean(series.gsw.iter().map(|p| p.0)),
            mean_gsw_corrected: mean(series.gsw.iter().map(|p| p.1)),
            gsw_fit: linear_fit(&series.gsw),
            w_chamber_fit: linear_fit(&series.w_chamber),
        }
    }
}
