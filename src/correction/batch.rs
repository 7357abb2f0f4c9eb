use rayon::prelude::*;

use crate::correction::newton::SolverSettings;
use crate::correction::record::{CorrectionParameters, RecordInput};
use crate::correction::solver::{CorrectionModel, CorrectionResult};

/// 출력 테이블의 보정 상태 열 값.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorrectionStatus {
    Converged,
    NotConverged,
    InvalidInput,
}

impl CorrectionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CorrectionStatus::Converged => "converged",
            CorrectionStatus::NotConverged => "not_converged",
            CorrectionStatus::InvalidInput => "invalid_input",
        }
    }
}

/// 원본 테이블 뒤에 덧붙이는 보정 열 한 행.
///
/// 실패 행은 기존 내보내기 파일과 같은 방식으로 0을 채우고, `status`로 구분한다.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutputColumns {
    pub gsw_corrected: f64,
    pub t_in_c: f64,
    pub t_chamber_c: f64,
    pub t_out_c: f64,
    pub w_chamber: f64,
    pub stomatal_sidedness: f64,
    pub status: CorrectionStatus,
}

/// 배치 결과 요약.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BatchSummary {
    pub total: usize,
    pub converged: usize,
    pub not_converged: usize,
    pub rejected: usize,
}

/// 입력 순서를 그대로 유지한 레코드별 결과 모음.
#[derive(Debug, Clone)]
pub struct BatchReport {
    results: Vec<CorrectionResult>,
    columns: Vec<OutputColumns>,
    parameters: CorrectionParameters,
}

impl BatchReport {
    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn results(&self) -> &[CorrectionResult] {
        &self.results
    }

    pub fn columns(&self) -> &[OutputColumns] {
        &self.columns
    }

    pub fn parameters(&self) -> &CorrectionParameters {
        &self.parameters
    }

    pub fn converged_count(&self) -> usize {
        self.results.iter().filter(|r| r.converged()).count()
    }

    /// 수렴하지 못했거나 입력 결함으로 제외된 행의 0 기반 인덱스.
    pub fn failed_indices(&self) -> Vec<usize> {
        self.results
            .iter()
            .enumerate()
            .filter(|(_, r)| !r.converged())
            .map(|(i, _)| i)
            .collect()
    }

    pub fn summary(&self) -> BatchSummary {
        let mut s = BatchSummary {
            total: self.results.len(),
            ..Default::default()
        };
        for r in &self.results {
            match r {
                CorrectionResult::Converged(_) => s.converged += 1,
                CorrectionResult::NotConverged(_) => s.not_converged += 1,
                CorrectionResult::Rejected(_) => s.rejected += 1,
            }
        }
        s
    }
}

/// 모든 레코드에 솔버를 독립적으로 적용한다.
#[derive(Debug, Clone)]
pub struct BatchCorrector {
    model: CorrectionModel,
    settings: SolverSettings,
    parallel: bool,
}

impl BatchCorrector {
    pub fn new(model: CorrectionModel, settings: SolverSettings) -> Self {
        Self {
            model,
            settings,
            parallel: true,
        }
    }

    /// 레코드 간 의존성이 없으므로 병렬/순차 결과는 같다.
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn model(&self) -> &CorrectionModel {
        &self.model
    }

    pub fn correct(&self, inputs: &[RecordInput]) -> BatchReport {
        let solve_row = |input: &RecordInput| {
            let result = match input {
                Ok(record) => self.model.correct(record, &self.settings),
                Err(defect) => CorrectionResult::Rejected(defect.clone()),
            };
            let columns = self.output_columns(input, &result);
            (result, columns)
        };

        // par_iter().collect()는 입력 순서를 보존한다.
        let rows: Vec<(CorrectionResult, OutputColumns)> = if self.parallel {
            inputs.par_iter().map(solve_row).collect()
        } else {
            inputs.iter().map(solve_row).collect()
        };
        let (results, columns): (Vec<_>, Vec<_>) = rows.into_iter().unzip();

        let report = BatchReport {
            results,
            columns,
            parameters: *self.model.params(),
        };
        let summary = report.summary();
        log::info!(
            "{} / {} records converged (not converged: {}, rejected: {})",
            summary.converged,
            summary.total,
            summary.not_converged,
            summary.rejected
        );
        if summary.converged < summary.total {
            log::warn!("failed rows (0-based): {:?}", report.failed_indices());
        }
        report
    }

    fn output_columns(&self, input: &RecordInput, result: &CorrectionResult) -> OutputColumns {
        let sidedness = self.model.params().stomatal_sidedness;
        match (input, result) {
            (_, CorrectionResult::Converged(s)) => OutputColumns {
                gsw_corrected: s.gsw_corrected,
                t_in_c: input.as_ref().map(|r| r.t_in_c).unwrap_or_default(),
                t_chamber_c: s.t_chamber_c,
                t_out_c: s.t_out_c,
                w_chamber: s.w_chamber,
                stomatal_sidedness: sidedness,
                status: CorrectionStatus::Converged,
            },
            (Ok(record), CorrectionResult::NotConverged(_)) => {
                // T_out = E = gsw = 0 으로 채운 뒤 챔버 상태만 다시 유도한다.
                let (t_chamb, w_chamb) = self.model.chamber_state(record, 0.0);
                OutputColumns {
                    gsw_corrected: 0.0,
                    t_in_c: record.t_in_c,
                    t_chamber_c: t_chamb,
                    t_out_c: 0.0,
                    w_chamber: if w_chamb.is_finite() { w_chamb } else { 0.0 },
                    stomatal_sidedness: sidedness,
                    status: CorrectionStatus::NotConverged,
                }
            }
            // 파싱은 됐지만 검증에서 걸린 행도 T_in 은 원래 Tref 를 싣는다.
            _ => OutputColumns {
                gsw_corrected: 0.0,
                t_in_c: input
                    .as_ref()
                    .map(|r| r.t_in_c)
                    .ok()
                    .filter(|t| t.is_finite())
                    .unwrap_or_default(),
                t_chamber_c: 0.0,
                t_out_c: 0.0,
                w_chamber: 0.0,
                stomatal_sidedness: sidedness,
                status: CorrectionStatus::InvalidInput,
            },
        }
    }
}
