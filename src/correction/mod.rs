//! 포로미터 보정 계산 모듈 모음.

pub mod batch;
pub mod newton;
pub mod record;
pub mod solver;

pub use batch::{BatchCorrector, BatchReport, BatchSummary, CorrectionStatus, OutputColumns};
pub use newton::{SolveFailure, SolverSettings};
pub use record::{CorrectionParameters, MeasurementRecord, ParameterError, RecordDefect, RecordInput};
pub use solver::{CorrectedState, CorrectionModel, CorrectionResult, IsothermalReference};
