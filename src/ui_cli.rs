use std::io::Write;
use std::path::{Path, PathBuf};

use clap::Parser;

use crate::app::{AppError, RunArtifacts};
use crate::config::{Config, DEFAULT_CONFIG_PATH};
use crate::i18n::{keys, Translator};
use crate::report::{CorrectionSummary, LinearFit};

/// LI-600 기공 컨덕턴스 보정 (명령행).
#[derive(Debug, Parser)]
#[command(name = "gsw_correction_toolbox_cli", version)]
pub struct Cli {
    /// 보정할 CSV 파일 (LI-600 내보내기 또는 일반 CSV)
    pub input: PathBuf,

    /// 기공 분포 1~2 (1=한 면, 2=양면)
    #[arg(long)]
    pub sidedness: Option<f64>,

    /// 챔버 열 컨덕턴스 C [W/°C]
    #[arg(long = "thermal-conductance")]
    pub thermal_conductance: Option<f64>,

    /// 수렴 허용 잔차 [mol m-2 s-1]
    #[arg(long)]
    pub tolerance: Option<f64>,

    /// 레코드당 최대 뉴턴 반복 수
    #[arg(long = "max-iterations")]
    pub max_iterations: Option<usize>,

    /// 레코드를 순차적으로 보정한다
    #[arg(long)]
    pub sequential: bool,

    /// 비교 그래프 PNG도 저장한다
    #[arg(long)]
    pub plot: bool,

    /// 언어 (auto/ko/en)
    #[arg(long, short = 'L', default_value = "auto")]
    pub lang: String,

    /// 이번 실행의 옵션을 설정 파일에 저장한다
    #[arg(long = "save-config")]
    pub save_config: bool,

    /// 설정 파일 경로
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// 로그를 자세히 (-v: debug, -vv: trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// 경고 이상만 로그
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

impl Cli {
    /// 명령행 옵션을 설정 위에 덮어쓴다.
    pub fn apply_overrides(&self, cfg: &mut Config) {
        if let Some(v) = self.sidedness {
            cfg.correction.stomatal_sidedness = v;
        }
        if let Some(v) = self.thermal_conductance {
            cfg.correction.thermal_conductance = v;
        }
        if let Some(v) = self.tolerance {
            cfg.solver.tolerance = v;
        }
        if let Some(v) = self.max_iterations {
            cfg.solver.max_iterations = v;
        }
        if self.sequential {
            cfg.parallel = false;
        }
        if self.plot {
            cfg.write_plot = true;
        }
    }

    pub fn config_path(&self) -> &Path {
        &self.config
    }
}

fn fmt_opt(tr: &Translator, v: Option<f64>) -> String {
    v.map(|x| format!("{x:.4}"))
        .unwrap_or_else(|| tr.t(keys::SUMMARY_NONE))
}

fn fmt_fit(tr: &Translator, key: &str, fit: Option<&LinearFit>) -> String {
    match fit {
        Some(f) => tr.tf(
            key,
            &[("equation", f.equation()), ("r2", format!("{:.3}", f.r_squared))],
        ),
        None => tr.tf(
            key,
            &[("equation", tr.t(keys::SUMMARY_NONE)), ("r2", "-".into())],
        ),
    }
}

/// 실패 행 번호를 쉼표로 잇는다. 너무 길면 앞부분만 보여준다.
pub fn format_failed_rows(rows: &[usize], limit: usize) -> String {
    let shown: Vec<String> = rows.iter().take(limit).map(|r| r.to_string()).collect();
    let mut out = shown.join(", ");
    if rows.len() > limit {
        out.push_str(&format!(", … (+{})", rows.len() - limit));
    }
    out
}

/// 요약 본문을 쓴다.
pub fn write_summary<W: Write>(
    out: &mut W,
    tr: &Translator,
    cfg: &Config,
    summary: &CorrectionSummary,
) -> Result<(), AppError> {
    let b = &summary.batch;
    writeln!(out, "{}", tr.t(keys::SUMMARY_HEADING))?;
    writeln!(
        out,
        "{}",
        tr.tf(
            keys::SUMMARY_PARAMETERS,
            &[
                ("sidedness", cfg.correction.stomatal_sidedness.to_string()),
                ("conductance", cfg.correction.thermal_conductance.to_string()),
            ],
        )
    )?;
    writeln!(
        out,
        "{}",
        tr.tf(
            keys::SUMMARY_CONVERGED,
            &[("converged", b.converged.to_string()), ("total", b.total.to_string())],
        )
    )?;
    if b.converged < b.total {
        writeln!(
            out,
            "{}",
            tr.tf(
                keys::SUMMARY_BREAKDOWN,
                &[
                    ("not_converged", b.not_converged.to_string()),
                    ("rejected", b.rejected.to_string()),
                ],
            )
        )?;
    }
    let rows = if summary.failed_rows.is_empty() {
        tr.t(keys::SUMMARY_NONE)
    } else {
        format_failed_rows(&summary.failed_rows, 50)
    };
    writeln!(out, "{}", tr.tf(keys::SUMMARY_FAILED_ROWS, &[("rows", rows)]))?;
    writeln!(
        out,
        "{}",
        tr.tf(keys::SUMMARY_MEAN_RAW, &[("value", fmt_opt(tr, summary.mean_gsw_raw))])
    )?;
    writeln!(
        out,
        "{}",
        tr.tf(
            keys::SUMMARY_MEAN_CORRECTED,
            &[("value", fmt_opt(tr, summary.mean_gsw_corrected))],
        )
    )?;
    writeln!(out, "{}", fmt_fit(tr, keys::SUMMARY_GSW_FIT, summary.gsw_fit.as_ref()))?;
    writeln!(out, "{}", fmt_fit(tr, keys::SUMMARY_W_FIT, summary.w_chamber_fit.as_ref()))?;
    Ok(())
}

/// 실행 결과 전체(요약 + 출력 경로)를 표준 출력에 쓴다.
pub fn print_summary(tr: &Translator, cfg: &Config, run: &RunArtifacts) -> Result<(), AppError> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    write_summary(&mut out, tr, cfg, &run.outcome.summary)?;
    writeln!(
        out,
        "{}",
        tr.tf(keys::SUMMARY_OUTPUT, &[("path", run.output_path.display().to_string())])
    )?;
    match &run.plot_path {
        Some(p) => writeln!(
            out,
            "{}",
            tr.tf(keys::SUMMARY_PLOT, &[("path", p.display().to_string())])
        )?,
        None if cfg.write_plot => writeln!(out, "{}", tr.t(keys::SUMMARY_PLOT_SKIPPED))?,
        None => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_rows_are_truncated() {
        assert_eq!(format_failed_rows(&[1, 4, 9], 10), "1, 4, 9");
        assert_eq!(format_failed_rows(&[1, 2, 3, 4], 2), "1, 2, … (+2)");
    }

    #[test]
    fn flags_override_config() {
        let cli = Cli::parse_from([
            "gsw_correction_toolbox_cli",
            "data.csv",
            "--sidedness",
            "2",
            "--thermal-conductance",
            "0.01",
            "--max-iterations",
            "50",
            "--sequential",
            "--plot",
        ]);
        let mut cfg = Config::default();
        cli.apply_overrides(&mut cfg);
        assert_eq!(cfg.correction.stomatal_sidedness, 2.0);
        assert_eq!(cfg.correction.thermal_conductance, 0.01);
        assert_eq!(cfg.solver.max_iterations, 50);
        assert_eq!(cfg.solver.tolerance, 1e-9);
        assert!(!cfg.parallel);
        assert!(cfg.write_plot);
    }
}
