//! 미지수 3개짜리 비선형 연립방정식용 감쇠 뉴턴 솔버.
//! 야코비안은 전진 유한차분으로 만들고, 3×3 선형계는 부분 피벗 가우스 소거로 푼다.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 수렴 판정과 반복 한도를 담는다.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverSettings {
    /// 잔차 최대노름 허용값 (잔차 단위: mol/m²/s)
    ///
    /// 기본값 1e-9 mol/m²/s 는 기기 문서가 말하는 약 1e-6 수준보다 세 자릿수 엄격하다.
    /// 1e-6 mmol/m²/s, 곧 기기의 E 표시 분해능에 맞춘 값이다.
    pub tolerance: f64,
    /// 레코드당 최대 뉴턴 반복 수
    pub max_iterations: usize,
    /// 유한차분 상대 스텝
    pub fd_relative_step: f64,
    /// 잔차가 줄지 않을 때 스텝을 반으로 줄이는 최대 횟수.
    /// 다 줄여도 잔차가 줄지 않으면 [`SolveFailure::NoDescent`].
    pub max_backtracks: usize,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            tolerance: 1e-9,
            max_iterations: 100,
            fd_relative_step: 1e-7,
            max_backtracks: 8,
        }
    }
}

/// 근 찾기 실패 사유.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum SolveFailure {
    #[error("{iterations}회 반복 후에도 수렴하지 않음 (잔차 {residual_norm:.3e})")]
    IterationLimit { iterations: usize, residual_norm: f64 },
    #[error("야코비안이 특이 행렬임")]
    SingularJacobian,
    #[error("잔차가 유한하지 않음")]
    NonFiniteResidual,
    #[error("{iterations}회 반복에서 잔차를 줄이는 스텝을 찾지 못함 (잔차 {residual_norm:.3e})")]
    NoDescent { iterations: usize, residual_norm: f64 },
    /// 근은 찾았지만 총 컨덕턴스 g_tw 가 경계층 컨덕턴스 이상이어서 gsw 로 되돌릴 수 없다.
    #[error("총 컨덕턴스 {g_tw:.4} 가 경계층 컨덕턴스 이상임")]
    NonPhysicalRoot { g_tw: f64 },
}

/// 수렴한 근과 반복 정보.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NewtonSolution {
    pub x: [f64; 3],
    pub iterations: usize,
    pub residual_norm: f64,
}

/// 잔차 벡터의 최대노름.
pub fn max_norm(r: &[f64; 3]) -> f64 {
    r.iter().fold(0.0_f64, |m, v| m.max(v.abs()))
}

fn all_finite(v: &[f64; 3]) -> bool {
    v.iter().all(|x| x.is_finite())
}

/// `f(x) = 0` 을 x0 에서 출발해 푼다.
pub fn solve3<F>(f: F, x0: [f64; 3], settings: &SolverSettings) -> Result<NewtonSolution, SolveFailure>
where
    F: Fn([f64; 3]) -> [f64; 3],
{
    let mut x = x0;
    let mut fx = f(x);
    if !all_finite(&x) || !all_finite(&fx) {
        return Err(SolveFailure::NonFiniteResidual);
    }
    let mut norm = max_norm(&fx);

    for iter in 0..settings.max_iterations {
        log::trace!("newton iter={iter} x={x:?} |F|={norm:.3e}");
        if norm <= settings.tolerance {
            return Ok(NewtonSolution {
                x,
                iterations: iter,
                residual_norm: norm,
            });
        }

        let jac = fd_jacobian(&f, x, &fx, settings.fd_relative_step)?;
        let step = solve_linear3(jac, [-fx[0], -fx[1], -fx[2]])
            .ok_or(SolveFailure::SingularJacobian)?;

        // 잔차 최대노름이 줄어드는 첫 스텝만 받는다.
        let mut lambda = 1.0;
        let mut accepted = None;
        for _ in 0..=settings.max_backtracks {
            let trial = [
                x[0] + lambda * step[0],
                x[1] + lambda * step[1],
                x[2] + lambda * step[2],
            ];
            let ft = f(trial);
            if all_finite(&trial) && all_finite(&ft) {
                let n = max_norm(&ft);
                if n < norm {
                    accepted = Some((trial, ft, n));
                    break;
                }
            }
            lambda *= 0.5;
        }

        match accepted {
            Some((nx, nf, n)) => {
                x = nx;
                fx = nf;
                norm = n;
            }
            None => {
                log::trace!("no descent after {} halvings at iter={iter}", settings.max_backtracks);
                return Err(SolveFailure::NoDescent {
                    iterations: iter,
                    residual_norm: norm,
                });
            }
        }
    }

    if norm <= settings.tolerance {
        Ok(NewtonSolution {
            x,
            iterations: settings.max_iterations,
            residual_norm: norm,
        })
    } else {
        Err(SolveFailure::IterationLimit {
            iterations: settings.max_iterations,
            residual_norm: norm,
        })
    }
}

/// 전진 유한차분 야코비안. `jac[i][j] = ∂f_i/∂x_j`.
fn fd_jacobian<F>(
    f: &F,
    x: [f64; 3],
    fx: &[f64; 3],
    rel_step: f64,
) -> Result<[[f64; 3]; 3], SolveFailure>
where
    F: Fn([f64; 3]) -> [f64; 3],
{
    let mut jac = [[0.0; 3]; 3];
    for col in 0..3 {
        let h = rel_step * x[col].abs().max(1e-3);
        let mut xp = x;
        xp[col] += h;
        let fp = f(xp);
        if !all_finite(&fp) {
            return Err(SolveFailure::NonFiniteResidual);
        }
        for row in 0..3 {
            jac[row][col] = (fp[row] - fx[row]) / h;
        }
    }
    Ok(jac)
}

/// 부분 피벗 가우스 소거로 `a·x = b` 를 푼다. 특이하면 None.
fn solve_linear3(mut a: [[f64; 3]; 3], mut b: [f64; 3]) -> Option<[f64; 3]> {
    let scale = a
        .iter()
        .flat_map(|row| row.iter())
        .fold(0.0_f64, |m, v| m.max(v.abs()));
    if !scale.is_finite() || scale == 0.0 {
        return None;
    }
    let eps = f64::EPSILON * scale;

    for k in 0..3 {
        let pivot_row = (k..3).max_by(|&i, &j| a[i][k].abs().total_cmp(&a[j][k].abs()))?;
        if a[pivot_row][k].abs() <= eps {
            return None;
        }
        a.swap(k, pivot_row);
        b.swap(k, pivot_row);
        for i in (k + 1)..3 {
            let factor = a[i][k] / a[k][k];
            for j in k..3 {
                a[i][j] -= factor * a[k][j];
            }
            b[i] -= factor * b[k];
        }
    }

    let mut x = [0.0; 3];
    for i in (0..3).rev() {
        let tail: f64 = ((i + 1)..3).map(|j| a[i][j] * x[j]).sum();
        x[i] = (b[i] - tail) / a[i][i];
    }
    if all_finite(&x) {
        Some(x)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solves_linear_system_with_pivoting() {
        let a = [[0.0, 2.0, 1.0], [1.0, 1.0, 0.0], [3.0, 0.0, 1.0]];
        let x = solve_linear3(a, [7.0, 3.0, 6.0]).expect("non-singular");
        assert!((x[0] - 1.0).abs() < 1e-12, "{x:?}");
        assert!((x[1] - 2.0).abs() < 1e-12, "{x:?}");
        assert!((x[2] - 3.0).abs() < 1e-12, "{x:?}");
    }

    #[test]
    fn singular_matrix_is_rejected() {
        let a = [[1.0, 2.0, 3.0], [2.0, 4.0, 6.0], [0.0, 1.0, 1.0]];
        assert!(solve_linear3(a, [1.0, 2.0, 3.0]).is_none());
    }

    #[test]
    fn newton_finds_root_of_coupled_system() {
        let f = |x: [f64; 3]| {
            [
                x[0] * x[0] + x[1] * x[1] + x[2] * x[2] - 3.0,
                x[0] - x[1],
                x[1] * x[2] - 1.0,
            ]
        };
        let sol = solve3(f, [2.0, 1.5, 0.5], &SolverSettings::default()).expect("converges");
        for v in sol.x {
            assert!((v - 1.0).abs() < 1e-8, "{:?}", sol.x);
        }
        assert!(sol.residual_norm <= 1e-9);
        assert!(sol.iterations < 20);
    }

    #[test]
    fn already_converged_guess_takes_zero_iterations() {
        let f = |x: [f64; 3]| [x[0] - 1.0, x[1] - 2.0, x[2] - 3.0];
        let sol = solve3(f, [1.0, 2.0, 3.0], &SolverSettings::default()).expect("root");
        assert_eq!(sol.iterations, 0);
    }

    #[test]
    fn rank_deficient_system_reports_singular_jacobian() {
        let f = |x: [f64; 3]| [x[0] - 1.0, x[1] - 2.0, 5.0];
        let err = solve3(f, [0.0, 0.0, 1.0], &SolverSettings::default()).unwrap_err();
        assert_eq!(err, SolveFailure::SingularJacobian);
    }

    #[test]
    fn nan_at_initial_guess_is_reported() {
        let f = |x: [f64; 3]| [x[0].sqrt(), x[1], x[2]];
        let err = solve3(f, [-1.0, 0.0, 0.0], &SolverSettings::default()).unwrap_err();
        assert_eq!(err, SolveFailure::NonFiniteResidual);
    }

    #[test]
    fn iteration_cap_is_enforced() {
        let settings = SolverSettings {
            max_iterations: 2,
            ..Default::default()
        };
        // x0² + 1 = 0 에는 실근이 없다.
        let f = |x: [f64; 3]| [x[0] * x[0] + 1.0, x[1] - 1.0, x[2] - 1.0];
        let err = solve3(f, [3.0, 0.0, 0.0], &settings).unwrap_err();
        assert!(matches!(err, SolveFailure::IterationLimit { iterations: 2, .. }));
    }

    #[test]
    fn stalled_descent_is_reported_instead_of_accepting_uphill_steps() {
        // 실근이 없으면 결국 어떤 감쇠 스텝도 잔차를 줄이지 못한다.
        let f = |x: [f64; 3]| [x[0] * x[0] + 1.0, x[1] - 1.0, x[2] - 1.0];
        match solve3(f, [3.0, 0.0, 0.0], &SolverSettings::default()) {
            Err(SolveFailure::NoDescent { iterations, residual_norm }) => {
                assert!(iterations > 0 && iterations < 100, "{iterations}");
                assert!(residual_norm >= 1.0);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn default_tolerance_matches_display_resolution() {
        assert_eq!(SolverSettings::default().tolerance, 1e-9);
    }
}
