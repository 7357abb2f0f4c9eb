/// 최소제곱 직선 y = slope·x + intercept.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
    pub r_squared: f64,
    pub n: usize,
}

impl LinearFit {
    pub fn predict(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }

    /// 그래프 범례와 같은 형식의 식 문자열.
    pub fn equation(&self) -> String {
        format!("y = {:.2}x + {:.4}", self.slope, self.intercept)
    }
}

/// 유한한 점만 써서 직선을 맞춘다. 점이 2개 미만이거나 x 분산이 0이면 None.
pub fn linear_fit(points: &[(f64, f64)]) -> Option<LinearFit> {
    let pts: Vec<(f64, f64)> = points
        .iter()
        .copied()
        .filter(|(x, y)| x.is_finite() && y.is_finite())
        .collect();
    let n = pts.len();
    if n < 2 {
        return None;
    }
    let nf = n as f64;
    let mean_x = pts.iter().map(|p| p.0).sum::<f64>() / nf;
    let mean_y = pts.iter().map(|p| p.1).sum::<f64>() / nf;
    let sxx: f64 = pts.iter().map(|p| (p.0 - mean_x).powi(2)).sum();
    let sxy: f64 = pts.iter().map(|p| (p.0 - mean_x) * (p.1 - mean_y)).sum();
    if sxx <= f64::EPSILON * mean_x.abs().max(1.0) * nf {
        return None;
    }
    let slope = sxy / sxx;
    let intercept = mean_y - slope * mean_x;

    let ss_tot: f64 = pts.iter().map(|p| (p.1 - mean_y).powi(2)).sum();
    let ss_res: f64 = pts
        .iter()
        .map(|p| (p.1 - (slope * p.0 + intercept)).powi(2))
        .sum();
    let r_squared = if ss_tot > 0.0 { 1.0 - ss_res / ss_tot } else { 1.0 };

    Some(LinearFit {
        slope,
        intercept,
        r_squared,
        n,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_line_is_recovered() {
        let pts: Vec<(f64, f64)> = (0..10).map(|i| (i as f64, 0.8 * i as f64 + 0.02)).collect();
        let fit = linear_fit(&pts).expect("fit");
        assert!((fit.slope - 0.8).abs() < 1e-12);
        assert!((fit.intercept - 0.02).abs() < 1e-12);
        assert!((fit.r_squared - 1.0).abs() < 1e-12);
        assert_eq!(fit.equation(), "y = 0.80x + 0.0200");
    }

    #[test]
    fn non_finite_points_are_ignored() {
        let pts = [(0.0, 0.0), (f64::NAN, 3.0), (1.0, 2.0), (2.0, f64::INFINITY)];
        let fit = linear_fit(&pts).expect("two finite points");
        assert_eq!(fit.n, 2);
        assert!((fit.slope - 2.0).abs() < 1e-12);
    }

    #[test]
    fn degenerate_inputs() {
        assert!(linear_fit(&[(1.0, 1.0)]).is_none());
        assert!(linear_fit(&[(1.0, 1.0), (1.0, 2.0)]).is_none());
    }
}
