//! 레코드 한 건에 대한 챔버 보정 계산.
//!
//! 입구/출구 공기 온도가 같다는 기기 가정을 풀고, 출구 온도 T_out·증산량 E·
//! 기공 컨덕턴스 gsw 세 미지수를 물질/에너지 수지 3식으로 동시에 푼다.
//!
//! ```text
//! R1: E - g_tw·(W_leaf - W_chamb)                    = 0  (기공+경계층 물질수지)
//! R2: E - s⁻¹·u_in·(W_out - W_in)/(1 - W_out)        = 0  (챔버 물질수지)
//! R3: E - s⁻¹·((Q + u_in·h_in)/h_out - u_in)         = 0  (챔버 에너지수지)
//! ```
//!
//! W_out, h_out은 의도적으로 T_in에서 평가한다(출구 혼합 가정).
//!
//! 뉴턴 반복은 gsw 대신 총 컨덕턴스 g_tw = gsw·gbw/(gsw + gbw) 로 푼다. R1 이 g_tw 에
//! 선형이라 증기압 구배가 0 에 가까운 초기점에서도 야코비안이 퇴화하지 않는다.
//! 수렴 후 gsw = g_tw·gbw/(gbw - g_tw) 로 되돌리며, g_tw ≥ gbw 인 근은 거부한다.

use crate::air::PsychrometricConstants;
use crate::correction::newton::{self, SolveFailure, SolverSettings};
use crate::correction::record::{
    CorrectionParameters, MeasurementRecord, ParameterError, RecordDefect,
};

/// 수렴한 보정 결과.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CorrectedState {
    /// 출구 공기 온도 [°C]
    pub t_out_c: f64,
    /// 챔버 공기 온도 0.5·(T_in + T_out) [°C]
    pub t_chamber_c: f64,
    /// 챔버 수증기 몰분율 [mol/mol]
    pub w_chamber: f64,
    /// 증산량 E [mol/m²/s]
    pub transpiration: f64,
    /// 한 면 기준 기공 컨덕턴스 [mol/m²/s]
    pub gsw_one_sided: f64,
    /// sidedness를 곱한 보고용 컨덕턴스 [mol/m²/s]
    pub gsw_corrected: f64,
    pub iterations: usize,
    pub residual_norm: f64,
}

/// 레코드별 보정 결과. 실패를 0 값으로 숨기지 않고 태그로 구분한다.
#[derive(Debug, Clone, PartialEq)]
pub enum CorrectionResult {
    Converged(CorrectedState),
    NotConverged(SolveFailure),
    Rejected(RecordDefect),
}

impl CorrectionResult {
    pub fn converged(&self) -> bool {
        matches!(self, CorrectionResult::Converged(_))
    }

    pub fn state(&self) -> Option<&CorrectedState> {
        match self {
            CorrectionResult::Converged(s) => Some(s),
            _ => None,
        }
    }
}

/// 기기가 쓰는 등온(T_out = T_in) 물질수지 결과. 보정 전 값과의 비교 기준.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IsothermalReference {
    pub transpiration: f64,
    pub w_chamber: f64,
    pub gsw_one_sided: f64,
    pub gsw_total: f64,
}

/// 상수와 배치 파라미터를 묶은 보정 모델. 생성 후에는 읽기 전용이다.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CorrectionModel {
    constants: PsychrometricConstants,
    params: CorrectionParameters,
}

impl CorrectionModel {
    pub fn new(
        constants: PsychrometricConstants,
        params: CorrectionParameters,
    ) -> Result<Self, ParameterError> {
        params.validate()?;
        Ok(Self { constants, params })
    }

    pub fn constants(&self) -> &PsychrometricConstants {
        &self.constants
    }

    pub fn params(&self) -> &CorrectionParameters {
        &self.params
    }

    /// 초기 추정값 (T_in - 0.1, E_apparent, 0.75·gsw_raw).
    pub fn initial_guess(&self, r: &MeasurementRecord) -> [f64; 3] {
        [r.t_in_c - 0.1, r.e_apparent, 0.75 * r.gsw_raw]
    }

    /// 챔버 상태 (T_chamb, W_chamb). RH_chamb는 입·출구 평균.
    pub fn chamber_state(&self, r: &MeasurementRecord, t_out_c: f64) -> (f64, f64) {
        let t_chamb = 0.5 * (r.t_in_c + t_out_c);
        let rh_chamb = 0.5 * (r.rh_in + r.rh_out);
        let w_chamb = self.constants.mole_fraction(t_chamb, rh_chamb, r.p_atm_kpa);
        (t_chamb, w_chamb)
    }

    /// 잔차 (R1, R2, R3) [mol/m²/s]. `x = [T_out, E, gsw]`.
    pub fn residuals(&self, r: &MeasurementRecord, x: [f64; 3]) -> [f64; 3] {
        let [t_out, e, gsw] = x;
        self.residuals_total(r, [t_out, e, self.total_conductance(gsw)])
    }

    /// 기공과 경계층을 직렬로 합친 총 컨덕턴스 g_tw.
    pub fn total_conductance(&self, gsw: f64) -> f64 {
        let gbw = self.constants.gbw;
        gsw * gbw / (gsw + gbw)
    }

    /// g_tw 에서 기공 컨덕턴스를 되돌린다. g_tw ≥ gbw 이면 대응하는 gsw 가 없다.
    pub fn stomatal_conductance(&self, g_tw: f64) -> Option<f64> {
        let gbw = self.constants.gbw;
        if !g_tw.is_finite() || g_tw >= gbw {
            return None;
        }
        Some(g_tw * gbw / (gbw - g_tw))
    }

    /// `x = [T_out, E, g_tw]` 로 쓴 잔차. 뉴턴 반복은 이 형태를 푼다.
    fn residuals_total(&self, r: &MeasurementRecord, x: [f64; 3]) -> [f64; 3] {
        let [t_out, e, g_tw] = x;
        let k = &self.constants;
        let p = r.p_atm_kpa;
        let u_in = r.flow_in_mol_s;
        let s = k.leaf_area_m2;

        let (t_chamb, w_chamb) = self.chamber_state(r, t_out);
        let w_in = k.mole_fraction(r.t_in_c, r.rh_in, p);
        let w_out = k.mole_fraction(r.t_in_c, r.rh_out, p);
        let w_leaf = k.mole_fraction(r.t_leaf_c, 1.0, p);
        let h_in = k.enthalpy(r.t_in_c, r.rh_in, p);
        let h_out = k.enthalpy(r.t_in_c, r.rh_out, p);

        let q = self.params.thermal_conductance * (r.t_in_c - t_chamb);

        let r1 = e - g_tw * (w_leaf - w_chamb);
        let r2 = e - u_in * (w_out - w_in) / (s * (1.0 - w_out));
        let r3 = e - ((q + u_in * h_in) / h_out - u_in) / s;
        [r1, r2, r3]
    }

    /// 레코드 한 건을 보정한다. 실패해도 패닉하지 않고 태그된 결과를 돌려준다.
    pub fn correct(&self, r: &MeasurementRecord, settings: &SolverSettings) -> CorrectionResult {
        if let Err(defect) = r.validate() {
            log::debug!("record rejected: {defect}");
            return CorrectionResult::Rejected(defect);
        }

        let [t0, e0, gsw0] = self.initial_guess(r);
        let x0 = [t0, e0, self.total_conductance(gsw0)];
        let solution = match newton::solve3(|x| self.residuals_total(r, x), x0, settings) {
            Ok(sol) => sol,
            Err(failure) => {
                log::debug!("solver failed from x0={x0:?}: {failure}");
                return CorrectionResult::NotConverged(failure);
            }
        };

        let [t_out, e, g_tw] = solution.x;
        let Some(gsw) = self.stomatal_conductance(g_tw) else {
            log::debug!("root at g_tw={g_tw:.4} has no stomatal conductance (gbw={})", self.constants.gbw);
            return CorrectionResult::NotConverged(SolveFailure::NonPhysicalRoot { g_tw });
        };
        let (t_chamb, w_chamb) = self.chamber_state(r, t_out);
        if !w_chamb.is_finite() {
            return CorrectionResult::NotConverged(SolveFailure::NonFiniteResidual);
        }
        CorrectionResult::Converged(CorrectedState {
            t_out_c: t_out,
            t_chamber_c: t_chamb,
            w_chamber: w_chamb,
            transpiration: e,
            gsw_one_sided: gsw,
            gsw_corrected: gsw * self.params.stomatal_sidedness,
            iterations: solution.iterations,
            residual_norm: solution.residual_norm,
        })
    }

    /// 기기의 등온 가정(T_out = T_in)으로 계산한 보정 전 컨덕턴스.
    ///
    /// 증기압 구배가 없거나 g_tw ≥ gbw 이면 None.
    pub fn isothermal_reference(&self, r: &MeasurementRecord) -> Option<IsothermalReference> {
        r.validate().ok()?;
        let k = &self.constants;
        let p = r.p_atm_kpa;
        let w_in = k.mole_fraction(r.t_in_c, r.rh_in, p);
        let w_out = k.mole_fraction(r.t_in_c, r.rh_out, p);
        let e = r.flow_in_mol_s * (w_out - w_in) / (k.leaf_area_m2 * (1.0 - w_out));
        let (_, w_chamb) = self.chamber_state(r, r.t_in_c);
        let w_leaf = k.mole_fraction(r.t_leaf_c, 1.0, p);
        let gsw = self.stomatal_conductance(e / (w_leaf - w_chamb))?;
        if !(e.is_finite() && w_chamb.is_finite() && gsw.is_finite()) {
            return None;
        }
        Some(IsothermalReference {
            transpiration: e,
            w_chamber: w_chamb,
            gsw_one_sided: gsw,
            gsw_total: gsw * self.params.stomatal_sidedness,
        })
    }
}
