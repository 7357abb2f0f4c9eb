use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 측정 레코드가 보정 대상에서 제외되는 사유.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RecordDefect {
    #[error("열 '{column}'의 값 '{value}'은(는) 숫자가 아닙니다")]
    NonNumeric { column: String, value: String },
    #[error("{field} 값이 유한하지 않습니다")]
    NonFinite { field: &'static str },
    #[error("대기압은 양수여야 합니다 (P_atm={0} kPa)")]
    NonPositivePressure(f64),
    #[error("유량은 양수여야 합니다 (flow={0} mol/s)")]
    NonPositiveFlow(f64),
    #[error("{field} 상대습도 {value}이(가) 0~1 범위를 벗어났습니다")]
    HumidityOutOfRange { field: &'static str, value: f64 },
}

/// 배치 보정 파라미터가 허용 범위를 벗어난 경우.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParameterError {
    #[error("stomatal_sidedness는 1~2 사이여야 합니다 (입력값 {0})")]
    Sidedness(f64),
    #[error("thermal_conductance는 양수여야 합니다 (입력값 {0} W/°C)")]
    ThermalConductance(f64),
}

/// 포로미터 1회 측정값. 솔버가 쓰는 SI 단위로 저장한다.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeasurementRecord {
    /// 기준(입구) 블록 온도 Tref [°C]
    pub t_in_c: f64,
    /// 잎 온도 [°C]
    pub t_leaf_c: f64,
    /// 입구 상대습도 [분율]
    pub rh_in: f64,
    /// 출구 상대습도 [분율]
    pub rh_out: f64,
    /// 입구 몰 유량 [mol/s]
    pub flow_in_mol_s: f64,
    /// 대기압 [kPa]
    pub p_atm_kpa: f64,
    /// 기기가 보고한 (보정 전) 기공 컨덕턴스 [mol/m²/s]
    pub gsw_raw: f64,
    /// 기기가 보고한 증산량 [mol/m²/s]. 초기 추정값으로만 쓴다.
    pub e_apparent: f64,
}

impl MeasurementRecord {
    /// 기기 출력 단위(%, µmol/s)의 값을 받아 레코드를 만든다.
    #[allow(clippy::too_many_arguments)]
    pub fn from_instrument_units(
        tref_c: f64,
        tleaf_c: f64,
        rh_r_pct: f64,
        rh_s_pct: f64,
        flow_umol_s: f64,
        p_atm_kpa: f64,
        gsw: f64,
        e_apparent: f64,
    ) -> Self {
        Self {
            t_in_c: tref_c,
            t_leaf_c: tleaf_c,
            rh_in: rh_r_pct / 100.0,
            rh_out: rh_s_pct / 100.0,
            flow_in_mol_s: flow_umol_s * 1e-6,
            p_atm_kpa,
            gsw_raw: gsw,
            e_apparent,
        }
    }

    /// 레코드 불변조건(P>0, flow>0, 0≤RH≤1, 유한값)을 검사한다.
    pub fn validate(&self) -> Result<(), RecordDefect> {
        let fields = [
            ("Tref", self.t_in_c),
            ("Tleaf", self.t_leaf_c),
            ("rh_r", self.rh_in),
            ("rh_s", self.rh_out),
            ("flow", self.flow_in_mol_s),
            ("P_atm", self.p_atm_kpa),
            ("gsw", self.gsw_raw),
            ("E_apparent", self.e_apparent),
        ];
        if let Some(&(field, _)) = fields.iter().find(|(_, v)| !v.is_finite()) {
            return Err(RecordDefect::NonFinite { field });
        }
        if self.p_atm_kpa <= 0.0 {
            return Err(RecordDefect::NonPositivePressure(self.p_atm_kpa));
        }
        if self.flow_in_mol_s <= 0.0 {
            return Err(RecordDefect::NonPositiveFlow(self.flow_in_mol_s));
        }
        for (field, value) in [("rh_r", self.rh_in), ("rh_s", self.rh_out)] {
            if !(0.0..=1.0).contains(&value) {
                return Err(RecordDefect::HumidityOutOfRange { field, value });
            }
        }
        Ok(())
    }
}

/// 어댑터가 넘겨주는 행 단위 입력. 파싱 단계의 결함도 그대로 실어 보낸다.
pub type RecordInput = Result<MeasurementRecord, RecordDefect>;

/// 배치 전체에 적용되는 사용자 조정값.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorrectionParameters {
    /// 한 면 컨덕턴스를 전체 컨덕턴스로 환산하는 배수 (1=하면, 2=양면)
    pub stomatal_sidedness: f64,
    /// 챔버 열누설 계수 C [W/°C]
    pub thermal_conductance: f64,
}

impl CorrectionParameters {
    pub const DEFAULT_SIDEDNESS: f64 = 1.0;
    pub const DEFAULT_THERMAL_CONDUCTANCE: f64 = 0.007;

    pub fn validate(&self) -> Result<(), ParameterError> {
        if !(1.0..=2.0).contains(&self.stomatal_sidedness) {
            return Err(ParameterError::Sidedness(self.stomatal_sidedness));
        }
        if !self.thermal_conductance.is_finite() || self.thermal_conductance <= 0.0 {
            return Err(ParameterError::ThermalConductance(self.thermal_conductance));
        }
        Ok(())
    }
}

impl Default for CorrectionParameters {
    fn default() -> Self {
        Self {
            stomatal_sidedness: Self::DEFAULT_SIDEDNESS,
            thermal_conductance: Self::DEFAULT_THERMAL_CONDUCTANCE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> MeasurementRecord {
        MeasurementRecord::from_instrument_units(25.0, 25.5, 45.0, 49.5, 150.0, 98.0, 0.3, 0.005)
    }

    #[test]
    fn instrument_units_are_converted() {
        let r = sample();
        assert!((r.rh_in - 0.45).abs() < 1e-12);
        assert!((r.rh_out - 0.495).abs() < 1e-12);
        assert!((r.flow_in_mol_s - 150e-6).abs() < 1e-15);
        assert!(r.validate().is_ok());
    }

    #[test]
    fn invariant_violations_are_reported() {
        let mut r = sample();
        r.p_atm_kpa = 0.0;
        assert_eq!(r.validate(), Err(RecordDefect::NonPositivePressure(0.0)));

        let mut r = sample();
        r.flow_in_mol_s = -1e-6;
        assert!(matches!(r.validate(), Err(RecordDefect::NonPositiveFlow(_))));

        let mut r = sample();
        r.rh_out = 1.2;
        assert!(matches!(
            r.validate(),
            Err(RecordDefect::HumidityOutOfRange { field: "rh_s", .. })
        ));

        let mut r = sample();
        r.t_leaf_c = f64::NAN;
        assert_eq!(r.validate(), Err(RecordDefect::NonFinite { field: "Tleaf" }));
    }

    #[test]
    fn parameter_bounds() {
        assert!(CorrectionParameters::default().validate().is_ok());
        let p = CorrectionParameters {
            stomatal_sidedness: 2.5,
            ..Default::default()
        };
        assert!(p.validate().is_err());
        let p = CorrectionParameters {
            thermal_conductance: 0.0,
            ..Default::default()
        };
        assert!(p.validate().is_err());
    }
}
