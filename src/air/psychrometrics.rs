//! 포로미터 챔버 모델에서 쓰는 습공기 물성 함수.
//! 입력: 온도(°C), 상대습도(0~1 분율), 압력(kPa)
//! 출력: 포화수증기압[kPa], 몰분율[mol/mol], 습도비[mol/mol], 엔탈피[J/mol]

use serde::{Deserialize, Serialize};

/// 챔버 모델의 고정 경험 상수.
///
/// 값을 바꾸면 물리 모델 자체가 바뀐다. 설정값이 아니라 모델 정의로 취급하며,
/// 전역 변수 대신 솔버에 값으로 주입한다.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PsychrometricConstants {
    /// 포화수증기압 곡선 계수 a [kPa]
    pub a: f64,
    /// 포화수증기압 곡선 계수 b [-]
    pub b: f64,
    /// 포화수증기압 곡선 계수 c [°C]
    pub c: f64,
    /// 건공기 몰비열 [J/mol/°C]
    pub cpa: f64,
    /// 수증기 몰비열 [J/mol/°C]
    pub cpw: f64,
    /// 물의 몰 증발잠열 [J/mol]
    pub lambdaw: f64,
    /// 챔버 개구부 잎 면적 s [m²]
    pub leaf_area_m2: f64,
    /// 경계층 컨덕턴스 gbw [mol/m²/s]
    pub gbw: f64,
}

impl PsychrometricConstants {
    /// LI-600 챔버에 대해 보정된 상수 세트.
    pub const LI600: Self = Self {
        a: 0.61365,
        b: 17.502,
        c: 240.97,
        cpa: 29.14,
        cpw: 33.5,
        lambdaw: 45502.0,
        leaf_area_m2: 0.441786e-4,
        gbw: 2.921,
    };

    /// 포화수증기압 es(T) = a·exp(b·T/(T+c)) [kPa].
    ///
    /// 생리학적 범위(-10~50°C) 밖의 값은 보장하지 않는다.
    pub fn saturation_vapor_pressure_kpa(&self, t_c: f64) -> f64 {
        self.a * (self.b * t_c / (t_c + self.c)).exp()
    }

    /// 수증기 분압 es(T)·RH [kPa].
    pub fn vapor_pressure_kpa(&self, t_c: f64, rh: f64) -> f64 {
        self.saturation_vapor_pressure_kpa(t_c) * rh
    }

    /// 수증기 몰분율 W = es(T)·RH / P [mol/mol].
    ///
    /// P ≤ es·RH (과포화와 모순되는 입력)이거나 P ≤ 0 이면 NaN을 반환한다.
    /// 호출 측은 비유한 값을 레코드 단위 실패로 처리해야 한다.
    pub fn mole_fraction(&self, t_c: f64, rh: f64, p_kpa: f64) -> f64 {
        let pv = self.vapor_pressure_kpa(t_c, rh);
        if !(p_kpa > 0.0) || p_kpa <= pv {
            return f64::NAN;
        }
        pv / p_kpa
    }

    /// 습도비 Wd = es·RH / (P - es·RH) [mol수증기/mol건공기].
    pub fn humidity_ratio(&self, t_c: f64, rh: f64, p_kpa: f64) -> f64 {
        let pv = self.vapor_pressure_kpa(t_c, rh);
        if !(p_kpa > 0.0) || p_kpa <= pv {
            return f64::NAN;
        }
        pv / (p_kpa - pv)
    }

    /// 습공기 몰 엔탈피 h = cpa·T + Wd·(λw + cpw·T) [J/mol].
    pub fn enthalpy(&self, t_c: f64, rh: f64, p_kpa: f64) -> f64 {
        self.cpa * t_c + self.humidity_ratio(t_c, rh, p_kpa) * (self.lambdaw + self.cpw * t_c)
    }
}

impl Default for PsychrometricConstants {
    fn default() -> Self {
        Self::LI600
    }
}
