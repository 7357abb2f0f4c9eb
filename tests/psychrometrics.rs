use gsw_correction_toolbox::air::PsychrometricConstants;

const K: PsychrometricConstants = PsychrometricConstants::LI600;

#[test]
fn saturation_pressure_at_25c() {
    let es = K.saturation_vapor_pressure_kpa(25.0);
    assert!((es - 3.1797).abs() < 1e-3, "es={es}");
    // 0°C 에서는 계수 a 그대로
    assert!((K.saturation_vapor_pressure_kpa(0.0) - K.a).abs() < 1e-12);
}

#[test]
fn saturation_pressure_increases_with_temperature() {
    let mut prev = K.saturation_vapor_pressure_kpa(-10.0);
    for t in -9..=50 {
        let es = K.saturation_vapor_pressure_kpa(t as f64);
        assert!(es > prev, "t={t}");
        prev = es;
    }
}

#[test]
fn mole_fraction_and_humidity_ratio() {
    let w = K.mole_fraction(25.0, 0.5, 98.0);
    let wd = K.humidity_ratio(25.0, 0.5, 98.0);
    assert!((w - 0.016_222_8).abs() < 1e-6, "w={w}");
    assert!((wd - 0.016_490_4).abs() < 1e-6, "wd={wd}");
    // Wd = W / (1 - W)
    assert!((wd - w / (1.0 - w)).abs() < 1e-12);
    assert_eq!(K.mole_fraction(25.0, 0.0, 98.0), 0.0);
}

#[test]
fn enthalpy_matches_formula() {
    let h = K.enthalpy(25.0, 0.5, 98.0);
    let wd = K.humidity_ratio(25.0, 0.5, 98.0);
    let expected = K.cpa * 25.0 + wd * (K.lambdaw + K.cpw * 25.0);
    assert!((h - expected).abs() < 1e-9);
    assert!((h - 1492.655).abs() < 1e-2, "h={h}");
}

#[test]
fn inconsistent_pressure_yields_nan() {
    // 포화 수증기압(≈3.18 kPa)보다 낮은 전압
    assert!(K.mole_fraction(25.0, 1.0, 3.0).is_nan());
    assert!(K.humidity_ratio(25.0, 1.0, 3.0).is_nan());
    assert!(K.enthalpy(25.0, 1.0, 3.0).is_nan());
    assert!(K.mole_fraction(25.0, 0.5, 0.0).is_nan());
    assert!(K.mole_fraction(25.0, 0.5, -1.0).is_nan());
}
