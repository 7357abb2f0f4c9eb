use gsw_correction_toolbox::{
    air::PsychrometricConstants,
    correction::{
        BatchCorrector, CorrectionModel, CorrectionParameters, CorrectionResult, CorrectionStatus,
        MeasurementRecord, RecordDefect, RecordInput, SolverSettings,
    },
};

fn corrector(sidedness: f64) -> BatchCorrector {
    let params = CorrectionParameters {
        stomatal_sidedness: sidedness,
        ..Default::default()
    };
    let model = CorrectionModel::new(PsychrometricConstants::LI600, params).expect("params");
    BatchCorrector::new(model, SolverSettings::default())
}

fn inputs() -> Vec<RecordInput> {
    vec![
        Ok(MeasurementRecord::from_instrument_units(25.0, 25.5, 45.0, 49.5, 150.0, 98.0, 0.30, 0.005)),
        Err(RecordDefect::NonNumeric {
            column: "Tleaf".into(),
            value: "".into(),
        }),
        Ok(MeasurementRecord::from_instrument_units(25.0, 24.5, 40.0, 46.0, 150.0, 98.0, 0.40, 0.006)),
        // 잎 온도 포화압보다 낮은 대기압 → 잔차 비유한
        Ok(MeasurementRecord::from_instrument_units(25.0, 25.5, 45.0, 49.5, 150.0, 3.0, 0.30, 0.005)),
        Ok(MeasurementRecord::from_instrument_units(28.0, 27.0, 35.0, 42.0, 140.0, 100.0, 0.45, 0.006)),
        Ok(MeasurementRecord::from_instrument_units(25.0, 25.5, 45.0, 49.5, 0.0, 98.0, 0.30, 0.005)),
    ]
}

#[test]
fn one_result_per_record_in_input_order() {
    let recs = inputs();
    let report = corrector(1.0).correct(&recs);
    assert_eq!(report.len(), recs.len());
    assert_eq!(report.columns().len(), recs.len());

    let statuses: Vec<CorrectionStatus> = report.columns().iter().map(|c| c.status).collect();
    assert_eq!(
        statuses,
        vec![
            CorrectionStatus::Converged,
            CorrectionStatus::InvalidInput,
            CorrectionStatus::Converged,
            CorrectionStatus::NotConverged,
            CorrectionStatus::Converged,
            CorrectionStatus::InvalidInput,
        ]
    );
    // 수렴 행에는 원래 T_in 이 실린다
    assert_eq!(report.columns()[0].t_in_c, 25.0);
    assert_eq!(report.columns()[4].t_in_c, 28.0);
}

#[test]
fn summary_counts_each_outcome() {
    let report = corrector(1.0).correct(&inputs());
    let s = report.summary();
    assert_eq!(s.total, 6);
    assert_eq!(s.converged, 3);
    assert_eq!(s.not_converged, 1);
    assert_eq!(s.rejected, 2);
    assert_eq!(report.converged_count(), 3);
    assert_eq!(report.failed_indices(), vec![1, 3, 5]);
}

#[test]
fn parallel_and_sequential_agree() {
    let recs = inputs();
    let par = corrector(1.5).correct(&recs);
    let seq = corrector(1.5).parallel(false).correct(&recs);
    assert_eq!(par.results(), seq.results());
    assert_eq!(par.columns(), seq.columns());
}

#[test]
fn failed_rows_are_zero_filled_with_status() {
    let report = corrector(2.0).correct(&inputs());

    let not_converged = report.columns()[3];
    assert_eq!(not_converged.gsw_corrected, 0.0);
    assert_eq!(not_converged.t_out_c, 0.0);
    assert_eq!(not_converged.t_in_c, 25.0);
    // T_chamb = 0.5·(T_in + 0)
    assert_eq!(not_converged.t_chamber_c, 12.5);
    assert!(not_converged.w_chamber.is_finite());
    assert_eq!(not_converged.stomatal_sidedness, 2.0);

    let rejected = report.columns()[1];
    assert_eq!(rejected.gsw_corrected, 0.0);
    assert_eq!(rejected.t_in_c, 0.0);
    assert_eq!(rejected.w_chamber, 0.0);
    assert_eq!(rejected.status.as_str(), "invalid_input");
    assert!(matches!(report.results()[5], CorrectionResult::Rejected(RecordDefect::NonPositiveFlow(_))));

    // 파싱된 행은 검증에 실패해도 Tref 를 그대로 싣는다
    let zero_flow = report.columns()[5];
    assert_eq!(zero_flow.status, CorrectionStatus::InvalidInput);
    assert_eq!(zero_flow.t_in_c, 25.0);
    assert_eq!(zero_flow.gsw_corrected, 0.0);
    assert_eq!(zero_flow.t_chamber_c, 0.0);
}

#[test]
fn converged_columns_match_solver_state() {
    let report = corrector(2.0).correct(&inputs());
    let state = report.results()[0].state().expect("converged");
    let cols = report.columns()[0];
    assert_eq!(cols.gsw_corrected, state.gsw_corrected);
    assert_eq!(cols.t_out_c, state.t_out_c);
    assert_eq!(cols.t_chamber_c, state.t_chamber_c);
    assert_eq!(cols.w_chamber, state.w_chamber);
    assert!((state.gsw_corrected - 2.0 * state.gsw_one_sided).abs() < 1e-15);
    assert_eq!(report.parameters().stomatal_sidedness, 2.0);
}

#[test]
fn empty_batch_is_fine() {
    let report = corrector(1.0).correct(&[]);
    assert!(report.is_empty());
    assert_eq!(report.summary().total, 0);
    assert!(report.failed_indices().is_empty());
}
