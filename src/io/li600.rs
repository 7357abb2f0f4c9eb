//! LI-600 CSV 내보내기 파일 읽기/쓰기.
//!
//! 내보내기 형식: 1행 = 그룹명, 2행 = 열 이름, 3행 = 단위, 이후 데이터.
//! 2행에서 필수 열을 찾지 못하면 1행을 헤더로 보는 일반 CSV로 처리한다.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::correction::{BatchReport, MeasurementRecord, RecordDefect, RecordInput};

/// 보정에 반드시 필요한 열 (대소문자 구분).
pub const REQUIRED_COLUMNS: [&str; 8] = [
    "gsw",
    "Tref",
    "Tleaf",
    "rh_r",
    "rh_s",
    "flow",
    "P_atm",
    "E_apparent",
];

/// 출력 파일에 덧붙는 열.
pub const APPENDED_COLUMNS: [&str; 7] = [
    "gsw_corrected",
    "T_in_corrected",
    "Ta_chamb_corrected",
    "T_out_corrected",
    "W_chamb_corrected",
    "stomatal_sidedness",
    "correction_status",
];

/// 테이블 읽기/쓰기 오류.
#[derive(Debug, Error)]
pub enum TableError {
    #[error("파일 입출력 오류: {0}")]
    Io(#[from] io::Error),
    #[error("CSV 처리 오류: {0}")]
    Csv(#[from] csv::Error),
    #[error("필수 열이 없습니다: {}", .0.join(", "))]
    MissingColumns(Vec<String>),
    #[error("데이터가 없는 파일입니다")]
    Empty,
    #[error("보정 결과 행 수({results})가 입력 행 수({rows})와 다릅니다")]
    RowCountMismatch { rows: usize, results: usize },
}

/// 원본 셀 문자열을 그대로 보관하는 테이블.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTable {
    /// 헤더 앞의 행 (그룹명 등)
    pub preamble: Vec<Vec<String>>,
    pub header: Vec<String>,
    /// 헤더 바로 뒤에서 걸러낸 단위 행
    pub units: Option<Vec<String>>,
    pub rows: Vec<Vec<String>>,
    /// REQUIRED_COLUMNS 순서의 열 인덱스
    required: [usize; 8],
}

impl RawTable {
    /// 데이터 행의 문자열 셀. 짧은 행은 빈 문자열로 본다.
    pub fn cell(&self, row: usize, col: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .map(|s| s.trim())
            .unwrap_or("")
    }

    /// 행마다 필수 열을 숫자로 바꿔 레코드를 만든다. 숫자가 아닌 셀은 그 행만 결함 처리한다.
    pub fn records(&self) -> Vec<RecordInput> {
        (0..self.rows.len()).map(|i| self.record(i)).collect()
    }

    fn record(&self, row: usize) -> RecordInput {
        let mut v = [0.0; 8];
        for (slot, (&col, name)) in v
            .iter_mut()
            .zip(self.required.iter().zip(REQUIRED_COLUMNS.iter()))
        {
            let raw = self.cell(row, col);
            *slot = raw.parse::<f64>().map_err(|_| RecordDefect::NonNumeric {
                column: (*name).to_string(),
                value: raw.to_string(),
            })?;
        }
        let [gsw, tref, tleaf, rh_r, rh_s, flow, p_atm, e_apparent] = v;
        Ok(MeasurementRecord::from_instrument_units(
            tref, tleaf, rh_r, rh_s, flow, p_atm, gsw, e_apparent,
        ))
    }
}

fn missing_columns(line: &[String]) -> Vec<String> {
    REQUIRED_COLUMNS
        .iter()
        .filter(|name| !line.iter().any(|h| h.trim() == **name))
        .map(|name| name.to_string())
        .collect()
}

fn required_indices(header: &[String]) -> Option<[usize; 8]> {
    let mut idx = [0usize; 8];
    for (slot, name) in idx.iter_mut().zip(REQUIRED_COLUMNS.iter()) {
        *slot = header.iter().position(|h| h.trim() == *name)?;
    }
    Some(idx)
}

fn is_units_row(line: &[String], required: &[usize; 8]) -> bool {
    required.iter().all(|&col| {
        line.get(col)
            .map(|s| s.trim().parse::<f64>().is_err())
            .unwrap_or(true)
    })
}

/// 임의의 reader에서 테이블을 읽는다.
pub fn parse_table<R: io::Read>(reader: R) -> Result<RawTable, TableError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut lines: Vec<Vec<String>> = Vec::new();
    for rec in rdr.records() {
        let rec = rec?;
        if rec.iter().all(|c| c.trim().is_empty()) {
            continue;
        }
        lines.push(rec.iter().map(str::to_string).collect());
    }
    if lines.is_empty() {
        return Err(TableError::Empty);
    }

    // 내보내기 형식(2행 헤더)을 먼저 보고, 아니면 1행 헤더로 폴백
    let header_at = if lines.len() > 1 && missing_columns(&lines[1]).is_empty() {
        1
    } else {
        let missing = missing_columns(&lines[0]);
        if !missing.is_empty() {
            let missing_second = lines.get(1).map(|l| missing_columns(l));
            let best = match missing_second {
                Some(m) if m.len() < missing.len() => m,
                _ => missing,
            };
            return Err(TableError::MissingColumns(best));
        }
        0
    };

    let mut iter = lines.into_iter();
    let preamble: Vec<Vec<String>> = iter.by_ref().take(header_at).collect();
    let header = iter.next().ok_or(TableError::Empty)?;
    let required = required_indices(&header)
        .ok_or_else(|| TableError::MissingColumns(missing_columns(&header)))?;
    let mut rows: Vec<Vec<String>> = iter.collect();

    let units = if rows
        .first()
        .map(|first| is_units_row(first, &required))
        .unwrap_or(false)
    {
        Some(rows.remove(0))
    } else {
        None
    };

    log::debug!(
        "table parsed: header on line {}, units row: {}, {} data rows",
        header_at + 1,
        units.is_some(),
        rows.len()
    );
    Ok(RawTable {
        preamble,
        header,
        units,
        rows,
        required,
    })
}

/// 파일에서 테이블을 읽는다.
pub fn read_table(path: &Path) -> Result<RawTable, TableError> {
    let file = File::open(path)?;
    parse_table(io::BufReader::new(file))
}

fn format_value(v: f64) -> String {
    if v.is_finite() {
        v.to_string()
    } else {
        String::new()
    }
}

/// 원본 셀을 그대로 쓰고 보정 열을 뒤에 붙인다. 헤더는 1행에 둔다.
pub fn write_corrected<W: io::Write>(
    table: &RawTable,
    report: &BatchReport,
    writer: W,
) -> Result<(), TableError> {
    if report.len() != table.rows.len() {
        return Err(TableError::RowCountMismatch {
            rows: table.rows.len(),
            results: report.len(),
        });
    }
    let mut wtr = csv::WriterBuilder::new().flexible(true).from_writer(writer);
    let width = table.header.len();

    let mut header = table.header.clone();
    header.extend(APPENDED_COLUMNS.iter().map(|s| s.to_string()));
    wtr.write_record(&header)?;

    for (row, cols) in table.rows.iter().zip(report.columns()) {
        let mut out = row.clone();
        if out.len() < width {
            out.resize(width, String::new());
        }
        out.extend([
            format_value(cols.gsw_corrected),
            format_value(cols.t_in_c),
            format_value(cols.t_chamber_c),
            format_value(cols.t_out_c),
            format_value(cols.w_chamber),
            format_value(cols.stomatal_sidedness),
            cols.status.as_str().to_string(),
        ]);
        wtr.write_record(&out)?;
    }
    wtr.flush()?;
    Ok(())
}

/// 보정 결과를 `<stem>_corrected.<ext>` 파일로 쓰고 경로를 돌려준다.
pub fn write_corrected_file(
    input_path: &Path,
    table: &RawTable,
    report: &BatchReport,
) -> Result<PathBuf, TableError> {
    let out_path = corrected_path(input_path);
    let file = File::create(&out_path)?;
    write_corrected(table, report, io::BufWriter::new(file))?;
    log::info!("corrected table written to {}", out_path.display());
    Ok(out_path)
}

fn sibling_with_suffix(input: &Path, suffix: &str, ext: Option<&str>) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match ext {
        Some(e) => format!("{stem}{suffix}.{e}"),
        None => format!("{stem}{suffix}"),
    };
    input.with_file_name(name)
}

/// `data.csv` → `data_corrected.csv`. 확장자는 그대로 유지한다.
pub fn corrected_path(input: &Path) -> PathBuf {
    let ext = input.extension().map(|e| e.to_string_lossy().into_owned());
    sibling_with_suffix(input, "_corrected", ext.as_deref())
}

/// `data.csv` → `data_correction_plots.png`.
pub fn plot_path(input: &Path) -> PathBuf {
    sibling_with_suffix(input, "_correction_plots", Some("png"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXPORT: &str = "\
group,,,,,,,,,
Obs#,gsw,E_apparent,Tref,Tleaf,rh_r,rh_s,flow,P_atm,Remark
#,mol m-2 s-1,mol m-2 s-1,C,C,%,%,umol s-1,kPa,
1,0.30,0.005,25.0,25.5,45.0,49.5,150,98.0,a
2,0.28,0.004,24.0,24.2,40.0,44.0,150,98.1,b
";

    #[test]
    fn export_format_header_on_second_line() {
        let t = parse_table(EXPORT.as_bytes()).expect("parse");
        assert_eq!(t.preamble.len(), 1);
        assert_eq!(t.header[1], "gsw");
        assert!(t.units.is_some());
        assert_eq!(t.rows.len(), 2);
        let recs = t.records();
        let r = recs[0].as_ref().expect("numeric row");
        assert!((r.rh_out - 0.495).abs() < 1e-12);
        assert!((r.flow_in_mol_s - 150e-6).abs() < 1e-15);
    }

    #[test]
    fn plain_csv_fallback() {
        let src = "gsw,Tref,Tleaf,rh_r,rh_s,flow,P_atm,E_apparent\n0.3,25,25.5,45,49.5,150,98,0.005\n";
        let t = parse_table(src.as_bytes()).expect("parse");
        assert!(t.preamble.is_empty());
        assert!(t.units.is_none());
        assert_eq!(t.rows.len(), 1);
        assert!(t.records()[0].is_ok());
    }

    #[test]
    fn missing_column_is_fatal() {
        let src = "gsw,Tref,Tleaf,rh_r,rh_s,flow,P_atm\n0.3,25,25.5,45,49.5,150,98\n";
        match parse_table(src.as_bytes()) {
            Err(TableError::MissingColumns(cols)) => assert_eq!(cols, vec!["E_apparent"]),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn non_numeric_cell_only_flags_its_row() {
        let src = "gsw,Tref,Tleaf,rh_r,rh_s,flow,P_atm,E_apparent\n\
                   0.3,25,25.5,45,49.5,150,98,0.005\n\
                   0.3,n/a,25.5,45,49.5,150,98,0.005\n";
        let t = parse_table(src.as_bytes()).expect("parse");
        let recs = t.records();
        assert!(recs[0].is_ok());
        assert_eq!(
            recs[1],
            Err(RecordDefect::NonNumeric {
                column: "Tref".into(),
                value: "n/a".into()
            })
        );
    }

    #[test]
    fn sibling_paths_keep_extension() {
        assert_eq!(
            corrected_path(Path::new("/data/walnut.csv")),
            PathBuf::from("/data/walnut_corrected.csv")
        );
        assert_eq!(
            corrected_path(Path::new("walnut.txt")),
            PathBuf::from("walnut_corrected.txt")
        );
        assert_eq!(corrected_path(Path::new("walnut")), PathBuf::from("walnut_corrected"));
        assert_eq!(
            plot_path(Path::new("/data/walnut.csv")),
            PathBuf::from("/data/walnut_correction_plots.png")
        );
    }
}
