//! 측정 파일 입출력 어댑터.

pub mod li600;

pub use li600::{
    corrected_path, parse_table, plot_path, read_table, write_corrected, write_corrected_file,
    RawTable, TableError, APPENDED_COLUMNS, REQUIRED_COLUMNS,
};
