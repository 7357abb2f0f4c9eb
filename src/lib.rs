//! 핵심 계산 로직을 라이브러리로 분리하여 CLI와 GUI가 같은 보정 경로를 쓰도록 한다.

pub mod air;
pub mod app;
pub mod config;
pub mod correction;
pub mod i18n;
pub mod io;
pub mod logger;
pub mod report;
pub mod ui_cli;
