//! 표준 에러로 출력하는 간단한 `log` 구현.

use std::sync::OnceLock;

use log::{LevelFilter, Log, Metadata, Record};

static LOGGER: OnceLock<Logger> = OnceLock::new();

/// 로거를 설치한다. 이미 설치된 경우 최대 레벨만 갱신한다.
pub fn init(max_level: LevelFilter) -> Result<(), log::SetLoggerError> {
    let logger = LOGGER.get_or_init(|| Logger { max_level });
    log::set_max_level(max_level);
    log::set_logger(logger)
}

/// `-q`/`-v` 횟수에서 레벨을 정한다. 기본은 Info.
pub fn level_from_flags(quiet: bool, verbose: u8) -> LevelFilter {
    if quiet {
        return LevelFilter::Warn;
    }
    match verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

#[derive(Debug)]
struct Logger {
    max_level: LevelFilter,
}

impl Log for Logger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= self.max_level && metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        static LEVEL_STRS: [&str; 5] = ["[x]", "[!]", "[i]", "[?]", "[.]"];
        let level = LEVEL_STRS[record.level() as usize - 1];
        eprintln!("{level} {}: {}", record.target(), record.args());
    }

    fn flush(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_map_to_levels() {
        assert_eq!(level_from_flags(false, 0), LevelFilter::Info);
        assert_eq!(level_from_flags(false, 1), LevelFilter::Debug);
        assert_eq!(level_from_flags(false, 5), LevelFilter::Trace);
        assert_eq!(level_from_flags(true, 2), LevelFilter::Warn);
    }
}
