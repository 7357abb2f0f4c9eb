use std::collections::HashMap;
use std::fs;
use std::path::Path;
use sys_locale::get_locale;

/// 문자열 키를 모아두는 네임스페이스.
pub mod keys {
    pub const ERROR_PREFIX: &str = "general.error_prefix";
    pub const APP_TITLE: &str = "general.app_title";

    pub const SUMMARY_HEADING: &str = "summary.heading";
    pub const SUMMARY_PARAMETERS: &str = "summary.parameters";
    pub const SUMMARY_CONVERGED: &str = "summary.converged";
    pub const SUMMARY_BREAKDOWN: &str = "summary.breakdown";
    pub const SUMMARY_FAILED_ROWS: &str = "summary.failed_rows";
    pub const SUMMARY_NONE: &str = "summary.none";
    pub const SUMMARY_MEAN_RAW: &str = "summary.mean_gsw_raw";
    pub const SUMMARY_MEAN_CORRECTED: &str = "summary.mean_gsw_corrected";
    pub const SUMMARY_GSW_FIT: &str = "summary.gsw_fit";
    pub const SUMMARY_W_FIT: &str = "summary.w_chamber_fit";
    pub const SUMMARY_OUTPUT: &str = "summary.output";
    pub const SUMMARY_PLOT: &str = "summary.plot";
    pub const SUMMARY_PLOT_SKIPPED: &str = "summary.plot_skipped";
    pub const CONFIG_SAVED: &str = "settings.saved";

    pub const GUI_PICK_FILE: &str = "gui.pick_file";
    pub const GUI_NO_FILE: &str = "gui.no_file";
    pub const GUI_RUN: &str = "gui.run";
    pub const GUI_SAVE_PLOT: &str = "gui.save_plot";
    pub const GUI_SETTINGS: &str = "gui.settings";
    pub const GUI_SIDEDNESS: &str = "gui.sidedness";
    pub const GUI_SIDEDNESS_TIP: &str = "gui.sidedness_tip";
    pub const GUI_ADVANCED: &str = "gui.advanced";
    pub const GUI_THERMAL_CONDUCTANCE: &str = "gui.thermal_conductance";
    pub const GUI_TOLERANCE: &str = "gui.tolerance";
    pub const GUI_MAX_ITERATIONS: &str = "gui.max_iterations";
    pub const GUI_PARALLEL: &str = "gui.parallel";
    pub const GUI_LANGUAGE: &str = "gui.language";
    pub const GUI_SAVE_SETTINGS: &str = "gui.save_settings";
    pub const GUI_PLOT_GSW: &str = "gui.plot_gsw";
    pub const GUI_PLOT_W: &str = "gui.plot_w";
    pub const GUI_LEGEND: &str = "gui.legend";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    Ko,
    En,
}

impl Language {
    fn from_code(code: &str) -> Self {
        let c = code.to_lowercase();
        if c.starts_with("ko") {
            Language::Ko
        } else {
            Language::En
        }
    }

    pub fn as_code(&self) -> &'static str {
        match self {
            Language::Ko => "ko",
            Language::En => "en",
        }
    }
}

/// 런타임 언어 번들을 제공한다.
#[derive(Debug, Clone)]
pub struct Translator {
    lang: Language,
    overrides: Option<HashMap<String, String>>,
}

impl Translator {
    /// 언어 코드(ko/en)에 따라 번역기를 생성한다. 알 수 없는 코드는 en으로 폴백한다.
    pub fn new(lang_code: &str) -> Self {
        Self {
            lang: Language::from_code(lang_code),
            overrides: None,
        }
    }

    /// 언어 코드 + 언어팩 디렉터리(locales/ 등)를 받아서 번역기를 생성한다.
    /// 디렉터리가 없거나 파일이 없으면 내장 문자열만 사용한다.
    pub fn new_with_pack(lang_code: &str, pack_dir: Option<&str>) -> Self {
        let overrides = pack_dir
            .and_then(|dir| load_overrides(dir, lang_code))
            .or_else(|| load_overrides("locales", lang_code));
        Self {
            lang: Language::from_code(lang_code),
            overrides,
        }
    }

    pub fn language(&self) -> Language {
        self.lang
    }

    pub fn language_code(&self) -> &'static str {
        self.lang.as_code()
    }

    /// 언어팩에서 키를 조회한다. 언어팩에 없으면 None.
    pub fn lookup(&self, key: &str) -> Option<String> {
        self.overrides.as_ref().and_then(|m| m.get(key).cloned())
    }

    /// 번역을 가져온다. 언어팩 → 내장 문자열 → 키 순으로 찾는다.
    pub fn t(&self, key: &str) -> String {
        if let Some(v) = self.lookup(key) {
            return v;
        }
        let built_in = match self.lang {
            Language::En => en(key),
            Language::Ko => ko(key).or_else(|| en(key)),
        };
        built_in.unwrap_or(key).to_string()
    }

    /// `{name}` 자리표시자를 채운 번역.
    pub fn tf(&self, key: &str, vars: &[(&str, String)]) -> String {
        fill_template(&self.t(key), vars)
    }
}

/// `{name}` 형태 자리표시자를 값으로 바꾼다.
pub fn fill_template(template: &str, vars: &[(&str, String)]) -> String {
    let mut out = template.to_string();
    for (k, v) in vars {
        out = out.replace(&format!("{{{k}}}"), v);
    }
    out
}

fn ko(key: &str) -> Option<&'static str> {
    use keys::*;
    let s = match key {
        ERROR_PREFIX => "오류",
        APP_TITLE => "기공 컨덕턴스 보정 도구",
        SUMMARY_HEADING => "=== 보정 결과 ===",
        SUMMARY_PARAMETERS => "sidedness = {sidedness}, 열 컨덕턴스 C = {conductance} W/°C",
        SUMMARY_CONVERGED => "{total}개 레코드 중 {converged}개 수렴",
        SUMMARY_BREAKDOWN => "미수렴 {not_converged}개, 입력 결함 {rejected}개",
        SUMMARY_FAILED_ROWS => "실패 행 (데이터 1행 = 1): {rows}",
        SUMMARY_NONE => "없음",
        SUMMARY_MEAN_RAW => "평균 gsw (보정 전): {value} mol m⁻² s⁻¹",
        SUMMARY_MEAN_CORRECTED => "평균 gsw (보정 후): {value} mol m⁻² s⁻¹",
        SUMMARY_GSW_FIT => "gsw 보정 후 vs 보정 전: {equation} (R² = {r2})",
        SUMMARY_W_FIT => "챔버 W vs 입구 W: {equation} (R² = {r2})",
        SUMMARY_OUTPUT => "보정 파일: {path}",
        SUMMARY_PLOT => "비교 그래프: {path}",
        SUMMARY_PLOT_SKIPPED => "수렴한 레코드가 없어 그래프를 건너뜁니다.",
        CONFIG_SAVED => "설정이 저장되었습니다: {path}",
        GUI_PICK_FILE => "CSV 파일 선택…",
        GUI_NO_FILE => "선택된 파일 없음",
        GUI_RUN => "보정 실행",
        GUI_SAVE_PLOT => "비교 그래프 PNG 저장",
        GUI_SETTINGS => "보정 설정",
        GUI_SIDEDNESS => "기공 분포 (sidedness)",
        GUI_SIDEDNESS_TIP => "1 = 한 면(하면)에만 기공, 2 = 양면에 같은 밀도",
        GUI_ADVANCED => "고급 설정",
        GUI_THERMAL_CONDUCTANCE => "챔버 열 컨덕턴스 C [W/°C]",
        GUI_TOLERANCE => "수렴 허용 잔차",
        GUI_MAX_ITERATIONS => "최대 반복 수",
        GUI_PARALLEL => "병렬 계산",
        GUI_LANGUAGE => "언어",
        GUI_SAVE_SETTINGS => "설정 저장",
        GUI_PLOT_GSW => "gsw: 보정 전 vs 보정 후",
        GUI_PLOT_W => "W: 입구 vs 챔버",
        GUI_LEGEND => "회색 = 1:1, 검정 = 보정값, 빨강 = 회귀선",
        _ => return None,
    };
    Some(s)
}

fn en(key: &str) -> Option<&'static str> {
    use keys::*;
    let s = match key {
        ERROR_PREFIX => "Error",
        APP_TITLE => "Stomatal Conductance Correction Toolbox",
        SUMMARY_HEADING => "=== Correction results ===",
        SUMMARY_PARAMETERS => "sidedness = {sidedness}, thermal conductance C = {conductance} W/°C",
        SUMMARY_CONVERGED => "{converged} of {total} records converged",
        SUMMARY_BREAKDOWN => "not converged: {not_converged}, invalid input: {rejected}",
        SUMMARY_FAILED_ROWS => "Failed rows (first data row = 1): {rows}",
        SUMMARY_NONE => "none",
        SUMMARY_MEAN_RAW => "Mean gsw (raw): {value} mol m⁻² s⁻¹",
        SUMMARY_MEAN_CORRECTED => "Mean gsw (corrected): {value} mol m⁻² s⁻¹",
        SUMMARY_GSW_FIT => "Corrected vs raw gsw: {equation} (R² = {r2})",
        SUMMARY_W_FIT => "Chamber W vs inlet W: {equation} (R² = {r2})",
        SUMMARY_OUTPUT => "Corrected file: {path}",
        SUMMARY_PLOT => "Comparison plot: {path}",
        SUMMARY_PLOT_SKIPPED => "No converged records; plot skipped.",
        CONFIG_SAVED => "Settings saved to {path}",
        GUI_PICK_FILE => "Choose CSV file…",
        GUI_NO_FILE => "No file selected",
        GUI_RUN => "Run correction",
        GUI_SAVE_PLOT => "Save comparison PNG",
        GUI_SETTINGS => "Correction settings",
        GUI_SIDEDNESS => "Stomatal sidedness",
        GUI_SIDEDNESS_TIP => "1 = stomata on one side only, 2 = equal density on both sides",
        GUI_ADVANCED => "Advanced",
        GUI_THERMAL_CONDUCTANCE => "Chamber thermal conductance C [W/°C]",
        GUI_TOLERANCE => "Residual tolerance",
        GUI_MAX_ITERATIONS => "Max iterations",
        GUI_PARALLEL => "Parallel",
        GUI_LANGUAGE => "Language",
        GUI_SAVE_SETTINGS => "Save settings",
        GUI_PLOT_GSW => "gsw: raw vs corrected",
        GUI_PLOT_W => "W: inlet vs chamber",
        GUI_LEGEND => "grey = 1:1, black = corrected, red = fit",
        _ => return None,
    };
    Some(s)
}

/// CLI 플래그/설정/시스템 순으로 언어 코드를 결정한다.
pub fn resolve_language(cli_arg: &str, config_lang: Option<&str>) -> String {
    normalize_lang(cli_arg)
        .or_else(|| config_lang.and_then(normalize_lang))
        .or_else(detect_system_language)
        .unwrap_or_else(|| "en".to_string())
}

fn normalize_lang(code: &str) -> Option<String> {
    let c = code.trim().to_lowercase();
    match c.as_str() {
        "auto" | "" => None,
        other if other.starts_with("ko") => Some("ko".into()),
        other if other.starts_with("en") => Some("en".into()),
        _ => None,
    }
}

fn normalize_locale_string(loc: &str) -> Option<String> {
    let lang = loc
        .split(['.', '_', '-'])
        .next()
        .unwrap_or_default()
        .to_lowercase();
    match lang.as_str() {
        "ko" => Some("ko".into()),
        "en" => Some("en".into()),
        _ => None,
    }
}

/// 시스템 로케일에서 언어를 추정한다.
pub fn detect_system_language() -> Option<String> {
    if let Some(lang) = get_locale().as_deref().and_then(normalize_locale_string) {
        return Some(lang);
    }
    ["LC_ALL", "LANG"]
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .find_map(|v| normalize_locale_string(&v))
}

/// TOML 기반 언어팩을 로드한다. 형식: key = "value" 로 구성된 맵(테이블은 점으로 이어 붙임).
fn load_overrides(dir: &str, lang: &str) -> Option<HashMap<String, String>> {
    let try_load = |code: &str| -> Option<HashMap<String, String>> {
        let path = Path::new(dir).join(format!("{code}.toml"));
        let content = fs::read_to_string(path).ok()?;
        parse_toml_to_map(&content)
    };

    if let Some(map) = try_load(lang) {
        return Some(map);
    }
    let (base, _) = lang.split_once(['-', '_'])?;
    try_load(base)
}

fn parse_toml_to_map(src: &str) -> Option<HashMap<String, String>> {
    let value: toml::Value = toml::from_str(src).ok()?;
    let table = value.as_table()?;
    let mut map = HashMap::new();

    fn walk(prefix: &str, val: &toml::Value, out: &mut HashMap<String, String>) {
        match val {
            toml::Value::String(s) => {
                out.insert(prefix.to_string(), s.to_string());
            }
            toml::Value::Table(t) => {
                for (k, v) in t {
                    let key = if prefix.is_empty() {
                        k.clone()
                    } else {
                        format!("{prefix}.{k}")
                    };
                    walk(&key, v, out);
                }
            }
            _ => {}
        }
    }

    for (k, v) in table {
        walk(k, v, &mut map);
    }

    if map.is_empty() {
        None
    } else {
        Some(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_language_wins_over_config() {
        assert_eq!(resolve_language("ko-KR", Some("en")), "ko");
        assert_eq!(resolve_language("auto", Some("en-us")), "en");
    }

    #[test]
    fn templates_are_filled() {
        let tr = Translator::new("en");
        let line = tr.tf(
            keys::SUMMARY_CONVERGED,
            &[("converged", "3".into()), ("total", "4".into())],
        );
        assert_eq!(line, "3 of 4 records converged");
    }

    #[test]
    fn every_korean_key_has_english_text() {
        use keys::*;
        for key in [ERROR_PREFIX, SUMMARY_HEADING, GUI_RUN, GUI_LEGEND, CONFIG_SAVED] {
            assert!(ko(key).is_some(), "{key}");
            assert!(en(key).is_some(), "{key}");
        }
    }

    #[test]
    fn nested_pack_tables_flatten_to_dotted_keys() {
        let map = parse_toml_to_map("[summary]\nheading = \"Results\"\n").expect("map");
        assert_eq!(map.get("summary.heading").map(String::as_str), Some("Results"));
    }

    #[test]
    fn unknown_key_falls_back_to_key() {
        assert_eq!(Translator::new("ko").t("no.such.key"), "no.such.key");
    }
}
