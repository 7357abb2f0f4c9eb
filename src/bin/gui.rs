#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

//! eframe/egui 기반 데스크톱 GUI 진입점.

use eframe::{egui, App, Frame};
use gsw_correction_toolbox::{
    app::{self, RunOutcome},
    config, i18n, logger,
    report::{linear_fit, LinearFit},
    ui_cli,
};
use rfd::FileDialog;
use std::{
    env, fs,
    path::{Path, PathBuf},
};

fn main() -> Result<(), eframe::Error> {
    // CLI 언어 옵션 처리: --lang xx 또는 --lang=xx (xx: auto/en/ko)
    let mut cli_lang: Option<String> = None;
    let args: Vec<String> = env::args().collect();
    let mut i = 1;
    while i < args.len() {
        let a = &args[i];
        if let Some(val) = a.strip_prefix("--lang=") {
            cli_lang = Some(val.to_string());
        } else if (a == "--lang" || a == "-L") && i + 1 < args.len() {
            cli_lang = Some(args[i + 1].clone());
            i += 1;
        }
        i += 1;
    }

    if let Err(e) = logger::init(log::LevelFilter::Info) {
        eprintln!("logger: {e}");
    }

    let config_path = Path::new(config::DEFAULT_CONFIG_PATH);
    let mut app_cfg = config::load_or_default(config_path).unwrap_or_else(|e| {
        log::warn!("config load failed, using defaults: {e}");
        config::Config::default()
    });
    if let Some(lang_cli) = cli_lang {
        app_cfg.language = i18n::resolve_language(&lang_cli, Some(app_cfg.language.as_str()));
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size(egui::vec2(1100.0, 720.0)),
        ..Default::default()
    };
    eframe::run_native(
        "gsw Correction Toolbox",
        options,
        Box::new(move |cc| {
            if let Err(e) = setup_fonts(&cc.egui_ctx) {
                log::warn!("font: {e}");
            }
            Box::new(GuiApp::new(app_cfg.clone()))
        }),
    )
}

/// 공통: 바이너리 폰트 바이트를 egui에 등록.
fn apply_font_bytes(ctx: &egui::Context, bytes: Vec<u8>, name: &str) {
    let mut fonts = egui::FontDefinitions::default();
    let font_name = name.to_string();
    fonts
        .font_data
        .insert(font_name.clone(), egui::FontData::from_owned(bytes));
    fonts
        .families
        .entry(egui::FontFamily::Proportional)
        .or_default()
        .insert(0, font_name.clone());
    fonts
        .families
        .entry(egui::FontFamily::Monospace)
        .or_default()
        .push(font_name);
    ctx.set_fonts(fonts);
}

/// 한글 표시용 시스템 폰트를 찾아 적용한다. 못 찾으면 기본 폰트를 유지한다.
fn setup_fonts(ctx: &egui::Context) -> Result<(), String> {
    let mut candidates: Vec<PathBuf> = vec![PathBuf::from("assets/fonts/malgun.ttf")];
    if let Some(windir) = env::var_os("WINDIR") {
        let dir = Path::new(&windir).join("Fonts");
        for f in ["malgun.ttf", "gulim.ttc", "batang.ttc"] {
            candidates.push(dir.join(f));
        }
    }
    for p in [
        "/System/Library/Fonts/AppleSDGothicNeo.ttc",
        "/usr/share/fonts/truetype/nanum/NanumGothic.ttf",
        "/usr/share/fonts/opentype/noto/NotoSansCJK-Regular.ttc",
        "/usr/share/fonts/noto-cjk/NotoSansCJK-Regular.ttc",
    ] {
        candidates.push(PathBuf::from(p));
    }

    let path = candidates
        .iter()
        .find(|p| p.exists())
        .ok_or_else(|| "Korean font not found; using default font".to_string())?;
    let bytes = fs::read(path).map_err(|e| format!("Failed to read font ({}): {e}", path.display()))?;
    apply_font_bytes(ctx, bytes, "korean_font");
    Ok(())
}

struct GuiApp {
    config: config::Config,
    tr: i18n::Translator,
    lang_input: String,
    input_path: Option<PathBuf>,
    outcome: Option<RunOutcome>,
    summary_text: String,
    status: Option<String>,
}

impl GuiApp {
    fn new(config: config::Config) -> Self {
        let lang_code = i18n::resolve_language("auto", Some(config.language.as_str()));
        let tr = i18n::Translator::new_with_pack(&lang_code, config.lang_pack_dir.as_deref());
        log::info!("GUI language resolved: {lang_code}");
        Self {
            lang_input: config.language.clone(),
            config,
            tr,
            input_path: None,
            outcome: None,
            summary_text: String::new(),
            status: None,
        }
    }

    fn run_correction(&mut self) {
        let Some(path) = self.input_path.clone() else {
            return;
        };
        let err_prefix = self.tr.t(i18n::keys::ERROR_PREFIX);
        let result = app::correct_file(&path, &self.config).and_then(|outcome| {
            let out = outcome.write_corrected(&path)?;
            Ok((outcome, out))
        });
        match result {
            Ok((outcome, out)) => {
                let mut buf = Vec::new();
                if let Err(e) = ui_cli::write_summary(&mut buf, &self.tr, &self.config, &outcome.summary) {
                    log::warn!("summary: {e}");
                }
                self.summary_text = String::from_utf8_lossy(&buf).into_owned();
                self.status = Some(self.tr.tf(
                    i18n::keys::SUMMARY_OUTPUT,
                    &[("path", out.display().to_string())],
                ));
                self.outcome = Some(outcome);
            }
            Err(e) => {
                self.outcome = None;
                self.summary_text.clear();
                self.status = Some(format!("{err_prefix}: {e}"));
            }
        }
    }

    fn save_plot(&mut self) {
        let (Some(path), Some(outcome)) = (&self.input_path, &self.outcome) else {
            return;
        };
        self.status = Some(match outcome.write_plot(path) {
            Ok(Some(p)) => self
                .tr
                .tf(i18n::keys::SUMMARY_PLOT, &[("path", p.display().to_string())]),
            Ok(None) => self.tr.t(i18n::keys::SUMMARY_PLOT_SKIPPED),
            Err(e) => format!("{}: {e}", self.tr.t(i18n::keys::ERROR_PREFIX)),
        });
    }

    fn ui_settings(&mut self, ui: &mut egui::Ui) {
        let tr = self.tr.clone();
        let txt = |key: &str| tr.t(key);

        ui.heading(txt(i18n::keys::GUI_SETTINGS));
        ui.separator();
        ui.label(txt(i18n::keys::GUI_SIDEDNESS))
            .on_hover_text(txt(i18n::keys::GUI_SIDEDNESS_TIP));
        ui.add(
            egui::Slider::new(&mut self.config.correction.stomatal_sidedness, 1.0..=2.0)
                .step_by(0.1),
        );

        egui::CollapsingHeader::new(txt(i18n::keys::GUI_ADVANCED)).show(ui, |ui| {
            ui.label(txt(i18n::keys::GUI_THERMAL_CONDUCTANCE));
            ui.add(
                egui::DragValue::new(&mut self.config.correction.thermal_conductance)
                    .clamp_range(0.001..=0.1)
                    .speed(0.0005)
                    .max_decimals(4),
            );
            ui.label(txt(i18n::keys::GUI_TOLERANCE));
            ui.add(
                egui::DragValue::new(&mut self.config.solver.tolerance)
                    .clamp_range(1e-14..=1e-4)
                    .speed(1e-10)
                    .custom_formatter(|v, _| format!("{v:.1e}")),
            );
            ui.label(txt(i18n::keys::GUI_MAX_ITERATIONS));
            ui.add(egui::DragValue::new(&mut self.config.solver.max_iterations).clamp_range(1..=1000));
            ui.checkbox(&mut self.config.parallel, txt(i18n::keys::GUI_PARALLEL));
        });

        ui.separator();
        ui.label(txt(i18n::keys::GUI_LANGUAGE));
        egui::ComboBox::from_id_source("lang_choice")
            .selected_text(&self.lang_input)
            .show_ui(ui, |ui| {
                ui.selectable_value(&mut self.lang_input, "auto".into(), "auto");
                ui.selectable_value(&mut self.lang_input, "en".into(), "English");
                ui.selectable_value(&mut self.lang_input, "ko".into(), "한국어");
            });
        if ui.button(txt(i18n::keys::GUI_SAVE_SETTINGS)).clicked() {
            self.config.language = self.lang_input.clone();
            let resolved = i18n::resolve_language(&self.config.language, None);
            self.tr = i18n::Translator::new_with_pack(&resolved, self.config.lang_pack_dir.as_deref());
            self.status = Some(match self.config.save() {
                Ok(()) => self.tr.tf(
                    i18n::keys::CONFIG_SAVED,
                    &[("path", config::DEFAULT_CONFIG_PATH.to_string())],
                ),
                Err(e) => format!("{}: {e}", self.tr.t(i18n::keys::ERROR_PREFIX)),
            });
        }
    }

    fn ui_main(&mut self, ui: &mut egui::Ui) {
        let tr = self.tr.clone();
        let txt = |key: &str| tr.t(key);

        ui.horizontal(|ui| {
            if ui.button(txt(i18n::keys::GUI_PICK_FILE)).clicked() {
                if let Some(p) = FileDialog::new().add_filter("CSV", &["csv"]).pick_file() {
                    self.input_path = Some(p);
                    self.outcome = None;
                    self.summary_text.clear();
                }
            }
            match &self.input_path {
                Some(p) => ui.monospace(p.display().to_string()),
                None => ui.label(txt(i18n::keys::GUI_NO_FILE)),
            };
        });
        ui.horizontal(|ui| {
            let can_run = self.input_path.is_some();
            if ui.add_enabled(can_run, egui::Button::new(txt(i18n::keys::GUI_RUN))).clicked() {
                self.run_correction();
            }
            let can_plot = self.outcome.as_ref().is_some_and(|o| !o.series.is_empty());
            if ui
                .add_enabled(can_plot, egui::Button::new(txt(i18n::keys::GUI_SAVE_PLOT)))
                .clicked()
            {
                self.save_plot();
            }
        });
        if let Some(msg) = &self.status {
            ui.label(msg);
        }
        ui.separator();

        if !self.summary_text.is_empty() {
            ui.monospace(&self.summary_text);
            ui.separator();
        }

        if let Some(outcome) = &self.outcome {
            if !outcome.series.is_empty() {
                ui.small(txt(i18n::keys::GUI_LEGEND));
                ui.horizontal(|ui| {
                    let side = ((ui.available_width() - 16.0) / 2.0).clamp(200.0, 480.0);
                    scatter_plot(ui, &txt(i18n::keys::GUI_PLOT_GSW), &outcome.series.gsw, side);
                    scatter_plot(ui, &txt(i18n::keys::GUI_PLOT_W), &outcome.series.w_chamber, side);
                });
            }
        }
    }
}

/// 1:1 축 산점도. 회색 = 1:1 위치, 검정 = 보정값, 빨강 = 회귀선.
fn scatter_plot(ui: &mut egui::Ui, title: &str, points: &[(f64, f64)], side: f32) {
    ui.vertical(|ui| {
        ui.label(title);
        let fit: Option<LinearFit> = linear_fit(points);
        if let Some(f) = &fit {
            ui.small(format!("{}  R² = {:.3}", f.equation(), f.r_squared));
        }
        let (response, painter) = ui.allocate_painter(egui::vec2(side, side), egui::Sense::hover());
        let rect = response.rect.shrink(6.0);
        painter.rect_stroke(rect, 0.0, egui::Stroke::new(1.0, egui::Color32::DARK_GRAY));

        let (lo, hi) = points
            .iter()
            .flat_map(|&(x, y)| [x, y])
            .filter(|v| v.is_finite())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
        if !(lo.is_finite() && hi.is_finite()) {
            return;
        }
        let pad = ((hi - lo) * 0.05).max(hi.abs() * 1e-3).max(1e-9);
        let (lo, hi) = (lo - pad, hi + pad);
        let to_screen = |x: f64, y: f64| {
            let fx = ((x - lo) / (hi - lo)) as f32;
            let fy = ((y - lo) / (hi - lo)) as f32;
            egui::pos2(rect.left() + fx * rect.width(), rect.bottom() - fy * rect.height())
        };

        for &(x, _) in points {
            painter.circle_filled(to_screen(x, x), 2.5, egui::Color32::GRAY);
        }
        for &(x, y) in points {
            painter.circle_filled(to_screen(x, y), 2.5, egui::Color32::BLACK);
        }
        if let Some(f) = fit {
            let (xmin, xmax) = points
                .iter()
                .map(|p| p.0)
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(a, b), v| (a.min(v), b.max(v)));
            painter.line_segment(
                [to_screen(xmin, f.predict(xmin)), to_screen(xmax, f.predict(xmax))],
                egui::Stroke::new(1.5, egui::Color32::RED),
            );
        }
        painter.text(
            rect.left_bottom() + egui::vec2(4.0, -4.0),
            egui::Align2::LEFT_BOTTOM,
            format!("{lo:.4}"),
            egui::FontId::proportional(11.0),
            egui::Color32::DARK_GRAY,
        );
        painter.text(
            rect.right_top() + egui::vec2(-4.0, 4.0),
            egui::Align2::RIGHT_TOP,
            format!("{hi:.4}"),
            egui::FontId::proportional(11.0),
            egui::Color32::DARK_GRAY,
        );
    });
}

impl App for GuiApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut Frame) {
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            ui.heading(self.tr.t(i18n::keys::APP_TITLE));
        });

        egui::SidePanel::left("settings")
            .resizable(true)
            .min_width(180.0)
            .default_width(240.0)
            .show(ctx, |ui| {
                self.ui_settings(ui);
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical()
                .auto_shrink([false; 2])
                .show(ui, |ui| self.ui_main(ui));
        });
    }
}
