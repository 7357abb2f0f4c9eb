use clap::Parser;
use gsw_correction_toolbox::{app, config, i18n, logger, ui_cli::{self, Cli}};

/// 명령행 엔트리 포인트. 설정을 로드하고 옵션을 덮어쓴 뒤 파일 하나를 보정한다.
fn main() {
    let cli = Cli::parse();
    if let Err(e) = logger::init(logger::level_from_flags(cli.quiet, cli.verbose)) {
        eprintln!("logger: {e}");
    }
    let lang = i18n::resolve_language(&cli.lang, None);
    if let Err(err) = try_run(&cli) {
        let tr = i18n::Translator::new(&lang);
        eprintln!("{}: {err}", tr.t(i18n::keys::ERROR_PREFIX));
        std::process::exit(1);
    }
}

fn try_run(cli: &Cli) -> Result<(), app::AppError> {
    let mut cfg = config::load_or_default(cli.config_path())?;
    cli.apply_overrides(&mut cfg);

    let lang = i18n::resolve_language(&cli.lang, Some(cfg.language.as_str()));
    let tr = i18n::Translator::new_with_pack(&lang, cfg.lang_pack_dir.as_deref());

    let run = app::run(&cli.input, &cfg)?;
    ui_cli::print_summary(&tr, &cfg, &run)?;

    if cli.save_config {
        cfg.save_to(cli.config_path())?;
        println!(
            "{}",
            tr.tf(
                i18n::keys::CONFIG_SAVED,
                &[("path", cli.config_path().display().to_string())],
            )
        );
    }
    Ok(())
}
