mod args;

use args::{Args, Mode};
use screen_locator::template_matching::locate;
use screen_locator::{
    Bitmap, CapabilitySet, CloudConfig, LocateError, LocateResult, LocatorConfig, Platform,
    Template, Threshold,
};
use serde_json::json;
use std::path::Path;
use std::process::ExitCode;

fn main() -> ExitCode {
    let Some(args) = Args::parse() else {
        return ExitCode::SUCCESS;
    };

    let default_filter = if args.debug_mode { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let result = match &args.mode {
        Mode::Locate { screen, template } => run_locate(&args, screen, template),
        Mode::Capabilities(platform) => print_capabilities(*platform),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e @ LocateError::NotFound { .. }) => {
            eprintln!("❌ {e}");
            ExitCode::from(1)
        }
        Err(e) => {
            eprintln!("❌ {e}");
            ExitCode::from(2)
        }
    }
}

fn locator_config(args: &Args) -> LocateResult<LocatorConfig> {
    let mut config = match &args.config {
        Some(path) => LocatorConfig::load(path)?,
        None => LocatorConfig::from_env()?,
    };
    if let Some(threshold) = args.threshold {
        config.threshold = Threshold::new(threshold)?;
    }
    if let Some(anchor) = args.anchor {
        config.anchor = anchor;
    }
    if let Some(mode) = args.color_mode {
        config.color_mode = mode;
    }
    config.validate()?;
    Ok(config)
}

fn run_locate(args: &Args, screen_path: &Path, template_path: &Path) -> LocateResult<()> {
    let config = locator_config(args)?;
    let template = Template::open(template_path, config.color_mode)?;

    let bytes = std::fs::read(screen_path).map_err(|e| {
        LocateError::invalid_input(format!("cannot read {}: {e}", screen_path.display()))
    })?;
    let screen = Bitmap::decode(&bytes, config.color_mode)?;
    log::debug!(
        "screen {}x{}, template '{}' {}x{}",
        screen.width(),
        screen.height(),
        template.name(),
        template.bitmap().width(),
        template.bitmap().height()
    );

    let found = locate(&screen, template.bitmap(), config.threshold)?;
    let (x, y) = found.anchor(config.anchor);

    if args.json {
        let report = json!({
            "template": template.name(),
            "match": found,
            "tap": { "x": x, "y": y },
        });
        println!("{}", serde_json::to_string_pretty(&report).unwrap_or_default());
    } else {
        println!("✅ '{}' found at {}", template.name(), found);
        println!("👆 Tap point: ({}, {})", x, y);
    }
    Ok(())
}

fn print_capabilities(platform: Platform) -> LocateResult<()> {
    let cloud = CloudConfig::from_env()?;
    log::info!("cloud hub: {}", cloud.hub_url());

    let caps = CapabilitySet::for_platform(platform, &cloud, "screen-locator").experibank();
    println!(
        "{}",
        serde_json::to_string_pretty(&caps.to_session_request()).unwrap_or_default()
    );
    Ok(())
}
