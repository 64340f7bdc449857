use screen_locator::{ColorMode, Platform, TapAnchor};
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq)]
pub enum Mode {
    Locate { screen: PathBuf, template: PathBuf },
    Capabilities(Platform),
}

#[derive(Debug)]
pub struct Args {
    pub mode: Mode,
    pub threshold: Option<f32>,
    pub anchor: Option<TapAnchor>,
    pub color_mode: Option<ColorMode>,
    pub config: Option<PathBuf>,
    pub json: bool,
    pub debug_mode: bool,
}

impl Args {
    pub fn parse() -> Option<Self> {
        Self::parse_from(env::args().skip(1))
    }

    /// Parse flags, program name already stripped. `None` means exit.
    pub fn parse_from(args: impl IntoIterator<Item = String>) -> Option<Self> {
        let mut screen: Option<PathBuf> = None;
        let mut template: Option<PathBuf> = None;
        let mut platform: Option<Platform> = None;
        let mut threshold: Option<f32> = None;
        let mut anchor: Option<TapAnchor> = None;
        let mut color_mode: Option<ColorMode> = None;
        let mut config: Option<PathBuf> = None;
        let mut json = false;
        let mut debug_mode = false;

        for arg in args {
            if arg == "--help" || arg == "-h" {
                print_help();
                return None;
            } else if arg == "--version" || arg == "-v" {
                println!("Screen Locator v{}", env!("CARGO_PKG_VERSION"));
                return None;
            } else if arg == "--debug" {
                debug_mode = true;
            } else if arg == "--json" {
                json = true;
            } else if let Some(val) = arg.strip_prefix("--screen=") {
                screen = Some(PathBuf::from(val));
            } else if let Some(val) = arg.strip_prefix("--template=") {
                template = Some(PathBuf::from(val));
            } else if let Some(val) = arg.strip_prefix("--config=") {
                config = Some(PathBuf::from(val));
            } else if let Some(val) = arg.strip_prefix("--capabilities=") {
                match val.parse::<Platform>() {
                    Ok(p) => platform = Some(p),
                    Err(e) => {
                        eprintln!("❌ {e}");
                        return None;
                    }
                }
            } else if let Some(val) = arg.strip_prefix("--threshold=") {
                match val.parse::<f32>() {
                    Ok(t) => threshold = Some(t),
                    Err(_) => {
                        eprintln!("❌ Invalid threshold value: {}", val);
                        return None;
                    }
                }
            } else if let Some(val) = arg.strip_prefix("--anchor=") {
                anchor = match val {
                    "center" => Some(TapAnchor::Center),
                    "top-left" => Some(TapAnchor::TopLeft),
                    other => {
                        eprintln!("❌ Unknown anchor '{}', expected 'center' or 'top-left'", other);
                        return None;
                    }
                };
            } else if let Some(val) = arg.strip_prefix("--color=") {
                color_mode = match val {
                    "rgb" => Some(ColorMode::Rgb),
                    "luma" => Some(ColorMode::Luma),
                    other => {
                        eprintln!("❌ Unknown color mode '{}', expected 'rgb' or 'luma'", other);
                        return None;
                    }
                };
            } else {
                eprintln!("❌ Unknown argument: {}", arg);
                print_help();
                return None;
            }
        }

        let mode = match (screen, template, platform) {
            (Some(screen), Some(template), None) => Mode::Locate { screen, template },
            (None, None, Some(platform)) => Mode::Capabilities(platform),
            (None, None, None) => {
                print_help();
                return None;
            }
            _ => {
                eprintln!("❌ Use either --screen with --template, or --capabilities");
                return None;
            }
        };

        Some(Args {
            mode,
            threshold,
            anchor,
            color_mode,
            config,
            json,
            debug_mode,
        })
    }
}

fn print_help() {
    println!("🔎 Screen Locator");
    println!();
    println!("USAGE:");
    println!("    screen-locator --screen=<png> --template=<png> [FLAGS]");
    println!("    screen-locator --capabilities=<android|ios>");
    println!();
    println!("FLAGS:");
    println!("    --screen=<file>          Screenshot to search");
    println!("    --template=<file>        Template image; a name like 'btn_[10,20,30,40].png'");
    println!("                             crops that region first");
    println!("    --threshold=<0..1>       Minimum score to accept (default: 0.8)");
    println!("    --anchor=<top-left|center>  Point reported as the tap target (default: top-left)");
    println!("    --color=<rgb|luma>       Channels used for matching (default: rgb)");
    println!("    --config=<file>          Locator settings as JSON");
    println!("    --json                   Print the result as JSON");
    println!("    --capabilities=<os>      Print session capabilities built from the environment");
    println!("    --debug                  Enable debug logging");
    println!("    --help, -h               Show this help message");
    println!("    --version, -v            Show version information");
    println!();
    println!("EXAMPLES:");
    println!("    screen-locator --screen=home.png --template=searchBar.png");
    println!("    screen-locator --screen=home.png --template=searchBar.png --threshold=0.9 --json");
    println!("    ACCESS_KEY=... screen-locator --capabilities=android");
}
