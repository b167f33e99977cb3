use clap::{Parser, Subcommand};
use hotbar_cli::actuator::LogActuator;
use hotbar_cli::screen::PngScreen;
use hotbar_cli::{commands, logging, readline};
use hotbar_core::vision::TemplateProbe;
use hotbar_core::{ActionRegistry, ConditionBoard, HotbarConfig, NoDisplay, VisionProbe, config};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

#[derive(Parser)]
#[command(version, about = "Cooldown-aware action trigger")]
struct Args {
    /// Config file (defaults to <config dir>/hotbar/hotbar.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// PNG screenshot searched in place of the display
    #[arg(short, long)]
    screen: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), String> {
    let args = Args::parse();
    let _log_guard = logging::init_logging();

    let config = load_config(args.config)?;
    let actuator = Arc::new(LogActuator::from_config(&config));
    let probe: Arc<dyn VisionProbe> = match args.screen {
        Some(path) => {
            tracing::info!(screen = %path.display(), "Probing screenshot");
            Arc::new(TemplateProbe::new(PngScreen::new(path)))
        }
        None => {
            if config.actions.iter().any(|a| a.icon.is_some()) {
                tracing::warn!("Icons configured but no --screen given, icon checks will fail");
            }
            Arc::new(NoDisplay)
        }
    };

    let registry = ActionRegistry::build(&config, actuator, probe).map_err(|e| e.to_string())?;
    let board = Arc::new(ConditionBoard::new());
    let router = registry
        .router(Arc::clone(&board))
        .start()
        .map_err(|e| e.to_string())?;
    let started = Instant::now();

    loop {
        let line = readline()?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match respond(line, &registry, &board, started) {
            Ok(quit) => {
                if quit {
                    break;
                }
            }
            Err(err) => {
                write!(std::io::stdout(), "{err}").map_err(|e| e.to_string())?;
                std::io::stdout().flush().map_err(|e| e.to_string())?;
            }
        }
    }

    for (binding, result) in router.shutdown() {
        if let Err(e) = result {
            tracing::error!(binding = %binding, error = %e, "Binding ended with error");
        }
    }
    Ok(())
}

fn load_config(path: Option<PathBuf>) -> Result<HotbarConfig, String> {
    let path = match path.or_else(config::default_config_path) {
        Some(path) => path,
        None => return Err("error: no config dir on this platform, pass --config".to_string()),
    };
    let config = config::load_file(&path).map_err(|e| e.to_string())?;
    tracing::info!(path = %path.display(), "Config loaded");
    Ok(config)
}

#[derive(Parser)]
#[command(about = "console")]
struct Console {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Hold an input, e.g. `press key:f1`
    Press { condition: String },
    /// Release a held input
    Release { condition: String },
    /// Fire one action if it is available
    Fire { action: String },
    Status,
    Exit,
}

fn respond(
    line: &str,
    registry: &ActionRegistry,
    board: &ConditionBoard,
    started: Instant,
) -> Result<bool, String> {
    let mut args = shlex::split(line).ok_or("error: Invalid quoting")?;
    args.insert(0, "hotbar".to_string());
    let console = Console::try_parse_from(args).map_err(|e| e.to_string())?;

    let output = match &console.command {
        Some(Commands::Press { condition }) => commands::press(condition, board),
        Some(Commands::Release { condition }) => commands::release(condition, board),
        Some(Commands::Fire { action }) => commands::fire(action, registry)?,
        Some(Commands::Status) => commands::status(registry, board, started.elapsed()),
        Some(Commands::Exit) => return Ok(true),
        None => return Ok(false),
    };

    write!(std::io::stdout(), "{output}").map_err(|e| e.to_string())?;
    std::io::stdout().flush().map_err(|e| e.to_string())?;
    Ok(false)
}
