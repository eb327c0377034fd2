//! Motion Map - gesture-driven keyboard and mouse input
//!
//! Replays or streams pose frames through the gesture detector and dispatches
//! the resulting input.

use motion_map::app::cli::{Backend, Cli, Commands, ConfigAction};
use motion_map::app::config::Config;
use motion_map::dispatch::injector::{InputInjector, NoopInjector, RecordingInjector};
use motion_map::dispatch::mapping::SharedSettings;
use motion_map::gesture::library::GestureLibrary;
use motion_map::session::{ReplaySource, Session};
use motion_map::time::timebase::Timebase;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    // Parse CLI arguments first so we can use --verbose to set log level
    let cli = Cli::parse_args();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    Timebase::init();

    let config_path = Config::resolve_path(cli.config.as_deref());
    let config = match &cli.command {
        // Both write a fresh default file and must work when none exists yet
        Commands::Init { .. }
        | Commands::Config {
            action: ConfigAction::Reset { .. },
        } => Config::default(),
        _ if cli.config.is_some() => Config::load(&config_path)?,
        _ => Config::load_default()?,
    };

    match cli.command {
        Commands::Run {
            input,
            fast,
            dry_run,
            backend,
        } => {
            run_session(&input, !fast, dry_run, backend, &config)?;
        }
        Commands::Gestures { detailed } => {
            run_gestures(detailed, &config);
        }
        Commands::Init { force } => {
            run_init(force, &config, &config_path)?;
        }
        Commands::Config { action } => {
            run_config(action, &config, &config_path)?;
        }
    }

    Ok(())
}

fn run_session(
    input: &Path,
    realtime: bool,
    dry_run: bool,
    backend: Backend,
    config: &Config,
) -> anyhow::Result<()> {
    if !input.exists() {
        anyhow::bail!("Frame file not found: {:?}", input);
    }

    let mut dispatch_settings = config.dispatch_settings();
    if dry_run {
        dispatch_settings.keyboard_enabled = false;
    }
    let settings = SharedSettings::new(dispatch_settings);

    let recorder = Arc::new(RecordingInjector::new());
    let injector: Arc<dyn InputInjector> = match backend {
        Backend::Record => recorder.clone(),
        Backend::Noop => Arc::new(NoopInjector),
        Backend::Os => os_injector()?,
    };

    let source = ReplaySource::open(input)?.with_realtime(realtime);
    info!(input = %input.display(), realtime, dry_run, ?backend, "Starting");

    let handle = Session::start_with_library(
        Box::new(source),
        injector,
        settings,
        config.library(),
        config.session_options(),
    )?;

    let stop = handle.stop_signal();
    ctrlc::set_handler(move || {
        stop.stop();
    })?;

    info!("Running... Press Ctrl+C to stop");
    let report = handle.wait()?;

    println!("\nSession finished");
    println!("  Frames read:      {}", report.frames_read);
    println!("  Frames evaluated: {}", report.frames_evaluated);
    println!("  Frames skipped:   {}", report.frames_skipped);
    println!("  Frames dropped:   {}", report.frames_dropped);
    println!("  Gestures fired:   {}", report.gestures_fired);

    if !report.history_summary.is_empty() {
        println!("\nRecent gestures:\n{}", report.history_summary);
    }

    if backend == Backend::Record {
        let actions = recorder.actions();
        let (mx, my) = recorder.total_motion();
        println!("\nInjected actions ({}):", actions.len());
        for action in &actions {
            println!("  {}", action);
        }
        if mx != 0 || my != 0 {
            println!("  mouse motion total: ({}, {})", mx, my);
        }
    }

    Ok(())
}

#[cfg(feature = "enigo")]
fn os_injector() -> anyhow::Result<Arc<dyn InputInjector>> {
    let injector = motion_map::dispatch::injector::EnigoInjector::new()?;
    Ok(Arc::new(injector))
}

#[cfg(not(feature = "enigo"))]
fn os_injector() -> anyhow::Result<Arc<dyn InputInjector>> {
    anyhow::bail!("The os backend needs a build with `--features enigo`")
}

fn run_gestures(detailed: bool, config: &Config) {
    let library: GestureLibrary = config.library();
    println!("Gestures ({}):", library.len());

    for gesture in library.gestures() {
        let mapping = config.mappings.get(&gesture.name);
        let mapped = match mapping {
            Some(m) if !m.active => "(inactive)".to_string(),
            Some(m) => match m.mouse_scroll {
                Some(delta) if m.combination().is_empty() => format!("scroll={}", delta),
                Some(delta) => format!("{} scroll={}", m.combination(), delta),
                None => m.combination().to_string(),
            },
            None => "(unmapped)".to_string(),
        };
        println!("  {:<16} {:<15} {}", gesture.name, gesture.kind, mapped);

        if detailed {
            println!("      {}", gesture.description);
            for (i, checkpoint) in gesture.checkpoints.iter().enumerate() {
                if checkpoint.decay_window.is_zero() {
                    println!("      [{}] {}", i + 1, checkpoint.predicate);
                } else {
                    println!(
                        "      [{}] {}  (latched {} ms)",
                        i + 1,
                        checkpoint.predicate,
                        checkpoint.decay_window.as_millis()
                    );
                }
            }
        }
    }

    if detailed {
        println!("\nExclusion groups:");
        for group in library.groups() {
            match group.hold_off {
                Some(d) if config.detection.exclusion_hold_off => {
                    println!("  {}  (hold-off {} ms)", group.members.join(", "), d.as_millis())
                }
                _ => println!("  {}", group.members.join(", ")),
            }
        }
    }
}

fn run_init(force: bool, config: &Config, config_path: &Path) -> anyhow::Result<()> {

    if config_path.exists() && !force {
        anyhow::bail!(
            "Config already exists at {:?}. Use --force to overwrite.",
            config_path
        );
    }

    config.save(config_path)?;
    println!("Created config at {:?}", config_path);
    println!("\nConfig content:\n{}", config.to_toml()?);

    Ok(())
}

fn run_config(action: ConfigAction, config: &Config, config_path: &Path) -> anyhow::Result<()> {
    match action {
        ConfigAction::Show => {
            println!("Configuration ({:?}):\n", config_path);
            println!("{}", config.to_toml()?);
        }
        ConfigAction::Path => {
            println!("{}", config_path.display());
            if !config_path.exists() {
                warn!("Config file does not exist yet; defaults are in use");
            }
        }
        ConfigAction::Get { key } => match config.get_value(&key)? {
            Some(v) => println!("{} = {}", key, v),
            None => anyhow::bail!("Configuration key '{}' not found", key),
        },
        ConfigAction::Reset { force } => {
            if config_path.exists() && !force {
                println!("Config exists at {:?}", config_path);
                println!("Use --force to reset to defaults");
                return Ok(());
            }

            Config::default().save(config_path)?;
            println!("Configuration reset to defaults at {:?}", config_path);
        }
    }

    Ok(())
}
