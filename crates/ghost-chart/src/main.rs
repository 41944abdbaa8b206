use anyhow::Context;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use ghost_chart::config::LaunchFlags;
use ghost_chart::prelude::*;
use ghost_chart::simulator::{run_simulator, SimulatorConfig};
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("ghost_chart=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Command::new("ghost-chart")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Headless ghost-chart onboarding animation")
        .subcommand_required(true)
        .subcommand(
            Command::new("play")
                .about("Play one run and print where it ended")
                .arg(
                    Arg::new("width")
                        .long("width")
                        .default_value("800")
                        .value_parser(value_parser!(f64))
                        .help("Container width in pixels"),
                )
                .arg(
                    Arg::new("height")
                        .long("height")
                        .default_value("480")
                        .value_parser(value_parser!(f64))
                        .help("Container height in pixels"),
                )
                .arg(
                    Arg::new("seed")
                        .long("seed")
                        .value_parser(value_parser!(u64))
                        .help("Jitter seed for a reproducible grid"),
                )
                .arg(
                    Arg::new("skip")
                        .long("skip")
                        .action(ArgAction::SetTrue)
                        .help("Jump straight to the final state"),
                )
                .arg(
                    Arg::new("live")
                        .long("live")
                        .action(ArgAction::SetTrue)
                        .help("Live mode: no grid intro"),
                )
                .arg(
                    Arg::new("speed")
                        .long("speed")
                        .value_parser(value_parser!(f64))
                        .help("Playback speed multiplier"),
                )
                .arg(
                    Arg::new("query")
                        .long("query")
                        .help("Launch query string, e.g. '?skip=true&mode=live'"),
                )
                .arg(
                    Arg::new("config")
                        .long("config")
                        .value_parser(value_parser!(PathBuf))
                        .help("TOML configuration file"),
                )
                .arg(
                    Arg::new("realtime")
                        .long("realtime")
                        .action(ArgAction::SetTrue)
                        .help("Play against the wall clock; Ctrl-C stops"),
                )
                .arg(
                    Arg::new("svg")
                        .long("svg")
                        .value_parser(value_parser!(PathBuf))
                        .help("Write the final scene as SVG"),
                )
                .arg(
                    Arg::new("trace")
                        .long("trace")
                        .action(ArgAction::SetTrue)
                        .help("Print the recorded trace"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output as JSON"),
                ),
        )
        .subcommand(
            Command::new("simulate")
                .about("Run randomized scenarios against the sequencer")
                .arg(
                    Arg::new("scenarios")
                        .long("scenarios")
                        .default_value("50")
                        .value_parser(value_parser!(u64))
                        .help("Number of scenarios to play"),
                )
                .arg(
                    Arg::new("operations")
                        .long("operations")
                        .default_value("40")
                        .value_parser(value_parser!(usize))
                        .help("Host operations per scenario"),
                )
                .arg(
                    Arg::new("seed")
                        .long("seed")
                        .default_value("42")
                        .value_parser(value_parser!(u64))
                        .help("Random seed for reproducibility"),
                )
                .arg(
                    Arg::new("keep-going")
                        .long("keep-going")
                        .action(ArgAction::SetTrue)
                        .help("Do not stop at the first violation"),
                )
                .arg(
                    Arg::new("no-skip-check")
                        .long("no-skip-check")
                        .action(ArgAction::SetTrue)
                        .help("Skip the skip-path comparison"),
                ),
        );

    match cli.get_matches().subcommand() {
        Some(("play", args)) => play(args).await,
        Some(("simulate", args)) => {
            let config = SimulatorConfig {
                seed: args.get_one::<u64>("seed").copied().unwrap_or(42),
                scenarios: args.get_one::<u64>("scenarios").copied().unwrap_or(50),
                operations_per_scenario: args.get_one::<usize>("operations").copied().unwrap_or(40),
                stop_on_first_violation: !args.get_flag("keep-going"),
                verify_skip_equivalence: !args.get_flag("no-skip-check"),
            };
            println!("Running ghost chart simulator...");
            println!("Scenarios: {}", config.scenarios);
            println!("Seed: {}", config.seed);
            println!();

            let report = run_simulator(config);
            println!("{}", report.generate_text());
            std::process::exit(if report.passed() { 0 } else { 1 });
        }
        _ => Ok(()),
    }
}

fn build_config(args: &ArgMatches) -> anyhow::Result<SequencerConfig> {
    let mut config = match args.get_one::<PathBuf>("config") {
        Some(path) => SequencerConfig::from_toml_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => SequencerConfig::default(),
    };
    if let Some(query) = args.get_one::<String>("query") {
        config = LaunchFlags::from_query(query).apply(config);
    }
    if args.get_flag("skip") {
        config = config.with_skip(true);
    }
    if args.get_flag("live") {
        config = config.with_mode(PlaybackMode::Live);
    }
    if let Some(speed) = args.get_one::<f64>("speed") {
        config = config.with_speed(*speed);
    }
    if let Some(seed) = args.get_one::<u64>("seed") {
        config = config.with_jitter_seed(*seed);
    }
    config.validate()?;
    Ok(config)
}

async fn play(args: &ArgMatches) -> anyhow::Result<()> {
    let config = build_config(args)?;
    let size = Size::new(
        args.get_one::<f64>("width").copied().unwrap_or(800.0),
        args.get_one::<f64>("height").copied().unwrap_or(480.0),
    );
    let live = config.mode == PlaybackMode::Live;

    let mut sequencer = Sequencer::new(config, StaticHost::new(size), LayoutHandle::new())?;
    if live {
        sequencer.set_series(demo_cohorts())?;
    }
    sequencer.start()?;

    if args.get_flag("realtime") {
        let (stop_tx, stop_rx) = watch::channel(false);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                let _ = stop_tx.send(true);
            }
        });
        let outcome = RealtimeDriver::new(Duration::from_millis(16))
            .run(&mut sequencer, stop_rx)
            .await;
        tracing::info!(?outcome, "Realtime playback finished");
    } else {
        sequencer.run_until_idle();
    }

    if let Some(path) = args.get_one::<PathBuf>("svg") {
        std::fs::write(path, sequencer.render_svg())
            .with_context(|| format!("writing {}", path.display()))?;
    }

    let snapshot = sequencer.snapshot();
    if args.get_flag("json") {
        let out = serde_json::json!({
            "run_state": format!("{:?}", sequencer.run_state()),
            "playback": sequencer.playback(),
            "ended_at": sequencer.now(),
            "elements": snapshot.len(),
            "fingerprint": snapshot.fingerprint(),
            "trace": sequencer.trace().entries(),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!("Run state: {:?}", sequencer.run_state());
        println!("Ended at: {}", sequencer.now());
        println!("Elements: {}", snapshot.len());
        println!("Fingerprint: {}", snapshot.fingerprint());
        if args.get_flag("trace") {
            println!();
            print!("{}", sequencer.trace().render_text());
        }
    }
    Ok(())
}
