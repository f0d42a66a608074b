//! stormvale - a deterministic small-town severe-weather sandbox engine
//!
//! Headless runner: generates (or loads) a town, steps the weather
//! simulation for a fixed number of frames and reports what the storm left
//! standing. Rendering clients drive the same crates through their own loop.

use anyhow::Result;
use std::env;
use std::path::PathBuf;
use stormvale_testkit::{EventRecord, JsonlSink, ReportSink, RunReport, WorldDigest};
use stormvale_weather::{SimSettings, WeatherOrchestrator};
use stormvale_world::{SaveStore, WorldGrid};
use tracing::{info, warn};

/// Fixed headless frame delta (60 Hz).
const FRAME_DT: f32 = 1.0 / 60.0;

fn main() -> Result<()> {
    // Default to info so run summaries print; override via RUST_LOG.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Starting stormvale v{}", env!("CARGO_PKG_VERSION"));

    let cli = CliOptions::parse(env::args().skip(1));
    run(cli)
}

fn run(cli: CliOptions) -> Result<()> {
    let store = match &cli.save_path {
        Some(path) => Some(SaveStore::new(path)?),
        None => None,
    };

    // A save file carries its own seed and dimensions; they win over the
    // command line, otherwise the saved town would land on foreign terrain.
    let mut grid = match store.as_ref().filter(|s| s.exists() && !cli.reset_world) {
        Some(store) => {
            let snapshot = store.load()?;
            if snapshot.seed != cli.seed
                || snapshot.width != cli.width
                || snapshot.depth != cli.depth
            {
                warn!(
                    saved_seed = snapshot.seed,
                    saved_width = snapshot.width,
                    saved_depth = snapshot.depth,
                    "save file overrides the requested seed and size"
                );
            }
            info!(buildings = snapshot.buildings.len(), "loaded saved town");
            WorldGrid::from_snapshot(&snapshot)
        }
        None => WorldGrid::new(cli.width, cli.depth, cli.seed),
    };

    let mut weather = WeatherOrchestrator::new(grid.seed());
    weather.set_auto_spawn(cli.auto_tornado);
    if cli.tornado {
        let id = weather.spawn_tornado(&grid, None);
        info!(id = id.0, "spawned initial tornado");
    }

    let settings = SimSettings {
        storm_intensity: cli.storm,
        time_scale: cli.time_scale,
        ..SimSettings::default()
    };

    let mut events = match &cli.events_log {
        Some(path) => Some(JsonlSink::create(path)?),
        None => None,
    };

    let mut siren_was_active = false;
    for frame in 0..cli.frames {
        let report = weather.update(&mut grid, FRAME_DT, settings);

        if let Some(sink) = events.as_mut() {
            if report.siren_active != siren_was_active {
                sink.write(&EventRecord {
                    frame,
                    kind: "siren",
                    payload: if report.siren_active { "on" } else { "off" },
                })?;
            }
            for flash in &report.flashes {
                sink.write(&EventRecord {
                    frame,
                    kind: "lightning",
                    payload: &format!("strength={:.2}", flash.strength),
                })?;
            }
            if report.buildings_changed {
                sink.write(&EventRecord {
                    frame,
                    kind: "destruction",
                    payload: "building",
                })?;
            }
            if report.tornadoes_spawned > 0 {
                sink.write(&EventRecord {
                    frame,
                    kind: "tornado",
                    payload: "spawned",
                })?;
            }
            if report.tornadoes_expired > 0 {
                sink.write(&EventRecord {
                    frame,
                    kind: "tornado",
                    payload: "expired",
                })?;
            }
        }
        siren_was_active = report.siren_active;
    }

    let snapshot = grid.to_snapshot();
    if let Some(store) = &store {
        store.save(&snapshot)?;
        info!(path = ?cli.save_path, "saved town");
    }
    if let Some(path) = &cli.export_json {
        SaveStore::export_json(path, &snapshot)?;
        info!(?path, "exported snapshot JSON");
    }

    let digest = WorldDigest::capture(&grid);
    let destroyed = weather.destroyed_tiles().len();
    if let Some(path) = &cli.report_path {
        let report = RunReport::new("stormvale_headless", cli.frames, destroyed, digest.clone());
        ReportSink::create(path)?.write(&report)?;
        info!(?path, "wrote run report");
    }

    info!(
        frames = cli.frames,
        clock_hour = weather.clock().hour(),
        buildings = digest.buildings,
        trees = digest.trees,
        destroyed_tiles = destroyed,
        "run complete"
    );
    Ok(())
}

/// Command-line options for the headless runner.
struct CliOptions {
    seed: i64,
    width: usize,
    depth: usize,
    frames: u64,
    storm: f32,
    time_scale: f32,
    tornado: bool,
    auto_tornado: bool,
    reset_world: bool,
    save_path: Option<PathBuf>,
    events_log: Option<PathBuf>,
    export_json: Option<PathBuf>,
    report_path: Option<PathBuf>,
}

impl CliOptions {
    fn parse<I: Iterator<Item = String>>(mut args: I) -> Self {
        let mut opts = CliOptions {
            seed: 42,
            width: 64,
            depth: 64,
            frames: 3600,
            storm: 0.0,
            time_scale: 1.0,
            tornado: false,
            auto_tornado: false,
            reset_world: false,
            save_path: None,
            events_log: None,
            export_json: None,
            report_path: None,
        };

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--seed" => {
                    if let Some(raw) = args.next() {
                        match raw.parse() {
                            Ok(value) => opts.seed = value,
                            Err(err) => {
                                tracing::error!(%err, value = %raw, "--seed must be an integer")
                            }
                        }
                    } else {
                        tracing::error!("--seed requires an integer");
                    }
                }
                "--size" => {
                    if let Some(raw) = args.next() {
                        match parse_size(&raw) {
                            Some((w, d)) => {
                                opts.width = w;
                                opts.depth = d;
                            }
                            None => {
                                tracing::error!(value = %raw, "--size must be like 64x64")
                            }
                        }
                    } else {
                        tracing::error!("--size requires a value like 64x64");
                    }
                }
                "--frames" => {
                    if let Some(raw) = args.next() {
                        match raw.parse() {
                            Ok(value) => opts.frames = value,
                            Err(err) => {
                                tracing::error!(%err, value = %raw, "--frames must be an integer")
                            }
                        }
                    } else {
                        tracing::error!("--frames requires an integer");
                    }
                }
                "--storm" => {
                    if let Some(raw) = args.next() {
                        match raw.parse::<f32>() {
                            Ok(value) => opts.storm = value.clamp(0.0, 1.0),
                            Err(err) => {
                                tracing::error!(%err, value = %raw, "--storm must be a number in [0, 1]")
                            }
                        }
                    } else {
                        tracing::error!("--storm requires a number in [0, 1]");
                    }
                }
                "--time-scale" => {
                    if let Some(raw) = args.next() {
                        match raw.parse::<f32>() {
                            Ok(value) => opts.time_scale = value.max(0.0),
                            Err(err) => {
                                tracing::error!(%err, value = %raw, "--time-scale must be a number")
                            }
                        }
                    } else {
                        tracing::error!("--time-scale requires a number");
                    }
                }
                "--tornado" => opts.tornado = true,
                "--auto-tornado" => opts.auto_tornado = true,
                "--reset-world" => opts.reset_world = true,
                "--save" => {
                    if let Some(path) = args.next() {
                        opts.save_path = Some(PathBuf::from(path));
                    } else {
                        tracing::error!("--save requires a file path");
                    }
                }
                "--events-log" => {
                    if let Some(path) = args.next() {
                        opts.events_log = Some(PathBuf::from(path));
                    } else {
                        tracing::error!("--events-log requires a file path");
                    }
                }
                "--export-json" => {
                    if let Some(path) = args.next() {
                        opts.export_json = Some(PathBuf::from(path));
                    } else {
                        tracing::error!("--export-json requires a file path");
                    }
                }
                "--report" => {
                    if let Some(path) = args.next() {
                        opts.report_path = Some(PathBuf::from(path));
                    } else {
                        tracing::error!("--report requires a file path");
                    }
                }
                other => {
                    tracing::warn!(arg = %other, "ignoring unknown argument");
                }
            }
        }

        opts
    }
}

fn parse_size(raw: &str) -> Option<(usize, usize)> {
    let (w, d) = raw.split_once('x')?;
    let w = w.parse().ok()?;
    let d = d.parse().ok()?;
    if w == 0 || d == 0 {
        return None;
    }
    Some((w, d))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> CliOptions {
        CliOptions::parse(args.iter().map(|s| s.to_string()))
    }

    #[test]
    fn defaults_are_sensible() {
        let opts = parse(&[]);
        assert_eq!(opts.seed, 42);
        assert_eq!((opts.width, opts.depth), (64, 64));
        assert_eq!(opts.frames, 3600);
        assert!(!opts.tornado);
    }

    #[test]
    fn parses_seed_size_and_frames() {
        let opts = parse(&["--seed", "-9", "--size", "48x32", "--frames", "100"]);
        assert_eq!(opts.seed, -9);
        assert_eq!((opts.width, opts.depth), (48, 32));
        assert_eq!(opts.frames, 100);
    }

    #[test]
    fn bad_size_is_rejected() {
        assert!(parse_size("64").is_none());
        assert!(parse_size("0x32").is_none());
        assert!(parse_size("axb").is_none());
        assert_eq!(parse_size("48x32"), Some((48, 32)));
    }

    #[test]
    fn storm_is_clamped() {
        let opts = parse(&["--storm", "7.5"]);
        assert_eq!(opts.storm, 1.0);
    }
}
