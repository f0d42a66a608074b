//! Micro-simulation harness for deterministic, fixed-timestep scenario tests.
//!
//! A microsim drives a small scenario the way the headless runner drives the
//! real simulation: a fixed frame delta, stepped for a fixed number of frames.
//! Selected state is sampled at a configurable cadence and the sampled
//! timeline is compared against a golden JSON file on disk (bootstrapped on
//! first run, updated with `SV_UPDATE_SNAPSHOTS=1`). Because the same config
//! always produces the same timeline, running a scenario twice with fresh
//! state doubles as a determinism check.

use crate::snapshot::assert_json_snapshot;
use anyhow::Result;
use serde::Serialize;
use std::path::PathBuf;

/// Configuration for a microsim scenario.
#[derive(Debug, Clone)]
pub struct MicrosimConfig {
    /// Human-readable name (written into the timeline report).
    pub name: String,
    /// Number of frames to step.
    pub frames: u64,
    /// Fixed per-frame delta in seconds, passed to the step closure.
    pub frame_dt: f32,
    /// Sample the state every this many frames. Frame 0 and the final frame
    /// are always sampled; zero is treated as one (sample every frame).
    pub sample_every: u64,
    /// Path to the golden JSON file.
    pub snapshot_path: PathBuf,
}

impl MicrosimConfig {
    /// A 60 Hz scenario sampled every frame, matching the headless runner's
    /// frame rate.
    pub fn at_60hz(name: impl Into<String>, frames: u64, snapshot_path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            frames,
            frame_dt: 1.0 / 60.0,
            sample_every: 1,
            snapshot_path: snapshot_path.into(),
        }
    }
}

/// One sampled point on the timeline.
#[derive(Debug, Clone, Serialize)]
pub struct MicrosimSample<S> {
    /// Frame index the sample was taken after (0 is the initial state).
    pub frame: u64,
    /// Accumulated simulation time in seconds, fixed-precision so the golden
    /// does not depend on float formatting.
    pub sim_time: String,
    /// Snapshot payload.
    pub snapshot: S,
}

#[derive(Debug, Clone, Serialize)]
struct MicrosimReport<S> {
    name: String,
    frame_dt: String,
    samples: Vec<MicrosimSample<S>>,
}

/// Run a microsim and assert (or bootstrap) the golden at `config.snapshot_path`.
///
/// The step closure receives the frame index and the fixed frame delta; the
/// snapshot closure receives the index of the last completed frame.
pub fn run_microsim<State, Snapshot, StepFn, SnapFn>(
    config: MicrosimConfig,
    mut state: State,
    mut step: StepFn,
    mut snapshot: SnapFn,
) -> Result<()>
where
    Snapshot: Serialize,
    StepFn: FnMut(u64, f32, &mut State),
    SnapFn: FnMut(u64, &State) -> Snapshot,
{
    let cadence = config.sample_every.max(1);
    let mut samples = Vec::with_capacity((config.frames / cadence) as usize + 2);

    samples.push(MicrosimSample {
        frame: 0,
        sim_time: "0.0000".to_string(),
        snapshot: snapshot(0, &state),
    });

    for frame in 0..config.frames {
        step(frame, config.frame_dt, &mut state);
        let done = frame + 1;
        if done % cadence == 0 || done == config.frames {
            samples.push(MicrosimSample {
                frame: done,
                sim_time: format!("{:.4}", done as f64 * config.frame_dt as f64),
                snapshot: snapshot(done, &state),
            });
        }
    }

    let report = MicrosimReport {
        name: config.name,
        frame_dt: format!("{:.6}", config.frame_dt),
        samples,
    };
    assert_json_snapshot(config.snapshot_path, &report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_golden(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "stormvale_microsim_{}_{}.json",
            name,
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ))
    }

    #[test]
    fn samples_honor_cadence_and_always_include_the_last_frame() {
        let path = temp_golden("cadence");
        let mut sampled = Vec::new();
        run_microsim(
            MicrosimConfig {
                name: "cadence".into(),
                frames: 10,
                frame_dt: 0.5,
                sample_every: 4,
                snapshot_path: path.clone(),
            },
            0u64,
            |_, _, count| *count += 1,
            |frame, count| {
                sampled.push(frame);
                serde_json::json!({ "count": count })
            },
        )
        .unwrap();
        assert_eq!(sampled, vec![0, 4, 8, 10]);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn step_receives_the_configured_frame_dt() {
        let path = temp_golden("dt");
        run_microsim(
            MicrosimConfig::at_60hz("dt", 3, path.clone()),
            0.0f32,
            |_, dt, elapsed| {
                assert_eq!(dt, 1.0 / 60.0);
                *elapsed += dt;
            },
            |_, elapsed| serde_json::json!({ "elapsed": format!("{elapsed:.4}") }),
        )
        .unwrap();
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn second_run_verifies_against_the_bootstrapped_golden() {
        let path = temp_golden("replay");
        let scenario = || {
            run_microsim(
                MicrosimConfig {
                    name: "replay".into(),
                    frames: 6,
                    frame_dt: 0.25,
                    sample_every: 2,
                    snapshot_path: path.clone(),
                },
                1u64,
                |_, _, v| *v = v.wrapping_mul(3).wrapping_add(1),
                |_, v| serde_json::json!({ "value": v }),
            )
        };
        scenario().unwrap();
        scenario().unwrap();
        std::fs::remove_file(&path).ok();
    }
}
