use crate::engine::error::EngineError;
use crate::engine::events::EventTally;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::simulation::Simulation;
use crate::engine::stats::Statistics;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct RunOptions {
    pub ticks: u64,
    /// Emit a [`Progress::Sample`] every this many ticks; zero disables sampling.
    pub sample_interval: u64,
    /// When set, the state is written here at every sample and at the end of the run.
    pub checkpoint: Option<PathBuf>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            ticks: 1000,
            sample_interval: 100,
            checkpoint: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub ticks_run: u64,
    pub tally: EventTally,
    pub final_statistics: Statistics,
    pub min_temperature: f64,
    pub max_temperature: f64,
    pub mean_temperature: f64,
}

/// Advances `simulation` for the requested number of ticks.
///
/// A paused simulation is resumed for the duration of the run and paused again afterwards.
///
/// # Errors
///
/// Returns [`EngineError::Snapshot`] if a checkpoint cannot be written.
#[instrument(skip_all, name = "run_workflow")]
pub fn run(
    simulation: &mut Simulation,
    options: &RunOptions,
    reporter: &ProgressReporter,
) -> Result<RunSummary, EngineError> {
    reporter.report(Progress::PhaseStart { name: "Simulation" });
    info!(
        ticks = options.ticks,
        atoms = simulation.system().atom_count(),
        "Starting simulation run."
    );

    let was_paused = simulation.is_paused();
    if was_paused {
        warn!("Simulation was paused; resuming for this run.");
        simulation.resume();
    }

    let mut tally = EventTally::default();
    let mut min_temperature = f64::INFINITY;
    let mut max_temperature = f64::NEG_INFINITY;
    let mut temperature_sum = 0.0;

    reporter.report(Progress::TaskStart {
        total_steps: options.ticks,
    });
    for i in 1..=options.ticks {
        let report = simulation.step();
        tally.record_all(&report.events);

        let stats = &report.statistics;
        min_temperature = min_temperature.min(stats.temperature);
        max_temperature = max_temperature.max(stats.temperature);
        temperature_sum += stats.temperature;

        if options.sample_interval > 0 && i % options.sample_interval == 0 {
            reporter.report(Progress::Sample {
                tick: stats.tick,
                temperature: stats.temperature,
                molecules: stats.molecule_count,
                bonds: stats.bond_count,
            });
            if let Some(path) = &options.checkpoint {
                write_checkpoint(simulation, path, reporter)?;
            }
        }
        reporter.report(Progress::TaskIncrement);
    }
    reporter.report(Progress::TaskFinish);

    if let Some(path) = &options.checkpoint {
        write_checkpoint(simulation, path, reporter)?;
    }
    if was_paused {
        simulation.pause();
    }

    let summary = if options.ticks == 0 {
        RunSummary {
            ticks_run: 0,
            tally,
            final_statistics: simulation.statistics().clone(),
            min_temperature: 0.0,
            max_temperature: 0.0,
            mean_temperature: 0.0,
        }
    } else {
        RunSummary {
            ticks_run: options.ticks,
            tally,
            final_statistics: simulation.statistics().clone(),
            min_temperature,
            max_temperature,
            mean_temperature: temperature_sum / options.ticks as f64,
        }
    };

    reporter.report(Progress::PhaseFinish);
    info!(
        ticks = summary.ticks_run,
        bonds_formed = summary.tally.bonds_formed,
        bonds_broken = summary.tally.bonds_broken,
        molecules = summary.final_statistics.molecule_count,
        "Simulation run complete."
    );
    Ok(summary)
}

fn write_checkpoint(
    simulation: &Simulation,
    path: &Path,
    reporter: &ProgressReporter,
) -> Result<(), EngineError> {
    simulation.save(path)?;
    reporter.report(Progress::Message(format!(
        "Checkpoint at tick {} written to {}",
        simulation.tick(),
        path.display()
    )));
    Ok(())
}
