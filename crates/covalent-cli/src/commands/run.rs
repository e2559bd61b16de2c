use crate::cli::RunArgs;
use crate::config::FileConfig;
use crate::error::{CliError, Result};
use crate::utils::progress::CliProgressHandler;
use covalent::core::io::snapshot;
use covalent::engine::progress::ProgressReporter;
use covalent::engine::simulation::{Simulation, SimulationState};
use covalent::workflows::{self, presets, run::RunSummary};
use nalgebra::Point3;
use std::path::Path;
use tracing::{info, warn};

pub fn run(args: RunArgs) -> Result<()> {
    info!("Building configuration from file and CLI arguments...");
    let config = FileConfig::build(args.config.as_deref(), &args)?;
    let overrides_given = args.config.is_some() || !args.set_values.is_empty() || args.seed.is_some();

    let mut simulation = match &args.resume {
        Some(path) => {
            let mut simulation = resume_from(path)?;
            if overrides_given {
                info!("Replacing the saved configuration with the one given on the command line.");
                simulation.set_config(config.simulation.clone())?;
            }
            simulation
        }
        None => Simulation::new(config.simulation.clone())?,
    };

    seed_scene(&mut simulation, &config)?;
    if simulation.system().atom_count() == 0 {
        warn!("The scene is empty; nothing will move.");
        println!("Warning: no atoms in the scene. Use --preset or --random-atoms to add some.");
    }

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    println!(
        "Running {} tick(s) with {} atom(s)...",
        config.run.ticks,
        simulation.system().atom_count()
    );
    let summary = workflows::run::run(&mut simulation, &config.run, &reporter)?;
    print_summary(&summary);

    if let Some(output) = &args.output {
        simulation.save(output)?;
        println!("✓ Final state written to: {}", output.display());
    }
    Ok(())
}

fn resume_from(path: &Path) -> Result<Simulation> {
    info!("Loading saved state from {:?}", path);
    let state: SimulationState =
        snapshot::read_json(path).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })?;
    let (simulation, report) = Simulation::from_state(state)?;
    if !report.is_clean() {
        warn!(
            dropped_atoms = report.dropped_atoms,
            dropped_bonds = report.dropped_bonds,
            mismatched_molecules = report.mismatched_molecules,
            "Saved state was repaired while loading."
        );
    }
    Ok(simulation)
}

fn seed_scene(simulation: &mut Simulation, config: &FileConfig) -> Result<()> {
    for placement in &config.scene.presets {
        placement
            .preset
            .build(simulation, Point3::from(placement.center))?;
    }
    if config.scene.random_atoms > 0 {
        presets::add_random_atoms(simulation, config.scene.random_atoms)?;
    }
    Ok(())
}

fn print_summary(summary: &RunSummary) {
    let stats = &summary.final_statistics;
    println!("Simulation finished after {} tick(s).", summary.ticks_run);
    println!(
        "  Atoms: {}  Bonds: {}  Molecules: {}",
        stats.atom_count, stats.bond_count, stats.molecule_count
    );
    println!(
        "  Energy: kinetic {:.4}  potential {:.4}  total {:.4} kcal/mol",
        stats.kinetic_energy,
        stats.potential_energy.total(),
        stats.total_energy
    );
    println!(
        "  Temperature: {:.1} K (min {:.1}, mean {:.1}, max {:.1})",
        stats.temperature,
        summary.min_temperature,
        summary.mean_temperature,
        summary.max_temperature
    );
    println!(
        "  Events: {} collision(s), {} bond(s) formed, {} bond(s) broken, {} molecule(s) created",
        summary.tally.collisions,
        summary.tally.bonds_formed,
        summary.tally.bonds_broken,
        summary.tally.molecules_created
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use clap::Parser;

    fn run_args(argv: &[&str]) -> RunArgs {
        match Cli::parse_from(argv).command {
            Commands::Run(args) => args,
            _ => panic!("Expected 'run' subcommand"),
        }
    }

    #[test]
    fn run_writes_a_loadable_state() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("state.json");
        let output_str = output.to_str().unwrap();
        let args = run_args(&[
            "covalent", "run", "-p", "water", "--random-atoms", "5", "-n", "20", "--seed", "3",
            "-o", output_str,
        ]);

        run(args).unwrap();

        let state: SimulationState = snapshot::read_json(&output).unwrap();
        assert_eq!(state.tick, 20);
        assert_eq!(state.system.atoms.len(), 8);
        assert_eq!(state.config.seed, Some(3));
    }

    #[test]
    fn resume_continues_the_clock() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("first.json");
        let second = dir.path().join("second.json");

        run(run_args(&[
            "covalent", "run", "-p", "methane", "-n", "5", "--seed", "1", "-o",
            first.to_str().unwrap(),
        ]))
        .unwrap();
        run(run_args(&[
            "covalent", "run", "-r", first.to_str().unwrap(), "-n", "7", "-o",
            second.to_str().unwrap(),
        ]))
        .unwrap();

        let state: SimulationState = snapshot::read_json(&second).unwrap();
        assert_eq!(state.tick, 12);
        assert_eq!(state.system.atoms.len(), 5);
    }

    #[test]
    fn missing_resume_file_is_reported() {
        let args = run_args(&["covalent", "run", "-r", "/nonexistent/state.json", "-n", "1"]);
        assert!(matches!(run(args), Err(CliError::FileParsing { .. })));
    }
}
