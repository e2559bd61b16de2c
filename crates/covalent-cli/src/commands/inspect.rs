use crate::cli::InspectArgs;
use crate::error::{CliError, Result};
use covalent::core::io::snapshot;
use covalent::engine::simulation::{Simulation, SimulationState};
use std::fmt::Write;
use tracing::info;

pub fn run(args: InspectArgs) -> Result<()> {
    info!("Loading saved state from {:?}", &args.input);
    let state: SimulationState =
        snapshot::read_json(&args.input).map_err(|e| CliError::FileParsing {
            path: args.input.clone(),
            source: e.into(),
        })?;
    let version = state.version.clone();
    let (simulation, report) = Simulation::from_state(state)?;

    let mut out = String::new();
    writeln!(out, "State version {} at tick {}", version, simulation.tick())
        .map_err(|e| CliError::Other(e.into()))?;
    if !report.is_clean() {
        writeln!(
            out,
            "  Repaired on load: {} atom(s) and {} bond(s) dropped, {} molecule record(s) rebuilt",
            report.dropped_atoms, report.dropped_bonds, report.mismatched_molecules
        )
        .map_err(|e| CliError::Other(e.into()))?;
    }
    render(&simulation, args.atoms, &mut out).map_err(|e| CliError::Other(e.into()))?;
    print!("{out}");
    Ok(())
}

/// Formats statistics and the molecule table (and optionally every atom) of `simulation`.
pub fn render(simulation: &Simulation, with_atoms: bool, out: &mut String) -> std::fmt::Result {
    let stats = simulation.statistics();
    let extents = simulation.space().extents();
    writeln!(out, "  Time: {:.4}", simulation.time())?;
    writeln!(
        out,
        "  Box: {:.2} x {:.2} x {:.2} (volume {:.2})",
        extents.x, extents.y, extents.z, stats.volume
    )?;
    writeln!(
        out,
        "  Atoms: {}  Bonds: {}  Molecules: {}",
        stats.atom_count, stats.bond_count, stats.molecule_count
    )?;
    writeln!(
        out,
        "  Kinetic energy: {:.4} kcal/mol  Temperature: {:.1} K  Pressure: {:.4}  Density: {:.4}",
        stats.kinetic_energy, stats.temperature, stats.pressure, stats.density
    )?;

    let system = simulation.system();
    let mut molecules: Vec<_> = system.molecules_iter().map(|(_, m)| m).collect();
    molecules.sort_by(|a, b| {
        a.formula()
            .cmp(b.formula())
            .then(a.atom_count().cmp(&b.atom_count()))
    });
    if !molecules.is_empty() {
        writeln!(out, "  Molecules:")?;
    }
    for molecule in molecules {
        let props = molecule.properties();
        writeln!(
            out,
            "    {:<12} {:<16} atoms {:>3}  bonds {:>3}  mass {:>9.3}  charge {:>6.2}  stability {:>8.2}{}",
            molecule.formula(),
            props.name.unwrap_or("-"),
            molecule.atom_count(),
            molecule.bond_count(),
            props.mass,
            props.charge,
            props.stability,
            if props.aromatic { "  aromatic" } else { "" }
        )?;
    }

    if with_atoms {
        writeln!(out, "  Atoms:")?;
        for (_, atom) in system.atoms_iter() {
            writeln!(
                out,
                "    {:<2} ({:>8.3}, {:>8.3}, {:>8.3})  bonds {}/{}{}",
                atom.element.as_str(),
                atom.position.x,
                atom.position.y,
                atom.position.z,
                atom.bond_count(),
                atom.max_bonds(),
                if atom.fixed { "  fixed" } else { "" }
            )?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use covalent::core::forcefield::params::ForceSettings;
    use covalent::engine::config::SimulationConfig;
    use covalent::workflows::presets::Preset;
    use nalgebra::Point3;

    fn simulation() -> Simulation {
        let mut sim = Simulation::new(SimulationConfig {
            forces: ForceSettings::disabled(),
            seed: Some(4),
            ..SimulationConfig::default()
        })
        .unwrap();
        Preset::Water.build(&mut sim, Point3::origin()).unwrap();
        Preset::Benzene.build(&mut sim, Point3::new(0.0, 0.0, 3.0)).unwrap();
        sim.step();
        sim
    }

    #[test]
    fn render_lists_named_molecules() {
        let sim = simulation();
        let mut out = String::new();
        render(&sim, false, &mut out).unwrap();

        assert!(out.contains("Atoms: 15  Bonds: 14  Molecules: 2"));
        assert!(out.contains("water"));
        assert!(out.contains("benzene"));
        assert!(out.contains("aromatic"));
        assert!(!out.contains("Atoms:\n"));
    }

    #[test]
    fn render_lists_atoms_on_request() {
        let sim = simulation();
        let mut out = String::new();
        render(&sim, true, &mut out).unwrap();
        assert_eq!(out.matches("\n    O ").count(), 1);
        assert_eq!(out.matches("\n    C ").count(), 6);
    }

    #[test]
    fn inspect_reads_a_saved_state() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        simulation().save(&path).unwrap();

        let args = InspectArgs {
            input: path,
            atoms: false,
        };
        run(args).unwrap();
    }

    #[test]
    fn inspect_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "not json").unwrap();

        let args = InspectArgs {
            input: path,
            atoms: false,
        };
        assert!(matches!(run(args), Err(CliError::FileParsing { .. })));
    }
}
