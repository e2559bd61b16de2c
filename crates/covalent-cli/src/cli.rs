use clap::{Args, Parser, Subcommand};
use covalent::workflows::presets::Preset;
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "Covalent Developers",
    version,
    about = "Covalent CLI - Run molecular dynamics simulations in which atoms collide, bond, and form molecules on the fly.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Seed a scene and advance it for a number of ticks.
    Run(RunArgs),
    /// Print statistics and molecules of a saved simulation state.
    Inspect(InspectArgs),
}

/// Arguments for the `run` subcommand.
#[derive(Args, Debug)]
pub struct RunArgs {
    // --- Inputs ---
    /// Path to a configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Continue from a previously saved state instead of an empty box.
    #[arg(short, long, value_name = "PATH")]
    pub resume: Option<PathBuf>,

    /// Path for the final simulation state (JSON).
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    // --- Scene ---
    /// Add a ready-made molecule (water, methane, benzene). Can be repeated.
    #[arg(short, long = "preset", value_name = "NAME")]
    pub presets: Vec<Preset>,

    /// Scatter this many random atoms across the box.
    #[arg(long, value_name = "NUM")]
    pub random_atoms: Option<usize>,

    // --- Run Overrides ---
    /// Number of ticks to run.
    #[arg(short = 'n', long, value_name = "NUM")]
    pub ticks: Option<u64>,

    /// Report a sample (and write the checkpoint, if any) every this many ticks.
    #[arg(long, value_name = "NUM")]
    pub sample_interval: Option<u64>,

    /// Seed for the random number generator.
    #[arg(long, value_name = "NUM")]
    pub seed: Option<u64>,

    /// Override a value from the configuration file, e.g.
    /// `-S simulation.integration.time-step=0.01`. Can be repeated.
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE")]
    pub set_values: Vec<String>,
}

/// Arguments for the `inspect` subcommand.
#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Path to a saved simulation state (JSON).
    #[arg(value_name = "PATH")]
    pub input: PathBuf,

    /// Also list every atom with its position and bond count.
    #[arg(long)]
    pub atoms: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_arguments_are_parsed() {
        let cli = Cli::parse_from([
            "covalent", "-vv", "run", "-c", "sim.toml", "-p", "water", "--preset", "Benzene",
            "--random-atoms", "20", "-n", "500", "--seed", "9", "-S",
            "simulation.integration.damping=1.0", "-o", "out.json",
        ]);
        assert_eq!(cli.verbose, 2);
        let Commands::Run(args) = cli.command else {
            panic!("Expected 'run' subcommand");
        };
        assert_eq!(args.config, Some(PathBuf::from("sim.toml")));
        assert_eq!(args.presets, vec![Preset::Water, Preset::Benzene]);
        assert_eq!(args.random_atoms, Some(20));
        assert_eq!(args.ticks, Some(500));
        assert_eq!(args.seed, Some(9));
        assert_eq!(args.set_values, vec!["simulation.integration.damping=1.0"]);
        assert_eq!(args.output, Some(PathBuf::from("out.json")));
        assert_eq!(args.resume, None);
    }

    #[test]
    fn unknown_preset_is_rejected() {
        let result = Cli::try_parse_from(["covalent", "run", "--preset", "ethanol"]);
        assert!(result.is_err());
    }

    #[test]
    fn quiet_conflicts_with_verbose() {
        let result = Cli::try_parse_from(["covalent", "-q", "-v", "inspect", "state.json"]);
        assert!(result.is_err());
    }

    #[test]
    fn inspect_takes_a_positional_path() {
        let cli = Cli::parse_from(["covalent", "inspect", "state.json", "--atoms", "--quiet"]);
        assert!(cli.quiet);
        let Commands::Inspect(args) = cli.command else {
            panic!("Expected 'inspect' subcommand");
        };
        assert_eq!(args.input, PathBuf::from("state.json"));
        assert!(args.atoms);
    }
}
