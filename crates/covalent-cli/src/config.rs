use crate::cli::RunArgs;
use crate::error::{CliError, Result};
use covalent::engine::config::SimulationConfig;
use covalent::workflows::presets::Preset;
use covalent::workflows::run::RunOptions;
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

/// Spacing between presets given on the command line, which are laid out along x.
const PRESET_SPACING: f64 = 4.0;

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct PresetPlacement {
    pub preset: Preset,
    #[serde(default)]
    pub center: [f64; 3],
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct SceneConfig {
    pub presets: Vec<PresetPlacement>,
    pub random_atoms: usize,
}

/// The contents of a `covalent run` configuration file.
#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub simulation: SimulationConfig,
    pub scene: SceneConfig,
    pub run: RunOptions,
}

impl FileConfig {
    /// Loads the file (or defaults when `path` is `None`), applies `--set` overrides, and
    /// then the dedicated command-line flags.
    pub fn build(path: Option<&Path>, args: &RunArgs) -> Result<Self> {
        let mut table = match path {
            Some(path) => {
                debug!("Loading configuration from file: {:?}", path);
                let content = std::fs::read_to_string(path)?;
                toml::from_str::<toml::Table>(&content).map_err(|e| CliError::FileParsing {
                    path: path.to_path_buf(),
                    source: e.into(),
                })?
            }
            None => toml::Table::new(),
        };
        apply_set_values(&mut table, &args.set_values)?;

        let mut config: FileConfig = toml::Value::Table(table)
            .try_into()
            .map_err(|e: toml::de::Error| CliError::Config(e.to_string()))?;
        config.merge_args(args);
        config
            .simulation
            .validate()
            .map_err(|e| CliError::Config(e.to_string()))?;
        Ok(config)
    }

    fn merge_args(&mut self, args: &RunArgs) {
        if let Some(ticks) = args.ticks {
            self.run.ticks = ticks;
        }
        if let Some(interval) = args.sample_interval {
            self.run.sample_interval = interval;
        }
        if let Some(seed) = args.seed {
            self.simulation.seed = Some(seed);
        }
        if let Some(count) = args.random_atoms {
            self.scene.random_atoms = count;
        }

        let offset = (args.presets.len() as f64 - 1.0) * PRESET_SPACING / 2.0;
        for (i, &preset) in args.presets.iter().enumerate() {
            self.scene.presets.push(PresetPlacement {
                preset,
                center: [i as f64 * PRESET_SPACING - offset, 0.0, 0.0],
            });
        }
    }
}

/// Parses the right-hand side of a `--set` pair as a TOML value, falling back to a bare string.
fn parse_value(raw: &str) -> toml::Value {
    toml::from_str::<toml::Table>(&format!("value = {raw}"))
        .ok()
        .and_then(|mut t| t.remove("value"))
        .unwrap_or_else(|| toml::Value::String(raw.to_string()))
}

fn apply_set_values(table: &mut toml::Table, set_values: &[String]) -> Result<()> {
    for kv_pair in set_values {
        let Some((key, value_str)) = kv_pair.split_once('=') else {
            return Err(CliError::Config(format!(
                "Invalid --set format: '{}'. Expected KEY=VALUE.",
                kv_pair
            )));
        };
        let path: Vec<&str> = key.trim().split('.').collect();
        if path.iter().any(|segment| segment.is_empty()) {
            return Err(CliError::Config(format!(
                "Invalid configuration key for --set: '{}'",
                key
            )));
        }

        let (leaf, parents) = path.split_last().ok_or_else(|| {
            CliError::Config(format!("Invalid configuration key for --set: '{}'", key))
        })?;
        let mut current = &mut *table;
        for segment in parents {
            let entry = current
                .entry(segment.to_string())
                .or_insert(toml::Value::Table(toml::Table::new()));
            current = entry.as_table_mut().ok_or_else(|| {
                CliError::Config(format!("'{}' in '{}' is not a table", segment, key))
            })?;
        }
        current.insert(leaf.to_string(), parse_value(value_str.trim()));
        debug!(key, value = value_str, "Applied configuration override");
    }
    Ok(())
}
