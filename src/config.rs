use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::terrain::TerrainSpec;
use crate::world::{BuildError, World};

fn default_ticks_per_year() -> u32 {
    100
}

fn default_snapshot_interval_ticks() -> u64 {
    0
}

fn default_max_ticks_per_frame() -> u32 {
    1
}

fn default_world_size() -> usize {
    512
}

/// Fixed per-run knobs for one species. Defaults reproduce the historical
/// tuning of the bear/seal system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeciesConfig {
    pub initial_count: u32,
    pub max_age: u8,
    pub breed_age: u8,
    pub breed_probability: f32,
    #[serde(default = "SpeciesConfig::default_max_litter")]
    pub max_litter: u8,
    #[serde(default = "SpeciesConfig::default_hunger_threshold")]
    pub hunger_threshold: f32,
    pub hunger_rate: f32,
    /// Above this hunger the animal forages (bears hunt, seals head for land)
    /// instead of wandering.
    pub forage_threshold: f32,
    /// Target number of random deaths per year, spread over ticks via a
    /// fractional accumulator.
    pub cull_per_year: u32,
}

impl SpeciesConfig {
    fn default_max_litter() -> u8 {
        2
    }

    fn default_hunger_threshold() -> f32 {
        1.0
    }

    pub fn bears() -> Self {
        Self {
            initial_count: 1000,
            max_age: 30,
            breed_age: 5,
            breed_probability: 0.1,
            max_litter: 2,
            hunger_threshold: 1.0,
            hunger_rate: 0.0015,
            forage_threshold: 0.2,
            cull_per_year: 5,
        }
    }

    pub fn seals() -> Self {
        Self {
            initial_count: 50_000,
            max_age: 25,
            breed_age: 3,
            breed_probability: 0.5,
            max_litter: 2,
            hunger_threshold: 1.0,
            hunger_rate: 0.000_75,
            forage_threshold: 0.3,
            cull_per_year: 10,
        }
    }
}

/// The simulation-facing slice of configuration: everything the tick rules
/// read, with scenario presentation concerns (name, snapshots) stripped off.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimConfig {
    pub ticks_per_year: u32,
    pub bears: SpeciesConfig,
    pub seals: SpeciesConfig,
    #[serde(default)]
    pub log_deaths: bool,
}

/// A complete run description, loadable from YAML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub seed: u64,
    #[serde(default = "default_world_size")]
    pub width: usize,
    #[serde(default = "default_world_size")]
    pub height: usize,
    #[serde(default)]
    pub ticks: Option<u64>,
    #[serde(default = "default_ticks_per_year")]
    pub ticks_per_year: u32,
    #[serde(default = "default_snapshot_interval_ticks")]
    pub snapshot_interval_ticks: u64,
    #[serde(default = "default_max_ticks_per_frame")]
    pub max_ticks_per_frame: u32,
    #[serde(default)]
    pub terrain: TerrainSpec,
    #[serde(default = "SpeciesConfig::bears")]
    pub bears: SpeciesConfig,
    #[serde(default = "SpeciesConfig::seals")]
    pub seals: SpeciesConfig,
    #[serde(default)]
    pub log_deaths: bool,
}

impl Scenario {
    pub fn sim_config(&self) -> SimConfig {
        SimConfig {
            ticks_per_year: self.ticks_per_year,
            bears: self.bears.clone(),
            seals: self.seals.clone(),
            log_deaths: self.log_deaths,
        }
    }

    /// Generate terrain from the scenario seed and scatter the initial
    /// populations onto it.
    pub fn build_world(&self) -> Result<World, BuildError> {
        let terrain = self.terrain.generate(self.width, self.height, self.seed);
        World::new(terrain, self.sim_config(), self.seed)
    }

    pub fn ticks(&self, override_ticks: Option<u64>) -> u64 {
        override_ticks.or(self.ticks).unwrap_or(1000)
    }
}

pub struct ScenarioLoader {
    base_dir: PathBuf,
}

impl ScenarioLoader {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    pub fn load(&self, file: impl AsRef<Path>) -> Result<Scenario> {
        let path = self.base_dir.join(file);
        let data = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read scenario file {}", path.display()))?;
        let scenario: Scenario = serde_yaml::from_str(&data)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(scenario)
    }
}
