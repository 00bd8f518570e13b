pub mod config;
pub mod engine;
pub mod grid;
pub mod population;
pub mod rng;
pub mod snapshot;
pub mod systems;
pub mod terrain;
pub mod view;
pub mod world;

pub use config::{Scenario, ScenarioLoader, SimConfig, SpeciesConfig};
pub use engine::{Engine, EngineBuilder, EngineSettings, StatsDelta, System, SystemContext, TickReport};
pub use grid::Species;
pub use systems::SpeciesSystem;
pub use terrain::{Terrain, TerrainSpec};
pub use world::{AnimalView, BuildError, World};
