use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use floe::{EngineBuilder, EngineSettings, ScenarioLoader, Species, SpeciesSystem};

#[derive(Debug, Parser)]
#[command(author, version, about = "Bear/seal ecosystem simulation runner")]
struct Cli {
    /// Path to the scenario YAML file
    #[arg(long, default_value = "scenarios/pack_ice.yaml")]
    scenario: PathBuf,

    /// Override tick count (uses scenario default when omitted)
    #[arg(long)]
    ticks: Option<u64>,

    /// Override the scenario seed
    #[arg(long)]
    seed: Option<u64>,

    /// Override snapshot interval in ticks (0 disables)
    #[arg(long)]
    snapshot_interval: Option<u64>,

    /// Directory for snapshots
    #[arg(long)]
    snapshot_dir: Option<PathBuf>,

    /// Write the mortality log to this CSV file when the run ends
    #[arg(long)]
    deaths_csv: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let loader = ScenarioLoader::new(".");
    let mut scenario = loader.load(&cli.scenario)?;
    if let Some(seed) = cli.seed {
        scenario.seed = seed;
    }
    if cli.deaths_csv.is_some() {
        scenario.log_deaths = true;
    }

    let mut world = scenario.build_world()?;
    let ticks = scenario.ticks(cli.ticks);

    let mut settings = EngineSettings::from_scenario(&scenario);
    if let Some(interval) = cli.snapshot_interval {
        settings.snapshot_interval_ticks = interval;
    }
    if let Some(dir) = cli.snapshot_dir {
        settings = settings.with_snapshot_dir(dir);
    }

    // Bears update before seals: a seal eaten this tick must not act.
    let mut engine = EngineBuilder::new(settings)
        .with_system(SpeciesSystem::new(Species::Bear))
        .with_system(SpeciesSystem::new(Species::Seal))
        .build();

    engine.run(&mut world, ticks)?;

    if let Some(path) = &cli.deaths_csv {
        if let Some(log) = world.death_log() {
            log.write_csv(path)?;
            tracing::info!(records = log.len(), path = %path.display(), "wrote mortality log");
        }
    }

    println!(
        "Scenario '{}' completed after {} ticks: {} bears, {} seals, {} seals eaten",
        scenario.name,
        ticks,
        world.population(Species::Bear),
        world.population(Species::Seal),
        world.stats().seals_eaten_by_bears
    );
    Ok(())
}
