use std::path::PathBuf;

use anyhow::Result;
use serde::Serialize;

use crate::{
    config::Scenario,
    grid::Species,
    population::SpeciesStats,
    rng::{RngManager, SystemRng},
    snapshot::SnapshotWriter,
    world::World,
};

pub struct EngineSettings {
    pub scenario_name: String,
    pub seed: u64,
    pub snapshot_interval_ticks: u64,
    pub snapshot_dir: PathBuf,
    /// Cap on ticks per rendered frame, so the simulation advances at a
    /// bounded rate independent of how fast frames are drawn.
    pub max_ticks_per_frame: u32,
}

impl EngineSettings {
    pub fn from_scenario(scenario: &Scenario) -> Self {
        Self {
            scenario_name: scenario.name.clone(),
            seed: scenario.seed,
            snapshot_interval_ticks: scenario.snapshot_interval_ticks,
            snapshot_dir: PathBuf::from("snapshots"),
            max_ticks_per_frame: scenario.max_ticks_per_frame,
        }
    }

    pub fn with_snapshot_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.snapshot_dir = dir.into();
        self
    }
}

pub struct EngineBuilder {
    settings: EngineSettings,
    systems: Vec<Box<dyn System>>,
}

impl EngineBuilder {
    pub fn new(settings: EngineSettings) -> Self {
        Self {
            settings,
            systems: Vec::new(),
        }
    }

    /// Systems run in registration order within a tick; register bears
    /// before seals to keep the predator-first update asymmetry.
    pub fn with_system(mut self, system: impl System + 'static) -> Self {
        self.systems.push(Box::new(system));
        self
    }

    pub fn push_system(&mut self, system: impl System + 'static) {
        self.systems.push(Box::new(system));
    }

    pub fn build(self) -> Engine {
        Engine {
            rng: RngManager::new(self.settings.seed),
            systems: self.systems,
            snapshot_writer: SnapshotWriter::new(
                &self.settings.snapshot_dir,
                self.settings.snapshot_interval_ticks,
            ),
            paused: false,
            settings: self.settings,
        }
    }
}

pub struct Engine {
    rng: RngManager,
    systems: Vec<Box<dyn System>>,
    snapshot_writer: SnapshotWriter,
    paused: bool,
    settings: EngineSettings,
}

impl Engine {
    /// Advance one full tick: bears then seals, then the clock, then any due
    /// snapshot. Returns the deltas this tick produced.
    pub fn tick(&mut self, world: &mut World) -> Result<TickReport> {
        world.begin_tick();
        let before = *world.stats();
        let tick = world.clock().ticks();
        let year = world.clock().year();
        let new_year = world.clock().new_year();
        for system in &mut self.systems {
            let mut rng = self.rng.stream(system.name());
            let ctx = SystemContext {
                tick,
                year,
                new_year,
                scenario_name: &self.settings.scenario_name,
            };
            system.run(&ctx, world, &mut rng)?;
        }
        world.end_tick();
        self.snapshot_writer
            .maybe_write(world, &self.settings.scenario_name)?;
        let after = *world.stats();
        Ok(TickReport {
            tick,
            year,
            new_year,
            bears: StatsDelta::between(before.bears, after.bears),
            seals: StatsDelta::between(before.seals, after.seals),
            seals_eaten: after.seals_eaten_by_bears - before.seals_eaten_by_bears,
            bear_count: world.population(Species::Bear),
            seal_count: world.population(Species::Seal),
        })
    }

    pub fn run(&mut self, world: &mut World, ticks: u64) -> Result<()> {
        for _ in 0..ticks {
            let report = self.tick(world)?;
            if report.new_year {
                tracing::info!(
                    year = report.year,
                    bears = report.bear_count,
                    seals = report.seal_count,
                    eaten = world.stats().seals_eaten_by_bears,
                    "year rolled over"
                );
            }
        }
        Ok(())
    }

    /// Advance as far as one rendered frame allows: nothing while paused,
    /// otherwise up to `max_ticks_per_frame` ticks.
    pub fn advance_frame(&mut self, world: &mut World) -> Result<Vec<TickReport>> {
        if self.paused {
            return Ok(Vec::new());
        }
        let mut reports = Vec::with_capacity(self.settings.max_ticks_per_frame as usize);
        for _ in 0..self.settings.max_ticks_per_frame {
            reports.push(self.tick(world)?);
        }
        Ok(reports)
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    pub fn toggle_paused(&mut self) {
        self.paused = !self.paused;
    }
}

pub struct SystemContext<'a> {
    pub tick: u64,
    pub year: u64,
    pub new_year: bool,
    pub scenario_name: &'a str,
}

pub trait System {
    fn name(&self) -> &str;
    fn run(&mut self, ctx: &SystemContext, world: &mut World, rng: &mut SystemRng<'_>)
        -> Result<()>;
}

/// Per-species stat movement within a single tick.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct StatsDelta {
    pub born: u64,
    pub dead_from_hunger: u64,
    pub dead_from_age: u64,
    pub dead_randomly: u64,
}

impl StatsDelta {
    fn between(before: SpeciesStats, after: SpeciesStats) -> Self {
        Self {
            born: after.born - before.born,
            dead_from_hunger: after.dead_from_hunger - before.dead_from_hunger,
            dead_from_age: after.dead_from_age - before.dead_from_age,
            dead_randomly: after.dead_randomly - before.dead_randomly,
        }
    }

    pub fn deaths(&self) -> u64 {
        self.dead_from_hunger + self.dead_from_age + self.dead_randomly
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct TickReport {
    pub tick: u64,
    pub year: u64,
    pub new_year: bool,
    pub bears: StatsDelta,
    pub seals: StatsDelta,
    pub seals_eaten: u64,
    pub bear_count: usize,
    pub seal_count: usize,
}
