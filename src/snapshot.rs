use std::{
    fs,
    io::Write as _,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::Serialize;

use crate::grid::Species;
use crate::world::{Cause, World};

/// Periodic JSON dump of aggregate world state for offline analysis. Purely
/// an observer: nothing in the tick loop depends on it.
pub struct SnapshotWriter {
    dir: PathBuf,
    interval_ticks: u64,
}

#[derive(Debug, Serialize)]
struct WorldSnapshot<'a> {
    scenario: &'a str,
    tick: u64,
    year: u64,
    bear_count: usize,
    seal_count: usize,
    stats: crate::population::Stats,
}

impl SnapshotWriter {
    pub fn new(dir: impl AsRef<Path>, interval_ticks: u64) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            interval_ticks,
        }
    }

    /// Write a snapshot when the world's tick count lands on the configured
    /// interval; zero disables snapshots entirely.
    pub fn maybe_write(&self, world: &World, scenario_name: &str) -> Result<Option<PathBuf>> {
        if self.interval_ticks == 0 {
            return Ok(None);
        }
        let tick = world.clock().ticks();
        if tick == 0 || tick % self.interval_ticks != 0 {
            return Ok(None);
        }
        let dir = self.dir.join(scenario_name);
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create snapshot dir {}", dir.display()))?;
        let path = dir.join(format!("tick_{tick:08}.json"));
        let snapshot = WorldSnapshot {
            scenario: scenario_name,
            tick,
            year: world.clock().year(),
            bear_count: world.population(Species::Bear),
            seal_count: world.population(Species::Seal),
            stats: *world.stats(),
        };
        let json = serde_json::to_string_pretty(&snapshot)?;
        fs::write(&path, json)
            .with_context(|| format!("Failed to write snapshot {}", path.display()))?;
        Ok(Some(path))
    }
}

/// One mortality event, as the historical CSV export recorded it.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct DeathRecord {
    pub tick: u64,
    pub species: Species,
    pub age: u8,
    pub hunger: f32,
    pub cause: Cause,
}

/// Optional in-memory mortality log, exportable as semicolon-separated CSV.
#[derive(Debug, Default)]
pub struct DeathLog {
    records: Vec<DeathRecord>,
}

impl DeathLog {
    pub fn new() -> Self {
        Self {
            records: Vec::with_capacity(4096),
        }
    }

    pub fn push(&mut self, record: DeathRecord) {
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[DeathRecord] {
        &self.records
    }

    pub fn write_csv(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let mut out = Vec::with_capacity(self.records.len() * 32 + 32);
        writeln!(out, "age;hunger;species;cause;tick")?;
        for record in &self.records {
            writeln!(
                out,
                "{};{};{};{};{}",
                record.age,
                record.hunger,
                record.species.label(),
                record.cause.label(),
                record.tick
            )?;
        }
        fs::write(path, out)
            .with_context(|| format!("Failed to write death log {}", path.display()))?;
        Ok(())
    }
}
