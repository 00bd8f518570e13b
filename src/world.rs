use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use thiserror::Error;

use crate::config::{SimConfig, SpeciesConfig};
use crate::grid::{Cell, Grid, Neighborhood, Species, DIRECTION_COUNT, UNDECIDED};
use crate::population::{Registry, SpeciesStats, Stats};
use crate::rng::RngExt;
use crate::snapshot::{DeathLog, DeathRecord};
use crate::terrain::{Terrain, TerrainMap};
use crate::view::PixelView;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("not enough {habitat} for {count} {species}s ({available} habitable cells)")]
    InsufficientHabitat {
        species: &'static str,
        habitat: &'static str,
        count: u32,
        available: usize,
    },
    #[error("gave up placing {species}s after {attempts} attempts")]
    PlacementExhausted {
        species: &'static str,
        attempts: u64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Cause {
    Hunger,
    Age,
    Culled,
    Eaten,
}

impl Cause {
    pub fn label(self) -> &'static str {
        match self {
            Cause::Hunger => "hunger",
            Cause::Age => "age",
            Cause::Culled => "culled",
            Cause::Eaten => "eaten",
        }
    }
}

/// Tick/year bookkeeping. A year is a fixed number of ticks; `new_year` is
/// true exactly on the tick where the derived year changes, which gates aging
/// and breeding.
#[derive(Debug, Clone)]
pub struct Clock {
    ticks: u64,
    year: u64,
    new_year: bool,
    ticks_per_year: u32,
}

impl Clock {
    fn new(ticks_per_year: u32) -> Self {
        Self {
            ticks: 0,
            year: 0,
            new_year: false,
            ticks_per_year,
        }
    }

    pub(crate) fn begin_tick(&mut self) {
        let year = self.ticks / self.ticks_per_year as u64;
        self.new_year = year != self.year;
        self.year = year;
    }

    pub(crate) fn end_tick(&mut self) {
        self.ticks += 1;
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn year(&self) -> u64 {
        self.year
    }

    pub fn new_year(&self) -> bool {
        self.new_year
    }

    pub fn ticks_per_year(&self) -> u32 {
        self.ticks_per_year
    }
}

/// Read-only snapshot of one animal for UI and debug overlays.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct AnimalView {
    pub species: Species,
    pub cell: usize,
    pub x: usize,
    pub y: usize,
    pub age: u8,
    pub hunger: f32,
    pub direction: i8,
}

/// Weighted all-or-nothing breeding roll: 0 on a failed coin flip, otherwise
/// a uniform litter size in `[1, max_litter]`.
pub fn can_breed(rng: &mut impl Rng, probability: f32, max_litter: u8) -> u8 {
    if max_litter == 0 || !rng.chance(probability) {
        return 0;
    }
    rng.gen_range(1..=max_litter)
}

/// The shared simulation state: immutable terrain, the mutable occupancy
/// grid, one registry per species, stats, the clock, and the pixel mirror.
///
/// All structural mutation (movement, predation, birth, death) goes through
/// the methods here so the occupancy invariant (a cell is occupied iff its
/// index is registered with exactly one species) holds between operations.
pub struct World {
    terrain: TerrainMap,
    grid: Grid,
    view: PixelView,
    bears: Registry,
    seals: Registry,
    stats: Stats,
    clock: Clock,
    config: SimConfig,
    death_log: Option<DeathLog>,
}

impl World {
    pub fn new(terrain: TerrainMap, config: SimConfig, seed: u64) -> Result<Self, BuildError> {
        let grid = Grid::new(terrain.width(), terrain.height());
        let view = PixelView::new(&terrain);
        let cells = grid.len();
        let mut world = Self {
            grid,
            view,
            bears: Registry::new(cells),
            seals: Registry::new(cells),
            stats: Stats::default(),
            clock: Clock::new(config.ticks_per_year),
            death_log: config.log_deaths.then(DeathLog::new),
            config,
            terrain,
        };
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        world.place_species(Species::Bear, &mut rng)?;
        world.place_species(Species::Seal, &mut rng)?;
        Ok(world)
    }

    fn place_species(&mut self, species: Species, rng: &mut ChaCha8Rng) -> Result<(), BuildError> {
        let cfg = self.species_config(species).clone();
        let (habitat, eligible) = match species {
            Species::Bear => ("dry land", self.terrain.len() - self.terrain.count(Terrain::Water)),
            Species::Seal => ("open water", self.terrain.count(Terrain::Water)),
        };
        if eligible < cfg.initial_count as usize {
            return Err(BuildError::InsufficientHabitat {
                species: species.label(),
                habitat,
                count: cfg.initial_count,
                available: eligible,
            });
        }
        let max_attempts = cfg.initial_count as u64 * 1_000 + 10_000;
        let mut attempts = 0u64;
        let mut placed = 0u32;
        while placed < cfg.initial_count {
            attempts += 1;
            if attempts > max_attempts {
                return Err(BuildError::PlacementExhausted {
                    species: species.label(),
                    attempts,
                });
            }
            let x = rng.gen_range(0..self.grid.width());
            let y = rng.gen_range(0..self.grid.height());
            let index = self.grid.index(x, y);
            let habitable = match species {
                Species::Bear => self.terrain.at(index) != Terrain::Water,
                Species::Seal => self.terrain.at(index) == Terrain::Water,
            };
            if !habitable || !self.grid.cell(index).is_empty() {
                continue;
            }
            *self.grid.cell_mut(index) = Cell {
                occupant: Some(species),
                age: rng.gen_range(0..=cfg.max_age),
                hunger: 0.0,
                direction: UNDECIDED,
            };
            self.view.paint_occupied(index, species);
            self.registry_mut(species).insert(index);
            placed += 1;
        }
        tracing::debug!(
            species = species.label(),
            placed,
            attempts,
            "initial population placed"
        );
        Ok(())
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn terrain(&self) -> &TerrainMap {
        &self.terrain
    }

    pub fn terrain_at(&self, index: usize) -> Terrain {
        self.terrain.at(index)
    }

    pub fn cell(&self, index: usize) -> &Cell {
        self.grid.cell(index)
    }

    pub fn cell_mut(&mut self, index: usize) -> &mut Cell {
        self.grid.cell_mut(index)
    }

    pub fn look(&self, index: usize) -> Neighborhood {
        self.grid.look(index)
    }

    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    pub(crate) fn begin_tick(&mut self) {
        self.clock.begin_tick();
    }

    pub(crate) fn end_tick(&mut self) {
        self.clock.end_tick();
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn species_config(&self, species: Species) -> &SpeciesConfig {
        match species {
            Species::Bear => &self.config.bears,
            Species::Seal => &self.config.seals,
        }
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    pub fn species_stats(&self, species: Species) -> &SpeciesStats {
        match species {
            Species::Bear => &self.stats.bears,
            Species::Seal => &self.stats.seals,
        }
    }

    fn species_stats_mut(&mut self, species: Species) -> &mut SpeciesStats {
        match species {
            Species::Bear => &mut self.stats.bears,
            Species::Seal => &mut self.stats.seals,
        }
    }

    pub fn registry(&self, species: Species) -> &Registry {
        match species {
            Species::Bear => &self.bears,
            Species::Seal => &self.seals,
        }
    }

    fn registry_mut(&mut self, species: Species) -> &mut Registry {
        match species {
            Species::Bear => &mut self.bears,
            Species::Seal => &mut self.seals,
        }
    }

    pub fn population(&self, species: Species) -> usize {
        self.registry(species).len()
    }

    /// The renderable mirror of the occupant layer.
    pub fn pixels(&self) -> &[u32] {
        self.view.pixels()
    }

    pub fn death_log(&self) -> Option<&DeathLog> {
        self.death_log.as_ref()
    }

    /// Place a live animal directly onto an empty cell and register it
    /// immediately. The initial scatter applies habitat rules on top of
    /// this; callers here choose placement themselves.
    pub fn spawn(&mut self, species: Species, x: usize, y: usize) -> Option<usize> {
        let index = self.grid.index(x, y);
        if !self.grid.cell(index).is_empty() {
            return None;
        }
        *self.grid.cell_mut(index) = Cell::newborn(species);
        self.view.paint_occupied(index, species);
        self.registry_mut(species).insert(index);
        Some(index)
    }

    /// Read-only lookup of the animal at a registry slot. Returns `None` for
    /// a stale selection: the slot is out of range (the animal died or the
    /// slot was reassigned by a swap-pop) or the cell no longer matches.
    pub fn inspect(&self, species: Species, slot: usize) -> Option<AnimalView> {
        let registry = self.registry(species);
        if slot >= registry.len() {
            return None;
        }
        let cell_index = registry.cell_at(slot);
        let cell = self.grid.cell(cell_index);
        if cell.occupant != Some(species) {
            return None;
        }
        let (x, y) = self.grid.coords(cell_index);
        Some(AnimalView {
            species,
            cell: cell_index,
            x,
            y,
            age: cell.age,
            hunger: cell.hunger,
            direction: cell.direction,
        })
    }

    /// Record a death: log it, bump the right counter, clear the cell, and
    /// repaint the pixel. The registry entry is removed by the caller.
    fn record_death(&mut self, species: Species, cell_index: usize, cause: Cause) {
        let cell = *self.grid.cell(cell_index);
        debug_assert_eq!(cell.occupant, Some(species));
        if let Some(log) = &mut self.death_log {
            log.push(DeathRecord {
                tick: self.clock.ticks,
                species,
                age: cell.age,
                hunger: cell.hunger,
                cause,
            });
        }
        match cause {
            Cause::Hunger => self.species_stats_mut(species).dead_from_hunger += 1,
            Cause::Age => self.species_stats_mut(species).dead_from_age += 1,
            Cause::Culled => self.species_stats_mut(species).dead_randomly += 1,
            Cause::Eaten => {}
        }
        self.grid.clear(cell_index);
        self.view.paint_empty(cell_index, self.terrain.at(cell_index));
    }

    /// Kill the animal at a registry slot. Swap-pop removal: the caller's
    /// forward cursor must not advance afterwards.
    pub fn kill(&mut self, species: Species, slot: usize, cause: Cause) {
        let cell_index = self.registry(species).cell_at(slot);
        self.registry_mut(species).remove_slot(slot);
        self.record_death(species, cell_index, cause);
    }

    /// Accrue the annual cull target as a per-tick fraction and remove one
    /// animal from the front of the list each time the debt crosses 1.0. The
    /// carried remainder makes the long-run death count match the quota
    /// regardless of tick granularity.
    pub fn apply_cull(&mut self, species: Species) {
        let per_year = self.species_config(species).cull_per_year;
        if per_year == 0 {
            return;
        }
        let rate = per_year as f64 / self.clock.ticks_per_year as f64;
        self.species_stats_mut(species).cull_debt += rate;
        while self.species_stats(species).cull_debt >= 1.0 && !self.registry(species).is_empty() {
            self.kill(species, 0, Cause::Culled);
            self.species_stats_mut(species).cull_debt -= 1.0;
        }
    }

    /// Relocate the animal at `slot` into `(x, y)` if the target cell has the
    /// required terrain and is unoccupied. Swaps the cell state over, clears
    /// the source, and fixes the registry entry in place; population counts
    /// never change here.
    pub fn try_move(
        &mut self,
        species: Species,
        slot: usize,
        x: usize,
        y: usize,
        terrain: Terrain,
    ) -> bool {
        let target = self.grid.index(x, y);
        if self.terrain.at(target) != terrain || !self.grid.cell(target).is_empty() {
            return false;
        }
        let source = self.registry(species).cell_at(slot);
        self.view.paint_empty(source, self.terrain.at(source));
        self.grid.swap(source, target);
        self.view.paint_occupied(target, species);
        self.registry_mut(species).relocate(slot, target);
        true
    }

    /// Movement by compass index into the resolved neighborhood; false for an
    /// out-of-range direction.
    pub fn move_dir(
        &mut self,
        species: Species,
        slot: usize,
        hood: &Neighborhood,
        terrain: Terrain,
        direction: u8,
    ) -> bool {
        match hood.target(direction) {
            Some((x, y)) => self.try_move(species, slot, x, y, terrain),
            None => false,
        }
    }

    /// Consume the seal at `(x, y)` if there is one: the predator's hunger
    /// resets, the prey is swap-popped from its registry and its cell
    /// cleared.
    pub fn try_hunt(&mut self, predator_cell: usize, x: usize, y: usize) -> bool {
        let prey_cell = self.grid.index(x, y);
        if self.grid.cell(prey_cell).occupant != Some(Species::Seal) {
            return false;
        }
        self.grid.cell_mut(predator_cell).hunger = 0.0;
        let removed = self.seals.remove_cell(prey_cell);
        debug_assert!(removed, "hunted seal must be a merged registry member");
        self.record_death(Species::Seal, prey_cell, Cause::Eaten);
        self.stats.seals_eaten_by_bears += 1;
        true
    }

    /// Try all 8 neighbors in the fixed order, stopping at the first kill.
    pub fn hunt(&mut self, predator_cell: usize, hood: &Neighborhood) -> bool {
        for direction in 0..DIRECTION_COUNT {
            if let Some((x, y)) = hood.target(direction) {
                if self.try_hunt(predator_cell, x, y) {
                    return true;
                }
            }
        }
        false
    }

    /// Stamp a newborn of the parent's species onto `(x, y)` if the cell has
    /// the required terrain and is empty. The index goes to the pending
    /// buffer so the newborn does not act in the tick it is born.
    pub fn try_birth(&mut self, parent_cell: usize, x: usize, y: usize, terrain: Terrain) -> bool {
        let birth_cell = self.grid.index(x, y);
        if self.terrain.at(birth_cell) != terrain || !self.grid.cell(birth_cell).is_empty() {
            return false;
        }
        let Some(species) = self.grid.cell(parent_cell).occupant else {
            return false;
        };
        *self.grid.cell_mut(birth_cell) = Cell::newborn(species);
        self.view.paint_occupied(birth_cell, species);
        self.registry_mut(species).stage(birth_cell);
        self.species_stats_mut(species).born += 1;
        true
    }

    /// Place up to `litter` offspring, each into the first qualifying
    /// neighbor in the fixed order. Offspring with no free cell are lost;
    /// litter size is capped by available space, not guaranteed.
    pub fn breed(&mut self, parent_cell: usize, hood: &Neighborhood, litter: u8, terrain: Terrain) {
        for _ in 0..litter {
            for direction in 0..DIRECTION_COUNT {
                let Some((x, y)) = hood.target(direction) else {
                    break;
                };
                if self.try_birth(parent_cell, x, y, terrain) {
                    break;
                }
            }
        }
    }

    pub fn merge_pending(&mut self, species: Species) {
        self.registry_mut(species).merge_pending();
    }

    /// Full occupancy-invariant audit: every occupied cell is registered with
    /// exactly one species and every registration points at a matching cell.
    /// O(grid), so test and debug use only.
    pub fn validate(&self) -> Result<(), String> {
        let mut bear_cells = 0usize;
        let mut seal_cells = 0usize;
        for index in 0..self.grid.len() {
            let occupant = self.grid.cell(index).occupant;
            let in_bears = self.bears.slot_of(index).is_some() || self.bears.pending_contains(index);
            let in_seals = self.seals.slot_of(index).is_some() || self.seals.pending_contains(index);
            match occupant {
                Some(Species::Bear) => {
                    bear_cells += 1;
                    if !in_bears || in_seals {
                        return Err(format!("cell {index}: bear occupant, registries {in_bears}/{in_seals}"));
                    }
                }
                Some(Species::Seal) => {
                    seal_cells += 1;
                    if !in_seals || in_bears {
                        return Err(format!("cell {index}: seal occupant, registries {in_bears}/{in_seals}"));
                    }
                }
                None => {
                    if in_bears || in_seals {
                        return Err(format!("cell {index}: empty but registered"));
                    }
                }
            }
        }
        if bear_cells != self.bears.len() + self.bears.pending_len() {
            return Err(format!(
                "bear cells {} != registry {} + pending {}",
                bear_cells,
                self.bears.len(),
                self.bears.pending_len()
            ));
        }
        if seal_cells != self.seals.len() + self.seals.pending_len() {
            return Err(format!(
                "seal cells {} != registry {} + pending {}",
                seal_cells,
                self.seals.len(),
                self.seals.pending_len()
            ));
        }
        Ok(())
    }
}
