use serde::Serialize;

const ABSENT: u32 = u32::MAX;

/// Per-species bookkeeping of which grid cells are occupied by that species.
///
/// `members` is an unordered list of cell indices; order is incidental, which
/// is what makes O(1) swap-and-pop removal acceptable. `pending` stages
/// newborns placed mid-tick so they are not processed in the tick they are
/// born. A slot map (cell index → position in `members`) keeps predation and
/// relocation O(1) rather than scanning the member list.
pub struct Registry {
    members: Vec<u32>,
    pending: Vec<u32>,
    positions: Vec<u32>,
}

impl Registry {
    pub fn new(cell_count: usize) -> Self {
        Self {
            members: Vec::new(),
            pending: Vec::new(),
            positions: vec![ABSENT; cell_count],
        }
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn pending_contains(&self, cell: usize) -> bool {
        self.pending.contains(&(cell as u32))
    }

    pub fn cell_at(&self, slot: usize) -> usize {
        self.members[slot] as usize
    }

    pub fn slot_of(&self, cell: usize) -> Option<usize> {
        match self.positions[cell] {
            ABSENT => None,
            slot => Some(slot as usize),
        }
    }

    pub fn members(&self) -> &[u32] {
        &self.members
    }

    /// Register a live animal immediately (initial placement).
    pub fn insert(&mut self, cell: usize) {
        debug_assert_eq!(self.positions[cell], ABSENT, "cell already registered");
        self.positions[cell] = self.members.len() as u32;
        self.members.push(cell as u32);
    }

    /// Stage a newborn; it joins `members` at the next [`merge_pending`].
    ///
    /// [`merge_pending`]: Registry::merge_pending
    pub fn stage(&mut self, cell: usize) {
        self.pending.push(cell as u32);
    }

    /// Fold staged newborns into the member list.
    pub fn merge_pending(&mut self) {
        for &cell in &self.pending {
            debug_assert_eq!(self.positions[cell as usize], ABSENT);
            self.positions[cell as usize] = self.members.len() as u32;
            self.members.push(cell);
        }
        self.pending.clear();
    }

    /// Swap-and-pop removal. The last member moves into the vacated slot, so
    /// a forward iteration must not advance its cursor after calling this.
    pub fn remove_slot(&mut self, slot: usize) {
        let cell = self.members[slot] as usize;
        self.positions[cell] = ABSENT;
        self.members.swap_remove(slot);
        if let Some(&moved) = self.members.get(slot) {
            self.positions[moved as usize] = slot as u32;
        }
    }

    /// Remove by cell index (predation). Returns false if the cell is not a
    /// merged member: pending newborns are not removable.
    pub fn remove_cell(&mut self, cell: usize) -> bool {
        match self.slot_of(cell) {
            Some(slot) => {
                self.remove_slot(slot);
                true
            }
            None => false,
        }
    }

    /// Point a member's registration at a new cell after it moved. The slot
    /// itself is unchanged, so no iteration is disturbed.
    pub fn relocate(&mut self, slot: usize, new_cell: usize) {
        let old_cell = self.members[slot] as usize;
        self.positions[old_cell] = ABSENT;
        self.positions[new_cell] = slot as u32;
        self.members[slot] = new_cell as u32;
    }
}

/// Mortality and natality counters for one species. `cull_debt` carries the
/// fractional remainder of the annual cull quota across ticks.
#[derive(Debug, Default, Clone, Copy, Serialize)]
pub struct SpeciesStats {
    pub born: u64,
    pub dead_from_hunger: u64,
    pub dead_from_age: u64,
    pub dead_randomly: u64,
    #[serde(skip)]
    pub cull_debt: f64,
}

#[derive(Debug, Default, Clone, Copy, Serialize)]
pub struct Stats {
    pub bears: SpeciesStats,
    pub seals: SpeciesStats,
    pub seals_eaten_by_bears: u64,
}
