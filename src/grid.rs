use serde::{Deserialize, Serialize};

/// Number of compass directions an animal can face or move in.
pub const DIRECTION_COUNT: u8 = 8;

/// Sentinel for a cell whose occupant has not committed to a heading.
pub const UNDECIDED: i8 = -1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Species {
    Bear,
    Seal,
}

impl Species {
    pub fn label(self) -> &'static str {
        match self {
            Species::Bear => "bear",
            Species::Seal => "seal",
        }
    }
}

/// Mutable per-cell occupancy state. Terrain lives separately in
/// [`crate::terrain::TerrainMap`] and never changes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cell {
    pub occupant: Option<Species>,
    pub age: u8,
    pub hunger: f32,
    pub direction: i8,
}

impl Cell {
    pub const EMPTY: Cell = Cell {
        occupant: None,
        age: 0,
        hunger: 0.0,
        direction: UNDECIDED,
    };

    pub fn newborn(species: Species) -> Cell {
        Cell {
            occupant: Some(species),
            ..Cell::EMPTY
        }
    }

    pub fn is_empty(&self) -> bool {
        self.occupant.is_none()
    }
}

impl Default for Cell {
    fn default() -> Self {
        Cell::EMPTY
    }
}

/// Toroidal neighborhood of a cell: the wrapped coordinates one step in each
/// direction. The eight neighbors are always enumerated in the fixed order
/// NW, N, NE, W, E, SW, S, SE. This order decides which neighbor wins ties
/// in movement, hunting, and breeding, so it must not change.
#[derive(Debug, Clone, Copy)]
pub struct Neighborhood {
    pub x: usize,
    pub y: usize,
    pub left: usize,
    pub top: usize,
    pub right: usize,
    pub bottom: usize,
}

impl Neighborhood {
    /// Coordinates of the neighbor at the given compass index, or `None` for
    /// an out-of-range direction.
    pub fn target(&self, direction: u8) -> Option<(usize, usize)> {
        let coords = match direction {
            0 => (self.left, self.top),
            1 => (self.x, self.top),
            2 => (self.right, self.top),
            3 => (self.left, self.y),
            4 => (self.right, self.y),
            5 => (self.left, self.bottom),
            6 => (self.x, self.bottom),
            7 => (self.right, self.bottom),
            _ => return None,
        };
        Some(coords)
    }
}

/// The mutable occupancy grid, one [`Cell`] per position, indexed by
/// `x + y * width`. Edges wrap: the grid is a torus.
pub struct Grid {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl Grid {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![Cell::EMPTY; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn index(&self, x: usize, y: usize) -> usize {
        x + y * self.width
    }

    pub fn coords(&self, index: usize) -> (usize, usize) {
        (index % self.width, index / self.width)
    }

    pub fn cell(&self, index: usize) -> &Cell {
        &self.cells[index]
    }

    pub fn cell_mut(&mut self, index: usize) -> &mut Cell {
        &mut self.cells[index]
    }

    /// Swap the contents of two cells. Used by movement so the mover's state
    /// travels and the vacated source becomes whatever the target held
    /// (an empty cell, when movement preconditions were checked).
    pub fn swap(&mut self, a: usize, b: usize) {
        self.cells.swap(a, b);
    }

    pub fn clear(&mut self, index: usize) {
        self.cells[index] = Cell::EMPTY;
    }

    /// Resolve the toroidal neighborhood of a cell.
    pub fn look(&self, index: usize) -> Neighborhood {
        let (x, y) = self.coords(index);
        Neighborhood {
            x,
            y,
            left: (x + self.width - 1) % self.width,
            top: (y + self.height - 1) % self.height,
            right: (x + 1) % self.width,
            bottom: (y + 1) % self.height,
        }
    }
}
