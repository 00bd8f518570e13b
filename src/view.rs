use crate::grid::Species;
use crate::terrain::{Terrain, TerrainMap};

// Display palette, 0xAARRGGBB. Colors exist only here; simulation logic never
// sees them.
pub const COLOR_BEAR: u32 = 0xFFFF_FF00;
pub const COLOR_SEAL: u32 = 0xFFFF_0000;
pub const COLOR_GROUND: u32 = 0xFF33_8844;
pub const COLOR_WATER: u32 = 0xFFC8_EBFF;
pub const COLOR_ICE: u32 = 0xFFEE_EEEE;

fn terrain_color(terrain: Terrain) -> u32 {
    match terrain {
        Terrain::Ground => COLOR_GROUND,
        Terrain::Water => COLOR_WATER,
        Terrain::Ice => COLOR_ICE,
    }
}

fn species_color(species: Species) -> u32 {
    match species {
        Species::Bear => COLOR_BEAR,
        Species::Seal => COLOR_SEAL,
    }
}

/// A pixel buffer mirroring the occupant layer of the grid: terrain color
/// where a cell is empty, species color where it is occupied. The world
/// repaints the affected pixel on every occupant change, so a renderer can
/// blit the buffer each frame without touching simulation state.
pub struct PixelView {
    width: usize,
    height: usize,
    pixels: Vec<u32>,
}

impl PixelView {
    pub fn new(terrain: &TerrainMap) -> Self {
        let pixels = (0..terrain.len()).map(|i| terrain_color(terrain.at(i))).collect();
        Self {
            width: terrain.width(),
            height: terrain.height(),
            pixels,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    pub fn paint_empty(&mut self, index: usize, terrain: Terrain) {
        self.pixels[index] = terrain_color(terrain);
    }

    pub fn paint_occupied(&mut self, index: usize, species: Species) {
        self.pixels[index] = species_color(species);
    }
}
