use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Terrain {
    Ground,
    Water,
    Ice,
}

/// Immutable background classification, one entry per grid cell. Established
/// once at world construction and only read afterwards.
#[derive(Debug, Clone)]
pub struct TerrainMap {
    width: usize,
    height: usize,
    tiles: Vec<Terrain>,
}

impl TerrainMap {
    pub fn from_tiles(width: usize, height: usize, tiles: Vec<Terrain>) -> Self {
        assert_eq!(tiles.len(), width * height, "terrain tile count mismatch");
        Self {
            width,
            height,
            tiles,
        }
    }

    pub fn from_fn(width: usize, height: usize, f: impl Fn(usize, usize) -> Terrain) -> Self {
        let tiles = (0..width * height)
            .map(|i| f(i % width, i / width))
            .collect();
        Self {
            width,
            height,
            tiles,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn at(&self, index: usize) -> Terrain {
        self.tiles[index]
    }

    pub fn count(&self, terrain: Terrain) -> usize {
        self.tiles.iter().filter(|&&t| t == terrain).count()
    }
}

fn default_water_fraction() -> f64 {
    0.55
}

fn default_ice_fraction() -> f64 {
    0.04
}

fn default_smoothing_passes() -> u32 {
    4
}

/// How a scenario obtains its terrain. The original system loaded a painted
/// texture; here terrain is generated deterministically from the scenario
/// seed instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TerrainSpec {
    /// Random fill followed by majority smoothing, producing islands in open
    /// water, with ice floes sprinkled onto the remaining water.
    Archipelago {
        #[serde(default = "default_water_fraction")]
        water_fraction: f64,
        #[serde(default = "default_ice_fraction")]
        ice_fraction: f64,
        #[serde(default = "default_smoothing_passes")]
        smoothing_passes: u32,
    },
    /// Every cell the same terrain. Only really useful for tests.
    Uniform { terrain: Terrain },
}

impl Default for TerrainSpec {
    fn default() -> Self {
        TerrainSpec::Archipelago {
            water_fraction: default_water_fraction(),
            ice_fraction: default_ice_fraction(),
            smoothing_passes: default_smoothing_passes(),
        }
    }
}

impl TerrainSpec {
    pub fn generate(&self, width: usize, height: usize, seed: u64) -> TerrainMap {
        match *self {
            TerrainSpec::Uniform { terrain } => {
                TerrainMap::from_tiles(width, height, vec![terrain; width * height])
            }
            TerrainSpec::Archipelago {
                water_fraction,
                ice_fraction,
                smoothing_passes,
            } => generate_archipelago(width, height, seed, water_fraction, ice_fraction, smoothing_passes),
        }
    }
}

fn generate_archipelago(
    width: usize,
    height: usize,
    seed: u64,
    water_fraction: f64,
    ice_fraction: f64,
    smoothing_passes: u32,
) -> TerrainMap {
    let mut rng = ChaCha8Rng::seed_from_u64(seed ^ 0x7e55_a1f0_6b3d_c901);
    let mut water: Vec<bool> = (0..width * height)
        .map(|_| rng.gen_bool(water_fraction))
        .collect();

    // Majority smoothing over the 8 toroidal neighbors pulls the random fill
    // into contiguous seas and islands.
    let mut next = water.clone();
    for _ in 0..smoothing_passes {
        for y in 0..height {
            for x in 0..width {
                let mut wet = 0;
                for dy in [height - 1, 0, 1] {
                    for dx in [width - 1, 0, 1] {
                        if dx == 0 && dy == 0 {
                            continue;
                        }
                        let nx = (x + dx) % width;
                        let ny = (y + dy) % height;
                        if water[nx + ny * width] {
                            wet += 1;
                        }
                    }
                }
                next[x + y * width] = wet >= 5 || (wet == 4 && water[x + y * width]);
            }
        }
        std::mem::swap(&mut water, &mut next);
    }

    let tiles = water
        .into_iter()
        .map(|wet| {
            if wet {
                if rng.gen_bool(ice_fraction) {
                    Terrain::Ice
                } else {
                    Terrain::Water
                }
            } else {
                Terrain::Ground
            }
        })
        .collect();
    TerrainMap::from_tiles(width, height, tiles)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_spec_fills_every_tile() {
        let map = TerrainSpec::Uniform {
            terrain: Terrain::Water,
        }
        .generate(8, 8, 1);
        assert_eq!(map.count(Terrain::Water), 64);
        assert_eq!(map.count(Terrain::Ground), 0);
    }

    #[test]
    fn archipelago_is_deterministic_per_seed() {
        let spec = TerrainSpec::default();
        let a = spec.generate(32, 32, 7);
        let b = spec.generate(32, 32, 7);
        let c = spec.generate(32, 32, 8);
        assert_eq!(a.tiles, b.tiles);
        assert_ne!(a.tiles, c.tiles, "different seeds should diverge");
    }

    #[test]
    fn archipelago_contains_both_habitats() {
        let map = TerrainSpec::default().generate(64, 64, 42);
        assert!(map.count(Terrain::Water) > 0);
        assert!(map.count(Terrain::Ground) > 0);
    }
}
