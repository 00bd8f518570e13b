mod species;

pub use species::SpeciesSystem;
