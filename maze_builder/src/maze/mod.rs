// maze/mod.rs - Abstract maze model and procedural generation

pub mod grid;
pub mod generator;

pub use grid::*;
pub use generator::*;
