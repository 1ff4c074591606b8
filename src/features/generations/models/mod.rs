mod generation;

pub use generation::{Generation, NewGeneration};
