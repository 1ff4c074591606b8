#[cfg(test)]
pub use doubles::*;
