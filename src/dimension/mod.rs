// src/dimension/mod.rs
pub mod region;
pub mod variable;

pub use region::{build_region_dimension, RegionRow, REGION_DIMENSION};
pub use variable::{build_variable_dimension, VariableRow, VARIABLE_DIMENSION};
