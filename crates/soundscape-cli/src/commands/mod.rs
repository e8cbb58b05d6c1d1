//! Command implementations.

pub mod doctor;
pub mod generate;
pub mod json_output;
pub mod validate;
