//! Shared utility modules used across Hark components.

pub mod fuzz;
pub mod levenshtein;
