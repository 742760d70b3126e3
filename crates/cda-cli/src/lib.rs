//! CLI library components for the clinical document toolkit.

pub mod export;
pub mod logging;
