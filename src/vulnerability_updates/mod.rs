//! Vulnerability update domain: what an updater produces and how a run is judged.
pub mod domain;
pub mod policies;
