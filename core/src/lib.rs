//! Synthetic telemetry generator for a free-to-play mobile game.
//!
//! PIPELINE (fixed order, see engine.rs):
//!   1. Population         attributes, segments, variant, churn horizon
//!   2. DAU curve          target active players per day
//!   3. Activity           per-player active days reconciled to the curve
//!   4. Sessions/events    per (player, active day)
//!   5. Purchases          per session
//!   6. Teams              independent of activity
//!   7. Store              invariant check, then ordered writes

pub mod activity;
pub mod clock;
pub mod config;
pub mod dau_curve;
pub mod engine;
pub mod error;
pub mod event;
pub mod invariants;
pub mod population;
pub mod purchases;
pub mod rng;
pub mod sampler;
pub mod sessions;
pub mod store;
pub mod teams;
pub mod types;
