//! Domain model for the organization hierarchy, audit trail and scoring.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Hold the pure rules (input validation, hierarchy checks, ranking) that
//!   repositories and services apply around storage.
//!
//! # Invariants
//! - Every stored entity is identified by a stable, non-nil UUID.
//! - Members are never deleted by core; role and group fields change in place.

pub mod audit;
pub mod hierarchy;
pub mod leaderboard;
pub mod member;
pub mod score;
pub mod validation;
