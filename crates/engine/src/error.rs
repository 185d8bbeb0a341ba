//! Typed engine errors.
//!
//! Step failures themselves travel as [`anyhow::Error`]; this module covers
//! the engine's own protocol error.

use std::panic::Location;

use thiserror::Error;

/// A completion token was resolved a second time.
///
/// The first resolution decides the step's outcome; the second is rejected
/// and returned to its caller. Both call sites are carried so the offender
/// can be located.
#[derive(Debug, Clone, Copy, Error)]
#[error("completion token already resolved at {first}; rejected second resolution at {second}")]
pub struct ProtocolViolation {
    /// Call site of the resolution that decided the token.
    pub first: &'static Location<'static>,
    /// Call site of the rejected resolution.
    pub second: &'static Location<'static>,
}
