//! Point attractors and repulsors.
//!
//! An attractor is a point source of impulse applied during integration to
//! every particle closer than its radius. The interaction layer keeps a
//! handle to each registered attractor and moves it between ticks (the
//! engine re-reads position, radius and strength every tick), so attractors
//! are shared mutable records and registry identity is the handle itself.

use std::sync::{Arc, RwLock};

use glam::Vec2;

/// A point source of impulse. Positive strength attracts, negative repels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Attractor {
    /// Centre of influence.
    pub position: Vec2,
    /// Radius of influence; also the falloff kernel support.
    pub radius: f32,
    /// Signed impulse scale.
    pub strength: f32,
}

/// Shared handle to an attractor.
///
/// The engine and the caller both hold clones; `remove_attractor` matches
/// registrations by handle identity, not by value.
pub type AttractorHandle = Arc<RwLock<Attractor>>;

impl Attractor {
    /// Create an attractor.
    pub fn new(position: Vec2, radius: f32, strength: f32) -> Self {
        Self {
            position,
            radius,
            strength,
        }
    }

    /// Wrap into a shared handle for registration with the engine.
    pub fn shared(self) -> AttractorHandle {
        Arc::new(RwLock::new(self))
    }
}
