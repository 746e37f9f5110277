//! Particle storage in struct-of-arrays layout.
//!
//! All arrays are parallel: index `i` across every array refers to the same
//! particle. Keeping each per-tick field in its own array lets every pipeline
//! phase mutate exactly one array while reading the others, which is what
//! makes the phases safely data-parallel.

use glam::Vec2;

use crate::grid::GridKey;

/// A neighbour recorded during the collection phase, valid for one tick.
///
/// `direction` is the unit vector from the neighbour toward the owning
/// particle. When two particles coincide exactly, `distance` is substituted
/// by `1.0` and `direction` by a uniformly random unit vector.
#[derive(Debug, Clone, Copy)]
pub struct Neighbour {
    /// Index of the other particle in the owning [`ParticleSet`].
    pub index: usize,
    /// Distance between the two particles.
    pub distance: f32,
    /// Unit direction from the neighbour toward the owning particle.
    pub direction: Vec2,
}

/// Struct-of-arrays particle storage owned by the engine.
#[derive(Debug, Clone, Default)]
pub struct ParticleSet {
    /// Positions.
    pub pos: Vec<Vec2>,
    /// Velocities.
    pub vel: Vec<Vec2>,
    /// Predicted positions (`x + v * dt`), refreshed each tick when the
    /// engine is configured to bin and query on them.
    pub predicted: Vec<Vec2>,
    /// Visual / metric radius, re-read from the options each tick.
    pub radius: Vec<f32>,
    /// Mass, re-read from the options each tick.
    pub mass: Vec<f32>,
    /// Density from the last completed density phase.
    pub density: Vec<f32>,
    /// Pressure derived from density, clamped to the configured limit.
    pub pressure: Vec<f32>,
    /// Pressure force accumulator.
    pub pressure_force: Vec<Vec2>,
    /// Near-pressure force accumulator (fourth-power gradient term).
    pub pressure_near_force: Vec<Vec2>,
    /// Viscosity force accumulator.
    pub viscosity_force: Vec<Vec2>,
    /// Surface-tension force accumulator; zero while tension is disabled.
    pub tension_force: Vec<Vec2>,
    /// Grid cell the particle was binned to at the last grid refresh.
    pub grid_key: Vec<GridKey>,
    /// Neighbours recorded at the last collection phase.
    pub neighbours: Vec<Vec<Neighbour>>,
}

impl ParticleSet {
    /// Create an empty particle set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of particles currently stored.
    pub fn len(&self) -> usize {
        self.pos.len()
    }

    /// `true` if there are no particles.
    pub fn is_empty(&self) -> bool {
        self.pos.is_empty()
    }

    /// Append a particle at rest.
    ///
    /// Velocity and every per-tick scalar and vector start at zero; the
    /// predicted position starts at the spawn position.
    pub fn push(&mut self, position: Vec2, radius: f32, mass: f32) {
        self.pos.push(position);
        self.vel.push(Vec2::ZERO);
        self.predicted.push(position);
        self.radius.push(radius);
        self.mass.push(mass);
        self.density.push(0.0);
        self.pressure.push(0.0);
        self.pressure_force.push(Vec2::ZERO);
        self.pressure_near_force.push(Vec2::ZERO);
        self.viscosity_force.push(Vec2::ZERO);
        self.tension_force.push(Vec2::ZERO);
        self.grid_key.push((0, 0));
        self.neighbours.push(Vec::new());
    }

    /// Remove all particles.
    pub fn clear(&mut self) {
        self.pos.clear();
        self.vel.clear();
        self.predicted.clear();
        self.radius.clear();
        self.mass.clear();
        self.density.clear();
        self.pressure.clear();
        self.pressure_force.clear();
        self.pressure_near_force.clear();
        self.viscosity_force.clear();
        self.tension_force.clear();
        self.grid_key.clear();
        self.neighbours.clear();
    }
}
