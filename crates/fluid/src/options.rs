//! Engine configuration.
//!
//! A single options record supplied at construction. The caller may mutate
//! it between ticks; mass and radius are re-read every tick, and the grid
//! geometry follows bounding-box or smoothing-radius changes at the next
//! refresh.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box used for binning and reflection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    /// Minimum corner.
    pub min: Vec2,
    /// Maximum corner.
    pub max: Vec2,
}

impl Aabb {
    /// Extent along each axis.
    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }

    /// `true` if `p` lies inside the closed box.
    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }
}

/// Simulation options.
///
/// Defaults reproduce a 900-particle interactive tank in an 800x600 box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FluidOptions {
    /// Target particle count at `init()`; the actual count is the largest
    /// square lattice that fits, `floor(sqrt(n))^2`.
    pub num_particles: usize,
    /// Visual radius and neighbour metric unit.
    pub particle_radius: f32,
    /// Initial lattice gap between particles.
    pub particle_spacing: f32,
    /// Centre of the initial lattice.
    pub initial_centre: Vec2,
    /// Constant acceleration applied each tick.
    pub gravity: Vec2,
    /// Box used for binning and reflection.
    pub bounding_box: Aabb,
    /// Velocity coefficient on reflection, in `[0, 1]`.
    pub bounding_box_restitution: f32,
    /// Kernel support radius and grid cell size.
    pub smoothing_radius: f32,
    /// Scales the pressure response to density deviation.
    pub stiffness: f32,
    /// Target density; pressure is zero when the measured density matches.
    pub desired_rest_density: f32,
    /// Per-particle mass used in density and force sums.
    pub particle_mass: f32,
    /// Scales the viscosity force.
    pub viscosity: f32,
    /// Surface-tension coefficient; zero disables the tension pathway.
    pub surface_tension: f32,
    /// Minimum surface-normal magnitude before tension applies.
    pub surface_tension_threshold: f32,
    /// Upper clamp on per-particle pressure.
    pub pressure_limit: f32,
    /// Bin and query neighbours on `x + v * dt` instead of `x`.
    pub use_predicted_positions: bool,
    /// Worker count for the parallel phases.
    pub num_threads: usize,
}

impl Default for FluidOptions {
    fn default() -> Self {
        Self {
            num_particles: 900,
            particle_radius: 5.0,
            particle_spacing: 5.0,
            initial_centre: Vec2::new(400.0, 300.0),
            gravity: Vec2::new(0.0, 1500.0),
            bounding_box: Aabb {
                min: Vec2::ZERO,
                max: Vec2::new(800.0, 600.0),
            },
            bounding_box_restitution: 0.05,
            smoothing_radius: 50.0,
            stiffness: 1.0e6,
            desired_rest_density: 2.5e-5,
            particle_mass: 0.045,
            viscosity: 0.13,
            surface_tension: 0.0,
            surface_tension_threshold: 0.0,
            pressure_limit: 1.0e5,
            use_predicted_positions: true,
            num_threads: 4,
        }
    }
}

impl FluidOptions {
    /// Validate the options.
    ///
    /// A convenience for callers assembling options from user input; the
    /// engine itself never re-checks these and leaves degenerate values
    /// (zero particles, zero threads) to the caller.
    pub fn validate(&self) -> Result<(), String> {
        if self.bounding_box.min.x >= self.bounding_box.max.x {
            return Err("Bounding box min.x must be less than max.x".to_string());
        }
        if self.bounding_box.min.y >= self.bounding_box.max.y {
            return Err("Bounding box min.y must be less than max.y".to_string());
        }
        if self.num_particles == 0 {
            return Err("Particle count must be at least 1".to_string());
        }
        if self.num_threads == 0 {
            return Err("Thread count must be at least 1".to_string());
        }
        if self.smoothing_radius <= 0.0 {
            return Err("Smoothing radius must be positive".to_string());
        }
        if self.particle_radius <= 0.0 {
            return Err("Particle radius must be positive".to_string());
        }
        if self.particle_spacing < 0.0 {
            return Err("Particle spacing must be non-negative".to_string());
        }
        if self.particle_mass <= 0.0 {
            return Err("Particle mass must be positive".to_string());
        }
        if !(0.0..=1.0).contains(&self.bounding_box_restitution) {
            return Err("Restitution must be in [0, 1]".to_string());
        }
        if self.viscosity < 0.0 {
            return Err("Viscosity must be non-negative".to_string());
        }
        if self.desired_rest_density < 0.0 {
            return Err("Rest density must be non-negative".to_string());
        }
        Ok(())
    }
}
