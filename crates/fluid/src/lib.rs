//! Interactive 2D SPH fluid engine.
//!
//! Advances a population of Lagrangian particles approximating an
//! incompressible, viscous fluid under gravity, user-driven attractors and a
//! reflective rectangular container. The engine is an in-process library:
//! rendering, input handling and frame pacing belong to the caller.
//!
//! # Modules
//! - [`particle`] -- Struct-of-arrays particle storage and neighbour entries.
//! - [`smoothing`] -- Poly6, Spiky and Viscosity smoothing kernels.
//! - [`grid`] -- Uniform spatial grid for neighbour search.
//! - [`sph`] -- The per-phase pipeline operators.
//! - [`attractor`] -- Shared attractor records.
//! - [`options`] -- The configuration record.

#![warn(missing_docs)]

pub mod attractor;
pub mod grid;
pub mod options;
pub mod particle;
pub mod smoothing;
pub mod sph;

use std::sync::Arc;
use std::time::Instant;

use glam::Vec2;
use tracing::{debug, info, trace};

pub use attractor::{Attractor, AttractorHandle};
pub use grid::{GridKey, SpatialGrid};
pub use options::{Aabb, FluidOptions};
pub use particle::{Neighbour, ParticleSet};

/// Snapshot of engine health after the last completed tick.
#[derive(Debug, Clone, Copy)]
pub struct Diagnostics {
    /// Largest particle speed.
    pub max_speed: f32,
    /// Largest relative density deviation from the configured rest density,
    /// or the largest absolute density when the rest density is zero.
    pub max_density_variation: f32,
}

/// The simulation engine.
///
/// Owns the particles, the spatial grid and the worker pool; attractors are
/// shared with the caller. One [`update`](Fluid::update) call advances a
/// fixed phase pipeline and blocks until the tick completes. Between ticks
/// the particle set and grid are freely readable and hold the values of the
/// last completed tick.
pub struct Fluid {
    options: FluidOptions,
    particles: ParticleSet,
    grid: SpatialGrid,
    attractors: Vec<AttractorHandle>,
    pool: rayon::ThreadPool,
    pool_threads: usize,
}

impl Fluid {
    /// Create an engine from options. Call [`init`](Fluid::init) to seed the
    /// initial lattice.
    pub fn new(options: FluidOptions) -> Self {
        let grid = SpatialGrid::new(&options.bounding_box, options.smoothing_radius);
        let pool_threads = options.num_threads;
        let pool = Self::build_pool(pool_threads);
        Self {
            options,
            particles: ParticleSet::new(),
            grid,
            attractors: Vec::new(),
            pool,
            pool_threads,
        }
    }

    fn build_pool(threads: usize) -> rayon::ThreadPool {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .expect("failed to build worker thread pool")
    }

    /// Seed a square lattice of `floor(sqrt(num_particles))^2` particles at
    /// rest, centred on `initial_centre` and spaced by
    /// `particle_radius * 2 + particle_spacing`.
    pub fn init(&mut self) {
        self.clear_particles();

        let side = (self.options.num_particles as f32).sqrt().floor() as usize;
        let offset = self.options.particle_radius * 2.0 + self.options.particle_spacing;
        let lattice_half = (side.saturating_sub(1)) as f32 * offset * 0.5;

        for row in 0..side {
            for col in 0..side {
                let position = Vec2::new(col as f32, row as f32) * offset
                    + self.options.initial_centre
                    - Vec2::splat(lattice_half);
                self.particles.push(
                    position,
                    self.options.particle_radius,
                    self.options.particle_mass,
                );
            }
        }

        info!(particles = self.particles.len(), "seeded initial lattice");
    }

    /// Advance one tick.
    ///
    /// Phases run in fixed order with a barrier between each: gravity and
    /// prediction, grid refresh, neighbour collection, density/pressure,
    /// forces, integration and reflection. Densities and pressures of all
    /// particles are final before any force is evaluated. Mass and radius
    /// are re-read from the options, so the caller may tweak the record
    /// between ticks.
    pub fn update(&mut self, dt: f32) {
        let options = self.options;
        self.refresh_pool(options.num_threads);

        self.particles.mass.fill(options.particle_mass);
        self.particles.radius.fill(options.particle_radius);

        let attractors: Vec<Attractor> = self
            .attractors
            .iter()
            .map(|handle| *handle.read().expect("attractor lock poisoned"))
            .collect();

        let Self {
            particles,
            grid,
            pool,
            ..
        } = self;

        let started = Instant::now();
        pool.install(|| {
            sph::apply_gravity(particles, &options, dt);
            if options.use_predicted_positions {
                sph::predict_positions(particles, dt);
            }

            let after_gravity = Instant::now();
            sph::update_grid(grid, particles, &options);
            sph::collect_neighbours(particles, grid, &options);

            let after_neighbours = Instant::now();
            sph::solve_density_pressure(particles, &options);
            sph::solve_pressure_forces(particles, &options);
            sph::solve_viscosity_forces(particles, &options);
            sph::solve_tension_forces(particles, &options);

            let after_solve = Instant::now();
            sph::apply_forces(particles, &attractors, &options, dt);
            sph::apply_velocity(particles, &options, dt);

            trace!(
                neighbours_us = after_neighbours.duration_since(after_gravity).as_micros() as u64,
                solve_us = after_solve.duration_since(after_neighbours).as_micros() as u64,
                total_us = started.elapsed().as_micros() as u64,
                "tick"
            );
        });
    }

    fn refresh_pool(&mut self, threads: usize) {
        if threads != self.pool_threads {
            self.pool = Self::build_pool(threads);
            self.pool_threads = threads;
        }
    }

    /// The particle set, holding the last completed tick's state.
    pub fn particles(&self) -> &ParticleSet {
        &self.particles
    }

    /// Mutable particle access for the interaction layer (spawning or
    /// dragging individual particles between ticks).
    pub fn particles_mut(&mut self) -> &mut ParticleSet {
        &mut self.particles
    }

    /// Remove all particles and empty the grid.
    pub fn clear_particles(&mut self) {
        let removed = self.particles.len();
        self.particles.clear();
        self.grid.clear();
        if removed > 0 {
            info!(removed, "cleared particles");
        }
    }

    /// The spatial grid as of the last refresh, for visualization.
    pub fn grid(&self) -> &SpatialGrid {
        &self.grid
    }

    /// The options record.
    pub fn options(&self) -> &FluidOptions {
        &self.options
    }

    /// Mutable options access; changes take effect at the next tick.
    pub fn options_mut(&mut self) -> &mut FluidOptions {
        &mut self.options
    }

    /// Register an attractor, replacing any existing registration of the
    /// same handle.
    pub fn add_attractor(&mut self, attractor: &AttractorHandle) {
        self.remove_attractor(attractor);
        self.attractors.push(Arc::clone(attractor));
        debug!(attractors = self.attractors.len(), "attractor added");
    }

    /// Unregister an attractor by handle identity. Returns whether a
    /// registration was removed.
    pub fn remove_attractor(&mut self, attractor: &AttractorHandle) -> bool {
        let before = self.attractors.len();
        self.attractors
            .retain(|registered| !Arc::ptr_eq(registered, attractor));
        let removed = self.attractors.len() != before;
        if removed {
            debug!(attractors = self.attractors.len(), "attractor removed");
        }
        removed
    }

    /// Unregister every attractor.
    pub fn clear_attractors(&mut self) {
        self.attractors.clear();
    }

    /// Brute-force density of the particle field at an arbitrary point.
    ///
    /// O(N) over all particles; intended for density-field visualization
    /// probes, not for per-tick use.
    pub fn solve_density_at_point(&self, point: Vec2) -> f32 {
        sph::density_at_point(&self.particles, &self.options, point)
    }

    /// Engine health snapshot from the last completed tick.
    pub fn diagnostics(&self) -> Diagnostics {
        let mut max_speed = 0.0_f32;
        for v in &self.particles.vel {
            max_speed = max_speed.max(v.length());
        }

        let rest = self.options.desired_rest_density;
        let mut max_density_variation = 0.0_f32;
        for &rho in &self.particles.density {
            let variation = if rest > 0.0 {
                (rho - rest).abs() / rest
            } else {
                rho
            };
            max_density_variation = max_density_variation.max(variation);
        }

        Diagnostics {
            max_speed,
            max_density_variation,
        }
    }
}
