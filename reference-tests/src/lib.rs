//! Reference scenario framework for validating the fluid engine.
//!
//! Each scenario builds an engine from a fixed configuration, runs it for a
//! fixed number of ticks and evaluates declarative expectations against the
//! final state. Scenarios run both from the binary entry point and under
//! `cargo test`.

pub mod analytical;


use fluid::{Aabb, Fluid, FluidOptions};
use glam::Vec2;

/// Expected end-state criteria for a reference scenario.
#[derive(Debug, Clone)]
pub struct ExpectedResult {
    /// Every particle position must stay inside this box.
    pub position_bounds: Option<Aabb>,
    /// Upper bound on the final maximum particle speed.
    pub max_speed: Option<f32>,
    /// Require every position, velocity and density to be finite.
    pub finite_state: bool,
}

/// A runnable reference scenario.
#[derive(Debug, Clone)]
pub struct ReferenceScenario {
    /// Human-readable scenario name.
    pub name: String,
    /// Engine configuration under test.
    pub options: FluidOptions,
    /// Fixed timestep fed to every tick.
    pub dt: f32,
    /// Number of ticks to run.
    pub ticks: u32,
    /// Expectations evaluated after the final tick.
    pub expected: ExpectedResult,
}

/// Outcome of one scenario run.
#[derive(Debug)]
pub struct ScenarioOutcome {
    /// Scenario name.
    pub name: String,
    /// Failed expectations, empty on success.
    pub failures: Vec<String>,
}

impl ScenarioOutcome {
    /// `true` when every expectation held.
    pub fn passed(&self) -> bool {
        self.failures.is_empty()
    }
}

impl ReferenceScenario {
    /// Run the scenario to completion and evaluate its expectations.
    pub fn run(&self) -> ScenarioOutcome {
        let mut sim = Fluid::new(self.options);
        sim.init();
        for _ in 0..self.ticks {
            sim.update(self.dt);
        }

        let mut failures = Vec::new();
        let particles = sim.particles();

        if let Some(bounds) = self.expected.position_bounds {
            for (i, p) in particles.pos.iter().enumerate() {
                if !bounds.contains(*p) {
                    failures.push(format!("particle {i} at {p:?} left {bounds:?}"));
                    break;
                }
            }
        }

        if let Some(limit) = self.expected.max_speed {
            let max_speed = sim.diagnostics().max_speed;
            if max_speed > limit {
                failures.push(format!("max speed {max_speed} above limit {limit}"));
            }
        }

        if self.expected.finite_state {
            let all_finite = particles.pos.iter().all(|p| p.is_finite())
                && particles.vel.iter().all(|v| v.is_finite())
                && particles.density.iter().all(|d| d.is_finite());
            if !all_finite {
                failures.push("non-finite particle state".to_string());
            }
        }

        ScenarioOutcome {
            name: self.name.clone(),
            failures,
        }
    }
}

/// Static equilibrium: a lattice seeded wider than the kernel support has no
/// interacting pairs, and with zero gravity and rest density matching the
/// measured (zero) density nothing may move.
pub fn static_equilibrium() -> ReferenceScenario {
    ReferenceScenario {
        name: "Static Equilibrium".to_string(),
        options: FluidOptions {
            num_particles: 100,
            particle_radius: 5.0,
            particle_spacing: 20.0,
            initial_centre: Vec2::new(250.0, 250.0),
            gravity: Vec2::ZERO,
            bounding_box: Aabb {
                min: Vec2::ZERO,
                max: Vec2::splat(500.0),
            },
            smoothing_radius: 25.0,
            stiffness: 1.0e5,
            desired_rest_density: 0.0,
            ..FluidOptions::default()
        },
        dt: 1.0 / 120.0,
        ticks: 60,
        expected: ExpectedResult {
            position_bounds: Some(Aabb {
                min: Vec2::ZERO,
                max: Vec2::splat(500.0),
            }),
            max_speed: Some(1.0),
            finite_state: true,
        },
    }
}

/// Settling tank: the interactive defaults dropped into a square tank. The
/// fluid sloshes hard early on; the reflective walls and pressure clamp must
/// keep the state bounded and finite throughout.
pub fn settling_tank() -> ReferenceScenario {
    ReferenceScenario {
        name: "Settling Tank".to_string(),
        options: FluidOptions {
            num_particles: 100,
            initial_centre: Vec2::new(250.0, 250.0),
            bounding_box: Aabb {
                min: Vec2::ZERO,
                max: Vec2::splat(500.0),
            },
            ..FluidOptions::default()
        },
        dt: 1.0 / 120.0,
        ticks: 300,
        expected: ExpectedResult {
            position_bounds: Some(Aabb {
                min: Vec2::ZERO,
                max: Vec2::splat(500.0),
            }),
            max_speed: None,
            finite_state: true,
        },
    }
}

/// All built-in scenarios in execution order.
pub fn builtin_scenarios() -> Vec<ReferenceScenario> {
    vec![static_equilibrium(), settling_tank()]
}
