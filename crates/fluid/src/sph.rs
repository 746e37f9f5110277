//! Per-phase SPH operators.
//!
//! Each function is one phase of the tick pipeline and touches exactly one
//! writable particle array, reading the arrays finalized by earlier phases.
//! That split is what lets the phases run particle-parallel without locks:
//! a worker owns the output slot of the particles it iterates and everything
//! else is read-only until the next phase barrier.
//!
//! Phase order is fixed by [`crate::Fluid::update`]: gravity, prediction,
//! grid refresh, neighbour collection, density/pressure, forces,
//! integration, reflection.

use std::f32::consts::TAU;

use glam::Vec2;
use rand::Rng;
use rayon::prelude::*;

use crate::attractor::Attractor;
use crate::grid::SpatialGrid;
use crate::options::FluidOptions;
use crate::particle::{Neighbour, ParticleSet};
use crate::smoothing;

/// Apply the configured gravity impulse to every velocity.
pub fn apply_gravity(particles: &mut ParticleSet, options: &FluidOptions, dt: f32) {
    let gravity = options.gravity;
    particles.vel.par_iter_mut().for_each(|v| *v += gravity * dt);
}

/// Refresh predicted positions `x + v * dt`.
///
/// Runs after gravity so the prediction includes this tick's gravity
/// impulse. The predicted position is only ever used for binning and
/// neighbourhood queries.
pub fn predict_positions(particles: &mut ParticleSet, dt: f32) {
    let ParticleSet {
        predicted,
        pos,
        vel,
        ..
    } = particles;
    predicted
        .par_iter_mut()
        .zip(pos.par_iter().zip(vel.par_iter()))
        .for_each(|(xh, (x, v))| *xh = *x + *v * dt);
}

/// Re-bin every particle into the grid.
///
/// Single-threaded: this is the only phase that mutates the grid, and it
/// leaves the map read-only for the rest of the tick.
pub fn update_grid(grid: &mut SpatialGrid, particles: &mut ParticleSet, options: &FluidOptions) {
    grid.reconfigure(&options.bounding_box, options.smoothing_radius);
    grid.clear();

    let ParticleSet {
        pos,
        predicted,
        grid_key,
        ..
    } = particles;
    let query: &[Vec2] = if options.use_predicted_positions {
        predicted
    } else {
        pos
    };
    for (i, p) in query.iter().enumerate() {
        let key = grid.key_for(*p);
        grid_key[i] = key;
        grid.insert(key, i);
    }
}

/// Gather each particle's neighbours from its own cell and the eight
/// surrounding cells.
///
/// Own-cell particles are included without a distance check (the cell is no
/// wider than the kernel support; the handful of corner pairs this admits
/// slightly beyond the support is accepted). Ring cells are filtered on
/// squared distance.
pub fn collect_neighbours(
    particles: &mut ParticleSet,
    grid: &SpatialGrid,
    options: &FluidOptions,
) {
    let h = options.smoothing_radius;
    let h_sq = h * h;

    let ParticleSet {
        neighbours,
        pos,
        predicted,
        grid_key,
        ..
    } = particles;
    let query: &[Vec2] = if options.use_predicted_positions {
        predicted
    } else {
        pos
    };
    let keys: &[(i32, i32)] = grid_key;

    neighbours.par_iter_mut().enumerate().for_each(|(i, list)| {
        list.clear();
        let (cx, cy) = keys[i];
        let centre = query[i];

        for &j in grid.cell((cx, cy)) {
            if j != i {
                list.push(neighbour_entry(j, centre - query[j]));
            }
        }

        for x_off in -1..=1_i32 {
            for y_off in -1..=1_i32 {
                if x_off == 0 && y_off == 0 {
                    continue;
                }
                for &j in grid.cell((cx + x_off, cy + y_off)) {
                    let delta = centre - query[j];
                    if delta.length_squared() < h_sq {
                        list.push(neighbour_entry(j, delta));
                    }
                }
            }
        }
    });
}

/// Build a neighbour record from the separation vector (neighbour toward
/// particle). Exactly coincident particles get distance 1 and a random unit
/// direction, which sidesteps the singularity at the same force scale.
fn neighbour_entry(index: usize, delta: Vec2) -> Neighbour {
    let distance = delta.length();
    if distance == 0.0 {
        let angle = rand::thread_rng().gen::<f32>() * TAU;
        Neighbour {
            index,
            distance: 1.0,
            direction: Vec2::new(angle.cos(), angle.sin()),
        }
    } else {
        Neighbour {
            index,
            distance,
            direction: delta / distance,
        }
    }
}

/// Sum kernel-weighted neighbour masses into densities and derive clamped
/// pressures.
///
/// ```text
/// rho_i = sum_j m_j * W_poly6(r_ij, h)
/// P_i   = min(stiffness * (rho_i - rho_rest), pressure_limit)
/// ```
///
/// Pressure is not floored: particles below rest density carry negative
/// pressure and pull their neighbours inward.
pub fn solve_density_pressure(particles: &mut ParticleSet, options: &FluidOptions) {
    let h = options.smoothing_radius;
    let stiffness = options.stiffness;
    let rest_density = options.desired_rest_density;
    let pressure_limit = options.pressure_limit;

    let ParticleSet {
        density,
        pressure,
        mass,
        neighbours,
        ..
    } = particles;
    let mass: &[f32] = mass;
    let neighbours: &[Vec<Neighbour>] = neighbours;

    density
        .par_iter_mut()
        .zip(pressure.par_iter_mut())
        .enumerate()
        .for_each(|(i, (rho, p))| {
            let mut sum = 0.0_f32;
            for n in &neighbours[i] {
                sum += mass[n.index] * smoothing::poly6(n.distance, h);
            }
            *rho = sum;

            let mut pr = stiffness * (sum - rest_density);
            if pr > pressure_limit {
                pr = pressure_limit;
            }
            *p = pr;
        });
}

/// Accumulate the pressure and near-pressure forces.
///
/// For each neighbour, with shared pressure `(P_i + P_j) / 2` and spiky
/// gradient magnitude `g`:
///
/// ```text
/// F       = Pbar * dir * m_j / rho_j
/// f_p    += F * g
/// f_near += F * g^4
/// ```
///
/// and both accumulators are negated after the loop. The fourth-power
/// near-pressure term is the short-range response that keeps particles from
/// interpenetrating.
pub fn solve_pressure_forces(particles: &mut ParticleSet, options: &FluidOptions) {
    let h = options.smoothing_radius;

    let ParticleSet {
        pressure_force,
        pressure_near_force,
        pressure,
        density,
        mass,
        neighbours,
        ..
    } = particles;
    let pressure: &[f32] = pressure;
    let density: &[f32] = density;
    let mass: &[f32] = mass;
    let neighbours: &[Vec<Neighbour>] = neighbours;

    pressure_force
        .par_iter_mut()
        .zip(pressure_near_force.par_iter_mut())
        .enumerate()
        .for_each(|(i, (f_p, f_near))| {
            let mut accum = Vec2::ZERO;
            let mut accum_near = Vec2::ZERO;
            for n in &neighbours[i] {
                let rho_j = density[n.index];
                if rho_j == 0.0 {
                    continue;
                }
                let shared_pressure = 0.5 * (pressure[i] + pressure[n.index]);
                let g = smoothing::spiky_gradient(n.distance, h);
                let base = shared_pressure * mass[n.index] / rho_j * n.direction;
                accum += base * g;
                accum_near += base * (g * g * g * g);
            }
            *f_p = -accum;
            *f_near = -accum_near;
        });
}

/// Accumulate the viscosity force.
///
/// ```text
/// f_visc = viscosity * sum_j (v_j - v_i) * W_poly6(r_ij, h)
/// ```
///
/// The Poly6 value stands in for the Viscosity-kernel Laplacian here; the
/// smoother falloff trades physical fidelity for stability.
pub fn solve_viscosity_forces(particles: &mut ParticleSet, options: &FluidOptions) {
    let h = options.smoothing_radius;
    let viscosity = options.viscosity;

    let ParticleSet {
        viscosity_force,
        vel,
        neighbours,
        ..
    } = particles;
    let vel: &[Vec2] = vel;
    let neighbours: &[Vec<Neighbour>] = neighbours;

    viscosity_force
        .par_iter_mut()
        .enumerate()
        .for_each(|(i, f)| {
            let mut accum = Vec2::ZERO;
            for n in &neighbours[i] {
                accum += (vel[n.index] - vel[i]) * smoothing::poly6(n.distance, h);
            }
            *f = accum * viscosity;
        });
}

/// Accumulate the surface-tension force, or zero it while tension is
/// disabled.
///
/// Colour-field formulation: the surface normal is the Poly6 gradient of
/// the neighbour volume field and curvature comes from the Viscosity-kernel
/// Laplacian. Tension only applies where the normal is long enough to mark
/// a surface, per `surface_tension_threshold`.
pub fn solve_tension_forces(particles: &mut ParticleSet, options: &FluidOptions) {
    if options.surface_tension == 0.0 {
        particles.tension_force.fill(Vec2::ZERO);
        return;
    }

    let h = options.smoothing_radius;
    let tension = options.surface_tension;
    let threshold = options.surface_tension_threshold;

    let ParticleSet {
        tension_force,
        density,
        mass,
        neighbours,
        ..
    } = particles;
    let density: &[f32] = density;
    let mass: &[f32] = mass;
    let neighbours: &[Vec<Neighbour>] = neighbours;

    tension_force.par_iter_mut().enumerate().for_each(|(i, f)| {
        let mut normal = Vec2::ZERO;
        let mut curvature = 0.0_f32;
        for n in &neighbours[i] {
            let rho_j = density[n.index];
            if rho_j == 0.0 {
                continue;
            }
            let volume = mass[n.index] / rho_j;
            normal += volume * smoothing::poly6_gradient(n.distance, h, n.direction);
            curvature -= volume * smoothing::viscosity_laplacian(n.distance, h);
        }
        let len = normal.length();
        *f = if len > threshold && len > f32::EPSILON {
            tension * curvature * (normal / len)
        } else {
            Vec2::ZERO
        };
    });
}

/// Apply the accumulated SPH forces and attractor impulses to velocities.
///
/// Particles with zero density are isolated and receive no SPH
/// acceleration. Attractor impulses use the Poly6 gradient over the
/// attractor's radius, directed from the particle toward the attractor;
/// positive strength pulls in, negative repels.
pub fn apply_forces(
    particles: &mut ParticleSet,
    attractors: &[Attractor],
    options: &FluidOptions,
    dt: f32,
) {
    let ParticleSet {
        vel,
        pos,
        density,
        pressure_force,
        pressure_near_force,
        viscosity_force,
        tension_force,
        ..
    } = particles;
    let pos: &[Vec2] = pos;
    let density: &[f32] = density;
    let pressure_force: &[Vec2] = pressure_force;
    let pressure_near_force: &[Vec2] = pressure_near_force;
    let viscosity_force: &[Vec2] = viscosity_force;
    let tension_force: &[Vec2] = tension_force;

    vel.par_iter_mut().enumerate().for_each(|(i, v)| {
        let rho = density[i];
        if rho > 0.0 {
            let force =
                pressure_force[i] + pressure_near_force[i] + viscosity_force[i] + tension_force[i];
            *v += force / rho * dt;
        }

        for a in attractors {
            let delta = a.position - pos[i];
            let dist = delta.length();
            if dist > 0.0 && dist < a.radius {
                let toward = delta / dist;
                *v += -a.strength * smoothing::poly6_gradient(dist, a.radius, toward) * dt;
            }
        }
    });
}

/// Integrate positions and resolve the bounding-box reflection.
///
/// Each axis is handled independently: a position component on or beyond a
/// bound is clamped to it and the matching velocity component scaled by
/// `-restitution`. The test is against the point position, not the
/// particle's visual radius.
pub fn apply_velocity(particles: &mut ParticleSet, options: &FluidOptions, dt: f32) {
    let min = options.bounding_box.min;
    let max = options.bounding_box.max;
    let restitution = options.bounding_box_restitution;

    let ParticleSet { pos, vel, .. } = particles;
    pos.par_iter_mut()
        .zip(vel.par_iter_mut())
        .for_each(|(p, v)| {
            *p += *v * dt;

            if p.x <= min.x {
                p.x = min.x;
                v.x *= -restitution;
            } else if p.x >= max.x {
                p.x = max.x;
                v.x *= -restitution;
            }

            if p.y <= min.y {
                p.y = min.y;
                v.y *= -restitution;
            } else if p.y >= max.y {
                p.y = max.y;
                v.y *= -restitution;
            }
        });
}

/// Brute-force density at an arbitrary point, summed over every particle.
///
/// O(N) and independent of the grid, so it works anywhere, including
/// outside the box. Used by density-field visualization probes, never by
/// the pipeline.
pub fn density_at_point(particles: &ParticleSet, options: &FluidOptions, point: Vec2) -> f32 {
    let h = options.smoothing_radius;
    particles
        .pos
        .iter()
        .zip(&particles.mass)
        .map(|(p, m)| m * smoothing::poly6((point - *p).length(), h))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_particle_set(separation: f32) -> (ParticleSet, FluidOptions) {
        let options = FluidOptions {
            smoothing_radius: 50.0,
            particle_mass: 0.045,
            stiffness: 1.0e6,
            desired_rest_density: 0.0,
            viscosity: 0.13,
            ..FluidOptions::default()
        };
        let mut set = ParticleSet::new();
        set.push(Vec2::ZERO, 5.0, options.particle_mass);
        set.push(Vec2::new(separation, 0.0), 5.0, options.particle_mass);
        set.neighbours[0].push(Neighbour {
            index: 1,
            distance: separation,
            direction: -Vec2::X,
        });
        set.neighbours[1].push(Neighbour {
            index: 0,
            distance: separation,
            direction: Vec2::X,
        });
        (set, options)
    }

    #[test]
    fn density_sums_neighbour_masses() {
        let (mut set, options) = two_particle_set(20.0);
        solve_density_pressure(&mut set, &options);
        let expected = options.particle_mass * smoothing::poly6(20.0, 50.0);
        assert!((set.density[0] - expected).abs() < expected * 1.0e-5);
        assert_eq!(set.density[0], set.density[1]);
    }

    #[test]
    fn pressure_clamped_to_limit() {
        let (mut set, mut options) = two_particle_set(20.0);
        options.pressure_limit = 1.0e-9;
        solve_density_pressure(&mut set, &options);
        assert_eq!(set.pressure[0], 1.0e-9);
    }

    #[test]
    fn pressure_can_go_negative_below_rest_density() {
        let (mut set, mut options) = two_particle_set(20.0);
        options.desired_rest_density = 1.0;
        solve_density_pressure(&mut set, &options);
        assert!(set.pressure[0] < 0.0);
    }

    #[test]
    fn pressure_forces_are_equal_and_opposite() {
        let (mut set, options) = two_particle_set(20.0);
        solve_density_pressure(&mut set, &options);
        solve_pressure_forces(&mut set, &options);
        let sum = set.pressure_force[0] + set.pressure_force[1];
        assert!(sum.length() < 1.0e-6, "net pressure force {sum:?}");
        let near_sum = set.pressure_near_force[0] + set.pressure_near_force[1];
        assert!(near_sum.length() < 1.0e-12, "net near force {near_sum:?}");
    }

    #[test]
    fn positive_pressure_pushes_particles_apart() {
        let (mut set, options) = two_particle_set(20.0);
        solve_density_pressure(&mut set, &options);
        assert!(set.pressure[0] > 0.0);
        solve_pressure_forces(&mut set, &options);
        // Particle 0 sits left of particle 1; repulsion points it further left.
        assert!(set.pressure_force[0].x < 0.0);
        assert!(set.pressure_force[1].x > 0.0);
    }

    #[test]
    fn viscosity_force_follows_relative_velocity() {
        let (mut set, options) = two_particle_set(20.0);
        set.vel[1] = Vec2::new(10.0, 0.0);
        solve_density_pressure(&mut set, &options);
        solve_viscosity_forces(&mut set, &options);
        let w = smoothing::poly6(20.0, 50.0);
        let expected = Vec2::new(10.0 * w * options.viscosity, 0.0);
        assert!((set.viscosity_force[0] - expected).length() < expected.length() * 1.0e-5);
        assert_eq!(set.viscosity_force[1], -set.viscosity_force[0]);
    }

    #[test]
    fn zero_density_particles_get_no_sph_acceleration() {
        let options = FluidOptions::default();
        let mut set = ParticleSet::new();
        set.push(Vec2::new(100.0, 100.0), 5.0, options.particle_mass);
        set.pressure_force[0] = Vec2::new(1.0e9, 0.0);
        apply_forces(&mut set, &[], &options, 1.0 / 120.0);
        assert_eq!(set.vel[0], Vec2::ZERO);
    }

    #[test]
    fn tension_disabled_zeroes_stale_accumulators() {
        let (mut set, options) = two_particle_set(20.0);
        set.tension_force[0] = Vec2::splat(3.0);
        solve_tension_forces(&mut set, &options);
        assert_eq!(set.tension_force[0], Vec2::ZERO);
    }

    #[test]
    fn density_probe_matches_manual_sum() {
        let (set, options) = two_particle_set(20.0);
        let point = Vec2::new(5.0, 5.0);
        let expected: f32 = set
            .pos
            .iter()
            .map(|p| options.particle_mass * smoothing::poly6((point - *p).length(), 50.0))
            .sum();
        let probed = density_at_point(&set, &options, point);
        assert!((probed - expected).abs() < 1.0e-12);
    }
}
