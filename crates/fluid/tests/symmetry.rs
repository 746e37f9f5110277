//! Force symmetry and the coincident-particle rule.

use fluid::{Aabb, Fluid, FluidOptions};
use glam::Vec2;

const DT: f32 = 1.0 / 120.0;

fn options() -> FluidOptions {
    FluidOptions {
        gravity: Vec2::ZERO,
        bounding_box: Aabb {
            min: Vec2::splat(-250.0),
            max: Vec2::splat(250.0),
        },
        initial_centre: Vec2::ZERO,
        smoothing_radius: 50.0,
        desired_rest_density: 2.5e-5,
        ..FluidOptions::default()
    }
}

#[test]
fn mirrored_pair_stays_mirrored() {
    let mut sim = Fluid::new(options());
    sim.particles_mut().push(Vec2::new(-10.0, -7.0), 5.0, 0.045);
    sim.particles_mut().push(Vec2::new(10.0, 7.0), 5.0, 0.045);

    sim.update(DT);

    let particles = sim.particles();
    let mirror_error = (particles.pos[0] + particles.pos[1]).length();
    assert!(
        mirror_error < 1.0e-5,
        "positions no longer mirrored: {:?} vs {:?}",
        particles.pos[0],
        particles.pos[1]
    );
    let vel_error = (particles.vel[0] + particles.vel[1]).length();
    assert!(vel_error < 1.0e-5, "velocities not mirrored");
}

#[test]
fn mirrored_pair_stays_mirrored_over_many_ticks() {
    let mut sim = Fluid::new(options());
    sim.particles_mut().push(Vec2::new(-12.0, 0.0), 5.0, 0.045);
    sim.particles_mut().push(Vec2::new(12.0, 0.0), 5.0, 0.045);

    for _ in 0..30 {
        sim.update(DT);
    }

    let particles = sim.particles();
    assert!((particles.pos[0] + particles.pos[1]).length() < 1.0e-3);
    // An axis-aligned pair never picks up motion off the axis.
    assert!(particles.pos[0].y.abs() < 1.0e-4);
    assert!(particles.pos[1].y.abs() < 1.0e-4);
}

#[test]
fn coincident_particles_are_perturbed_not_singular() {
    let mut sim = Fluid::new(options());
    sim.particles_mut().push(Vec2::new(20.0, 20.0), 5.0, 0.045);
    sim.particles_mut().push(Vec2::new(20.0, 20.0), 5.0, 0.045);

    sim.update(DT);

    let particles = sim.particles();
    for i in 0..2 {
        assert_eq!(particles.neighbours[i].len(), 1);
        let n = &particles.neighbours[i][0];
        assert_eq!(n.distance, 1.0);
        assert!((n.direction.length() - 1.0).abs() < 1.0e-5);
        assert!(
            particles.density[i].is_finite() && !particles.density[i].is_nan(),
            "density {} is not finite",
            particles.density[i]
        );
        assert!(particles.density[i] > 0.0);
        assert!(particles.vel[i].is_finite());
        assert!(particles.pos[i].is_finite());
    }
}
