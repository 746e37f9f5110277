//! Closed-form solutions for the kinematic reference scenarios.
//!
//! The engine integrates with explicit Euler, so the expected values carry
//! a per-step quantization on top of the continuous solution; helpers here
//! expose both so scenarios can assert tight, honest tolerances.

/// Continuous free-fall time from rest over `drop_height` under constant
/// acceleration `gravity`.
///
/// ```text
/// t = sqrt(2 h / g)
/// ```
pub fn free_fall_time(drop_height: f32, gravity: f32) -> f32 {
    (2.0 * drop_height / gravity).sqrt()
}

/// Number of explicit-Euler steps of size `dt` before a particle falling
/// from rest covers `drop_height`.
///
/// Gravity is applied before integration each step, so after `k` steps the
/// covered distance is `g dt^2 k (k + 1) / 2`.
pub fn euler_steps_to_fall(drop_height: f32, gravity: f32, dt: f32) -> u32 {
    let step_area = gravity * dt * dt;
    let mut k = 0_u32;
    let mut covered = 0.0_f32;
    while covered < drop_height {
        k += 1;
        covered = step_area * (k as f32) * (k as f32 + 1.0) * 0.5;
    }
    k
}

/// Largest speed lost per wall contact by an explicit-Euler bounce at
/// restitution 1.
///
/// The reflection quantizes the turnaround to a tick boundary, which eats
/// up to one gravity impulse per contact.
pub fn euler_contact_speed_loss(gravity: f32, dt: f32) -> f32 {
    gravity * dt
}
