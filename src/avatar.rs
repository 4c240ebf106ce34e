//! The narrow motion contract between the pursuer AI and whatever animates
//! its body, plus a headless hopping animator that fulfils it.
//!
//! The AI never moves the body directly. It asks for a heading and a hop
//! length through [`Avatar::set_steering`], reads the body's position back
//! with [`Avatar::position`] and sets its yaw.

use std::f32::consts::TAU;

use bevy::math::Vec3;

/// Implemented by the animation layer that owns the pursuer's body.
pub trait Avatar {
    /// Request the next move: a unit direction on the XZ plane and a
    /// distance in world units.
    fn set_steering(&mut self, direction: Vec3, distance: f32);
    /// Current world position of the body.
    fn position(&self) -> Vec3;
    /// Heading in degrees around +Y; 0 faces +Z.
    fn set_facing(&mut self, yaw_degrees: f32);
}

/// Parameters of a single hop, read when the hop starts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JumpParams {
    /// Horizontal direction of travel. Normalized at take-off.
    pub forward_dir: Vec3,
    /// Horizontal distance covered by one hop.
    pub jump_forward: f32,
    /// Initial vertical speed.
    pub jump_vel: f32,
    pub gravity: f32,
}

impl Default for JumpParams {
    fn default() -> Self {
        Self {
            forward_dir: Vec3::Z,
            jump_forward: 3.0,
            jump_vel: 2.6,
            gravity: 8.8,
        }
    }
}

impl JumpParams {
    /// Time from take-off to landing on flat ground.
    pub fn flight_time(&self) -> f32 {
        if self.gravity > 0.0 {
            2.0 * self.jump_vel / self.gravity
        } else {
            0.0
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum HopPhase {
    /// Squashing on the ground; a hop launches once the squash cycle has
    /// peaked and returned to rest.
    Squash {
        elapsed: f32,
        passed_peak: bool,
    },
    Airborne {
        vy: f32,
        velocity: Vec3,
    },
}

/// Headless squash-and-hop animator.
///
/// On the ground the body squashes on a sine cycle. When a cycle completes
/// it hops along the current [`JumpParams`], lands at its base height and
/// starts squashing again. Between hops it does not move.
#[derive(Debug, Clone)]
pub struct JumpAnimator {
    position: Vec3,
    base_y: f32,
    yaw_degrees: f32,
    base_scale: f32,
    scale: Vec3,
    squash_freq_hz: f32,
    width_amp: f32,
    height_amp: f32,
    params: JumpParams,
    phase: HopPhase,
    hops: u32,
}

impl JumpAnimator {
    pub const DEFAULT_SQUASH_FREQ_HZ: f32 = 0.55;

    pub fn new(position: Vec3, base_scale: f32, params: JumpParams) -> Self {
        Self {
            position,
            base_y: position.y,
            yaw_degrees: 0.0,
            base_scale,
            scale: Vec3::splat(base_scale),
            squash_freq_hz: Self::DEFAULT_SQUASH_FREQ_HZ,
            width_amp: 0.22,
            height_amp: 0.22,
            params,
            phase: HopPhase::Squash {
                elapsed: 0.0,
                passed_peak: false,
            },
            hops: 0,
        }
    }

    pub fn params(&self) -> JumpParams {
        self.params
    }

    /// Replace the parameters used by the next hop. A hop already in the
    /// air keeps the parameters it took off with.
    pub fn set_jump_params(&mut self, params: JumpParams) {
        self.params = params;
    }

    pub fn yaw_degrees(&self) -> f32 {
        self.yaw_degrees
    }

    pub fn scale(&self) -> Vec3 {
        self.scale
    }

    pub fn is_airborne(&self) -> bool {
        matches!(self.phase, HopPhase::Airborne { .. })
    }

    /// Completed hops since creation.
    pub fn hops(&self) -> u32 {
        self.hops
    }

    /// Advance the animation by `dt` seconds.
    pub fn advance(&mut self, dt: f32) {
        match self.phase {
            HopPhase::Squash {
                elapsed,
                passed_peak,
            } => {
                let elapsed = elapsed + dt;
                let wave = (TAU * self.squash_freq_hz * elapsed).sin();
                let squash = (wave + 1.0) * 0.5;
                self.scale = Vec3::new(
                    self.base_scale * (1.0 + self.width_amp * squash),
                    self.base_scale * (1.0 - self.height_amp * squash),
                    self.base_scale * (1.0 + self.width_amp * squash),
                );

                let passed_peak = passed_peak || wave > 0.9;
                if passed_peak && wave <= 0.05 {
                    self.take_off();
                } else {
                    self.phase = HopPhase::Squash {
                        elapsed,
                        passed_peak,
                    };
                }
            }
            HopPhase::Airborne { vy, velocity } => {
                let vy = vy - self.params.gravity * dt;
                self.position += velocity * dt;
                self.position.y += vy * dt;
                self.scale = Vec3::splat(self.base_scale);

                if self.position.y <= self.base_y {
                    self.position.y = self.base_y;
                    self.hops += 1;
                    self.phase = HopPhase::Squash {
                        elapsed: 0.0,
                        passed_peak: false,
                    };
                } else {
                    self.phase = HopPhase::Airborne { vy, velocity };
                }
            }
        }
    }

    fn take_off(&mut self) {
        let flat = Vec3::new(self.params.forward_dir.x, 0.0, self.params.forward_dir.z);
        let dir = flat.try_normalize().unwrap_or(Vec3::Z);
        let flight = self.params.flight_time();
        let speed = if flight > 1e-6 {
            self.params.jump_forward / flight
        } else {
            0.0
        };
        self.scale = Vec3::splat(self.base_scale);
        self.phase = HopPhase::Airborne {
            vy: self.params.jump_vel,
            velocity: dir * speed,
        };
    }
}

impl Avatar for JumpAnimator {
    fn set_steering(&mut self, direction: Vec3, distance: f32) {
        self.params.forward_dir = direction;
        self.params.jump_forward = distance.max(0.0);
    }

    fn position(&self) -> Vec3 {
        self.position
    }

    fn set_facing(&mut self, yaw_degrees: f32) {
        self.yaw_degrees = yaw_degrees;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 120.0;

    fn run_until_hops(animator: &mut JumpAnimator, hops: u32, max_secs: f32) {
        let mut t = 0.0;
        while animator.hops() < hops && t < max_secs {
            animator.advance(DT);
            t += DT;
        }
    }

    #[test]
    fn rests_in_place_while_squashing() {
        let mut a = JumpAnimator::new(Vec3::new(1.0, 0.35, 2.0), 0.1, JumpParams::default());
        for _ in 0..30 {
            a.advance(DT);
        }
        assert!(!a.is_airborne());
        assert_eq!(a.position(), Vec3::new(1.0, 0.35, 2.0));
        // Squashed wider than tall
        assert!(a.scale().x > a.scale().y);
    }

    #[test]
    fn hop_lands_one_jump_forward_away() {
        let start = Vec3::new(0.0, 0.35, 0.0);
        let mut a = JumpAnimator::new(start, 0.1, JumpParams::default());
        a.set_steering(Vec3::X, 3.0);
        run_until_hops(&mut a, 1, 5.0);
        assert_eq!(a.hops(), 1);
        let p = a.position();
        assert!((p.x - 3.0).abs() < 0.15, "landed at {:?}", p);
        assert!(p.z.abs() < 1e-4);
        assert_eq!(p.y, 0.35);
    }

    #[test]
    fn steering_between_hops_changes_next_hop() {
        let mut a = JumpAnimator::new(Vec3::ZERO, 0.1, JumpParams::default());
        a.set_steering(Vec3::Z, 1.0);
        run_until_hops(&mut a, 1, 5.0);
        a.set_steering(Vec3::NEG_X, 2.0);
        run_until_hops(&mut a, 2, 5.0);
        let p = a.position();
        assert!((p.z - 1.0).abs() < 0.1, "landed at {:?}", p);
        assert!((p.x + 2.0).abs() < 0.1, "landed at {:?}", p);
    }

    #[test]
    fn zero_direction_falls_back_to_forward() {
        let mut a = JumpAnimator::new(Vec3::ZERO, 0.1, JumpParams::default());
        a.set_jump_params(JumpParams {
            forward_dir: Vec3::ZERO,
            jump_forward: 1.5,
            ..JumpParams::default()
        });
        run_until_hops(&mut a, 1, 5.0);
        assert!((a.position().z - 1.5).abs() < 0.1);
    }

    #[test]
    fn flight_time_matches_ballistics() {
        let p = JumpParams::default();
        assert!((p.flight_time() - 2.0 * 2.6 / 8.8).abs() < 1e-6);
        let grounded = JumpParams {
            gravity: 0.0,
            ..p
        };
        assert_eq!(grounded.flight_time(), 0.0);
    }

    #[test]
    fn facing_is_recorded() {
        let mut a = JumpAnimator::new(Vec3::ZERO, 0.1, JumpParams::default());
        a.set_facing(135.0);
        assert_eq!(a.yaw_degrees(), 135.0);
    }
}
