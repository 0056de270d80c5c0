//! Level state and ball physics
//!
//! A level owns the board and the ball. Everything here is driven from a
//! single update loop; gestures and ticks never interleave.

use glam::{Mat4, Quat, Vec2, Vec3};
use serde::{Deserialize, Serialize};

use super::board::GameBoard;
use crate::config::PhysicsConfig;
use crate::consts::*;
use crate::error::LevelError;

/// Drawable area the board is laid out in, world units
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
    /// Depth of the tunnel floor's top face
    pub floor_z: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Result<Self, LevelError> {
        if !(width > 0.0 && height > 0.0) || !width.is_finite() || !height.is_finite() {
            return Err(LevelError::InvalidViewport { width, height });
        }
        Ok(Self {
            width,
            height,
            floor_z: 0.0,
        })
    }

    pub fn diagonal(&self) -> f32 {
        Vec2::new(self.width, self.height).length()
    }
}

/// Which passage game a level plays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LevelVariant {
    /// Drag pieces from the staging slots onto the board
    Movable,
    /// Turn the pieces of a generated maze in place
    Rotatable,
}

/// The rolling ball
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ball {
    pub position: Vec3,
    pub velocity: Vec3,
    pub acceleration: Vec3,
    pub row: u32,
    pub col: u32,
    pub radius: f32,
    /// Accumulated spin for drawing
    pub rotation: Quat,
    /// Position at the last requested redraw
    pub drawn_position: Vec3,
}

impl Ball {
    pub fn new(position: Vec3, row: u32, col: u32, radius: f32) -> Self {
        Self {
            position,
            velocity: Vec3::ZERO,
            acceleration: Vec3::ZERO,
            row,
            col,
            radius,
            rotation: Quat::IDENTITY,
            drawn_position: position,
        }
    }

    /// Quadratic air drag opposing the velocity
    pub fn drag_force(&self, drag_constant: f32) -> Vec3 {
        let speed = self.velocity.length();
        if speed < LENGTH_TOO_SMALL_TO_NORMALIZE {
            return Vec3::ZERO;
        }
        -drag_constant * speed * speed * (self.velocity / speed)
    }

    /// Velocity after `dt` of acceleration and drag
    pub fn updated_velocity(&self, dt: f32, drag_constant: f32) -> Vec3 {
        let drag = self.drag_force(drag_constant);
        if self.velocity.length() < (drag * dt).length() {
            self.acceleration * dt
        } else {
            self.velocity + (self.acceleration + drag) * dt
        }
    }

    /// Spin the ball as if it rolled for `dt`
    pub fn update_rotation(&mut self, dt: f32) {
        let axis = Vec3::Z.cross(self.velocity);
        if axis.length() > LENGTH_TOO_SMALL_TO_NORMALIZE {
            let angle = self.velocity.length() * dt * ROTATION_SCALE;
            let q = Quat::from_axis_angle(axis.normalize(), angle);
            self.rotation = (q * self.rotation).normalize();
        }
    }

    /// Scale applied to the ball model
    pub fn scale(&self) -> f32 {
        2.0 * self.radius / BALL_MODEL_DIAMETER
    }

    pub fn transform(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(Vec3::splat(self.scale()), self.rotation, self.position)
    }
}

/// A running passage level
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Level {
    pub variant: LevelVariant,
    pub board: GameBoard,
    pub ball: Ball,
    pub physics: PhysicsConfig,
    pub viewport: Viewport,
    finished: bool,
}

impl Level {
    pub fn new(
        variant: LevelVariant,
        board: GameBoard,
        ball: Ball,
        physics: PhysicsConfig,
        viewport: Viewport,
    ) -> Self {
        Self {
            variant,
            board,
            ball,
            physics,
            viewport,
            finished: false,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub(crate) fn finish(&mut self) {
        if !self.finished {
            self.finished = true;
            log::info!(
                "{:?} level finished at ({}, {})",
                self.variant,
                self.ball.row,
                self.ball.col
            );
        }
    }

    /// Store the device tilt; passage levels ignore the z axis
    pub fn update_acceleration(&mut self, x: f32, y: f32, _z: f32) {
        self.ball.acceleration = self.physics.acceleration_adjustment * Vec3::new(-x, -y, 0.0);
    }

    /// True when the ball has moved far enough since the last redraw
    pub fn drawing_necessary(&mut self) -> bool {
        let moved = (self.ball.position - self.ball.drawn_position).length();
        let needed = moved > self.viewport.diagonal() / 200.0;
        if needed {
            self.ball.drawn_position = self.ball.position;
        }
        needed
    }

    pub fn drag(&mut self, start: Vec2, delta: Vec2) -> bool {
        self.board.begin_drag(start, delta)
    }

    pub fn drag_ended(&mut self, at: Vec2) -> bool {
        self.board.end_drag(at)
    }

    pub fn tap(&mut self, at: Vec2) -> bool {
        self.board.tap(at)
    }

    /// Cells of the locked path ending at the ball, root first
    pub fn locked_path(&self) -> Vec<(u32, u32)> {
        self.board.locked_path(self.ball.row, self.ball.col)
    }

    /// Unlink the whole path when the level is torn down
    pub fn end(&mut self) {
        self.board.cancel_drag();
        self.board.catalog.clear_path();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_viewport_rejects_degenerate() {
        assert!(Viewport::new(0.0, 1.0).is_err());
        assert!(Viewport::new(1.0, f32::NAN).is_err());
        assert!(Viewport::new(2.0, 4.0).is_ok());
    }

    #[test]
    fn test_velocity_from_rest_is_acceleration() {
        let mut ball = Ball::new(Vec3::ZERO, 0, 0, 0.25);
        ball.acceleration = Vec3::new(0.0, 2.0, 0.0);
        let v = ball.updated_velocity(0.5, DRAG_CONSTANT);
        assert_eq!(v, Vec3::new(0.0, 1.0, 0.0));
    }

    #[test]
    fn test_drag_slows_coasting_ball() {
        let mut ball = Ball::new(Vec3::ZERO, 0, 0, 0.25);
        ball.velocity = Vec3::new(3.0, 0.0, 0.0);
        let v = ball.updated_velocity(0.1, DRAG_CONSTANT);
        assert!(v.x < 3.0 && v.x > 0.0);
        assert_eq!(v.y, 0.0);
    }

    #[test]
    fn test_heavy_drag_resets_to_acceleration() {
        let mut ball = Ball::new(Vec3::ZERO, 0, 0, 0.25);
        ball.velocity = Vec3::new(1.0, 0.0, 0.0);
        ball.acceleration = Vec3::new(0.0, -1.0, 0.0);
        // drag * dt = 10 * 1 * 2 = 20 > |v|
        let v = ball.updated_velocity(2.0, 10.0);
        assert_eq!(v, Vec3::new(0.0, -2.0, 0.0));
    }

    #[test]
    fn test_rotation_stays_normalized() {
        let mut ball = Ball::new(Vec3::ZERO, 0, 0, 0.25);
        ball.velocity = Vec3::new(1.0, 2.0, 0.0);
        for _ in 0..100 {
            ball.update_rotation(SIM_DT);
        }
        assert!((ball.rotation.length() - 1.0).abs() < 1e-4);
        assert_ne!(ball.rotation, Quat::IDENTITY);
    }

    #[test]
    fn test_still_ball_does_not_spin() {
        let mut ball = Ball::new(Vec3::ZERO, 0, 0, 0.25);
        ball.update_rotation(1.0);
        assert_eq!(ball.rotation, Quat::IDENTITY);
    }

    #[test]
    fn test_ball_scale_from_radius() {
        let ball = Ball::new(Vec3::ZERO, 0, 0, 0.5);
        assert_eq!(ball.scale(), 0.5);
        let m = ball.transform();
        assert_eq!(m.transform_point3(Vec3::X), Vec3::new(0.5, 0.0, 0.0));
    }
}
