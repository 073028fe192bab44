//! Movement system.
//!
//! This module handles integrating the ball, bouncing it off the top and
//! bottom walls, and keeping paddles inside the court.

use crate::config::game::COURT_HEIGHT;
use crate::game::types::Ball;

/// Move the ball by one tick of its velocity.
pub fn advance_ball(ball: &mut Ball) {
    ball.x += ball.dx;
    ball.y += ball.dy;
}

/// Reflect the vertical velocity when the ball touches the top or bottom wall.
/// The ball is pushed back inside so it cannot stick to the wall.
pub fn bounce_off_walls(ball: &mut Ball) {
    if ball.y - ball.radius <= 0.0 {
        ball.y = ball.radius;
        ball.dy = ball.dy.abs();
    } else if ball.y + ball.radius >= COURT_HEIGHT {
        ball.y = COURT_HEIGHT - ball.radius;
        ball.dy = -ball.dy.abs();
    }
}

/// Clamp a paddle top coordinate to `[0, COURT_HEIGHT - height]`.
pub fn clamp_paddle_y(y: f32, height: f32) -> f32 {
    y.clamp(0.0, (COURT_HEIGHT - height).max(0.0))
}

/// Step `current` toward `target` by at most `max_step`, never overshooting.
pub fn approach(current: f32, target: f32, max_step: f32) -> f32 {
    let delta = target - current;
    if delta.abs() <= max_step {
        target
    } else {
        current + max_step.copysign(delta)
    }
}
