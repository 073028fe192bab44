//! AI opponent.
//!
//! The controller works on two cadences: `refresh_target` runs on its own
//! timer (the difficulty's refresh rate) and re-reads the ball, while `drive`
//! runs every physics tick and slides the paddle toward the last target.

use rand::Rng;

use crate::config::ai::RELAX_FACTOR;
use crate::config::game::COURT_HEIGHT;
use crate::game::state::GameState;
use crate::game::systems::{approach, clamp_paddle_y};
use crate::game::types::{AiProfile, Difficulty, Side};

#[derive(Debug, Clone, PartialEq)]
pub struct AiController {
    /// Side whose paddle the AI moves.
    pub side: Side,
    pub difficulty: Difficulty,
    /// Vertical coordinate the paddle centre is heading for.
    pub target_y: f32,
}

impl AiController {
    pub fn new(side: Side, difficulty: Difficulty) -> Self {
        Self {
            side,
            difficulty,
            target_y: COURT_HEIGHT / 2.0,
        }
    }

    pub fn profile(&self) -> AiProfile {
        self.difficulty.profile()
    }

    /// Re-aim at the predicted intercept when the ball is incoming, otherwise
    /// drift back toward the middle of the court.
    pub fn refresh_target<R: Rng + ?Sized>(&mut self, state: &GameState, rng: &mut R) {
        match predict_intercept(state, self.side) {
            Some(predicted) => {
                let error = self.profile().error_range;
                let noise = if error > 0.0 { rng.random_range(-error..=error) } else { 0.0 };
                self.target_y = predicted + noise;
            }
            None => {
                let center = COURT_HEIGHT / 2.0;
                self.target_y += (center - self.target_y) * RELAX_FACTOR;
            }
        }
    }

    /// Move the AI paddle toward the target by at most the profile speed.
    pub fn drive(&self, state: &mut GameState) {
        let speed = self.profile().paddle_speed;
        let paddle = state.paddle_mut(self.side);
        let half = paddle.height / 2.0;
        let center = approach(paddle.center_y(), self.target_y, speed);
        paddle.y = clamp_paddle_y(center - half, paddle.height);
    }
}

/// Vertical position of the ball when it reaches `side`'s paddle face, by
/// straight-line extrapolation clamped to the court. None when the ball is
/// not moving toward that side.
pub fn predict_intercept(state: &GameState, side: Side) -> Option<f32> {
    let ball = &state.ball;
    let paddle = state.paddle(side);
    let plane_x = match side {
        Side::Player1 if ball.dx < 0.0 => paddle.x + paddle.width + ball.radius,
        Side::Player2 if ball.dx > 0.0 => paddle.x - ball.radius,
        _ => return None,
    };
    let ticks = ((plane_x - ball.x) / ball.dx).max(0.0);
    Some((ball.y + ball.dy * ticks).clamp(0.0, COURT_HEIGHT))
}
