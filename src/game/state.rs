use serde::{Serialize, Deserialize};
use rand::Rng;

use crate::config::game::WIN_SCORE;
use crate::game::types::{Ball, Paddle, Side, FinalScore};
use crate::game::systems::{advance_ball, bounce_off_walls, clamp_paddle_y, deflect_off_paddle, scoring_side, reset_ball};

/// Result of advancing the simulation by one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// Ball still in play, or the game had already ended.
    Continue,
    /// A point was scored by the given side; play goes on.
    Scored(Side),
    /// The given side reached the win score on this tick.
    Ended(Side),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    pub ball: Ball,
    pub player1: Paddle,
    pub player2: Paddle,
    pub game_ended: bool,
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}

impl GameState {
    /// Fresh rally: centred ball and paddles, zero score.
    pub fn new() -> Self {
        GameState {
            ball: Ball::centered(),
            player1: Paddle::for_side(Side::Player1),
            player2: Paddle::for_side(Side::Player2),
            game_ended: false,
        }
    }

    pub fn paddle(&self, side: Side) -> &Paddle {
        match side {
            Side::Player1 => &self.player1,
            Side::Player2 => &self.player2,
        }
    }

    pub fn paddle_mut(&mut self, side: Side) -> &mut Paddle {
        match side {
            Side::Player1 => &mut self.player1,
            Side::Player2 => &mut self.player2,
        }
    }

    /// Write a client-provided paddle position, clamped to the court.
    pub fn set_paddle_y(&mut self, side: Side, y: f32) {
        let paddle = self.paddle_mut(side);
        paddle.y = clamp_paddle_y(y, paddle.height);
    }

    /// Advance the ball by one tick: integrate, bounce off walls and paddles,
    /// then score and reset if it left the court.
    pub fn step<R: Rng + ?Sized>(&mut self, rng: &mut R) -> StepOutcome {
        if self.game_ended {
            return StepOutcome::Continue;
        }

        advance_ball(&mut self.ball);
        bounce_off_walls(&mut self.ball);
        deflect_off_paddle(&mut self.ball, &self.player1, Side::Player1);
        deflect_off_paddle(&mut self.ball, &self.player2, Side::Player2);

        let Some(scorer) = scoring_side(&self.ball) else {
            return StepOutcome::Continue;
        };

        let paddle = self.paddle_mut(scorer);
        paddle.score += 1;
        let reached_win = paddle.score >= WIN_SCORE;
        reset_ball(&mut self.ball, rng);

        if reached_win {
            self.game_ended = true;
            StepOutcome::Ended(scorer)
        } else {
            StepOutcome::Scored(scorer)
        }
    }

    /// Side with the higher score, or None on a tie.
    pub fn winner(&self) -> Option<Side> {
        if self.player1.score > self.player2.score {
            Some(Side::Player1)
        } else if self.player2.score > self.player1.score {
            Some(Side::Player2)
        } else {
            None
        }
    }

    pub fn final_score(&self) -> FinalScore {
        FinalScore {
            player1: self.player1.score,
            player2: self.player2.score,
        }
    }
}
