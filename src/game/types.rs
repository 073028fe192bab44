use serde::{Serialize, Deserialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::config::ai::*;
use crate::config::game::{COURT_HEIGHT, COURT_WIDTH, BALL_RADIUS, BALL_SPEED_X, BALL_SPEED_Y, PADDLE_WIDTH, PADDLE_HEIGHT, PADDLE_MARGIN};

/// One of the two seats of a room. Player1 defends the left wall.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Player1,
    Player2,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::Player1, Side::Player2];

    pub fn index(self) -> usize {
        match self {
            Side::Player1 => 0,
            Side::Player2 => 1,
        }
    }

    pub fn opponent(self) -> Side {
        match self {
            Side::Player1 => Side::Player2,
            Side::Player2 => Side::Player1,
        }
    }

    pub fn is_player1(self) -> bool {
        self == Side::Player1
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Player1 => write!(f, "Player 1"),
            Side::Player2 => write!(f, "Player 2"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

/// Returned when a difficulty string is not one of easy, medium or hard.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown difficulty level '{0}'")]
pub struct InvalidDifficulty(pub String);

impl FromStr for Difficulty {
    type Err = InvalidDifficulty;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(InvalidDifficulty(other.to_string())),
        }
    }
}

/// Tuning of the AI opponent for one difficulty level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AiProfile {
    pub paddle_speed: f32,
    pub error_range: f32,
    pub refresh_rate: Duration,
}

impl Difficulty {
    pub fn profile(self) -> AiProfile {
        match self {
            Difficulty::Easy => AiProfile {
                paddle_speed: EASY_PADDLE_SPEED,
                error_range: EASY_ERROR_RANGE,
                refresh_rate: Duration::from_millis(EASY_REFRESH_MS),
            },
            Difficulty::Medium => AiProfile {
                paddle_speed: MEDIUM_PADDLE_SPEED,
                error_range: MEDIUM_ERROR_RANGE,
                refresh_rate: Duration::from_millis(MEDIUM_REFRESH_MS),
            },
            Difficulty::Hard => AiProfile {
                paddle_speed: HARD_PADDLE_SPEED,
                error_range: HARD_ERROR_RANGE,
                refresh_rate: Duration::from_millis(HARD_REFRESH_MS),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ball {
    pub x: f32,
    pub y: f32,
    pub dx: f32,
    pub dy: f32,
    pub radius: f32,
}

impl Ball {
    /// A ball resting at the centre of the court, heading right and down.
    pub fn centered() -> Self {
        Self {
            x: COURT_WIDTH / 2.0,
            y: COURT_HEIGHT / 2.0,
            dx: BALL_SPEED_X,
            dy: BALL_SPEED_Y,
            radius: BALL_RADIUS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paddle {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub score: u32,
}

impl Paddle {
    /// Paddle at its starting spot, vertically centred in front of its wall.
    pub fn for_side(side: Side) -> Self {
        let x = match side {
            Side::Player1 => PADDLE_MARGIN,
            Side::Player2 => COURT_WIDTH - PADDLE_MARGIN - PADDLE_WIDTH,
        };
        Self {
            x,
            y: (COURT_HEIGHT - PADDLE_HEIGHT) / 2.0,
            width: PADDLE_WIDTH,
            height: PADDLE_HEIGHT,
            score: 0,
        }
    }

    pub fn center_y(&self) -> f32 {
        self.y + self.height / 2.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalScore {
    pub player1: u32,
    pub player2: u32,
}
