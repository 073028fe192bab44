/// Game configuration constants.
/// 
/// This module defines the court geometry, paddle and ball dimensions,
/// ball speed and the score needed to win a match.
pub const COURT_WIDTH: f32 = 800.0;

/// Height of the court, shared by the wall bounce and paddle clamp.
pub const COURT_HEIGHT: f32 = 400.0;

pub const PADDLE_WIDTH: f32 = 10.0;

pub const PADDLE_HEIGHT: f32 = 100.0;

/// Gap between a side wall and the paddle in front of it.
pub const PADDLE_MARGIN: f32 = 10.0;

pub const BALL_RADIUS: f32 = 10.0;

/// Horizontal ball speed, in court units per tick.
pub const BALL_SPEED_X: f32 = 5.0;

/// Vertical ball speed, in court units per tick.
pub const BALL_SPEED_Y: f32 = 3.0;

/// Score that ends the match.
pub const WIN_SCORE: u32 = 5;
