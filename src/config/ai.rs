/// AI opponent configuration constants.
///
/// Each difficulty maps to a paddle speed (units per tick), an error range
/// (max random offset on the predicted intercept, in units) and a refresh
/// period (how often the AI re-reads the ball, in milliseconds).
pub const EASY_PADDLE_SPEED: f32 = 3.0;
pub const EASY_ERROR_RANGE: f32 = 60.0;
pub const EASY_REFRESH_MS: u64 = 1000;

pub const MEDIUM_PADDLE_SPEED: f32 = 5.0;
pub const MEDIUM_ERROR_RANGE: f32 = 30.0;
pub const MEDIUM_REFRESH_MS: u64 = 500;

pub const HARD_PADDLE_SPEED: f32 = 8.0;
pub const HARD_ERROR_RANGE: f32 = 5.0;
pub const HARD_REFRESH_MS: u64 = 200;

/// Fraction of the distance to the court centre covered per refresh while
/// the ball travels away from the AI.
pub const RELAX_FACTOR: f32 = 0.5;
