use rand::Rng;

use crate::config::game::{COURT_WIDTH, BALL_SPEED_X, BALL_SPEED_Y};
use crate::game::types::{Ball, Side};

/// Side credited with a point if the ball has left the court, if any.
pub fn scoring_side(ball: &Ball) -> Option<Side> {
    if ball.x < 0.0 {
        Some(Side::Player2)
    } else if ball.x > COURT_WIDTH {
        Some(Side::Player1)
    } else {
        None
    }
}

/// Put the ball back at the centre, heading the opposite horizontal way,
/// with a random vertical direction.
pub fn reset_ball<R: Rng + ?Sized>(ball: &mut Ball, rng: &mut R) {
    let heading = if ball.dx > 0.0 { -1.0 } else { 1.0 };
    let vertical = if rng.random_bool(0.5) { 1.0 } else { -1.0 };
    let radius = ball.radius;
    *ball = Ball::centered();
    ball.radius = radius;
    ball.dx = BALL_SPEED_X * heading;
    ball.dy = BALL_SPEED_Y * vertical;
}
