//! Ball/paddle collision.
//!
//! Contact is a circle versus axis-aligned rectangle overlap, so a ball
//! moving several units per tick still registers against the paddle face.

use crate::game::types::{Ball, Paddle, Side};

/// True when the ball circle overlaps the paddle rectangle.
pub fn ball_hits_paddle(ball: &Ball, paddle: &Paddle) -> bool {
    let nearest_x = ball.x.clamp(paddle.x, paddle.x + paddle.width);
    let nearest_y = ball.y.clamp(paddle.y, paddle.y + paddle.height);
    let dx = ball.x - nearest_x;
    let dy = ball.y - nearest_y;
    dx * dx + dy * dy <= ball.radius * ball.radius
}

/// Send the ball back toward the opponent if it is moving into `side`'s paddle
/// and touching its face. A ball whose centre is already level with or past
/// the face has been missed. Returns true on a hit.
pub fn deflect_off_paddle(ball: &mut Ball, paddle: &Paddle, side: Side) -> bool {
    let (moving_in, in_front) = match side {
        Side::Player1 => (ball.dx < 0.0, ball.x >= paddle.x + paddle.width),
        Side::Player2 => (ball.dx > 0.0, ball.x <= paddle.x),
    };
    if !moving_in || !in_front || !ball_hits_paddle(ball, paddle) {
        return false;
    }
    match side {
        Side::Player1 => {
            ball.dx = ball.dx.abs();
            ball.x = ball.x.max(paddle.x + paddle.width + ball.radius);
        }
        Side::Player2 => {
            ball.dx = -ball.dx.abs();
            ball.x = ball.x.min(paddle.x - ball.radius);
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn left_paddle() -> Paddle {
        Paddle { x: 10.0, y: 150.0, width: 10.0, height: 100.0, score: 0 }
    }

    #[test]
    fn test_overlap_without_exact_coordinate() {
        // Centre at x=27 never equals the paddle face (20) but the circle overlaps it.
        let ball = Ball { x: 27.0, y: 200.0, dx: -5.0, dy: 0.0, radius: 10.0 };
        assert!(ball_hits_paddle(&ball, &left_paddle()));
    }

    #[test]
    fn test_miss_above_paddle() {
        let ball = Ball { x: 25.0, y: 120.0, dx: -5.0, dy: 0.0, radius: 10.0 };
        assert!(!ball_hits_paddle(&ball, &left_paddle()));
    }

    #[test]
    fn test_corner_contact() {
        let paddle = left_paddle();
        // 6 right and 6 above the top-right corner: distance ~8.5 < radius.
        let ball = Ball { x: 26.0, y: 144.0, dx: -5.0, dy: 2.0, radius: 10.0 };
        assert!(ball_hits_paddle(&ball, &paddle));
    }

    #[test]
    fn test_deflect_reverses_and_pushes_out() {
        let paddle = left_paddle();
        let mut ball = Ball { x: 24.0, y: 200.0, dx: -5.0, dy: 3.0, radius: 10.0 };
        assert!(deflect_off_paddle(&mut ball, &paddle, Side::Player1));
        assert_eq!(ball.dx, 5.0);
        assert_eq!(ball.x, 30.0);
    }

    #[test]
    fn test_missed_ball_below_paddle_is_not_saved() {
        let paddle = left_paddle();
        // Slipped under the paddle (150..250) and now level with its body.
        let mut ball = Ball { x: 15.0, y: 260.0, dx: -5.0, dy: -3.0, radius: 10.0 };
        assert!(ball_hits_paddle(&ball, &paddle));
        assert!(!deflect_off_paddle(&mut ball, &paddle, Side::Player1));
        assert_eq!(ball.dx, -5.0);
        assert_eq!(ball.x, 15.0);
    }

    #[test]
    fn test_right_paddle_only_deflects_from_its_face() {
        let paddle = Paddle { x: 780.0, y: 150.0, width: 10.0, height: 100.0, score: 0 };
        let mut ball = Ball { x: 785.0, y: 255.0, dx: 5.0, dy: 3.0, radius: 10.0 };
        assert!(!deflect_off_paddle(&mut ball, &paddle, Side::Player2));

        let mut ball = Ball { x: 774.0, y: 200.0, dx: 5.0, dy: 3.0, radius: 10.0 };
        assert!(deflect_off_paddle(&mut ball, &paddle, Side::Player2));
        assert_eq!(ball.dx, -5.0);
        assert_eq!(ball.x, 770.0);
    }

    #[test]
    fn test_no_deflect_when_moving_away() {
        let paddle = left_paddle();
        let mut ball = Ball { x: 24.0, y: 200.0, dx: 5.0, dy: 3.0, radius: 10.0 };
        assert!(!deflect_off_paddle(&mut ball, &paddle, Side::Player1));
        assert_eq!(ball.dx, 5.0);
    }
}
