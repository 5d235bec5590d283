use crate::config::{BallConfig, GameConfig, WorldConfig};
use crate::paddle::Paddle;
use crate::protocol::BallSnapshot;
use crate::vector::Vec2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Field edge the ball crossed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Goal {
    Left,
    Right,
}

/// Two-dimensional physics body bouncing between the walls and paddles.
///
/// Collision against paddles is a discrete overlap test once per tick. A ball
/// moving further than a paddle's width in one tick can pass through it.
#[derive(Debug, Clone)]
pub struct Ball {
    pub position: Vec2,
    pub velocity: Vec2,
    pub radius: f32,
    config: BallConfig,
    world: WorldConfig,
    rng: StdRng,
}

impl Ball {
    pub fn new(config: &GameConfig, seed: u64) -> Self {
        let mut ball = Self {
            position: Vec2::ZERO,
            velocity: Vec2::ZERO,
            radius: config.ball.radius,
            config: config.ball,
            world: config.world,
            rng: StdRng::seed_from_u64(seed),
        };
        ball.reset();
        ball
    }

    /// Serves from the center of the field toward a random side at a random angle.
    pub fn reset(&mut self) {
        self.position = Vec2::new(self.world.width / 2.0, self.world.height / 2.0);

        let direction = if self.rng.gen_bool(0.5) { 1.0 } else { -1.0 };
        let max_angle = self.config.max_serve_angle.abs();
        let angle = if max_angle > 0.0 {
            self.rng.gen_range(-max_angle..=max_angle)
        } else {
            0.0
        };

        self.velocity = Vec2::new(
            direction * self.config.initial_speed * angle.cos(),
            self.config.initial_speed * angle.sin(),
        );
    }

    pub fn update(&mut self, dt: f32) {
        self.position = self.position.add(&self.velocity.scale(dt));

        let top = self.world.wall_thickness + self.radius;
        let bottom = self.world.height - self.world.wall_thickness - self.radius;
        if self.position.y < top {
            self.position.y = top;
            self.velocity.y = self.velocity.y.abs();
        } else if self.position.y > bottom {
            self.position.y = bottom;
            self.velocity.y = -self.velocity.y.abs();
        }
    }

    /// Bounces off `paddle` if the two overlap. Returns whether a hit happened.
    ///
    /// The horizontal velocity is not simply negated: it is pointed away from
    /// the paddle's center. A ball touching a paddle from behind therefore keeps
    /// travelling away from the field instead of being turned back into it.
    pub fn check_paddle_collision(&mut self, paddle: &Paddle) -> bool {
        let (left, top, right, bottom) = paddle.get_bounds();
        let overlaps = self.position.x + self.radius > left
            && self.position.x - self.radius < right
            && self.position.y + self.radius > top
            && self.position.y - self.radius < bottom;
        if !overlaps {
            return false;
        }

        let center = paddle.center();
        // An overlap lasting several ticks must not flip the ball back and forth.
        self.velocity.x = if self.position.x < center.x {
            -self.velocity.x.abs()
        } else {
            self.velocity.x.abs()
        };

        let offset = ((self.position.y - center.y) / (paddle.height / 2.0)).clamp(-1.0, 1.0);
        self.velocity.y += offset * self.config.max_spin;
        self.velocity = self.velocity.clamp_magnitude(self.config.max_speed);

        true
    }

    pub fn check_goal(&self) -> Option<Goal> {
        if self.position.x - self.radius < 0.0 {
            Some(Goal::Left)
        } else if self.position.x + self.radius > self.world.width {
            Some(Goal::Right)
        } else {
            None
        }
    }

    pub fn overwrite(&mut self, snapshot: &BallSnapshot) {
        self.position = snapshot.position;
        self.velocity = snapshot.velocity;
        self.radius = snapshot.radius;
    }

    pub fn speed(&self) -> f32 {
        self.velocity.magnitude()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::Side;
    use assert_approx_eq::assert_approx_eq;

    const DT: f32 = 1.0 / 60.0;

    fn ball() -> Ball {
        Ball::new(&GameConfig::new(), 7)
    }

    fn left_paddle() -> Paddle {
        Paddle::new("left".to_string(), Side::Left, &GameConfig::new())
    }

    #[test]
    fn test_reset_serves_from_center_at_initial_speed() {
        let config = GameConfig::new();
        let mut ball = ball();
        for _ in 0..50 {
            ball.position = Vec2::new(1.0, 1.0);
            ball.reset();
            assert_eq!(ball.position, Vec2::new(400.0, 300.0));
            assert_approx_eq!(ball.speed(), config.ball.initial_speed, 1e-2);
            let angle = (ball.velocity.y / ball.velocity.x.abs()).atan();
            assert!(angle.abs() <= config.ball.max_serve_angle + 1e-4);
        }
    }

    #[test]
    fn test_reset_serves_both_directions() {
        let mut ball = ball();
        let mut left = 0;
        let mut right = 0;
        for _ in 0..100 {
            ball.reset();
            if ball.velocity.x < 0.0 {
                left += 1;
            } else {
                right += 1;
            }
        }
        assert!(left > 0 && right > 0);
    }

    #[test]
    fn test_top_wall_reflection() {
        let config = GameConfig::new();
        let mut ball = ball();
        ball.position = Vec2::new(400.0, config.world.wall_thickness - 1.0);
        ball.velocity = Vec2::new(0.0, -50.0);

        ball.update(DT);

        assert_eq!(ball.position.y, config.world.wall_thickness + config.ball.radius);
        assert!(ball.velocity.y >= 0.0);
        assert_eq!(ball.velocity.y, 50.0);
    }

    #[test]
    fn test_bottom_wall_reflection() {
        let config = GameConfig::new();
        let mut ball = ball();
        ball.position = Vec2::new(400.0, config.world.height - 2.0);
        ball.velocity = Vec2::new(10.0, 80.0);

        ball.update(DT);

        assert_eq!(
            ball.position.y,
            config.world.height - config.world.wall_thickness - config.ball.radius
        );
        assert_eq!(ball.velocity.y, -80.0);
        assert_eq!(ball.velocity.x, 10.0);
    }

    #[test]
    fn test_center_hit_adds_no_spin() {
        let paddle = left_paddle();
        let mut ball = ball();
        ball.position = Vec2::new(paddle.position.x + paddle.width + 2.0, paddle.center().y);
        ball.velocity = Vec2::new(-300.0, 40.0);

        assert!(ball.check_paddle_collision(&paddle));
        assert_eq!(ball.velocity, Vec2::new(300.0, 40.0));
    }

    #[test]
    fn test_edge_hits_add_spin_toward_edge() {
        let config = GameConfig::new();
        let paddle = left_paddle();
        let x = paddle.position.x + paddle.width + 2.0;

        let mut top_hit = ball();
        top_hit.position = Vec2::new(x, paddle.position.y);
        top_hit.velocity = Vec2::new(-300.0, 0.0);
        assert!(top_hit.check_paddle_collision(&paddle));
        assert_approx_eq!(top_hit.velocity.y, -config.ball.max_spin, 1e-3);
        assert!(top_hit.velocity.x > 0.0);

        let mut bottom_hit = ball();
        bottom_hit.position = Vec2::new(x, paddle.position.y + paddle.height);
        bottom_hit.velocity = Vec2::new(-300.0, 0.0);
        assert!(bottom_hit.check_paddle_collision(&paddle));
        assert_approx_eq!(bottom_hit.velocity.y, config.ball.max_spin, 1e-3);
    }

    #[test]
    fn test_collision_caps_speed() {
        let config = GameConfig::new();
        let paddle = left_paddle();
        let mut ball = ball();
        ball.position = Vec2::new(paddle.position.x + paddle.width, paddle.position.y);
        ball.velocity = Vec2::new(-690.0, -100.0);

        assert!(ball.check_paddle_collision(&paddle));
        assert!(ball.speed() <= config.ball.max_speed + 1e-3);
        assert!(ball.velocity.x > 0.0 && ball.velocity.y < 0.0);
    }

    #[test]
    fn test_hit_from_behind_keeps_heading_away() {
        let paddle = left_paddle();
        let mut ball = ball();
        ball.position = Vec2::new(paddle.position.x - 2.0, paddle.center().y);
        ball.velocity = Vec2::new(-200.0, 0.0);

        assert!(ball.check_paddle_collision(&paddle));
        assert_eq!(ball.velocity, Vec2::new(-200.0, 0.0));

        // Still overlapping on the next tick: no second flip.
        assert!(ball.check_paddle_collision(&paddle));
        assert_eq!(ball.velocity.x, -200.0);
    }

    #[test]
    fn test_miss_leaves_ball_untouched() {
        let paddle = left_paddle();
        let mut ball = ball();
        ball.position = Vec2::new(400.0, 300.0);
        ball.velocity = Vec2::new(-300.0, 0.0);

        assert!(!ball.check_paddle_collision(&paddle));
        assert_eq!(ball.velocity, Vec2::new(-300.0, 0.0));
    }

    #[test]
    fn test_goal_is_a_pure_query() {
        let mut ball = ball();
        ball.position = Vec2::new(-1.0, 300.0);

        for _ in 0..5 {
            assert_eq!(ball.check_goal(), Some(Goal::Left));
        }

        ball.position = Vec2::new(801.0, 300.0);
        assert_eq!(ball.check_goal(), Some(Goal::Right));

        ball.position = Vec2::new(400.0, 300.0);
        assert_eq!(ball.check_goal(), None);
    }
}
