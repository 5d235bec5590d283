use crate::config::{GameConfig, PaddleConfig, WorldConfig};
use crate::input_buffer::{InputBuffer, KeyState};
use crate::protocol::{PaddleSnapshot, PlayerId, Side};
use crate::vector::Vec2;

/// One-dimensional physics body moving along the vertical axis.
///
/// `position` is the top-left corner of the paddle rectangle.
#[derive(Debug, Clone)]
pub struct Paddle {
    pub player_id: PlayerId,
    pub side: Side,
    pub position: Vec2,
    pub velocity_y: f32,
    pub width: f32,
    pub height: f32,
    pub color_tag: &'static str,
    pub input: InputBuffer,
    hold: KeyState,
    config: PaddleConfig,
    world: WorldConfig,
}

impl Paddle {
    pub fn new(player_id: PlayerId, side: Side, config: &GameConfig) -> Self {
        let paddle = &config.paddle;
        let world = &config.world;

        let x = if side.is_left() {
            paddle.margin
        } else {
            world.width - paddle.margin - paddle.width
        };
        let center_y = match side {
            Side::Left | Side::Right => world.height / 2.0,
            Side::TopLeft | Side::TopRight => world.height / 4.0,
            Side::BottomLeft | Side::BottomRight => world.height * 3.0 / 4.0,
        };

        Self {
            player_id,
            side,
            position: Vec2::new(x, center_y - paddle.height / 2.0),
            velocity_y: 0.0,
            width: paddle.width,
            height: paddle.height,
            color_tag: side.color_tag(),
            input: InputBuffer::new(config.timing.lookback_horizon),
            hold: KeyState::NEUTRAL,
            config: *paddle,
            world: *world,
        }
    }

    /// Takes hold flags straight from an exact remote snapshot.
    pub fn apply_inputs(&mut self, snapshot: KeyState) {
        self.hold = snapshot;
    }

    pub fn set_hold_state(&mut self, up: bool, down: bool) {
        self.hold = KeyState::new(up, down);
    }

    pub fn hold_state(&self) -> KeyState {
        self.hold
    }

    pub fn update(&mut self, dt: f32) {
        let direction = match (self.hold.up, self.hold.down) {
            (true, false) => -1.0,
            (false, true) => 1.0,
            // Both held behaves like neither.
            _ => 0.0,
        };

        if direction != 0.0 {
            self.velocity_y += direction * self.config.acceleration * dt;
        } else {
            self.velocity_y *= self.config.friction.powf(dt * 60.0);
        }
        self.velocity_y = self
            .velocity_y
            .clamp(-self.config.max_speed, self.config.max_speed);

        self.position.y += self.velocity_y * dt;

        let min_y = self.world.wall_thickness;
        let max_y = self.world.height - self.world.wall_thickness - self.height;
        if self.position.y < min_y {
            self.position.y = min_y;
            self.velocity_y = 0.0;
        } else if self.position.y > max_y {
            self.position.y = max_y;
            self.velocity_y = 0.0;
        }
    }

    /// Replaces geometry with the authoritative one; motion and held keys start over.
    pub fn overwrite(&mut self, snapshot: &PaddleSnapshot) {
        self.hold = KeyState::NEUTRAL;
        self.velocity_y = 0.0;
        self.position = snapshot.position;
        self.width = snapshot.width;
        self.height = snapshot.height;
    }

    pub fn get_bounds(&self) -> (f32, f32, f32, f32) {
        (
            self.position.x,
            self.position.y,
            self.position.x + self.width,
            self.position.y + self.height,
        )
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(
            self.position.x + self.width / 2.0,
            self.position.y + self.height / 2.0,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    const DT: f32 = 1.0 / 60.0;

    fn paddle(side: Side) -> Paddle {
        Paddle::new("p1".to_string(), side, &GameConfig::new())
    }

    #[test]
    fn test_initial_positions_by_side() {
        let config = GameConfig::new();
        let left = paddle(Side::Left);
        let right = paddle(Side::Right);
        let top_left = paddle(Side::TopLeft);
        let bottom_right = paddle(Side::BottomRight);

        assert_eq!(left.position.x, config.paddle.margin);
        assert_eq!(
            right.position.x,
            config.world.width - config.paddle.margin - config.paddle.width
        );
        assert_eq!(left.center().y, config.world.height / 2.0);
        assert_eq!(top_left.center().y, config.world.height / 4.0);
        assert_eq!(bottom_right.center().y, config.world.height * 0.75);
        assert_eq!(left.color_tag, "blue");
        assert_eq!(right.color_tag, "red");
    }

    #[test]
    fn test_up_accelerates_toward_top() {
        let mut paddle = paddle(Side::Left);
        let start_y = paddle.position.y;
        paddle.set_hold_state(true, false);
        paddle.update(DT);

        assert_approx_eq!(paddle.velocity_y, -3000.0 * DT, 1e-3);
        assert!(paddle.position.y < start_y);
    }

    #[test]
    fn test_both_directions_behave_like_neither() {
        let mut both = paddle(Side::Left);
        let mut neither = paddle(Side::Left);
        both.velocity_y = 200.0;
        neither.velocity_y = 200.0;

        both.set_hold_state(true, true);
        neither.set_hold_state(false, false);
        both.update(DT);
        neither.update(DT);

        assert_eq!(both.velocity_y, neither.velocity_y);
        assert_eq!(both.position, neither.position);
        assert_approx_eq!(both.velocity_y, 200.0 * 0.8, 1e-3);
    }

    #[test]
    fn test_friction_is_frame_rate_independent() {
        let mut one_step = paddle(Side::Left);
        let mut two_steps = paddle(Side::Left);
        one_step.velocity_y = 100.0;
        two_steps.velocity_y = 100.0;

        one_step.update(2.0 * DT);
        two_steps.update(DT);
        two_steps.update(DT);

        assert_approx_eq!(one_step.velocity_y, two_steps.velocity_y, 1e-3);
    }

    #[test]
    fn test_velocity_is_capped() {
        let mut paddle = paddle(Side::Left);
        paddle.set_hold_state(false, true);
        for _ in 0..30 {
            paddle.update(DT);
            assert!(paddle.velocity_y.abs() <= 450.0);
        }
    }

    #[test]
    fn test_clamps_to_wall_and_stops() {
        let config = GameConfig::new();
        let mut paddle = paddle(Side::Left);
        paddle.set_hold_state(true, false);
        for _ in 0..300 {
            paddle.update(DT);
        }

        assert_eq!(paddle.position.y, config.world.wall_thickness);
        assert_eq!(paddle.velocity_y, 0.0);

        paddle.set_hold_state(false, true);
        for _ in 0..300 {
            paddle.update(DT);
        }
        assert_eq!(
            paddle.position.y,
            config.world.height - config.world.wall_thickness - config.paddle.height
        );
    }

    #[test]
    fn test_overwrite_resets_motion_and_hold() {
        let mut paddle = paddle(Side::Right);
        paddle.set_hold_state(true, false);
        paddle.velocity_y = -120.0;

        paddle.overwrite(&PaddleSnapshot {
            player_id: "p1".to_string(),
            position: Vec2::new(770.0, 100.0),
            width: 12.0,
            height: 60.0,
        });

        assert_eq!(paddle.position, Vec2::new(770.0, 100.0));
        assert_eq!(paddle.get_bounds(), (770.0, 100.0, 782.0, 160.0));
        assert_eq!(paddle.velocity_y, 0.0);
        assert_eq!(paddle.hold_state(), KeyState::NEUTRAL);
    }
}
