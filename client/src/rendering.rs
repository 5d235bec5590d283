use crate::game::{GameLoop, LoopState, StopReason};
use macroquad::prelude::*;
use shared::{Ball, Board, Paddle, WorldConfig};

/// Read-only values shown in the debug overlay.
#[derive(Debug, Clone)]
pub struct HudInfo {
    pub frame: u64,
    pub authoritative_frame: Option<u64>,
    pub transport_open: Option<bool>,
    pub fake_ping_ms: u64,
}

pub struct Renderer {
    world: WorldConfig,
}

impl Renderer {
    pub fn new(world: WorldConfig) -> Self {
        Renderer { world }
    }

    fn scale(&self) -> f32 {
        (screen_width() / self.world.width).min(screen_height() / self.world.height)
    }

    pub fn render(&self, game: &GameLoop, now_ms: u64, hud: Option<&HudInfo>) {
        clear_background(Color::from_rgba(26, 26, 26, 255));
        let scale = self.scale();
        let board = game.board();

        self.draw_walls(scale);
        self.draw_center_line(scale);
        for paddle in board.paddles() {
            self.draw_paddle(paddle, scale);
        }
        self.draw_ball(board.ball(), scale);
        self.draw_scores(board, scale);

        match game.state() {
            LoopState::CountingDown => {
                if let Some(seconds) = game.countdown_remaining(now_ms) {
                    self.draw_banner(&seconds.max(1).to_string(), scale);
                }
            }
            LoopState::Stopped => {
                let text = match game.stop_reason() {
                    Some(StopReason::MatchOver { winner }) => format!("{} wins", winner),
                    _ => "Match over".to_string(),
                };
                self.draw_banner(&text, scale);
            }
            LoopState::Created | LoopState::Running => {}
        }

        if let Some(hud) = hud {
            self.draw_hud(hud);
        }
    }

    /// Plain text in place of the game surface.
    pub fn render_message(&self, text: &str) {
        clear_background(BLACK);
        let size = 24.0;
        let dims = measure_text(text, None, size as u16, 1.0);
        draw_text(
            text,
            (screen_width() - dims.width) / 2.0,
            screen_height() / 2.0,
            size,
            WHITE,
        );
    }

    fn draw_walls(&self, scale: f32) {
        let color = Color::from_rgba(68, 68, 68, 255);
        let wall = self.world.wall_thickness * scale;
        let width = self.world.width * scale;
        draw_rectangle(0.0, 0.0, width, wall, color);
        draw_rectangle(0.0, self.world.height * scale - wall, width, wall, color);
    }

    fn draw_center_line(&self, scale: f32) {
        let x = self.world.width / 2.0 * scale;
        let mut y = self.world.wall_thickness * scale;
        let bottom = (self.world.height - self.world.wall_thickness) * scale;
        while y < bottom {
            draw_line(x, y, x, (y + 10.0 * scale).min(bottom), 2.0, GRAY);
            y += 20.0 * scale;
        }
    }

    fn draw_paddle(&self, paddle: &Paddle, scale: f32) {
        draw_rectangle(
            paddle.position.x * scale,
            paddle.position.y * scale,
            paddle.width * scale,
            paddle.height * scale,
            color_for_tag(paddle.color_tag),
        );
    }

    fn draw_ball(&self, ball: &Ball, scale: f32) {
        draw_circle(
            ball.position.x * scale,
            ball.position.y * scale,
            ball.radius * scale,
            WHITE,
        );
    }

    fn draw_scores(&self, board: &Board, scale: f32) {
        let y = (self.world.wall_thickness + 40.0) * scale;
        let (mut left, mut right) = (0, 0);
        for paddle in board.paddles() {
            if paddle.side.is_left() {
                left += board.score_of(&paddle.player_id);
            } else {
                right += board.score_of(&paddle.player_id);
            }
        }

        let size = 40.0 * scale;
        draw_text(&left.to_string(), self.world.width * 0.25 * scale, y, size, WHITE);
        draw_text(&right.to_string(), self.world.width * 0.75 * scale, y, size, WHITE);
    }

    fn draw_banner(&self, text: &str, scale: f32) {
        let size = 64.0 * scale;
        let dims = measure_text(text, None, size as u16, 1.0);
        draw_text(
            text,
            (self.world.width * scale - dims.width) / 2.0,
            self.world.height / 2.0 * scale,
            size,
            YELLOW,
        );
    }

    fn draw_hud(&self, hud: &HudInfo) {
        let lines = [
            format!("frame {}", hud.frame),
            match hud.authoritative_frame {
                Some(frame) => format!("server frame {}", frame),
                None => "server frame -".to_string(),
            },
            match hud.transport_open {
                Some(true) => format!("connected (+{}ms)", hud.fake_ping_ms),
                Some(false) => "disconnected".to_string(),
                None => "offline".to_string(),
            },
        ];
        for (i, line) in lines.iter().enumerate() {
            draw_text(line, 10.0, 30.0 + i as f32 * 14.0, 14.0, GREEN);
        }
    }
}

fn color_for_tag(tag: &str) -> Color {
    match tag {
        "blue" => Color::from_rgba(68, 136, 255, 255),
        "red" => Color::from_rgba(255, 68, 68, 255),
        "green" => GREEN,
        "purple" => PURPLE,
        "orange" => ORANGE,
        "cyan" => Color::from_rgba(0, 255, 255, 255),
        _ => Color::from_rgba(136, 136, 136, 255),
    }
}
