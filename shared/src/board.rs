//! The board owns every paddle and the ball, and is the one place where
//! authoritative state overwrites the local simulation.

use crate::ball::{Ball, Goal};
use crate::config::GameConfig;
use crate::paddle::Paddle;
use crate::protocol::{FrameId, GameStatePayload, PlayerId, Side};
use log::{debug, info};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum BoardError {
    #[error("a board needs 2 or 4 players, got {0}")]
    PlayerCount(usize),
    #[error("side {0:?} is assigned to more than one player")]
    DuplicateSide(Side),
}

#[derive(Debug, Clone)]
pub struct Board {
    paddles: HashMap<PlayerId, Paddle>,
    /// Stable stepping order, sorted by player id.
    order: Vec<PlayerId>,
    ball: Ball,
    scores: HashMap<PlayerId, u32>,
    local_scoring: bool,
    score_limit: u32,
    authoritative_frame: Option<FrameId>,
    state_label: Option<String>,
}

impl Board {
    pub fn new(
        player_sides: &HashMap<PlayerId, Side>,
        config: &GameConfig,
        seed: u64,
    ) -> Result<Self, BoardError> {
        if player_sides.len() != 2 && player_sides.len() != 4 {
            return Err(BoardError::PlayerCount(player_sides.len()));
        }

        let mut order: Vec<PlayerId> = player_sides.keys().cloned().collect();
        order.sort();

        let mut paddles = HashMap::new();
        let mut taken = Vec::new();
        for id in &order {
            let side = player_sides[id];
            if taken.contains(&side) {
                return Err(BoardError::DuplicateSide(side));
            }
            taken.push(side);
            paddles.insert(id.clone(), Paddle::new(id.clone(), side, config));
        }

        let scores = order.iter().map(|id| (id.clone(), 0)).collect();

        Ok(Self {
            paddles,
            order,
            ball: Ball::new(config, seed),
            scores,
            local_scoring: false,
            score_limit: config.score_limit,
            authoritative_frame: None,
            state_label: None,
        })
    }

    /// Enables goal detection and scoring on this side, for matches without a server.
    pub fn with_local_scoring(mut self, enabled: bool) -> Self {
        self.local_scoring = enabled;
        self
    }

    /// Steps paddles, then the ball, then ball-paddle collisions. With local
    /// scoring enabled, returns the goal scored this step.
    pub fn update(&mut self, dt: f32) -> Option<Goal> {
        for id in &self.order {
            if let Some(paddle) = self.paddles.get_mut(id) {
                paddle.update(dt);
            }
        }

        self.ball.update(dt);

        for id in &self.order {
            if let Some(paddle) = self.paddles.get(id) {
                self.ball.check_paddle_collision(paddle);
            }
        }

        if !self.local_scoring {
            return None;
        }

        let goal = self.ball.check_goal()?;
        // A ball leaving through the left edge scores for the right side.
        let scoring_left = goal == Goal::Right;
        for paddle in self.paddles.values() {
            if paddle.side.is_left() == scoring_left {
                *self.scores.entry(paddle.player_id.clone()).or_insert(0) += 1;
            }
        }
        info!("Goal on the {:?} edge, scores: {:?}", goal, self.scores);
        self.ball.reset();
        Some(goal)
    }

    /// Overwrites local state with an authoritative snapshot. No smoothing.
    pub fn apply_update(&mut self, server_state: &GameStatePayload) {
        self.ball.overwrite(&server_state.ball);

        for snapshot in &server_state.paddles {
            match self.paddles.get_mut(&snapshot.player_id) {
                Some(paddle) => paddle.overwrite(snapshot),
                None => debug!("Ignoring update for unknown player {}", snapshot.player_id),
            }
        }

        if let Some(scores) = &server_state.scores {
            for entry in scores {
                if self.paddles.contains_key(&entry.player_id) {
                    self.scores.insert(entry.player_id.clone(), entry.score);
                }
            }
        }
        if server_state.state.is_some() {
            self.state_label = server_state.state.clone();
        }
        self.authoritative_frame = Some(server_state.frame_id);
    }

    pub fn get_paddle_by_player_id(&self, id: &str) -> Option<&Paddle> {
        self.paddles.get(id)
    }

    pub fn get_paddle_by_player_id_mut(&mut self, id: &str) -> Option<&mut Paddle> {
        self.paddles.get_mut(id)
    }

    pub fn paddles(&self) -> impl Iterator<Item = &Paddle> {
        self.order.iter().filter_map(|id| self.paddles.get(id))
    }

    pub fn player_ids(&self) -> &[PlayerId] {
        &self.order
    }

    pub fn ball(&self) -> &Ball {
        &self.ball
    }

    pub fn ball_mut(&mut self) -> &mut Ball {
        &mut self.ball
    }

    pub fn score_of(&self, id: &str) -> u32 {
        self.scores.get(id).copied().unwrap_or(0)
    }

    /// First player, in stepping order, at or above the score limit.
    pub fn winner(&self) -> Option<&PlayerId> {
        if self.score_limit == 0 {
            return None;
        }
        self.order
            .iter()
            .find(|id| self.score_of(id) >= self.score_limit)
    }

    pub fn authoritative_frame(&self) -> Option<FrameId> {
        self.authoritative_frame
    }

    pub fn state_label(&self) -> Option<&str> {
        self.state_label.as_deref()
    }

    /// Drops every buffered snapshot so nothing outlives the match.
    pub fn clear_inputs(&mut self) {
        for paddle in self.paddles.values_mut() {
            paddle.input.clear();
        }
    }
}
