//! Game-state controller
//!
//! Gates the simulation by phase and coordinates the pause around the async
//! anomaly request:
//!
//! ```text
//! Loading -> Playing -> Anomaly -> Playing
//!                   \-> GameOver -(restart)-> Playing
//! ```

use glam::Vec2;
use rand::RngCore;
use thiserror::Error;

use crate::anomaly::{AnomalyEffect, AnomalyEvent, AnomalyOption, AnomalyRequest};
use crate::settings::Settings;
use crate::sim::{GameEvent, GamePhase, GameState, PlayerStats, TickInput, tick};

#[derive(Debug, Error, PartialEq)]
pub enum GameError {
    #[error("no anomaly choice is pending")]
    NoPendingChoice,
    #[error("option {index} out of range ({count} options)")]
    InvalidOption { index: usize, count: usize },
    #[error("restart is only available after game over (phase {0:?})")]
    RestartUnavailable(GamePhase),
}

/// Progress of the current anomaly
#[derive(Debug, Clone, PartialEq)]
pub enum AnomalyStage {
    Idle,
    /// Request issued, waiting for the oracle
    Awaiting { request: AnomalyRequest, issued_at_ms: f64 },
    /// Event received, waiting for the player's pick
    Choosing(AnomalyEvent),
}

/// Top-level game controller
#[derive(Debug)]
pub struct Game {
    state: GameState,
    settings: Settings,
    loading_started_ms: Option<f64>,
    anomaly: AnomalyStage,
    next_request_id: u64,
    /// Events accumulated since the last drain
    events: Vec<GameEvent>,
}

impl Game {
    pub fn new(seed: u64, bounds: Vec2, settings: Settings) -> Self {
        let mut state = GameState::new(seed, bounds);
        state.particle_cap = settings.max_particles();
        log::info!("Game created (seed {}, bounds {:?})", seed, bounds);
        Self {
            state,
            settings,
            loading_started_ms: None,
            anomaly: AnomalyStage::Idle,
            next_request_id: 1,
            events: Vec::new(),
        }
    }

    pub fn phase(&self) -> GamePhase {
        self.state.phase
    }

    /// Read-only view for drawing
    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn stats(&self) -> PlayerStats {
        self.state.stats()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn anomaly_stage(&self) -> &AnomalyStage {
        &self.anomaly
    }

    /// Event awaiting the player's choice, if any
    pub fn pending_anomaly(&self) -> Option<&AnomalyEvent> {
        match &self.anomaly {
            AnomalyStage::Choosing(event) => Some(event),
            _ => None,
        }
    }

    /// Take all events since the previous call
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Resize the play area (clamps the player on the next tick)
    pub fn set_bounds(&mut self, bounds: Vec2) {
        self.state.bounds = bounds;
    }

    /// Apply new settings
    pub fn apply_settings(&mut self, settings: Settings) {
        self.state.particle_cap = settings.max_particles();
        self.settings = settings;
    }

    fn set_phase(&mut self, to: GamePhase) {
        self.state.set_phase(to);
        self.events.append(&mut self.state.events);
    }

    /// Run one animation frame. Returns a request when the oracle must be called.
    pub fn frame(&mut self, input: &TickInput, now_ms: f64) -> Option<AnomalyRequest> {
        match self.state.phase {
            GamePhase::Loading => {
                let started = *self.loading_started_ms.get_or_insert(now_ms);
                if now_ms - started >= self.settings.loading_delay_ms {
                    self.set_phase(GamePhase::Playing);
                }
                None
            }
            GamePhase::Playing => {
                tick(&mut self.state, input, now_ms);
                self.events.append(&mut self.state.events);
                if self.state.phase == GamePhase::Anomaly {
                    return Some(self.issue_request(now_ms));
                }
                None
            }
            GamePhase::Anomaly => {
                self.check_timeout(now_ms);
                None
            }
            GamePhase::GameOver => None,
        }
    }

    fn issue_request(&mut self, now_ms: f64) -> AnomalyRequest {
        let request = AnomalyRequest {
            id: self.next_request_id,
            level: self.state.level(),
            scrap: self.state.scrap(),
        };
        self.next_request_id += 1;
        self.anomaly = AnomalyStage::Awaiting {
            request,
            issued_at_ms: now_ms,
        };
        log::info!(
            "Anomaly request {} (level {}, scrap {})",
            request.id,
            request.level,
            request.scrap
        );
        request
    }

    fn check_timeout(&mut self, now_ms: f64) {
        let Some(timeout) = self.settings.anomaly_timeout_ms else {
            return;
        };
        if let AnomalyStage::Awaiting {
            request,
            issued_at_ms,
        } = self.anomaly
        {
            if now_ms - issued_at_ms >= timeout {
                log::warn!(
                    "Anomaly request {} timed out after {}ms, using fallback",
                    request.id,
                    timeout
                );
                self.anomaly = AnomalyStage::Choosing(AnomalyEvent::fallback());
            }
        }
    }

    /// Hand over the oracle's answer. Returns false if the request is stale.
    pub fn deliver_anomaly(&mut self, request_id: u64, event: AnomalyEvent) -> bool {
        match self.anomaly {
            AnomalyStage::Awaiting { request, .. } if request.id == request_id => {
                self.anomaly = AnomalyStage::Choosing(event);
                true
            }
            _ => {
                log::debug!("Ignoring stale anomaly response {}", request_id);
                false
            }
        }
    }

    /// Apply the chosen option and resume play
    pub fn choose_option(&mut self, index: usize) -> Result<AnomalyOption, GameError> {
        let AnomalyStage::Choosing(ref event) = self.anomaly else {
            return Err(GameError::NoPendingChoice);
        };
        let option = event
            .options
            .get(index)
            .cloned()
            .ok_or(GameError::InvalidOption {
                index,
                count: event.options.len(),
            })?;

        log::info!("Anomaly choice {:?} {}", option.effect, option.value);
        self.apply_effect(option.effect, option.value);
        self.anomaly = AnomalyStage::Idle;

        if self.state.player.health <= 0.0 {
            self.set_phase(GamePhase::GameOver);
        } else {
            self.set_phase(GamePhase::Playing);
        }
        Ok(option)
    }

    fn apply_effect(&mut self, effect: AnomalyEffect, value: f32) {
        let value = value.max(0.0);
        match effect {
            AnomalyEffect::Heal => {
                self.state.heal_player(value);
            }
            AnomalyEffect::Damage => {
                self.state.player.health = (self.state.player.health - value).max(0.0);
            }
            AnomalyEffect::Scrap => self.state.add_scrap(value.round() as u32),
            AnomalyEffect::Weapon | AnomalyEffect::Nothing => {
                log::debug!("Anomaly effect {:?} has no mechanical impact", effect);
            }
        }
    }

    /// Start over after game over
    pub fn restart(&mut self) -> Result<(), GameError> {
        if self.state.phase != GamePhase::GameOver {
            return Err(GameError::RestartUnavailable(self.state.phase));
        }
        let seed = self.state.rng.next_u64();
        let bounds = self.state.bounds;
        self.state = GameState::new(seed, bounds);
        self.state.particle_cap = self.settings.max_particles();
        // Fresh state starts in Loading; restart goes straight to play
        self.state.phase = GamePhase::GameOver;
        self.anomaly = AnomalyStage::Idle;
        self.set_phase(GamePhase::Playing);
        log::info!("Game restarted (seed {})", seed);
        Ok(())
    }
}
