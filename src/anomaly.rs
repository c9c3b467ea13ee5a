//! Narrative anomaly events
//!
//! Touching an anomaly core pauses the game and asks an `AnomalyOracle` for an
//! event with choices. The oracle is external (a text-generation service in
//! production); any failure is replaced by a fixed fallback event so play can
//! always resume.

use std::cell::RefCell;
use std::future::Future;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Offline event catalog shipped with the game
const CATALOG_JSON: &str = include_str!("../assets/anomalies.json");

/// Mechanical effect of an anomaly option
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnomalyEffect {
    Heal,
    Damage,
    Scrap,
    Weapon,
    Nothing,
}

/// One choice offered by an anomaly
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnomalyOption {
    pub text: String,
    pub outcome_description: String,
    pub effect: AnomalyEffect,
    pub value: f32,
}

/// A narrative event with two or more options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnomalyEvent {
    pub title: String,
    pub description: String,
    pub options: Vec<AnomalyOption>,
}

#[derive(Debug, Error)]
pub enum AnomalyError {
    #[error("anomaly service unavailable: {0}")]
    Transport(String),
    #[error("malformed anomaly response: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("anomaly response failed validation: {0}")]
    Schema(String),
}

impl AnomalyEvent {
    /// Event used whenever the oracle fails
    pub fn fallback() -> Self {
        Self {
            title: "Static Interference".to_string(),
            description: "The anomaly dissolves into a wall of noise before your sensors can \
                          make sense of it. Something in the static still answers."
                .to_string(),
            options: vec![
                AnomalyOption {
                    text: "Reroute power to shields".to_string(),
                    outcome_description: "The static charges your hull plating.".to_string(),
                    effect: AnomalyEffect::Heal,
                    value: 20.0,
                },
                AnomalyOption {
                    text: "Sift the debris field".to_string(),
                    outcome_description: "You scoop up fragments left behind by the surge."
                        .to_string(),
                    effect: AnomalyEffect::Scrap,
                    value: 50.0,
                },
            ],
        }
    }

    /// Parse and validate a response body
    pub fn from_json(json: &str) -> Result<Self, AnomalyError> {
        let event: AnomalyEvent = serde_json::from_str(json)?;
        event.validate()?;
        Ok(event)
    }

    /// Check the shape a caller relies on
    pub fn validate(&self) -> Result<(), AnomalyError> {
        if self.title.trim().is_empty() {
            return Err(AnomalyError::Schema("empty title".into()));
        }
        if self.options.len() < 2 {
            return Err(AnomalyError::Schema(format!(
                "expected at least 2 options, got {}",
                self.options.len()
            )));
        }
        for (i, option) in self.options.iter().enumerate() {
            if option.text.trim().is_empty() {
                return Err(AnomalyError::Schema(format!("option {} has no text", i)));
            }
            if !option.value.is_finite() || option.value < 0.0 {
                return Err(AnomalyError::Schema(format!(
                    "option {} has invalid value {}",
                    i, option.value
                )));
            }
        }
        Ok(())
    }
}

/// Outstanding request for an anomaly event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnomalyRequest {
    /// Identifies the request so late answers can be discarded
    pub id: u64,
    pub level: u32,
    pub scrap: u32,
}

/// External narrative generator
pub trait AnomalyOracle {
    fn request_anomaly(
        &self,
        level: u32,
        scrap: u32,
    ) -> impl Future<Output = Result<AnomalyEvent, AnomalyError>>;
}

/// Ask the oracle for an event, substituting the fallback on any failure
pub async fn resolve_anomaly<O: AnomalyOracle>(oracle: &O, request: AnomalyRequest) -> AnomalyEvent {
    let result = oracle
        .request_anomaly(request.level, request.scrap)
        .await
        .and_then(|event| event.validate().map(|_| event));
    match result {
        Ok(event) => {
            log::info!("Anomaly {}: {}", request.id, event.title);
            event
        }
        Err(e) => {
            log::warn!("Anomaly {} fell back: {}", request.id, e);
            AnomalyEvent::fallback()
        }
    }
}

/// Offline oracle drawing from the built-in catalog
#[derive(Debug)]
pub struct LocalOracle {
    catalog: Vec<AnomalyEvent>,
    rng: RefCell<Pcg32>,
}

impl LocalOracle {
    pub fn new(seed: u64) -> Result<Self, AnomalyError> {
        Self::with_catalog(CATALOG_JSON, seed)
    }

    /// Build from a JSON array of events; every entry must validate
    pub fn with_catalog(json: &str, seed: u64) -> Result<Self, AnomalyError> {
        let catalog: Vec<AnomalyEvent> = serde_json::from_str(json)?;
        for event in &catalog {
            event.validate()?;
        }
        Ok(Self {
            catalog,
            rng: RefCell::new(Pcg32::seed_from_u64(seed)),
        })
    }

    pub fn len(&self) -> usize {
        self.catalog.len()
    }

    pub fn is_empty(&self) -> bool {
        self.catalog.is_empty()
    }

    fn pick(&self, level: u32, scrap: u32) -> Result<AnomalyEvent, AnomalyError> {
        if self.catalog.is_empty() {
            return Err(AnomalyError::Transport("catalog is empty".into()));
        }
        let index = self.rng.borrow_mut().random_range(0..self.catalog.len());
        let mut event = self.catalog[index].clone();
        event.description = event
            .description
            .replace("{level}", &level.to_string())
            .replace("{scrap}", &scrap.to_string());

        // Stakes grow a quarter per level
        let scale = 1.0 + 0.25 * level.saturating_sub(1) as f32;
        for option in &mut event.options {
            if matches!(
                option.effect,
                AnomalyEffect::Heal | AnomalyEffect::Damage | AnomalyEffect::Scrap
            ) {
                option.value = (option.value * scale).round();
            }
        }
        Ok(event)
    }
}

impl AnomalyOracle for LocalOracle {
    fn request_anomaly(
        &self,
        level: u32,
        scrap: u32,
    ) -> impl Future<Output = Result<AnomalyEvent, AnomalyError>> {
        std::future::ready(self.pick(level, scrap))
    }
}
