//! Telemetry event rows.
//!
//! Ids on records produced by the synthesizers are player-local ordinals
//! until the engine rebases them into the global id space.

use crate::types::{EventId, MatchId, MatchOutcome, PlayerId, SessionId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Stored verbatim in `events.event_type`.
/// Variants are append-only; KPI tooling matches on the strings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    SessionStart,
    MatchStart,
    MatchEnd,
    LevelUp,
    Purchase,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SessionStart => "session_start",
            Self::MatchStart   => "match_start",
            Self::MatchEnd     => "match_end",
            Self::LevelUp      => "level_up",
            Self::Purchase     => "purchase",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub event_id: EventId,
    pub player_id: PlayerId,
    pub session_id: Option<SessionId>,
    pub event_time: DateTime<Utc>,
    pub event_type: EventType,
    pub game_mode: Option<Arc<str>>,
    pub match_outcome: Option<MatchOutcome>,
    /// Player level when the event fired (after the increment for `level_up`).
    pub level: u32,
    pub match_id: Option<MatchId>,
    pub soft_delta: i64,
    pub soft_currency_purchased: i64,
    pub hard_delta: i64,
    pub metadata: serde_json::Value,
}

impl EventRecord {
    /// Bare event with zero deltas; callers fill in what applies.
    pub fn new(
        player_id: PlayerId,
        session_id: SessionId,
        event_time: DateTime<Utc>,
        event_type: EventType,
        level: u32,
    ) -> Self {
        Self {
            event_id: 0,
            player_id,
            session_id: Some(session_id),
            event_time,
            event_type,
            game_mode: None,
            match_outcome: None,
            level,
            match_id: None,
            soft_delta: 0,
            soft_currency_purchased: 0,
            hard_delta: 0,
            metadata: serde_json::Value::Null,
        }
    }

    pub fn metadata_json(&self) -> Option<String> {
        if self.metadata.is_null() {
            None
        } else {
            Some(self.metadata.to_string())
        }
    }
}
