//! Shared primitive types used across the entire generator.

use serde::{Deserialize, Serialize};

/// A simulated day. Day 0 is the configured start date.
pub type Day = u32;

/// Stable player identifier as written to `players.player_id` (1-based).
pub type PlayerId = u32;

/// 0-based position of a player in the flat player table.
/// Always `player_id - 1`.
pub type PlayerIdx = usize;

pub type TeamId = u32;
pub type MembershipId = u64;
pub type SessionId = u64;
pub type EventId = u64;
pub type MatchId = u64;
pub type PurchaseId = u64;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum EngagementSegment {
    Casual,
    Midcore,
    Heavy,
}

impl EngagementSegment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Casual  => "casual",
            Self::Midcore => "midcore",
            Self::Heavy   => "heavy",
        }
    }

    /// Higher rank = more engaged. Used as a tie-break when the
    /// scheduler has to pick extra activations.
    pub fn rank(&self) -> u8 {
        match self {
            Self::Casual  => 0,
            Self::Midcore => 1,
            Self::Heavy   => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum SpendSegment {
    Nonpayer,
    Minnow,
    Dolphin,
    Whale,
}

impl SpendSegment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Nonpayer => "nonpayer",
            Self::Minnow   => "minnow",
            Self::Dolphin  => "dolphin",
            Self::Whale    => "whale",
        }
    }
}

/// A/B test arm. Serialized exactly as stored in `experiment_assignments.variant`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Variant {
    Control,
    A,
    B,
}

impl Variant {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Control => "Control",
            Self::A       => "A",
            Self::B       => "B",
        }
    }
}

/// How long after creation a player may still be sampled as active.
///
/// `Days(n)` makes the player eligible on days
/// `creation_day .. creation_day + n` (exclusive), so `Days(0)` means
/// the player never plays. `Never` is the core cohort.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChurnHorizon {
    Days(u32),
    Never,
}

impl ChurnHorizon {
    /// First day on which a player created on `creation_day` is no longer
    /// eligible, or `None` for players who never churn.
    pub fn end_day(&self, creation_day: Day) -> Option<Day> {
        match self {
            Self::Days(n) => Some(creation_day.saturating_add(*n)),
            Self::Never   => None,
        }
    }

    pub fn covers(&self, creation_day: Day, day: Day) -> bool {
        day >= creation_day && self.end_day(creation_day).map_or(true, |end| day < end)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum MatchOutcome {
    Win,
    Loss,
    Draw,
}

impl MatchOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Win  => "win",
            Self::Loss => "loss",
            Self::Draw => "draw",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ProductType {
    SoftPack,
    HardPack,
    Bundle,
}

impl ProductType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SoftPack => "SoftPack",
            Self::HardPack => "HardPack",
            Self::Bundle   => "Bundle",
        }
    }
}
