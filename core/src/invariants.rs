//! Output invariants checked before anything is written.
//!
//! Every check returns the first violation as
//! `SimError::InvariantViolation`; a violation means the generator is
//! wrong, so the writer refuses the whole dataset.

use crate::{
    engine::GeneratedDataset,
    error::{SimError, SimResult},
    event::EventType,
    types::{MatchId, PlayerId, SessionId, TeamId},
};
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};

pub const DANGLING_REFERENCE: &str = "dangling_reference";
pub const DUPLICATE_LEADER: &str = "duplicate_leader";
pub const CAPACITY_EXCEEDED: &str = "capacity_exceeded";
pub const MEMBERSHIP_ORDER: &str = "membership_order";
pub const SESSION_BOUNDS: &str = "session_bounds";
pub const SESSION_OVERLAP: &str = "session_overlap";
pub const EVENT_OUTSIDE_SESSION: &str = "event_outside_session";
pub const EVENT_ORDER: &str = "event_order";
pub const UNMATCHED_MATCH_END: &str = "unmatched_match_end";
pub const LEVEL_DECREASE: &str = "level_decrease";
pub const INVALID_PURCHASE: &str = "invalid_purchase";

pub fn validate_dataset(data: &GeneratedDataset) -> SimResult<()> {
    let players: HashMap<PlayerId, DateTime<Utc>> =
        data.players.iter().map(|p| (p.player_id, p.created_at)).collect();

    check_teams(data, &players)?;
    let sessions = check_sessions(data, &players)?;
    check_events(data, &sessions)?;
    check_purchases(data, &sessions)?;

    for a in &data.assignments {
        if !players.contains_key(&a.player_id) {
            return Err(SimError::invariant(
                DANGLING_REFERENCE,
                format!("assignment for unknown player {}", a.player_id),
            ));
        }
    }
    Ok(())
}

fn check_teams(data: &GeneratedDataset, players: &HashMap<PlayerId, DateTime<Utc>>) -> SimResult<()> {
    let teams: HashMap<TeamId, (DateTime<Utc>, u32)> =
        data.teams.iter().map(|t| (t.team_id, (t.created_at, t.max_members))).collect();

    let mut leaders: HashSet<TeamId> = HashSet::new();
    let mut timeline: HashMap<TeamId, Vec<(DateTime<Utc>, i32)>> = HashMap::new();

    for m in &data.memberships {
        let Some(&(founded, _)) = teams.get(&m.team_id) else {
            return Err(SimError::invariant(
                DANGLING_REFERENCE,
                format!("membership {} references unknown team {}", m.membership_id, m.team_id),
            ));
        };
        let Some(&created) = players.get(&m.player_id) else {
            return Err(SimError::invariant(
                DANGLING_REFERENCE,
                format!("membership {} references unknown player {}", m.membership_id, m.player_id),
            ));
        };
        if m.is_leader && !leaders.insert(m.team_id) {
            return Err(SimError::invariant(
                DUPLICATE_LEADER,
                format!("team {} has more than one leader row", m.team_id),
            ));
        }
        if m.joined_at < founded || m.joined_at < created || m.left_at.is_some_and(|left| left < m.joined_at) {
            return Err(SimError::invariant(
                MEMBERSHIP_ORDER,
                format!("membership {} has inconsistent join/leave times", m.membership_id),
            ));
        }
        let marks = timeline.entry(m.team_id).or_default();
        marks.push((m.joined_at, 1));
        if let Some(left) = m.left_at {
            marks.push((left, -1));
        }
    }

    for (team_id, mut marks) in timeline {
        let capacity = teams.get(&team_id).map_or(0, |&(_, cap)| cap) as i64;
        // Leaves sort before joins at the same instant.
        marks.sort_unstable();
        let mut open = 0i64;
        for (at, delta) in marks {
            open += i64::from(delta);
            if open > capacity {
                return Err(SimError::invariant(
                    CAPACITY_EXCEEDED,
                    format!("team {team_id} has {open} members at {at}, capacity {capacity}"),
                ));
            }
        }
    }
    Ok(())
}

struct SessionBounds {
    player_id: PlayerId,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

fn check_sessions(
    data: &GeneratedDataset,
    players: &HashMap<PlayerId, DateTime<Utc>>,
) -> SimResult<HashMap<SessionId, SessionBounds>> {
    let mut sessions = HashMap::with_capacity(data.sessions.len());
    let mut last_end: HashMap<PlayerId, DateTime<Utc>> = HashMap::new();

    for s in &data.sessions {
        let Some(&created) = players.get(&s.player_id) else {
            return Err(SimError::invariant(
                DANGLING_REFERENCE,
                format!("session {} references unknown player {}", s.session_id, s.player_id),
            ));
        };
        if s.end < s.start || s.start < created || (s.end - s.start).num_seconds() != s.duration_sec {
            return Err(SimError::invariant(
                SESSION_BOUNDS,
                format!("session {} has inconsistent bounds", s.session_id),
            ));
        }
        if let Some(prev) = last_end.insert(s.player_id, s.end) {
            if s.start < prev {
                return Err(SimError::invariant(
                    SESSION_OVERLAP,
                    format!("session {} overlaps an earlier session of player {}", s.session_id, s.player_id),
                ));
            }
        }
        sessions.insert(s.session_id, SessionBounds { player_id: s.player_id, start: s.start, end: s.end });
    }
    Ok(sessions)
}

fn check_events(data: &GeneratedDataset, sessions: &HashMap<SessionId, SessionBounds>) -> SimResult<()> {
    let mut last_time: HashMap<SessionId, DateTime<Utc>> = HashMap::new();
    let mut last_level: HashMap<PlayerId, u32> = HashMap::new();
    let mut started: HashSet<(SessionId, MatchId)> = HashSet::new();

    for e in &data.events {
        let Some(session_id) = e.session_id else {
            continue;
        };
        let Some(bounds) = sessions.get(&session_id) else {
            return Err(SimError::invariant(
                DANGLING_REFERENCE,
                format!("event {} references unknown session {session_id}", e.event_id),
            ));
        };
        if bounds.player_id != e.player_id {
            return Err(SimError::invariant(
                DANGLING_REFERENCE,
                format!("event {} belongs to a session of another player", e.event_id),
            ));
        }
        if e.event_time < bounds.start || e.event_time > bounds.end {
            return Err(SimError::invariant(
                EVENT_OUTSIDE_SESSION,
                format!("event {} lies outside session {session_id}", e.event_id),
            ));
        }
        if let Some(prev) = last_time.insert(session_id, e.event_time) {
            if e.event_time < prev {
                return Err(SimError::invariant(
                    EVENT_ORDER,
                    format!("event {} precedes an earlier event of session {session_id}", e.event_id),
                ));
            }
        }
        if let Some(prev) = last_level.insert(e.player_id, e.level) {
            if e.level < prev {
                return Err(SimError::invariant(
                    LEVEL_DECREASE,
                    format!("player {} drops from level {prev} to {}", e.player_id, e.level),
                ));
            }
        }
        match (e.event_type, e.match_id) {
            (EventType::MatchStart, Some(match_id)) => {
                started.insert((session_id, match_id));
            }
            (EventType::MatchEnd, Some(match_id)) if started.contains(&(session_id, match_id)) => {}
            (EventType::MatchEnd, _) => {
                return Err(SimError::invariant(
                    UNMATCHED_MATCH_END,
                    format!("event {} ends a match that never started", e.event_id),
                ));
            }
            _ => {}
        }
    }
    Ok(())
}

fn check_purchases(data: &GeneratedDataset, sessions: &HashMap<SessionId, SessionBounds>) -> SimResult<()> {
    for p in &data.purchases {
        let Some(bounds) = sessions.get(&p.session_id) else {
            return Err(SimError::invariant(
                DANGLING_REFERENCE,
                format!("purchase {} references unknown session {}", p.purchase_id, p.session_id),
            ));
        };
        if bounds.player_id != p.player_id {
            return Err(SimError::invariant(
                DANGLING_REFERENCE,
                format!("purchase {} belongs to a session of another player", p.purchase_id),
            ));
        }
        if p.price_local < 0 || p.price_eur < 0 || p.quantity == 0 {
            return Err(SimError::invariant(
                INVALID_PURCHASE,
                format!("purchase {} has a negative price or zero quantity", p.purchase_id),
            ));
        }
        if p.purchase_time < bounds.start || p.purchase_time > bounds.end {
            return Err(SimError::invariant(
                EVENT_OUTSIDE_SESSION,
                format!("purchase {} lies outside session {}", p.purchase_id, p.session_id),
            ));
        }
    }
    Ok(())
}
