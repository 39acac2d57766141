//! Session and gameplay event synthesis.
//!
//! Every (player, active day) pair yields at least one session, so the
//! DAU computed from `sessions` equals the scheduled activity. Sessions
//! of one day are pinned inside that UTC day, never overlap, and never
//! start before the player was created.

use crate::{
    clock::{SimCalendar, SECONDS_PER_DAY},
    config::{IntRange, MatchConfig, SessionConfig, SessionCountModel, SimConfig},
    error::SimResult,
    event::{EventRecord, EventType},
    population::PlayerRecord,
    rng::{RngBank, StageSlot, SubsystemRng},
    sampler::WeightedTable,
    types::{Day, EngagementSegment, MatchOutcome, PlayerId, SessionId},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

/// Last second of a UTC day that a session may still occupy.
const LAST_SECOND: i64 = SECONDS_PER_DAY - 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub session_id: SessionId,
    pub player_id: PlayerId,
    pub day: Day,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub duration_sec: i64,
    pub client_version: String,
    pub build_number: u32,
    pub country_code: Arc<str>,
    pub platform: Arc<str>,
    pub entry_point: Arc<str>,
    pub season_id: u32,
    /// Player level once the session's last event has fired.
    pub end_level: u32,
}

/// Everything one player produced across the horizon, in time order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlayerTimeline {
    pub sessions: Vec<SessionRecord>,
    pub events: Vec<EventRecord>,
    pub matches: u64,
}

enum SessionCounts {
    Weighted(WeightedTable<u32>),
    Pareto { alpha: f64, min: u32, max: u32 },
}

impl SessionCounts {
    fn draw(&self, rng: &mut SubsystemRng) -> u32 {
        match self {
            Self::Weighted(table) => *table.sample(rng),
            Self::Pareto { alpha, min, max } => {
                let raw = rng.pareto(1.0, *alpha).floor().min(f64::from(u32::MAX)) as u32;
                raw.clamp(*min, *max)
            }
        }
    }
}

struct SegmentSessions {
    segment: EngagementSegment,
    counts: SessionCounts,
    median_sec: f64,
    sigma: f64,
}

pub struct SessionSynthesizer {
    calendar: SimCalendar,
    segments: Vec<SegmentSessions>,
    start_hours: WeightedTable<u32>,
    entry_points: WeightedTable<Arc<str>>,
    session: SessionConfig,
    patch_days: Vec<Day>,
    matches_per_session: WeightedTable<u32>,
    game_modes: WeightedTable<Arc<str>>,
    outcomes: WeightedTable<MatchOutcome>,
    matches: MatchConfig,
}

impl SessionSynthesizer {
    pub fn new(config: &SimConfig) -> SimResult<Self> {
        config.validate()?;

        let mut segments = Vec::with_capacity(config.engagement.len());
        for p in &config.engagement {
            let counts = match &p.sessions_per_day {
                SessionCountModel::Weighted { choices } => SessionCounts::Weighted(WeightedTable::from_choices(
                    choices,
                    &format!("engagement {}: sessions_per_day", p.segment.as_str()),
                )?),
                SessionCountModel::Pareto { alpha, min, max } => {
                    SessionCounts::Pareto { alpha: *alpha, min: *min, max: *max }
                }
            };
            segments.push(SegmentSessions {
                segment: p.segment,
                counts,
                median_sec: p.session_median_sec,
                sigma: p.session_sigma,
            });
        }

        let mut patch_days: Vec<Day> = config.dau_curve.patches.iter().map(|p| p.day).collect();
        patch_days.sort_unstable();

        let m = &config.matches;
        Ok(Self {
            calendar: SimCalendar::new(config.start_date, config.horizon_days),
            segments,
            start_hours: WeightedTable::from_choices(&config.sessions.local_start_hours, "sessions.local_start_hours")?,
            entry_points: arc_table(
                config.sessions.entry_points.iter().map(|c| (c.value.as_str(), c.weight)),
                "sessions.entry_points",
            )?,
            session: config.sessions.clone(),
            patch_days,
            matches_per_session: WeightedTable::from_choices(&m.matches_per_session, "matches.matches_per_session")?,
            game_modes: arc_table(m.game_modes.iter().map(|c| (c.value.as_str(), c.weight)), "matches.game_modes")?,
            outcomes: WeightedTable::from_choices(&m.outcomes, "matches.outcomes")?,
            matches: m.clone(),
        })
    }

    fn segment(&self, segment: EngagementSegment) -> &SegmentSessions {
        self.segments
            .iter()
            .find(|s| s.segment == segment)
            .unwrap_or(&self.segments[0])
    }

    /// Number of patches released on or before `day`.
    pub fn patch_index(&self, day: Day) -> u32 {
        self.patch_days.partition_point(|&p| p <= day) as u32
    }

    /// Season ids start at 1 and advance every `season_length_days`.
    pub fn season_id(&self, day: Day) -> u32 {
        day / self.session.season_length_days + 1
    }

    /// Build sessions and events for one player over its active days.
    /// Session, event and match ids are player-local ordinals.
    pub fn synthesize_player(&self, bank: &RngBank, player: &PlayerRecord, active_days: &[Day]) -> PlayerTimeline {
        let mut rng = bank.for_player(StageSlot::Sessions, player.player_id);
        let seg = self.segment(player.engagement);
        let mut timeline = PlayerTimeline::default();
        let mut level = 1u32;

        for &day in active_days {
            let earliest = if day == player.creation_day {
                (player.created_at - self.calendar.day_start(day)).num_seconds().clamp(0, LAST_SECOND)
            } else {
                0
            };

            let count = seg.counts.draw(&mut rng).max(1);
            let mut starts: Vec<i64> = (0..count).map(|_| self.draw_start_second(&mut rng, player)).collect();
            starts.sort_unstable();

            let mut cursor = earliest;
            for (i, &drawn) in starts.iter().enumerate() {
                let duration = rng
                    .log_normal(seg.median_sec, seg.sigma)
                    .round()
                    .clamp(self.session.min_duration_sec as f64, self.session.max_duration_sec as f64)
                    as i64;

                let Some((start, duration)) = self.place_session(i == 0, drawn, cursor, earliest, duration) else {
                    break;
                };
                cursor = start + duration + self.session.min_gap_sec;

                let session_id = timeline.sessions.len() as SessionId;
                let start_ts = self.calendar.at(day, start);
                let end_ts = self.calendar.at(day, start + duration);
                let patch = self.patch_index(day);
                let hotfix = rng.range_inclusive(0, i64::from(self.session.hotfixes_per_patch)) as u32;
                let build_offset = rng.range_inclusive(0, i64::from(self.session.builds_per_patch.saturating_sub(1))) as u32;
                let entry_point = self.entry_points.sample(&mut rng).clone();
                let client_version = format!("1.{patch}.{hotfix}");

                let mut start_event = EventRecord::new(player.player_id, session_id, start_ts, EventType::SessionStart, level);
                start_event.metadata = json!({
                    "entry_point": entry_point.as_ref(),
                    "client_version": client_version,
                });
                timeline.events.push(start_event);

                self.play_matches(&mut rng, player.player_id, session_id, (start_ts, end_ts), &mut level, &mut timeline);

                timeline.sessions.push(SessionRecord {
                    session_id,
                    player_id: player.player_id,
                    day,
                    start: start_ts,
                    end: end_ts,
                    duration_sec: duration,
                    client_version,
                    build_number: self.session.first_build_number + patch * self.session.builds_per_patch + build_offset,
                    country_code: player.country_code.clone(),
                    platform: player.platform.clone(),
                    entry_point,
                    season_id: self.season_id(day),
                    end_level: level,
                });
            }
        }
        timeline
    }

    /// Local diurnal start converted to seconds into the UTC day.
    fn draw_start_second(&self, rng: &mut SubsystemRng, player: &PlayerRecord) -> i64 {
        let hour = i64::from(*self.start_hours.sample(rng));
        let local = hour * 3_600 + rng.range_inclusive(0, 3_599);
        (local - i64::from(player.time_zone_offset) * 3_600).rem_euclid(SECONDS_PER_DAY)
    }

    /// Fit a session into the day after `cursor`. The first session of a
    /// day is always placed (shifted earlier or shortened if needed);
    /// later ones are dropped when they no longer fit.
    fn place_session(&self, first: bool, drawn: i64, cursor: i64, earliest: i64, duration: i64) -> Option<(i64, i64)> {
        let start = drawn.max(cursor);
        if start + duration <= LAST_SECOND {
            return Some((start, duration));
        }
        if first {
            let start = (LAST_SECOND - duration).max(earliest);
            return Some((start, duration.min(LAST_SECOND - start)));
        }
        if start + self.session.min_duration_sec <= LAST_SECOND {
            return Some((start, LAST_SECOND - start));
        }
        None
    }

    fn play_matches(
        &self,
        rng: &mut SubsystemRng,
        player_id: PlayerId,
        session_id: SessionId,
        (start, end): (DateTime<Utc>, DateTime<Utc>),
        level: &mut u32,
        timeline: &mut PlayerTimeline,
    ) {
        let m = &self.matches;
        let count = *self.matches_per_session.sample(rng);
        if count == 0 {
            return;
        }

        let length = (end - start).num_seconds();
        let lead_in = (length as f64 * m.first_match_max_fraction).floor() as i64;
        let mut cursor = start + chrono::Duration::seconds(rng.range_inclusive(0, lead_in));

        for index in 0..count {
            let match_secs = draw(rng, m.match_duration_sec);
            let match_end = cursor + chrono::Duration::seconds(match_secs);
            if match_end > end {
                break;
            }

            let match_id = timeline.matches;
            timeline.matches += 1;
            let mode = self.game_modes.sample(rng).clone();
            let outcome = *self.outcomes.sample(rng);

            let mut started = EventRecord::new(player_id, session_id, cursor, EventType::MatchStart, *level);
            started.game_mode = Some(mode.clone());
            started.match_id = Some(match_id);
            started.metadata = json!({ "match_index": index });
            timeline.events.push(started);

            let soft_range = match outcome {
                MatchOutcome::Win  => m.soft_rewards.win,
                MatchOutcome::Loss => m.soft_rewards.loss,
                MatchOutcome::Draw => m.soft_rewards.draw,
            };
            let mut ended = EventRecord::new(player_id, session_id, match_end, EventType::MatchEnd, *level);
            ended.game_mode = Some(mode);
            ended.match_outcome = Some(outcome);
            ended.match_id = Some(match_id);
            ended.soft_delta = draw(rng, soft_range);
            if outcome == MatchOutcome::Win && rng.chance(m.hard_drop_probability_on_win) {
                ended.hard_delta = draw(rng, m.hard_drop);
            }
            ended.metadata = json!({ "duration_sec": match_secs });
            timeline.events.push(ended);

            if rng.chance(m.level_up_probability) {
                *level += 1;
                let mut up = EventRecord::new(player_id, session_id, match_end, EventType::LevelUp, *level);
                up.match_id = Some(match_id);
                up.hard_delta = m.level_up_hard_grant;
                up.metadata = json!({ "from_level": *level - 1, "to_level": *level });
                timeline.events.push(up);
            }

            cursor = match_end + chrono::Duration::seconds(draw(rng, m.break_between_matches_sec));
        }
    }
}

fn draw(rng: &mut SubsystemRng, range: IntRange) -> i64 {
    rng.range_inclusive(range.min, range.max)
}

fn arc_table<'a>(entries: impl Iterator<Item = (&'a str, f64)>, what: &str) -> SimResult<WeightedTable<Arc<str>>> {
    WeightedTable::new(entries.map(|(v, w)| (Arc::from(v), w)), what)
}
