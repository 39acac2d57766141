//! Team and membership construction.
//!
//! Players are shuffled and cut into teams by weighted size bucket. The
//! leader is the earliest-created member and holds the team's only leader
//! row for its whole life; capacity is never exceeded because a team
//! never takes more members than its capacity.

use crate::{
    clock::{SimCalendar, SECONDS_PER_DAY},
    config::SimConfig,
    error::SimResult,
    population::PlayerRecord,
    rng::{RngBank, StageSlot, SubsystemRng},
    sampler::WeightedTable,
    types::{MembershipId, PlayerId, PlayerIdx, TeamId},
};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Upper bound on the gap between the leader's creation and the team's.
const FOUNDING_JITTER_SECS: i64 = 3_600;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamRecord {
    pub team_id: TeamId,
    pub created_at: DateTime<Utc>,
    pub disbanded_at: Option<DateTime<Utc>>,
    pub tier_level: u32,
    pub max_members: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MembershipRecord {
    pub membership_id: MembershipId,
    pub player_id: PlayerId,
    pub team_id: TeamId,
    pub joined_at: DateTime<Utc>,
    pub left_at: Option<DateTime<Utc>>,
    pub is_leader: bool,
}

impl MembershipRecord {
    pub fn is_open_at(&self, ts: DateTime<Utc>) -> bool {
        self.joined_at <= ts && self.left_at.map_or(true, |left| ts < left)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TeamRoster {
    pub teams: Vec<TeamRecord>,
    pub memberships: Vec<MembershipRecord>,
}

#[derive(Debug, Clone, Copy)]
struct Bucket {
    min_capacity: u32,
    max_capacity: u32,
    tier_level: u32,
}

pub struct TeamBuilder {
    calendar: SimCalendar,
    buckets: WeightedTable<Bucket>,
    join_spread_secs: i64,
    leave_probability: f64,
    disband_probability: f64,
}

impl TeamBuilder {
    pub fn new(config: &SimConfig) -> SimResult<Self> {
        config.validate()?;
        let buckets = WeightedTable::new(
            config.teams.size_buckets.iter().map(|b| {
                let bucket = Bucket {
                    min_capacity: b.min_capacity,
                    max_capacity: b.max_capacity,
                    tier_level: b.tier_level,
                };
                (bucket, b.weight)
            }),
            "teams.size_buckets",
        )?;
        Ok(Self {
            calendar: SimCalendar::new(config.start_date, config.horizon_days),
            buckets,
            join_spread_secs: i64::from(config.teams.join_spread_days) * SECONDS_PER_DAY,
            leave_probability: config.teams.leave_after_churn_probability,
            disband_probability: config.teams.disband_probability,
        })
    }

    pub fn build(&self, bank: &RngBank, players: &[PlayerRecord]) -> TeamRoster {
        let mut rng = bank.for_stage(StageSlot::Teams);
        let mut order: Vec<PlayerIdx> = (0..players.len()).collect();
        rng.shuffle(&mut order);

        let mut roster = TeamRoster::default();
        let mut rest = order.as_slice();
        while !rest.is_empty() {
            let bucket = *self.buckets.sample(&mut rng);
            let capacity =
                rng.range_inclusive(i64::from(bucket.min_capacity), i64::from(bucket.max_capacity)) as u32;
            let take = (capacity as usize).min(rest.len());
            let (members, tail) = rest.split_at(take);
            rest = tail;

            let team_id = roster.teams.len() as TeamId + 1;
            self.found_team(&mut rng, team_id, bucket.tier_level, capacity, members, players, &mut roster);
        }

        log::info!(
            "teams: formed {} teams with {} memberships",
            roster.teams.len(),
            roster.memberships.len()
        );
        roster
    }

    #[allow(clippy::too_many_arguments)]
    fn found_team(
        &self,
        rng: &mut SubsystemRng,
        team_id: TeamId,
        tier_level: u32,
        capacity: u32,
        members: &[PlayerIdx],
        players: &[PlayerRecord],
        roster: &mut TeamRoster,
    ) {
        let last_instant = self.calendar.horizon_end() - Duration::seconds(1);

        let mut members = members.to_vec();
        members.sort_by_key(|&i| (players[i].created_at, players[i].player_id));
        let leader = &players[members[0]];

        let founded = (leader.created_at + Duration::seconds(rng.range_inclusive(0, FOUNDING_JITTER_SECS)))
            .min(last_instant)
            .max(leader.created_at);

        let first_row = roster.memberships.len();
        for (slot, &idx) in members.iter().enumerate() {
            let player = &players[idx];
            let is_leader = slot == 0;
            let joined_at = if is_leader {
                founded
            } else {
                let earliest = founded.max(player.created_at);
                let spread = rng.range_inclusive(0, self.join_spread_secs);
                (earliest + Duration::seconds(spread)).min(last_instant).max(earliest)
            };

            let left_at = if is_leader { None } else { self.draw_leave(rng, player, joined_at) };

            roster.memberships.push(MembershipRecord {
                membership_id: roster.memberships.len() as MembershipId + 1,
                player_id: player.player_id,
                team_id,
                joined_at,
                left_at,
                is_leader,
            });
        }

        let rows = &mut roster.memberships[first_row..];
        let disbanded_at = if rng.chance(self.disband_probability) {
            let last_join = rows.iter().map(|m| m.joined_at).max().unwrap_or(founded);
            let window = (self.calendar.horizon_end() - last_join).num_seconds() - 1;
            if window > 0 {
                let at = last_join + Duration::seconds(rng.range_inclusive(1, window));
                for m in rows.iter_mut() {
                    if m.left_at.map_or(true, |left| left > at) {
                        m.left_at = Some(at);
                    }
                }
                Some(at)
            } else {
                None
            }
        } else {
            None
        };

        log::debug!("team={team_id} tier={tier_level} capacity={capacity} members={}", rows.len());
        roster.teams.push(TeamRecord {
            team_id,
            created_at: founded,
            disbanded_at,
            tier_level,
            max_members: capacity,
        });
    }

    /// Non-leaders whose churn horizon ends inside the window may leave
    /// some time during their first churned day.
    fn draw_leave(&self, rng: &mut SubsystemRng, player: &PlayerRecord, joined_at: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let end_day = player.churn_horizon.end_day(player.creation_day)?;
        if end_day >= self.calendar.horizon_days() || !rng.chance(self.leave_probability) {
            return None;
        }
        let at = self.calendar.day_start(end_day) + Duration::seconds(rng.range_inclusive(0, SECONDS_PER_DAY - 1));
        let at = at.max(joined_at);
        (at < self.calendar.horizon_end()).then_some(at)
    }
}
