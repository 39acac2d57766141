//! Activity scheduler: reconciles per-player churn with the DAU curve.
//!
//! Days are processed in order over a flat player table. For day d:
//!   1. Admit players created on d; drop players whose churn horizon
//!      has elapsed or who are locked out after a long dormancy.
//!   2. Draw an independent Bernoulli per candidate with a probability
//!      that decays with days since creation (segment specific).
//!   3. Correct the realised count into the tolerance band around the
//!      target: activate the most likely inactive candidates, or
//!      deactivate the least likely sampled ones.
//!
//! The correction never touches a player outside its churn horizon.
//! When the pool is smaller than the band the day records a shortfall;
//! generation continues.

use crate::{
    config::{EngagementProfile, SimConfig},
    error::{SimError, SimResult},
    population::PlayerRecord,
    rng::{RngBank, StageSlot},
    types::{Day, EngagementSegment, PlayerIdx},
};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Marginal daily activity probability as a function of player age.
/// Flat for the first `early_days`, then halving every `half_life_days`,
/// never below `floor`. Non-increasing in age.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActivityCurve {
    pub early_days: u32,
    pub early_probability: f64,
    pub half_life_days: f64,
    pub floor: f64,
}

impl ActivityCurve {
    pub fn probability(&self, age: u32) -> f64 {
        if age < self.early_days {
            return self.early_probability;
        }
        let steps = f64::from(age - self.early_days + 1) / self.half_life_days;
        (self.early_probability * 0.5_f64.powf(steps)).max(self.floor)
    }
}

impl From<&EngagementProfile> for ActivityCurve {
    fn from(p: &EngagementProfile) -> Self {
        Self {
            early_days: p.early_activity_days,
            early_probability: p.early_activity_probability,
            half_life_days: p.activity_half_life_days,
            floor: p.activity_floor,
        }
    }
}

/// One eligible player on one day.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub idx: PlayerIdx,
    pub probability: f64,
    pub draw: f64,
    pub age: u32,
    pub rank: u8,
    pub active: bool,
}

impl Candidate {
    /// `Less` means `self` is the more plausible activation: higher
    /// probability, then younger, then more engaged, then the draw that
    /// came closest, then the lower index.
    pub fn likelihood_cmp(&self, other: &Self) -> Ordering {
        other
            .probability
            .total_cmp(&self.probability)
            .then(self.age.cmp(&other.age))
            .then(other.rank.cmp(&self.rank))
            .then(self.draw.total_cmp(&other.draw))
            .then(self.idx.cmp(&other.idx))
    }
}

/// Inclusive band of acceptable active counts for a target.
pub fn tolerance_band(target: u32, tolerance: f64) -> (u32, u32) {
    let t = f64::from(target);
    let lower = (t * (1.0 - tolerance)).floor() as u32;
    let upper = (t * (1.0 + tolerance)).ceil() as u32;
    (lower.min(target), upper.max(target))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayCorrection {
    pub sampled: u32,
    pub activated: u32,
    pub deactivated: u32,
}

/// Bounded correction pass for a single day. Pure: depends only on the
/// candidates, the target and the tolerance.
pub fn reconcile_day(candidates: &mut [Candidate], target: u32, tolerance: f64) -> DayCorrection {
    let sampled = candidates.iter().filter(|c| c.active).count() as u32;
    let eligible = candidates.len() as u32;
    let (lower, upper) = tolerance_band(target, tolerance);
    let lower = lower.min(eligible);
    let upper = upper.min(eligible);

    let mut correction = DayCorrection { sampled, activated: 0, deactivated: 0 };

    if sampled < lower {
        let mut inactive: Vec<usize> = (0..candidates.len()).filter(|&i| !candidates[i].active).collect();
        inactive.sort_by(|&a, &b| candidates[a].likelihood_cmp(&candidates[b]));
        for &i in inactive.iter().take((lower - sampled) as usize) {
            candidates[i].active = true;
            correction.activated += 1;
        }
    } else if sampled > upper {
        let mut active: Vec<usize> = (0..candidates.len()).filter(|&i| candidates[i].active).collect();
        active.sort_by(|&a, &b| candidates[b].likelihood_cmp(&candidates[a]));
        for &i in active.iter().take((sampled - upper) as usize) {
            candidates[i].active = false;
            correction.deactivated += 1;
        }
    }
    correction
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayOutcome {
    pub day: Day,
    pub target: u32,
    pub achieved: u32,
    pub eligible: u32,
    /// Active count after the independent draws, before correction.
    pub sampled: u32,
    /// `target - achieved` when the day missed its band, else 0.
    pub shortfall: u32,
    pub within_tolerance: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DauReport {
    pub days: Vec<DayOutcome>,
}

impl DauReport {
    pub fn shortfall_days(&self) -> impl Iterator<Item = &DayOutcome> {
        self.days.iter().filter(|d| d.shortfall > 0)
    }

    pub fn total_shortfall(&self) -> u64 {
        self.days.iter().map(|d| u64::from(d.shortfall)).sum()
    }

    pub fn achieved(&self) -> Vec<u32> {
        self.days.iter().map(|d| d.achieved).collect()
    }
}

/// Per-player ordered active days in compressed-row layout.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivityMatrix {
    offsets: Vec<usize>,
    days: Vec<Day>,
}

impl ActivityMatrix {
    /// Build from per-day active lists. Each list must hold player
    /// positions; days are appended in order so rows come out sorted.
    pub fn from_daily(player_count: usize, daily: &[Vec<PlayerIdx>]) -> Self {
        let mut counts = vec![0usize; player_count];
        for today in daily {
            for &idx in today {
                counts[idx] += 1;
            }
        }
        let mut offsets = Vec::with_capacity(player_count + 1);
        offsets.push(0);
        for c in &counts {
            let last = offsets[offsets.len() - 1];
            offsets.push(last + c);
        }
        let mut cursor: Vec<usize> = offsets[..player_count].to_vec();
        let mut days = vec![0; offsets[player_count]];
        for (day, today) in daily.iter().enumerate() {
            for &idx in today {
                days[cursor[idx]] = day as Day;
                cursor[idx] += 1;
            }
        }
        Self { offsets, days }
    }

    pub fn player_count(&self) -> usize {
        self.offsets.len().saturating_sub(1)
    }

    pub fn active_days(&self, idx: PlayerIdx) -> &[Day] {
        &self.days[self.offsets[idx]..self.offsets[idx + 1]]
    }

    pub fn is_active(&self, idx: PlayerIdx, day: Day) -> bool {
        self.active_days(idx).binary_search(&day).is_ok()
    }

    pub fn total_player_days(&self) -> usize {
        self.days.len()
    }

    pub fn daily_counts(&self, horizon_days: Day) -> Vec<u32> {
        let mut counts = vec![0u32; horizon_days as usize];
        for &d in &self.days {
            if let Some(c) = counts.get_mut(d as usize) {
                *c += 1;
            }
        }
        counts
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ActivitySchedule {
    pub matrix: ActivityMatrix,
    pub report: DauReport,
}

pub struct ActivityScheduler {
    horizon_days: Day,
    tolerance: f64,
    lockout_days: Option<u32>,
    curves: Vec<(EngagementSegment, ActivityCurve)>,
}

impl ActivityScheduler {
    pub fn new(config: &SimConfig) -> SimResult<Self> {
        config.validate()?;
        Ok(Self {
            horizon_days: config.horizon_days,
            tolerance: config.activity.dau_tolerance,
            lockout_days: config.activity.dormancy_lockout_days,
            curves: config
                .engagement
                .iter()
                .map(|p| (p.segment, ActivityCurve::from(p)))
                .collect(),
        })
    }

    pub fn curve(&self, segment: EngagementSegment) -> ActivityCurve {
        self.curves
            .iter()
            .find(|(s, _)| *s == segment)
            .or_else(|| self.curves.first())
            .map(|(_, c)| *c)
            .unwrap_or(ActivityCurve { early_days: 0, early_probability: 0.0, half_life_days: 1.0, floor: 0.0 })
    }

    /// Run the day pass. `players[i]` is player position `i` in the matrix.
    pub fn schedule(
        &self,
        players: &[PlayerRecord],
        targets: &[u32],
        bank: &RngBank,
    ) -> SimResult<ActivitySchedule> {
        if targets.len() != self.horizon_days as usize {
            return Err(SimError::config(format!(
                "activity: {} targets for a {}-day horizon",
                targets.len(),
                self.horizon_days
            )));
        }

        let n = players.len();
        let curves: Vec<ActivityCurve> = players.iter().map(|p| self.curve(p.engagement)).collect();
        let mut idle_streak = vec![0u32; n];
        let mut locked = vec![false; n];

        let mut arrival_order: Vec<PlayerIdx> = (0..n).collect();
        arrival_order.sort_by_key(|&i| (players[i].creation_day, i));

        let mut next_arrival = 0;
        let mut pool: Vec<PlayerIdx> = Vec::new();
        let mut candidates: Vec<Candidate> = Vec::new();
        let mut daily: Vec<Vec<PlayerIdx>> = Vec::with_capacity(targets.len());
        let mut report = DauReport::default();

        for (day, &target) in targets.iter().enumerate() {
            let day = day as Day;

            while next_arrival < n && players[arrival_order[next_arrival]].creation_day <= day {
                pool.push(arrival_order[next_arrival]);
                next_arrival += 1;
            }
            pool.retain(|&i| !locked[i] && players[i].is_eligible_on(day));

            let mut rng = bank.for_day(StageSlot::Activity, day);
            candidates.clear();
            for &idx in &pool {
                let p = &players[idx];
                let age = day - p.creation_day;
                let probability = curves[idx].probability(age);
                let draw = rng.next_f64();
                candidates.push(Candidate {
                    idx,
                    probability,
                    draw,
                    age,
                    rank: p.engagement.rank(),
                    active: draw < probability,
                });
            }

            let correction = reconcile_day(&mut candidates, target, self.tolerance);

            let mut today = Vec::new();
            for c in &candidates {
                if c.active {
                    idle_streak[c.idx] = 0;
                    today.push(c.idx);
                } else {
                    idle_streak[c.idx] += 1;
                    if self.lockout_days.is_some_and(|limit| idle_streak[c.idx] >= limit) {
                        locked[c.idx] = true;
                    }
                }
            }
            today.sort_unstable();

            let achieved = today.len() as u32;
            let (lower, upper) = tolerance_band(target, self.tolerance);
            let within_tolerance = (lower..=upper).contains(&achieved);
            let shortfall = if within_tolerance { 0 } else { target.saturating_sub(achieved) };

            if shortfall > 0 {
                log::warn!(
                    "day={day} activity: shortfall target={target} achieved={achieved} eligible={}",
                    candidates.len()
                );
            } else {
                log::debug!(
                    "day={day} activity: target={target} sampled={} +{} -{} achieved={achieved}",
                    correction.sampled,
                    correction.activated,
                    correction.deactivated
                );
            }

            report.days.push(DayOutcome {
                day,
                target,
                achieved,
                eligible: candidates.len() as u32,
                sampled: correction.sampled,
                shortfall,
                within_tolerance,
            });
            daily.push(today);
        }

        let matrix = ActivityMatrix::from_daily(n, &daily);
        log::info!(
            "activity: {} player-days over {} days, {} shortfall days",
            matrix.total_player_days(),
            targets.len(),
            report.shortfall_days().count()
        );
        Ok(ActivitySchedule { matrix, report })
    }
}
