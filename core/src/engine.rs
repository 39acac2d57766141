//! The generation engine: runs every stage in a fixed order.
//!
//! EXECUTION ORDER (fixed, never reordered):
//!   1. Population   (parallel per player)
//!   2. DAU curve
//!   3. Activity     (sequential over days)
//!   4. Sessions, events and purchases (parallel per player)
//!   5. Teams
//!
//! RULES:
//!   - All randomness flows through the RngBank.
//!   - Parallel stages read only immutable inputs and a per-player stream;
//!     results are collected in player order, then ids are assigned.
//!   - Nothing is written until the whole dataset passes the invariants.

use crate::{
    activity::{ActivityMatrix, ActivityScheduler, DauReport},
    config::SimConfig,
    dau_curve::DauCurveGenerator,
    error::SimResult,
    event::EventRecord,
    invariants,
    population::{experiment_assignments, ExperimentAssignment, PlayerRecord, PopulationSampler},
    purchases::{PurchaseRecord, PurchaseSynthesizer},
    rng::{RngBank, StageSlot},
    sessions::{PlayerTimeline, SessionRecord, SessionSynthesizer},
    store::SimStore,
    teams::{MembershipRecord, TeamBuilder, TeamRecord},
};
use chrono::NaiveDate;
use rayon::prelude::*;

/// Everything one run produces, ready to be validated and written.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedDataset {
    pub seed: u64,
    pub start_date: NaiveDate,
    pub dau_targets: Vec<u32>,
    pub players: Vec<PlayerRecord>,
    pub activity: ActivityMatrix,
    pub report: DauReport,
    pub teams: Vec<TeamRecord>,
    pub memberships: Vec<MembershipRecord>,
    pub sessions: Vec<SessionRecord>,
    pub events: Vec<EventRecord>,
    pub purchases: Vec<PurchaseRecord>,
    pub assignments: Vec<ExperimentAssignment>,
}

impl GeneratedDataset {
    pub fn validate(&self) -> SimResult<()> {
        invariants::validate_dataset(self)
    }

    /// Distinct active players per day derived from the session rows.
    pub fn dau_from_sessions(&self) -> Vec<u32> {
        let mut counts = vec![0u32; self.dau_targets.len()];
        let mut last: Option<(u32, u32)> = None;
        for s in &self.sessions {
            if last != Some((s.player_id, s.day)) {
                if let Some(c) = counts.get_mut(s.day as usize) {
                    *c += 1;
                }
                last = Some((s.player_id, s.day));
            }
        }
        counts
    }
}

/// Next free id per entity. Player-local ordinals are shifted by these.
#[derive(Debug, Default)]
struct IdCursor {
    sessions: u64,
    events: u64,
    matches: u64,
    purchases: u64,
}

pub struct SimEngine {
    pub config: SimConfig,
    pub rng_bank: RngBank,
}

impl SimEngine {
    /// Validate the configuration up front; no stage runs on bad knobs.
    pub fn new(config: SimConfig) -> SimResult<Self> {
        config.validate()?;
        let rng_bank = RngBank::new(config.seed);
        Ok(Self { config, rng_bank })
    }

    /// Small fast engine for tests.
    pub fn build_test(seed: u64) -> SimResult<Self> {
        let mut config = SimConfig::default_test();
        config.seed = seed;
        Self::new(config)
    }

    pub fn generate(&self) -> SimResult<GeneratedDataset> {
        let bank = &self.rng_bank;
        let config = &self.config;

        // ── 1. Population ───────────────────────────────
        let players = PopulationSampler::new(config)?.generate(bank, config.player_count);

        // ── 2. DAU curve ────────────────────────────────
        let mut curve_rng = bank.for_stage(StageSlot::DauCurve);
        let dau_targets = DauCurveGenerator::new(config)?.generate(&mut curve_rng)?;

        // ── 3. Activity ─────────────────────────────────
        let schedule = ActivityScheduler::new(config)?.schedule(&players, &dau_targets, bank)?;

        // ── 4. Sessions, events, purchases ──────────────
        let sessions = SessionSynthesizer::new(config)?;
        let shop = PurchaseSynthesizer::new(config)?;
        let per_player: Vec<SimResult<(PlayerTimeline, Vec<PurchaseRecord>)>> = players
            .par_iter()
            .enumerate()
            .map(|(idx, player)| {
                let mut timeline = sessions.synthesize_player(bank, player, schedule.matrix.active_days(idx));
                let purchases = shop.synthesize_player(bank, player, &mut timeline)?;
                Ok((timeline, purchases))
            })
            .collect();

        let mut ids = IdCursor::default();
        let mut all_sessions = Vec::new();
        let mut all_events = Vec::new();
        let mut all_purchases = Vec::new();
        for result in per_player {
            let (timeline, purchases) = result?;
            rebase_player(&mut ids, timeline, purchases, &mut all_sessions, &mut all_events, &mut all_purchases);
        }
        log::info!(
            "sessions: {} sessions, {} events, {} matches, {} purchases",
            all_sessions.len(),
            all_events.len(),
            ids.matches,
            all_purchases.len()
        );

        // ── 5. Teams ────────────────────────────────────
        let roster = TeamBuilder::new(config)?.build(bank, &players);

        let assignments = experiment_assignments(&config.experiment.name, &players);

        Ok(GeneratedDataset {
            seed: config.seed,
            start_date: config.start_date,
            dau_targets,
            players,
            activity: schedule.matrix,
            report: schedule.report,
            teams: roster.teams,
            memberships: roster.memberships,
            sessions: all_sessions,
            events: all_events,
            purchases: all_purchases,
            assignments,
        })
    }

    /// Generate, validate and write in one call.
    pub fn run_into(&self, store: &mut SimStore) -> SimResult<GeneratedDataset> {
        let dataset = self.generate()?;
        store.write_dataset(&dataset)?;
        Ok(dataset)
    }
}

fn rebase_player(
    ids: &mut IdCursor,
    timeline: PlayerTimeline,
    purchases: Vec<PurchaseRecord>,
    sessions_out: &mut Vec<SessionRecord>,
    events_out: &mut Vec<EventRecord>,
    purchases_out: &mut Vec<PurchaseRecord>,
) {
    let session_base = ids.sessions + 1;
    let match_base = ids.matches + 1;

    for mut s in timeline.sessions {
        s.session_id += session_base;
        ids.sessions += 1;
        sessions_out.push(s);
    }
    for mut e in timeline.events {
        ids.events += 1;
        e.event_id = ids.events;
        e.session_id = e.session_id.map(|s| s + session_base);
        e.match_id = e.match_id.map(|m| m + match_base);
        events_out.push(e);
    }
    ids.matches += timeline.matches;
    for mut p in purchases {
        ids.purchases += 1;
        p.purchase_id = ids.purchases;
        p.session_id += session_base;
        purchases_out.push(p);
    }
}
