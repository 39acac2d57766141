//! Activity scheduler: reconciliation with the DAU curve, churn horizons,
//! and the per-day correction pass.

use telemetry_core::{
    activity::{reconcile_day, tolerance_band, ActivityCurve, ActivityScheduler, Candidate},
    config::SimConfig,
    dau_curve::DauCurveGenerator,
    engine::SimEngine,
    population::PopulationSampler,
    rng::{RngBank, StageSlot},
    store::SimStore,
    types::ChurnHorizon,
};

fn candidate(idx: usize, probability: f64, draw: f64, age: u32) -> Candidate {
    Candidate { idx, probability, draw, age, rank: 0, active: draw < probability }
}

#[test]
fn activity_probability_never_increases_with_age() {
    let config = SimConfig::default();
    for profile in &config.engagement {
        let curve = ActivityCurve::from(profile);
        let mut prev = curve.probability(0);
        for age in 1..365 {
            let p = curve.probability(age);
            assert!(p <= prev, "{:?}: p({age})={p} > p({})={prev}", profile.segment, age - 1);
            assert!(p >= curve.floor, "{:?}: p({age}) below floor", profile.segment);
            prev = p;
        }
    }
}

#[test]
fn tolerance_band_brackets_target() {
    assert_eq!(tolerance_band(1000, 0.01), (990, 1010));
    assert_eq!(tolerance_band(0, 0.01), (0, 0));
    assert_eq!(tolerance_band(7, 0.0), (7, 7));
    let (lo, hi) = tolerance_band(333, 0.05);
    assert!(lo <= 333 && 333 <= hi);
}

#[test]
fn short_day_activates_most_likely_candidates_first() {
    let mut day = vec![
        candidate(0, 0.2, 0.9, 10),
        candidate(1, 0.9, 0.95, 1),
        candidate(2, 0.5, 0.6, 4),
        candidate(3, 0.9, 0.1, 1), // already active
    ];
    let c = reconcile_day(&mut day, 3, 0.0);
    assert_eq!(c.sampled, 1);
    assert_eq!(c.activated, 2);
    assert!(day[1].active && day[2].active && day[3].active);
    assert!(!day[0].active, "least likely candidate must stay inactive");
}

#[test]
fn over_day_deactivates_least_likely_activations_first() {
    let mut day = vec![
        candidate(0, 0.9, 0.1, 1),
        candidate(1, 0.3, 0.1, 20),
        candidate(2, 0.6, 0.1, 5),
        candidate(3, 0.95, 0.5, 0),
    ];
    let c = reconcile_day(&mut day, 2, 0.0);
    assert_eq!(c.sampled, 4);
    assert_eq!(c.deactivated, 2);
    assert!(day[0].active && day[3].active);
    assert!(!day[1].active && !day[2].active);
}

#[test]
fn correction_never_exceeds_pool() {
    let mut day = vec![candidate(0, 0.1, 0.5, 3), candidate(1, 0.1, 0.7, 3)];
    let c = reconcile_day(&mut day, 100, 0.01);
    assert_eq!(c.activated, 2);
    assert!(day.iter().all(|c| c.active));
}

#[test]
fn achieved_dau_stays_in_band_whenever_pool_allows() {
    let config = SimConfig::default_test();
    let bank = RngBank::new(config.seed);
    let players = PopulationSampler::new(&config).unwrap().generate(&bank, config.player_count);
    let targets = DauCurveGenerator::new(&config)
        .unwrap()
        .generate(&mut bank.for_stage(StageSlot::DauCurve))
        .unwrap();
    let schedule = ActivityScheduler::new(&config).unwrap().schedule(&players, &targets, &bank).unwrap();

    assert_eq!(schedule.report.days.len(), targets.len());
    let counts = schedule.matrix.daily_counts(config.horizon_days);
    for day in &schedule.report.days {
        assert_eq!(counts[day.day as usize], day.achieved, "matrix and report disagree on day {}", day.day);
        assert!(day.achieved <= day.eligible);
        let (lo, hi) = tolerance_band(day.target, config.activity.dau_tolerance);
        if day.eligible >= hi {
            assert!(
                (lo..=hi).contains(&day.achieved),
                "day {}: achieved {} outside [{lo}, {hi}]",
                day.day,
                day.achieved
            );
            assert!(day.within_tolerance);
            assert_eq!(day.shortfall, 0);
        } else if day.achieved < lo {
            assert_eq!(day.achieved, day.eligible, "day {}: pool not exhausted", day.day);
            assert_eq!(day.shortfall, day.target - day.achieved);
        }
    }
}

#[test]
fn nobody_is_active_outside_their_churn_horizon() {
    let config = SimConfig::default_test();
    let bank = RngBank::new(7);
    let players = PopulationSampler::new(&config).unwrap().generate(&bank, config.player_count);
    let targets = vec![config.peak_dau; config.horizon_days as usize];
    let schedule = ActivityScheduler::new(&config).unwrap().schedule(&players, &targets, &bank).unwrap();

    for (idx, player) in players.iter().enumerate() {
        let days = schedule.matrix.active_days(idx);
        assert!(days.windows(2).all(|w| w[0] < w[1]), "active days must be strictly ordered");
        for &d in days {
            assert!(
                player.is_eligible_on(d),
                "player {} active on day {d} outside horizon {:?} from day {}",
                player.player_id,
                player.churn_horizon,
                player.creation_day
            );
        }
    }
}

#[test]
fn zero_churn_horizon_means_no_activity() {
    let config = SimConfig::default_test();
    let bank = RngBank::new(11);
    let mut players = PopulationSampler::new(&config).unwrap().generate(&bank, config.player_count);
    players[0].churn_horizon = ChurnHorizon::Days(0);

    // Targets far above the pool force the correction pass to activate everyone it can.
    let targets = vec![config.player_count; config.horizon_days as usize];
    let schedule = ActivityScheduler::new(&config).unwrap().schedule(&players, &targets, &bank).unwrap();

    assert!(schedule.matrix.active_days(0).is_empty());
    assert!(schedule.report.shortfall_days().count() > 0);
}

#[test]
fn zero_churn_horizon_produces_no_sessions_events_or_purchases() {
    let mut config = SimConfig::default_test();
    for profile in &mut config.engagement {
        profile.core_share = 0.0;
        profile.min_lifetime_days = 0;
        profile.mean_lifetime_days = 0.0;
    }
    let engine = SimEngine::new(config).unwrap();
    let mut store = SimStore::in_memory().unwrap();
    store.migrate().unwrap();
    let data = engine.run_into(&mut store).unwrap();

    assert!(data.players.iter().all(|p| p.churn_horizon == ChurnHorizon::Days(0)));
    assert_eq!(data.activity.total_player_days(), 0);
    assert!(data.sessions.is_empty());
    assert!(data.events.is_empty());
    assert!(data.purchases.is_empty());
    assert!(data.report.days.iter().all(|d| d.achieved == 0 && d.eligible == 0));

    assert_eq!(store.table_count("sessions").unwrap(), 0);
    assert_eq!(store.table_count("events").unwrap(), 0);
    assert_eq!(store.table_count("purchases").unwrap(), 0);
    assert_eq!(store.table_count("players").unwrap(), data.players.len() as i64);
}

#[test]
fn small_pool_records_shortfall_without_failing() {
    let mut config = SimConfig::default_test();
    config.player_count = 50;
    config.min_viable_cohort = 1;
    let bank = RngBank::new(3);
    let players = PopulationSampler::new(&config).unwrap().generate(&bank, config.player_count);
    let targets = vec![400; config.horizon_days as usize];
    let schedule = ActivityScheduler::new(&config).unwrap().schedule(&players, &targets, &bank).unwrap();

    assert_eq!(schedule.report.shortfall_days().count(), targets.len());
    assert!(schedule.report.total_shortfall() > 0);
    assert!(schedule.report.days.iter().all(|d| !d.within_tolerance));
}

#[test]
fn wrong_target_length_is_rejected() {
    let config = SimConfig::default_test();
    let bank = RngBank::new(1);
    let players = PopulationSampler::new(&config).unwrap().generate(&bank, 10);
    let result = ActivityScheduler::new(&config).unwrap().schedule(&players, &[10, 10], &bank);
    assert!(result.is_err());
}
