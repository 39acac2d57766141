//! End-to-end scenarios on small populations with high-propensity whales.

use std::collections::HashMap;
use telemetry_core::{
    config::SimConfig,
    engine::SimEngine,
    store::SimStore,
    types::SpendSegment,
};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// 30 days, 1 000 players, peak DAU 500, whales buy in half their sessions.
fn whale_scenario(seed: u64) -> SimConfig {
    let mut config = SimConfig::default_test();
    config.seed = seed;
    config.horizon_days = 30;
    config.player_count = 1_000;
    config.peak_dau = 500;
    for s in &mut config.spend {
        if s.segment == SpendSegment::Whale {
            s.purchase_probability_per_session = 0.5;
        }
    }
    config
}

/// Same scenario with half the population made whales.
fn whale_heavy_scenario(seed: u64) -> SimConfig {
    let mut config = whale_scenario(seed);
    for s in &mut config.spend {
        s.share = match s.segment {
            SpendSegment::Nonpayer => 0.40,
            SpendSegment::Minnow   => 0.08,
            SpendSegment::Dolphin  => 0.02,
            SpendSegment::Whale    => 0.50,
        };
    }
    config
}

const SEEDS: [u64; 8] = [1, 2, 3, 4, 5, 6, 7, 42];

fn written_store(config: SimConfig) -> SimStore {
    let engine = SimEngine::new(config).unwrap();
    let mut store = SimStore::in_memory().unwrap();
    store.migrate().unwrap();
    engine.run_into(&mut store).unwrap();
    store
}

/// Mean daily revenue on the busiest and the quietest third of days.
fn revenue_by_dau_third(store: &SimStore) -> (f64, f64) {
    let dau: Vec<(String, i64)> = store
        .daily_active_users()
        .unwrap()
        .into_iter()
        .map(|r| (r.period, r.count))
        .collect();
    let revenue: HashMap<String, i64> = store
        .daily_revenue()
        .unwrap()
        .into_iter()
        .map(|r| (r.period, r.revenue_eur_cents))
        .collect();

    let mut ranked = dau;
    ranked.sort_by_key(|(_, n)| std::cmp::Reverse(*n));
    let third = ranked.len() / 3;
    let mean_revenue = |days: &[(String, i64)]| {
        days.iter().map(|(d, _)| revenue.get(d).copied().unwrap_or(0)).sum::<i64>() as f64 / days.len() as f64
    };
    (mean_revenue(&ranked[..third]), mean_revenue(&ranked[ranked.len() - third..]))
}

#[test]
fn revenue_is_higher_on_high_dau_days_on_average() {
    init_logging();
    let (mut high, mut low) = (0.0, 0.0);
    for seed in SEEDS {
        let (h, l) = revenue_by_dau_third(&written_store(whale_scenario(seed)));
        high += h;
        low += l;
    }
    let runs = SEEDS.len() as f64;
    assert!(high / runs > low / runs, "high-DAU days earn {}, low-DAU days {}", high / runs, low / runs);
}

#[test]
fn launch_cohort_day_one_retention_is_partial() {
    init_logging();
    for seed in SEEDS {
        let store = written_store(whale_scenario(seed));
        let cohorts = store.cohort_retention().unwrap();
        let launch = cohorts.iter().find(|c| c.cohort == "2025-01-01").expect("launch cohort");
        assert!(launch.cohort_size > 0);
        let d1 = launch.d1();
        assert!(d1 > 0.0 && d1 < 1.0, "seed {seed}: D1 retention {d1}");
        assert!(launch.d30() <= launch.d1() || launch.day30_active == 0);
    }
}

#[test]
fn whale_heavy_population_spends_more_than_default() {
    let whales = SimEngine::new(whale_heavy_scenario(42)).unwrap().generate().unwrap();
    let baseline = SimEngine::build_test(42).unwrap().generate().unwrap();
    let total = |d: &telemetry_core::engine::GeneratedDataset| d.purchases.iter().map(|p| p.price_eur).sum::<i64>();
    assert!(total(&whales) > total(&baseline));
}

#[test]
fn full_scenario_passes_every_invariant() {
    init_logging();
    let data = SimEngine::new(whale_scenario(42)).unwrap().generate().unwrap();
    data.validate().unwrap();
    assert!(data.report.days.iter().any(|d| d.within_tolerance));
}
