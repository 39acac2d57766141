//! Configuration loading and rejection of bad knobs.

use telemetry_core::{
    config::{SessionCountModel, SimConfig},
    engine::SimEngine,
    error::SimError,
    types::EngagementSegment,
};

fn rejects(config: SimConfig) -> String {
    match SimEngine::new(config) {
        Err(SimError::Config { reason }) => reason,
        Err(other) => panic!("expected a config error, got {other}"),
        Ok(_) => panic!("expected a config error, got a working engine"),
    }
}

#[test]
fn defaults_validate() {
    SimConfig::default().validate().unwrap();
    SimConfig::default_test().validate().unwrap();
}

#[test]
fn shipped_config_file_matches_defaults() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../data/generator_config.json");
    let loaded = SimConfig::load(path).unwrap();
    loaded.validate().unwrap();
    assert_eq!(
        serde_json::to_value(&loaded).unwrap(),
        serde_json::to_value(SimConfig::default()).unwrap()
    );
}

#[test]
fn missing_file_is_an_error() {
    assert!(SimConfig::load("/nonexistent/generator_config.json").is_err());
}

#[test]
fn zero_players_rejected() {
    let mut config = SimConfig::default_test();
    config.player_count = 0;
    assert!(rejects(config).contains("player_count"));
}

#[test]
fn zero_horizon_rejected() {
    let mut config = SimConfig::default_test();
    config.horizon_days = 0;
    rejects(config);
}

#[test]
fn peak_below_viable_cohort_rejected() {
    let mut config = SimConfig::default_test();
    config.min_viable_cohort = 50;
    config.peak_dau = 49;
    assert!(rejects(config).contains("minimum viable cohort"));
}

#[test]
fn tolerance_out_of_range_rejected() {
    let mut config = SimConfig::default_test();
    config.activity.dau_tolerance = 1.5;
    rejects(config);
}

#[test]
fn missing_engagement_segment_rejected() {
    let mut config = SimConfig::default_test();
    config.engagement.retain(|p| p.segment != EngagementSegment::Heavy);
    assert!(rejects(config).contains("heavy"));
}

#[test]
fn negative_product_price_rejected() {
    let mut config = SimConfig::default_test();
    config.products[0].price_eur_cents = -1;
    rejects(config);
}

#[test]
fn zero_weight_table_rejected_before_generation() {
    let mut config = SimConfig::default_test();
    for c in &mut config.countries {
        c.weight = 0.0;
    }
    assert!(SimEngine::new(config).unwrap().generate().is_err());
}

#[test]
fn invalid_pareto_session_model_rejected() {
    let mut config = SimConfig::default_test();
    for p in &mut config.engagement {
        if p.segment == EngagementSegment::Heavy {
            p.sessions_per_day = SessionCountModel::Pareto { alpha: 2.0, min: 5, max: 2 };
        }
    }
    rejects(config);
}

#[test]
fn unknown_country_currency_rejected() {
    let mut config = SimConfig::default_test();
    config.countries[0].currency_code = "XXX".into();
    assert!(rejects(config).contains("XXX"));
}
