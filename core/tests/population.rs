//! Player population: attributes, segments, variants and churn horizons.

use telemetry_core::{
    clock::SimCalendar,
    config::SimConfig,
    population::{experiment_assignments, PopulationSampler},
    rng::RngBank,
    types::{ChurnHorizon, EngagementSegment, SpendSegment, Variant},
};

fn share<T>(items: &[T], pred: impl Fn(&T) -> bool) -> f64 {
    items.iter().filter(|i| pred(i)).count() as f64 / items.len() as f64
}

#[test]
fn generates_dense_ids_in_order() {
    let config = SimConfig::default_test();
    let players = PopulationSampler::new(&config)
        .unwrap()
        .generate(&RngBank::new(42), config.player_count);
    assert_eq!(players.len(), 1_000);
    for (idx, p) in players.iter().enumerate() {
        assert_eq!(p.player_id as usize, idx + 1);
    }
}

#[test]
fn creation_falls_inside_horizon_and_arrival_windows() {
    let config = SimConfig::default_test();
    let calendar = SimCalendar::new(config.start_date, config.horizon_days);
    let players = PopulationSampler::new(&config)
        .unwrap()
        .generate(&RngBank::new(5), config.player_count);

    for p in &players {
        assert!(p.creation_day < config.horizon_days);
        assert_eq!(calendar.day_of(p.created_at), Some(p.creation_day), "player {}", p.player_id);
    }
    let launch_week = share(&players, |p| p.creation_day <= 3);
    assert!((0.5..0.7).contains(&launch_week), "launch window share {launch_week}");
}

#[test]
fn segment_and_variant_shares_follow_configuration() {
    let mut config = SimConfig::default_test();
    config.player_count = 5_000;
    let players = PopulationSampler::new(&config)
        .unwrap()
        .generate(&RngBank::new(9), config.player_count);

    let casual = share(&players, |p| p.engagement == EngagementSegment::Casual);
    let heavy = share(&players, |p| p.engagement == EngagementSegment::Heavy);
    let nonpayer = share(&players, |p| p.spend == SpendSegment::Nonpayer);
    let control = share(&players, |p| p.variant == Variant::Control);

    assert!((0.66..0.74).contains(&casual), "casual {casual}");
    assert!((0.08..0.12).contains(&heavy), "heavy {heavy}");
    assert!((0.88..0.92).contains(&nonpayer), "nonpayer {nonpayer}");
    assert!((0.46..0.54).contains(&control), "control {control}");
}

#[test]
fn currency_and_campaign_are_consistent() {
    let config = SimConfig::default_test();
    let players = PopulationSampler::new(&config)
        .unwrap()
        .generate(&RngBank::new(21), config.player_count);

    for p in &players {
        let country = config
            .countries
            .iter()
            .find(|c| c.code == p.country_code.as_ref() && c.time_zone_offset == p.time_zone_offset)
            .expect("country comes from the configuration");
        assert_eq!(country.currency_code, p.currency_code.as_ref());
        if p.acquisition_channel.as_ref() == "Organic" {
            assert!(p.acquisition_campaign.is_none());
        } else {
            assert!(p.acquisition_campaign.is_some());
        }
        assert!(p.device_model.starts_with(&*p.platform));
    }
}

#[test]
fn heavy_players_are_more_often_core() {
    let mut config = SimConfig::default_test();
    config.player_count = 5_000;
    let players = PopulationSampler::new(&config)
        .unwrap()
        .generate(&RngBank::new(13), config.player_count);

    let core_share = |seg: EngagementSegment| {
        let cohort: Vec<_> = players.iter().filter(|p| p.engagement == seg).collect();
        share(&cohort, |p| p.churn_horizon == ChurnHorizon::Never)
    };
    assert!(core_share(EngagementSegment::Heavy) > core_share(EngagementSegment::Casual));
}

#[test]
fn sampling_a_player_is_independent_of_population_size() {
    let config = SimConfig::default_test();
    let sampler = PopulationSampler::new(&config).unwrap();
    let bank = RngBank::new(77);
    let small = sampler.generate(&bank, 10);
    let large = sampler.generate(&bank, 500);
    assert_eq!(small[..], large[..10]);
    assert_eq!(sampler.sample_player(&bank, 7), large[6]);
}

#[test]
fn one_assignment_per_player_at_creation() {
    let config = SimConfig::default_test();
    let players = PopulationSampler::new(&config)
        .unwrap()
        .generate(&RngBank::new(3), config.player_count);
    let assignments = experiment_assignments(&config.experiment.name, &players);

    assert_eq!(assignments.len(), players.len());
    for (a, p) in assignments.iter().zip(&players) {
        assert_eq!(a.player_id, p.player_id);
        assert_eq!(a.variant, p.variant);
        assert_eq!(a.assigned_at, p.created_at);
        assert_eq!(a.experiment_name.as_ref(), "shop_pricing_v1");
    }
}
