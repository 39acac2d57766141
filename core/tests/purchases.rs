//! Purchase synthesis: conversion, pricing, currencies and purchase events.

use std::collections::HashMap;
use telemetry_core::{
    config::SimConfig,
    engine::SimEngine,
    event::EventType,
    purchases::PurchaseSynthesizer,
    types::{SpendSegment, Variant},
};

fn whale_heavy_config(seed: u64) -> SimConfig {
    let mut config = SimConfig::default_test();
    config.seed = seed;
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

#[test]
fn prices_and_quantities_are_valid() {
    let data = SimEngine::new(whale_heavy_config(1)).unwrap().generate().unwrap();
    assert!(!data.purchases.is_empty());
    for p in &data.purchases {
        assert!(p.price_eur >= 0 && p.price_local >= 0);
        assert!(p.quantity >= 1);
    }
}

#[test]
fn nonpayers_never_purchase() {
    let data = SimEngine::new(whale_heavy_config(2)).unwrap().generate().unwrap();
    for p in &data.purchases {
        let player = &data.players[p.player_id as usize - 1];
        assert_ne!(player.spend, SpendSegment::Nonpayer, "purchase {}", p.purchase_id);
    }
}

#[test]
fn local_price_uses_player_currency() {
    let config = whale_heavy_config(3);
    let rates: HashMap<&str, f64> = config
        .currencies
        .iter()
        .map(|c| (c.code.as_str(), c.minor_units_per_eur_cent))
        .collect();
    let data = SimEngine::new(config.clone()).unwrap().generate().unwrap();

    for p in &data.purchases {
        let player = &data.players[p.player_id as usize - 1];
        assert_eq!(p.currency_code, player.currency_code);
        assert_eq!(p.country_code, player.country_code);
        let expected = (p.price_eur as f64 * rates[p.currency_code.as_ref()]).round() as i64;
        assert_eq!(p.price_local, expected, "purchase {}", p.purchase_id);
    }
}

#[test]
fn variant_price_multiplier_scales_eur_price() {
    let config = whale_heavy_config(4);
    let data = SimEngine::new(config.clone()).unwrap().generate().unwrap();

    for p in &data.purchases {
        let player = &data.players[p.player_id as usize - 1];
        let product = config
            .products
            .iter()
            .find(|c| c.product_id == p.product_id.as_ref())
            .unwrap();
        let (_, price_mult) = config.experiment.multipliers(player.variant);
        let unit = (product.price_eur_cents as f64 * price_mult).round() as i64;
        assert_eq!(p.price_eur, unit * i64::from(p.quantity));
        assert_eq!(p.grants_soft_amount, product.grants_soft * i64::from(p.quantity));
        assert_eq!(p.grants_hard_amount, product.grants_hard * i64::from(p.quantity));
    }
}

#[test]
fn every_purchase_has_a_matching_event() {
    let data = SimEngine::new(whale_heavy_config(5)).unwrap().generate().unwrap();
    let events: Vec<_> = data
        .events
        .iter()
        .filter(|e| e.event_type == EventType::Purchase)
        .collect();
    assert_eq!(events.len(), data.purchases.len());

    for p in &data.purchases {
        let hit = events.iter().any(|e| {
            e.session_id == Some(p.session_id)
                && e.event_time == p.purchase_time
                && e.soft_currency_purchased == p.grants_soft_amount
                && e.hard_delta == p.grants_hard_amount
        });
        assert!(hit, "purchase {} has no event", p.purchase_id);
    }
}

#[test]
fn conversion_probability_is_capped_at_one() {
    let mut config = SimConfig::default_test();
    for v in &mut config.experiment.variants {
        if v.variant == Variant::A {
            v.purchase_multiplier = 100.0;
        }
    }
    let shop = PurchaseSynthesizer::new(&config).unwrap();
    assert_eq!(shop.conversion_probability(SpendSegment::Whale, Variant::A), 1.0);
    assert_eq!(shop.conversion_probability(SpendSegment::Nonpayer, Variant::A), 0.0);
    assert!((shop.conversion_probability(SpendSegment::Whale, Variant::Control) - 0.2).abs() < 1e-12);
}

#[test]
fn whales_buy_in_bulk_sometimes() {
    let data = SimEngine::new(whale_heavy_config(6)).unwrap().generate().unwrap();
    assert!(data.purchases.iter().any(|p| p.quantity > 1));
    for p in data.purchases.iter().filter(|p| p.quantity > 1) {
        let player = &data.players[p.player_id as usize - 1];
        assert!(matches!(player.spend, SpendSegment::Whale | SpendSegment::Dolphin));
    }
}
