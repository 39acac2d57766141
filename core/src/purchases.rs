//! In-app purchase synthesis.
//!
//! Each session independently converts with the player's spend-segment
//! probability scaled by the experiment arm. A converted session gets one
//! purchase row plus a matching `purchase` event inside the session.

use crate::{
    config::{ExperimentConfig, SimConfig},
    error::{SimError, SimResult},
    event::{EventRecord, EventType},
    population::PlayerRecord,
    rng::{RngBank, StageSlot, SubsystemRng},
    sampler::WeightedTable,
    sessions::PlayerTimeline,
    types::{PlayerId, ProductType, PurchaseId, SessionId, SpendSegment, Variant},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseRecord {
    pub purchase_id: PurchaseId,
    pub player_id: PlayerId,
    pub session_id: SessionId,
    pub purchase_time: DateTime<Utc>,
    pub product_id: Arc<str>,
    pub product_type: ProductType,
    pub currency_code: Arc<str>,
    /// Total charged in the local currency's minor units.
    pub price_local: i64,
    /// Total charged in EUR cents.
    pub price_eur: i64,
    pub quantity: u32,
    pub grants_soft_amount: i64,
    pub grants_hard_amount: i64,
    pub platform: Arc<str>,
    pub country_code: Arc<str>,
}

#[derive(Debug, Clone)]
struct Product {
    product_id: Arc<str>,
    product_type: ProductType,
    price_eur_cents: i64,
    grants_soft: i64,
    grants_hard: i64,
}

#[derive(Debug, Clone, Copy)]
struct SpendBehaviour {
    probability: f64,
    bulk_probability: f64,
    max_quantity: u32,
}

pub struct PurchaseSynthesizer {
    catalogue: WeightedTable<Product>,
    rates: Vec<(Arc<str>, f64)>,
    spend: Vec<(SpendSegment, SpendBehaviour)>,
    experiment: ExperimentConfig,
}

impl PurchaseSynthesizer {
    pub fn new(config: &SimConfig) -> SimResult<Self> {
        config.validate()?;
        let catalogue = WeightedTable::new(
            config.products.iter().map(|p| {
                let product = Product {
                    product_id: Arc::from(p.product_id.as_str()),
                    product_type: p.product_type,
                    price_eur_cents: p.price_eur_cents,
                    grants_soft: p.grants_soft,
                    grants_hard: p.grants_hard,
                };
                (product, p.weight)
            }),
            "products",
        )?;
        Ok(Self {
            catalogue,
            rates: config
                .currencies
                .iter()
                .map(|c| (Arc::from(c.code.as_str()), c.minor_units_per_eur_cent))
                .collect(),
            spend: config
                .spend
                .iter()
                .map(|s| {
                    let behaviour = SpendBehaviour {
                        probability: s.purchase_probability_per_session,
                        bulk_probability: s.bulk_purchase_probability,
                        max_quantity: s.max_quantity,
                    };
                    (s.segment, behaviour)
                })
                .collect(),
            experiment: config.experiment.clone(),
        })
    }

    /// Per-session conversion probability for a player, capped at 1.
    pub fn conversion_probability(&self, spend: SpendSegment, variant: Variant) -> f64 {
        let base = self.behaviour(spend).map_or(0.0, |b| b.probability);
        let (purchase_mult, _) = self.experiment.multipliers(variant);
        (base * purchase_mult).clamp(0.0, 1.0)
    }

    fn behaviour(&self, spend: SpendSegment) -> Option<SpendBehaviour> {
        self.spend.iter().find(|(s, _)| *s == spend).map(|(_, b)| *b)
    }

    fn rate(&self, currency: &str) -> SimResult<f64> {
        self.rates
            .iter()
            .find(|(code, _)| code.as_ref() == currency)
            .map(|(_, r)| *r)
            .ok_or_else(|| SimError::config(format!("no exchange rate for currency {currency}")))
    }

    /// Draw purchases for every session of one player and append the
    /// matching events to the timeline, keeping events in time order.
    /// Purchase ids are player-local ordinals.
    pub fn synthesize_player(
        &self,
        bank: &RngBank,
        player: &PlayerRecord,
        timeline: &mut PlayerTimeline,
    ) -> SimResult<Vec<PurchaseRecord>> {
        let probability = self.conversion_probability(player.spend, player.variant);
        if probability <= 0.0 || timeline.sessions.is_empty() {
            return Ok(Vec::new());
        }
        let Some(behaviour) = self.behaviour(player.spend) else {
            return Ok(Vec::new());
        };
        let (_, price_mult) = self.experiment.multipliers(player.variant);
        let rate = self.rate(&player.currency_code)?;

        let mut rng = bank.for_player(StageSlot::Purchases, player.player_id);
        let mut last_event = vec![None; timeline.sessions.len()];
        for e in &timeline.events {
            if let Some(slot) = e.session_id.and_then(|s| last_event.get_mut(s as usize)) {
                *slot = Some(e.event_time);
            }
        }

        let mut purchases = Vec::new();
        let mut events = Vec::new();
        for (session, last) in timeline.sessions.iter().zip(&last_event) {
            if !rng.chance(probability) {
                continue;
            }
            let product = self.catalogue.sample(&mut rng);
            let quantity = draw_quantity(&mut rng, behaviour);

            let after = last.unwrap_or(session.start);
            let window = (session.end - after).num_seconds().max(0);
            let purchase_time = after + chrono::Duration::seconds(rng.range_inclusive(0, window));

            let unit_eur = (product.price_eur_cents as f64 * price_mult).round() as i64;
            let price_eur = unit_eur * i64::from(quantity);
            let price_local = (price_eur as f64 * rate).round() as i64;
            let grants_soft = product.grants_soft * i64::from(quantity);
            let grants_hard = product.grants_hard * i64::from(quantity);
            let purchase_id = purchases.len() as PurchaseId;

            let mut event = EventRecord::new(
                player.player_id,
                session.session_id,
                purchase_time,
                EventType::Purchase,
                session.end_level,
            );
            event.soft_currency_purchased = grants_soft;
            event.hard_delta = grants_hard;
            event.metadata = json!({
                "product_id": product.product_id.as_ref(),
                "quantity": quantity,
                "currency_code": player.currency_code.as_ref(),
                "price_local": price_local,
            });
            events.push(event);

            purchases.push(PurchaseRecord {
                purchase_id,
                player_id: player.player_id,
                session_id: session.session_id,
                purchase_time,
                product_id: product.product_id.clone(),
                product_type: product.product_type,
                currency_code: player.currency_code.clone(),
                price_local,
                price_eur,
                quantity,
                grants_soft_amount: grants_soft,
                grants_hard_amount: grants_hard,
                platform: player.platform.clone(),
                country_code: player.country_code.clone(),
            });
        }

        if !events.is_empty() {
            timeline.events.extend(events);
            // Stable: equal timestamps keep gameplay events ahead of the purchase.
            timeline.events.sort_by_key(|e| (e.session_id, e.event_time));
        }
        Ok(purchases)
    }
}

fn draw_quantity(rng: &mut SubsystemRng, behaviour: SpendBehaviour) -> u32 {
    if behaviour.max_quantity >= 2 && rng.chance(behaviour.bulk_probability) {
        rng.range_inclusive(2, i64::from(behaviour.max_quantity)) as u32
    } else {
        1
    }
}
