//! Attribute sampler and segment assigner.
//!
//! Every player is drawn from its own (population, player_id) stream and
//! reads nothing but the compiled distributions, so the whole population
//! is generated in parallel and is identical on every run.

use crate::{
    clock::{SimCalendar, SECONDS_PER_DAY},
    config::{EngagementProfile, SimConfig},
    error::SimResult,
    rng::{RngBank, StageSlot, SubsystemRng},
    sampler::WeightedTable,
    types::{ChurnHorizon, Day, EngagementSegment, PlayerId, SpendSegment, Variant},
};
use chrono::{DateTime, Utc};
use rayon::prelude::*;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub struct PlayerRecord {
    pub player_id: PlayerId,
    pub created_at: DateTime<Utc>,
    pub creation_day: Day,
    pub country_code: Arc<str>,
    pub time_zone_offset: i32,
    pub currency_code: Arc<str>,
    pub language_code: Arc<str>,
    pub platform: Arc<str>,
    pub device_model: Arc<str>,
    pub os_version: Arc<str>,
    pub acquisition_channel: Arc<str>,
    pub acquisition_campaign: Option<Arc<str>>,
    pub engagement: EngagementSegment,
    pub spend: SpendSegment,
    pub variant: Variant,
    pub churn_horizon: ChurnHorizon,
}

impl PlayerRecord {
    /// `UTC+9`, `UTC-5`, `UTC+0`.
    pub fn time_zone_label(&self) -> String {
        format!("UTC{:+}", self.time_zone_offset)
    }

    pub fn is_eligible_on(&self, day: Day) -> bool {
        self.churn_horizon.covers(self.creation_day, day)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExperimentAssignment {
    pub experiment_name: Arc<str>,
    pub player_id: PlayerId,
    pub variant: Variant,
    pub assigned_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct CountryProfile {
    code: Arc<str>,
    time_zone_offset: i32,
    currency_code: Arc<str>,
    languages: WeightedTable<Arc<str>>,
}

#[derive(Debug, Clone)]
struct PlatformProfile {
    name: Arc<str>,
    device_models: WeightedTable<Arc<str>>,
    os_versions: WeightedTable<Arc<str>>,
}

#[derive(Debug, Clone)]
struct ChannelProfile {
    name: Arc<str>,
    campaigns: Option<WeightedTable<Arc<str>>>,
}

#[derive(Debug, Clone, Copy)]
struct LifetimeModel {
    core_share: f64,
    mean_days: f64,
    min_days: u32,
}

impl From<&EngagementProfile> for LifetimeModel {
    fn from(p: &EngagementProfile) -> Self {
        Self {
            core_share: p.core_share,
            mean_days: p.mean_lifetime_days,
            min_days: p.min_lifetime_days,
        }
    }
}

fn arc_table(choices: &[crate::config::WeightedChoice<String>], what: &str) -> SimResult<WeightedTable<Arc<str>>> {
    WeightedTable::new(choices.iter().map(|c| (Arc::<str>::from(c.value.as_str()), c.weight)), what)
}

pub struct PopulationSampler {
    calendar: SimCalendar,
    creation_jitter_secs: i64,
    arrivals: WeightedTable<(Day, Day)>,
    countries: WeightedTable<CountryProfile>,
    platforms: WeightedTable<PlatformProfile>,
    channels: WeightedTable<ChannelProfile>,
    engagement: WeightedTable<EngagementSegment>,
    spend: WeightedTable<SpendSegment>,
    variants: WeightedTable<Variant>,
    lifetimes: Vec<(EngagementSegment, LifetimeModel)>,
}

impl PopulationSampler {
    /// Compile every population distribution. Fails on any empty or
    /// zero-weight table before a single player is generated.
    pub fn new(config: &SimConfig) -> SimResult<Self> {
        config.validate()?;
        let last_day = config.horizon_days - 1;

        let arrivals = WeightedTable::new(
            config
                .arrivals
                .iter()
                .filter(|a| a.first_day <= last_day)
                .map(|a| ((a.first_day, a.last_day.min(last_day)), a.share)),
            "arrivals",
        )?;

        let mut countries = Vec::with_capacity(config.countries.len());
        for c in &config.countries {
            let profile = CountryProfile {
                code: Arc::from(c.code.as_str()),
                time_zone_offset: c.time_zone_offset,
                currency_code: Arc::from(c.currency_code.as_str()),
                languages: arc_table(&c.languages, &format!("countries[{}].languages", c.code))?,
            };
            countries.push((profile, c.weight));
        }

        let mut platforms = Vec::with_capacity(config.platforms.len());
        for p in &config.platforms {
            let profile = PlatformProfile {
                name: Arc::from(p.name.as_str()),
                device_models: arc_table(&p.device_models, &format!("platforms[{}].device_models", p.name))?,
                os_versions: arc_table(&p.os_versions, &format!("platforms[{}].os_versions", p.name))?,
            };
            platforms.push((profile, p.weight));
        }

        let mut channels = Vec::with_capacity(config.channels.len());
        for ch in &config.channels {
            let campaigns = if ch.campaigns.is_empty() {
                None
            } else {
                Some(arc_table(&ch.campaigns, &format!("channels[{}].campaigns", ch.name))?)
            };
            channels.push((ChannelProfile { name: Arc::from(ch.name.as_str()), campaigns }, ch.weight));
        }

        Ok(Self {
            calendar: SimCalendar::new(config.start_date, config.horizon_days),
            creation_jitter_secs: (i64::from(config.creation_jitter_hours) * 3_600).min(SECONDS_PER_DAY - 1),
            arrivals,
            countries: WeightedTable::new(countries, "countries")?,
            platforms: WeightedTable::new(platforms, "platforms")?,
            channels: WeightedTable::new(channels, "channels")?,
            engagement: WeightedTable::new(config.engagement.iter().map(|p| (p.segment, p.share)), "engagement")?,
            spend: WeightedTable::new(config.spend.iter().map(|p| (p.segment, p.share)), "spend")?,
            variants: WeightedTable::new(
                config.experiment.variants.iter().map(|v| (v.variant, v.weight)),
                "experiment.variants",
            )?,
            lifetimes: config.engagement.iter().map(|p| (p.segment, LifetimeModel::from(p))).collect(),
        })
    }

    /// Generate players `1..=count` in id order.
    pub fn generate(&self, bank: &RngBank, count: u32) -> Vec<PlayerRecord> {
        let players: Vec<PlayerRecord> = (1..=count)
            .into_par_iter()
            .map(|player_id| self.sample_player(bank, player_id))
            .collect();
        log::info!("population: sampled {} players", players.len());
        players
    }

    pub fn sample_player(&self, bank: &RngBank, player_id: PlayerId) -> PlayerRecord {
        let mut rng = bank.for_player(StageSlot::Population, player_id);

        let (first, last) = *self.arrivals.sample(&mut rng);
        let creation_day = rng.range_inclusive(i64::from(first), i64::from(last)) as Day;
        let jitter = rng.range_inclusive(0, self.creation_jitter_secs);
        let created_at = self.calendar.at(creation_day, jitter);

        let country = self.countries.sample(&mut rng);
        let language = country.languages.sample(&mut rng).clone();
        let platform = self.platforms.sample(&mut rng);
        let device_model = platform.device_models.sample(&mut rng).clone();
        let os_version = platform.os_versions.sample(&mut rng).clone();
        let channel = self.channels.sample(&mut rng);
        let campaign = channel.campaigns.as_ref().map(|t| t.sample(&mut rng).clone());

        let engagement = *self.engagement.sample(&mut rng);
        let spend = *self.spend.sample(&mut rng);
        let variant = *self.variants.sample(&mut rng);
        let churn_horizon = self.draw_churn_horizon(engagement, &mut rng);

        PlayerRecord {
            player_id,
            created_at,
            creation_day,
            country_code: country.code.clone(),
            time_zone_offset: country.time_zone_offset,
            currency_code: country.currency_code.clone(),
            language_code: language,
            platform: platform.name.clone(),
            device_model,
            os_version,
            acquisition_channel: channel.name.clone(),
            acquisition_campaign: campaign,
            engagement,
            spend,
            variant,
            churn_horizon,
        }
    }

    fn draw_churn_horizon(&self, segment: EngagementSegment, rng: &mut SubsystemRng) -> ChurnHorizon {
        let model = self
            .lifetimes
            .iter()
            .find(|(s, _)| *s == segment)
            .or_else(|| self.lifetimes.first())
            .map(|(_, m)| *m);
        let Some(model) = model else {
            return ChurnHorizon::Never;
        };

        if rng.chance(model.core_share) {
            return ChurnHorizon::Never;
        }
        let extra = rng.exponential(model.mean_days).floor();
        let days = (f64::from(model.min_days) + extra).min(f64::from(u32::MAX));
        ChurnHorizon::Days(days as u32)
    }
}

/// One assignment per player, fixed at creation.
pub fn experiment_assignments(experiment_name: &str, players: &[PlayerRecord]) -> Vec<ExperimentAssignment> {
    let name: Arc<str> = Arc::from(experiment_name);
    players
        .iter()
        .map(|p| ExperimentAssignment {
            experiment_name: name.clone(),
            player_id: p.player_id,
            variant: p.variant,
            assigned_at: p.created_at,
        })
        .collect()
}
