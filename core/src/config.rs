use crate::{
    error::{SimError, SimResult},
    types::{Day, EngagementSegment, MatchOutcome, ProductType, SpendSegment, Variant},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One entry of a configured categorical distribution.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WeightedChoice<T> {
    pub value: T,
    pub weight: f64,
}

fn choice<T>(value: T, weight: f64) -> WeightedChoice<T> {
    WeightedChoice { value, weight }
}

fn choices(values: &[(&str, f64)]) -> Vec<WeightedChoice<String>> {
    values.iter().map(|(v, w)| choice(v.to_string(), *w)).collect()
}

/// Inclusive integer range.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct IntRange {
    pub min: i64,
    pub max: i64,
}

impl IntRange {
    pub const fn new(min: i64, max: i64) -> Self {
        Self { min, max }
    }
}

// ── DAU curve ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DauCurveConfig {
    /// Long-run plateau, relative units.
    pub long_term_floor: f64,
    /// Height of the launch spike above the floor at day 0.
    pub launch_spike: f64,
    /// Decay time constant as a fraction of the horizon …
    pub decay_fraction: f64,
    /// … but never shorter than this many days.
    pub min_decay_days: f64,
    /// Periodic seasonality, e.g. a weekly rhythm. Amplitude 0 disables it.
    pub seasonal_period_days: f64,
    pub seasonal_amplitude: f64,
    #[serde(default)]
    pub seasonal_phase_days: f64,
    /// Calendar windows (day-of-year, inclusive) with a multiplier.
    #[serde(default)]
    pub calendar_windows: Vec<CalendarWindow>,
    #[serde(default)]
    pub patches: Vec<PatchBump>,
    /// Multiplicative noise: each day is scaled by U(1 - noise, 1 + noise).
    pub noise: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarWindow {
    pub first_day_of_year: u32,
    pub last_day_of_year: u32,
    pub multiplier: f64,
}

/// `bumps[k]` multiplies the days at distance k from the patch day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatchBump {
    pub day: Day,
    pub bumps: Vec<f64>,
}

// ── Population ─────────────────────────────────────────────────────

/// Players arrive on a uniformly drawn day in `[first_day, last_day]`
/// of the window picked with weight `share`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArrivalWindow {
    pub share: f64,
    pub first_day: Day,
    pub last_day: Day,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountryConfig {
    pub code: String,
    pub weight: f64,
    pub time_zone_offset: i32,
    pub currency_code: String,
    pub languages: Vec<WeightedChoice<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformConfig {
    pub name: String,
    pub weight: f64,
    pub device_models: Vec<WeightedChoice<String>>,
    pub os_versions: Vec<WeightedChoice<String>>,
}

/// An acquisition channel. An empty campaign list means the channel
/// carries no campaign (organic installs).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelConfig {
    pub name: String,
    pub weight: f64,
    #[serde(default)]
    pub campaigns: Vec<WeightedChoice<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum SessionCountModel {
    Weighted { choices: Vec<WeightedChoice<u32>> },
    Pareto { alpha: f64, min: u32, max: u32 },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngagementProfile {
    pub segment: EngagementSegment,
    pub share: f64,
    /// Probability of never churning inside the horizon.
    pub core_share: f64,
    /// Non-core horizon = min_lifetime_days + floor(Exp(mean_lifetime_days)).
    pub mean_lifetime_days: f64,
    pub min_lifetime_days: u32,
    /// Activity probability is flat for the first `early_activity_days` …
    pub early_activity_days: u32,
    pub early_activity_probability: f64,
    /// … then halves every `activity_half_life_days`, never below the floor.
    pub activity_half_life_days: f64,
    pub activity_floor: f64,
    pub sessions_per_day: SessionCountModel,
    pub session_median_sec: f64,
    pub session_sigma: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpendProfile {
    pub segment: SpendSegment,
    pub share: f64,
    pub purchase_probability_per_session: f64,
    /// Chance that a purchase is for more than one unit.
    pub bulk_purchase_probability: f64,
    pub max_quantity: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariantConfig {
    pub variant: Variant,
    pub weight: f64,
    pub purchase_multiplier: f64,
    pub price_multiplier: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentConfig {
    pub name: String,
    pub variants: Vec<VariantConfig>,
}

impl ExperimentConfig {
    /// (purchase multiplier, price multiplier) for a variant; neutral when
    /// the variant is not configured.
    pub fn multipliers(&self, variant: Variant) -> (f64, f64) {
        self.variants
            .iter()
            .find(|v| v.variant == variant)
            .map_or((1.0, 1.0), |v| (v.purchase_multiplier, v.price_multiplier))
    }
}

// ── Activity ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityConfig {
    /// Fractional band around each day's target that needs no correction.
    pub dau_tolerance: f64,
    /// After this many consecutive eligible days without activity a
    /// player is treated as silently churned. `None` disables lockout.
    #[serde(default)]
    pub dormancy_lockout_days: Option<u32>,
}

// ── Sessions & events ──────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Local start hour (0–23) distribution.
    pub local_start_hours: Vec<WeightedChoice<u32>>,
    pub entry_points: Vec<WeightedChoice<String>>,
    pub min_duration_sec: i64,
    pub max_duration_sec: i64,
    /// Minimum idle time between two sessions of the same player.
    pub min_gap_sec: i64,
    pub season_length_days: u32,
    /// Minor version range of client builds within one patch.
    pub hotfixes_per_patch: u32,
    pub builds_per_patch: u32,
    pub first_build_number: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutcomeRewards {
    pub win: IntRange,
    pub loss: IntRange,
    pub draw: IntRange,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchConfig {
    pub matches_per_session: Vec<WeightedChoice<u32>>,
    pub game_modes: Vec<WeightedChoice<String>>,
    pub outcomes: Vec<WeightedChoice<MatchOutcome>>,
    pub match_duration_sec: IntRange,
    /// Delay before the first match, as a fraction of the session.
    pub first_match_max_fraction: f64,
    pub break_between_matches_sec: IntRange,
    pub soft_rewards: OutcomeRewards,
    pub hard_drop_probability_on_win: f64,
    pub hard_drop: IntRange,
    pub level_up_probability: f64,
    pub level_up_hard_grant: i64,
}

// ── Purchases ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductConfig {
    pub product_id: String,
    pub product_type: ProductType,
    pub price_eur_cents: i64,
    pub grants_soft: i64,
    pub grants_hard: i64,
    pub weight: f64,
}

/// `minor_units_per_eur_cent` converts EUR cents to the local minor unit,
/// e.g. 1.6 for JPY at 160 yen per euro.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrencyConfig {
    pub code: String,
    pub minor_units_per_eur_cent: f64,
}

// ── Teams ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamSizeBucket {
    pub name: String,
    pub weight: f64,
    /// Capacity is drawn from [min_capacity, max_capacity].
    pub min_capacity: u32,
    pub max_capacity: u32,
    pub tier_level: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamConfig {
    pub size_buckets: Vec<TeamSizeBucket>,
    /// Members join within this many days after they become able to.
    pub join_spread_days: u32,
    /// Chance that a churned non-leader member formally leaves.
    pub leave_after_churn_probability: f64,
    /// Chance that a team disbands before the horizon ends.
    pub disband_probability: f64,
}

// ── Root ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimConfig {
    pub seed: u64,
    pub start_date: NaiveDate,
    pub horizon_days: Day,
    pub player_count: u32,
    pub peak_dau: u32,
    /// A peak below this is rejected as too small to be meaningful.
    pub min_viable_cohort: u32,
    pub dau_curve: DauCurveConfig,
    pub arrivals: Vec<ArrivalWindow>,
    /// Creation times are spread over the first hours of the arrival day.
    pub creation_jitter_hours: u32,
    pub countries: Vec<CountryConfig>,
    pub platforms: Vec<PlatformConfig>,
    pub channels: Vec<ChannelConfig>,
    pub engagement: Vec<EngagementProfile>,
    pub spend: Vec<SpendProfile>,
    pub experiment: ExperimentConfig,
    pub activity: ActivityConfig,
    pub sessions: SessionConfig,
    pub matches: MatchConfig,
    pub products: Vec<ProductConfig>,
    pub currencies: Vec<CurrencyConfig>,
    pub teams: TeamConfig,
}

impl SimConfig {
    /// Load a JSON config file.
    /// In tests, use SimConfig::default_test().
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: SimConfig = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {path}: {e}"))?;
        Ok(config)
    }

    /// Scalar sanity checks. Distribution weights are checked when the
    /// stages compile their tables, which also happens before generation.
    pub fn validate(&self) -> SimResult<()> {
        if self.horizon_days == 0 {
            return Err(SimError::config("horizon_days must be > 0"));
        }
        if self.player_count == 0 {
            return Err(SimError::config("player_count must be > 0"));
        }
        if self.peak_dau < self.min_viable_cohort.max(1) {
            return Err(SimError::config(format!(
                "peak_dau {} is below the minimum viable cohort {}",
                self.peak_dau,
                self.min_viable_cohort.max(1)
            )));
        }

        let tol = self.activity.dau_tolerance;
        if !(0.0..1.0).contains(&tol) {
            return Err(SimError::config(format!("dau_tolerance {tol} must be in [0, 1)")));
        }

        let c = &self.dau_curve;
        for (name, v) in [
            ("long_term_floor", c.long_term_floor),
            ("launch_spike", c.launch_spike),
            ("decay_fraction", c.decay_fraction),
            ("min_decay_days", c.min_decay_days),
            ("seasonal_amplitude", c.seasonal_amplitude),
            ("noise", c.noise),
        ] {
            if !v.is_finite() || v < 0.0 {
                return Err(SimError::config(format!("dau_curve.{name} = {v} must be finite and >= 0")));
            }
        }
        if c.long_term_floor + c.launch_spike <= 0.0 {
            return Err(SimError::config("dau_curve: floor + spike must be > 0"));
        }
        if c.decay_fraction <= 0.0 && c.min_decay_days <= 0.0 {
            return Err(SimError::config("dau_curve: decay time constant must be > 0"));
        }
        if c.seasonal_amplitude >= 1.0 {
            return Err(SimError::config("dau_curve.seasonal_amplitude must be < 1"));
        }
        if c.seasonal_amplitude > 0.0 && !(c.seasonal_period_days.is_finite() && c.seasonal_period_days > 0.0) {
            return Err(SimError::config("dau_curve.seasonal_period_days must be > 0"));
        }
        if c.noise >= 1.0 {
            return Err(SimError::config("dau_curve.noise must be < 1"));
        }
        let multipliers = c
            .calendar_windows
            .iter()
            .map(|w| w.multiplier)
            .chain(c.patches.iter().flat_map(|p| p.bumps.iter().copied()));
        for m in multipliers {
            if !m.is_finite() || m < 0.0 {
                return Err(SimError::config(format!("dau_curve multiplier {m} must be finite and >= 0")));
            }
        }

        for a in &self.arrivals {
            if a.first_day > a.last_day {
                return Err(SimError::config(format!(
                    "arrival window {}..{} is reversed",
                    a.first_day, a.last_day
                )));
            }
        }

        for p in &self.engagement {
            let probs = [p.core_share, p.early_activity_probability, p.activity_floor];
            if probs.iter().any(|v| !(0.0..=1.0).contains(v)) {
                return Err(SimError::config(format!(
                    "engagement {}: probabilities must be in [0, 1]",
                    p.segment.as_str()
                )));
            }
            if p.activity_floor > p.early_activity_probability {
                return Err(SimError::config(format!(
                    "engagement {}: activity_floor exceeds early_activity_probability",
                    p.segment.as_str()
                )));
            }
            if !(p.mean_lifetime_days >= 0.0 && p.activity_half_life_days > 0.0) {
                return Err(SimError::config(format!(
                    "engagement {}: lifetime and half-life must be positive",
                    p.segment.as_str()
                )));
            }
            if !(p.session_median_sec > 0.0 && p.session_sigma >= 0.0) {
                return Err(SimError::config(format!(
                    "engagement {}: session duration parameters must be positive",
                    p.segment.as_str()
                )));
            }
            if let SessionCountModel::Pareto { alpha, min, max } = &p.sessions_per_day {
                if *alpha <= 0.0 || *min == 0 || min > max {
                    return Err(SimError::config(format!(
                        "engagement {}: pareto session model needs alpha > 0 and 1 <= min <= max",
                        p.segment.as_str()
                    )));
                }
            }
        }

        for s in &self.spend {
            if !(0.0..=1.0).contains(&s.purchase_probability_per_session)
                || !(0.0..=1.0).contains(&s.bulk_purchase_probability)
            {
                return Err(SimError::config(format!(
                    "spend {}: probabilities must be in [0, 1]",
                    s.segment.as_str()
                )));
            }
            if s.max_quantity == 0 {
                return Err(SimError::config(format!("spend {}: max_quantity must be >= 1", s.segment.as_str())));
            }
        }

        for v in &self.experiment.variants {
            if !(v.purchase_multiplier >= 0.0 && v.price_multiplier >= 0.0)
                || !v.purchase_multiplier.is_finite()
                || !v.price_multiplier.is_finite()
            {
                return Err(SimError::config(format!(
                    "variant {}: multipliers must be finite and >= 0",
                    v.variant.as_str()
                )));
            }
        }

        let s = &self.sessions;
        if s.min_duration_sec <= 0 || s.max_duration_sec < s.min_duration_sec {
            return Err(SimError::config("sessions: need 0 < min_duration_sec <= max_duration_sec"));
        }
        if s.max_duration_sec >= crate::clock::SECONDS_PER_DAY || s.min_gap_sec < 0 {
            return Err(SimError::config("sessions: durations must fit inside a day"));
        }
        if s.season_length_days == 0 {
            return Err(SimError::config("sessions.season_length_days must be > 0"));
        }
        if s.local_start_hours.iter().any(|h| h.value > 23) {
            return Err(SimError::config("sessions.local_start_hours must be in 0..=23"));
        }

        let m = &self.matches;
        if m.match_duration_sec.min <= 0 || m.match_duration_sec.max < m.match_duration_sec.min {
            return Err(SimError::config("matches.match_duration_sec is invalid"));
        }
        if m.break_between_matches_sec.min < 0 || m.break_between_matches_sec.max < m.break_between_matches_sec.min {
            return Err(SimError::config("matches.break_between_matches_sec is invalid"));
        }
        if !(0.0..=1.0).contains(&m.first_match_max_fraction)
            || !(0.0..=1.0).contains(&m.level_up_probability)
            || !(0.0..=1.0).contains(&m.hard_drop_probability_on_win)
        {
            return Err(SimError::config("matches: fractions and probabilities must be in [0, 1]"));
        }

        for p in &self.products {
            if p.price_eur_cents < 0 || p.grants_soft < 0 || p.grants_hard < 0 {
                return Err(SimError::config(format!(
                    "product {}: price and grants must be >= 0",
                    p.product_id
                )));
            }
        }
        for c in &self.currencies {
            if !(c.minor_units_per_eur_cent.is_finite() && c.minor_units_per_eur_cent > 0.0) {
                return Err(SimError::config(format!("currency {}: rate must be > 0", c.code)));
            }
        }
        for country in &self.countries {
            if !self.currencies.iter().any(|c| c.code == country.currency_code) {
                return Err(SimError::config(format!(
                    "country {}: unknown currency {}",
                    country.code, country.currency_code
                )));
            }
        }

        for b in &self.teams.size_buckets {
            if b.min_capacity == 0 || b.max_capacity < b.min_capacity {
                return Err(SimError::config(format!(
                    "team bucket {}: need 1 <= min_capacity <= max_capacity",
                    b.name
                )));
            }
        }
        if !(0.0..=1.0).contains(&self.teams.leave_after_churn_probability)
            || !(0.0..=1.0).contains(&self.teams.disband_probability)
        {
            return Err(SimError::config("teams: probabilities must be in [0, 1]"));
        }

        self.check_segment_coverage()
    }

    /// Later stages look profiles up by segment, so every segment must be
    /// configured exactly once and every variant at most once.
    fn check_segment_coverage(&self) -> SimResult<()> {
        for seg in [EngagementSegment::Casual, EngagementSegment::Midcore, EngagementSegment::Heavy] {
            let n = self.engagement.iter().filter(|p| p.segment == seg).count();
            if n != 1 {
                return Err(SimError::config(format!(
                    "engagement segment {} must be configured exactly once (found {n})",
                    seg.as_str()
                )));
            }
        }
        for seg in [SpendSegment::Nonpayer, SpendSegment::Minnow, SpendSegment::Dolphin, SpendSegment::Whale] {
            let n = self.spend.iter().filter(|p| p.segment == seg).count();
            if n != 1 {
                return Err(SimError::config(format!(
                    "spend segment {} must be configured exactly once (found {n})",
                    seg.as_str()
                )));
            }
        }
        let mut seen = Vec::new();
        for v in &self.experiment.variants {
            if seen.contains(&v.variant) {
                return Err(SimError::config(format!("variant {} configured twice", v.variant.as_str())));
            }
            seen.push(v.variant);
        }
        Ok(())
    }

    /// Small, fast config for tests: 30 days, 1 000 players, peak 500.
    pub fn default_test() -> Self {
        let mut config = Self::default();
        config.seed = 42;
        config.horizon_days = 30;
        config.player_count = 1_000;
        config.peak_dau = 500;
        config.min_viable_cohort = 10;
        config.arrivals = vec![
            ArrivalWindow { share: 0.60, first_day: 0, last_day: 3 },
            ArrivalWindow { share: 0.30, first_day: 4, last_day: 14 },
            ArrivalWindow { share: 0.10, first_day: 15, last_day: 29 },
        ];
        config.dau_curve.patches = vec![
            PatchBump { day: 10, bumps: vec![1.4, 1.2, 1.1] },
            PatchBump { day: 20, bumps: vec![1.4, 1.2, 1.1] },
        ];
        config
    }
}

impl Default for SimConfig {
    /// Production-scale knobs: ~6 months, 40k players,
    /// peak DAU 15k, patches every 60 days.
    fn default() -> Self {
        let start_date = NaiveDate::from_ymd_opt(2025, 1, 1).expect("2025-01-01 is a valid date");

        let country = |code: &str, weight: f64, tz: i32, currency: &str, languages: &[(&str, f64)]| {
            CountryConfig {
                code: code.into(),
                weight,
                time_zone_offset: tz,
                currency_code: currency.into(),
                languages: choices(languages),
            }
        };

        let platform = |name: &str, weight: f64, os: &[(&str, f64)]| PlatformConfig {
            name: name.into(),
            weight,
            device_models: (1..=5)
                .map(|i| choice(format!("{name}_Device_{i}"), 1.0))
                .collect(),
            os_versions: choices(os),
        };

        let campaigns = choices(&[("Launch2025", 0.4), ("SummerEvent", 0.3), ("HolidayPush", 0.3)]);

        Self {
            seed: 131_287,
            start_date,
            horizon_days: 180,
            player_count: 40_000,
            peak_dau: 15_000,
            min_viable_cohort: 10,
            dau_curve: DauCurveConfig {
                long_term_floor: 0.6,
                launch_spike: 0.8,
                decay_fraction: 0.10,
                min_decay_days: 7.0,
                seasonal_period_days: 7.0,
                seasonal_amplitude: 0.04,
                seasonal_phase_days: 0.0,
                calendar_windows: vec![
                    CalendarWindow { first_day_of_year: 150, last_day_of_year: 240, multiplier: 0.8 },
                    CalendarWindow { first_day_of_year: 330, last_day_of_year: 364, multiplier: 1.3 },
                ],
                patches: [60, 120, 180]
                    .into_iter()
                    .map(|day| PatchBump { day, bumps: vec![1.4, 1.2, 1.1] })
                    .collect(),
                noise: 0.05,
            },
            arrivals: vec![
                ArrivalWindow { share: 0.60, first_day: 0, last_day: 3 },
                ArrivalWindow { share: 0.25, first_day: 4, last_day: 30 },
                ArrivalWindow { share: 0.10, first_day: 31, last_day: 90 },
                ArrivalWindow { share: 0.05, first_day: 91, last_day: 179 },
            ],
            creation_jitter_hours: 6,
            countries: vec![
                country("US", 0.12, -5, "USD", &[("en", 0.85), ("es", 0.15)]),
                country("US", 0.08, -8, "USD", &[("en", 0.8), ("es", 0.2)]),
                country("CA", 0.04, -5, "CAD", &[("en", 0.75), ("fr", 0.25)]),
                country("GB", 0.08, 0, "GBP", &[("en", 1.0)]),
                country("DE", 0.06, 1, "EUR", &[("de", 0.9), ("en", 0.1)]),
                country("FR", 0.06, 1, "EUR", &[("fr", 0.95), ("en", 0.05)]),
                country("BR", 0.08, -3, "BRL", &[("pt", 0.95), ("en", 0.05)]),
                country("IN", 0.08, 5, "INR", &[("en", 0.6), ("hi", 0.4)]),
                country("JP", 0.08, 9, "JPY", &[("ja", 1.0)]),
                country("KR", 0.08, 9, "KRW", &[("ko", 1.0)]),
                country("OTHER", 0.24, 0, "EUR", &[("en", 1.0)]),
            ],
            platforms: vec![
                platform("Android", 0.6, &[("12.0", 0.2), ("13.0", 0.3), ("14.0", 0.3), ("15.0", 0.2)]),
                platform("iOS", 0.4, &[("15.0", 0.1), ("16.0", 0.3), ("17.0", 0.4), ("18.0", 0.2)]),
            ],
            channels: vec![
                ChannelConfig { name: "Organic".into(), weight: 0.5, campaigns: Vec::new() },
                ChannelConfig { name: "AdsNetworkA".into(), weight: 0.2, campaigns: campaigns.clone() },
                ChannelConfig { name: "AdsNetworkB".into(), weight: 0.2, campaigns: campaigns.clone() },
                ChannelConfig { name: "CrossPromo".into(), weight: 0.1, campaigns },
            ],
            engagement: vec![
                EngagementProfile {
                    segment: EngagementSegment::Casual,
                    share: 0.7,
                    core_share: 0.03,
                    mean_lifetime_days: 6.0,
                    min_lifetime_days: 1,
                    early_activity_days: 2,
                    early_activity_probability: 0.75,
                    activity_half_life_days: 4.0,
                    activity_floor: 0.05,
                    sessions_per_day: SessionCountModel::Weighted {
                        choices: vec![choice(1, 0.6), choice(2, 0.3), choice(3, 0.1)],
                    },
                    session_median_sec: 480.0,
                    session_sigma: 0.6,
                },
                EngagementProfile {
                    segment: EngagementSegment::Midcore,
                    share: 0.2,
                    core_share: 0.15,
                    mean_lifetime_days: 30.0,
                    min_lifetime_days: 3,
                    early_activity_days: 3,
                    early_activity_probability: 0.85,
                    activity_half_life_days: 12.0,
                    activity_floor: 0.15,
                    sessions_per_day: SessionCountModel::Weighted {
                        choices: vec![choice(1, 0.2), choice(2, 0.4), choice(3, 0.3), choice(4, 0.1)],
                    },
                    session_median_sec: 600.0,
                    session_sigma: 0.7,
                },
                EngagementProfile {
                    segment: EngagementSegment::Heavy,
                    share: 0.1,
                    core_share: 0.5,
                    mean_lifetime_days: 90.0,
                    min_lifetime_days: 7,
                    early_activity_days: 5,
                    early_activity_probability: 0.95,
                    activity_half_life_days: 40.0,
                    activity_floor: 0.4,
                    sessions_per_day: SessionCountModel::Pareto { alpha: 2.0, min: 2, max: 10 },
                    session_median_sec: 900.0,
                    session_sigma: 0.7,
                },
            ],
            spend: vec![
                SpendProfile {
                    segment: SpendSegment::Nonpayer,
                    share: 0.90,
                    purchase_probability_per_session: 0.0,
                    bulk_purchase_probability: 0.0,
                    max_quantity: 1,
                },
                SpendProfile {
                    segment: SpendSegment::Minnow,
                    share: 0.08,
                    purchase_probability_per_session: 0.02,
                    bulk_purchase_probability: 0.0,
                    max_quantity: 1,
                },
                SpendProfile {
                    segment: SpendSegment::Dolphin,
                    share: 0.018,
                    purchase_probability_per_session: 0.06,
                    bulk_purchase_probability: 0.05,
                    max_quantity: 2,
                },
                SpendProfile {
                    segment: SpendSegment::Whale,
                    share: 0.002,
                    purchase_probability_per_session: 0.20,
                    bulk_purchase_probability: 0.15,
                    max_quantity: 5,
                },
            ],
            experiment: ExperimentConfig {
                name: "shop_pricing_v1".into(),
                variants: vec![
                    VariantConfig { variant: Variant::Control, weight: 0.5, purchase_multiplier: 1.0, price_multiplier: 1.0 },
                    VariantConfig { variant: Variant::A, weight: 0.25, purchase_multiplier: 1.2, price_multiplier: 0.9 },
                    VariantConfig { variant: Variant::B, weight: 0.25, purchase_multiplier: 0.85, price_multiplier: 1.1 },
                ],
            },
            activity: ActivityConfig {
                dau_tolerance: 0.01,
                dormancy_lockout_days: Some(21),
            },
            sessions: SessionConfig {
                local_start_hours: vec![choice(12, 0.1), choice(15, 0.2), choice(18, 0.4), choice(20, 0.2), choice(22, 0.1)],
                entry_points: choices(&[("icon_tap", 0.7), ("push", 0.2), ("reengagement_ad", 0.1)]),
                min_duration_sec: 60,
                max_duration_sec: 3 * 3_600,
                min_gap_sec: 120,
                season_length_days: 60,
                hotfixes_per_patch: 20,
                builds_per_patch: 100,
                first_build_number: 1_000,
            },
            matches: MatchConfig {
                matches_per_session: vec![choice(0, 0.1), choice(1, 0.4), choice(2, 0.3), choice(3, 0.15), choice(4, 0.05)],
                game_modes: choices(&[("solo", 0.5), ("duo", 0.2), ("team", 0.3)]),
                outcomes: vec![
                    choice(MatchOutcome::Win, 0.45),
                    choice(MatchOutcome::Loss, 0.45),
                    choice(MatchOutcome::Draw, 0.10),
                ],
                match_duration_sec: IntRange::new(60, 900),
                first_match_max_fraction: 1.0 / 3.0,
                break_between_matches_sec: IntRange::new(10, 120),
                soft_rewards: OutcomeRewards {
                    win: IntRange::new(15, 40),
                    loss: IntRange::new(5, 20),
                    draw: IntRange::new(5, 25),
                },
                hard_drop_probability_on_win: 0.05,
                hard_drop: IntRange::new(1, 3),
                level_up_probability: 0.05,
                level_up_hard_grant: 5,
            },
            products: vec![
                ProductConfig { product_id: "prod_soft_small".into(), product_type: ProductType::SoftPack, price_eur_cents: 199, grants_soft: 500, grants_hard: 0, weight: 0.3 },
                ProductConfig { product_id: "prod_soft_large".into(), product_type: ProductType::SoftPack, price_eur_cents: 999, grants_soft: 3_000, grants_hard: 0, weight: 0.2 },
                ProductConfig { product_id: "prod_hard_small".into(), product_type: ProductType::HardPack, price_eur_cents: 499, grants_soft: 0, grants_hard: 50, weight: 0.2 },
                ProductConfig { product_id: "prod_hard_large".into(), product_type: ProductType::HardPack, price_eur_cents: 1_999, grants_soft: 0, grants_hard: 300, weight: 0.1 },
                ProductConfig { product_id: "prod_bundle".into(), product_type: ProductType::Bundle, price_eur_cents: 999, grants_soft: 2_500, grants_hard: 50, weight: 0.2 },
            ],
            currencies: vec![
                CurrencyConfig { code: "EUR".into(), minor_units_per_eur_cent: 1.0 },
                CurrencyConfig { code: "USD".into(), minor_units_per_eur_cent: 1.08 },
                CurrencyConfig { code: "CAD".into(), minor_units_per_eur_cent: 1.47 },
                CurrencyConfig { code: "GBP".into(), minor_units_per_eur_cent: 0.85 },
                CurrencyConfig { code: "BRL".into(), minor_units_per_eur_cent: 5.4 },
                CurrencyConfig { code: "INR".into(), minor_units_per_eur_cent: 90.0 },
                CurrencyConfig { code: "JPY".into(), minor_units_per_eur_cent: 1.6 },
                CurrencyConfig { code: "KRW".into(), minor_units_per_eur_cent: 14.5 },
            ],
            teams: TeamConfig {
                size_buckets: vec![
                    TeamSizeBucket { name: "small".into(), weight: 0.7, min_capacity: 1, max_capacity: 5, tier_level: 0 },
                    TeamSizeBucket { name: "medium".into(), weight: 0.2, min_capacity: 25, max_capacity: 25, tier_level: 1 },
                    TeamSizeBucket { name: "large".into(), weight: 0.1, min_capacity: 45, max_capacity: 45, tier_level: 2 },
                ],
                join_spread_days: 60,
                leave_after_churn_probability: 0.5,
                disband_probability: 0.05,
            },
        }
    }
}
