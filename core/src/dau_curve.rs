//! DAU curve: target distinct active players for every simulated day.
//!
//! Shape: launch spike decaying exponentially to a plateau, scaled by a
//! periodic seasonal term, calendar windows (summer dip, holiday spike)
//! and short patch bumps, with a little multiplicative noise. The shape
//! is normalised so its maximum equals `peak_dau`.

use crate::{
    clock::SimCalendar,
    config::{DauCurveConfig, SimConfig},
    error::{SimError, SimResult},
    rng::SubsystemRng,
    types::Day,
};
use chrono::Datelike;

pub struct DauCurveGenerator {
    curve: DauCurveConfig,
    calendar: SimCalendar,
    peak_dau: u32,
}

impl DauCurveGenerator {
    pub fn new(config: &SimConfig) -> SimResult<Self> {
        config.validate()?;
        Ok(Self {
            curve: config.dau_curve.clone(),
            calendar: SimCalendar::new(config.start_date, config.horizon_days),
            peak_dau: config.peak_dau,
        })
    }

    /// Decay time constant in days.
    pub fn tau(&self) -> f64 {
        let n = f64::from(self.calendar.horizon_days());
        (n * self.curve.decay_fraction).max(self.curve.min_decay_days)
    }

    /// Deterministic part of the curve for `day`: decay × seasonality × patches.
    pub fn shape_at(&self, day: Day) -> f64 {
        let t = f64::from(day);
        let c = &self.curve;

        let base = c.long_term_floor + c.launch_spike * (-t / self.tau()).exp();

        let mut season = 1.0;
        if c.seasonal_amplitude > 0.0 {
            let phase = 2.0 * std::f64::consts::PI * (t + c.seasonal_phase_days) / c.seasonal_period_days;
            season *= 1.0 + c.seasonal_amplitude * phase.sin();
        }
        let day_of_year = self.calendar.date_of(day).ordinal0();
        for w in &c.calendar_windows {
            if (w.first_day_of_year..=w.last_day_of_year).contains(&day_of_year) {
                season *= w.multiplier;
            }
        }

        let mut patch = 1.0;
        for p in &c.patches {
            let dist = day.abs_diff(p.day) as usize;
            if let Some(bump) = p.bumps.get(dist) {
                patch *= bump;
            }
        }

        base * season * patch
    }

    /// Produce `horizon_days` targets in `[0, peak_dau]`.
    pub fn generate(&self, rng: &mut SubsystemRng) -> SimResult<Vec<u32>> {
        let n = self.calendar.horizon_days();
        let noise = self.curve.noise;

        let rel: Vec<f64> = (0..n)
            .map(|day| self.shape_at(day) * rng.uniform(1.0 - noise, 1.0 + noise))
            .collect();

        let max_rel = rel.iter().copied().fold(0.0_f64, f64::max);
        if !(max_rel.is_finite() && max_rel > 0.0) {
            return Err(SimError::config(format!(
                "dau_curve collapses to a non-positive maximum ({max_rel})"
            )));
        }

        let peak = f64::from(self.peak_dau);
        let targets: Vec<u32> = rel
            .iter()
            .map(|x| (peak * x / max_rel).round().clamp(0.0, peak) as u32)
            .collect();

        log::info!(
            "dau_curve: {} days, peak={} first={} last={}",
            targets.len(),
            self.peak_dau,
            targets.first().copied().unwrap_or(0),
            targets.last().copied().unwrap_or(0),
        );
        Ok(targets)
    }
}
