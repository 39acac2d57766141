//! Weighted categorical sampling.
//!
//! Every configured distribution (countries, segments, products, hours …)
//! is compiled once into a WeightedTable. Sampling takes the caller's
//! stream, so the same table can be shared read-only across workers.

use crate::{
    config::WeightedChoice,
    error::{SimError, SimResult},
    rng::SubsystemRng,
};

#[derive(Debug, Clone)]
pub struct WeightedTable<T> {
    items: Vec<T>,
    cumulative: Vec<f64>,
}

impl<T> WeightedTable<T> {
    /// Build a table from `(item, weight)` pairs.
    ///
    /// Rejects empty input, negative or non-finite weights, and tables
    /// whose weights sum to zero. `what` names the distribution in the
    /// error message.
    pub fn new(entries: impl IntoIterator<Item = (T, f64)>, what: &str) -> SimResult<Self> {
        let mut items = Vec::new();
        let mut cumulative = Vec::new();
        let mut total = 0.0;
        for (item, weight) in entries {
            if !weight.is_finite() || weight < 0.0 {
                return Err(SimError::config(format!(
                    "{what}: weight {weight} must be finite and >= 0"
                )));
            }
            total += weight;
            items.push(item);
            cumulative.push(total);
        }
        if items.is_empty() {
            return Err(SimError::config(format!("{what}: distribution is empty")));
        }
        if total <= 0.0 {
            return Err(SimError::config(format!("{what}: weights sum to zero")));
        }
        Ok(Self { items, cumulative })
    }

    pub fn sample(&self, rng: &mut SubsystemRng) -> &T {
        let roll = rng.next_f64() * self.total();
        let idx = self.cumulative.partition_point(|c| *c <= roll);
        &self.items[idx.min(self.items.len() - 1)]
    }

    pub fn total(&self) -> f64 {
        self.cumulative.last().copied().unwrap_or(0.0)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T: Clone> WeightedTable<T> {
    pub fn from_choices(choices: &[WeightedChoice<T>], what: &str) -> SimResult<Self> {
        Self::new(choices.iter().map(|c| (c.value.clone(), c.weight)), what)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::{RngBank, StageSlot};

    #[test]
    fn zero_weight_items_are_never_drawn() {
        let table = WeightedTable::new(vec![("a", 0.0), ("b", 1.0), ("c", 0.0)], "t").unwrap();
        let mut rng = RngBank::new(3).for_stage(StageSlot::Population);
        for _ in 0..1_000 {
            assert_eq!(*table.sample(&mut rng), "b");
        }
    }

    #[test]
    fn frequencies_follow_weights() {
        let table = WeightedTable::new(vec![(0usize, 0.7), (1, 0.2), (2, 0.1)], "t").unwrap();
        let mut rng = RngBank::new(11).for_stage(StageSlot::Population);
        let mut counts = [0usize; 3];
        for _ in 0..20_000 {
            counts[*table.sample(&mut rng)] += 1;
        }
        let share = counts[0] as f64 / 20_000.0;
        assert!((share - 0.7).abs() < 0.03, "share of first item was {share}");
        assert!(counts[2] < counts[1]);
    }

    #[test]
    fn rejects_bad_weights() {
        assert!(WeightedTable::<u8>::new(Vec::new(), "empty").is_err());
        assert!(WeightedTable::new(vec![(1u8, 0.0)], "zero").is_err());
        assert!(WeightedTable::new(vec![(1u8, -1.0), (2, 3.0)], "negative").is_err());
        assert!(WeightedTable::new(vec![(1u8, f64::NAN)], "nan").is_err());
    }
}
