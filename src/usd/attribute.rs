//! Time-sampled attribute storage.

use crate::core::{Interval, TimeCode};

/// One attribute value over time: an optional default (unvarying) value
/// plus explicit time samples.
///
/// `get` returns the exact sample authored at the requested time, falling
/// back to the default value. It never interpolates between neighboring
/// samples - absence at a time means "no data at this time", which is a
/// contract the crease conversion in particular relies on.
#[derive(Clone, Debug)]
pub struct Attribute<T> {
    default: Option<T>,
    samples: Vec<(f64, T)>,
}

impl<T> Default for Attribute<T> {
    fn default() -> Self {
        Self { default: None, samples: Vec::new() }
    }
}

impl<T> Attribute<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Author a value at the given time, replacing any previous value there.
    pub fn set(&mut self, time: TimeCode, value: T) {
        match time {
            TimeCode::Default => self.default = Some(value),
            TimeCode::Frame(frame) => {
                match self.samples.binary_search_by(|(f, _)| f.total_cmp(&frame)) {
                    Ok(i) => self.samples[i].1 = value,
                    Err(i) => self.samples.insert(i, (frame, value)),
                }
            }
        }
    }

    /// The value at the given time: the exact sample authored there, or the
    /// default value, or nothing.
    pub fn get(&self, time: TimeCode) -> Option<&T> {
        match time {
            TimeCode::Default => self.default.as_ref(),
            TimeCode::Frame(frame) => self
                .samples
                .binary_search_by(|(f, _)| f.total_cmp(&frame))
                .ok()
                .map(|i| &self.samples[i].1)
                .or(self.default.as_ref()),
        }
    }

    /// Whether any value (default or sampled) has been authored.
    pub fn has_value(&self) -> bool {
        self.default.is_some() || !self.samples.is_empty()
    }

    pub fn num_time_samples(&self) -> usize {
        self.samples.len()
    }

    /// Frames of the samples authored within the interval.
    pub fn time_samples_in_interval(&self, interval: &Interval) -> Vec<f64> {
        self.samples
            .iter()
            .map(|(f, _)| *f)
            .filter(|f| interval.contains(*f))
            .collect()
    }

    /// Remove all authored values.
    pub fn clear(&mut self) {
        self.default = None;
        self.samples.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_and_frame_slots() {
        let mut attr = Attribute::new();
        assert!(!attr.has_value());
        attr.set(TimeCode::Default, 10);
        attr.set(TimeCode::Frame(2.0), 20);

        assert_eq!(attr.get(TimeCode::Default), Some(&10));
        assert_eq!(attr.get(TimeCode::Frame(2.0)), Some(&20));
        // Unauthored frame falls back to the default, never a neighbor.
        assert_eq!(attr.get(TimeCode::Frame(3.0)), Some(&10));
        assert_eq!(attr.num_time_samples(), 1);
    }

    #[test]
    fn test_no_default_no_bleed() {
        let mut attr = Attribute::new();
        attr.set(TimeCode::Frame(1.0), 1);
        assert_eq!(attr.get(TimeCode::Frame(2.0)), None);
        assert_eq!(attr.get(TimeCode::Default), None);
    }

    #[test]
    fn test_samples_stay_sorted() {
        let mut attr = Attribute::new();
        attr.set(TimeCode::Frame(3.0), 3);
        attr.set(TimeCode::Frame(1.0), 1);
        attr.set(TimeCode::Frame(2.0), 2);
        attr.set(TimeCode::Frame(2.0), 22);

        assert_eq!(attr.num_time_samples(), 3);
        assert_eq!(attr.get(TimeCode::Frame(2.0)), Some(&22));
        let in_range =
            attr.time_samples_in_interval(&Interval { start: 1.5, end: 3.0 });
        assert_eq!(in_range, vec![2.0, 3.0]);
    }
}
