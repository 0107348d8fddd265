//! Time codes and object-channel validity intervals.
//!
//! A conversion call always targets one specific time. Attribute samples are
//! never interpolated across times by this crate - absence at a time means
//! "no data at this time".

use std::collections::BTreeMap;

/// Target time of a conversion call.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum TimeCode {
    /// The unvarying (default) sample slot.
    #[default]
    Default,
    /// A specific frame.
    Frame(f64),
}

impl TimeCode {
    /// Frame number, if this is a frame time.
    #[inline]
    pub fn frame(&self) -> Option<f64> {
        match self {
            Self::Default => None,
            Self::Frame(f) => Some(*f),
        }
    }

    /// Whether this is the default (unvarying) time.
    #[inline]
    pub fn is_default(&self) -> bool {
        matches!(self, Self::Default)
    }
}

impl From<f64> for TimeCode {
    fn from(frame: f64) -> Self {
        Self::Frame(frame)
    }
}

/// A closed frame interval, used for object-channel validity.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Interval {
    pub start: f64,
    pub end: f64,
}

impl Interval {
    /// The whole timeline.
    pub const FOREVER: Self = Self {
        start: f64::NEG_INFINITY,
        end: f64::INFINITY,
    };

    /// A single instant.
    #[inline]
    pub fn instant(frame: f64) -> Self {
        Self { start: frame, end: frame }
    }

    /// Intersection of two intervals. May come out empty.
    #[inline]
    pub fn intersect(&self, other: &Self) -> Self {
        Self {
            start: self.start.max(other.start),
            end: self.end.min(other.end),
        }
    }

    /// Whether the interval contains no time at all.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start > self.end
    }

    /// Whether `frame` falls within the interval.
    #[inline]
    pub fn contains(&self, frame: f64) -> bool {
        frame >= self.start && frame <= self.end
    }
}

impl Default for Interval {
    fn default() -> Self {
        Self::FOREVER
    }
}

/// The native object channels that mesh attributes depend on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ObjectChannel {
    /// Face topology.
    Topology,
    /// Vertex positions.
    Geometry,
    /// UV map channels.
    TexMap,
    /// Vertex color map channel.
    VertexColor,
}

/// Validity intervals of the native object channels at the time of a
/// conversion call. A missing channel means "unknown", which conservatively
/// reads as "always write".
#[derive(Clone, Debug, Default)]
pub struct ChannelIntervals {
    intervals: BTreeMap<ObjectChannel, Interval>,
}

impl ChannelIntervals {
    /// No information - all attributes are written at every call.
    pub fn new() -> Self {
        Self::default()
    }

    /// All four channels valid forever (fully static object).
    pub fn forever() -> Self {
        let mut intervals = Self::default();
        for channel in Self::ALL {
            intervals.set(channel, Interval::FOREVER);
        }
        intervals
    }

    /// All four channels valid only at `frame`.
    pub fn instant(frame: f64) -> Self {
        let mut intervals = Self::default();
        for channel in Self::ALL {
            intervals.set(channel, Interval::instant(frame));
        }
        intervals
    }

    const ALL: [ObjectChannel; 4] = [
        ObjectChannel::Topology,
        ObjectChannel::Geometry,
        ObjectChannel::TexMap,
        ObjectChannel::VertexColor,
    ];

    pub fn set(&mut self, channel: ObjectChannel, interval: Interval) {
        self.intervals.insert(channel, interval);
    }

    pub fn get(&self, channel: ObjectChannel) -> Option<Interval> {
        self.intervals.get(&channel).copied()
    }

    /// Collapse every known channel to a single instant. Used when the mesh
    /// was modified during export sanitization, which makes the original
    /// intervals meaningless.
    pub fn collapse_to_instant(&mut self, frame: f64) {
        for interval in self.intervals.values_mut() {
            *interval = Interval::instant(frame);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_intersect() {
        let a = Interval { start: 0.0, end: 10.0 };
        let b = Interval { start: 5.0, end: 20.0 };
        let i = a.intersect(&b);
        assert_eq!(i.start, 5.0);
        assert_eq!(i.end, 10.0);
        assert!(!i.is_empty());

        let disjoint = Interval::instant(0.0).intersect(&Interval::instant(1.0));
        assert!(disjoint.is_empty());
    }

    #[test]
    fn test_channel_intervals_collapse() {
        let mut intervals = ChannelIntervals::forever();
        intervals.collapse_to_instant(3.0);
        assert_eq!(
            intervals.get(ObjectChannel::Topology),
            Some(Interval::instant(3.0))
        );
    }

    #[test]
    fn test_timecode() {
        assert!(TimeCode::Default.is_default());
        assert_eq!(TimeCode::from(2.0).frame(), Some(2.0));
    }
}
