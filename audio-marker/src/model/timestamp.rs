use std::fmt;

use crate::error::{Error, Result};

/// A non-negative, millisecond-precision duration.
///
/// Used for chapter boundaries, lyric line times, and file duration.
/// Totally ordered and canonically rendered as `HH:MM:SS.mmm`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp {
    millis: u64,
}

impl Timestamp {
    /// Zero.
    pub const ZERO: Timestamp = Timestamp { millis: 0 };

    /// Constructs from a whole number of milliseconds.
    pub fn from_millis(millis: u64) -> Self {
        Timestamp { millis }
    }

    /// Constructs from a (possibly fractional) number of seconds.
    pub fn from_seconds(seconds: f64) -> Self {
        Timestamp {
            millis: (seconds.max(0.0) * 1000.0).round() as u64,
        }
    }

    /// Constructs from a frame count at `frames_per_second`, used by the
    /// cue-sheet exchange format (75 frames/sec).
    pub fn from_frames(frames: u64, frames_per_second: u64) -> Self {
        Timestamp {
            millis: frames.saturating_mul(1000) / frames_per_second.max(1),
        }
    }

    /// Parses `HH:MM:SS.mmm`, `MM:SS.mmm`, or `MM:SS`.
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        let parts: Vec<&str> = input.split(':').collect();

        let (hours, minutes, sec_str): (u64, u64, &str) = match parts.as_slice() {
            [h, m, s] => (
                h.parse().map_err(|_| Error::TimestampError(input.to_string()))?,
                m.parse().map_err(|_| Error::TimestampError(input.to_string()))?,
                *s,
            ),
            [m, s] => (
                0,
                m.parse().map_err(|_| Error::TimestampError(input.to_string()))?,
                *s,
            ),
            _ => return Err(Error::TimestampError(input.to_string())),
        };

        let seconds: f64 = sec_str.parse().map_err(|_| Error::TimestampError(input.to_string()))?;
        if seconds < 0.0 {
            return Err(Error::TimestampError(input.to_string()));
        }

        let total_seconds = (hours * 3600 + minutes * 60) as f64 + seconds;
        Ok(Timestamp::from_seconds(total_seconds))
    }

    /// The duration in whole milliseconds.
    pub fn as_millis(&self) -> u64 {
        self.millis
    }

    /// The duration in (fractional) seconds.
    pub fn as_seconds(&self) -> f64 {
        self.millis as f64 / 1000.0
    }

    /// Renders as `HH:MM:SS.mmm`.
    pub fn format(&self) -> String {
        format!("{self}")
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total_ms = self.millis;
        let ms = total_ms % 1000;
        let total_secs = total_ms / 1000;
        let s = total_secs % 60;
        let total_mins = total_secs / 60;
        let m = total_mins % 60;
        let h = total_mins / 60;
        write!(f, "{h:02}:{m:02}:{s:02}.{ms:03}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_format_round_trip() {
        for (input, expected_ms) in [
            ("00:00:00.000", 0),
            ("01:02:03.456", 3723456),
            ("02:03", 123_000),
            ("02:03.500", 123_500),
        ] {
            let ts = Timestamp::parse(input).unwrap();
            assert_eq!(ts.as_millis(), expected_ms, "parsing {input}");
        }
    }

    #[test]
    fn format_then_parse_is_identity() {
        let ts = Timestamp::from_millis(3_723_456);
        let formatted = ts.format();
        assert_eq!(formatted, "01:02:03.456");
        assert_eq!(Timestamp::parse(&formatted).unwrap(), ts);
    }

    #[test]
    fn ordering() {
        assert!(Timestamp::from_millis(1000) < Timestamp::from_millis(2000));
    }

    #[test]
    fn frames_conversion() {
        assert_eq!(Timestamp::from_frames(75, 75).as_millis(), 1000);
    }

    #[test]
    fn rejects_garbage() {
        assert!(Timestamp::parse("not-a-time").is_err());
        assert!(Timestamp::parse("1:2:3:4").is_err());
    }
}
