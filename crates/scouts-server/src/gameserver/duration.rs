use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A span of game-clock time in nanoseconds. A negative value means
/// infinite. The text form is either `"∞"` or decimal seconds with an `s`
/// suffix (`"30s"`, `"0.5s"`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GameDuration(i64);

impl GameDuration {
    /// The infinite duration sentinel.
    pub const INFINITE: Self = Self(-1);
    /// Zero time left.
    pub const ZERO: Self = Self(0);

    /// Construct from nanoseconds. Any negative value reads as infinite.
    #[must_use]
    pub const fn from_nanos(nanos: i64) -> Self {
        Self(nanos)
    }

    /// Construct from whole seconds.
    #[must_use]
    pub const fn from_secs(secs: i64) -> Self {
        Self(secs * 1_000_000_000)
    }

    /// Construct from whole milliseconds.
    #[must_use]
    pub const fn from_millis(millis: i64) -> Self {
        Self(millis * 1_000_000)
    }

    /// Nanosecond count; negative when infinite.
    #[must_use]
    pub const fn as_nanos(self) -> i64 {
        self.0
    }

    /// Whether this duration is the infinite sentinel.
    #[must_use]
    pub const fn is_infinite(self) -> bool {
        self.0 < 0
    }

    /// Whether this duration is exactly zero.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// A pair of infinite durations, as reported for untimed games.
    #[must_use]
    pub const fn infinite_pair() -> [Self; 2] {
        [Self::INFINITE, Self::INFINITE]
    }

    /// Convert to a std duration; `None` when infinite.
    #[must_use]
    pub fn to_std(self) -> Option<std::time::Duration> {
        u64::try_from(self.0)
            .ok()
            .map(std::time::Duration::from_nanos)
    }
}

impl fmt::Display for GameDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 < 0 {
            return write!(f, "∞");
        }
        let secs = self.0 as f64 / 1e9;
        write!(f, "{secs}s")
    }
}

/// Error returned when a duration fails to parse.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid duration: {0:?}")]
pub struct ParseGameDurationError(pub String);

impl FromStr for GameDuration {
    type Err = ParseGameDurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "∞" {
            return Ok(Self::INFINITE);
        }
        let digits = s.strip_suffix('s').unwrap_or(s);
        let secs: f64 = digits
            .parse()
            .map_err(|_| ParseGameDurationError(s.into()))?;
        Ok(Self((secs * 1e9) as i64))
    }
}

impl Serialize for GameDuration {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for GameDuration {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
