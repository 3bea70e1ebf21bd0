use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

const SEQUENCE_BITS: u32 = 12;
const MACHINE_ID_BITS: u32 = 10;
const TIMESTAMP_SHIFT: u32 = MACHINE_ID_BITS + SEQUENCE_BITS;
const SEQUENCE_MASK: i64 = (1 << SEQUENCE_BITS) - 1;

/// A time-ordered 64-bit user identifier using the Snowflake layout: 42-bit
/// millisecond timestamp, 10-bit machine id, 12-bit sequence. The text form
/// is lowercase hex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UserId(u64);

impl UserId {
    /// Generate a fresh user id from the process-wide generator.
    #[must_use]
    pub fn generate() -> Self {
        GENERATOR.next()
    }

    /// Construct from a raw 64-bit value.
    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw 64-bit value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// The time the id was generated, recovered from the timestamp bits.
    #[must_use]
    pub fn created_at(self) -> DateTime<Utc> {
        let millis = (self.0 >> TIMESTAMP_SHIFT) as i64;
        Utc.timestamp_millis_opt(millis)
            .single()
            .unwrap_or_default()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:x}", self.0)
    }
}

/// Error returned when a user id fails to parse from its hex form.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid user ID: {0:?}")]
pub struct ParseUserIdError(pub String);

impl FromStr for UserId {
    type Err = ParseUserIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        u64::from_str_radix(s, 16)
            .map(Self)
            .map_err(|_| ParseUserIdError(s.into()))
    }
}

impl Serialize for UserId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for UserId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

static GENERATOR: UserIdGenerator = UserIdGenerator::new();

/// Lock-free Snowflake generator.
///
/// A single atomic packs the last-used timestamp (upper bits) and sequence
/// (lower 12 bits) so a concurrent reader can never observe a stale
/// sequence against a fresh timestamp.
struct UserIdGenerator {
    ts_seq: AtomicI64,
}

impl UserIdGenerator {
    const fn new() -> Self {
        // timestamp = -1 so the first compare-exchange always advances.
        Self {
            ts_seq: AtomicI64::new(-1 << SEQUENCE_BITS),
        }
    }

    fn next(&self) -> UserId {
        loop {
            let now = current_millis();
            let current = self.ts_seq.load(Ordering::Acquire);
            let last_ts = current >> SEQUENCE_BITS;

            let (ts, seq) = if now > last_ts {
                (now, 0)
            } else {
                // Clock stalled or stepped back: stay on the last timestamp
                // and burn sequence numbers until it catches up.
                let seq = (current & SEQUENCE_MASK) + 1;
                if seq > SEQUENCE_MASK {
                    std::thread::yield_now();
                    continue;
                }
                (last_ts, seq)
            };

            let packed = (ts << SEQUENCE_BITS) | seq;
            if self
                .ts_seq
                .compare_exchange_weak(current, packed, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                // Machine id bits stay zero; this server is single-process.
                let id = ((ts as u64) << TIMESTAMP_SHIFT) | (seq as u64);
                return UserId(id);
            }
        }
    }
}

fn current_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn text_round_trip() {
        let id = UserId::from_raw(0xdead_beef_cafe);
        assert_eq!(id.to_string(), "deadbeefcafe");
        assert_eq!("deadbeefcafe".parse::<UserId>().unwrap(), id);
        assert!("zzz".parse::<UserId>().is_err());
    }

    #[test]
    fn generated_ids_are_unique_and_ordered() {
        let mut seen = HashSet::new();
        let mut last = UserId::from_raw(0);
        for _ in 0..4096 {
            let id = UserId::generate();
            assert!(seen.insert(id), "duplicate id generated");
            assert!(id > last, "ids must be monotonically increasing");
            last = id;
        }
    }

    #[test]
    fn creation_time_is_recoverable() {
        let before = Utc::now() - chrono::Duration::seconds(1);
        let id = UserId::generate();
        let after = Utc::now() + chrono::Duration::seconds(1);
        assert!(id.created_at() > before);
        assert!(id.created_at() < after);
    }

    #[test]
    fn serializes_as_hex_string() {
        let id = UserId::from_raw(255);
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"ff\"");
        assert_eq!(serde_json::from_str::<UserId>("\"ff\"").unwrap(), id);
    }
}
