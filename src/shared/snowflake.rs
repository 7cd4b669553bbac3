//! Snowflake ID Generator
//!
//! Time-ordered 63-bit ids: 41 bits of milliseconds since a configurable
//! epoch, 5 bits machine, 5 bits node, 12 bits sequence. Ids from one
//! generator increase over time; ticket messages additionally get their
//! final id under a per-ticket lock.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Default epoch (2024-01-01T00:00:00.000Z)
pub const DEFAULT_EPOCH: u64 = 1704067200000;

const SEQUENCE_BITS: u64 = 12;
const SEQUENCE_MASK: u64 = (1 << SEQUENCE_BITS) - 1;

/// Snowflake ID generator
pub struct SnowflakeGenerator {
    epoch: u64,
    machine_id: u64,
    node_id: u64,
    /// `(timestamp << 12) | sequence` of the last issued id
    state: AtomicU64,
}

impl SnowflakeGenerator {
    /// Create a generator using the default epoch
    pub fn new(machine_id: u64, node_id: u64) -> Self {
        Self::with_epoch(machine_id, node_id, DEFAULT_EPOCH)
    }

    /// Create a generator with a custom epoch in unix milliseconds
    pub fn with_epoch(machine_id: u64, node_id: u64, epoch: u64) -> Self {
        Self {
            epoch,
            machine_id: machine_id & 0x1F,
            node_id: node_id & 0x1F,
            state: AtomicU64::new(0),
        }
    }

    /// Generate a new snowflake ID
    pub fn generate(&self) -> i64 {
        loop {
            let now = self.current_timestamp();
            let last = self.state.load(Ordering::Acquire);
            let last_ts = last >> SEQUENCE_BITS;

            // Clock going backwards is treated as "same millisecond"
            let (ts, seq) = if now > last_ts {
                (now, 0)
            } else {
                let seq = (last & SEQUENCE_MASK) + 1;
                if seq > SEQUENCE_MASK {
                    (last_ts + 1, 0)
                } else {
                    (last_ts, seq)
                }
            };

            let next = (ts << SEQUENCE_BITS) | seq;
            if self
                .state
                .compare_exchange(last, next, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                let id = ((ts.saturating_sub(self.epoch)) << 22)
                    | (self.machine_id << 17)
                    | (self.node_id << 12)
                    | seq;
                return id as i64;
            }
        }
    }

    fn current_timestamp(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(self.epoch)
    }
}

/// Parse an id from its JSON string form
pub fn parse_id(s: &str) -> Result<i64, std::num::ParseIntError> {
    s.parse()
}
