//! TSID Generator
//!
//! Time-Sorted IDs as 13-character Crockford Base32 strings.

use std::sync::atomic::{AtomicU16, Ordering};

use chrono::Utc;
use rand::Rng;

/// Crockford Base32 alphabet (excludes I, L, O, U)
const ALPHABET: &[u8] = b"0123456789ABCDEFGHJKMNPQRSTVWXYZ";

const TSID_LEN: usize = 13;

static COUNTER: AtomicU16 = AtomicU16::new(0);

pub struct TsidGenerator;

impl TsidGenerator {
    /// Generate a new TSID, e.g. `0HZXEQ5Y8JY5Z`.
    ///
    /// Layout (64 bits):
    /// - 42 bits: milliseconds since the Unix epoch
    /// - 10 bits: random
    /// - 12 bits: counter (4096 ids per millisecond)
    pub fn generate() -> String {
        let now = Utc::now().timestamp_millis().max(0) as u64;
        let counter = COUNTER.fetch_add(1, Ordering::SeqCst) as u64;
        let random: u64 = rand::thread_rng().gen_range(0..1024);

        let tsid = ((now & 0x3FF_FFFF_FFFF) << 22) | (random << 12) | (counter & 0xFFF);
        encode_crockford(tsid)
    }

    /// Human-readable document number, e.g. `INV-0HZXEQ5Y8JY5Z`.
    pub fn prefixed(prefix: &str) -> String {
        format!("{}-{}", prefix, Self::generate())
    }

    pub fn to_long(tsid: &str) -> Option<i64> {
        decode_crockford(tsid).map(|v| v as i64)
    }

    pub fn from_long(value: i64) -> String {
        encode_crockford(value as u64)
    }

    pub fn is_valid(tsid: &str) -> bool {
        decode_crockford(tsid).is_some()
    }
}

fn encode_crockford(mut value: u64) -> String {
    let mut result = [b'0'; TSID_LEN];
    for slot in result.iter_mut().rev() {
        *slot = ALPHABET[(value & 0x1F) as usize];
        value >>= 5;
    }
    result.iter().map(|&b| b as char).collect()
}

fn decode_crockford(s: &str) -> Option<u64> {
    if s.len() != TSID_LEN {
        return None;
    }

    let mut result: u64 = 0;
    for c in s.chars() {
        let c = c.to_ascii_uppercase();
        let val = match c {
            '0'..='9' => c as u64 - '0' as u64,
            'A'..='H' => c as u64 - 'A' as u64 + 10,
            'J'..='K' => c as u64 - 'J' as u64 + 18,
            'M'..='N' => c as u64 - 'M' as u64 + 20,
            'P'..='T' => c as u64 - 'P' as u64 + 22,
            'V'..='Z' => c as u64 - 'V' as u64 + 27,
            _ => return None,
        };
        result = (result << 5) | val;
    }
    Some(result)
}
