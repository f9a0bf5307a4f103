use std::fmt::Debug;
use std::time::Duration;

/// Pacing strategy consulted after every received chunk.
///
/// Given the size of the chunk that just arrived and the time elapsed since
/// the previous one, returns how long the stream must stay paused before the
/// next chunk may be pulled.
pub trait RateLimiter: Send + Sync + Debug {
    fn pause_after(&self, chunk_len: usize, since_last_chunk: Duration) -> Duration;
}

/// No ceiling configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unlimited;

impl RateLimiter for Unlimited {
    fn pause_after(&self, _chunk_len: usize, _since_last_chunk: Duration) -> Duration {
        Duration::ZERO
    }
}

/// Leaky-bucket pacing at chunk granularity: a chunk of `n` bytes must take
/// at least `n / bytes_per_sec` seconds; whatever part of that the network
/// did not already spend is slept off before the next read.
#[derive(Debug, Clone, Copy)]
pub struct BandwidthCeiling {
    bytes_per_sec: u64,
}

impl BandwidthCeiling {
    /// `None` when the ceiling is zero, i.e. throttling disabled.
    pub fn new(bytes_per_sec: u64) -> Option<Self> {
        (bytes_per_sec > 0).then_some(Self { bytes_per_sec })
    }

    /// Ceiling expressed in KiB/s, the unit users type in.
    pub fn from_kbps(kbps: u64) -> Option<Self> {
        Self::new(kbps.saturating_mul(1024))
    }

    pub fn bytes_per_sec(&self) -> u64 {
        self.bytes_per_sec
    }

    /// Minimum wall-clock time a chunk of `chunk_len` bytes may take,
    /// rounded up to the next millisecond.
    pub fn expected_duration(&self, chunk_len: usize) -> Duration {
        let millis = (chunk_len as u64 * 1000).div_ceil(self.bytes_per_sec);
        Duration::from_millis(millis)
    }
}

impl RateLimiter for BandwidthCeiling {
    fn pause_after(&self, chunk_len: usize, since_last_chunk: Duration) -> Duration {
        self.expected_duration(chunk_len)
            .saturating_sub(since_last_chunk)
    }
}

/// Throttle setting for one install invocation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Throttle {
    #[default]
    Unlimited,
    BytesPerSec(u64),
}

impl Throttle {
    pub fn from_kbps(kbps: u64) -> Self {
        match BandwidthCeiling::from_kbps(kbps) {
            Some(ceiling) => Throttle::BytesPerSec(ceiling.bytes_per_sec()),
            None => Throttle::Unlimited,
        }
    }

    pub fn limiter(self) -> Box<dyn RateLimiter> {
        match self {
            Throttle::BytesPerSec(bps) => match BandwidthCeiling::new(bps) {
                Some(ceiling) => Box::new(ceiling),
                None => Box::new(Unlimited),
            },
            Throttle::Unlimited => Box::new(Unlimited),
        }
    }
}
