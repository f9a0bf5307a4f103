mod client;
mod throttle;
mod transport;

pub use client::{
    file_matches_sha1, file_sha1, AssetKind, TransferEngine, TransferOutcome, TransferProgress,
    TransferTask,
};
pub use throttle::{BandwidthCeiling, RateLimiter, Throttle, Unlimited};
pub use transport::{ByteStream, HttpTransport, Transport, TransportResponse};
