//! Running traffic counters: per-host stats, per-protocol totals, and the
//! packets-per-second rate. All of these update on the ingestion path,
//! independent of flow windowing, and only ever grow.

pub mod hosts;
pub mod protocols;
pub mod rate;

pub use hosts::{HostStatsTracker, TopTalker};
pub use protocols::ProtocolCounter;
pub use rate::RateCalculator;
