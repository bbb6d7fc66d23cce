//! Per-track statistics: counting distributions, the named statistics map
//! and the collector that fills both from the batch stream.

mod collector;
mod container;
mod distribution;

pub use collector::{MappingInfo, PairInfo, PairType, StatsCollector};
pub use container::{StatKey, StatsContainer, StatsError};
pub use distribution::{
    CountingDistribution, DistributionError, DistributionKind, DEFAULT_ADJUSTMENT,
    DEFAULT_BIN_STEPS, NUM_BINS,
};


