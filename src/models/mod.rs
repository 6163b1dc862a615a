pub mod aggregate;
pub mod consensus;
pub mod observation;

pub use aggregate::{attributes, Aggregate, CorruptAggregate, LatestValues, SessionTotals};
pub use consensus::{Consensus, ConsensusLookup};
pub use observation::{
    validation::{ValidationError, ValidationLimits},
    Observation, ObservationPayload,
};
