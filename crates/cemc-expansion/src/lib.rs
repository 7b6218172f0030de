#![deny(missing_docs)]

//! Feature/energy processors for cluster-expansion Hamiltonians: full and
//! incremental correlation evaluation over orbit data, an electrostatic pair
//! term, and a composite summing independent contributions.

pub mod composite;
pub mod ewald;
pub mod orbit;
pub mod processor;

pub use composite::CompositeProcessor;
pub use ewald::EwaldProcessor;
pub use orbit::{CorrelationTable, Orbit};
pub use processor::{site_space_sizes, verify_delta, ClusterProcessor, Processor};
