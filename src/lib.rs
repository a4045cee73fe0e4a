// Ripple: information-cascade reconstruction and structural metrics.
//
// This is the library root. `cascade` rebuilds the propagation graph from
// post records, `metrics` measures it (whole or over time), and `records`
// loads the records from simulation output.

pub mod cascade;
pub mod config;
pub mod metrics;
pub mod output;
pub mod records;

#[cfg(feature = "sqlite")]
pub mod status;
