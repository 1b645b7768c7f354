// Cluster driver and phase aligner: C9 (spec.md §4.9), grounded on
// `original_source/cpp/src/caller/job.cpp` for the per-cluster orchestration
// and `caller/alignPhasing.{hpp,cpp}` / `caller/mergeLargeVariantCalls.{hpp,cpp}`
// for the two cross-cluster reconciliation passes. The teacher's closest
// shape is `calling::variants::preprocessing`'s `ObservationProcessor`, which
// plays the same "glue everything together for one block" role.

pub mod driver;
pub mod merge;
pub mod phase;
pub mod refblock;

pub use driver::{run_cluster, ClusterInput, ClusterOutcome};
pub use phase::{phase_align, ClusterPhaseState};
