// Logging stays out of the core proper (design notes: "Logger as global").
// `Reporter` is the seam: a zero-cost no-op default, with a `log`-backed
// implementation available for anything that does want process-wide logging.
// Installing a concrete `log` backend (a `fern` dispatch, `env_logger`, ...)
// is left to whatever embeds this crate.

/// Somewhere to report skipped clusters, assembly fallbacks and the like.
/// Implementations are expected to be cheap to clone/share (`Copy` types or
/// `Arc`-wrapped loggers).
pub trait Reporter {
    fn cluster_skipped(&self, region: &crate::region::Region, reason: &str) {
        let _ = (region, reason);
    }

    fn kmer_escalated(&self, region: &crate::region::Region, from: usize, to: usize) {
        let _ = (region, from, to);
    }

    fn assembly_fallback(&self, region: &crate::region::Region) {
        let _ = region;
    }
}

/// Default no-op reporter; used wherever a caller does not care about progress
/// output (unit tests, library embedding).
#[derive(Clone, Copy, Debug, Default)]
pub struct NullReporter;

impl Reporter for NullReporter {}

/// Reporter that forwards to the `log` facade at the levels the original
/// engine used (`WECALL_LOG(SUPER_DEBUG, ...)` calls became `log::debug!`).
#[derive(Clone, Copy, Debug, Default)]
pub struct LogReporter;

impl Reporter for LogReporter {
    fn cluster_skipped(&self, region: &crate::region::Region, reason: &str) {
        log::info!("skipping cluster at {}: {}", region, reason);
    }

    fn kmer_escalated(&self, region: &crate::region::Region, from: usize, to: usize) {
        log::debug!("escalating k-mer size at {} from {} to {}", region, from, to);
    }

    fn assembly_fallback(&self, region: &crate::region::Region) {
        log::debug!("falling back to assembly at {}", region);
    }
}
