use thiserror::Error;

/// Errors raised by the per-cluster calling pipeline.
///
/// `NumericUnderflow` from the design notes is intentionally absent here: it is
/// recoverable in place (log-likelihood rescaling substitutes a sentinel
/// rather than failing), so it never needs to surface as an `Err`.
#[derive(Error, Debug, PartialEq, Eq, Clone)]
pub enum Error {
    #[error("invalid argument: {msg}")]
    InvalidArgument { msg: String },
    #[error("reference window of length {window_len} is too short for k-mer size {kmer_size}")]
    ReferenceWindowTooShortForKmer { window_len: usize, kmer_size: usize },
    #[error("two variants cannot coexist on a haplotype: {msg}")]
    InvalidCombination { msg: String },
    #[error("precondition violated: {msg}")]
    PreconditionViolated { msg: String },
    #[error("variants are not joinable: {msg}")]
    NotJoinable { msg: String },
    #[error("cluster skipped: {reason}")]
    SkipCluster { reason: String },
}

pub type Result<T> = std::result::Result<T, Error>;
