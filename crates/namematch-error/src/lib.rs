//! Shared error type for the namematch workspace.
//!
//! Mirrors the error taxonomy from `SPEC_FULL.md` §7:
//! - degenerate input (empty strings, single characters) is not an error —
//!   it is handled entirely inside the normalizer and scorer, which are
//!   total functions and never return `Result`;
//! - missing config-data files are not fatal — callers get an empty word
//!   set and proceed;
//! - external provider failures (embedding, arbiter) are non-fatal and are
//!   represented here so the matcher can degrade gracefully;
//! - programmer-contract violations (`b_id` out of range, a provider
//!   returning a batch of the wrong length) are fatal: the pipeline must
//!   refuse to return a misleading result rather than silently continue.
use thiserror::Error;

/// Coarse severity classification, mirroring the teacher workspace's
/// `ploke_error::Severity` but collapsed to this crate's narrower needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The pipeline cannot continue and must refuse to produce a result.
    Fatal,
    /// Recoverable: the caller can degrade (skip a feature, fall back).
    Recoverable,
}

/// Workspace-wide error type. Prefer returning `Result<T>` and propagating
/// with `?`; let the caller decide whether to log, retry, or abort.
#[derive(Error, Debug, Clone)]
pub enum Error {
    /// A caller broke an API contract in a way that would otherwise produce
    /// a misleading result (e.g. a `b_id` outside the preprocessed B range,
    /// or an embedding provider returning a batch whose length does not
    /// match the request). Always [`Severity::Fatal`].
    #[error("contract violation: {0}")]
    Contract(String),

    /// The embedding provider failed (network error, malformed response,
    /// dimension mismatch across calls). Non-fatal: the matcher proceeds
    /// without embedding-augmented candidates/semantic scoring.
    #[error("embedding provider error: {0}")]
    Embedding(String),

    /// The arbiter provider failed (transport error, malformed JSON). The
    /// matcher maps this to a synthetic `UNSURE` response and a REVIEW
    /// decision rather than propagating; this variant exists for the
    /// provider implementation itself to report the failure upward.
    #[error("arbiter provider error: {0}")]
    Arbiter(String),

    /// A static word-list or alias/replacement file could not be parsed
    /// (note: a *missing* file is not an error — see [`Error`] docs).
    #[error("config data error: {0}")]
    ConfigData(String),

    #[error("io error: {0}")]
    Io(String),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl Error {
    pub fn severity(&self) -> Severity {
        match self {
            Error::Contract(_) => Severity::Fatal,
            Error::Embedding(_)
            | Error::Arbiter(_)
            | Error::ConfigData(_)
            | Error::Io(_)
            | Error::Serde(_) => Severity::Recoverable,
        }
    }

    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e.to_string())
    }
}

/// Workspace-wide result alias.
pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contract_violations_are_fatal() {
        assert_eq!(Error::Contract("bad b_id".into()).severity(), Severity::Fatal);
    }

    #[test]
    fn provider_failures_are_recoverable() {
        assert_eq!(
            Error::Embedding("timeout".into()).severity(),
            Severity::Recoverable
        );
        assert_eq!(
            Error::Arbiter("timeout".into()).severity(),
            Severity::Recoverable
        );
    }
}
