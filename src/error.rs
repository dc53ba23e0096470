//! Error module for the spike periodicity library.
use std::error::Error;
use std::fmt;

/// Error types for the library.
#[derive(Debug, PartialEq)]
pub enum AnalysisError {
    /// Error for an invalid interval, e.g., start after end or non-finite bounds.
    InvalidInterval { start: f64, end: f64 },
    /// Error for an interval set which is not sorted or contains overlapping intervals.
    InvalidIntervalSet(String),
    /// Error for invalid spike times, e.g., NaN or infinite values.
    InvalidSpikeTimes(String),
    /// Error for invalid histogram bin edges, e.g., not strictly increasing.
    InvalidBinEdges(String),
    /// Error for invalid parameters.
    InvalidParameter(String),
    /// Missing or inconsistent data within a session,
    /// e.g., an unexpected number of decoding models.
    InconsistentData(String),
    /// Error for I/O operations.
    IOError(String),
}

impl fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AnalysisError::InvalidInterval { start, end } => {
                write!(f, "Invalid interval: [{}, {}]", start, end)
            }
            AnalysisError::InvalidIntervalSet(e) => write!(f, "Invalid interval set: {}", e),
            AnalysisError::InvalidSpikeTimes(e) => write!(f, "Invalid spike times: {}", e),
            AnalysisError::InvalidBinEdges(e) => write!(f, "Invalid bin edges: {}", e),
            AnalysisError::InvalidParameter(e) => write!(f, "Invalid parameters: {}", e),
            AnalysisError::InconsistentData(e) => write!(f, "Inconsistent data: {}", e),
            AnalysisError::IOError(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl Error for AnalysisError {}
