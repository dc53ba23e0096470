//! Access to the recording sessions.
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use crate::dataset::filter::DatasetFilter;
use crate::dataset::session::SessionRecord;
use crate::error::AnalysisError;

/// A source of recording sessions.
pub trait SessionSource {
    /// Returns the sessions matching the filter.
    fn fetch_sessions(&self, filter: &DatasetFilter) -> Result<Vec<SessionRecord>, AnalysisError>;
}

/// Sessions held in memory and persisted as a JSON file.
#[derive(Debug, PartialEq, Clone, Default, Serialize, Deserialize)]
pub struct JsonSessionStore {
    sessions: Vec<SessionRecord>,
}

impl JsonSessionStore {
    pub fn new(sessions: Vec<SessionRecord>) -> Self {
        JsonSessionStore { sessions }
    }

    pub fn sessions(&self) -> &[SessionRecord] {
        &self.sessions[..]
    }

    pub fn num_sessions(&self) -> usize {
        self.sessions.len()
    }

    pub fn add_session(&mut self, session: SessionRecord) {
        self.sessions.push(session);
    }

    /// Save the store to a file.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> Result<(), AnalysisError> {
        let file = File::create(path).map_err(|e| AnalysisError::IOError(e.to_string()))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, self)
            .map_err(|e| AnalysisError::IOError(e.to_string()))?;
        writer.flush().map_err(|e| AnalysisError::IOError(e.to_string()))
    }

    /// Load a store from a file.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, AnalysisError> {
        let file = File::open(path).map_err(|e| AnalysisError::IOError(e.to_string()))?;
        let reader = BufReader::new(file);
        serde_json::from_reader(reader).map_err(|e| AnalysisError::IOError(e.to_string()))
    }
}

impl SessionSource for JsonSessionStore {
    fn fetch_sessions(&self, filter: &DatasetFilter) -> Result<Vec<SessionRecord>, AnalysisError> {
        let sessions: Vec<SessionRecord> = self
            .sessions
            .iter()
            .filter(|session| filter.matches(session))
            .cloned()
            .collect();
        log::info!(
            "{} sessions out of {} match the dataset filter",
            sessions.len(),
            self.sessions.len()
        );
        Ok(sessions)
    }
}
