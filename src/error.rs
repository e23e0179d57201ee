#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Song {song_id} is already in this setlist")]
    DuplicateSong { song_id: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Internal engine error")]
    Internal(#[from] anyhow::Error),
}

impl EngineError {
    pub fn duplicate(song_id: impl Into<String>) -> Self {
        EngineError::DuplicateSong {
            song_id: song_id.into(),
        }
    }
}

impl From<validator::ValidationErrors> for EngineError {
    fn from(errors: validator::ValidationErrors) -> Self {
        EngineError::Validation(errors.to_string())
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
