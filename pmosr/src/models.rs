//! Domain models for the Sveriges Radio catalog
//!
//! These are the shaped entities handed to front-ends. Raw API records are
//! turned into them by [`crate::builder`].

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

// ============================================================================
// Program
// ============================================================================

/// A radio program from the SR catalog
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Program {
    /// SR program id, unique within a catalog
    pub id: i64,
    /// Display name (e.g., "Ekot", "P1 Morgon")
    pub name: String,
    /// Episodes attached by the last refresh, newest first
    #[serde(default)]
    pub episodes: Vec<Episode>,
}

impl Program {
    /// Create a program with no episodes attached
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            episodes: Vec::new(),
        }
    }

    /// The latest episode, i.e. the first one of the last refresh
    pub fn latest_episode(&self) -> Option<&Episode> {
        self.episodes.first()
    }

    /// Replace the attached episodes
    pub(crate) fn set_episodes(&mut self, episodes: Vec<Episode>) {
        self.episodes = episodes;
    }

    /// Back-reference handed to this program's episodes
    pub fn program_ref(&self) -> ProgramRef {
        ProgramRef {
            id: self.id,
            name: self.name.clone(),
        }
    }

    /// Case-insensitive substring match on the program name
    pub fn matches(&self, query: &str) -> bool {
        !query.is_empty() && self.name.to_lowercase().contains(&query.to_lowercase())
    }
}

/// Non-owning reference from an episode to its program
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProgramRef {
    pub id: i64,
    pub name: String,
}

// ============================================================================
// Episode
// ============================================================================

/// One episode of a program
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Episode {
    pub id: i64,
    pub title: String,
    pub description: String,
    /// Owning program (lookup only)
    pub program: ProgramRef,
    /// Playable audio URL, empty when the API exposed none
    #[serde(default)]
    pub audio_url: String,
}

impl Episode {
    /// Whether a playable URL was resolved
    pub fn has_audio(&self) -> bool {
        !self.audio_url.is_empty()
    }

    /// The audio URL, or [`Error::NoAudioUrlFound`] when it is empty
    pub fn require_audio_url(&self) -> Result<&str> {
        if self.has_audio() {
            Ok(&self.audio_url)
        } else {
            Err(Error::NoAudioUrlFound {
                episode_id: self.id,
            })
        }
    }
}
