//! Shaping raw SR records into [`Program`] and [`Episode`]
//!
//! The API is loose about types: ids show up as integers, floats or strings
//! depending on the endpoint, and the audio file of an episode lives in one
//! of two places. Everything here is tolerant of that, but a record missing
//! a required field is rejected with [`Error::MalformedRecord`].

use crate::error::{Error, Result};
use crate::models::{Episode, Program, ProgramRef};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::warn;

// ============================================================================
// Raw API records
// ============================================================================

#[derive(Debug, Deserialize)]
struct RawProgram {
    #[serde(deserialize_with = "deserialize_id")]
    id: i64,
    name: String,
}

#[derive(Debug, Deserialize)]
struct RawEpisode {
    #[serde(deserialize_with = "deserialize_id")]
    id: i64,
    title: String,
    description: String,
    program: RawProgram,
    #[serde(default)]
    downloadpodfile: Option<RawFile>,
    #[serde(default)]
    broadcast: Option<RawBroadcast>,
}

#[derive(Debug, Deserialize)]
struct RawFile {
    #[serde(default)]
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawBroadcast {
    #[serde(default)]
    broadcastfiles: Option<Vec<RawFile>>,
}

impl RawEpisode {
    /// Podcast file first, then the first broadcast file.
    ///
    /// SR gives no ordering field for `broadcastfiles`, so taking the first
    /// one is a heuristic.
    fn audio_url(&self) -> Option<&str> {
        let podfile = self
            .downloadpodfile
            .as_ref()
            .and_then(|f| f.url.as_deref())
            .filter(|url| !url.is_empty());

        podfile.or_else(|| {
            self.broadcast
                .as_ref()
                .and_then(|b| b.broadcastfiles.as_ref())
                .and_then(|files| files.first())
                .and_then(|f| f.url.as_deref())
                .filter(|url| !url.is_empty())
        })
    }
}

// ============================================================================
// Id coercion
// ============================================================================

/// Coerce an SR id into a canonical integer
///
/// Accepts JSON integers, integral floats (`4540.0`) and numeric strings
/// (`"4540"`). Anything else yields `None`.
pub fn coerce_id(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) if n.is_f64() => n
            .as_f64()
            .filter(|f| f.is_finite() && f.fract() == 0.0)
            .filter(|f| *f >= i64::MIN as f64 && *f <= i64::MAX as f64)
            .map(|f| f as i64),
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn deserialize_id<'de, D>(deserializer: D) -> std::result::Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    coerce_id(&value).ok_or_else(|| D::Error::custom(format!("invalid id: {}", value)))
}

// ============================================================================
// Builders
// ============================================================================

/// Build a [`Program`] from one raw `programs` record
pub fn build_program(raw: &Value) -> Result<Program> {
    let raw = RawProgram::deserialize(raw)
        .map_err(|e| Error::malformed_record("program", e.to_string()))?;
    Ok(Program::new(raw.id, raw.name))
}

/// Build an [`Episode`] from one raw `episodes` record
///
/// An episode without any audio URL is still built, with an empty
/// `audio_url`, and a warning is logged.
pub fn build_episode(raw: &Value) -> Result<Episode> {
    let raw = RawEpisode::deserialize(raw)
        .map_err(|e| Error::malformed_record("episode", e.to_string()))?;

    let audio_url = match raw.audio_url() {
        Some(url) => url.to_string(),
        None => {
            let gap = Error::NoAudioUrlFound { episode_id: raw.id };
            warn!(program_id = raw.program.id, "{}", gap);
            String::new()
        }
    };

    Ok(Episode {
        id: raw.id,
        title: raw.title,
        description: raw.description,
        program: ProgramRef {
            id: raw.program.id,
            name: raw.program.name,
        },
        audio_url,
    })
}

/// Build one [`Program`] per raw record, failing on the first bad record
pub fn build_programs<'a>(raw: impl IntoIterator<Item = &'a Value>) -> Result<Vec<Program>> {
    raw.into_iter().map(build_program).collect()
}
