//! Flat-file persistence for the dashboard message id and last status.
//!
//! The file is read whole at cycle start and rewritten whole at cycle end.
//! Cycles never overlap, so no locking is needed; the only discipline is
//! writing through a temp file so a crash mid-write leaves the previous
//! state readable.

use std::fs;
use std::io;
use std::path::Path;

use crate::core::ent::PersistedState;

/// A missing or malformed state file is an empty state, never an error.
pub fn load(path: &Path) -> PersistedState {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) => {
            if err.kind() != io::ErrorKind::NotFound {
                tracing::warn!("state file {} unreadable: {err}", path.display());
            }
            return PersistedState::default();
        }
    };
    match serde_json::from_str(&raw) {
        Ok(state) => state,
        Err(err) => {
            tracing::warn!("state file {} malformed, starting fresh: {err}", path.display());
            PersistedState::default()
        }
    }
}

pub fn save(path: &Path, state: &PersistedState) -> io::Result<()> {
    let raw = serde_json::to_string_pretty(state)
        .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, raw)?;
    fs::rename(&tmp, path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ent::StatusLevel;

    #[test]
    fn round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        let state = PersistedState {
            message_id: Some("123".to_string()),
            last_status: Some(StatusLevel::Warn),
        };
        save(&path, &state).unwrap();
        assert_eq!(load(&path), state);
    }

    #[test]
    fn missing_file_is_empty_state() {
        let dir = tempfile::tempdir().unwrap();
        let state = load(&dir.path().join("nope.json"));
        assert_eq!(state, PersistedState::default());
    }

    #[test]
    fn malformed_file_is_empty_state() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, "{not json").unwrap();
        assert_eq!(load(&path), PersistedState::default());
    }

    #[test]
    fn save_replaces_previous_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        save(
            &path,
            &PersistedState {
                message_id: Some("old".to_string()),
                last_status: Some(StatusLevel::Ok),
            },
        )
        .unwrap();
        let next = PersistedState {
            message_id: Some("new".to_string()),
            last_status: Some(StatusLevel::Down),
        };
        save(&path, &next).unwrap();
        assert_eq!(load(&path), next);
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn state_json_uses_camel_case_keys() {
        let state = PersistedState {
            message_id: Some("123".to_string()),
            last_status: Some(StatusLevel::Warn),
        };
        let raw = serde_json::to_string(&state).unwrap();
        assert!(raw.contains("\"messageId\""));
        assert!(raw.contains("\"lastStatus\""));
    }
}
