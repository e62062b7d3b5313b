use super::error::{StoreError, StoreResult};
use super::state::{StoreState, STORE_VERSION};
use atomic_write_file::AtomicWriteFile;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Default store location (~/.config/couplefin/store.json), or `store.json`
/// inside the given data directory.
pub fn get_store_path(data_dir: Option<&Path>) -> PathBuf {
    match data_dir {
        Some(dir) => dir.join("store.json"),
        None => crate::config::get_config_dir().join("store.json"),
    }
}

/// Load store state from a JSON file
///
/// If the file doesn't exist, returns a new empty state.
/// If the file exists but has an unsupported version, returns an error.
pub fn load_store(path: &Path) -> StoreResult<StoreState> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no store file yet, starting empty");
        return Ok(StoreState::new());
    }

    let file = File::open(path)?;
    let state: StoreState = serde_json::from_reader(BufReader::new(file))?;

    if state.version != STORE_VERSION {
        return Err(StoreError::UnsupportedVersion(state.version));
    }

    tracing::debug!(
        path = %path.display(),
        users = state.users.len(),
        sessions = state.sessions.len(),
        "loaded store"
    );
    Ok(state)
}

/// Save store state to a JSON file atomically
///
/// The file is never left half-written. Parent directories are created on
/// demand.
pub fn save_store(path: &Path, state: &StoreState) -> StoreResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }

    let mut file = AtomicWriteFile::open(path)?;
    serde_json::to_writer_pretty(&mut file, state)?;
    file.commit()?;

    tracing::debug!(path = %path.display(), "saved store");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quiz::Role;
    use crate::store::SessionStore;

    #[test]
    fn test_load_missing_file_returns_empty() {
        let dir = tempfile::tempdir().unwrap();
        let state = load_store(&dir.path().join("store.json")).unwrap();
        assert_eq!(state.version, STORE_VERSION);
        assert!(state.sessions.is_empty());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("store.json");

        let mut state = StoreState::new();
        state.register_user("ada@example.com").unwrap();
        let session = state.create_session("ada@example.com").unwrap();
        state
            .record_answer(session.id, Role::Owner, "q01", 4)
            .unwrap();

        save_store(&path, &state).unwrap();
        let loaded = load_store(&path).unwrap();

        assert_eq!(loaded.users.len(), 1);
        let stored = loaded.session(session.id).unwrap();
        assert_eq!(stored.answers.get("q01"), Some(4));
        assert_eq!(stored, state.session(session.id).unwrap());
    }

    #[test]
    fn test_unsupported_version_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        fs::write(&path, r#"{"version": 7}"#).unwrap();

        let err = load_store(&path).unwrap_err();
        assert!(matches!(err, StoreError::UnsupportedVersion(7)));
    }

    #[test]
    fn test_corrupt_file_is_serialization_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        fs::write(&path, "{not json").unwrap();

        assert!(matches!(
            load_store(&path).unwrap_err(),
            StoreError::Serialization(_)
        ));
    }

    #[test]
    fn test_store_path_in_data_dir() {
        let path = get_store_path(Some(Path::new("/tmp/couplefin")));
        assert_eq!(path, PathBuf::from("/tmp/couplefin/store.json"));
    }
}
