//! Reads search payloads from disk and validates them.

use std::path::Path;

use tracing::{debug, instrument};

use crate::application::{parse_records, parse_response, ApplicationError, SearchResponse};
use crate::domain::CombinationRecord;
use crate::infrastructure::error::{InfraError, InfraResult};
use crate::infrastructure::traits::FileSystem;

fn read(fs: &dyn FileSystem, path: &Path) -> InfraResult<String> {
    if !fs.is_file(path) {
        return Err(InfraError::io(
            format!("reading {}", path.display()),
            std::io::Error::new(std::io::ErrorKind::NotFound, "not a file"),
        ));
    }
    fs.read_to_string(path)
        .map_err(|e| InfraError::io(format!("reading {}", path.display()), e))
}

/// Load a search response (`recipes`, `metrics`, optional `liveUpdateSteps`).
#[instrument(level = "debug", skip(fs))]
pub fn load_response(fs: &dyn FileSystem, path: &Path) -> InfraResult<SearchResponse> {
    let json = read(fs, path)?;
    let response = parse_response(&json).map_err(ApplicationError::from)?;
    debug!(
        recipes = response.recipes.len(),
        live_steps = response.live_update_steps.as_ref().map_or(0, Vec::len),
        "response loaded"
    );
    Ok(response)
}

/// Load a flat array of combination records, e.g. a full item catalog.
#[instrument(level = "debug", skip(fs))]
pub fn load_records(fs: &dyn FileSystem, path: &Path) -> InfraResult<Vec<CombinationRecord>> {
    let json = read(fs, path)?;
    let records = parse_records(&json).map_err(ApplicationError::from)?;
    debug!(records = records.len(), "records loaded");
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io;
    use std::path::PathBuf;

    #[derive(Default)]
    struct MemoryFs {
        files: HashMap<PathBuf, String>,
    }

    impl FileSystem for MemoryFs {
        fn read_to_string(&self, path: &Path) -> io::Result<String> {
            self.files
                .get(path)
                .cloned()
                .ok_or_else(|| io::Error::from(io::ErrorKind::NotFound))
        }

        fn is_file(&self, path: &Path) -> bool {
            self.files.contains_key(path)
        }
    }

    #[test]
    fn given_missing_file_when_loading_then_io_error() {
        let fs = MemoryFs::default();
        let err = load_response(&fs, Path::new("/nowhere.json")).unwrap_err();
        assert!(matches!(err, InfraError::Io { .. }));
    }

    #[test]
    fn given_record_array_when_loading_then_records_returned() {
        let mut fs = MemoryFs::default();
        fs.files.insert(
            PathBuf::from("/catalog.json"),
            r#"[{"element1": "Water", "element2": "Earth", "result": "Mud"}]"#.to_string(),
        );
        let records = load_records(&fs, Path::new("/catalog.json")).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].result, "Mud");
    }

    #[test]
    fn given_invalid_json_when_loading_then_schema_error() {
        let mut fs = MemoryFs::default();
        fs.files
            .insert(PathBuf::from("/bad.json"), "{ not json".to_string());
        let err = load_response(&fs, Path::new("/bad.json")).unwrap_err();
        assert!(matches!(
            err,
            InfraError::Application(ApplicationError::Schema(_))
        ));
    }
}
