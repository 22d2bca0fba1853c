use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::library_parser::LibraryParser;
use crate::models::Library;

/// Export locations relative to the home directory, newest layout first.
const LIBRARY_CANDIDATES: &[&str] = &[
    "Music/Music/Library.xml",
    "Music/iTunes/iTunes Music Library.xml",
    "Music/iTunes/iTunes Library.xml",
];

/// Candidate paths of the library export of the current user.
#[must_use]
pub fn default_library_paths() -> Vec<PathBuf> {
    let Some(home) = dirs::home_dir() else {
        return Vec::new();
    };
    library_paths_in(&home)
}

/// The first of [`default_library_paths`] that exists.
#[must_use]
pub fn find_default_library() -> Option<PathBuf> {
    default_library_paths().into_iter().find(|path| path.is_file())
}

fn library_paths_in(home: &Path) -> Vec<PathBuf> {
    LIBRARY_CANDIDATES
        .iter()
        .map(|candidate| home.join(candidate))
        .collect()
}

/// Opens and decodes the library export at `path`.
pub fn parse_library<P: AsRef<Path>>(path: P) -> Result<Library> {
    parse_library_with(&LibraryParser::new(), path)
}

pub fn parse_library_with<P: AsRef<Path>>(parser: &LibraryParser, path: P) -> Result<Library> {
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("Failed to open library file {}", path.display()))?;
    let library = parser
        .read(BufReader::new(file))
        .with_context(|| format!("Failed to read iTunes Library XML {}", path.display()))?;
    Ok(library)
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::{default_library_paths, find_default_library, library_paths_in};

    #[test]
    fn default_library_is_an_existing_candidate() {
        let candidates = default_library_paths();
        assert!(candidates.iter().all(|path| path.extension().is_some_and(|ext| ext == "xml")));
        if let Some(path) = find_default_library() {
            assert!(path.is_file());
            assert!(candidates.contains(&path));
        }
    }

    #[test]
    fn candidates_live_under_home_music() {
        let paths = library_paths_in(Path::new("/Users/me"));
        assert_eq!(paths.len(), 3);
        assert!(paths.iter().all(|path| path.starts_with("/Users/me/Music")));
        assert_eq!(
            paths[1],
            Path::new("/Users/me/Music/iTunes/iTunes Music Library.xml")
        );
    }
}
