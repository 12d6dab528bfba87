use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::PlayerError;

/// The JSON document listing the selectable tracks and the page title.
///
/// `filepaths` and `songnames` are parallel arrays joined by index. Their
/// lengths are not cross-checked.
#[derive(Debug, Clone, Deserialize)]
pub struct TrackList {
    pub filepaths: Vec<String>,
    pub songnames: Vec<String>,
    pub defaultsong: String,
    pub title: String,
    /// Directory relative track paths are resolved against.
    #[serde(skip)]
    pub base_dir: Option<PathBuf>,
}

/// One entry of the track selector: what the user sees and what gets loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackOption {
    pub label: String,
    pub value: String,
}

impl TrackList {
    pub fn parse(text: &str) -> Result<Self, PlayerError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Selector entries in file order; a missing name yields an empty label.
    pub fn options(&self) -> Vec<TrackOption> {
        self.filepaths
            .iter()
            .enumerate()
            .map(|(i, path)| TrackOption {
                label: self.songnames.get(i).cloned().unwrap_or_default(),
                value: path.clone(),
            })
            .collect()
    }

    pub fn resolve(&self, value: &str) -> PathBuf {
        let path = Path::new(value);
        match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }
}

/// Load the track list from a local file or an `http(s)://` URL.
pub fn load_track_list(source: &str) -> Result<TrackList, PlayerError> {
    if source.starts_with("http://") || source.starts_with("https://") {
        let text = fetch(source).map_err(|source_err| PlayerError::ConfigFetch {
            url: source.to_string(),
            source: source_err,
        })?;
        return TrackList::parse(&text);
    }

    let path = Path::new(source);
    let text = std::fs::read_to_string(path).map_err(|err| PlayerError::ConfigRead {
        path: path.display().to_string(),
        source: err,
    })?;
    let mut list = TrackList::parse(&text)?;
    list.base_dir = path.parent().map(Path::to_path_buf);
    Ok(list)
}

fn fetch(url: &str) -> Result<String, reqwest::Error> {
    reqwest::blocking::get(url)?.error_for_status()?.text()
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEMO: &str = r#"{
        "filepaths": ["a.mp3"],
        "songnames": ["Song A"],
        "defaultsong": "a.mp3",
        "title": "Demo"
    }"#;

    #[test]
    fn single_entry_list() {
        let list = TrackList::parse(DEMO).unwrap();
        let options = list.options();
        assert_eq!(options.len(), 1);
        assert_eq!(options[0].label, "Song A");
        assert_eq!(options[0].value, "a.mp3");
        assert_eq!(list.title, "Demo");
        assert_eq!(list.defaultsong, "a.mp3");
    }

    #[test]
    fn mismatched_lengths_are_not_rejected() {
        let list = TrackList::parse(
            r#"{"filepaths":["a.mp3","b.mp3"],"songnames":["A"],"defaultsong":"a.mp3","title":"t"}"#,
        )
        .unwrap();
        let options = list.options();
        assert_eq!(options.len(), 2);
        assert_eq!(options[1].label, "");
        assert_eq!(options[1].value, "b.mp3");
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let err = TrackList::parse("{ not json").unwrap_err();
        assert!(matches!(err, PlayerError::ConfigParse(_)));
    }

    #[test]
    fn relative_paths_resolve_against_list_directory() {
        let mut list = TrackList::parse(DEMO).unwrap();
        list.base_dir = Some(PathBuf::from("data"));
        assert_eq!(list.resolve("media/a.mp3"), PathBuf::from("data/media/a.mp3"));
        assert_eq!(list.resolve("/abs/a.mp3"), PathBuf::from("/abs/a.mp3"));
    }

    #[test]
    fn loads_from_disk() {
        let dir = std::env::temp_dir().join(format!("vinylscope-tracks-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("av-data.json");
        std::fs::write(&path, DEMO).unwrap();

        let list = load_track_list(path.to_str().unwrap()).unwrap();
        assert_eq!(list.base_dir.as_deref(), Some(dir.as_path()));
        assert_eq!(list.resolve("a.mp3"), dir.join("a.mp3"));

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
