//! Media Probes
//!
//! Decide whether a resource locator can be opened and report its length.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{PoisonError, RwLock};

use crate::Frame;

/// Length and rate of a probed resource
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MediaInfo {
    pub length: Frame,
    pub fps: f64,
}

/// Opens resources for the reference engine
pub trait MediaProbe: Send + Sync {
    /// Returns `None` when the resource cannot be opened
    fn probe(&self, resource: &str) -> Option<MediaInfo>;
}

/// Accepts regular files on disk and any `service:` locator
#[derive(Clone, Debug)]
pub struct FileProbe {
    info: MediaInfo,
}

impl FileProbe {
    /// Every accepted resource reports `default_length` frames at `fps`
    pub fn new(default_length: Frame, fps: f64) -> Self {
        Self {
            info: MediaInfo {
                length: default_length.max(1),
                fps,
            },
        }
    }
}

impl MediaProbe for FileProbe {
    fn probe(&self, resource: &str) -> Option<MediaInfo> {
        if has_service_prefix(resource) || Path::new(resource).is_file() {
            Some(self.info)
        } else {
            None
        }
    }
}

/// `name:rest` where `name` is a non-empty word, e.g. `colour:black`
fn has_service_prefix(resource: &str) -> bool {
    resource.split_once(':').is_some_and(|(service, _)| {
        service.len() > 1 && service.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
    })
}

/// Fixed resource catalog
#[derive(Debug)]
pub struct CatalogProbe {
    fps: f64,
    entries: RwLock<HashMap<String, Frame>>,
}

impl CatalogProbe {
    pub fn new(fps: f64) -> Self {
        Self {
            fps,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Builder form of [`CatalogProbe::insert`]
    pub fn with(self, resource: &str, length: Frame) -> Self {
        self.insert(resource, length);
        self
    }

    pub fn insert(&self, resource: &str, length: Frame) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(resource.to_string(), length);
    }

    /// Makes a resource unavailable, as if its file went away
    pub fn remove(&self, resource: &str) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(resource);
    }
}

impl MediaProbe for CatalogProbe {
    fn probe(&self, resource: &str) -> Option<MediaInfo> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.get(resource).map(|&length| MediaInfo {
            length,
            fps: self.fps,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_file_probe() {
        let dir = tempfile::tempdir().unwrap();
        let clip = dir.path().join("clip.mp4");
        fs::write(&clip, b"data").unwrap();

        let probe = FileProbe::new(250, 25.0);
        let info = probe.probe(clip.to_str().unwrap()).unwrap();
        assert_eq!(info.length, 250);

        assert!(probe.probe(dir.path().to_str().unwrap()).is_none());
        assert!(probe.probe("/no/such/file.mp4").is_none());
        assert!(probe.probe("colour:/media/black").is_some());
    }

    #[test]
    fn test_catalog_probe_insert_and_remove() {
        let probe = CatalogProbe::new(30.0).with("a", 10);
        assert_eq!(
            probe.probe("a"),
            Some(MediaInfo {
                length: 10,
                fps: 30.0
            })
        );
        probe.remove("a");
        assert!(probe.probe("a").is_none());
    }
}
