//! Sound directory catalog.
//!
//! The catalog walks a root directory and lists every regular file as an
//! [`Asset`]. Readers always get a complete snapshot: [`Catalog::reload`]
//! builds the new list off to the side and swaps the shared reference in one
//! step.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use crate::error::CatalogError;

/// A single playable sound file entry.
///
/// `id` is positional: it is only meaningful within the snapshot it came
/// from and is reassigned on every reload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    pub id: usize,
    /// File name up to the first `.`.
    pub name: String,
    /// File name after the last `.`, lower-cased.
    pub extension: String,
    pub path: String,
}

impl Asset {
    fn from_path(id: usize, path: &Path) -> Option<Self> {
        let file_name = path.file_name()?.to_string_lossy();
        let name = file_name.split('.').next().unwrap_or_default().to_string();
        let extension = file_name
            .rsplit('.')
            .next()
            .unwrap_or_default()
            .to_lowercase();

        Some(Self {
            id,
            name,
            extension,
            path: path.to_string_lossy().into_owned(),
        })
    }
}

/// Ordered collection of assets scanned from a root directory.
pub struct Catalog {
    root: PathBuf,
    assets: RwLock<Arc<[Asset]>>,
    /// Held across a reload and its announcement.
    reload_order: Mutex<()>,
}

impl Catalog {
    /// Scans `root` and builds a catalog from it.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::ScanFailed`] if the root cannot be opened.
    /// Unreadable entries below the root are skipped.
    pub fn scan(root: impl Into<PathBuf>) -> Result<Self, CatalogError> {
        let root = root.into();
        let assets = scan_dir(&root)?;
        Ok(Self {
            root,
            assets: RwLock::new(assets.into()),
            reload_order: Mutex::new(()),
        })
    }

    /// Re-scans the root and atomically replaces the asset list.
    ///
    /// On failure the previous snapshot stays in place.
    pub fn reload(&self) -> Result<Arc<[Asset]>, CatalogError> {
        self.reload_and(|_| {})
    }

    /// Reloads, then calls `publish` with the new snapshot before any other
    /// reload can swap it.
    ///
    /// Announcing from `publish` keeps announcements in swap order, so the
    /// last list a listener receives is the one in place. `publish` runs
    /// with the reload lock held and must not reload this catalog.
    pub fn reload_and<F>(&self, publish: F) -> Result<Arc<[Asset]>, CatalogError>
    where
        F: FnOnce(&Arc<[Asset]>),
    {
        let _order = self.reload_order.lock();
        let fresh: Arc<[Asset]> = scan_dir(&self.root)?.into();
        *self.assets.write() = Arc::clone(&fresh);
        log::info!("[Catalog] Reloaded {} sound(s)", fresh.len());
        publish(&fresh);
        Ok(fresh)
    }

    /// Returns the current snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Arc<[Asset]> {
        Arc::clone(&self.assets.read())
    }

    /// Looks up an asset by id in the current snapshot.
    pub fn get(&self, id: i64) -> Option<Asset> {
        let index = usize::try_from(id).ok()?;
        self.assets.read().get(index).cloned()
    }

    /// Returns the directory this catalog scans.
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.assets.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Walks `root` and returns its files in name order with sequential ids.
fn scan_dir(root: &Path) -> Result<Vec<Asset>, CatalogError> {
    let start = Instant::now();

    // The root has to be a readable directory; everything below it is best-effort.
    std::fs::read_dir(root).map_err(|source| CatalogError::ScanFailed {
        path: root.to_path_buf(),
        source,
    })?;

    let mut assets = Vec::new();
    for entry in WalkDir::new(root).follow_links(true).sort_by_file_name() {
        match entry {
            Err(e) => {
                log::warn!("[Catalog] Cannot access entry: {}", e);
            }
            Ok(entry) if entry.file_type().is_file() => {
                if let Some(asset) = Asset::from_path(assets.len(), entry.path()) {
                    log::debug!("[Catalog] indexed {} -> {}", asset.id, asset.path);
                    assets.push(asset);
                }
            }
            Ok(_) => {}
        }
    }

    log::info!(
        "[Catalog] Scanned {} file(s) under {} in {:.1}s",
        assets.len(),
        root.display(),
        start.elapsed().as_secs_f64()
    );
    Ok(assets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::fs;

    fn touch(dir: &Path, name: &str) {
        fs::write(dir.join(name), b"").unwrap();
    }

    #[test]
    fn scan_derives_name_and_lowercased_extension() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "kick.wav");
        touch(dir.path(), "snare.MP3");
        touch(dir.path(), "readme.txt");

        let catalog = Catalog::scan(dir.path()).unwrap();
        let assets = catalog.snapshot();
        assert_eq!(assets.len(), 3);

        let by_name: Vec<(&str, &str)> = assets
            .iter()
            .map(|a| (a.name.as_str(), a.extension.as_str()))
            .collect();
        assert!(by_name.contains(&("kick", "wav")));
        assert!(by_name.contains(&("snare", "mp3")));
        assert!(by_name.contains(&("readme", "txt")));

        let ids: Vec<usize> = assets.iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
    }

    #[test]
    fn scan_order_is_by_file_name() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "snare.MP3");
        touch(dir.path(), "kick.wav");
        touch(dir.path(), "readme.txt");

        let catalog = Catalog::scan(dir.path()).unwrap();
        let names: Vec<String> = catalog.snapshot().iter().map(|a| a.name.clone()).collect();
        assert_eq!(names, vec!["kick", "readme", "snare"]);
    }

    #[test]
    fn name_stops_at_first_dot_and_extension_starts_after_last() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "air.horn.Final.WAV");

        let catalog = Catalog::scan(dir.path()).unwrap();
        let asset = catalog.get(0).unwrap();
        assert_eq!(asset.name, "air");
        assert_eq!(asset.extension, "wav");
    }

    #[test]
    fn scan_recurses_and_skips_directories() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("drums")).unwrap();
        touch(&dir.path().join("drums"), "hat.wav");
        touch(dir.path(), "bell.mp3");

        let catalog = Catalog::scan(dir.path()).unwrap();
        assert_eq!(catalog.len(), 2);
        assert!(catalog.snapshot().iter().all(|a| a.name != "drums"));
    }

    #[test]
    fn scan_missing_root_fails() {
        let result = Catalog::scan("/nonexistent/soundboard/root");
        assert!(matches!(result, Err(CatalogError::ScanFailed { .. })));
    }

    #[test]
    fn get_rejects_negative_and_out_of_range_ids() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "kick.wav");

        let catalog = Catalog::scan(dir.path()).unwrap();
        assert!(catalog.get(-1).is_none());
        assert!(catalog.get(1).is_none());
        assert!(catalog.get(0).is_some());
    }

    #[test]
    fn reload_picks_up_new_files() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "kick.wav");
        let catalog = Catalog::scan(dir.path()).unwrap();
        assert_eq!(catalog.len(), 1);

        touch(dir.path(), "clap.wav");
        let fresh = catalog.reload().unwrap();
        assert_eq!(fresh.len(), 2);
        assert_eq!(catalog.len(), 2);
    }

    #[test]
    fn failed_reload_keeps_previous_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("sounds");
        fs::create_dir(&root).unwrap();
        touch(&root, "kick.wav");

        let catalog = Catalog::scan(&root).unwrap();
        fs::remove_dir_all(&root).unwrap();

        assert!(catalog.reload().is_err());
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn reload_and_publishes_in_swap_order() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "kick.wav");
        let catalog = Arc::new(Catalog::scan(dir.path()).unwrap());
        let announced = Arc::new(Mutex::new(Vec::new()));

        let writers: Vec<_> = (0..4)
            .map(|w| {
                let catalog = Arc::clone(&catalog);
                let announced = Arc::clone(&announced);
                let root = dir.path().to_path_buf();
                std::thread::spawn(move || {
                    for i in 0..25 {
                        touch(&root, &format!("w{}_{:02}.wav", w, i));
                        catalog
                            .reload_and(|fresh| announced.lock().push(fresh.len()))
                            .unwrap();
                    }
                })
            })
            .collect();
        for writer in writers {
            writer.join().unwrap();
        }

        let announced = announced.lock();
        assert_eq!(announced.len(), 100);
        // Files are only ever added, so swap order means non-decreasing sizes.
        assert!(announced.windows(2).all(|pair| pair[0] <= pair[1]));
        assert_eq!(*announced.last().unwrap(), catalog.len());
    }

    #[test]
    fn failed_reload_and_does_not_publish() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("sounds");
        fs::create_dir(&root).unwrap();
        let catalog = Catalog::scan(&root).unwrap();
        fs::remove_dir_all(&root).unwrap();

        let mut published = false;
        assert!(catalog.reload_and(|_| published = true).is_err());
        assert!(!published);
    }

    #[test]
    fn concurrent_readers_only_see_whole_snapshots() {
        let dir = tempfile::tempdir().unwrap();
        for i in 0..20 {
            touch(dir.path(), &format!("sound{:02}.wav", i));
        }
        let catalog = Arc::new(Catalog::scan(dir.path()).unwrap());

        let writer = {
            let catalog = Arc::clone(&catalog);
            std::thread::spawn(move || {
                for _ in 0..50 {
                    catalog.reload().unwrap();
                }
            })
        };

        for _ in 0..500 {
            let snapshot = catalog.snapshot();
            assert_eq!(snapshot.len(), 20);
            let ids: HashSet<usize> = snapshot.iter().map(|a| a.id).collect();
            assert_eq!(ids, (0..20).collect());
        }

        writer.join().unwrap();
    }
}
