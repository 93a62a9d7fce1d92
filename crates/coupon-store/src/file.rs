//! # Durable Coupon Store
//!
//! A coupon map mirrored to a single JSON file holding an array of coupons.
//!
//! ## Write Protocol
//!
//! Every mutation runs under the write lock and:
//!
//! 1. applies the change to a copy of the current map,
//! 2. writes the copy to `<path>.tmp` and `fsync`s it,
//! 3. renames the temp file over `<path>` (and syncs the directory on unix),
//! 4. swaps the copy in as the current map.
//!
//! The primary file is never partially overwritten; a crash leaves either
//! the previous or the next snapshot. If a step before the rename fails the
//! temp file is removed, the call returns [`StoreError`] and the in-memory
//! map is unchanged. The rename is the commit point: a failed directory
//! sync after it is logged at `warn` and the new map is still committed.
//!
//! One instance owns its path. Two instances sharing a file are not
//! coordinated.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use coupon_attest::Coupon;
use coupon_core::Timestamp;
use parking_lot::RwLock;
use uuid::Uuid;

use crate::query::{expired_ids, page_of, select, CouponFilter, Page};
use crate::{CouponStore, StoreError};

type CouponMap = BTreeMap<Uuid, Coupon>;

/// File-backed coupon store. Clones share state and path.
#[derive(Debug, Clone)]
pub struct FileCouponStore {
    path: PathBuf,
    /// `None` until `initialize()` or `load_from_file()` succeeds.
    data: Arc<RwLock<Option<CouponMap>>>,
}

impl FileCouponStore {
    /// Bind a store to `path`. Performs no I/O.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            data: Arc::new(RwLock::new(None)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_initialized(&self) -> bool {
        self.data.read().is_some()
    }

    /// Load the snapshot at `path`, or create an empty one if the file does
    /// not exist. Parent directories are created as needed.
    ///
    /// Returns the number of coupons loaded.
    pub fn initialize(&self) -> Result<usize, StoreError> {
        let mut data = self.data.write();
        if self.path.exists() {
            let map = read_snapshot(&self.path)?;
            let count = map.len();
            *data = Some(map);
            tracing::info!(path = %self.path.display(), count, "coupon store loaded");
            return Ok(count);
        }
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_error(parent))?;
        }
        let empty = CouponMap::new();
        write_snapshot(&self.path, &empty)?;
        *data = Some(empty);
        tracing::info!(path = %self.path.display(), "coupon store created");
        Ok(0)
    }

    /// Replace the in-memory map wholesale with the snapshot on disk.
    pub fn load_from_file(&self) -> Result<usize, StoreError> {
        let mut data = self.data.write();
        let map = read_snapshot(&self.path)?;
        let count = map.len();
        *data = Some(map);
        tracing::info!(path = %self.path.display(), count, "coupon store reloaded");
        Ok(count)
    }

    /// Write the current map to disk.
    pub fn save(&self) -> Result<(), StoreError> {
        let data = self.data.write();
        let map = data.as_ref().ok_or_else(|| self.not_initialized())?;
        write_snapshot(&self.path, map)
    }

    fn not_initialized(&self) -> StoreError {
        StoreError::NotInitialized {
            path: self.path.clone(),
        }
    }

    fn read<R>(&self, f: impl FnOnce(&CouponMap) -> R) -> Result<R, StoreError> {
        let data = self.data.read();
        let map = data.as_ref().ok_or_else(|| self.not_initialized())?;
        Ok(f(map))
    }

    /// Apply `f` to a copy of the map, persist the copy if it changed, then
    /// commit it.
    fn mutate<R>(&self, f: impl FnOnce(&mut CouponMap) -> R) -> Result<R, StoreError> {
        let mut data = self.data.write();
        let current = data.as_ref().ok_or_else(|| self.not_initialized())?;
        let mut next = current.clone();
        let out = f(&mut next);
        if next != *current {
            write_snapshot(&self.path, &next)?;
            *data = Some(next);
        }
        Ok(out)
    }
}

impl CouponStore for FileCouponStore {
    fn store(&self, coupon: Coupon) -> Result<Uuid, StoreError> {
        let id = coupon.id;
        self.mutate(|map| {
            map.insert(id, coupon);
        })?;
        Ok(id)
    }

    fn store_many(&self, coupons: Vec<Coupon>) -> Result<Vec<Uuid>, StoreError> {
        self.mutate(|map| {
            coupons
                .into_iter()
                .map(|c| {
                    let id = c.id;
                    map.insert(id, c);
                    id
                })
                .collect()
        })
    }

    fn get(&self, id: &Uuid) -> Result<Option<Coupon>, StoreError> {
        self.read(|map| map.get(id).cloned())
    }

    fn get_all(&self) -> Result<Vec<Coupon>, StoreError> {
        self.read(|map| select(map, None))
    }

    fn filter(&self, filter: &CouponFilter) -> Result<Vec<Coupon>, StoreError> {
        self.read(|map| select(map, Some(filter)))
    }

    fn paginate(
        &self,
        page: usize,
        page_size: usize,
        filter: Option<&CouponFilter>,
    ) -> Result<Page<Coupon>, StoreError> {
        let items = self.read(|map| select(map, filter))?;
        Ok(page_of(items, page, page_size))
    }

    fn sweep_expired_at(&self, now: Timestamp) -> Result<usize, StoreError> {
        let removed = self.mutate(|map| {
            let expired = expired_ids(map, now);
            for id in &expired {
                map.remove(id);
            }
            expired.len()
        })?;
        if removed > 0 {
            tracing::warn!(path = %self.path.display(), removed, "swept expired coupons");
        }
        Ok(removed)
    }

    fn remove(&self, id: &Uuid) -> Result<bool, StoreError> {
        self.mutate(|map| map.remove(id).is_some())
    }

    fn clear(&self) -> Result<(), StoreError> {
        self.mutate(|map| map.clear())
    }

    fn len(&self) -> Result<usize, StoreError> {
        self.read(|map| map.len())
    }
}

fn read_snapshot(path: &Path) -> Result<CouponMap, StoreError> {
    let bytes = std::fs::read(path).map_err(io_error(path))?;
    let coupons: Vec<Coupon> =
        serde_json::from_slice(&bytes).map_err(|source| StoreError::Serialization {
            path: path.to_path_buf(),
            source,
        })?;
    let count = coupons.len();
    let map: CouponMap = coupons.into_iter().map(|c| (c.id, c)).collect();
    if map.len() != count {
        tracing::warn!(
            path = %path.display(),
            duplicates = count - map.len(),
            "coupon snapshot contains duplicate ids; keeping the last of each"
        );
    }
    Ok(map)
}

fn write_snapshot(path: &Path, map: &CouponMap) -> Result<(), StoreError> {
    write_snapshot_with(path, map, sync_parent)
}

/// Snapshot write with the directory sync supplied by the caller.
fn write_snapshot_with(
    path: &Path,
    map: &CouponMap,
    sync_dir: impl FnOnce(&Path) -> Result<(), StoreError>,
) -> Result<(), StoreError> {
    let coupons: Vec<&Coupon> = map.values().collect();
    let bytes = serde_json::to_vec_pretty(&coupons).map_err(|source| {
        StoreError::Serialization {
            path: path.to_path_buf(),
            source,
        }
    })?;
    let tmp = temp_path(path);
    if let Err(e) = write_temp(&tmp, &bytes).and_then(|()| rename_over(&tmp, path)) {
        discard_temp(&tmp);
        return Err(e);
    }
    // Committed once renamed. A directory sync failure is logged, not returned.
    if let Err(e) = sync_dir(path) {
        tracing::warn!(path = %path.display(), error = %e, "coupon snapshot directory sync failed");
    }
    tracing::debug!(path = %path.display(), count = map.len(), "coupon snapshot written");
    Ok(())
}

fn write_temp(tmp: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    let mut file = File::create(tmp).map_err(io_error(tmp))?;
    file.write_all(bytes).map_err(io_error(tmp))?;
    file.sync_all().map_err(io_error(tmp))
}

fn rename_over(tmp: &Path, path: &Path) -> Result<(), StoreError> {
    std::fs::rename(tmp, path).map_err(io_error(path))
}

/// Best-effort removal of a temp file left by a failed write.
fn discard_temp(tmp: &Path) {
    if tmp.is_file() {
        if let Err(e) = std::fs::remove_file(tmp) {
            tracing::warn!(path = %tmp.display(), error = %e, "failed to remove coupon temp file");
        }
    }
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> StoreError {
    let path = path.to_path_buf();
    move |source| StoreError::Io { path, source }
}

/// `<path>.tmp`, keeping the full original file name.
fn temp_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".tmp");
    PathBuf::from(name)
}

#[cfg(unix)]
fn sync_parent(path: &Path) -> Result<(), StoreError> {
    let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) else {
        return Ok(());
    };
    File::open(parent)
        .and_then(|dir| dir.sync_all())
        .map_err(io_error(parent))
}

#[cfg(not(unix))]
fn sync_parent(_path: &Path) -> Result<(), StoreError> {
    Ok(())
}
