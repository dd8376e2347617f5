//! Provides [`GridCache`], the per context grid store.
use std::collections::HashMap;
use std::io::{self, Read};
use std::iter;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::{Condvar, Mutex};

use crate::grid::{Grid, LoadGridError, LoadGridErrorKind};
use crate::FileApi;

#[derive(Debug)]
enum LoadState {
    NotLoaded,
    Loading,
    Loaded(Arc<Grid>),
    Failed,
}

#[derive(Debug)]
struct Slot {
    state: Mutex<LoadState>,
    ready: Condvar,
}

impl Slot {
    fn new() -> Self {
        Self {
            state: Mutex::new(LoadState::NotLoaded),
            ready: Condvar::new(),
        }
    }
}

/// Loaded grids keyed by the canonical name.
///
/// A grid is loaded at most once per name,
/// concurrent requesters of the same name wait for the first one
/// and observe its result.
/// A failed load is tried again by a later requester.
///
/// Obtain one by [`Context::grid_cache`](crate::Context::grid_cache).
#[derive(Debug, Default)]
pub struct GridCache {
    slots: Mutex<HashMap<String, Arc<Slot>>>,
}

impl GridCache {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Returns the number of loaded grids.
    pub fn len(&self) -> usize {
        self.slots
            .lock()
            .values()
            .filter(|slot| matches!(*slot.state.lock(), LoadState::Loaded(_)))
            .count()
    }

    /// Returns `true` if no grid is loaded.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` if the grid of `name` is loaded.
    pub fn contains(&self, name: &str) -> bool {
        self.slots
            .lock()
            .get(name.trim())
            .is_some_and(|slot| matches!(*slot.state.lock(), LoadState::Loaded(_)))
    }

    /// Drops every cached grid.
    ///
    /// Grids already handed out stay alive as long as they are referenced.
    pub fn clear(&self) {
        self.slots.lock().clear();
    }

    /// Returns the grid of `name`, calling `load` if not loaded.
    pub(crate) fn get_or_load<F>(&self, name: &str, load: F) -> Result<Arc<Grid>, LoadGridError>
    where
        F: FnOnce() -> Result<Grid, LoadGridError>,
    {
        let slot = self
            .slots
            .lock()
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(Slot::new()))
            .clone();

        let mut state = slot.state.lock();
        let mut waited = false;
        loop {
            match &*state {
                LoadState::Loaded(grid) => return Ok(grid.clone()),
                LoadState::Failed if waited => {
                    return Err(LoadGridError::new(name, LoadGridErrorKind::Unavailable))
                }
                LoadState::NotLoaded | LoadState::Failed => break,
                LoadState::Loading => {}
            }
            waited = true;
            slot.ready.wait(&mut state);
        }
        *state = LoadState::Loading;
        drop(state);

        let result = load().map(Arc::new);

        let mut state = slot.state.lock();
        *state = match &result {
            Ok(grid) => LoadState::Loaded(grid.clone()),
            Err(_) => LoadState::Failed,
        };
        slot.ready.notify_all();

        result
    }
}

/// Returns candidate paths of `name` in order.
///
/// Absolute names and names starting with `./` or `../` are taken as is,
/// others are tried in each directory of `search_path`, then as given.
pub(crate) fn candidates(name: &str, search_path: &[String]) -> Vec<PathBuf> {
    let path = Path::new(name);
    if path.is_absolute() || name.starts_with("./") || name.starts_with("../") {
        return vec![path.to_path_buf()];
    }

    search_path
        .iter()
        .map(|dir| Path::new(dir).join(path))
        .chain(iter::once(path.to_path_buf()))
        .collect()
}

/// Opens the first existing candidate of `name`.
pub(crate) fn open(
    name: &str,
    search_path: &[String],
    file_api: &dyn FileApi,
) -> Result<(PathBuf, Box<dyn Read + Send>), LoadGridError> {
    for path in candidates(name, search_path) {
        match file_api.open(&path) {
            Ok(reader) => return Ok((path, reader)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
            Err(e) => return Err(LoadGridError::new(name, LoadGridErrorKind::Io(e))),
        }
    }
    Err(LoadGridError::new(name, LoadGridErrorKind::NotFound))
}

#[cfg(test)]
mod test {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Barrier;
    use std::thread;
    use std::time::Duration;

    use super::*;
    use crate::grid::test::linear_grid;

    #[test]
    fn test_candidates() {
        let search_path = vec!["/data/a".to_string(), "b".to_string()];
        assert_eq!(
            candidates("egm.gtx", &search_path),
            vec![
                PathBuf::from("/data/a/egm.gtx"),
                PathBuf::from("b/egm.gtx"),
                PathBuf::from("egm.gtx")
            ]
        );
        assert_eq!(
            candidates("./egm.gtx", &search_path),
            vec![PathBuf::from("./egm.gtx")]
        );
        assert_eq!(
            candidates("../egm.gtx", &search_path),
            vec![PathBuf::from("../egm.gtx")]
        );
        assert_eq!(candidates("egm.gtx", &[]), vec![PathBuf::from("egm.gtx")]);
    }

    #[cfg(unix)]
    #[test]
    fn test_candidates_absolute() {
        assert_eq!(
            candidates("/abs/egm.gtx", &["/data".to_string()]),
            vec![PathBuf::from("/abs/egm.gtx")]
        );
    }

    #[test]
    fn test_load_once() {
        let cache = GridCache::new();
        let count = AtomicUsize::new(0);
        let load = || {
            count.fetch_add(1, Ordering::SeqCst);
            Ok(linear_grid())
        };

        let a = cache.get_or_load("a", load).unwrap();
        let b = cache
            .get_or_load("a", || {
                count.fetch_add(1, Ordering::SeqCst);
                Ok(linear_grid())
            })
            .unwrap();

        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);
        assert!(cache.contains("a"));
        assert!(!cache.contains("b"));

        cache.clear();
        assert!(cache.is_empty());
        // still alive
        assert_eq!(a.kind(), b.kind());
    }

    #[test]
    fn test_retry_failed() {
        let cache = GridCache::new();

        let actual = cache.get_or_load("a", || {
            Err(LoadGridError::new("a", LoadGridErrorKind::NotFound))
        });
        assert!(actual.is_err());
        assert!(!cache.contains("a"));
        assert_eq!(cache.len(), 0);

        let actual = cache.get_or_load("a", || Ok(linear_grid()));
        assert!(actual.is_ok());
        assert!(cache.contains("a"));
    }

    #[test]
    fn test_concurrent() {
        let cache = Arc::new(GridCache::new());
        let count = Arc::new(AtomicUsize::new(0));
        let barrier = Arc::new(Barrier::new(8));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = cache.clone();
                let count = count.clone();
                let barrier = barrier.clone();
                thread::spawn(move || {
                    barrier.wait();
                    cache
                        .get_or_load("a", || {
                            count.fetch_add(1, Ordering::SeqCst);
                            thread::sleep(Duration::from_millis(20));
                            Ok(linear_grid())
                        })
                        .unwrap()
                })
            })
            .collect();

        let grids: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(grids.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
    }
}
