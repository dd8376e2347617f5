//! Provides [`FileApi`], the file access capability used by grid loading.
use std::fmt::Debug;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

/// Opens grid resources.
///
/// A [`Context`](crate::Context) holds one of this,
/// replace it by [`Context::set_file_api`](crate::Context::set_file_api)
/// to load grids from an archive, memory, the network cache etc.
///
/// # Example
///
/// ```
/// use std::collections::HashMap;
/// use std::io::{self, Cursor, Read};
/// use std::path::Path;
/// use std::sync::Arc;
///
/// use gridtrans::{Context, FileApi};
///
/// #[derive(Debug)]
/// struct InMemory(HashMap<String, Vec<u8>>);
///
/// impl FileApi for InMemory {
///     fn open(&self, path: &Path) -> io::Result<Box<dyn Read + Send>> {
///         self.0
///             .get(path.to_str().unwrap_or_default())
///             .map(|b| Box::new(Cursor::new(b.clone())) as Box<dyn Read + Send>)
///             .ok_or_else(|| io::Error::from(io::ErrorKind::NotFound))
///     }
/// }
///
/// let ctx = Context::new();
/// ctx.set_file_api(Arc::new(InMemory(HashMap::new())));
/// ```
pub trait FileApi: Send + Sync + Debug {
    /// Opens `path` for reading.
    ///
    /// Returns [`io::ErrorKind::NotFound`] when `path` does not exist,
    /// the name resolution tries the next candidate in this case.
    fn open(&self, path: &Path) -> io::Result<Box<dyn Read + Send>>;
}

/// The default [`FileApi`], the local file system.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdFileApi;

impl FileApi for StdFileApi {
    fn open(&self, path: &Path) -> io::Result<Box<dyn Read + Send>> {
        let file = File::open(path)?;
        Ok(Box::new(BufReader::new(file)))
    }
}

#[cfg(test)]
mod test {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_std_file_api() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"grid").unwrap();

        let mut buf = String::new();
        StdFileApi
            .open(file.path())
            .unwrap()
            .read_to_string(&mut buf)
            .unwrap();
        assert_eq!(buf, "grid");

        let dir = tempfile::tempdir().unwrap();
        match StdFileApi.open(&dir.path().join("missing")) {
            Err(e) => assert_eq!(e.kind(), io::ErrorKind::NotFound),
            Ok(_) => panic!("expected NotFound"),
        }
    }
}
