use std::io;
use std::path::{Path, PathBuf};

/// Read access for file-sourced bodies (`file_body`, `file_response_body`).
pub trait FileReader {
    fn read_to_string(&self, path: &str) -> io::Result<String>;
}

/// Reads from the local filesystem. Relative paths resolve against
/// `base_dir` when one is set, otherwise against the working directory.
#[derive(Debug, Clone, Default)]
pub struct FsReader {
    base_dir: Option<PathBuf>,
}

impl FsReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve relative paths against `base_dir`, typically the directory
    /// holding the suite file.
    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        FsReader {
            base_dir: Some(base_dir.into()),
        }
    }

    pub fn resolve(&self, path: &str) -> PathBuf {
        let path = Path::new(path);
        match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }
}

impl FileReader for FsReader {
    fn read_to_string(&self, path: &str) -> io::Result<String> {
        let resolved = self.resolve(path);
        tracing::trace!("reading body file {}", resolved.display());
        std::fs::read_to_string(resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn reads_relative_to_base_dir() {
        let dir = tempfile::tempdir().unwrap();
        let mut file = std::fs::File::create(dir.path().join("body.txt")).unwrap();
        write!(file, "payload").unwrap();

        let reader = FsReader::with_base_dir(dir.path());
        assert_eq!(reader.read_to_string("body.txt").unwrap(), "payload");
    }

    #[test]
    fn absolute_paths_ignore_base_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("abs.txt");
        std::fs::write(&path, "absolute").unwrap();

        let reader = FsReader::with_base_dir("/definitely/not/here");
        assert_eq!(reader.read_to_string(path.to_str().unwrap()).unwrap(), "absolute");
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let reader = FsReader::with_base_dir(dir.path());
        let err = reader.read_to_string("nope.txt").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
