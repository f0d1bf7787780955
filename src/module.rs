use crate::environment::Environment;
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Where imported source text comes from.
pub trait ModuleLoader {
    fn load(&self, path: &Path) -> io::Result<String>;
}

/// Reads modules from the file system.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileLoader;

impl ModuleLoader for FileLoader {
    fn load(&self, path: &Path) -> io::Result<String> {
        fs::read_to_string(path)
    }
}

/// Serves modules from memory, keyed by resolved path.
#[derive(Debug, Default, Clone)]
pub struct MemoryLoader {
    files: HashMap<PathBuf, String>,
}

impl MemoryLoader {
    pub fn new() -> MemoryLoader {
        MemoryLoader::default()
    }

    pub fn with_file(
        mut self,
        path: impl Into<PathBuf>,
        source: impl Into<String>,
    ) -> MemoryLoader {
        self.files.insert(path.into(), source.into());
        self
    }
}

impl ModuleLoader for MemoryLoader {
    fn load(&self, path: &Path) -> io::Result<String> {
        self.files.get(path).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("no module at {}", path.display()),
            )
        })
    }
}

/// Resolves an import path against the directory of the importing file.
pub fn resolve(base_dir: &Path, path: &str) -> PathBuf {
    let path = Path::new(path);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}

/// An imported unit: its own top-level environment, not chained to the
/// importer's.
#[derive(Clone, Debug)]
pub struct Module {
    pub name: String,
    pub environment: Environment,
}

impl PartialEq for Module {
    fn eq(&self, other: &Module) -> bool {
        self.environment.equals(&other.environment)
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<module {}>", self.name)
    }
}

#[cfg(test)]
mod module_tests {
    use crate::module::{resolve, FileLoader, MemoryLoader, ModuleLoader};
    use std::io;
    use std::path::{Path, PathBuf};

    #[test]
    fn relative_paths_join_the_base_directory() {
        assert_eq!(
            resolve(Path::new("scripts"), "lib/math.meow"),
            PathBuf::from("scripts/lib/math.meow")
        );
        assert_eq!(resolve(Path::new(""), "math.meow"), PathBuf::from("math.meow"));
        assert_eq!(
            resolve(Path::new("scripts"), "/abs/math.meow"),
            PathBuf::from("/abs/math.meow")
        );
    }

    #[test]
    fn memory_loader_serves_known_paths() {
        let loader = MemoryLoader::new().with_file("lib.meow", "var x = 1;");
        assert_eq!(loader.load(Path::new("lib.meow")).unwrap(), "var x = 1;");
        let missing = loader.load(Path::new("other.meow")).unwrap_err();
        assert_eq!(missing.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn file_loader_reports_missing_files() {
        let error = FileLoader
            .load(Path::new("this/file/does/not/exist.meow"))
            .unwrap_err();
        assert_eq!(error.kind(), io::ErrorKind::NotFound);
    }
}
