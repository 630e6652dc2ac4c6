//! Project-relative path resolution. Every path in the configuration file is
//! resolved through a [`PathResolver`] at load time so the rest of the
//! pipeline only ever sees absolute paths.

use std::path::{Path, PathBuf};

/// Resolves paths against a fixed project root. Absolute paths pass through
/// unchanged; relative paths are joined onto the root.
#[derive(Clone, Debug)]
pub struct PathResolver {
    project_root: PathBuf,
}

impl PathResolver {
    pub fn new(project_root: impl Into<PathBuf>) -> PathResolver {
        PathResolver {
            project_root: project_root.into(),
        }
    }

    /// Resolves `path` to absolute form relative to the project root.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_owned()
        } else {
            self.project_root.join(path)
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_relative_paths_join_the_root() {
        let resolver = PathResolver::new("/srv/blog");
        assert_eq!(
            resolver.resolve(Path::new("docs")),
            PathBuf::from("/srv/blog/docs")
        );
        assert_eq!(
            resolver.resolve(Path::new("public/metadata.json")),
            PathBuf::from("/srv/blog/public/metadata.json")
        );
    }

    #[test]
    fn test_absolute_paths_pass_through() {
        let resolver = PathResolver::new("/srv/blog");
        assert_eq!(
            resolver.resolve(Path::new("/var/www/docs")),
            PathBuf::from("/var/www/docs")
        );
    }
}
