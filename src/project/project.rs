//! Core project data structure.
//!
//! A project file (`.sublime-project`, `.code-workspace`) is a relaxed-JSON
//! document with a `folders` array. [`Project::from_file`] reads one and
//! resolves every declared folder to a normalized path.

use std::{
    fmt::{self, Display, Formatter},
    fs,
    path::{Component, Path, PathBuf, is_separator},
};

use serde::{Deserialize, Serialize};

use crate::{error::ProjectReadError, utils::strip_jsonc};

/// Raw on-disk shape of a project file; everything else in it is ignored.
#[derive(Deserialize, Default)]
struct ProjectFile {
    #[serde(default)]
    folders: Vec<FolderEntry>,
}

#[derive(Deserialize, Default)]
struct FolderEntry {
    #[serde(default)]
    path: String,
}

/// A discovered project file and the folders it declares.
///
/// This is the record persisted in the structured cache and handed to the
/// search front end.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    /// Location of the project file itself
    pub path: PathBuf,

    /// Declared folders, resolved against the project file's directory.
    ///
    /// Declarations that resolve to nothing are dropped, so this may be
    /// shorter than the `folders` array in the file.
    #[serde(default)]
    pub folders: Vec<PathBuf>,
}

impl Project {
    /// Create a project record from already-resolved parts.
    #[must_use]
    pub const fn new(path: PathBuf, folders: Vec<PathBuf>) -> Self {
        Self { path, folders }
    }

    /// Read and parse the project file at `path`.
    ///
    /// The file may contain `//` and `/* */` comments and trailing commas.
    /// Only its `folders` array is used.
    ///
    /// # Arguments
    ///
    /// * `path` - Location of the `.sublime-project` / `.code-workspace` file
    ///
    /// # Returns
    ///
    /// A `Project` whose folders are resolved against the file's directory.
    /// Declarations that resolve to nothing are dropped.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectReadError::Io`] if the file cannot be read and
    /// [`ProjectReadError::Parse`] if it is not a valid project description.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # use std::path::Path;
    /// # use editor_projects::project::Project;
    /// let project = Project::from_file(Path::new("/home/bob/site/site.sublime-project"))?;
    /// println!("{} -> {}", project.name(), project.folder().display());
    /// # Ok::<(), editor_projects::error::ProjectReadError>(())
    /// ```
    pub fn from_file(path: &Path) -> Result<Self, ProjectReadError> {
        let content = fs::read_to_string(path).map_err(|source| ProjectReadError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let raw: ProjectFile =
            serde_json::from_str(&strip_jsonc(&content)).map_err(|source| {
                ProjectReadError::Parse {
                    path: path.to_path_buf(),
                    source,
                }
            })?;

        let base = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };

        let folders = raw
            .folders
            .iter()
            .filter_map(|folder| resolve_path(base, &folder.path))
            .collect();

        Ok(Self::new(path.to_path_buf(), folders))
    }

    /// Name of the project: the file name without its extension.
    ///
    /// Everything from the last `.` of the file name is the extension, so
    /// `"/a/My App.sublime-project"` gives `"My App"` and a bare
    /// `".sublime-project"` gives `""`. A trailing lone `.` is not an
    /// extension. An empty path gives an empty name and the root gives `"/"`.
    #[must_use]
    pub fn name(&self) -> String {
        let path = self.path.to_string_lossy();
        if path.is_empty() {
            return String::new();
        }

        let trimmed = path.trim_end_matches(is_separator);
        if trimmed.is_empty() {
            return std::path::MAIN_SEPARATOR.to_string();
        }

        let base = trimmed.rsplit(is_separator).next().unwrap_or(trimmed);
        match base.rfind('.') {
            Some(i) if i + 1 < base.len() => base[..i].to_string(),
            _ => base.to_string(),
        }
    }

    /// Primary folder of the project.
    ///
    /// The first declared folder, or the directory containing the project
    /// file when none are declared.
    #[must_use]
    pub fn folder(&self) -> PathBuf {
        self.folders.first().cloned().unwrap_or_else(|| {
            self.path
                .parent()
                .map_or_else(PathBuf::new, Path::to_path_buf)
        })
    }
}

impl Display for Project {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.path.display())
    }
}

/// Resolve a declared folder against the directory of its project file.
///
/// Absolute declarations are returned unchanged. Relative ones are joined
/// onto `base` and normalized with [`clean_path`]. An empty `base` or an
/// empty declaration resolves to `None`.
#[must_use]
pub fn resolve_path(base: &Path, declared: &str) -> Option<PathBuf> {
    let declared_path = Path::new(declared);
    if declared_path.has_root() {
        return Some(declared_path.to_path_buf());
    }

    if base.as_os_str().is_empty() || declared.is_empty() {
        return None;
    }

    let resolved = clean_path(&base.join(declared_path));
    if resolved.as_os_str().is_empty() {
        None
    } else {
        Some(resolved)
    }
}

/// Lexically normalize a path.
///
/// Collapses `.` components and redundant separators and resolves `..`
/// against preceding components. `..` above the root is dropped, `..` at the
/// start of a relative path is kept. Never touches the filesystem.
#[must_use]
pub fn clean_path(path: &Path) -> PathBuf {
    let mut parts: Vec<Component<'_>> = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match parts.last() {
                Some(Component::Normal(_)) => {
                    parts.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => parts.push(component),
            },
            other => parts.push(other),
        }
    }

    if parts.is_empty() {
        return PathBuf::from(".");
    }

    parts.iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const TEST_PROJECT: &str = r#"{
	"folders":
	[
		{
			"path": "/usr/local/bin"
		},
		{
			"path": "/etc"
		},
		{
			"path": "."
		}
	]
}"#;

    fn write_temp(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_from_file_resolves_folders() {
        let file = write_temp(TEST_PROJECT);
        let dir = file.path().parent().unwrap().to_path_buf();

        let project = Project::from_file(file.path()).unwrap();

        assert_eq!(project.path, file.path());
        assert_eq!(
            project.folders,
            vec![
                PathBuf::from("/usr/local/bin"),
                PathBuf::from("/etc"),
                dir,
            ]
        );
        assert_eq!(project.folder(), PathBuf::from("/usr/local/bin"));
    }

    #[test]
    fn test_from_file_tolerates_comments_and_trailing_commas() {
        let file = write_temp(
            r#"{
    // settings are ignored
    "folders": [
        { "path": "src", },  /* relative */
    ],
    "settings": { "tab_size": 4, },
}"#,
        );
        let dir = file.path().parent().unwrap();

        let project = Project::from_file(file.path()).unwrap();
        assert_eq!(project.folders, vec![dir.join("src")]);
    }

    #[test]
    fn test_from_file_drops_empty_declarations() {
        let file = write_temp(r#"{"folders": [{"path": ""}, {}, {"path": "/srv"}]}"#);

        let project = Project::from_file(file.path()).unwrap();
        assert_eq!(project.folders, vec![PathBuf::from("/srv")]);
    }

    #[test]
    fn test_from_file_without_folders() {
        let file = write_temp(r#"{"settings": {}}"#);
        let project = Project::from_file(file.path()).unwrap();

        assert!(project.folders.is_empty());
        assert_eq!(project.folder(), file.path().parent().unwrap());
    }

    #[test]
    fn test_from_file_parse_error() {
        let file = write_temp("{ not json");

        let err = Project::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ProjectReadError::Parse { .. }));
        assert_eq!(err.path(), &file.path().to_path_buf());
    }

    #[test]
    fn test_from_file_missing_file() {
        let err = Project::from_file(Path::new("/definitely/not/here.sublime-project"))
            .unwrap_err();
        assert!(matches!(err, ProjectReadError::Io { .. }));
    }

    #[test]
    fn test_resolve_path() {
        let cases = [
            ("/", "home/bob", Some("/home/bob")),
            ("/home/bob", ".", Some("/home/bob")),
            (".", "/home/bob", Some("/home/bob")),
            (".", "bob", Some("bob")),
            (".", "bob/public", Some("bob/public")),
            ("./bob", "public", Some("bob/public")),
            ("home", "bob", Some("home/bob")),
            ("/home/bob/code", "../docs//notes/.", Some("/home/bob/docs/notes")),
            ("", "", None),
            ("home", "", None),
            ("", "bob", None),
        ];

        for (base, declared, expected) in cases {
            assert_eq!(
                resolve_path(Path::new(base), declared),
                expected.map(PathBuf::from),
                "base={base:?} declared={declared:?}"
            );
        }
    }

    #[test]
    fn test_clean_path() {
        assert_eq!(clean_path(Path::new("/a/./b/../c")), PathBuf::from("/a/c"));
        assert_eq!(clean_path(Path::new("/../a")), PathBuf::from("/a"));
        assert_eq!(clean_path(Path::new("../a/b/..")), PathBuf::from("../a"));
        assert_eq!(clean_path(Path::new("a/..")), PathBuf::from("."));
    }

    #[test]
    fn test_project_names() {
        let cases = [
            ("", ""),
            (".", "."),
            ("path/.", "."),
            ("/", "/"),
            ("~/Documents", "Documents"),
            ("/Applications/Safari.app", "Safari"),
            ("./Alfred Sublime.sublime-project", "Alfred Sublime"),
            ("./path/to/something.txt", "something"),
            ("/a/.sublime-project", ""),
            ("/a/archive.tar.gz", "archive.tar"),
            ("/a/trailing.", "trailing."),
        ];

        for (path, name) in cases {
            let project = Project::new(PathBuf::from(path), vec![]);
            assert_eq!(project.name(), name, "path={path:?}");
        }
    }

    #[test]
    fn test_project_json_shape() {
        let project = Project::new(
            PathBuf::from("/a/x.sublime-project"),
            vec![PathBuf::from("/a")],
        );

        let json = serde_json::to_value(&project).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"path": "/a/x.sublime-project", "folders": ["/a"]})
        );
    }
}
