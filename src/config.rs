//! Project configuration: locating and parsing `michifumi.yaml` and the
//! theme manifest, and deriving the full set of source/output locations
//! and URLs the rest of the build consumes.

use serde::Deserialize;
use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};
use url::Url;

/// The project file searched for by [`Config::from_directory`].
const PROJECT_FILE: &str = "michifumi.yaml";

#[derive(Deserialize)]
struct PageSize(usize);
impl Default for PageSize {
    fn default() -> Self {
        PageSize(10)
    }
}

/// The site's author, as written into the Atom feed.
#[derive(Clone, Deserialize)]
pub struct Author {
    pub name: String,

    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Deserialize)]
struct Project {
    /// The absolute root URL for the published site, e.g.
    /// `https://blog.example.org/`.
    site_root: Url,

    title: String,

    #[serde(default)]
    description: String,

    #[serde(default)]
    author: Option<Author>,

    #[serde(default)]
    index_page_size: PageSize,
}

#[derive(Deserialize)]
struct Theme {
    index_template: Vec<PathBuf>,
    posts_template: Vec<PathBuf>,
}

/// The resolved build configuration.
pub struct Config {
    pub title: String,
    pub description: String,
    pub author: Option<Author>,

    pub site_root: Url,
    pub home_page: Url,
    pub index_url: Url,
    pub posts_url: Url,
    pub static_url: Url,
    pub atom_url: Url,

    pub posts_source_directory: PathBuf,
    pub static_source_directory: PathBuf,
    pub index_template: Vec<PathBuf>,
    pub posts_template: Vec<PathBuf>,

    pub root_output_directory: PathBuf,
    pub index_output_directory: PathBuf,
    pub posts_output_directory: PathBuf,
    pub static_output_directory: PathBuf,

    pub index_page_size: usize,
}

impl Config {
    /// Searches `dir` and its ancestors for a `michifumi.yaml` project file
    /// and loads the configuration from the first one found.
    pub fn from_directory(dir: &Path, output_directory: &Path) -> Result<Config> {
        let path = dir.join(PROJECT_FILE);
        if path.exists() {
            Config::from_project_file(&path, output_directory)
        } else {
            match dir.parent() {
                Some(parent) => Config::from_directory(parent, output_directory),
                None => Err(Error::ProjectFileNotFound),
            }
        }
    }

    /// Loads the configuration from a specific project file. The theme
    /// manifest is expected at `{project_root}/theme/theme.yaml`; its
    /// template entries are resolved relative to the theme directory.
    pub fn from_project_file(path: &Path, output_directory: &Path) -> Result<Config> {
        let project: Project = serde_yaml::from_reader(open(path, "project")?)?;
        let project_root = path
            .parent()
            .ok_or_else(|| Error::NoProjectRoot(path.to_owned()))?;

        let theme_dir = project_root.join("theme");
        let theme: Theme = serde_yaml::from_reader(open(&theme_dir.join("theme.yaml"), "theme")?)?;

        let site_root = with_trailing_slash(project.site_root)?;
        Ok(Config {
            title: project.title,
            description: project.description,
            author: project.author,
            home_page: site_root.clone(),
            index_url: site_root.join("pages/")?,
            posts_url: site_root.join("posts/")?,
            static_url: site_root.join("static/")?,
            atom_url: site_root.join("feed.atom")?,
            site_root,
            posts_source_directory: project_root.join("posts"),
            static_source_directory: project_root.join("static"),
            index_template: theme
                .index_template
                .iter()
                .map(|relpath| theme_dir.join(relpath))
                .collect(),
            posts_template: theme
                .posts_template
                .iter()
                .map(|relpath| theme_dir.join(relpath))
                .collect(),
            root_output_directory: output_directory.to_owned(),
            index_output_directory: output_directory.join("pages"),
            posts_output_directory: output_directory.join("posts"),
            static_output_directory: output_directory.join("static"),
            index_page_size: project.index_page_size.0,
        })
    }
}

// `Url::join` treats a base without a trailing slash as a file name and
// strips it, so `https://example.org/blog` would lose `blog` on every
// derived URL.
fn with_trailing_slash(url: Url) -> Result<Url> {
    if url.path().ends_with('/') {
        Ok(url)
    } else {
        Ok(Url::parse(&format!("{}/", url))?)
    }
}

fn open(path: &Path, kind: &'static str) -> Result<File> {
    File::open(path).map_err(|err| Error::OpenFile {
        kind,
        path: path.to_owned(),
        err,
    })
}

/// Represents the result of loading the configuration.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error loading the configuration.
#[derive(Debug)]
pub enum Error {
    /// Returned when no `michifumi.yaml` exists in the starting directory
    /// or any of its ancestors.
    ProjectFileNotFound,

    /// Returned when the project file path has no parent directory.
    NoProjectRoot(PathBuf),

    /// Returned when a project or theme file can't be opened.
    OpenFile {
        kind: &'static str,
        path: PathBuf,
        err: std::io::Error,
    },

    /// Returned when there was an error parsing a YAML file.
    DeserializeYaml(serde_yaml::Error),

    /// Returned when there is a problem building the site URLs.
    UrlParse(url::ParseError),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::ProjectFileNotFound => write!(
                f,
                "Could not find `{}` in any parent directory",
                PROJECT_FILE
            ),
            Error::NoProjectRoot(path) => write!(
                f,
                "Can't get parent directory for provided project file path '{:?}'",
                path
            ),
            Error::OpenFile { kind, path, err } => {
                write!(f, "Opening {} file `{}`: {}", kind, path.display(), err)
            }
            Error::DeserializeYaml(err) => err.fmt(f),
            Error::UrlParse(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::ProjectFileNotFound => None,
            Error::NoProjectRoot(_) => None,
            Error::OpenFile { err, .. } => Some(err),
            Error::DeserializeYaml(err) => Some(err),
            Error::UrlParse(err) => Some(err),
        }
    }
}

impl From<serde_yaml::Error> for Error {
    /// Converts a [`serde_yaml::Error`] into an [`Error`]. It allows us to
    /// use the `?` operator for [`serde_yaml`] deserialization functions.
    fn from(err: serde_yaml::Error) -> Error {
        Error::DeserializeYaml(err)
    }
}

impl From<url::ParseError> for Error {
    /// Converts a [`url::ParseError`] into an [`Error`]. It allows us to
    /// use the `?` operator for URL parsing and joining functions.
    fn from(err: url::ParseError) -> Error {
        Error::UrlParse(err)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::fs;

    fn write_project(root: &Path) {
        fs::write(
            root.join(PROJECT_FILE),
            "site_root: https://example.org\n\
             title: Example Blog\n\
             description: An example.\n\
             author:\n  name: Example Author\n  email: author@example.org\n",
        )
        .unwrap();
        fs::create_dir_all(root.join("theme")).unwrap();
        fs::write(
            root.join("theme/theme.yaml"),
            "index_template: [base.html, index.html]\nposts_template: [base.html, post.html]\n",
        )
        .unwrap();
    }

    #[test]
    fn test_from_directory_walks_up() {
        let dir = tempfile::tempdir().unwrap();
        write_project(dir.path());
        let nested = dir.path().join("posts/deep");
        fs::create_dir_all(&nested).unwrap();

        let config = Config::from_directory(&nested, &dir.path().join("_output")).unwrap();
        assert_eq!("Example Blog", config.title);
        assert_eq!("https://example.org/", config.site_root.as_str());
        assert_eq!("https://example.org/pages/", config.index_url.as_str());
        assert_eq!("https://example.org/posts/", config.posts_url.as_str());
        assert_eq!("https://example.org/feed.atom", config.atom_url.as_str());
        assert_eq!(10, config.index_page_size);
        assert_eq!(dir.path().join("posts"), config.posts_source_directory);
        assert_eq!(
            vec![
                dir.path().join("theme/base.html"),
                dir.path().join("theme/index.html"),
            ],
            config.index_template
        );
    }

    #[test]
    fn test_missing_project_file() {
        let dir = tempfile::tempdir().unwrap();
        match Config::from_directory(dir.path(), Path::new("/tmp/out")) {
            Err(Error::ProjectFileNotFound) => {}
            other => panic!(
                "wanted ProjectFileNotFound; found {:?}",
                other.map(|config| config.title)
            ),
        }
    }

    #[test]
    fn test_site_root_without_trailing_slash() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(PROJECT_FILE),
            "site_root: https://example.org/blog\ntitle: Example\n",
        )
        .unwrap();
        fs::create_dir_all(dir.path().join("theme")).unwrap();
        fs::write(
            dir.path().join("theme/theme.yaml"),
            "index_template: [index.html]\nposts_template: [post.html]\n",
        )
        .unwrap();

        let config = Config::from_directory(dir.path(), Path::new("/tmp/out")).unwrap();
        assert_eq!("https://example.org/blog/posts/", config.posts_url.as_str());
    }
}
