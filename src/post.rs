//! Defines the [`Post`], [`Parser`], and [`Error`] types, plus the logic
//! for parsing posts from the file system into memory. See
//! [`Post::to_value`] and [`Post::summarize`] for details on how posts are
//! converted into template values, and [`Post::to_document`] for how they
//! enter the search payload.

use std::{
    collections::{HashMap, HashSet},
    fmt,
    fs::{read_dir, File},
    path::{Path, PathBuf},
};

use gtmpl::Value;
use log::debug;
use serde::Deserialize;
use url::Url;

use crate::{markdown, search::Document, tag::Tag};

/// One parsed blog post.
#[derive(Clone, Debug)]
pub struct Post {
    /// The post's identifier: its source path relative to the posts
    /// directory, less the extension. Shared with the post's card and its
    /// search-payload document.
    pub id: String,

    pub title: String,

    /// The one-line description used for index cards, the feed, and the
    /// search payload.
    pub description: String,

    /// The post's date as a `YYYY-MM-DD` string.
    pub date: String,

    /// The URL of the rendered post page.
    pub url: Url,

    /// The target location of the rendered post page on disk.
    pub file_path: PathBuf,

    pub tags: HashSet<Tag>,

    /// The rendered HTML body.
    pub body: String,

    /// The unrendered markdown body. The search payload carries this
    /// instead of [`Post::body`] so substring matches don't trip on markup.
    pub source: String,
}

impl Post {
    /// Returns the portion of the body above the fold marker and whether
    /// the marker was present.
    pub fn summary(&self) -> (&str, bool) {
        const FOLD_TAG: &str = "<!-- more -->";
        match self.body.find(FOLD_TAG) {
            Some(i) => (&self.body[..i], true),
            None => (&self.body, false),
        }
    }

    /// Converts the post into its search-payload [`Document`].
    pub fn to_document(&self) -> Document {
        let mut tags: Vec<String> = self.tags.iter().map(|tag| tag.name.clone()).collect();
        tags.sort();
        Document {
            id: self.id.clone(),
            title: self.title.clone(),
            description: self.description.clone(),
            body: self.source.clone(),
            tags,
        }
    }

    /// The JSON-encoded tag name array, as rendered into the card's
    /// `data-tags` attribute.
    pub fn tags_json(&self) -> String {
        let mut tags: Vec<&str> = self.tags.iter().map(|tag| tag.name.as_str()).collect();
        tags.sort_unstable();
        // serializing a list of strings can't fail
        serde_json::to_string(&tags).unwrap()
    }

    /// Converts a [`Post`] into a template [`Value`] for post pages.
    pub fn to_value(&self) -> Value {
        let mut m: HashMap<String, Value> = HashMap::new();
        m.insert("id".to_owned(), (&self.id).into());
        m.insert("title".to_owned(), (&self.title).into());
        m.insert("description".to_owned(), (&self.description).into());
        m.insert("date".to_owned(), (&self.date).into());
        m.insert("url".to_owned(), Value::String(self.url.to_string()));
        m.insert("body".to_owned(), (&self.body).into());
        m.insert("tags".to_owned(), self.tag_values());
        Value::Object(m)
    }

    /// Converts a [`Post`] into the abbreviated template [`Value`] used by
    /// index pages: the summary instead of the full body, plus the card
    /// attributes (`id`, `tags_json`) the listing script binds to.
    pub fn summarize(&self) -> Value {
        let (summary, summarized) = self.summary();
        let mut m: HashMap<String, Value> = HashMap::new();
        m.insert("id".to_owned(), (&self.id).into());
        m.insert("title".to_owned(), (&self.title).into());
        m.insert("description".to_owned(), (&self.description).into());
        m.insert("date".to_owned(), (&self.date).into());
        m.insert("url".to_owned(), Value::String(self.url.to_string()));
        m.insert("summary".to_owned(), summary.into());
        m.insert("summarized".to_owned(), Value::Bool(summarized));
        m.insert("tags".to_owned(), self.tag_values());
        m.insert("tags_json".to_owned(), Value::String(self.tags_json()));
        Value::Object(m)
    }

    fn tag_values(&self) -> Value {
        let mut tags: Vec<&Tag> = self.tags.iter().collect();
        tags.sort_by(|a, b| a.name.cmp(&b.name));
        Value::Array(tags.into_iter().map(Value::from).collect())
    }
}

/// Parses [`Post`] objects from source files.
pub struct Parser<'a> {
    /// `index_url` is the base URL for index pages. It's used to prefix tag
    /// page URLs (i.e., the URL for the first page of a tag is
    /// `{index_url}/{tag_name}/index.html`).
    index_url: &'a Url,

    /// `posts_url` is the base URL for post pages. It's used to prefix post
    /// page URLs (i.e., the URL for a post is `{posts_url}/{post_id}.html`).
    posts_url: &'a Url,

    /// `posts_directory` is the directory in which post pages will be
    /// rendered.
    posts_directory: &'a Path,
}

impl<'a> Parser<'a> {
    /// Constructs a new parser. See fields on [`Parser`] for argument
    /// descriptions.
    pub fn new(index_url: &'a Url, posts_url: &'a Url, posts_directory: &'a Path) -> Parser<'a> {
        Parser {
            index_url,
            posts_url,
            posts_directory,
        }
    }

    fn parse_post_bundle(
        &self,
        posts_source_directory: &Path,
        relative_path: &Path,
        static_files: &mut Vec<StaticFile>,
    ) -> Result<Option<Post>> {
        // We want to make sure we can parse a post before we mutate
        // `static_files`
        let post = match self.parse_post(posts_source_directory, &relative_path.join("index.md"))? {
            Some(post) => post,
            None => return Ok(None),
        };

        use walkdir::WalkDir;
        let abs = posts_source_directory.join(relative_path);
        for result in WalkDir::new(&abs) {
            let entry = result?;
            if entry.file_type().is_file() && entry.file_name() != "index.md" {
                static_files.push((
                    entry.path().to_owned(),
                    self.posts_directory
                        .join(relative_path.file_name().unwrap())
                        // strip_prefix shouldn't fail since `abs` is always an
                        // ancestor of `entry_path`
                        .join(entry.path().strip_prefix(&abs).unwrap()),
                ));
            }
        }

        Ok(Some(post))
    }

    /// Parses a single [`Post`]. Returns `Ok(None)` for drafts, which are
    /// excluded from every output: pages, feed, sitemap, and the search
    /// payload.
    fn parse_post(
        &self,
        posts_source_directory: &Path,
        relative_path: &Path,
    ) -> Result<Option<Post>> {
        match self._parse_post(posts_source_directory, relative_path) {
            Ok(p) => Ok(p),
            Err(e) => Err(Error::Annotated(
                format!("parsing post `{:?}`", relative_path),
                Box::new(e),
            )),
        }
    }

    fn _parse_post(
        &self,
        posts_source_directory: &Path,
        relative_path: &Path,
    ) -> Result<Option<Post>> {
        fn frontmatter_indices(input: &str) -> Result<(usize, usize, usize)> {
            const FENCE: &str = "---";
            if !input.starts_with(FENCE) {
                return Err(Error::FrontmatterMissingStartFence);
            }
            match input[FENCE.len()..].find("---") {
                None => Err(Error::FrontmatterMissingEndFence),
                Some(offset) => Ok((
                    FENCE.len(),                        // yaml_start
                    FENCE.len() + offset,               // yaml_stop
                    FENCE.len() + offset + FENCE.len(), // body_start
                )),
            }
        }

        use std::io::Read;
        let mut contents = String::new();
        File::open(posts_source_directory.join(relative_path))?.read_to_string(&mut contents)?;
        let input: &str = &contents;

        let (yaml_start, yaml_stop, body_start) = frontmatter_indices(input)?;
        let frontmatter: Frontmatter = serde_yaml::from_str(&input[yaml_start..yaml_stop])?;
        if frontmatter.draft {
            debug!("skipping draft `{:?}`", relative_path);
            return Ok(None);
        }

        let with_extension = if relative_path.ends_with("index.md") {
            relative_path.parent().unwrap()
        } else {
            relative_path
        }
        .with_extension("html");

        let file_name = with_extension
            .file_name()
            .ok_or_else(|| InvalidFileNameError(relative_path.to_owned()))?
            .to_str()
            .ok_or_else(|| InvalidFileNameError(relative_path.to_owned()))?;

        let source = input[body_start..].trim().to_owned();
        let mut post = Post {
            id: file_name.trim_end_matches(HTML_EXTENSION).to_owned(),
            title: frontmatter.title,
            description: frontmatter.description,
            date: frontmatter.date,
            file_path: self.posts_directory.join(&file_name),
            url: self.posts_url.join(file_name)?,
            tags: frontmatter
                .tags
                .iter()
                .map(|t| Tag::new(t, self.index_url))
                .collect(),
            body: String::default(),
            source,
        };

        markdown::to_html(&mut post.body, &post.source);
        Ok(Some(post))
    }

    /// Searches a provided `source_directory` for post files (extension =
    /// `.md`) and post bundles (directories holding an `index.md` plus
    /// assets), and returns a list of [`Post`] objects sorted by date (most
    /// recent first) along with the bundle assets to copy. Each post file
    /// must be structured as follows:
    ///
    /// 1. Initial frontmatter fence (`---`)
    /// 2. YAML frontmatter with fields `Title`, `Date`, and optionally
    ///    `Description`, `Tags`, and `Draft`
    /// 3. Terminal frontmatter fence (`---`)
    /// 4. Post body
    ///
    /// For example:
    ///
    /// ```md
    /// ---
    /// Title: Hello, world!
    /// Description: An inaugural post.
    /// Date: 2021-04-16
    /// Tags: [greet]
    /// ---
    /// # Hello
    ///
    /// World
    /// ```
    pub fn parse_posts(&self, source_directory: &Path) -> Result<Posts> {
        let mut posts = Vec::new();
        let mut static_files = Vec::new();
        for result in read_dir(source_directory)? {
            let entry = result?;
            let os_file_name = entry.file_name();
            let file_name = os_file_name.to_string_lossy();
            if Self::is_bundle(&entry)? {
                posts.extend(self.parse_post_bundle(
                    source_directory,
                    // strip_prefix() should never fail
                    entry.path().strip_prefix(source_directory).unwrap(),
                    &mut static_files,
                )?)
            } else if file_name.ends_with(MARKDOWN_EXTENSION) {
                posts.extend(self.parse_post(
                    source_directory,
                    // should never fail
                    entry.path().strip_prefix(source_directory).unwrap(),
                )?);
            }
        }

        posts.sort_by(|a, b| b.date.cmp(&a.date));
        Ok((posts, static_files))
    }

    fn is_bundle(entry: &std::fs::DirEntry) -> std::io::Result<bool> {
        Ok(entry.file_type()?.is_dir() && entry.path().join("index.md").is_file())
    }
}

const MARKDOWN_EXTENSION: &str = ".md";
const HTML_EXTENSION: &str = ".html";

#[derive(Deserialize, Clone)]
struct Frontmatter {
    /// The title of the post.
    #[serde(rename = "Title")]
    pub title: String,

    /// The one-line description of the post.
    #[serde(default, rename = "Description")]
    pub description: String,

    /// The date of the post.
    #[serde(rename = "Date")]
    pub date: String,

    /// The tags associated with the post.
    #[serde(default, rename = "Tags")]
    pub tags: HashSet<String>,

    /// Whether the post is a draft. Drafts are parsed and then dropped.
    #[serde(default, rename = "Draft")]
    pub draft: bool,
}

#[derive(Debug)]
pub struct InvalidFileNameError(PathBuf);

impl fmt::Display for InvalidFileNameError {
    /// Displays an [`InvalidFileNameError`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "invalid file name: {:?}", &self.0)
    }
}

impl std::error::Error for InvalidFileNameError {
    /// Implements the [`std::error::Error`] trait for
    /// [`InvalidFileNameError`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        None
    }
}

/// The parsed posts plus the bundle assets to copy, as
/// `(source, target)` path pairs.
pub type Posts = (Vec<Post>, Vec<StaticFile>);

pub type StaticFile = (PathBuf, PathBuf);

/// Represents the result of a [`Post`]-parse operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error parsing a [`Post`] object.
#[derive(Debug)]
pub enum Error {
    /// Returned when a post source file is missing its starting frontmatter
    /// fence (`---`).
    FrontmatterMissingStartFence,

    /// Returned when a post source file is missing its terminal frontmatter
    /// fence (`---` i.e., the starting fence was found but the ending one
    /// was missing).
    FrontmatterMissingEndFence,

    /// Returned when there was an error parsing the frontmatter as YAML.
    DeserializeYaml(serde_yaml::Error),

    /// Returned when there is a problem parsing URLs.
    UrlParse(url::ParseError),

    /// Returned for other I/O errors.
    Io(std::io::Error),

    /// Returned for WalkDir I/O errors.
    WalkDir(walkdir::Error),

    /// Returned when a source file isn't valid UTF-8.
    InvalidFileName(InvalidFileNameError),

    /// An error with an annotation.
    Annotated(String, Box<Error>),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::FrontmatterMissingStartFence => {
                write!(f, "Post must begin with `---`")
            }
            Error::FrontmatterMissingEndFence => {
                write!(f, "Missing closing `---`")
            }
            Error::DeserializeYaml(err) => err.fmt(f),
            Error::UrlParse(err) => err.fmt(f),
            Error::Io(err) => err.fmt(f),
            Error::WalkDir(err) => err.fmt(f),
            Error::InvalidFileName(err) => err.fmt(f),
            Error::Annotated(annotation, err) => {
                write!(f, "{}: {}", &annotation, err)
            }
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::FrontmatterMissingStartFence => None,
            Error::FrontmatterMissingEndFence => None,
            Error::DeserializeYaml(err) => Some(err),
            Error::UrlParse(err) => Some(err),
            Error::Io(err) => Some(err),
            Error::WalkDir(err) => Some(err),
            Error::InvalidFileName(err) => Some(err),
            Error::Annotated(_, err) => Some(err),
        }
    }
}

impl From<InvalidFileNameError> for Error {
    fn from(err: InvalidFileNameError) -> Error {
        Error::InvalidFileName(err)
    }
}

impl From<url::ParseError> for Error {
    /// Converts a [`url::ParseError`] into an [`Error`]. It allows us to
    /// use the `?` operator for URL parsing and joining functions.
    fn from(err: url::ParseError) -> Error {
        Error::UrlParse(err)
    }
}

impl From<serde_yaml::Error> for Error {
    /// Converts a [`serde_yaml::Error`] into an [`Error`]. It allows us to
    /// use the `?` operator for [`serde_yaml`] deserialization functions.
    fn from(err: serde_yaml::Error) -> Error {
        Error::DeserializeYaml(err)
    }
}

impl From<walkdir::Error> for Error {
    /// Converts a [`walkdir::Error`] into an [`Error`]. It allows us to
    /// use the `?` operator for fallible I/O functions.
    fn from(err: walkdir::Error) -> Error {
        Error::WalkDir(err)
    }
}

impl From<std::io::Error> for Error {
    /// Converts a [`std::io::Error`] into an [`Error`]. It allows us to
    /// use the `?` operator for fallible I/O functions.
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}

#[cfg(test)]
mod test {
    use std::path::PathBuf;

    use super::*;

    fn parse_testdata() -> Posts {
        let index_url = Url::parse("https://example.org/pages/").unwrap();
        let posts_url = Url::parse("https://example.org/posts/").unwrap();
        let posts_directory = PathBuf::from("/tmp/out/posts");
        let parser = Parser::new(&index_url, &posts_url, &posts_directory);
        parser
            .parse_posts(Path::new("./testdata/posts/"))
            .expect("parsing testdata posts")
    }

    #[test]
    fn test_parse_posts_sorted_most_recent_first() {
        let (posts, _) = parse_testdata();
        let ids: Vec<&str> = posts.iter().map(|post| post.id.as_str()).collect();
        assert_eq!(vec!["rust-basics", "field-notes", "go-routines"], ids);
    }

    #[test]
    fn test_drafts_are_skipped() {
        let (posts, _) = parse_testdata();
        assert!(posts.iter().all(|post| post.id != "unfinished"));
    }

    #[test]
    fn test_tags_slugified_and_urled() {
        let (posts, _) = parse_testdata();
        let post = posts
            .iter()
            .find(|post| post.id == "rust-basics")
            .expect("wanted rust-basics");
        let mut names: Vec<&str> = post.tags.iter().map(|tag| tag.name.as_str()).collect();
        names.sort_unstable();
        assert_eq!(vec!["rust", "systems"], names);
        let rust = post.tags.iter().find(|tag| tag.name == "rust").unwrap();
        assert_eq!(
            "https://example.org/pages/rust/index.html",
            rust.url.as_str()
        );
    }

    #[test]
    fn test_post_url_and_file_path() {
        let (posts, _) = parse_testdata();
        let post = posts.iter().find(|post| post.id == "go-routines").unwrap();
        assert_eq!(
            "https://example.org/posts/go-routines.html",
            post.url.as_str()
        );
        assert_eq!(PathBuf::from("/tmp/out/posts/go-routines.html"), post.file_path);
    }

    #[test]
    fn test_summary_folds_at_marker() {
        let (posts, _) = parse_testdata();
        let post = posts.iter().find(|post| post.id == "rust-basics").unwrap();
        let (summary, summarized) = post.summary();
        assert!(summarized);
        assert!(summary.contains("Ownership"));
        assert!(!summary.contains("below the fold"));
    }

    #[test]
    fn test_bundle_assets_collected() {
        let (_, static_files) = parse_testdata();
        assert_eq!(
            vec![(
                PathBuf::from("./testdata/posts/field-notes/diagram.txt"),
                PathBuf::from("/tmp/out/posts/field-notes/diagram.txt"),
            )],
            static_files
        );
    }

    #[test]
    fn test_to_document_uses_markdown_source() {
        let (posts, _) = parse_testdata();
        let post = posts.iter().find(|post| post.id == "rust-basics").unwrap();
        let document = post.to_document();
        assert_eq!(post.id, document.id);
        assert!(document.body.contains("# Ownership") || document.body.contains("Ownership"));
        assert!(!document.body.contains("<h3>"));
        assert_eq!(vec!["rust".to_owned(), "systems".to_owned()], document.tags);
    }

    #[test]
    fn test_tags_json_round_trips() {
        let (posts, _) = parse_testdata();
        let post = posts.iter().find(|post| post.id == "rust-basics").unwrap();
        assert_eq!(r#"["rust","systems"]"#, post.tags_json());
    }
}
