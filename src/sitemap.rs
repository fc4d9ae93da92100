//! Generates the crawler endpoints: `sitemap.xml` and `robots.txt`.

use crate::post::Post;
use chrono::{FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, ParseError, TimeZone};
use std::fmt;
use std::io::Write;
use url::Url;

/// Writes the sitemap for the home page plus every post. The home page's
/// `lastmod` is the newest post's date; `posts` arrive sorted most recent
/// first, so that's the head of the slice.
pub fn write_sitemap<W: Write>(site_root: &Url, posts: &[Post], mut w: W) -> Result<()> {
    writeln!(w, r#"<?xml version="1.0" encoding="UTF-8"?>"#)?;
    writeln!(
        w,
        r#"<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">"#
    )?;
    match posts.first() {
        Some(newest) => writeln!(
            w,
            "  <url><loc>{}</loc><lastmod>{}</lastmod></url>",
            site_root,
            lastmod(&newest.date)?
        )?,
        None => writeln!(w, "  <url><loc>{}</loc></url>", site_root)?,
    }
    for post in posts {
        writeln!(
            w,
            "  <url><loc>{}</loc><lastmod>{}</lastmod></url>",
            post.url,
            lastmod(&post.date)?
        )?;
    }
    writeln!(w, "</urlset>")?;
    Ok(())
}

/// Writes the robots policy: allow everything, point crawlers at the
/// sitemap.
pub fn write_robots<W: Write>(site_root: &Url, mut w: W) -> Result<()> {
    // a fixed relative path always joins cleanly
    let sitemap_url = site_root.join("sitemap.xml").unwrap();
    write!(w, "User-agent: *\nAllow: /\nSitemap: {}\n", sitemap_url)?;
    Ok(())
}

// Post dates are bare days; lastmod pins them to midnight UTC, RFC 3339.
fn lastmod(date: &str) -> Result<String> {
    let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")?;
    let midnight = NaiveDateTime::new(date, NaiveTime::from_hms(0, 0, 0));
    Ok(FixedOffset::east(0).from_utc_datetime(&midnight).to_rfc3339())
}

type Result<T> = std::result::Result<T, Error>;

/// Represents a problem writing a crawler endpoint.
#[derive(Debug)]
pub enum Error {
    /// Returned when there is a generic I/O error.
    Io(std::io::Error),

    /// Returned when there is an issue parsing a post's date.
    DateTimeParse(ParseError),
}

impl fmt::Display for Error {
    /// Implements [`fmt::Display`] for [`Error`].
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Io(err) => err.fmt(f),
            Error::DateTimeParse(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements [`std::error::Error`] for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            Error::DateTimeParse(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for Error {
    /// Converts [`std::io::Error`]s into [`Error`]. This allows us to use
    /// the `?` operator in fallible sitemap operations.
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}

impl From<ParseError> for Error {
    /// Converts [`ParseError`]s into [`Error`]. This allows us to use the
    /// `?` operator in fallible sitemap operations.
    fn from(err: ParseError) -> Error {
        Error::DateTimeParse(err)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::collections::HashSet;
    use std::path::PathBuf;

    fn post(id: &str, date: &str) -> Post {
        Post {
            id: id.to_owned(),
            title: id.to_owned(),
            description: String::new(),
            date: date.to_owned(),
            url: Url::parse("https://example.org/posts/")
                .unwrap()
                .join(&format!("{}.html", id))
                .unwrap(),
            file_path: PathBuf::new(),
            tags: HashSet::new(),
            body: String::new(),
            source: String::new(),
        }
    }

    #[test]
    fn test_write_sitemap() {
        let site_root = Url::parse("https://example.org/").unwrap();
        let posts = vec![post("rust-basics", "2021-03-01"), post("go-routines", "2021-02-14")];
        let mut buffer = Vec::new();
        write_sitemap(&site_root, &posts, &mut buffer).unwrap();
        let sitemap = String::from_utf8(buffer).unwrap();

        assert!(sitemap.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
        // Home page carries the newest post's date.
        assert!(sitemap.contains(
            "<url><loc>https://example.org/</loc>\
             <lastmod>2021-03-01T00:00:00+00:00</lastmod></url>"
        ));
        assert!(sitemap.contains("https://example.org/posts/go-routines.html"));
        assert!(sitemap.contains("2021-02-14T00:00:00+00:00"));
        assert!(sitemap.trim_end().ends_with("</urlset>"));
    }

    #[test]
    fn test_write_sitemap_no_posts() {
        let site_root = Url::parse("https://example.org/").unwrap();
        let mut buffer = Vec::new();
        write_sitemap(&site_root, &[], &mut buffer).unwrap();
        let sitemap = String::from_utf8(buffer).unwrap();
        assert!(sitemap.contains("<url><loc>https://example.org/</loc></url>"));
        assert!(!sitemap.contains("lastmod"));
    }

    #[test]
    fn test_write_robots() {
        let site_root = Url::parse("https://example.org/").unwrap();
        let mut buffer = Vec::new();
        write_robots(&site_root, &mut buffer).unwrap();
        assert_eq!(
            "User-agent: *\nAllow: /\nSitemap: https://example.org/sitemap.xml\n",
            String::from_utf8(buffer).unwrap()
        );
    }
}
