//! Defines the [`Tag`] type, which represents a [`crate::post::Post`] tag.

use gtmpl_value::Value;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use url::Url;

/// Represents a [`crate::post::Post`] tag. The tag's name doubles as its
/// filter key: the listing page's tag buttons, the card `data-tags`
/// attribute, and the search payload all carry the same slugified names.
#[derive(Clone, Debug)]
pub struct Tag {
    /// The tag's name. This is slugified so e.g., `macOS` and `MacOS`
    /// resolve to the same value, and also so the field can be dropped into
    /// a [`Url`].
    pub name: String,

    /// The URL for the tag's first index page. Given an `index_url`, this
    /// looks like `{index_url}/{tag_name}/index.html`.
    pub url: Url,
}

impl Tag {
    /// Builds a tag from its raw frontmatter name and the base URL for
    /// index pages.
    pub fn new(name: &str, index_url: &Url) -> Tag {
        let name = slug::slugify(name);
        Tag {
            // a slug is always a valid relative path, so join can't fail
            url: index_url.join(&format!("{}/index.html", name)).unwrap(),
            name,
        }
    }
}

impl Hash for Tag {
    /// Implements [`Hash`] for [`Tag`] by delegating directly to the `name`
    /// field.
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state)
    }
}

impl PartialEq for Tag {
    /// Implements [`PartialEq`] and [`Eq`] for [`Tag`] by delegating
    /// directly to the `name` field.
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}
impl Eq for Tag {}

impl From<&Tag> for Value {
    /// Converts [`Tag`]s into [`Value`]s for templating.
    fn from(t: &Tag) -> Value {
        let mut m: HashMap<String, Value> = HashMap::new();
        m.insert("tag".to_owned(), (&t.name).into());
        m.insert("url".to_owned(), Value::String(t.url.to_string()));
        Value::Object(m)
    }
}
