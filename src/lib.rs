//! The library code for the `michifumi` static site generator. The
//! architecture can be broken down into two distinct steps:
//!
//! 1. Parsing posts from source files on disk ([`crate::post`])
//! 2. Converting the posts into output files on disk ([`crate::write`],
//!    [`crate::feed`], [`crate::sitemap`])
//!
//! Of the two, the second step is the more involved. Besides the post pages
//! themselves, we create groups of index pages for each tag and another
//! group for the empty tag which corresponds to all posts. A group of index
//! pages is referred to as an "index", and each index is paginated --
//! converted into groups of pages based on a configurable number of posts
//! per index page. The site's machine endpoints (the Atom feed, the
//! sitemap, robots.txt, and the embedded search payload) are generated
//! alongside the pages.
//!
//! A third concern lives next to the generator: the listing search core
//! ([`crate::search`], [`crate::filter`], [`crate::listing`]). The site's
//! listing pages filter their post cards in the browser; those modules are
//! the same logic -- payload loading, substring search, multi-tag
//! filtering, and view synchronization -- expressed over an element model
//! so it can be tested here and driven from the CLI against a built site.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]

pub mod build;
pub mod config;
pub mod feed;
pub mod filter;
pub mod listing;
pub mod markdown;
pub mod post;
pub mod search;
pub mod sitemap;
pub mod tag;
pub mod write;
