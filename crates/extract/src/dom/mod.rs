// ABOUTME: Document model adapter over scraper's HTML tree.
// ABOUTME: Isolates extractors from the concrete document implementation.

//! Document model adapter.
//!
//! Extractors only see [`Page`] and the free helpers here: heading lookup,
//! sibling navigation, selector queries and rendered text. Nothing in this
//! module mutates the document.

pub mod decode;
pub mod page;
pub mod selectors;
pub mod text;

pub use decode::decode_html;
pub use page::{
    next_sibling, parent_element, parent_next_sibling, query_all_in, query_first_in, text, Page,
};
pub use text::{inner_text_lines, normalize_whitespace, text_content, LineMode};
