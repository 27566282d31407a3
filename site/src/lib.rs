//! Static status pages for the LliureX mirror tracker.

pub mod format;
pub mod releases;
pub mod render;
pub mod templates;

pub use render::{site_link, write_pages, Page, RenderError, Renderer, SiteData};
