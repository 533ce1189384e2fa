//! Reading side of the digest: load the archive, page through dates, filter
//! by category and render cards.

pub mod page;
pub mod render;
pub mod store;

pub use page::{DigestPage, PageState, PagerConfig, PagerDirection};
pub use store::{DigestStore, FsStore, HttpStore};
