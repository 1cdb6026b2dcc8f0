pub mod error;
pub mod filter;
pub mod normalize;
pub mod storage;
pub mod types;

pub use error::{Error, Result};
pub use filter::{language_name, ArticleFilter, DateRange, FilterParams};
pub use normalize::normalize;
pub use storage::ArticleStorage;
pub use types::{
    Article, DistinctField, Page, Pagination, RawArticle, UpsertReport, DEFAULT_PAGE_SIZE,
    MAX_PAGE_SIZE, STATUS_ACTIVE,
};
