pub mod document;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod parse;
pub mod preprocess;
pub mod query;
pub mod session;
pub mod store;
pub mod text;

pub use document::{Document, Heading, Link};
pub use error::{ExtractError, FetchError, Result, ScrapeError};
pub use extract::{ExtractConfig, extract, extract_with_config};
pub use fetch::{FetchConfig, HttpFetcher, PageFetcher, RawPage, parse_http_url};
#[doc(hidden)]
pub use parse::HtmlPage;
#[doc(hidden)]
pub use preprocess::PreprocessConfig;
pub use preprocess::preprocess_html;
pub use query::{MatchedSection, NO_CONTENT, QueryResolver, QueryResult, ResolverConfig};
pub use session::{
    Intent, Message, NO_SOURCE_MESSAGE, Response, ResponseKind, Role, SCRAPE_PREFIX, SHOW_SOURCE_KEYWORD, Session,
    SessionConfig, SessionConfigBuilder, classify,
};
pub use store::{Source, SourceMeta, SourceStore};
