mod indexing;
mod search;

pub use indexing::IndexingService;
pub use search::SearchService;
