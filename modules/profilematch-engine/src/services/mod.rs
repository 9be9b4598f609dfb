// Network-backed implementations of the collaborator traits. Each service talks to one
// upstream and returns the engine's plain types. No caching here; wrap in CachedPageFetcher.

pub mod page;
pub mod places;
pub mod search;

pub use page::HttpPageFetcher;
pub use places::PlacesListingProvider;
pub use search::SerperSearch;
