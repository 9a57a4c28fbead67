pub mod fuzzy;
pub mod person;
pub mod proxy;
pub mod search;
pub mod upstream;

pub use proxy::{CacheTiers, MetadataProxy, ProxyResponse, Served};
pub use upstream::{TmdbClient, Upstream, UpstreamRequest};
