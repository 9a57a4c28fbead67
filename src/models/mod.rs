pub mod cache_entry;
pub mod tmdb;

pub use cache_entry::{stale_ttl, CacheEntry, STALE_TTL_SECS};
pub use tmdb::{
    CastCredit, CombinedCredits, MediaType, Paginated, PersonImages, PersonVideo, Video,
    VideoList, VideoSource,
};
