use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Media types TMDB uses in mixed result lists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Movie,
    Tv,
    Person,
}

impl MediaType {
    /// Path segment for per-title endpoints such as `/{media}/{id}/videos`
    pub fn path_segment(self) -> &'static str {
        match self {
            MediaType::Tv => "tv",
            MediaType::Movie | MediaType::Person => "movie",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MediaType::Movie => "movie",
            MediaType::Tv => "tv",
            MediaType::Person => "person",
        }
    }
}

/// Pagination envelope shared by the person endpoints
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Paginated<T> {
    pub page: usize,
    pub page_size: usize,
    pub total: usize,
    pub results: Vec<T>,
}

impl<T: Clone> Paginated<T> {
    /// Slices one page out of `items`; pages past the end are empty
    pub fn from_slice(items: &[T], page: usize, page_size: usize) -> Self {
        let start = page.saturating_sub(1).saturating_mul(page_size);
        let results = items.iter().skip(start).take(page_size).cloned().collect();
        Self {
            page,
            page_size,
            total: items.len(),
            results,
        }
    }
}

/// Response from `person/{id}/images`
#[derive(Debug, Clone, Deserialize)]
pub struct PersonImages {
    #[serde(default)]
    pub profiles: Vec<Value>,
}

/// Response from `person/{id}/combined_credits`
#[derive(Debug, Clone, Deserialize)]
pub struct CombinedCredits {
    #[serde(default)]
    pub cast: Vec<CastCredit>,
}

/// One cast credit; movies carry `title`, series carry `name`
#[derive(Debug, Clone, Deserialize)]
pub struct CastCredit {
    pub id: u64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub media_type: Option<MediaType>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub popularity: Option<f64>,
}

impl CastCredit {
    pub fn display_title(&self) -> &str {
        self.title
            .as_deref()
            .or(self.name.as_deref())
            .unwrap_or_default()
    }

    pub fn popularity(&self) -> f64 {
        self.popularity.unwrap_or(0.0)
    }
}

/// Response from `{movie|tv}/{id}/videos`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VideoList {
    #[serde(default)]
    pub results: Vec<Video>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Video {
    pub id: String,
    pub key: String,
    #[serde(default)]
    pub name: String,
    pub site: String,
    #[serde(rename = "type")]
    pub video_type: String,
}

/// A video surfaced on a person page, with the credit it came from
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PersonVideo {
    pub key: String,
    pub name: String,
    pub site: String,
    #[serde(rename = "type")]
    pub video_type: String,
    pub id: String,
    pub from: VideoSource,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct VideoSource {
    pub id: u64,
    pub title: String,
    pub media_type: Option<MediaType>,
    pub poster_path: Option<String>,
    pub popularity: f64,
}
