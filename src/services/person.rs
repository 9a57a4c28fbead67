use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;

use crate::{
    error::AppResult,
    models::{
        CastCredit, CombinedCredits, Paginated, PersonImages, PersonVideo, VideoList, VideoSource,
    },
    services::proxy::MetadataProxy,
};

/// Number of most popular credits whose videos are collected
const TOP_CREDITS: usize = 12;

/// Video types worth showing on a person page
const VIDEO_TYPES: [&str; 5] = ["Trailer", "Teaser", "Featurette", "Interview", "Clip"];

/// Default and maximum page sizes for one paginated endpoint
#[derive(Debug, Clone, Copy)]
pub struct PageBounds {
    pub default_size: usize,
    pub max_size: usize,
}

pub const IMAGE_PAGES: PageBounds = PageBounds {
    default_size: 20,
    max_size: 50,
};

pub const VIDEO_PAGES: PageBounds = PageBounds {
    default_size: 9,
    max_size: 30,
};

impl PageBounds {
    /// Parses raw `page` / `pageSize` values, falling back to defaults
    ///
    /// The page is at least 1 and the size is clamped to `1..=max_size`.
    pub fn resolve(self, page: Option<&str>, page_size: Option<&str>) -> (usize, usize) {
        let parse = |raw: Option<&str>| raw.and_then(|v| v.trim().parse::<i64>().ok());

        let page = parse(page).unwrap_or(1).max(1) as usize;
        let page_size = parse(page_size)
            .unwrap_or(self.default_size as i64)
            .clamp(1, self.max_size as i64) as usize;
        (page, page_size)
    }
}

/// One page of a person's profile images
pub async fn person_images(
    proxy: &MetadataProxy,
    person_id: &str,
    page: usize,
    page_size: usize,
) -> AppResult<Paginated<Value>> {
    let response = proxy
        .fetch_resource(&format!("person/{}/images", person_id), &BTreeMap::new())
        .await?;
    let images: PersonImages = serde_json::from_value(response.data)?;

    Ok(Paginated::from_slice(&images.profiles, page, page_size))
}

/// One page of videos from the person's most popular credits
pub async fn person_videos(
    proxy: Arc<MetadataProxy>,
    person_id: &str,
    page: usize,
    page_size: usize,
) -> AppResult<Paginated<PersonVideo>> {
    let response = proxy
        .fetch_resource(
            &format!("person/{}/combined_credits", person_id),
            &BTreeMap::new(),
        )
        .await?;
    let credits: CombinedCredits = serde_json::from_value(response.data)?;

    let mut cast = credits.cast;
    cast.sort_by(|a, b| b.popularity().total_cmp(&a.popularity()));
    cast.truncate(TOP_CREDITS);

    let mut tasks = Vec::with_capacity(cast.len());
    for credit in cast {
        let proxy = proxy.clone();
        tasks.push(tokio::spawn(async move {
            let videos = fetch_credit_videos(&proxy, &credit).await;
            (credit, videos)
        }));
    }

    let mut videos = Vec::new();
    for task in tasks {
        match task.await {
            Ok((credit, list)) => videos.extend(featured_videos(&credit, list)),
            Err(e) => tracing::error!(error = %e, "Task join error"),
        }
    }

    videos.sort_by(compare_videos);

    tracing::info!(
        person_id = %person_id,
        videos = videos.len(),
        "Person videos collected"
    );

    Ok(Paginated::from_slice(&videos, page, page_size))
}

/// Videos of one credit; a failed lookup counts as no videos
async fn fetch_credit_videos(proxy: &MetadataProxy, credit: &CastCredit) -> VideoList {
    let media = credit
        .media_type
        .map(|m| m.path_segment())
        .unwrap_or("movie");
    let path = format!("{}/{}/videos", media, credit.id);

    let result: AppResult<VideoList> = async {
        let response = proxy.fetch_resource(&path, &BTreeMap::new()).await?;
        Ok(serde_json::from_value(response.data)?)
    }
    .await;

    match result {
        Ok(list) => list,
        Err(e) => {
            tracing::debug!(credit_id = credit.id, error = %e, "Skipping credit videos");
            VideoList::default()
        }
    }
}

fn featured_videos(credit: &CastCredit, list: VideoList) -> impl Iterator<Item = PersonVideo> + '_ {
    list.results
        .into_iter()
        .filter(|v| v.site == "YouTube" && VIDEO_TYPES.contains(&v.video_type.as_str()))
        .map(move |v| PersonVideo {
            key: v.key,
            name: v.name,
            site: v.site,
            video_type: v.video_type,
            id: v.id,
            from: VideoSource {
                id: credit.id,
                title: credit.display_title().to_string(),
                media_type: credit.media_type,
                poster_path: credit.poster_path.clone(),
                popularity: credit.popularity(),
            },
        })
}

/// Most popular source first; trailers lead within the same source popularity
fn compare_videos(a: &PersonVideo, b: &PersonVideo) -> Ordering {
    let trailer_rank = |v: &PersonVideo| u8::from(v.video_type != "Trailer");
    b.from
        .popularity
        .total_cmp(&a.from.popularity)
        .then_with(|| trailer_rank(a).cmp(&trailer_rank(b)))
}
