use rand::Rng;
use serde::Deserialize;
use std::time::Duration;

/// Last resort when both search and random-photo lookups fail.
pub const FALLBACK_IMAGE_URL: &str =
    "https://images.unsplash.com/photo-1546069901-ba9599a7e63c?w=800";

const SEARCH_PER_PAGE: usize = 15;
/// Highest index the random pick may land on.
const PICK_CEILING: usize = 10;
const RANDOM_QUERY: &str = "delicious food meal";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Deserialize)]
struct PhotoUrls {
    regular: String,
}

#[derive(Deserialize)]
struct Photo {
    urls: PhotoUrls,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<Photo>,
}

/// Build the image search query: up to three non-empty tags, or the first
/// three words of the title when no tag is usable, followed by "meal".
#[must_use]
pub fn search_query(title: &str, tags: &[String]) -> String {
    let tag_terms: Vec<&str> = tags
        .iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .take(3)
        .collect();

    let terms = if tag_terms.is_empty() {
        title.split_whitespace().take(3).collect::<Vec<_>>()
    } else {
        tag_terms
    };

    let mut query = terms.join(" ");
    if !query.is_empty() {
        query.push(' ');
    }
    query.push_str("meal");
    query.to_lowercase()
}

fn pick_index(result_count: usize) -> usize {
    let upper = PICK_CEILING.min(result_count.saturating_sub(1));
    rand::thread_rng().gen_range(0..=upper)
}

/// Finds a picture for a recipe via the Unsplash API. Never fails outward.
#[derive(Debug, Clone)]
pub struct ImageResolver {
    pub base: String,
    pub access_key: String,
}

impl ImageResolver {
    #[must_use]
    pub const fn new(base: String, access_key: String) -> Self {
        Self { base, access_key }
    }

    fn get(&self, http: &reqwest::Client, path: &str) -> reqwest::RequestBuilder {
        http.get(format!("{}/{path}", self.base.trim_end_matches('/')))
            .header(
                reqwest::header::AUTHORIZATION,
                format!("Client-ID {}", self.access_key),
            )
            .header("Accept-Version", "v1")
            .timeout(REQUEST_TIMEOUT)
    }

    /// Search, then random photo, then [`FALLBACK_IMAGE_URL`].
    pub async fn resolve(&self, http: &reqwest::Client, title: &str, tags: &[String]) -> String {
        let query = search_query(title, tags);

        match self.search(http, &query).await {
            Ok(Some(url)) => return url,
            Ok(None) => tracing::info!(%query, "image search returned no results"),
            Err(e) => tracing::warn!(%query, error = %e, "image search failed"),
        }

        match self.random(http).await {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!(error = %e, "random image lookup failed, using fallback");
                FALLBACK_IMAGE_URL.to_string()
            }
        }
    }

    async fn search(&self, http: &reqwest::Client, query: &str) -> anyhow::Result<Option<String>> {
        let per_page = SEARCH_PER_PAGE.to_string();
        let resp = self
            .get(http, "search/photos")
            .query(&[
                ("query", query),
                ("per_page", per_page.as_str()),
                ("orientation", "landscape"),
                ("content_filter", "high"),
            ])
            .send()
            .await?;

        if resp.status() == reqwest::StatusCode::UNAUTHORIZED {
            anyhow::bail!("unauthorized; check the Unsplash access key");
        }

        let data: SearchResponse = resp.error_for_status()?.json().await?;
        if data.results.is_empty() {
            return Ok(None);
        }

        let idx = pick_index(data.results.len());
        tracing::debug!(%query, results = data.results.len(), idx, "picked image");
        Ok(data.results.into_iter().nth(idx).map(|p| p.urls.regular))
    }

    async fn random(&self, http: &reqwest::Client) -> anyhow::Result<String> {
        let photo: Photo = self
            .get(http, "photos/random")
            .query(&[
                ("query", RANDOM_QUERY),
                ("orientation", "landscape"),
                ("content_filter", "high"),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(photo.urls.regular)
    }
}
