use std::{collections::HashMap, sync::Arc};

use axum::{
    Json, Router,
    extract::Query,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde_json::json;
use tokio::sync::Mutex;

use flavourfinder::images::{FALLBACK_IMAGE_URL, ImageResolver};

#[derive(Clone, Copy)]
enum Search {
    Hits(usize),
    Unauthorized,
}

#[derive(Clone, Copy)]
enum Random {
    Ok,
    Broken,
}

type Seen = Arc<Mutex<Vec<(String, HashMap<String, String>)>>>;

/// Fake Unsplash that records the path and query of each call.
async fn fake_unsplash(search: Search, random: Random) -> (String, Seen) {
    let seen: Seen = Arc::new(Mutex::new(Vec::new()));

    let search_seen = seen.clone();
    let random_seen = seen.clone();
    let app = Router::new()
        .route(
            "/search/photos",
            get(move |Query(q): Query<HashMap<String, String>>| {
                let seen = search_seen.clone();
                async move {
                    seen.lock().await.push(("search".into(), q));
                    let resp: Response = match search {
                        Search::Hits(n) => {
                            let results: Vec<_> = (0..n)
                                .map(|i| json!({"urls": {"regular": format!("https://img.test/{i}.jpg")}}))
                                .collect();
                            Json(json!({ "results": results })).into_response()
                        }
                        Search::Unauthorized => {
                            (StatusCode::UNAUTHORIZED, "bad key").into_response()
                        }
                    };
                    resp
                }
            }),
        )
        .route(
            "/photos/random",
            get(move |Query(q): Query<HashMap<String, String>>| {
                let seen = random_seen.clone();
                async move {
                    seen.lock().await.push(("random".into(), q));
                    let resp: Response = match random {
                        Random::Ok => {
                            Json(json!({"urls": {"regular": "https://img.test/random.jpg"}}))
                                .into_response()
                        }
                        Random::Broken => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
                    };
                    resp
                }
            }),
        );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}"), seen)
}

fn tags(v: &[&str]) -> Vec<String> {
    v.iter().map(ToString::to_string).collect()
}

#[tokio::test]
async fn search_uses_tag_query_and_picks_from_top_results() {
    let (base, seen) = fake_unsplash(Search::Hits(15), Random::Ok).await;
    let resolver = ImageResolver::new(base, "key".into());
    let http = reqwest::Client::new();

    for _ in 0..10 {
        let url = resolver
            .resolve(&http, "Ignored Title", &tags(&["spicy", "grilled", "chicken"]))
            .await;
        let idx: usize = url
            .trim_start_matches("https://img.test/")
            .trim_end_matches(".jpg")
            .parse()
            .unwrap();
        assert!(idx <= 10, "picked {idx}");
    }

    let seen = seen.lock().await;
    let (path, q) = &seen[0];
    assert_eq!(path, "search");
    assert_eq!(q["query"], "spicy grilled chicken meal");
    assert_eq!(q["per_page"], "15");
    assert_eq!(q["orientation"], "landscape");
    assert_eq!(q["content_filter"], "high");
    assert!(seen.iter().all(|(p, _)| p == "search"));
}

#[tokio::test]
async fn title_words_are_used_without_tags() {
    let (base, seen) = fake_unsplash(Search::Hits(1), Random::Ok).await;
    let resolver = ImageResolver::new(base, "key".into());

    let url = resolver
        .resolve(&reqwest::Client::new(), "Lemon Garlic Pasta", &[])
        .await;
    assert_eq!(url, "https://img.test/0.jpg");
    assert_eq!(seen.lock().await[0].1["query"], "lemon garlic pasta meal");
}

#[tokio::test]
async fn empty_search_falls_back_to_random_photo() {
    let (base, seen) = fake_unsplash(Search::Hits(0), Random::Ok).await;
    let resolver = ImageResolver::new(base, "key".into());

    let url = resolver
        .resolve(&reqwest::Client::new(), "Soup", &tags(&["soup"]))
        .await;
    assert_eq!(url, "https://img.test/random.jpg");

    let seen = seen.lock().await;
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[1].0, "random");
    assert_eq!(seen[1].1["query"], "delicious food meal");
}

#[tokio::test]
async fn unauthorized_search_falls_back_to_random_photo() {
    let (base, _) = fake_unsplash(Search::Unauthorized, Random::Ok).await;
    let resolver = ImageResolver::new(base, "bad".into());

    let url = resolver
        .resolve(&reqwest::Client::new(), "Soup", &tags(&["soup"]))
        .await;
    assert_eq!(url, "https://img.test/random.jpg");
}

#[tokio::test]
async fn both_tiers_failing_yields_fixed_url() {
    let (base, _) = fake_unsplash(Search::Unauthorized, Random::Broken).await;
    let resolver = ImageResolver::new(base, "bad".into());

    let url = resolver
        .resolve(&reqwest::Client::new(), "Soup", &tags(&["soup"]))
        .await;
    assert_eq!(url, FALLBACK_IMAGE_URL);
    assert!(!url.is_empty());
}
