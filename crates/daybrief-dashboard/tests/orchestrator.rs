//! End-to-end tests for the refresh orchestrator against wiremock providers.

use std::time::Duration;

use daybrief_dashboard::{
    Dashboard, DashboardCommand, ErrorMessages, SettingsStore, Theme, UserSettings,
    NO_LOCATION_WEATHER_ERROR,
};
use daybrief_providers::news::{DEFAULT_TECH_QUERY, EDUCATION_QUERY, GENERAL_QUERY};
use daybrief_providers::{LocationProvider, NewsProvider, Providers, WeatherProvider};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct Upstream {
    ipapi: MockServer,
    ipwhois: MockServer,
    weather: MockServer,
    news: MockServer,
}

impl Upstream {
    async fn start() -> Self {
        let upstream = Self {
            ipapi: MockServer::start().await,
            ipwhois: MockServer::start().await,
            weather: MockServer::start().await,
            news: MockServer::start().await,
        };

        // Anything not explicitly mocked returns no stories
        Mock::given(method("GET"))
            .and(path("/api/v1/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "hits": [] })))
            .with_priority(10)
            .mount(&upstream.news)
            .await;

        upstream
    }

    fn providers(&self) -> Providers {
        let client = reqwest::Client::new();
        Providers {
            location: LocationProvider::new(client.clone(), &self.ipapi.uri(), &self.ipwhois.uri()),
            weather: WeatherProvider::new(client.clone(), &self.weather.uri()),
            news: NewsProvider::new(client, &self.news.uri()),
        }
    }

    fn dashboard(&self, store: SettingsStore) -> Dashboard {
        Dashboard::new(self.providers(), store)
    }

    async fn locate_paris(&self) {
        Mock::given(method("GET"))
            .and(path("/json/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "city": "Paris",
                "country_name": "France",
                "latitude": 48.8,
                "longitude": 2.3
            })))
            .expect(1)
            .mount(&self.ipapi)
            .await;
    }

    async fn fail_location(&self) {
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&self.ipapi)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&self.ipwhois)
            .await;
    }

    async fn weather_clear(&self, delay: Duration) {
        Mock::given(method("GET"))
            .and(path("/v1/forecast"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({
                        "current_weather": {
                            "temperature": 21.4,
                            "windspeed": 8.0,
                            "winddirection": 200.0,
                            "weathercode": 0,
                            "time": "2026-10-19T15:00"
                        }
                    }))
                    .set_delay(delay),
            )
            .expect(1)
            .mount(&self.weather)
            .await;
    }

    async fn stories(&self, query: &str, titles: &[&str]) {
        self.stories_delayed(query, titles, Duration::ZERO).await;
    }

    async fn stories_delayed(&self, query: &str, titles: &[&str], delay: Duration) {
        let hits: Vec<_> = titles
            .iter()
            .map(|t| {
                serde_json::json!({
                    "title": t,
                    "url": format!("https://news.example.com/{}", t.replace(' ', "-"))
                })
            })
            .collect();

        Mock::given(method("GET"))
            .and(path("/api/v1/search"))
            .and(query_param("query", query))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "hits": hits }))
                    .set_delay(delay),
            )
            .mount(&self.news)
            .await;
    }

    /// Every `query` parameter sent to the news provider, in arrival order.
    async fn news_queries(&self) -> Vec<String> {
        self.news
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter_map(|req| {
                req.url
                    .query_pairs()
                    .find(|(k, _)| k == "query")
                    .map(|(_, v)| v.into_owned())
            })
            .collect()
    }
}

fn store_with_interests(interests: &[&str]) -> SettingsStore {
    let store = SettingsStore::in_memory();
    store.save(&UserSettings {
        interests: interests.iter().map(|s| s.to_string()).collect(),
        ..Default::default()
    });
    store
}

fn titles(items: &[daybrief_providers::NewsItem]) -> Vec<&str> {
    items.iter().map(|i| i.title.as_str()).collect()
}

#[tokio::test]
async fn test_paris_end_to_end() {
    let upstream = Upstream::start().await;
    upstream.locate_paris().await;
    upstream.weather_clear(Duration::ZERO).await;
    upstream.stories(GENERAL_QUERY, &["Summit opens"]).await;
    upstream.stories(EDUCATION_QUERY, &["New curriculum"]).await;
    upstream.stories("Paris France", &["Seine cleanup finished"]).await;
    upstream.stories("Rust", &["Rust 1.90 released"]).await;

    let dashboard = upstream.dashboard(store_with_interests(&["Rust"]));
    dashboard.refresh().await;
    let snapshot = dashboard.snapshot();

    let location = snapshot.location.as_ref().unwrap();
    assert_eq!(location.city, "Paris");
    assert_eq!(location.country, "France");

    let weather = snapshot.weather.as_ref().unwrap();
    assert_eq!(weather.condition, "Clear sky");
    assert_eq!(weather.temperature, 21);

    assert_eq!(titles(&snapshot.news.local), vec!["Seine cleanup finished"]);
    assert_eq!(titles(&snapshot.news.general), vec!["Summit opens"]);
    assert_eq!(titles(&snapshot.news.education), vec!["New curriculum"]);
    assert_eq!(titles(&snapshot.news.technology), vec!["Rust 1.90 released"]);

    assert!(!snapshot.is_any_loading());
    assert_eq!(snapshot.errors, ErrorMessages::default());
    assert!(upstream.news_queries().await.contains(&"Paris France".to_string()));
}

#[tokio::test]
async fn test_location_failure_degrades_gracefully() {
    let upstream = Upstream::start().await;
    upstream.fail_location().await;
    upstream.stories(GENERAL_QUERY, &["Summit opens"]).await;
    upstream.stories(EDUCATION_QUERY, &["New curriculum"]).await;
    upstream.stories("React", &["React 20"]).await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&upstream.weather)
        .await;

    let dashboard = upstream.dashboard(store_with_interests(&["React"]));
    dashboard.refresh().await;
    let snapshot = dashboard.snapshot();

    assert!(snapshot.location.is_none());
    assert!(snapshot.weather.is_none());
    assert!(snapshot.news.local.is_empty());
    assert_eq!(titles(&snapshot.news.general), vec!["Summit opens"]);
    assert_eq!(titles(&snapshot.news.education), vec!["New curriculum"]);
    assert_eq!(titles(&snapshot.news.technology), vec!["React 20"]);

    assert_eq!(
        snapshot.errors.location.as_deref(),
        Some("Failed to detect location")
    );
    assert_eq!(
        snapshot.errors.weather.as_deref(),
        Some(NO_LOCATION_WEATHER_ERROR)
    );
    assert!(snapshot.errors.news.is_none());
    assert!(!snapshot.is_any_loading());
    assert!(snapshot.is_consistent());
}

#[tokio::test]
async fn test_weather_failure_does_not_block_news() {
    let upstream = Upstream::start().await;
    upstream.locate_paris().await;
    upstream.stories("Paris France", &["Metro strike"]).await;

    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&upstream.weather)
        .await;

    let dashboard = upstream.dashboard(SettingsStore::in_memory());
    dashboard.refresh().await;
    let snapshot = dashboard.snapshot();

    assert!(snapshot.location.is_some());
    assert!(snapshot.weather.is_none());
    assert_eq!(snapshot.errors.weather.as_deref(), Some("Failed to fetch weather"));
    assert!(snapshot.errors.location.is_none());
    assert_eq!(titles(&snapshot.news.local), vec!["Metro strike"]);
}

#[tokio::test]
async fn test_groups_settle_independently() {
    let upstream = Upstream::start().await;
    upstream.locate_paris().await;
    upstream.weather_clear(Duration::from_millis(800)).await;
    upstream.stories(GENERAL_QUERY, &["Summit opens"]).await;

    let dashboard = upstream.dashboard(SettingsStore::in_memory());
    let mut rx = dashboard.subscribe();
    let handle = dashboard.spawn_refresh();

    let partial = rx
        .wait_for(|s| s.loading.weather && !s.loading.location && !s.loading.news)
        .await
        .unwrap()
        .clone();
    assert!(partial.location.is_some());
    assert_eq!(titles(&partial.news.general), vec!["Summit opens"]);
    assert!(partial.weather.is_none());
    assert!(partial.errors.weather.is_none());
    assert!(partial.is_consistent());

    let settled = dashboard.wait_until_settled().await;
    assert_eq!(settled.weather.as_ref().map(|w| w.temperature), Some(21));
    assert!(!settled.loading.weather);
    handle.await.unwrap();
}

#[tokio::test]
async fn test_update_settings_refetches_only_news() {
    let upstream = Upstream::start().await;
    upstream.locate_paris().await;
    upstream.weather_clear(Duration::ZERO).await;
    upstream.stories("React", &["React 20"]).await;
    upstream.stories("Go", &["Go generics", "Shared story"]).await;
    upstream.stories("Rust", &["Shared story", "Rust editions"]).await;

    let store = store_with_interests(&["React"]);
    let dashboard = upstream.dashboard(store.clone());
    dashboard.refresh().await;
    let before = dashboard.snapshot();
    assert_eq!(titles(&before.news.technology), vec!["React 20"]);

    let new_settings = UserSettings {
        interests: vec!["Go".to_string(), "Rust".to_string()],
        ..before.settings.clone()
    };
    dashboard.update_settings(new_settings.clone()).await;
    let after = dashboard.snapshot();

    assert_eq!(after.location, before.location);
    assert_eq!(after.weather, before.weather);
    assert_eq!(after.settings, new_settings);
    assert_eq!(
        titles(&after.news.technology),
        vec!["Go generics", "Shared story", "Rust editions"]
    );
    assert!(!after.is_any_loading());
    assert_eq!(store.load(), new_settings);

    let topic_queries: Vec<String> = upstream
        .news_queries()
        .await
        .into_iter()
        .filter(|q| ["React", "Go", "Rust"].contains(&q.as_str()))
        .collect();
    assert_eq!(topic_queries.iter().filter(|q| *q == "React").count(), 1);
    assert_eq!(topic_queries.iter().filter(|q| *q == "Go").count(), 1);
    assert_eq!(topic_queries.iter().filter(|q| *q == "Rust").count(), 1);
}

#[tokio::test]
async fn test_update_settings_cleans_interests() {
    let upstream = Upstream::start().await;
    upstream.stories("Go", &["Go generics"]).await;
    upstream.stories("Rust", &["Rust editions"]).await;

    let store = SettingsStore::in_memory();
    let dashboard = upstream.dashboard(store.clone());

    let messy = UserSettings {
        interests: vec![
            "Go".to_string(),
            "Go".to_string(),
            " ".to_string(),
            "Rust".to_string(),
        ],
        ..Default::default()
    };
    dashboard.update_settings(messy).await;

    let expected = vec!["Go".to_string(), "Rust".to_string()];
    let snapshot = dashboard.snapshot();
    assert_eq!(snapshot.settings.interests, expected);
    assert_eq!(store.load().interests, expected);
    assert_eq!(
        titles(&snapshot.news.technology),
        vec!["Go generics", "Rust editions"]
    );

    let mut topic_queries: Vec<String> = upstream
        .news_queries()
        .await
        .into_iter()
        .filter(|q| q != GENERAL_QUERY && q != EDUCATION_QUERY)
        .collect();
    topic_queries.sort();
    assert_eq!(topic_queries, expected);
}

#[tokio::test]
async fn test_update_settings_publishes_before_news_returns() {
    let upstream = Upstream::start().await;
    upstream
        .stories_delayed(DEFAULT_TECH_QUERY, &["Compilers"], Duration::from_millis(500))
        .await;

    let dashboard = upstream.dashboard(SettingsStore::in_memory());
    let mut rx = dashboard.subscribe();

    let cleared = UserSettings {
        interests: Vec::new(),
        display_name: "Ada".to_string(),
        theme: Theme::Dark,
    };
    let handle = dashboard.spawn_dispatch(DashboardCommand::UpdateSettings(cleared.clone()));

    let published = rx
        .wait_for(|s| s.settings == cleared)
        .await
        .unwrap()
        .clone();
    assert!(published.loading.news);
    assert!(!published.loading.location);
    assert!(!published.loading.weather);

    handle.await.unwrap();
    let settled = dashboard.snapshot();
    assert!(!settled.loading.news);
    assert_eq!(titles(&settled.news.technology), vec!["Compilers"]);
    // No location known, so no local search was issued
    assert!(settled.news.local.is_empty());
    assert!(!upstream
        .news_queries()
        .await
        .iter()
        .any(|q| q.contains("France")));
}

#[tokio::test]
async fn test_empty_interests_use_default_query_on_refresh() {
    let upstream = Upstream::start().await;
    upstream.fail_location().await;
    upstream.stories(DEFAULT_TECH_QUERY, &["Compilers"]).await;

    let dashboard = upstream.dashboard(store_with_interests(&[]));
    dashboard.refresh().await;

    assert_eq!(titles(&dashboard.snapshot().news.technology), vec!["Compilers"]);
}

#[tokio::test]
async fn test_commands_persist_through_file_store() {
    let dir = tempfile::tempdir().unwrap();
    let upstream = Upstream::start().await;

    let dashboard = upstream.dashboard(SettingsStore::on_disk(dir.path()));
    dashboard.dispatch(DashboardCommand::AddInterest(" Rust ".to_string())).await;
    dashboard.dispatch(DashboardCommand::AddInterest("Rust".to_string())).await;
    dashboard.dispatch(DashboardCommand::RemoveInterest("JavaScript".to_string())).await;
    dashboard.dispatch(DashboardCommand::SetDisplayName("Ada".to_string())).await;
    dashboard.dispatch(DashboardCommand::ToggleTheme).await;

    let expected = UserSettings {
        interests: vec!["React".to_string(), "Python".to_string(), "Rust".to_string()],
        display_name: "Ada".to_string(),
        theme: Theme::Dark,
    };
    assert_eq!(dashboard.settings(), expected);

    let reopened = upstream.dashboard(SettingsStore::on_disk(dir.path()));
    assert_eq!(reopened.settings(), expected);
    assert!(!reopened.snapshot().is_any_loading());
}
