//! HTTP-level tests for the page fetcher, the data API client and the
//! search client against a local mock server.

use futures::StreamExt;
use serde_json::json;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path, query_param},
};

use route_enricher::domain::RouteId;
use route_enricher::infrastructure::{
    ApiError, DataApiClient, FetchError, FetchOutcome, HttpClient, HttpClientConfig, HttpPageFetcher,
    PageFetcher, SearchClient, UserRef,
};

fn http_client() -> HttpClient {
    HttpClient::new(HttpClientConfig {
        max_requests_per_second: 1000,
        timeout_seconds: 5,
        ..HttpClientConfig::default()
    })
    .unwrap()
}

fn search_hit(id: u32) -> String {
    format!(
        r#"<table><tr><td><strong><a href="/route/{id}/route-{id}?search=1">Route {id}</a></strong></td></tr></table>"#
    )
}

#[tokio::test]
async fn page_fetcher_returns_document_on_success() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/route/1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html><body>ok</body></html>"))
        .mount(&server)
        .await;

    let fetcher = HttpPageFetcher::new(http_client());
    let url = format!("{}/route/1", server.uri());

    match fetcher.fetch(&url).await {
        FetchOutcome::Ok(document) => {
            assert_eq!(document.url(), url);
            assert!(document.body().contains("ok"));
        }
        FetchOutcome::Failed(error) => panic!("unexpected failure: {error}"),
    }
}

#[tokio::test]
async fn page_fetcher_reports_error_statuses_as_failures() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let fetcher = HttpPageFetcher::new(http_client());

    for (page, status) in [("/missing", 404), ("/broken", 500)] {
        let outcome = fetcher.fetch(&format!("{}{page}", server.uri())).await;
        let error = outcome.into_result().unwrap_err();
        assert_eq!(error.status(), Some(status));
    }
}

#[tokio::test]
async fn page_fetcher_reports_connection_errors_as_failures() {
    let fetcher = HttpPageFetcher::new(http_client());
    let outcome = fetcher.fetch("http://127.0.0.1:9/route/1").await;
    assert!(matches!(
        outcome,
        FetchOutcome::Failed(FetchError::Request { .. })
    ));
}

#[tokio::test]
async fn get_routes_splits_ids_into_chunks_of_one_hundred() {
    let server = MockServer::start().await;
    let ids: Vec<String> = (1..=150).map(|n| n.to_string()).collect();

    for chunk in ids.chunks(100) {
        let routes: Vec<_> = chunk
            .iter()
            .map(|id| json!({"id": id.parse::<u64>().unwrap(), "url": format!("{}/route/{id}", server.uri())}))
            .collect();
        Mock::given(method("GET"))
            .and(path("/data"))
            .and(query_param("action", "getRoutes"))
            .and(query_param("key", "secret"))
            .and(query_param("routeIds", chunk.join(",")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"routes": routes, "success": 1})))
            .expect(1)
            .mount(&server)
            .await;
    }

    let api = DataApiClient::new(http_client(), "secret", format!("{}/data", server.uri()));
    let mut with_blanks = ids.clone();
    with_blanks.insert(10, String::new());

    let response = api.get_routes(with_blanks).await.unwrap();

    assert_eq!(response.routes.len(), 150);
    assert_eq!(response.routes[0].id, RouteId::from("1"));
    assert_eq!(response.routes[149].id, RouteId::from("150"));
    assert_eq!(response.extra["success"], 1);
}

#[tokio::test]
async fn get_routes_fails_when_any_chunk_fails() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/data"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let api = DataApiClient::new(http_client(), "secret", format!("{}/data", server.uri()));
    let result = api.get_routes(["1", "2"]).await;

    assert!(matches!(result, Err(ApiError::Transport(FetchError::Status { status: 503, .. }))));
}

#[tokio::test]
async fn user_lists_are_requested_by_id_or_email() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/data"))
        .and(query_param("action", "getTicks"))
        .and(query_param("startPos", "200"))
        .and(query_param("email", "climber@example.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ticks": [], "success": 1})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/data"))
        .and(query_param("action", "getUser"))
        .and(query_param("userId", "42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "Climber"})))
        .expect(1)
        .mount(&server)
        .await;

    let api = DataApiClient::new(http_client(), "secret", format!("{}/data", server.uri()));

    let ticks = api
        .get_ticks(200, &UserRef::Email("climber@example.com".into()))
        .await
        .unwrap();
    assert_eq!(ticks["success"], 1);

    let user = api.get_user(&UserRef::Id("42".into())).await.unwrap();
    assert_eq!(user["name"], "Climber");
}

#[tokio::test]
async fn malformed_json_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/data"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let api = DataApiClient::new(http_client(), "secret", format!("{}/data", server.uri()));
    let result = api.get_to_dos(0, &UserRef::Id("42".into())).await;

    assert!(matches!(result, Err(ApiError::Decode { what: "getToDos", .. })));
}

async fn mount_search_page(server: &MockServer, offset: usize, hits: Vec<String>, expected: u64) {
    let results = if hits.is_empty() { json!([]) } else { json!({"Routes": hits}) };
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "yellow wall"))
        .and(query_param("c", "Routes"))
        .and(query_param("o", offset.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": results})))
        .expect(expected)
        .mount(server)
        .await;
}

fn search_client(server: &MockServer) -> SearchClient {
    SearchClient::new(http_client(), format!("{}/search", server.uri()), &server.uri())
        .unwrap()
        .with_page_size(2)
}

#[tokio::test]
async fn route_ids_follow_pages_until_an_empty_one() {
    let server = MockServer::start().await;
    mount_search_page(&server, 0, vec![search_hit(11), search_hit(12)], 1).await;
    mount_search_page(&server, 2, vec![search_hit(13)], 1).await;
    mount_search_page(&server, 3, Vec::new(), 1).await;

    let ids = search_client(&server).search_all_route_ids("yellow wall").await.unwrap();

    assert_eq!(ids, vec![RouteId::from("11"), RouteId::from("12"), RouteId::from("13")]);
}

#[tokio::test]
async fn route_ids_are_lazy_and_restartable_from_an_offset() {
    let server = MockServer::start().await;
    mount_search_page(&server, 2, vec![search_hit(13)], 1).await;

    // Only the first page is requested when one id is taken
    let first: Vec<_> = search_client(&server).route_ids("yellow wall", 2).take(1).collect().await;

    assert_eq!(first.len(), 1);
    assert_eq!(first[0].as_ref().unwrap(), &RouteId::from("13"));
}

#[tokio::test]
async fn search_failure_ends_discovery_with_an_error() {
    let server = MockServer::start().await;
    mount_search_page(&server, 0, vec![search_hit(11), search_hit(12)], 2).await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("o", "2"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = search_client(&server);
    let items: Vec<_> = client.route_ids("yellow wall", 0).collect().await;

    assert_eq!(items.len(), 3);
    assert!(items[0].is_ok());
    assert!(items[1].is_ok());
    assert!(matches!(&items[2], Err(ApiError::Search { offset: 2, .. })));

    let all = client.search_all_route_ids("yellow wall").await;
    assert!(all.is_err());
}
