//! Route id discovery through the public search endpoint
//!
//! The endpoint answers with JSON whose `results.Routes` array holds one HTML
//! fragment per hit. The route id is the second path segment of the first
//! link inside a `strong` element of each fragment (`/route/<id>/<slug>`).

use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use scraper::{Html, Selector};
use serde_json::Value;
use std::collections::VecDeque;
use tracing::{debug, info};
use url::Url;

use crate::domain::RouteId;
use crate::domain::constants::api::{ROUTE_SEARCH_CATEGORY, SEARCH_PAGE_SIZE};
use crate::infrastructure::errors::ApiError;
use crate::infrastructure::http_client::HttpClient;
use crate::infrastructure::parsing::{ParsingError, ParsingResult};

const RESULT_LINK_SELECTOR: &str = "td strong a, strong a";

#[derive(Clone)]
pub struct SearchClient {
    client: HttpClient,
    search_url: String,
    root_url: Url,
    page_size: usize,
    link_selector: Selector,
}

impl SearchClient {
    pub fn new(client: HttpClient, search_url: impl Into<String>, root_url: &str) -> ParsingResult<Self> {
        let root_url = Url::parse(root_url).map_err(|e| ParsingError::UrlResolutionFailed {
            url: root_url.to_string(),
            reason: e.to_string(),
        })?;
        let link_selector = Selector::parse(RESULT_LINK_SELECTOR)
            .map_err(|e| ParsingError::invalid_selector(RESULT_LINK_SELECTOR, &e.to_string()))?;

        Ok(Self {
            client,
            search_url: search_url.into(),
            root_url,
            page_size: SEARCH_PAGE_SIZE,
            link_selector,
        })
    }

    #[must_use]
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Raw search call; every failure is returned to the caller
    pub async fn search(
        &self,
        query: &str,
        category: &str,
        offset: usize,
        size: usize,
    ) -> Result<Value, ApiError> {
        let params = [
            ("q", query.to_string()),
            ("c", category.to_string()),
            ("o", offset.to_string()),
            ("s", size.to_string()),
        ];

        self.client
            .get_json(&self.search_url, &params, "search")
            .await
            .map_err(|source| ApiError::Search {
                query: query.to_string(),
                offset,
                source: Box::new(source),
            })
    }

    pub async fn search_routes(&self, query: &str, offset: usize, size: usize) -> Result<Value, ApiError> {
        self.search(query, ROUTE_SEARCH_CATEGORY, offset, size).await
    }

    /// Route ids on one page of search results
    pub async fn search_routes_for_ids(
        &self,
        query: &str,
        offset: usize,
        size: usize,
    ) -> Result<Vec<RouteId>, ApiError> {
        let results = self.search_routes(query, offset, size).await?;
        let ids = self.route_ids_from_results(&results)?;
        debug!("Search '{}' at offset {}: {} ids", query, offset, ids.len());
        Ok(ids)
    }

    fn route_ids_from_results(&self, results: &Value) -> Result<Vec<RouteId>, ApiError> {
        let Some(fragments) = results
            .get("results")
            .and_then(|results| results.get(ROUTE_SEARCH_CATEGORY))
            .and_then(Value::as_array)
        else {
            return Ok(Vec::new());
        };

        fragments
            .iter()
            .map(|fragment| {
                let html = fragment.as_str().ok_or_else(|| {
                    ApiError::MalformedSearchResult(format!("expected an HTML string, got {fragment}"))
                })?;
                self.route_id_from_fragment(html)
            })
            .collect()
    }

    fn route_id_from_fragment(&self, fragment: &str) -> Result<RouteId, ApiError> {
        let html = Html::parse_fragment(fragment);
        let href = html
            .select(&self.link_selector)
            .find_map(|link| link.value().attr("href"))
            .ok_or_else(|| ApiError::MalformedSearchResult(format!("no route link in {fragment:?}")))?;

        let url = self
            .root_url
            .join(href)
            .map_err(|e| ApiError::MalformedSearchResult(format!("bad route link {href:?}: {e}")))?;

        url.path_segments()
            .and_then(|mut segments| segments.nth(1))
            .filter(|id| !id.is_empty())
            .map(RouteId::from)
            .ok_or_else(|| ApiError::MalformedSearchResult(format!("no route id in {href:?}")))
    }

    /// Lazy sequence of every route id matching `query`, starting at
    /// `start_offset`.
    ///
    /// Pages are requested on demand; the offset advances by the number of
    /// ids each page returned and the sequence ends at the first empty page.
    /// A failing page yields its error once and ends the sequence.
    pub fn route_ids(
        &self,
        query: impl Into<String>,
        start_offset: usize,
    ) -> BoxStream<'static, Result<RouteId, ApiError>> {
        struct Cursor {
            client: SearchClient,
            query: String,
            offset: usize,
            pending: VecDeque<RouteId>,
            finished: bool,
        }

        let cursor = Cursor {
            client: self.clone(),
            query: query.into(),
            offset: start_offset,
            pending: VecDeque::new(),
            finished: false,
        };

        stream::unfold(cursor, |mut cursor| async move {
            loop {
                if let Some(id) = cursor.pending.pop_front() {
                    return Some((Ok(id), cursor));
                }
                if cursor.finished {
                    return None;
                }

                let page_size = cursor.client.page_size;
                match cursor
                    .client
                    .search_routes_for_ids(&cursor.query, cursor.offset, page_size)
                    .await
                {
                    Ok(ids) if ids.is_empty() => return None,
                    Ok(ids) => {
                        cursor.offset += ids.len();
                        cursor.pending.extend(ids);
                    }
                    Err(error) => {
                        cursor.finished = true;
                        return Some((Err(error), cursor));
                    }
                }
            }
        })
        .boxed()
    }

    /// Every route id matching `query`
    pub async fn search_all_route_ids(&self, query: &str) -> Result<Vec<RouteId>, ApiError> {
        let ids: Vec<RouteId> = self.route_ids(query, 0).try_collect().await?;
        info!("🔍 Search '{}' found {} routes", query, ids.len());
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::http_client::HttpClientConfig;
    use serde_json::json;

    fn client() -> SearchClient {
        let http = HttpClient::new(HttpClientConfig::default()).unwrap();
        SearchClient::new(http, "http://127.0.0.1:9/search", "https://www.mountainproject.com").unwrap()
    }

    fn hit(href: &str) -> String {
        format!(
            r#"<table><tr><td><strong><a href="{href}">The Yellow Wall</a></strong></td><td>5.11-</td></tr></table>"#
        )
    }

    #[test]
    fn ids_are_taken_from_route_links() {
        let results = json!({
            "results": {
                "Routes": [
                    hit("/route/105748391/the-yellow-wall?search=1"),
                    hit("https://www.mountainproject.com/route/105748392/other"),
                ]
            }
        });

        let ids = client().route_ids_from_results(&results).unwrap();
        assert_eq!(ids, vec![RouteId::from("105748391"), RouteId::from("105748392")]);
    }

    #[test]
    fn bare_row_fragment_is_understood() {
        let fragment = r#"<tr><td><strong><a href="/route/42/slug">x</a></strong></td></tr>"#;
        assert_eq!(client().route_id_from_fragment(fragment).unwrap(), RouteId::from("42"));
    }

    #[test]
    fn empty_or_missing_results_yield_no_ids() {
        let client = client();
        for results in [json!({}), json!({"results": []}), json!({"results": {}}), json!({"results": null})] {
            assert!(client.route_ids_from_results(&results).unwrap().is_empty());
        }
    }

    #[test]
    fn fragment_without_link_is_malformed() {
        let results = json!({"results": {"Routes": ["<p>nothing here</p>"]}});
        assert!(matches!(
            client().route_ids_from_results(&results),
            Err(ApiError::MalformedSearchResult(_))
        ));
    }

    #[test]
    fn page_size_is_at_least_one() {
        assert_eq!(client().with_page_size(0).page_size, 1);
    }
}
