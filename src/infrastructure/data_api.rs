//! Client for the catalog's structured data endpoint
//!
//! Every call is a GET against one URL with an `action` parameter and the
//! API key. Route lookups are split into chunks because the endpoint accepts
//! at most `ROUTE_BATCH_SIZE` ids per request.

use serde_json::Value;
use tracing::{debug, info};

use crate::domain::constants::api::ROUTE_BATCH_SIZE;
use crate::domain::{RouteId, RoutesResponse};
use crate::infrastructure::errors::ApiError;
use crate::infrastructure::http_client::HttpClient;

/// User lookups accept either the numeric id or the account email
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserRef {
    Id(String),
    Email(String),
}

impl UserRef {
    fn query_param(&self) -> (&'static str, String) {
        match self {
            Self::Id(id) => ("userId", id.clone()),
            Self::Email(email) => ("email", email.clone()),
        }
    }
}

#[derive(Clone)]
pub struct DataApiClient {
    client: HttpClient,
    key: String,
    data_url: String,
}

impl DataApiClient {
    pub fn new(client: HttpClient, key: impl Into<String>, data_url: impl Into<String>) -> Self {
        Self {
            client,
            key: key.into(),
            data_url: data_url.into(),
        }
    }

    async fn call<T: serde::de::DeserializeOwned>(
        &self,
        action: &'static str,
        params: Vec<(&str, String)>,
    ) -> Result<T, ApiError> {
        let mut query = vec![("action", action.to_string()), ("key", self.key.clone())];
        query.extend(params);
        self.client.get_json(&self.data_url, &query, action).await
    }

    /// Fetch route records for `ids`, 100 per request.
    ///
    /// Blank ids are skipped. The `routes` arrays of all chunks are
    /// concatenated into the first response; any failing chunk fails the
    /// whole lookup.
    pub async fn get_routes<I>(&self, ids: I) -> Result<RoutesResponse, ApiError>
    where
        I: IntoIterator,
        I::Item: Into<RouteId>,
    {
        let ids: Vec<RouteId> = ids
            .into_iter()
            .map(Into::into)
            .filter(|id: &RouteId| !id.as_str().trim().is_empty())
            .collect();

        let mut merged: Option<RoutesResponse> = None;
        for (index, chunk) in ids.chunks(ROUTE_BATCH_SIZE).enumerate() {
            let route_ids = chunk.iter().map(RouteId::as_str).collect::<Vec<_>>().join(",");
            debug!("getRoutes chunk {} ({} ids)", index + 1, chunk.len());

            let response: RoutesResponse = self.call("getRoutes", vec![("routeIds", route_ids)]).await?;
            match merged.as_mut() {
                Some(merged) => merged.routes.extend(response.routes),
                None => merged = Some(response),
            }
        }

        let merged = merged.unwrap_or_default();
        info!("📋 Fetched {} route records for {} ids", merged.routes.len(), ids.len());
        Ok(merged)
    }

    pub async fn get_user(&self, user: &UserRef) -> Result<Value, ApiError> {
        self.call("getUser", vec![user.query_param()]).await
    }

    /// One page of the user's to-do list starting at `start_pos`
    pub async fn get_to_dos(&self, start_pos: usize, user: &UserRef) -> Result<Value, ApiError> {
        self.call("getToDos", vec![("startPos", start_pos.to_string()), user.query_param()])
            .await
    }

    /// One page of the user's ticks starting at `start_pos`
    pub async fn get_ticks(&self, start_pos: usize, user: &UserRef) -> Result<Value, ApiError> {
        self.call("getTicks", vec![("startPos", start_pos.to_string()), user.query_param()])
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::http_client::HttpClientConfig;

    #[test]
    fn user_ref_selects_query_parameter() {
        assert_eq!(
            UserRef::Id("200131289".into()).query_param(),
            ("userId", "200131289".to_string())
        );
        assert_eq!(
            UserRef::Email("climber@example.com".into()).query_param(),
            ("email", "climber@example.com".to_string())
        );
    }

    #[tokio::test]
    async fn no_ids_means_no_requests() {
        let client = HttpClient::new(HttpClientConfig::default()).unwrap();
        // An unroutable URL would fail if a request were made
        let api = DataApiClient::new(client, "key", "http://127.0.0.1:9/data");

        let response = api.get_routes(["", "  "]).await.unwrap();
        assert!(response.routes.is_empty());
    }
}
