//! Resource commands for CRUD operations
//!
//! Typed wrappers over the marketplace collections (jobs, gigs, orders,
//! disputes, notifications). All calls go through the authenticated client.

use std::sync::Arc;

use marketlink_core::http::HttpMethod;
use marketlink_domain::{ListResponse, Resource};
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::Serialize;
use tracing::{debug, instrument};
use urlencoding::encode;

use super::client::{ApiClient, RequestOptions};
use super::errors::ApiError;

/// Resource operations
pub struct ResourceApi {
    client: Arc<ApiClient>,
}

impl ResourceApi {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    /// List one page of a collection
    ///
    /// # Arguments
    ///
    /// * `resource` - Collection to list
    /// * `page` - 1-based page number
    /// * `limit` - Max number of items per page
    ///
    /// # Errors
    ///
    /// Returns error if API request fails
    #[instrument(skip(self))]
    pub async fn list<T: DeserializeOwned>(
        &self,
        resource: Resource,
        page: u32,
        limit: u32,
    ) -> Result<ListResponse<T>, ApiError> {
        let options = RequestOptions::default().query("page", page).query("limit", limit);
        let response: ListResponse<T> = self
            .client
            .request::<(), _>(HttpMethod::Get, &resource.collection_path(), None, options)
            .await?;

        debug!(count = response.items.len(), total = response.total, "Resources listed");
        Ok(response)
    }

    /// Get one item by ID
    ///
    /// # Errors
    ///
    /// Returns error if the item is not found or API request fails
    #[instrument(skip(self))]
    pub async fn get<T: DeserializeOwned>(&self, resource: Resource, id: &str) -> Result<T, ApiError> {
        self.client.get(&item_path(resource, id)).await
    }

    /// Create an item
    ///
    /// # Errors
    ///
    /// Returns error if API request fails
    #[instrument(skip(self, body))]
    pub async fn create<B, T>(&self, resource: Resource, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        self.client.post(&resource.collection_path(), body).await
    }

    /// Partially update an item
    ///
    /// # Errors
    ///
    /// Returns error if API request fails
    #[instrument(skip(self, changes))]
    pub async fn update<B, T>(&self, resource: Resource, id: &str, changes: &B) -> Result<T, ApiError>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        self.client.patch(&item_path(resource, id), changes).await
    }

    /// Delete an item
    ///
    /// # Errors
    ///
    /// Returns error if API request fails
    #[instrument(skip(self))]
    pub async fn delete(&self, resource: Resource, id: &str) -> Result<(), ApiError> {
        let _: IgnoredAny = self.client.delete(&item_path(resource, id)).await?;
        debug!("Resource deleted");
        Ok(())
    }

    /// Mark a notification as read
    ///
    /// # Errors
    ///
    /// Returns error if API request fails
    #[instrument(skip(self))]
    pub async fn mark_notification_read(&self, id: &str) -> Result<(), ApiError> {
        let path = format!("{}/read", item_path(Resource::Notifications, id));
        let _: IgnoredAny = self.client.patch(&path, &serde_json::json!({})).await?;
        Ok(())
    }
}

fn item_path(resource: Resource, id: &str) -> String {
    format!("{}/{}", resource.collection_path(), encode(id))
}
