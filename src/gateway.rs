use std::sync::Arc;
use async_trait::async_trait;

use crate::error::GatewayResult;


/// A bucket as returned by the listing. Only the name is used for purging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Container {
    pub name: String,
    /// creation time in seconds since the epoch, when the backend reports it
    pub created: Option<i64>,
}

impl Container {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), created: None }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub key: String,
}

/// One page of a bucket listing. `next_cursor == None` marks the last page.
#[derive(Debug, Default)]
pub struct ItemPage {
    pub items: Vec<Item>,
    pub next_cursor: Option<String>,
}

/// The remote operations needed to empty and remove buckets.
#[async_trait]
pub trait StorageGateway: Send + Sync {
    async fn list_containers(&self) -> GatewayResult<Vec<Container>>;

    async fn list_items(&self, container: &str, cursor: Option<String>) -> GatewayResult<ItemPage>;

    async fn delete_item(&self, container: &str, key: &str) -> GatewayResult<()>;

    /// fails when the bucket still holds objects
    async fn delete_container(&self, container: &str) -> GatewayResult<()>;
}

pub type SharedGateway = Arc<dyn StorageGateway>;
