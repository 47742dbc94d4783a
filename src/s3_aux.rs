/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0.
 */

use async_trait::async_trait;
use aws_sdk_s3::{Client, Error};
use tracing::debug;

use crate::error::GatewayResult;
use crate::gateway::{Container, Item, ItemPage, StorageGateway};


pub async fn list_buckets(client: &Client) -> Result<Vec<Container>, Error> {
    let resp = client.list_buckets().send().await?;

    let buckets = resp.buckets().unwrap_or_default()
        .iter()
        .filter_map(|bucket| bucket.name().map(|name| Container {
            name: name.to_owned(),
            created: bucket.creation_date().map(|date| date.secs()),
        }))
        .collect();
    Ok(buckets)
}

/// fetch a single page of objects, continuing after `continuation_token` when given
pub async fn list_objects_page(
    client: &Client,
    bucket_name: &str,
    continuation_token: Option<String>,
) -> Result<ItemPage, Error> {
    let objects = client
        .list_objects_v2()
        .bucket(bucket_name)
        .set_continuation_token(continuation_token)
        .send()
        .await?;

    let items = objects.contents().unwrap_or_default()
        .iter()
        .filter_map(|obj| obj.key().map(|key| Item { key: key.to_owned() }))
        .collect::<Vec<_>>();
    let next_cursor = objects.next_continuation_token().map(str::to_owned);
    debug!(bucket = bucket_name, count = items.len(), more = next_cursor.is_some(), "listed objects");

    Ok(ItemPage { items, next_cursor })
}

pub async fn delete_object(client: &Client, bucket_name: &str, key: &str) -> Result<(), Error> {
    client
        .delete_object()
        .bucket(bucket_name)
        .key(key)
        .send()
        .await?;
    Ok(())
}

pub async fn delete_bucket(client: &Client, bucket_name: &str) -> Result<(), Error> {
    client.delete_bucket().bucket(bucket_name).send().await?;
    Ok(())
}


/// Gateway backed by the AWS S3 service.
#[derive(Clone)]
pub struct S3Gateway {
    client: Client,
}

impl S3Gateway {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl StorageGateway for S3Gateway {
    async fn list_containers(&self) -> GatewayResult<Vec<Container>> {
        Ok(list_buckets(&self.client).await?)
    }

    async fn list_items(&self, container: &str, cursor: Option<String>) -> GatewayResult<ItemPage> {
        Ok(list_objects_page(&self.client, container, cursor).await?)
    }

    async fn delete_item(&self, container: &str, key: &str) -> GatewayResult<()> {
        Ok(delete_object(&self.client, container, key).await?)
    }

    async fn delete_container(&self, container: &str) -> GatewayResult<()> {
        Ok(delete_bucket(&self.client, container).await?)
    }
}
