use std::sync::Arc;

use async_trait::async_trait;
use authbook_shared::{
    asset::BasicAsset,
    asset_user::{AssetUserAuthInfo, Connectivity},
};
use mongodb::bson::{DateTime, oid::ObjectId};
use tracing::{error, info, warn};

use crate::{
    models::{
        asset::AssetDoc,
        asset_user::asset_does_not_exist,
        auth_book::{AuthBookDoc, AuthBookFilter, DB_BACKEND},
    },
    response::{ServerError, ServerResult},
    util::{pagination::RequestPagination, ssh_key::public_key_from_private},
};

#[cfg(test)]
pub mod memory;
pub mod mongo;

#[async_trait]
pub trait AssetStore: Send + Sync {
    async fn find_asset(&self, org_id: &str, id: &ObjectId) -> ServerResult<Option<AssetDoc>>;
}

#[async_trait]
pub trait AuthBookStore: Send + Sync {
    async fn find_by_id(&self, org_id: &str, id: &ObjectId) -> ServerResult<Option<AuthBookDoc>>;

    async fn find_latest(
        &self,
        org_id: &str,
        asset: &ObjectId,
        username: &str,
    ) -> ServerResult<Option<AuthBookDoc>>;

    /// Stores a new row and returns it with its id set.
    async fn insert(&self, book: AuthBookDoc) -> ServerResult<AuthBookDoc>;

    async fn set_latest(&self, id: &ObjectId, is_latest: bool) -> ServerResult<()>;

    /// Removes a single row.
    async fn delete_by_id(&self, id: &ObjectId) -> ServerResult<()>;

    async fn list(
        &self,
        org_id: &str,
        filter: &AuthBookFilter,
        pagination: &RequestPagination,
    ) -> ServerResult<Vec<AuthBookDoc>>;

    async fn count(&self, org_id: &str, filter: &AuthBookFilter) -> ServerResult<u64>;

    /// All versions for the pair, newest first.
    async fn history(
        &self,
        org_id: &str,
        asset: &ObjectId,
        username: &str,
    ) -> ServerResult<Vec<AuthBookDoc>>;

    async fn delete_versions(
        &self,
        org_id: &str,
        asset: &ObjectId,
        username: &str,
    ) -> ServerResult<u64>;

    async fn set_connectivity(
        &self,
        id: &ObjectId,
        connectivity: Connectivity,
        updated: DateTime,
    ) -> ServerResult<()>;
}

/// Arguments for writing a new credential version.
#[derive(Debug, Clone)]
pub struct CreateAssetUser {
    pub name: String,
    pub username: String,
    pub asset: ObjectId,
    pub comment: String,
    pub org_id: String,
    pub password: Option<String>,
    pub public_key: Option<String>,
    pub private_key: Option<String>,
}

#[derive(Clone)]
pub struct AssetUserManager {
    assets: Arc<dyn AssetStore>,
    books: Arc<dyn AuthBookStore>,
}

impl AssetUserManager {
    pub fn new(assets: Arc<dyn AssetStore>, books: Arc<dyn AuthBookStore>) -> Self {
        Self { assets, books }
    }

    pub async fn find_asset(&self, org_id: &str, asset: &ObjectId) -> ServerResult<Option<AssetDoc>> {
        self.assets.find_asset(org_id, asset).await
    }

    /// Looks the asset up in the organization, reporting a missing one as a
    /// field error on `asset`.
    pub async fn require_asset(&self, org_id: &str, asset: &ObjectId) -> ServerResult<AssetDoc> {
        self.find_asset(org_id, asset)
            .await?
            .ok_or_else(|| ServerError::field("asset", &asset_does_not_exist(asset)))
    }

    /// Writes a new latest version of the credential for (org, asset,
    /// username) and retires the previous one.
    pub async fn create(&self, args: CreateAssetUser) -> ServerResult<AuthBookDoc> {
        let asset = self.require_asset(&args.org_id, &args.asset).await?;
        let previous = self
            .books
            .find_latest(&args.org_id, &args.asset, &args.username)
            .await?;
        let version = previous.as_ref().map(|p| p.version + 1).unwrap_or(1);

        let public_key = match (&args.public_key, &args.private_key) {
            (Some(public_key), _) => Some(public_key.clone()),
            (None, Some(private_key)) => {
                public_key_from_private(private_key, args.password.as_deref())
            }
            (None, None) => None,
        };

        let BasicAsset { hostname, ip } = BasicAsset::from(&asset);
        let now = DateTime::now();
        let book = AuthBookDoc {
            id: None,
            name: args.name,
            username: args.username,
            asset: args.asset,
            hostname,
            ip,
            org_id: args.org_id,
            comment: args.comment,
            password: args.password,
            public_key,
            private_key: args.private_key,
            version,
            is_latest: true,
            connectivity: Connectivity::Unknown,
            backend: DB_BACKEND.to_string(),
            date_created: now,
            date_updated: now,
        };
        let book = self.books.insert(book).await?;

        if let Some(previous_id) = previous.and_then(|p| p.id) {
            if let Err(err) = self.books.set_latest(&previous_id, false).await {
                warn!("Failed to retire credential version {}: {}", previous_id, err);
                // Only one row of the pair may stay latest.
                if let Some(id) = book.id {
                    if let Err(rollback) = self.books.delete_by_id(&id).await {
                        error!("Failed to roll back credential version {}: {}", id, rollback);
                    }
                }
                return Err(err);
            }
        }

        info!(
            "Stored credential {}@{} version {}",
            book.username, book.hostname, book.version
        );
        Ok(book)
    }

    pub async fn list(
        &self,
        org_id: &str,
        filter: &AuthBookFilter,
        pagination: &RequestPagination,
    ) -> ServerResult<(Vec<AuthBookDoc>, u64)> {
        let (books, count) = tokio::join!(
            self.books.list(org_id, filter, pagination),
            self.books.count(org_id, filter)
        );
        Ok((books?, count?))
    }

    pub async fn get(&self, org_id: &str, id: &ObjectId) -> ServerResult<AuthBookDoc> {
        self.books
            .find_by_id(org_id, id)
            .await?
            .ok_or_else(|| ServerError::not_found("Asset user not found"))
    }

    pub async fn auth_info(&self, org_id: &str, id: &ObjectId) -> ServerResult<AssetUserAuthInfo> {
        Ok(self.get(org_id, id).await?.to_auth_info())
    }

    /// Every stored version of the credential that `id` belongs to.
    pub async fn history(&self, org_id: &str, id: &ObjectId) -> ServerResult<Vec<AuthBookDoc>> {
        let book = self.get(org_id, id).await?;
        self.books
            .history(org_id, &book.asset, &book.username)
            .await
    }

    /// Removes the credential and all its versions.
    pub async fn delete(&self, org_id: &str, id: &ObjectId) -> ServerResult<u64> {
        let book = self.get(org_id, id).await?;
        let removed = self
            .books
            .delete_versions(org_id, &book.asset, &book.username)
            .await?;
        info!(
            "Removed {} versions of credential {}@{}",
            removed, book.username, book.hostname
        );
        Ok(removed)
    }

    pub async fn set_connectivity(
        &self,
        org_id: &str,
        id: &ObjectId,
        connectivity: Connectivity,
    ) -> ServerResult<AuthBookDoc> {
        let mut book = self.get(org_id, id).await?;
        let now = DateTime::now();
        self.books.set_connectivity(id, connectivity, now).await?;
        book.connectivity = connectivity;
        book.date_updated = now;
        Ok(book)
    }
}
