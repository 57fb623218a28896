use async_trait::async_trait;
use authbook_shared::asset_user::Connectivity;
use futures::TryStreamExt;
use mongodb::{
    bson::{DateTime, doc, oid::ObjectId},
    options::{FindOneOptions, FindOptions},
};

use crate::{
    backends::{AssetStore, AuthBookStore},
    db::Mongo,
    models::{
        asset::AssetDoc,
        auth_book::{AuthBookDoc, AuthBookFilter},
    },
    response::{ServerError, ServerResult},
    util::pagination::RequestPagination,
};

#[async_trait]
impl AssetStore for Mongo {
    async fn find_asset(&self, org_id: &str, id: &ObjectId) -> ServerResult<Option<AssetDoc>> {
        let asset = self
            .assets()
            .find_one(doc! { "_id": id, "org_id": org_id })
            .await?;
        Ok(asset)
    }
}

#[async_trait]
impl AuthBookStore for Mongo {
    async fn find_by_id(&self, org_id: &str, id: &ObjectId) -> ServerResult<Option<AuthBookDoc>> {
        let book = self
            .auth_books()
            .find_one(doc! { "_id": id, "org_id": org_id })
            .await?;
        Ok(book)
    }

    async fn find_latest(
        &self,
        org_id: &str,
        asset: &ObjectId,
        username: &str,
    ) -> ServerResult<Option<AuthBookDoc>> {
        let options = FindOneOptions::builder()
            .sort(Some(doc! { "version": -1 }))
            .build();
        let book = self
            .auth_books()
            .find_one(doc! {
                "org_id": org_id,
                "asset": asset,
                "username": username,
                "is_latest": true,
            })
            .with_options(options)
            .await?;
        Ok(book)
    }

    async fn insert(&self, mut book: AuthBookDoc) -> ServerResult<AuthBookDoc> {
        let result = self.auth_books().insert_one(&book).await.map_err(|err| {
            tracing::error!("Failed to insert credential: {}", err);
            ServerError::internal_error("Failed to store credential")
        })?;
        book.id = result.inserted_id.as_object_id();
        Ok(book)
    }

    async fn set_latest(&self, id: &ObjectId, is_latest: bool) -> ServerResult<()> {
        self.auth_books()
            .update_one(
                doc! { "_id": id },
                doc! { "$set": { "is_latest": is_latest, "date_updated": DateTime::now() } },
            )
            .await?;
        Ok(())
    }

    async fn delete_by_id(&self, id: &ObjectId) -> ServerResult<()> {
        self.auth_books()
            .delete_one(doc! { "_id": id })
            .await
            .map_err(|_| ServerError::internal_error("Failed to delete credential"))?;
        Ok(())
    }

    async fn list(
        &self,
        org_id: &str,
        filter: &AuthBookFilter,
        pagination: &RequestPagination,
    ) -> ServerResult<Vec<AuthBookDoc>> {
        let options = FindOptions::builder()
            .skip(Some(pagination.offset))
            .limit(Some(pagination.limit as i64))
            .sort(Some(doc! { "hostname": 1, "username": 1, "version": -1 }))
            .build();
        let cursor = self
            .auth_books()
            .find(filter.to_document(org_id)?)
            .with_options(options)
            .await?;
        let results: Vec<AuthBookDoc> = cursor
            .try_collect()
            .await
            .map_err(|_| ServerError::internal_error("Cursor decode failed"))?;
        Ok(results)
    }

    async fn count(&self, org_id: &str, filter: &AuthBookFilter) -> ServerResult<u64> {
        let count = self
            .auth_books()
            .count_documents(filter.to_document(org_id)?)
            .await?;
        Ok(count)
    }

    async fn history(
        &self,
        org_id: &str,
        asset: &ObjectId,
        username: &str,
    ) -> ServerResult<Vec<AuthBookDoc>> {
        let options = FindOptions::builder()
            .sort(Some(doc! { "version": -1 }))
            .build();
        let cursor = self
            .auth_books()
            .find(doc! { "org_id": org_id, "asset": asset, "username": username })
            .with_options(options)
            .await?;
        let results: Vec<AuthBookDoc> = cursor
            .try_collect()
            .await
            .map_err(|_| ServerError::internal_error("Cursor decode failed"))?;
        Ok(results)
    }

    async fn delete_versions(
        &self,
        org_id: &str,
        asset: &ObjectId,
        username: &str,
    ) -> ServerResult<u64> {
        let result = self
            .auth_books()
            .delete_many(doc! { "org_id": org_id, "asset": asset, "username": username })
            .await
            .map_err(|_| ServerError::internal_error("Failed to delete credential"))?;
        Ok(result.deleted_count)
    }

    async fn set_connectivity(
        &self,
        id: &ObjectId,
        connectivity: Connectivity,
        updated: DateTime,
    ) -> ServerResult<()> {
        self.auth_books()
            .update_one(
                doc! { "_id": id },
                doc! { "$set": { "connectivity": connectivity.as_str(), "date_updated": updated } },
            )
            .await?;
        Ok(())
    }
}
