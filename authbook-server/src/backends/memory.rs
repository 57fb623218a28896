use std::sync::{
    Mutex,
    atomic::{AtomicBool, Ordering},
};

use async_trait::async_trait;
use authbook_shared::asset_user::Connectivity;
use mongodb::bson::{DateTime, oid::ObjectId};

use crate::{
    backends::{AssetStore, AuthBookStore},
    models::{
        asset::AssetDoc,
        auth_book::{AuthBookDoc, AuthBookFilter},
    },
    response::{ServerError, ServerResult},
    util::pagination::RequestPagination,
};

/// Store kept in process memory for tests.
#[derive(Default)]
pub struct MemoryStore {
    assets: Mutex<Vec<AssetDoc>>,
    books: Mutex<Vec<AuthBookDoc>>,
    fail_retire: AtomicBool,
}

impl MemoryStore {
    pub fn add_asset(&self, org_id: &str, hostname: &str, ip: &str) -> ObjectId {
        let id = ObjectId::new();
        self.assets.lock().unwrap().push(AssetDoc {
            id: Some(id),
            hostname: hostname.to_string(),
            ip: ip.to_string(),
            org_id: org_id.to_string(),
            created_at: Some(DateTime::now()),
        });
        id
    }

    /// Makes every later `set_latest(_, false)` fail.
    pub fn fail_retire(&self) {
        self.fail_retire.store(true, Ordering::SeqCst);
    }

    pub fn latest_count(&self, org_id: &str, asset: &ObjectId, username: &str) -> usize {
        let books = self.books.lock().unwrap();
        books
            .iter()
            .filter(|b| b.is_latest && Self::same_pair(b, org_id, asset, username))
            .count()
    }

    pub fn len(&self) -> usize {
        self.books.lock().unwrap().len()
    }

    fn same_pair(book: &AuthBookDoc, org_id: &str, asset: &ObjectId, username: &str) -> bool {
        book.org_id == org_id && book.asset == *asset && book.username == username
    }
}

#[async_trait]
impl AssetStore for MemoryStore {
    async fn find_asset(&self, org_id: &str, id: &ObjectId) -> ServerResult<Option<AssetDoc>> {
        let assets = self.assets.lock().unwrap();
        Ok(assets
            .iter()
            .find(|a| a.id.as_ref() == Some(id) && a.org_id == org_id)
            .cloned())
    }
}

#[async_trait]
impl AuthBookStore for MemoryStore {
    async fn find_by_id(&self, org_id: &str, id: &ObjectId) -> ServerResult<Option<AuthBookDoc>> {
        let books = self.books.lock().unwrap();
        Ok(books
            .iter()
            .find(|b| b.id.as_ref() == Some(id) && b.org_id == org_id)
            .cloned())
    }

    async fn find_latest(
        &self,
        org_id: &str,
        asset: &ObjectId,
        username: &str,
    ) -> ServerResult<Option<AuthBookDoc>> {
        let books = self.books.lock().unwrap();
        Ok(books
            .iter()
            .filter(|b| b.is_latest && Self::same_pair(b, org_id, asset, username))
            .max_by_key(|b| b.version)
            .cloned())
    }

    async fn insert(&self, mut book: AuthBookDoc) -> ServerResult<AuthBookDoc> {
        let mut books = self.books.lock().unwrap();
        let duplicate = books.iter().any(|b| {
            b.version == book.version
                && Self::same_pair(b, &book.org_id, &book.asset, &book.username)
        });
        if duplicate {
            return Err(ServerError::internal_error("duplicate credential version"));
        }
        book.id = Some(ObjectId::new());
        books.push(book.clone());
        Ok(book)
    }

    async fn set_latest(&self, id: &ObjectId, is_latest: bool) -> ServerResult<()> {
        if !is_latest && self.fail_retire.load(Ordering::SeqCst) {
            return Err(ServerError::internal_error("Failed to update credential"));
        }
        let mut books = self.books.lock().unwrap();
        if let Some(book) = books.iter_mut().find(|b| b.id.as_ref() == Some(id)) {
            book.is_latest = is_latest;
        }
        Ok(())
    }

    async fn delete_by_id(&self, id: &ObjectId) -> ServerResult<()> {
        let mut books = self.books.lock().unwrap();
        books.retain(|b| b.id.as_ref() != Some(id));
        Ok(())
    }

    async fn list(
        &self,
        org_id: &str,
        filter: &AuthBookFilter,
        pagination: &RequestPagination,
    ) -> ServerResult<Vec<AuthBookDoc>> {
        let books = self.books.lock().unwrap();
        Ok(books
            .iter()
            .filter(|b| filter.matches(org_id, b))
            .skip(pagination.offset as usize)
            .take(pagination.limit as usize)
            .cloned()
            .collect())
    }

    async fn count(&self, org_id: &str, filter: &AuthBookFilter) -> ServerResult<u64> {
        let books = self.books.lock().unwrap();
        Ok(books.iter().filter(|b| filter.matches(org_id, b)).count() as u64)
    }

    async fn history(
        &self,
        org_id: &str,
        asset: &ObjectId,
        username: &str,
    ) -> ServerResult<Vec<AuthBookDoc>> {
        let books = self.books.lock().unwrap();
        let mut versions: Vec<AuthBookDoc> = books
            .iter()
            .filter(|b| Self::same_pair(b, org_id, asset, username))
            .cloned()
            .collect();
        versions.sort_by(|a, b| b.version.cmp(&a.version));
        Ok(versions)
    }

    async fn delete_versions(
        &self,
        org_id: &str,
        asset: &ObjectId,
        username: &str,
    ) -> ServerResult<u64> {
        let mut books = self.books.lock().unwrap();
        let before = books.len();
        books.retain(|b| !Self::same_pair(b, org_id, asset, username));
        Ok((before - books.len()) as u64)
    }

    async fn set_connectivity(
        &self,
        id: &ObjectId,
        connectivity: Connectivity,
        updated: DateTime,
    ) -> ServerResult<()> {
        let mut books = self.books.lock().unwrap();
        if let Some(book) = books.iter_mut().find(|b| b.id.as_ref() == Some(id)) {
            book.connectivity = connectivity;
            book.date_updated = updated;
        }
        Ok(())
    }
}
