use crate::{
    models::{asset::AssetDoc, auth_book::AuthBookDoc},
    response::ServerResult,
};
use mongodb::{bson::doc, options::IndexOptions};
use mongodb::{Client, Collection, IndexModel, options::ClientOptions};
use tracing::info;

#[derive(Clone)]
pub struct Mongo {
    pub client: Client,
    pub db_name: String,
}

impl Mongo {
    pub async fn connect(url: &str, db_name: &str) -> ServerResult<Self> {
        let mut opts = ClientOptions::parse(url).await?;
        opts.app_name = Some("authbook".into());
        let client = Client::with_options(opts)?;
        info!("Connected to MongoDB database {}", db_name);
        Ok(Self {
            client,
            db_name: db_name.into(),
        })
    }

    fn col<T: Send + Sync>(&self, name: &str) -> Collection<T> {
        self.client.database(&self.db_name).collection(name)
    }

    pub fn assets(&self) -> Collection<AssetDoc> {
        self.col("assets")
    }

    pub fn auth_books(&self) -> Collection<AuthBookDoc> {
        self.col("auth_books")
    }

    pub async fn ensure_indexes(&self) -> ServerResult<()> {
        // One row per version of a credential
        self.auth_books()
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "org_id": 1, "asset": 1, "username": 1, "version": 1 })
                    .options(IndexOptions::builder().unique(true).build())
                    .build(),
            )
            .await?;

        self.auth_books()
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "org_id": 1, "is_latest": 1 })
                    .build(),
            )
            .await?;

        self.auth_books()
            .create_index(IndexModel::builder().keys(doc! { "asset": 1 }).build())
            .await?;

        self.assets()
            .create_index(IndexModel::builder().keys(doc! { "org_id": 1 }).build())
            .await?;
        Ok(())
    }
}
