use authbook_shared::asset::BasicAsset;
use mongodb::bson::{DateTime, oid::ObjectId};
use serde::{Deserialize, Serialize};

/// A managed host. Assets are owned by the inventory side of the platform;
/// this service only reads them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetDoc {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub hostname: String,
    pub ip: String,
    #[serde(default)]
    pub org_id: String,
    #[serde(default)]
    pub created_at: Option<DateTime>,
}

impl From<&AssetDoc> for BasicAsset {
    fn from(asset: &AssetDoc) -> Self {
        BasicAsset {
            hostname: asset.hostname.clone(),
            ip: asset.ip.clone(),
        }
    }
}
