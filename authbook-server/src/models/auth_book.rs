use authbook_shared::asset_user::{AssetUser, AssetUserAuthInfo, AssetUserExport, Connectivity};
use mongodb::bson::{DateTime, Document, doc, oid::ObjectId};
use serde::{Deserialize, Serialize};

pub const DB_BACKEND: &str = "db";

/// One version of a stored credential. Every (org, asset, username) triple
/// has exactly one row with `is_latest` set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthBookDoc {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub name: String,
    pub username: String,
    pub asset: ObjectId,
    /// Copied from the asset when the version was written
    pub hostname: String,
    pub ip: String,
    #[serde(default)]
    pub org_id: String,
    #[serde(default)]
    pub comment: String,
    pub password: Option<String>,
    pub public_key: Option<String>,
    pub private_key: Option<String>,
    pub version: u32,
    pub is_latest: bool,
    #[serde(default)]
    pub connectivity: Connectivity,
    pub backend: String,
    pub date_created: DateTime,
    pub date_updated: DateTime,
}

fn rfc3339(dt: &DateTime) -> String {
    dt.try_to_rfc3339_string().unwrap_or_default()
}

impl AuthBookDoc {
    pub fn id_string(&self) -> String {
        self.id.map(|id| id.to_hex()).unwrap_or_default()
    }

    pub fn to_asset_user(&self) -> AssetUser {
        AssetUser {
            id: self.id_string(),
            hostname: self.hostname.clone(),
            ip: self.ip.clone(),
            username: self.username.clone(),
            asset: self.asset.to_hex(),
            version: self.version,
            is_latest: self.is_latest,
            connectivity: self.connectivity,
            backend: self.backend.clone(),
            date_created: rfc3339(&self.date_created),
            date_updated: rfc3339(&self.date_updated),
        }
    }

    pub fn to_asset_users(docs: Vec<AuthBookDoc>) -> Vec<AssetUser> {
        docs.iter().map(|d| d.to_asset_user()).collect()
    }

    pub fn to_export(&self) -> AssetUserExport {
        AssetUserExport {
            user: self.to_asset_user(),
            password: self.password.clone(),
            public_key: self.public_key.clone(),
            private_key: self.private_key.clone(),
        }
    }

    pub fn to_auth_info(&self) -> AssetUserAuthInfo {
        AssetUserAuthInfo {
            password: self.password.clone(),
            private_key: self.private_key.clone(),
            public_key: self.public_key.clone(),
        }
    }
}

/// Query options for listing credentials.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthBookFilter {
    #[serde(default)]
    pub asset: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub hostname: Option<String>,
    /// Only latest versions unless explicitly disabled
    #[serde(default = "default_latest")]
    pub latest: bool,
}

fn default_latest() -> bool {
    true
}

impl Default for AuthBookFilter {
    fn default() -> Self {
        Self {
            asset: None,
            username: None,
            hostname: None,
            latest: true,
        }
    }
}

impl AuthBookFilter {
    pub fn asset_id(&self) -> Result<Option<ObjectId>, mongodb::bson::oid::Error> {
        self.asset.as_deref().map(ObjectId::parse_str).transpose()
    }

    pub fn to_document(&self, org_id: &str) -> Result<Document, mongodb::bson::oid::Error> {
        let mut filter = doc! { "org_id": org_id };
        if let Some(asset) = self.asset_id()? {
            filter.insert("asset", asset);
        }
        if let Some(username) = &self.username {
            filter.insert("username", username);
        }
        if let Some(hostname) = &self.hostname {
            filter.insert("hostname", hostname);
        }
        if self.latest {
            filter.insert("is_latest", true);
        }
        Ok(filter)
    }

    pub fn matches(&self, org_id: &str, book: &AuthBookDoc) -> bool {
        let asset = match self.asset_id() {
            Ok(asset) => asset,
            Err(_) => return false,
        };
        book.org_id == org_id
            && asset.is_none_or(|a| a == book.asset)
            && self.username.as_ref().is_none_or(|u| *u == book.username)
            && self.hostname.as_ref().is_none_or(|h| *h == book.hostname)
            && (!self.latest || book.is_latest)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub fn sample_book(asset: ObjectId, username: &str, version: u32, is_latest: bool) -> AuthBookDoc {
        let now = DateTime::now();
        AuthBookDoc {
            id: Some(ObjectId::new()),
            name: username.to_string(),
            username: username.to_string(),
            asset,
            hostname: "web01".to_string(),
            ip: "10.0.0.1".to_string(),
            org_id: String::new(),
            comment: String::new(),
            password: Some("secret".to_string()),
            public_key: None,
            private_key: None,
            version,
            is_latest,
            connectivity: Connectivity::Unknown,
            backend: DB_BACKEND.to_string(),
            date_created: now,
            date_updated: now,
        }
    }

    #[test]
    fn test_views_hide_or_expose_secrets() {
        let book = sample_book(ObjectId::new(), "root", 2, true);
        let user = book.to_asset_user();
        assert_eq!(user.id, book.id.unwrap().to_hex());
        assert_eq!(user.version, 2);
        assert_eq!(user.backend, "db");
        assert!(!user.date_created.is_empty());

        assert_eq!(book.to_export().password.as_deref(), Some("secret"));
        assert_eq!(book.to_auth_info().password.as_deref(), Some("secret"));
    }

    #[test]
    fn test_filter_document() {
        let asset = ObjectId::new();
        let filter = AuthBookFilter {
            asset: Some(asset.to_hex()),
            username: Some("root".to_string()),
            ..Default::default()
        };
        let doc = filter.to_document("org1").unwrap();
        assert_eq!(doc.get_str("org_id").unwrap(), "org1");
        assert_eq!(doc.get_object_id("asset").unwrap(), asset);
        assert!(doc.get_bool("is_latest").unwrap());
        assert!(doc.get("hostname").is_none());

        let all_versions = AuthBookFilter {
            latest: false,
            ..Default::default()
        };
        assert!(all_versions.to_document("").unwrap().get("is_latest").is_none());
    }

    #[test]
    fn test_filter_rejects_bad_asset_id() {
        let filter = AuthBookFilter {
            asset: Some("nope".to_string()),
            ..Default::default()
        };
        assert!(filter.to_document("").is_err());
    }

    #[test]
    fn test_filter_matches() {
        let asset = ObjectId::new();
        let latest = sample_book(asset, "root", 2, true);
        let old = sample_book(asset, "root", 1, false);
        let filter = AuthBookFilter::default();
        assert!(filter.matches("", &latest));
        assert!(!filter.matches("", &old));
        assert!(!filter.matches("other", &latest));

        let by_host = AuthBookFilter {
            hostname: Some("db01".to_string()),
            ..Default::default()
        };
        assert!(!by_host.matches("", &latest));
    }
}
