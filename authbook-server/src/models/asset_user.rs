use authbook_shared::{
    asset_user::{
        AssetUserPushRequest, CreateAssetUserRequest, KEY_MAX_LENGTH, PASSWORD_MAX_LENGTH,
        PUSH_USERNAME_MAX_LENGTH, USERNAME_MAX_LENGTH, UpdateConnectivityBody,
    },
    validation::{FieldErrors, optional_str, require_str},
};
use mongodb::bson::oid::ObjectId;

use crate::{
    backends::CreateAssetUser,
    util::{
        json::{BodyFields, FieldKind},
        ssh_key::validate_ssh_private_key,
    },
};

pub const PRIVATE_KEY_INVALID: &str = "private key invalid";
pub const INVALID_ASSET: &str = "Invalid asset id.";

pub fn asset_does_not_exist(asset: &ObjectId) -> String {
    format!("Invalid pk \"{}\" - object does not exist.", asset.to_hex())
}

/// Request payloads that check themselves field by field before use.
pub trait ValidateRequest {
    type Output;

    fn validate(&self) -> Result<Self::Output, FieldErrors>;
}

/// A credential write that passed field validation. The asset reference is
/// syntactically valid but has not been looked up yet.
#[derive(Debug, Clone)]
pub struct ValidatedAssetUser {
    pub username: String,
    pub asset: ObjectId,
    pub password: Option<String>,
    pub public_key: Option<String>,
    pub private_key: Option<String>,
    pub comment: String,
}

impl ValidatedAssetUser {
    /// Manager arguments for this write in the given organization. The
    /// credential name mirrors the username.
    pub fn into_create(self, org_id: &str) -> CreateAssetUser {
        CreateAssetUser {
            name: self.username.clone(),
            username: self.username,
            asset: self.asset,
            comment: self.comment,
            org_id: org_id.to_string(),
            password: self.password,
            public_key: self.public_key,
            private_key: self.private_key,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ValidatedPush {
    pub asset: ObjectId,
    pub username: String,
}

impl BodyFields for CreateAssetUserRequest {
    const FIELDS: &'static [(&'static str, FieldKind)] = &[
        ("username", FieldKind::Text),
        ("asset", FieldKind::Text),
        ("password", FieldKind::Text),
        ("public_key", FieldKind::Text),
        ("private_key", FieldKind::Text),
        ("comment", FieldKind::Text),
    ];
}

impl BodyFields for AssetUserPushRequest {
    const FIELDS: &'static [(&'static str, FieldKind)] =
        &[("asset", FieldKind::Text), ("username", FieldKind::Text)];
}

impl BodyFields for UpdateConnectivityBody {
    const FIELDS: &'static [(&'static str, FieldKind)] = &[(
        "connectivity",
        FieldKind::Choice(&["ok", "failed", "unknown"]),
    )];
}

fn require_asset(errors: &mut FieldErrors, value: Option<&str>) -> Option<ObjectId> {
    let value = require_str(errors, "asset", value, 64)?;
    match ObjectId::parse_str(value.trim()) {
        Ok(id) => Some(id),
        Err(_) => {
            errors.add("asset", INVALID_ASSET);
            None
        }
    }
}

impl ValidateRequest for CreateAssetUserRequest {
    type Output = ValidatedAssetUser;

    fn validate(&self) -> Result<ValidatedAssetUser, FieldErrors> {
        let mut errors = FieldErrors::new();

        let username = require_str(
            &mut errors,
            "username",
            self.username.as_deref(),
            USERNAME_MAX_LENGTH,
        );
        let asset = require_asset(&mut errors, self.asset.as_deref());
        let password = optional_str(
            &mut errors,
            "password",
            self.password.as_deref(),
            PASSWORD_MAX_LENGTH,
        );
        let public_key = optional_str(
            &mut errors,
            "public_key",
            self.public_key.as_deref(),
            KEY_MAX_LENGTH,
        );
        let private_key = optional_str(
            &mut errors,
            "private_key",
            self.private_key.as_deref(),
            KEY_MAX_LENGTH,
        );

        // The key is checked against the password as submitted.
        if let Some(key) = &private_key {
            if !validate_ssh_private_key(key, self.password.as_deref()) {
                errors.add("private_key", PRIVATE_KEY_INVALID);
            }
        }

        match (username, asset) {
            (Some(username), Some(asset)) if errors.is_empty() => Ok(ValidatedAssetUser {
                username: username.to_string(),
                asset,
                password,
                public_key,
                private_key,
                comment: self.comment.clone().unwrap_or_default(),
            }),
            _ => Err(errors),
        }
    }
}

impl ValidateRequest for AssetUserPushRequest {
    type Output = ValidatedPush;

    fn validate(&self) -> Result<ValidatedPush, FieldErrors> {
        let mut errors = FieldErrors::new();
        let asset = require_asset(&mut errors, self.asset.as_deref());
        let username = require_str(
            &mut errors,
            "username",
            self.username.as_deref(),
            PUSH_USERNAME_MAX_LENGTH,
        );
        match (asset, username) {
            (Some(asset), Some(username)) => errors.into_result(ValidatedPush {
                asset,
                username: username.to_string(),
            }),
            _ => Err(errors),
        }
    }
}
