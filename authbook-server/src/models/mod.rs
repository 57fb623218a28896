pub mod asset;
pub mod asset_user;
pub mod auth_book;
