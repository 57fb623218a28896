pub mod asset_user;
pub mod serve;
