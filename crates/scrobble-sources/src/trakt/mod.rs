pub mod client;
pub mod auth;
pub mod api;

pub use client::TraktClient;
pub use auth::{authorize_url, redirect_uri, TokenGrant};
pub use api::{SearchHit, SearchKind};
