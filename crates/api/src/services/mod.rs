//! Business services.
//!
//! Each service is an explicitly constructed object: long-lived ones
//! (tokens, assets, mail) are built once in `AppState`; the per-request
//! ones borrow the pool and are created inside handlers. Nothing here is
//! a module-level singleton.

pub mod assets;
pub mod auth;
pub mod email;
pub mod orders;
pub mod ratings;
pub mod tokens;

pub use assets::{AssetError, AssetStore, StoredAsset};
pub use auth::{AuthError, AuthService};
pub use email::{EmailError, EmailService};
pub use orders::{OrderError, OrderOutcome, OrderService};
pub use ratings::{RatingError, RatingService};
pub use tokens::{TokenError, TokenFlow, TokenService};
