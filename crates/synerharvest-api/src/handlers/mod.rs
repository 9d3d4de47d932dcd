//! HTTP handlers, grouped by resource
//!
//! Every handler returns `Result<_, ApiError>`. Response DTOs that carry
//! cross-entity fields (usernames, batch codes, embedded histories) are
//! assembled by the mapper helpers in each module, which batch-load the
//! referenced rows instead of querying per item.

pub mod auth;
pub mod batches;
pub mod events;
pub mod notifications;
pub mod products;
pub mod public;

use sea_orm::{ConnectionTrait, EntityTrait};
use synerharvest_db::entities::{prelude::User, user};

use crate::error::ApiError;
use crate::middleware::AuthUser;

/// Load the caller's user row.
///
/// Authorization checks read the role fresh from the database rather than
/// trusting the copy baked into the token at login time.
pub(crate) async fn current_user<C: ConnectionTrait>(
    conn: &C,
    auth: &AuthUser,
) -> Result<user::Model, ApiError> {
    User::find_by_id(auth.id)
        .one(conn)
        .await?
        .ok_or_else(|| ApiError::AuthenticationFailed("User not found".to_string()))
}
