//! Account revocation: invalidate cached credential state, delete the
//! account, blacklist the presented token.
//!
//! The sequence is ordered but not transactional. Step 1 (cache delete) is
//! terminal on failure: a later step needs the cache reachable anyway, so
//! the coordinator refuses to touch the store when it is not. Step 3
//! (blacklist insert) is best-effort: the account is already gone, so its
//! failure is logged and swallowed.

use crate::cache::{self, AuthCache, BLACKLIST_SENTINEL};
use crate::errors::AuthError;
use crate::repositories::users::UserStore;
use std::time::Duration;
use tracing::{error, warn};

/// Revoke `username`'s account and the token it presented on this request.
///
/// Callers must have already authenticated the request as `username` through
/// the token gate. `token_ttl` is the issuer's configured maximum lifetime -
/// an upper bound on how long the presented token could still validate, so
/// the blacklist entry self-expires with it.
pub async fn revoke_account(
    store: &dyn UserStore,
    cache: &dyn AuthCache,
    username: &str,
    raw_token: &str,
    token_ttl: Duration,
) -> Result<(), AuthError> {
    if let Err(e) = cache.delete(&cache::credential_key(username)).await {
        warn!(
            target: "auth.revocation",
            error = %e,
            "Cache invalidation failed, refusing to delete account"
        );
        return Err(AuthError::UserNotFound);
    }

    match store.delete(username).await {
        Ok(()) => {}
        Err(AuthError::UserNotFound) => return Err(AuthError::UserNotFound),
        Err(e) => {
            // Transport failures surface identically to not-found, but are
            // logged with their real cause
            error!(
                target: "auth.revocation",
                error = %e,
                "Account deletion failed"
            );
            return Err(AuthError::UserNotFound);
        }
    }

    if let Err(e) = cache
        .set(&cache::blacklist_key(raw_token), BLACKLIST_SENTINEL, token_ttl)
        .await
    {
        warn!(
            target: "auth.revocation",
            error = %e,
            "Token blacklist insert failed; token will only die at its natural expiry"
        );
    }

    Ok(())
}
