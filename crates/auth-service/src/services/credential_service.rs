//! Credential verification with a cache-aside lookup strategy.
//!
//! The fast path resolves a username's password hash from the ephemeral
//! cache; a miss or cache error falls back to the authoritative store and
//! backfills the cache. Every resolution failure collapses into the single
//! `InvalidCredentials` outcome so callers cannot distinguish "no such user"
//! from "store unavailable".

use crate::cache::{self, AuthCache};
use crate::errors::AuthError;
use crate::repositories::users::UserStore;
use std::time::Duration;
use tracing::warn;

/// TTL for backfilled password hashes. Cached hashes may be stale relative
/// to the store only within this window, and are proactively deleted on
/// account deletion.
pub const CREDENTIAL_CACHE_TTL: Duration = Duration::from_secs(5 * 60);

/// Deadline for the authoritative store lookup. Exceeding it is treated
/// identically to a store error.
pub const STORE_LOOKUP_TIMEOUT: Duration = Duration::from_secs(1);

/// Verify a username/password pair against the cache, falling back to the
/// store on a miss.
///
/// Side effects: at most one cache write per cache-miss verification; none
/// on the cache-hit path. The backfill is best-effort and never fails the
/// surrounding login.
pub async fn verify_credentials(
    store: &dyn UserStore,
    cache: &dyn AuthCache,
    username: &str,
    password: &str,
) -> Result<(), AuthError> {
    let hash = match cache.get(&cache::credential_key(username)).await {
        Ok(Some(cached)) => cached,
        Ok(None) => resolve_from_store(store, cache, username).await?,
        Err(e) => {
            // Cache unavailability must not block logins
            warn!(
                target: "auth.credentials",
                error = %e,
                "Credential cache read failed, falling back to store"
            );
            resolve_from_store(store, cache, username).await?
        }
    };

    match bcrypt::verify(password, &hash) {
        Ok(true) => Ok(()),
        Ok(false) => Err(AuthError::InvalidCredentials),
        Err(e) => {
            warn!(
                target: "auth.credentials",
                error = %e,
                "Password hash comparison failed"
            );
            Err(AuthError::InvalidCredentials)
        }
    }
}

/// Slow path: authoritative lookup bounded by [`STORE_LOOKUP_TIMEOUT`],
/// followed by a best-effort cache backfill.
async fn resolve_from_store(
    store: &dyn UserStore,
    cache: &dyn AuthCache,
    username: &str,
) -> Result<String, AuthError> {
    let lookup = tokio::time::timeout(STORE_LOOKUP_TIMEOUT, store.find_by_username(username));

    let user = match lookup.await {
        Ok(Ok(Some(user))) => user,
        Ok(Ok(None)) => return Err(AuthError::InvalidCredentials),
        Ok(Err(e)) => {
            warn!(
                target: "auth.credentials",
                error = %e,
                "Credential store lookup failed"
            );
            return Err(AuthError::InvalidCredentials);
        }
        Err(_) => {
            warn!(
                target: "auth.credentials",
                timeout_secs = STORE_LOOKUP_TIMEOUT.as_secs(),
                "Credential store lookup timed out"
            );
            return Err(AuthError::InvalidCredentials);
        }
    };

    if let Err(e) = cache
        .set(
            &cache::credential_key(username),
            &user.password_hash,
            CREDENTIAL_CACHE_TTL,
        )
        .await
    {
        warn!(
            target: "auth.credentials",
            error = %e,
            "Credential cache backfill failed"
        );
    }

    Ok(user.password_hash)
}
