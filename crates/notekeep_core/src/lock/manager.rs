use super::registry::ClaimRegistry;
use crate::error::{StoreError, StoreResult};
use log::{debug, error, warn};

/// Hands out advisory edit claims backed by a [`ClaimRegistry`].
#[derive(Debug)]
pub struct LockManager<R: ClaimRegistry> {
    registry: R,
}

impl<R: ClaimRegistry> LockManager<R> {
    pub fn new(registry: R) -> Self {
        Self { registry }
    }

    /// Claims `key` for one edit session.
    ///
    /// # Errors
    /// - `AlreadyInUse` when another session holds the key.
    pub fn acquire(&self, key: &str) -> StoreResult<EditClaim<'_, R>> {
        if !self.registry.try_claim(key)? {
            warn!("event=lock_acquire module=lock status=conflict");
            return Err(StoreError::AlreadyInUse(key.to_string()));
        }
        debug!("event=lock_acquire module=lock status=ok");
        Ok(EditClaim {
            registry: &self.registry,
            key: key.to_string(),
            released: false,
        })
    }

    /// Drops a claim left behind by a session that never released it.
    ///
    /// Returns `false` when `key` was not claimed.
    pub fn force_release(&self, key: &str) -> StoreResult<bool> {
        let removed = self.registry.unclaim(key)?;
        warn!("event=lock_force_release module=lock status=ok removed={removed}");
        Ok(removed)
    }

    pub fn claimed(&self) -> StoreResult<Vec<String>> {
        self.registry.claimed()
    }

    pub fn is_claimed(&self, key: &str) -> StoreResult<bool> {
        Ok(self.registry.claimed()?.iter().any(|claimed| claimed == key))
    }
}

/// Scoped claim on one key. Released by [`EditClaim::release`] or on drop.
#[derive(Debug)]
pub struct EditClaim<'a, R: ClaimRegistry> {
    registry: &'a R,
    key: String,
    released: bool,
}

impl<R: ClaimRegistry> EditClaim<'_, R> {
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Releases the claim and reports registry failures to the caller.
    pub fn release(mut self) -> StoreResult<()> {
        self.released = true;
        self.registry.unclaim(&self.key)?;
        debug!("event=lock_release module=lock status=ok");
        Ok(())
    }
}

impl<R: ClaimRegistry> Drop for EditClaim<'_, R> {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        if let Err(err) = self.registry.unclaim(&self.key) {
            error!("event=lock_release module=lock status=error error={err}");
        }
    }
}
