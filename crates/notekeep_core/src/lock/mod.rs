//! Advisory edit locks.
//!
//! # Responsibility
//! - Record which note keys are open in an editor across processes.
//! - Hand out scoped claims that release themselves on every exit path.
//!
//! # Invariants
//! - A key appears at most once in the registry.
//! - Every successful `acquire` is released exactly once.
//! - Claims are cooperative; nothing stops a process that ignores them.
//!
//! # Known limitation
//! - A crashed session leaves its key behind. `LockManager::force_release`
//!   is the manual recovery path.

mod manager;
mod registry;

pub use manager::{EditClaim, LockManager};
pub use registry::{ClaimRegistry, FileClaimRegistry, MemoryClaimRegistry};

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// What an edit session does when its note is already claimed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConflictPolicy {
    /// Fail with `AlreadyInUse`.
    #[default]
    Refuse,
    /// Open the editor read-only and discard the result.
    ReadOnly,
}

impl Display for ConflictPolicy {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Refuse => write!(f, "refuse"),
            Self::ReadOnly => write!(f, "read-only"),
        }
    }
}

impl FromStr for ConflictPolicy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "refuse" => Ok(Self::Refuse),
            "read-only" | "readonly" => Ok(Self::ReadOnly),
            other => Err(format!(
                "unsupported conflict policy `{other}`; expected refuse|read-only"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ConflictPolicy;

    #[test]
    fn conflict_policy_parses_and_displays_symmetrically() {
        for policy in [ConflictPolicy::Refuse, ConflictPolicy::ReadOnly] {
            assert_eq!(policy.to_string().parse::<ConflictPolicy>(), Ok(policy));
        }
        assert_eq!("ReadOnly".parse(), Ok(ConflictPolicy::ReadOnly));
        assert!("ignore".parse::<ConflictPolicy>().is_err());
    }
}
