//! Config-backed user directory.
//!
//! Supplies principal identities, capability flags, and workspace
//! memberships, and verifies Basic credentials against Argon2 hashes.
//! Successful verifications are remembered by a SHA-256 fingerprint of the
//! credentials so that Argon2 runs once per distinct credential pair.

pub mod sync;

use std::collections::{BTreeMap, HashMap, HashSet};

use dashmap::DashMap;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use graphfs_core::config::DirectoryConfig;
use graphfs_core::types::PrincipalId;
use graphfs_core::{AppError, AppResult};
use graphfs_entity::{Capabilities, MembershipRole, Principal};

use crate::password::PasswordHasher;

/// Users and workspaces known to the platform.
#[derive(Debug)]
pub struct UserDirectory {
    password_hashes: HashMap<String, String>,
    principals: Vec<Principal>,
    hasher: PasswordHasher,
    verified: DashMap<String, PrincipalId>,
}

impl UserDirectory {
    /// Build the directory from configuration.
    pub fn from_config(config: &DirectoryConfig) -> AppResult<Self> {
        let mut seen = HashSet::new();
        for id in config
            .users
            .iter()
            .map(|u| &u.id)
            .chain(config.workspaces.iter().map(|w| &w.id))
        {
            if id.is_empty() {
                return Err(AppError::configuration("Directory entries need a non-empty id"));
            }
            if !seen.insert(id.as_str()) {
                return Err(AppError::configuration(format!(
                    "Duplicate directory id: {id}"
                )));
            }
        }

        let mut memberships: HashMap<&str, BTreeMap<PrincipalId, MembershipRole>> = HashMap::new();
        for workspace in &config.workspaces {
            let roles = workspace
                .members
                .iter()
                .map(|m| (m, MembershipRole::Member))
                .chain(workspace.managers.iter().map(|m| (m, MembershipRole::Manager)));
            for (user, role) in roles {
                if !config.users.iter().any(|u| &u.id == user) {
                    return Err(AppError::configuration(format!(
                        "Workspace '{}' references unknown user '{user}'",
                        workspace.id
                    )));
                }
                let entry = memberships
                    .entry(user.as_str())
                    .or_default()
                    .entry(PrincipalId::new(workspace.id.as_str()))
                    .or_insert(role);
                if role == MembershipRole::Manager {
                    *entry = MembershipRole::Manager;
                }
            }
        }

        let mut principals = Vec::new();
        let mut password_hashes = HashMap::new();
        for user in &config.users {
            let mut principal = Principal::user(
                user.id.as_str(),
                display_name(&user.name, &user.id),
                Capabilities {
                    admin: user.admin,
                    can_view_public_metadata: user.can_view_public_metadata,
                    can_view_public_data: user.can_view_public_data,
                },
            );
            if let Some(edges) = memberships.remove(user.id.as_str()) {
                principal.memberships = edges;
            }
            principals.push(principal);
            password_hashes.insert(user.id.clone(), user.password_hash.clone());
        }
        for workspace in &config.workspaces {
            principals.push(Principal::workspace(
                workspace.id.as_str(),
                display_name(&workspace.name, &workspace.id),
            ));
        }

        Ok(Self {
            password_hashes,
            principals,
            hasher: PasswordHasher::new(),
            verified: DashMap::new(),
        })
    }

    /// Every configured principal, users first.
    pub fn principals(&self) -> &[Principal] {
        &self.principals
    }

    pub fn user_count(&self) -> usize {
        self.password_hashes.len()
    }

    /// Verify Basic credentials. Unknown users and wrong passwords fail alike.
    ///
    /// Runs Argon2 on a cache miss, so call it off the async executor.
    pub fn authenticate(&self, username: &str, password: &str) -> AppResult<PrincipalId> {
        let fingerprint = fingerprint(username, password);
        if let Some(id) = self.verified.get(&fingerprint) {
            return Ok(id.value().clone());
        }

        let Some(hash) = self.password_hashes.get(username) else {
            debug!(username, "Unknown user");
            return Err(AppError::authentication("Invalid username or password"));
        };
        if !self.hasher.verify_password(password, hash)? {
            warn!(username, "Password mismatch");
            return Err(AppError::authentication("Invalid username or password"));
        }

        let id = PrincipalId::new(username);
        self.verified.insert(fingerprint, id.clone());
        Ok(id)
    }
}

fn display_name(name: &str, id: &str) -> String {
    if name.is_empty() {
        id.to_string()
    } else {
        name.to_string()
    }
}

fn fingerprint(username: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(username.as_bytes());
    hasher.update([0u8]);
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}
