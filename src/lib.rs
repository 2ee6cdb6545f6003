// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

//! LDAP authentication and authorization backend.
//!
//! Verifies a username/password pair against an LDAP v3 directory and
//! optionally authorizes the user by group membership. The host
//! authentication service constructs an [`LdapBackend`] from validated
//! configuration and calls [`LdapBackend::authenticate_and_authorize`] once
//! per login attempt; each attempt opens, uses, and unbinds its own
//! connection.

use async_trait::async_trait;
use ldap3::Ldap;

pub mod authenticate;
pub mod config;
mod connection;
pub mod error;
pub mod group;
pub mod mapping;
pub mod search;

pub use config::{
    AttributeMapping, BindStrategy, GroupConfig, GroupMatchMode, LdapConfig,
    MembershipConvention, SearchScope, TlsPolicy,
};
pub use error::{
    AuthError, AuthzError, BackendError, ConfigError, ConnectionError, IdentityError, SearchError,
};
pub use mapping::ResolvedUser;

/// The capability the host authentication service depends on.
#[async_trait]
pub trait AuthenticationBackend: Send + Sync {
    /// Verify the credentials and, when group authorization is configured,
    /// the user's group membership. Returns the mapped identity string.
    async fn authenticate_and_authorize(
        &self,
        username: &str,
        password: &str,
    ) -> Result<String, BackendError>;
}

/// LDAP authentication backend.
#[derive(Debug, Clone)]
pub struct LdapBackend {
    config: LdapConfig,
}

impl LdapBackend {
    /// Build a backend from already-parsed configuration, re-checking the
    /// invariants the backend relies on.
    pub fn new(config: LdapConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &LdapConfig {
        &self.config
    }

    /// Run one authentication attempt.
    ///
    /// Empty credentials fail before any socket is opened: a simple bind
    /// with an empty password is an anonymous bind, which directories
    /// commonly accept. The connection is unbound on every exit path.
    pub async fn authenticate_and_authorize(
        &self,
        username: &str,
        password: &str,
    ) -> Result<String, BackendError> {
        if username.is_empty() || password.is_empty() {
            return Err(AuthError::InvalidCredentials.into());
        }

        let mut ldap = connection::connect(&self.config).await?;
        let outcome = self.run_attempt(&mut ldap, username, password).await;
        let _ = ldap.unbind().await;
        outcome
    }

    async fn run_attempt(
        &self,
        ldap: &mut Ldap,
        username: &str,
        password: &str,
    ) -> Result<String, BackendError> {
        let user = authenticate::resolve_user(ldap, &self.config, username, password).await?;

        if let Some(group_config) = &self.config.group {
            // The user bind left the connection bound as the user; the
            // search strategy re-binds as the service account before the
            // group search. The user-lists-groups convention reads the
            // resolved entry and needs neither.
            if group_config.convention == MembershipConvention::GroupListsMembers {
                authenticate::rebind_service(ldap, &self.config).await?;
            }
            group::authorize(ldap, &self.config, group_config, &user).await?;
        }

        let identity = mapping::map_identity(&user, &self.config.mapping)?;
        tracing::debug!("authenticated {}", identity);
        Ok(identity)
    }
}

#[async_trait]
impl AuthenticationBackend for LdapBackend {
    async fn authenticate_and_authorize(
        &self,
        username: &str,
        password: &str,
    ) -> Result<String, BackendError> {
        LdapBackend::authenticate_and_authorize(self, username, password).await
    }
}
