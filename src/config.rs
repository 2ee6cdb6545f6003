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

//! Backend configuration.
//!
//! The host service parses and validates its own configuration files; these
//! structs define the schema the backend consumes. [`LdapConfig::validate`]
//! re-checks the invariants the backend itself depends on.

use secrecy::SecretString;
use serde::Deserialize;
use std::path::PathBuf;
use url::Url;

use crate::error::ConfigError;

/// Placeholder substituted with the (escaped) login name in DN and filter
/// templates.
pub const USERNAME_PLACEHOLDER: &str = "{username}";

/// Full backend configuration for one directory.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LdapConfig {
    /// Ordered list of server URLs (`ldap://host:389`, `ldaps://host:636`).
    /// Tried in order; the first server that yields a secured connection
    /// wins.
    pub servers: Vec<String>,

    /// Upgrade plaintext `ldap://` connections with StartTLS.
    #[serde(default)]
    pub starttls: bool,

    /// Certificate validation policy for TLS connections.
    #[serde(default)]
    pub tls: TlsPolicy,

    /// Per-candidate TCP/TLS establishment timeout, seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: u64,

    /// Per-operation (bind, search) timeout, seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,

    /// Server-side search size limit. Exceeding it fails the search.
    #[serde(default)]
    pub size_limit: Option<i32>,

    /// Server-side search time limit, seconds.
    #[serde(default)]
    pub time_limit: Option<i32>,

    /// How user credentials are verified.
    pub bind: BindStrategy,

    /// Group-based authorization. `None` disables the group check.
    #[serde(default)]
    pub group: Option<GroupConfig>,

    /// How the returned identity is derived from the directory entry.
    #[serde(default)]
    pub mapping: AttributeMapping,
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_request_timeout() -> u64 {
    30
}

/// Certificate validation policy.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TlsPolicy {
    /// Validate the server certificate against the system trust store.
    #[default]
    Verify,

    /// Accept any certificate. Must be chosen explicitly; never a default.
    TrustAll,

    /// Validate against a PEM bundle at the given path.
    CaBundle { path: PathBuf },
}

/// Search scope, mirroring the LDAP wire values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchScope {
    Base,
    One,
    #[default]
    Subtree,
}

impl SearchScope {
    pub(crate) fn as_scope(self) -> ldap3::Scope {
        match self {
            SearchScope::Base => ldap3::Scope::Base,
            SearchScope::One => ldap3::Scope::OneLevel,
            SearchScope::Subtree => ldap3::Scope::Subtree,
        }
    }
}

/// Credential verification strategy. Exactly one variant is active.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum BindStrategy {
    /// Bind directly as a DN constructed from a template, e.g.
    /// `uid={username},ou=people,dc=example,dc=org`.
    Direct { user_dn_template: String },

    /// Bind as a service account, search for the user's entry, then rebind
    /// with the discovered DN and the supplied password.
    Search {
        base_dn: String,
        #[serde(default = "default_filter_template")]
        filter_template: String,
        bind_dn: String,
        bind_password: SecretString,
        #[serde(default)]
        scope: SearchScope,
    },
}

fn default_filter_template() -> String {
    "(uid={username})".to_string()
}

/// Which side of the membership relation the directory records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MembershipConvention {
    /// Group entries carry a member attribute listing user DNs.
    #[default]
    GroupListsMembers,

    /// User entries carry a memberOf-style attribute listing group DNs.
    UserListsGroups,
}

/// How many of the configured groups must match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupMatchMode {
    /// Membership in at least one configured group suffices.
    #[default]
    Any,

    /// Membership in every configured group is required.
    All,
}

/// Group-based authorization settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct GroupConfig {
    /// Base DN for group searches (group-lists-members convention).
    #[serde(default)]
    pub base_dn: String,

    /// Authorized groups, as DNs or names.
    pub groups: Vec<String>,

    #[serde(default)]
    pub convention: MembershipConvention,

    /// Group attribute holding member DNs.
    #[serde(default = "default_member_attribute")]
    pub member_attribute: String,

    /// User attribute holding group DNs (user-lists-groups convention).
    #[serde(default = "default_membership_attribute")]
    pub membership_attribute: String,

    /// Group attribute matched against configured group *names*.
    #[serde(default = "default_name_attribute")]
    pub name_attribute: String,

    #[serde(default)]
    pub match_mode: GroupMatchMode,

    /// When false the check runs but never denies authorization.
    #[serde(default = "default_required")]
    pub required: bool,
}

fn default_member_attribute() -> String {
    "member".to_string()
}

fn default_membership_attribute() -> String {
    "memberOf".to_string()
}

fn default_name_attribute() -> String {
    "cn".to_string()
}

fn default_required() -> bool {
    true
}

/// Identity derivation settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct AttributeMapping {
    /// Attribute whose first value becomes the returned identity. The
    /// entry's DN is the fallback when the attribute is absent.
    #[serde(default = "default_identity_attribute")]
    pub identity_attribute: String,
}

fn default_identity_attribute() -> String {
    "uid".to_string()
}

impl Default for AttributeMapping {
    fn default() -> Self {
        Self {
            identity_attribute: default_identity_attribute(),
        }
    }
}

impl LdapConfig {
    /// Check the invariants the backend relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.servers.is_empty() {
            return Err(ConfigError("at least one server URL is required".into()));
        }

        for server in &self.servers {
            let url = Url::parse(server)
                .map_err(|e| ConfigError(format!("invalid server URL {server:?}: {e}")))?;
            match url.scheme() {
                "ldap" | "ldaps" => {}
                other => {
                    return Err(ConfigError(format!(
                        "server URL {server:?} has unsupported scheme {other:?}"
                    )));
                }
            }
        }

        match &self.bind {
            BindStrategy::Direct { user_dn_template } => {
                if !user_dn_template.contains(USERNAME_PLACEHOLDER) {
                    return Err(ConfigError(format!(
                        "user_dn_template must contain {USERNAME_PLACEHOLDER}"
                    )));
                }
            }
            BindStrategy::Search {
                base_dn,
                filter_template,
                bind_dn,
                ..
            } => {
                if base_dn.is_empty() {
                    return Err(ConfigError("search base_dn is required".into()));
                }
                if bind_dn.is_empty() {
                    return Err(ConfigError("service bind_dn is required".into()));
                }
                if !filter_template.contains(USERNAME_PLACEHOLDER) {
                    return Err(ConfigError(format!(
                        "filter_template must contain {USERNAME_PLACEHOLDER}"
                    )));
                }
            }
        }

        if let Some(group) = &self.group {
            if group.groups.is_empty() {
                return Err(ConfigError(
                    "group authorization enabled but no groups configured".into(),
                ));
            }
            if group.convention == MembershipConvention::GroupListsMembers
                && group.base_dn.is_empty()
            {
                return Err(ConfigError(
                    "group base_dn is required for the group-lists-members convention".into(),
                ));
            }
        }

        Ok(())
    }
}
