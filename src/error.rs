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

//! Error types for the LDAP authentication backend.

use thiserror::Error;

/// One failed connection candidate: the server URL and the reason.
#[derive(Debug, Clone)]
pub struct ServerFailure {
    pub server: String,
    pub reason: String,
}

impl std::fmt::Display for ServerFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.server, self.reason)
    }
}

/// Connection establishment failures.
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// Every configured server was tried once and none yielded a usable,
    /// secured connection.
    #[error("unable to reach any LDAP server: [{}]", format_failures(.attempts))]
    AllServersFailed { attempts: Vec<ServerFailure> },
}

fn format_failures(attempts: &[ServerFailure]) -> String {
    attempts
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Authentication failures.
///
/// Wrong password, unknown user, and ambiguous search matches all collapse
/// into `InvalidCredentials` so callers cannot enumerate directory accounts.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The configured service account could not bind. This is an operator
    /// problem, not a user-credential problem, and is reported as such.
    #[error("service account bind failed: {0}")]
    ServiceAccount(String),
}

/// Search execution failures.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("LDAP search failed: {0}")]
    Protocol(String),

    /// The server reported sizeLimitExceeded. A truncated result set must
    /// never be treated as a successful (partial) match.
    #[error("LDAP search exceeded the size limit")]
    SizeLimitExceeded,

    #[error("LDAP search exceeded the time limit")]
    TimeLimitExceeded,
}

/// Authorization (group membership) failures.
#[derive(Debug, Error)]
pub enum AuthzError {
    #[error("user is not a member of any authorized group")]
    NotAuthorized,

    #[error(transparent)]
    Search(#[from] SearchError),
}

/// Identity mapping failures.
#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("no usable identity value on the directory entry")]
    Unresolvable,
}

/// Configuration rejected by [`crate::LdapBackend::new`].
#[derive(Debug, Error)]
#[error("invalid LDAP backend configuration: {0}")]
pub struct ConfigError(pub String);

/// The public error surface of the backend.
///
/// Every failure reaches the caller as exactly one of these variants; there
/// is no partially authenticated state.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Authz(#[from] AuthzError),

    #[error(transparent)]
    Search(#[from] SearchError),

    #[error(transparent)]
    Identity(#[from] IdentityError),
}
