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

//! Credential verification via LDAP bind.
//!
//! Two strategies: a direct bind against a templated DN, or a
//! service-account search followed by a rebind as the discovered user.
//! Wrong password, unknown user, and ambiguous matches are all reported as
//! `InvalidCredentials`; only a failing service account is distinguished.

use ldap3::{dn_escape, ldap_escape, Ldap, Scope};
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;

use crate::config::{BindStrategy, LdapConfig, SearchScope, USERNAME_PLACEHOLDER};
use crate::error::{AuthError, BackendError};
use crate::mapping::ResolvedUser;
use crate::search::search_entries;

/// Verify the supplied credentials and resolve the user's directory entry.
///
/// Empty usernames and passwords fail before any bind is issued; an LDAP
/// simple bind with an empty password is an anonymous bind, which most
/// directories accept.
pub async fn resolve_user(
    ldap: &mut Ldap,
    config: &LdapConfig,
    username: &str,
    password: &str,
) -> Result<ResolvedUser, BackendError> {
    if username.is_empty() || password.is_empty() {
        return Err(AuthError::InvalidCredentials.into());
    }

    match &config.bind {
        BindStrategy::Direct { user_dn_template } => {
            direct_bind(ldap, config, user_dn_template, username, password).await
        }
        BindStrategy::Search {
            base_dn,
            filter_template,
            bind_dn,
            bind_password,
            scope,
        } => {
            search_bind(
                ldap,
                config,
                base_dn,
                filter_template,
                bind_dn,
                bind_password,
                *scope,
                username,
                password,
            )
            .await
        }
    }
}

/// Bind as the templated DN, then read the user's own entry.
async fn direct_bind(
    ldap: &mut Ldap,
    config: &LdapConfig,
    user_dn_template: &str,
    username: &str,
    password: &str,
) -> Result<ResolvedUser, BackendError> {
    let user_dn = build_bind_dn(user_dn_template, username);

    match simple_bind(ldap, config, &user_dn, password).await {
        Ok((0, _)) => {}
        Ok((rc, text)) => {
            tracing::debug!("user bind rejected: rc={} {}", rc, text);
            return Err(AuthError::InvalidCredentials.into());
        }
        Err(e) => {
            tracing::debug!("user bind failed: {}", e);
            return Err(AuthError::InvalidCredentials.into());
        }
    }

    // Some directories hide the entry from the user's own bound connection;
    // the DN alone is still a valid identity source downstream.
    match search_entries(
        ldap,
        config,
        &user_dn,
        Scope::Base,
        "(objectClass=*)",
        vec!["*"],
    )
    .await
    {
        Ok(mut entries) if !entries.is_empty() => Ok(entries.remove(0)),
        Ok(_) => Ok(ResolvedUser::bare(user_dn)),
        Err(e) => {
            tracing::debug!("could not read user entry after bind: {}", e);
            Ok(ResolvedUser::bare(user_dn))
        }
    }
}

/// Service-account bind, user search, rebind as the discovered DN.
#[allow(clippy::too_many_arguments)]
async fn search_bind(
    ldap: &mut Ldap,
    config: &LdapConfig,
    base_dn: &str,
    filter_template: &str,
    bind_dn: &str,
    bind_password: &SecretString,
    scope: SearchScope,
    username: &str,
    password: &str,
) -> Result<ResolvedUser, BackendError> {
    match simple_bind(ldap, config, bind_dn, bind_password.expose_secret()).await {
        Ok((0, _)) => {}
        Ok((rc, text)) => {
            return Err(AuthError::ServiceAccount(format!("result code {}: {}", rc, text)).into());
        }
        Err(e) => return Err(AuthError::ServiceAccount(e).into()),
    }

    let filter = build_user_filter(filter_template, username);
    tracing::debug!("searching {} for {}", base_dn, filter);

    let mut entries =
        search_entries(ldap, config, base_dn, scope.as_scope(), &filter, vec!["*"]).await?;

    // Exactly one entry may match. Zero is an unknown user; more than one
    // means the filter is ambiguous and binding the first hit could
    // authenticate the wrong account.
    if entries.len() != 1 {
        tracing::debug!("user search matched {} entries", entries.len());
        // A miss still pays for one bind so the failure path costs the same
        // as a hit; the result is discarded.
        let decoy_dn = format!("uid={},{}", dn_escape(username), base_dn);
        let _ = simple_bind(ldap, config, &decoy_dn, password).await;
        return Err(AuthError::InvalidCredentials.into());
    }
    let user = entries.remove(0);

    match simple_bind(ldap, config, &user.dn, password).await {
        Ok((0, _)) => Ok(user),
        Ok((rc, text)) => {
            tracing::debug!("user rebind rejected: rc={} {}", rc, text);
            Err(AuthError::InvalidCredentials.into())
        }
        Err(e) => {
            tracing::debug!("user rebind failed: {}", e);
            Err(AuthError::InvalidCredentials.into())
        }
    }
}

/// Re-bind the connection as the service account. A no-op for the direct
/// strategy, which has no service account.
pub(crate) async fn rebind_service(ldap: &mut Ldap, config: &LdapConfig) -> Result<(), AuthError> {
    let BindStrategy::Search {
        bind_dn,
        bind_password,
        ..
    } = &config.bind
    else {
        return Ok(());
    };

    match simple_bind(ldap, config, bind_dn, bind_password.expose_secret()).await {
        Ok((0, _)) => Ok(()),
        Ok((rc, text)) => Err(AuthError::ServiceAccount(format!(
            "result code {}: {}",
            rc, text
        ))),
        Err(e) => Err(AuthError::ServiceAccount(e)),
    }
}

/// One simple bind, returning the server's result code and diagnostic text.
/// Transport-level failures surface in the error variant.
async fn simple_bind(
    ldap: &mut Ldap,
    config: &LdapConfig,
    bind_dn: &str,
    password: &str,
) -> Result<(u32, String), String> {
    tracing::debug!("binding as {}", bind_dn);
    let result = ldap
        .with_timeout(Duration::from_secs(config.request_timeout))
        .simple_bind(bind_dn, password)
        .await
        .map_err(|e| e.to_string())?;
    Ok((result.rc, result.text))
}

/// Substitute the DN-escaped username into a DN template.
pub(crate) fn build_bind_dn(template: &str, username: &str) -> String {
    template.replace(USERNAME_PLACEHOLDER, &dn_escape(username))
}

/// Substitute the filter-escaped username into a filter template.
pub(crate) fn build_user_filter(template: &str, username: &str) -> String {
    template.replace(USERNAME_PLACEHOLDER, &ldap_escape(username))
}
