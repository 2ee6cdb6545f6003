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

//! Group membership evaluation.

use ldap3::{ldap_escape, Ldap, Scope};

use crate::config::{GroupConfig, GroupMatchMode, LdapConfig, MembershipConvention};
use crate::error::AuthzError;
use crate::mapping::ResolvedUser;
use crate::search::search_entries;

/// Check the authenticated user against the configured authorized groups.
///
/// With the group-lists-members convention this searches the group tree for
/// entries whose member attribute carries the user's DN; with
/// user-lists-groups it inspects the memberOf-style attribute already on the
/// resolved entry and performs no search.
pub async fn authorize(
    ldap: &mut Ldap,
    config: &LdapConfig,
    group_config: &GroupConfig,
    user: &ResolvedUser,
) -> Result<(), AuthzError> {
    let membership = match group_config.convention {
        MembershipConvention::UserListsGroups => user
            .get_attribute_values(&group_config.membership_attribute)
            .to_vec(),
        MembershipConvention::GroupListsMembers => {
            let filter = format!(
                "({}={})",
                group_config.member_attribute,
                ldap_escape(user.dn.as_str())
            );
            tracing::debug!("searching {} for {}", group_config.base_dn, filter);

            let entries = search_entries(
                ldap,
                config,
                &group_config.base_dn,
                Scope::Subtree,
                &filter,
                vec![group_config.name_attribute.as_str()],
            )
            .await?;

            let mut membership = Vec::new();
            for entry in entries {
                for value in entry.get_attribute_values(&group_config.name_attribute) {
                    membership.push(value.clone());
                }
                membership.push(entry.dn);
            }
            membership
        }
    };

    tracing::debug!("user belongs to {} candidate groups", membership.len());
    check_membership(group_config, &membership)
}

/// Decide authorization from the user's memberships. Pure.
pub(crate) fn check_membership(
    group_config: &GroupConfig,
    membership: &[String],
) -> Result<(), AuthzError> {
    let matched = group_config
        .groups
        .iter()
        .filter(|configured| membership.iter().any(|m| group_matches(configured, m)))
        .count();

    let satisfied = match group_config.match_mode {
        GroupMatchMode::Any => matched > 0,
        GroupMatchMode::All => matched == group_config.groups.len(),
    };

    if satisfied {
        return Ok(());
    }
    if !group_config.required {
        tracing::debug!("group check unsatisfied but not required");
        return Ok(());
    }
    Err(AuthzError::NotAuthorized)
}

/// A configured group matches a membership value by full case-insensitive
/// comparison (DNs are case-insensitive), or by the value's leading RDN when
/// the configuration names the group rather than spelling its DN.
fn group_matches(configured: &str, membership: &str) -> bool {
    if configured.eq_ignore_ascii_case(membership) {
        return true;
    }
    rdn_value(membership).is_some_and(|value| value.eq_ignore_ascii_case(configured))
}

/// First RDN value of a DN (`cn=admins,ou=groups,...` -> `admins`).
fn rdn_value(dn: &str) -> Option<&str> {
    dn.split(',').next().and_then(|rdn| rdn.split('=').nth(1))
}
