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

use ldap_auth_backend::{AuthzError, BackendError, LdapBackend};

use super::common::*;

#[tokio::test]
#[ignore = "requires LDAP server on localhost:1389"]
async fn member_of_an_authorized_group_is_accepted() {
    if !ldap_available().await {
        eprintln!("LDAP server not available, skipping test");
        return;
    }

    let mut config = search_config(vec![LDAP_URL.to_string()]);
    config.group = Some(group_config(vec![
        "cn=developers,ou=Groups,dc=example,dc=org".to_string(),
    ]));

    let backend = LdapBackend::new(config).unwrap();
    let identity = backend
        .authenticate_and_authorize("alice", "password123")
        .await
        .expect("group member should be authorized");
    assert_eq!(identity, "alice");
}

#[tokio::test]
#[ignore = "requires LDAP server on localhost:1389"]
async fn non_member_is_denied_with_not_authorized() {
    if !ldap_available().await {
        eprintln!("LDAP server not available, skipping test");
        return;
    }

    let mut config = search_config(vec![LDAP_URL.to_string()]);
    config.group = Some(group_config(vec![
        "cn=no-such-group,ou=Groups,dc=example,dc=org".to_string(),
    ]));

    let backend = LdapBackend::new(config).unwrap();
    let result = backend
        .authenticate_and_authorize("alice", "password123")
        .await;
    assert!(matches!(
        result,
        Err(BackendError::Authz(AuthzError::NotAuthorized))
    ));
}

#[tokio::test]
#[ignore = "requires LDAP server on localhost:1389"]
async fn optional_group_check_never_denies() {
    if !ldap_available().await {
        eprintln!("LDAP server not available, skipping test");
        return;
    }

    let mut config = search_config(vec![LDAP_URL.to_string()]);
    let mut groups = group_config(vec![
        "cn=no-such-group,ou=Groups,dc=example,dc=org".to_string(),
    ]);
    groups.required = false;
    config.group = Some(groups);

    let backend = LdapBackend::new(config).unwrap();
    let identity = backend
        .authenticate_and_authorize("alice", "password123")
        .await
        .expect("optional group check must not deny");
    assert_eq!(identity, "alice");
}

#[tokio::test]
#[ignore = "requires LDAP server on localhost:1389"]
async fn group_names_match_without_spelling_the_dn() {
    if !ldap_available().await {
        eprintln!("LDAP server not available, skipping test");
        return;
    }

    let mut config = search_config(vec![LDAP_URL.to_string()]);
    config.group = Some(group_config(vec!["developers".to_string()]));

    let backend = LdapBackend::new(config).unwrap();
    let identity = backend
        .authenticate_and_authorize("alice", "password123")
        .await
        .expect("group configured by name should match");
    assert_eq!(identity, "alice");
}
