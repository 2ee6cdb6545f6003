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

use ldap_auth_backend::config::{
    AttributeMapping, BindStrategy, GroupConfig, GroupMatchMode, LdapConfig,
    MembershipConvention, SearchScope, TlsPolicy,
};

/// Test directory on localhost: users under `ou=Users`, groups under
/// `ou=Groups`, admin `cn=admin,dc=example,dc=org`.
pub const LDAP_URL: &str = "ldap://localhost:1389";

/// Direct-bind configuration against the test directory.
pub fn direct_config(servers: Vec<String>) -> LdapConfig {
    LdapConfig {
        servers,
        starttls: false,
        tls: TlsPolicy::Verify,
        connect_timeout: 2,
        request_timeout: 5,
        size_limit: None,
        time_limit: None,
        bind: BindStrategy::Direct {
            user_dn_template: "cn={username},ou=Users,dc=example,dc=org".to_string(),
        },
        group: None,
        mapping: AttributeMapping {
            identity_attribute: "cn".to_string(),
        },
    }
}

/// Search-bind configuration using the test directory's admin account.
pub fn search_config(servers: Vec<String>) -> LdapConfig {
    LdapConfig {
        bind: BindStrategy::Search {
            base_dn: "ou=Users,dc=example,dc=org".to_string(),
            filter_template: "(cn={username})".to_string(),
            bind_dn: "cn=admin,dc=example,dc=org".to_string(),
            bind_password: "admin".into(),
            scope: SearchScope::Subtree,
        },
        ..direct_config(servers)
    }
}

/// Group authorization over the test directory's group tree.
pub fn group_config(groups: Vec<String>) -> GroupConfig {
    GroupConfig {
        base_dn: "ou=Groups,dc=example,dc=org".to_string(),
        groups,
        convention: MembershipConvention::GroupListsMembers,
        member_attribute: "member".to_string(),
        membership_attribute: "memberOf".to_string(),
        name_attribute: "cn".to_string(),
        match_mode: GroupMatchMode::Any,
        required: true,
    }
}

/// Check if the test LDAP server is reachable.
pub async fn ldap_available() -> bool {
    tokio::net::TcpStream::connect("127.0.0.1:1389")
        .await
        .is_ok()
}
