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

//! Search execution against an established connection.

use ldap3::{Ldap, LdapError, Scope, SearchEntry, SearchOptions};
use std::time::Duration;

use crate::config::LdapConfig;
use crate::error::SearchError;
use crate::mapping::ResolvedUser;

/// Run one search and parse the result entries.
///
/// Configured size/time limits are enforced server-side; a limit-exceeded
/// result code fails the whole search rather than returning the truncated
/// set, so a partial response can never match the wrong entry.
pub async fn search_entries(
    ldap: &mut Ldap,
    config: &LdapConfig,
    base_dn: &str,
    scope: Scope,
    filter: &str,
    attrs: Vec<&str>,
) -> Result<Vec<ResolvedUser>, SearchError> {
    let mut options = SearchOptions::new();
    if let Some(limit) = config.size_limit {
        options = options.sizelimit(limit);
    }
    if let Some(limit) = config.time_limit {
        options = options.timelimit(limit);
    }

    let (entries, _res) = ldap
        .with_search_options(options)
        .with_timeout(Duration::from_secs(config.request_timeout))
        .search(base_dn, scope, filter, attrs)
        .await
        .map_err(|e| SearchError::Protocol(e.to_string()))?
        .success()
        .map_err(|e| match e {
            LdapError::LdapResult { result } => result_error(result.rc, &result.text),
            other => SearchError::Protocol(other.to_string()),
        })?;

    Ok(entries
        .into_iter()
        .map(|entry| ResolvedUser::from_entry(SearchEntry::construct(entry)))
        .collect())
}

fn result_error(rc: u32, text: &str) -> SearchError {
    match rc {
        // timeLimitExceeded / sizeLimitExceeded
        3 => SearchError::TimeLimitExceeded,
        4 => SearchError::SizeLimitExceeded,
        _ => SearchError::Protocol(format!("result code {}: {}", rc, text)),
    }
}
