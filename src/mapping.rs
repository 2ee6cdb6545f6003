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

//! Mapping between directory entries and the identity handed to the caller.

use ldap3::SearchEntry;
use std::collections::HashMap;

use crate::config::AttributeMapping;
use crate::error::IdentityError;

/// A directory entry resolved during one authentication attempt.
///
/// Multi-valued attributes keep the order the server returned. Discarded
/// when the attempt ends.
#[derive(Debug, Clone)]
pub struct ResolvedUser {
    pub dn: String,
    pub attributes: HashMap<String, Vec<String>>,
}

impl ResolvedUser {
    pub(crate) fn from_entry(entry: SearchEntry) -> Self {
        Self {
            dn: entry.dn,
            attributes: entry.attrs,
        }
    }

    /// An entry known only by DN, for directories that hide the user's own
    /// attributes from the user's bound connection.
    pub(crate) fn bare(dn: String) -> Self {
        Self {
            dn,
            attributes: HashMap::new(),
        }
    }

    /// First value of an attribute.
    pub fn get_attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .get(name)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// All values of an attribute, in server order.
    pub fn get_attribute_values(&self, name: &str) -> &[String] {
        self.attributes.get(name).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Derive the identity string returned to the host.
///
/// First non-empty value of the configured attribute, falling back to the
/// entry's DN. Pure and deterministic for unchanged directory data.
pub fn map_identity(
    user: &ResolvedUser,
    mapping: &AttributeMapping,
) -> Result<String, IdentityError> {
    if let Some(value) = user.get_attribute(&mapping.identity_attribute) {
        if !value.is_empty() {
            return Ok(value.to_string());
        }
    }

    if user.dn.is_empty() {
        return Err(IdentityError::Unresolvable);
    }
    Ok(user.dn.clone())
}
