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

//! LDAP connection management: per-candidate establishment, TLS policy,
//! ordered failover.

use ldap3::{Ldap, LdapConnAsync, LdapConnSettings};
use native_tls::{Certificate, TlsConnector};
use std::time::Duration;

use crate::config::{LdapConfig, TlsPolicy};
use crate::error::{ConnectionError, ServerFailure};

/// Establish a connection to the first reachable configured server.
///
/// Candidates are tried strictly in configured order, each once. The caller
/// owns the returned handle for exactly one authentication attempt and must
/// unbind it on every exit path.
pub(crate) async fn connect(config: &LdapConfig) -> Result<Ldap, ConnectionError> {
    let mut attempts = Vec::with_capacity(config.servers.len());

    for server in &config.servers {
        match connect_candidate(config, server).await {
            Ok(ldap) => {
                tracing::debug!("connected to {}", server);
                return Ok(ldap);
            }
            Err(reason) => {
                tracing::warn!("LDAP server {} unusable: {}", server, reason);
                attempts.push(ServerFailure {
                    server: server.clone(),
                    reason,
                });
            }
        }
    }

    Err(ConnectionError::AllServersFailed { attempts })
}

/// Connect to a single server and spawn the connection driver.
///
/// An `ldaps://` URL wraps the socket before any protocol exchange; the
/// StartTLS upgrade happens after a plaintext `ldap://` connect.
async fn connect_candidate(config: &LdapConfig, url: &str) -> Result<Ldap, String> {
    let settings = build_settings(config)?;

    let (conn, ldap) = LdapConnAsync::with_settings(settings, url)
        .await
        .map_err(|e| e.to_string())?;

    tokio::spawn(async move {
        if let Err(e) = conn.drive().await {
            tracing::error!("LDAP connection driver error: {}", e);
        }
    });

    Ok(ldap)
}

fn build_settings(config: &LdapConfig) -> Result<LdapConnSettings, String> {
    let mut settings = LdapConnSettings::new()
        .set_conn_timeout(Duration::from_secs(config.connect_timeout))
        .set_starttls(config.starttls);

    match &config.tls {
        TlsPolicy::Verify => {}
        TlsPolicy::TrustAll => {
            settings = settings.set_no_tls_verify(true);
        }
        TlsPolicy::CaBundle { path } => {
            let pem = std::fs::read(path)
                .map_err(|e| format!("failed to read CA bundle {}: {}", path.display(), e))?;
            let root_cert = Certificate::from_pem(&pem)
                .map_err(|e| format!("invalid CA bundle {}: {}", path.display(), e))?;

            let mut builder = TlsConnector::builder();
            builder.add_root_certificate(root_cert);
            let connector = builder
                .build()
                .map_err(|e| format!("failed to build TLS connector: {}", e))?;
            settings = settings.set_connector(connector);
        }
    }

    Ok(settings)
}
