//! HTTP path discovery
//!
//! Requests `<url><word>` for every candidate and reports the words whose
//! status code is one of the configured ones.

use crate::config::{DirOptions, HttpOptions, Mode, Options};
use crate::plugin::{config_line, Plugin, ProbeContext, ProbeResult};
use crate::{BusterError, ProbeError, DEFAULT_USER_AGENT};
use async_trait::async_trait;
use std::collections::BTreeSet;
use uuid::Uuid;

/// Directory and file discovery over HTTP
#[derive(Debug, Clone)]
pub struct DirPlugin {
    http: HttpOptions,
    dir: DirOptions,
    status_codes: BTreeSet<u16>,
    wildcard_forced: bool,
}

impl DirPlugin {
    /// Creates the strategy from validated options
    pub fn new(options: &Options) -> Self {
        Self {
            http: options.http.clone(),
            dir: options.dir.clone(),
            status_codes: options.dir.status_codes.iter().copied().collect(),
            wildcard_forced: options.general.wildcard,
        }
    }

    fn url_for(&self, word: &str) -> String {
        format!("{}{}", self.http.url, word)
    }

    fn status_list(&self) -> String {
        self.status_codes
            .iter()
            .map(|code| code.to_string())
            .collect::<Vec<_>>()
            .join(",")
    }
}

#[async_trait]
impl Plugin for DirPlugin {
    fn name(&self) -> &'static str {
        "directory enumeration"
    }

    async fn pre_run(&self, ctx: &ProbeContext) -> Result<(), BusterError> {
        let cookies = self.http.cookies.as_deref();

        // the base url must answer at all
        ctx.client
            .probe(&self.http.url, cookies)
            .await
            .map_err(|source| BusterError::Unreachable {
                url: self.http.url.clone(),
                source,
            })?;

        let url = self.url_for(&Uuid::new_v4().to_string());
        let response = ctx
            .client
            .probe(&url, cookies)
            .await
            .map_err(|source| BusterError::Unreachable {
                url: url.clone(),
                source,
            })?;

        if self.status_codes.contains(&response.status) {
            if !self.wildcard_forced {
                return Err(BusterError::WildcardUrl {
                    url,
                    status: response.status,
                });
            }
            tracing::warn!("Wildcard response found: {} => {}", url, response.status);
        }

        Ok(())
    }

    async fn process(&self, ctx: &ProbeContext, word: &str) -> Result<ProbeResult, ProbeError> {
        let url = self.url_for(word);
        let response = ctx
            .client
            .probe(&url, self.http.cookies.as_deref())
            .await
            .map_err(|e| ProbeError::new(word, e))?;

        let entity = if self.dir.expanded {
            url
        } else {
            format!("/{}", word)
        };

        Ok(ProbeResult {
            word: word.to_string(),
            entity,
            hit: self.status_codes.contains(&response.status),
            status: Some(response.status),
            size: response.length,
            extra: None,
        })
    }

    fn result_to_string(&self, result: &ProbeResult) -> Option<String> {
        if !result.hit {
            return None;
        }

        let mut line = result.entity.clone();
        if !self.dir.no_status {
            if let Some(status) = result.status {
                line.push_str(&format!(" (Status: {})", status));
            }
        }
        if let Some(size) = result.size {
            line.push_str(&format!(" [Size: {}]", size));
        }
        Some(line)
    }

    fn config_string(&self) -> String {
        let mut out = String::new();
        config_line(&mut out, "Mode", Mode::Dir.as_str());
        config_line(&mut out, "Url/Domain", &self.http.url);
        config_line(&mut out, "Status codes", self.status_list());
        if let Some(proxy) = &self.http.proxy {
            config_line(&mut out, "Proxy", proxy);
        }
        if let Some(cookies) = &self.http.cookies {
            config_line(&mut out, "Cookies", cookies);
        }
        config_line(
            &mut out,
            "User Agent",
            self.http.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT),
        );
        if let Some(username) = &self.http.username {
            config_line(&mut out, "Auth User", username);
        }
        if self.http.insecure_tls {
            config_line(&mut out, "Insecure TLS", "true");
        }
        if self.http.follow_redirect {
            config_line(&mut out, "Follow Redir", "true");
        }
        if self.http.include_length {
            config_line(&mut out, "Show length", "true");
        }
        if self.dir.expanded {
            config_line(&mut out, "Expanded", "true");
        }
        if self.dir.no_status {
            config_line(&mut out, "No status", "true");
        }
        config_line(&mut out, "Timeout", format!("{}s", self.http.timeout));
        out.trim_end().to_string()
    }
}
