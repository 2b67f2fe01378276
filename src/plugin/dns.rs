//! DNS subdomain discovery
//!
//! Resolves `<word>.<domain>` for every candidate. Names without records are
//! misses, resolver failures are probe errors.

use crate::config::{parse_resolver, DnsOptions, Mode, Options};
use crate::plugin::{config_line, Plugin, ProbeContext, ProbeResult};
use crate::{BusterError, ClientError, ProbeError};
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::net::IpAddr;
use std::sync::OnceLock;
use trust_dns_resolver::config::{NameServerConfigGroup, ResolverConfig, ResolverOpts};
use trust_dns_resolver::error::ResolveErrorKind;
use trust_dns_resolver::proto::op::ResponseCode;
use trust_dns_resolver::TokioAsyncResolver;
use uuid::Uuid;

/// Outcome of a single lookup
enum Lookup {
    Found(BTreeSet<IpAddr>),
    NotFound,
}

/// Subdomain discovery over DNS
pub struct DnsPlugin {
    resolver: TokioAsyncResolver,
    dns: DnsOptions,
    wildcard_forced: bool,
    /// Addresses a random subdomain resolved to, when wildcards are forced
    wildcard_ips: OnceLock<BTreeSet<IpAddr>>,
}

impl DnsPlugin {
    /// Creates the strategy and its resolver
    ///
    /// Uses the configured resolver if any, the system configuration otherwise.
    pub fn new(options: &Options) -> Result<Self, BusterError> {
        let resolver = build_resolver(&options.dns)?;
        Ok(Self {
            resolver,
            dns: options.dns.clone(),
            wildcard_forced: options.general.wildcard,
            wildcard_ips: OnceLock::new(),
        })
    }

    fn name_for(&self, word: &str) -> String {
        format!("{}.{}", word, self.dns.domain)
    }

    async fn lookup(&self, ctx: &ProbeContext, name: &str) -> Result<Lookup, ClientError> {
        let result = tokio::select! {
            biased;
            _ = ctx.cancel.cancelled() => return Err(ClientError::Cancelled),
            result = self.resolver.lookup_ip(name) => result,
        };

        match result {
            Ok(lookup) => Ok(Lookup::Found(lookup.iter().collect())),
            Err(e) => match e.kind() {
                // SERVFAIL and REFUSED also come back as NoRecordsFound
                ResolveErrorKind::NoRecordsFound { response_code, .. }
                    if is_negative_answer(*response_code) =>
                {
                    Ok(Lookup::NotFound)
                }
                _ => Err(ClientError::Resolve {
                    name: name.to_string(),
                    message: e.to_string(),
                }),
            },
        }
    }
}

/// Builds the resolver used for every lookup
fn build_resolver(options: &DnsOptions) -> Result<TokioAsyncResolver, BusterError> {
    match &options.resolver {
        Some(address) => {
            let address = parse_resolver(address)?;
            let name_servers =
                NameServerConfigGroup::from_ips_clear(&[address.ip()], address.port(), true);
            let mut opts = ResolverOpts::default();
            opts.timeout = options.timeout();
            Ok(TokioAsyncResolver::tokio(
                ResolverConfig::from_parts(None, vec![], name_servers),
                opts,
            ))
        }
        None => {
            let (config, mut opts) = trust_dns_resolver::system_conf::read_system_conf()
                .map_err(|e| BusterError::Resolver(e.to_string()))?;
            opts.timeout = options.timeout();
            Ok(TokioAsyncResolver::tokio(config, opts))
        }
    }
}

/// True for answers that mean the name has no records
fn is_negative_answer(code: ResponseCode) -> bool {
    matches!(code, ResponseCode::NXDomain | ResponseCode::NoError)
}

fn join_ips(ips: &BTreeSet<IpAddr>) -> String {
    ips.iter()
        .map(|ip| ip.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[async_trait]
impl Plugin for DnsPlugin {
    fn name(&self) -> &'static str {
        "DNS enumeration"
    }

    async fn pre_run(&self, ctx: &ProbeContext) -> Result<(), BusterError> {
        match self.lookup(ctx, &self.dns.domain).await {
            Ok(Lookup::Found(_)) => {}
            Ok(Lookup::NotFound) | Err(_) => {
                tracing::warn!("Unable to validate base domain: {}", self.dns.domain);
            }
        }

        let name = self.name_for(&Uuid::new_v4().to_string());
        if let Ok(Lookup::Found(ips)) = self.lookup(ctx, &name).await {
            if !self.wildcard_forced {
                return Err(BusterError::WildcardDns {
                    name,
                    addresses: join_ips(&ips),
                });
            }
            tracing::warn!("Wildcard DNS found. IP address(es): {}", join_ips(&ips));
            let _ = self.wildcard_ips.set(ips);
        }

        Ok(())
    }

    async fn process(&self, ctx: &ProbeContext, word: &str) -> Result<ProbeResult, ProbeError> {
        let name = self.name_for(word);
        let lookup = self
            .lookup(ctx, &name)
            .await
            .map_err(|e| ProbeError::new(word, e))?;

        let (hit, extra) = match lookup {
            Lookup::Found(ips) => {
                let wildcard = self.wildcard_ips.get().is_some_and(|w| *w == ips);
                (!wildcard, Some(join_ips(&ips)))
            }
            Lookup::NotFound => (false, None),
        };

        Ok(ProbeResult {
            word: word.to_string(),
            entity: name,
            hit,
            status: None,
            size: None,
            extra,
        })
    }

    fn result_to_string(&self, result: &ProbeResult) -> Option<String> {
        if !result.hit {
            return None;
        }

        match (&result.extra, self.dns.show_ips) {
            (Some(ips), true) => Some(format!("Found: {} [{}]", result.entity, ips)),
            _ => Some(format!("Found: {}", result.entity)),
        }
    }

    fn config_string(&self) -> String {
        let mut out = String::new();
        config_line(&mut out, "Mode", Mode::Dns.as_str());
        config_line(&mut out, "Url/Domain", &self.dns.domain);
        if let Some(resolver) = &self.dns.resolver {
            config_line(&mut out, "Resolver", resolver);
        }
        if self.dns.show_ips {
            config_line(&mut out, "Show IPs", "true");
        }
        config_line(&mut out, "Timeout", format!("{}s", self.dns.timeout));
        out.trim_end().to_string()
    }
}
