//! TXT propagation checks for DNS-01 challenges

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use hickory_resolver::config::{NameServerConfig, ResolverConfig, ResolverOpts};
use hickory_resolver::name_server::TokioConnectionProvider;
use hickory_resolver::proto::xfer::Protocol;
use hickory_resolver::{Resolver, TokioResolver};

use crate::error::DnsError;

/// Source of TXT answers for a name
#[async_trait]
pub trait TxtResolver: Send + Sync {
    /// Every TXT string published at `name`
    async fn lookup_txt(&self, name: &str) -> Result<Vec<String>, DnsError>;
}

/// [`TxtResolver`] backed by hickory, with caching disabled so every poll
/// reaches a name server
pub struct HickoryTxtResolver {
    resolver: TokioResolver,
}

impl HickoryTxtResolver {
    /// Query the given name servers, or the system's when `nameservers` is empty
    pub fn new(nameservers: &[IpAddr]) -> Result<Self, DnsError> {
        let (resolver_config, mut opts) = if nameservers.is_empty() {
            hickory_resolver::system_conf::read_system_conf().map_err(|e| {
                DnsError::Resolve(format!("Failed to read system resolver config: {}", e))
            })?
        } else {
            let mut resolver_config = ResolverConfig::new();
            for ip in nameservers {
                resolver_config.add_name_server(NameServerConfig::new(
                    SocketAddr::new(*ip, 53),
                    Protocol::Udp,
                ));
            }
            (resolver_config, ResolverOpts::default())
        };

        opts.timeout = Duration::from_secs(5);
        opts.attempts = 2;
        opts.cache_size = 0;

        let resolver =
            Resolver::builder_with_config(resolver_config, TokioConnectionProvider::default())
                .with_options(opts)
                .build();

        Ok(Self { resolver })
    }
}

#[async_trait]
impl TxtResolver for HickoryTxtResolver {
    async fn lookup_txt(&self, name: &str) -> Result<Vec<String>, DnsError> {
        // Fully qualified, so search domains are never appended
        let fqdn = if name.ends_with('.') {
            name.to_string()
        } else {
            format!("{}.", name)
        };

        let lookup = self
            .resolver
            .txt_lookup(fqdn.as_str())
            .await
            .map_err(|e| DnsError::Resolve(format!("{}: {}", name, e)))?;

        Ok(lookup
            .iter()
            .map(|txt| {
                txt.txt_data()
                    .iter()
                    .map(|data| String::from_utf8_lossy(data))
                    .collect::<String>()
            })
            .collect())
    }
}

/// Remove the quoting some resolvers leave around TXT strings
pub fn strip_txt_quotes(value: &str) -> &str {
    let value = value.trim();
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}

/// Answers whether a TXT value is visible in DNS yet
#[derive(Clone)]
pub struct PropagationChecker {
    resolver: Arc<dyn TxtResolver>,
}

impl PropagationChecker {
    pub fn new(resolver: Arc<dyn TxtResolver>) -> Self {
        Self { resolver }
    }

    /// `true` only when `expected` is among the TXT strings at `name`
    ///
    /// Lookup failures (NXDOMAIN, empty answers, timeouts, SERVFAIL) are
    /// normal while a record propagates and count as "not yet".
    pub async fn has_propagated(&self, name: &str, expected: &str) -> bool {
        match self.resolver.lookup_txt(name).await {
            Ok(values) => {
                let found = values.iter().any(|v| strip_txt_quotes(v) == expected);
                tracing::debug!(
                    record = %name,
                    answers = values.len(),
                    found,
                    "TXT lookup"
                );
                found
            }
            Err(e) => {
                tracing::debug!(record = %name, error = %e, "TXT lookup failed");
                false
            }
        }
    }
}
