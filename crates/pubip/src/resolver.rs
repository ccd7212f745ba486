use {
    crate::{fetcher, outcome::ResultMap, providers::HttpProvider},
    anyhow::{Context, Result},
    futures::future::join_all,
    reqwest::Client,
    std::{net::SocketAddr, time::Duration},
    tracing::{debug, instrument},
};

/// Resolver fans a list of providers out into concurrent requests
/// and gathers one [Outcome](crate::Outcome) per provider.
///
/// A fresh HTTP client is built for every [Self::resolve] call
/// and dropped once it returns, so two calls never share connections.
#[derive(Clone, Debug, Default)]
pub struct Resolver {
    timeout: Option<Duration>,
    overrides: Vec<(String, SocketAddr)>,
    no_proxy: bool,
}

#[derive(Clone, Debug, Default)]
pub struct ResolverBuilder {
    inner: Resolver,
}

impl Resolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> ResolverBuilder {
        ResolverBuilder::default()
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Queries every provider concurrently and waits for all of them.
    ///
    /// A failing provider never affects the others and never makes this
    /// function fail. The only error is the inability to build the HTTP client.
    /// An empty list yields an empty map without touching the network.
    #[instrument(name = "resolve", skip_all, fields(providers = providers.as_ref().len()))]
    pub async fn resolve<P>(&self, providers: P) -> Result<ResultMap>
    where
        P: AsRef<[HttpProvider]>,
    {
        let providers = providers.as_ref();
        if providers.is_empty() {
            debug!("no providers given, nothing to resolve");
            return Ok(ResultMap::default());
        }

        let client = self.client()?;

        // All requests are started before any is awaited;
        // join_all keeps them in the input order.
        let outcomes = join_all(
            providers
                .iter()
                .map(|provider| fetcher::fetch(&client, provider)),
        )
        .await;

        let results: ResultMap = providers
            .iter()
            .map(HttpProvider::host)
            .zip(outcomes)
            .collect();

        debug!(
            succeeded = results.values().count(),
            failed = results.errors().count(),
            "fan-out has been completed",
        );

        Ok(results)
    }

    fn client(&self) -> Result<Client> {
        let mut builder = Client::builder();

        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        for (host, addr) in &self.overrides {
            builder = builder.resolve(host, *addr);
        }
        if self.no_proxy {
            builder = builder.no_proxy();
        }

        builder
            .build()
            .with_context(|| format!("cannot build HTTP client"))
    }
}

impl ResolverBuilder {
    /// Limits every request, connecting included, to the given duration.
    /// Without it the HTTP client's defaults apply.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.inner.timeout = Some(timeout);
        self
    }

    /// Sends requests for `host` to `addr` instead of resolving it.
    /// The port from the provider's URL is still used.
    pub fn resolve_to(mut self, host: impl Into<String>, addr: SocketAddr) -> Self {
        self.inner.overrides.push((host.into(), addr));
        self
    }

    /// Ignores proxies configured through the environment.
    pub fn no_proxy(mut self) -> Self {
        self.inner.no_proxy = true;
        self
    }

    pub fn build(self) -> Resolver {
        self.inner
    }
}
