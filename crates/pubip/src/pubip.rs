//! Public IP lookup by asking several "what is my IP" providers at once.
//!
//! Every provider gets its own [Outcome] and one provider's failure
//! never spoils another's answer.

mod error;
mod fetcher;
mod outcome;
mod providers;
mod resolver;

pub use crate::{
    error::FetchError,
    outcome::{Outcome, ResultMap},
    providers::{Extractor, Family, HttpProvider, HttpProviders, KnownProvider, Registry},
    resolver::{Resolver, ResolverBuilder},
};

use anyhow::Result;

/// Queries the given providers with default settings.
pub async fn resolve<P>(providers: P) -> Result<ResultMap>
where
    P: AsRef<[HttpProvider]>,
{
    Resolver::default().resolve(providers).await
}

/// Queries an IPv4 and an IPv6 registry concurrently,
/// each family with its own HTTP client.
pub async fn resolve_both(
    resolver: &Resolver,
    ipv4: &Registry,
    ipv6: &Registry,
) -> Result<(ResultMap, ResultMap)> {
    let (ipv4, ipv6) = futures::join!(resolver.resolve(ipv4), resolver.resolve(ipv6));
    Ok((ipv4?, ipv6?))
}
