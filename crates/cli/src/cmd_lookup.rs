use {
    crate::{
        Executable,
        args::{self, ENV_PREFIX},
    },
    anyhow::{Error, Result, bail},
    clap::Args as ClapArgs,
    const_format::concatcp,
    humantime::{Duration as DisplayedDuration, parse_duration},
    pubip::{Family, Registry, Resolver},
    std::time::Duration as StdDuration,
    tracing::{debug, info, warn},
};

/// The list of options for the "lookup" command.
#[derive(ClapArgs)]
pub struct Args {
    /// Give up on a provider that takes longer than that (1s or more).
    /// No limit other than the HTTP client's own by default.
    #[arg(
        short = 't',
        long,
        value_name("DURATION"),
        value_parser = Self::parse_flag_timeout,
        env(concatcp!(ENV_PREFIX, "TIMEOUT")),
        hide_env=true,
    )]
    pub(crate) timeout: Option<DisplayedDuration>,

    #[command(flatten)]
    pub(crate) providers: args::OfProviders,
}

impl Args {
    const MIN_TIMEOUT: StdDuration = StdDuration::from_secs(1);

    // Parser for "--timeout" flag.
    fn parse_flag_timeout(s: &str) -> Result<DisplayedDuration> {
        match parse_duration(s).map_err(Error::msg)? {
            v if v >= Self::MIN_TIMEOUT => Ok(v.into()),
            v => {
                let want_at_least: DisplayedDuration = Self::MIN_TIMEOUT.into();
                let have: DisplayedDuration = v.into();
                bail!("must be {} or greater, get: {}", want_at_least, have)
            }
        }
    }

    fn resolver(&self) -> Resolver {
        match self.timeout {
            Some(timeout) => Resolver::builder().timeout(*timeout).build(),
            None => Resolver::new(),
        }
    }

    fn registry(&self, family: Family) -> Registry {
        let registry = Registry::known(family, self.providers.enable.iter().copied());
        if registry.is_empty() {
            warn!(%family, "every provider of the family is disabled");
        }
        registry
    }
}

impl Executable for Args {
    fn setup(mut self) -> Result<Self> {
        self.providers.setup();
        Ok(self)
    }

    // The "main" function for the "lookup" command.
    // Asks IPv4 and IPv6 providers at the same time and reports
    // what each of them said. Failed providers never fail the command.
    async fn run(self, _: &args::Global) -> Result<()> {
        info!("welcome to myip");

        let resolver = self.resolver();
        let ipv4 = self.registry(Family::V4);
        let ipv6 = self.registry(Family::V6);

        debug!(
            ipv4 = ipv4.len(),
            ipv6 = ipv6.len(),
            timeout = %self.timeout.map_or_else(|| "default".to_owned(), |t| t.to_string()),
            "querying providers",
        );

        let (ipv4, ipv6) = pubip::resolve_both(&resolver, &ipv4, &ipv6).await?;

        info!("public IPv4: {}", ipv4);
        info!("public IPv6: {}", ipv6);

        Ok(())
    }
}
