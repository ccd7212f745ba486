use {
    crate::error::FetchError,
    bytes::Bytes,
    derive_more::{Debug, Display},
    reqwest::Url,
    serde_json::{Value as Json, from_slice as unjson},
    smallvec::SmallVec,
    strum::{EnumCount, VariantArray},
    strum_macros::{
        AsRefStr, EnumCount, EnumIs, EnumIter, EnumString, IntoStaticStr, VariantArray,
        VariantNames,
    },
};

/// The address family a provider is reachable over.
#[derive(Clone, Copy, Eq, PartialEq, Hash, Debug, Display, EnumIs)]
pub enum Family {
    #[display("IPv4")]
    V4,
    #[display("IPv6")]
    V6,
}

/// The way a provider's response body is turned into a bare IP address.
#[derive(Clone, Copy, Eq, PartialEq, Debug, Default, EnumIs)]
pub enum Extractor {
    /// Decode the body as a JSON object and take the named top-level field.
    JsonField(&'static str),
    /// Use the body text verbatim.
    #[default]
    RawText,
}

/// A single "what is my IP" endpoint: where to send the GET
/// and how to read the answer.
///
/// URLs are not validated here. A malformed one is reported
/// as a per-provider error when the request is made.
#[derive(Clone, Eq, PartialEq, Debug, Display)]
#[display("{}", url)]
pub struct HttpProvider {
    url: String,
    extractor: Extractor,
}

pub type HttpProviders = SmallVec<[HttpProvider; KnownProvider::COUNT]>;

/// The built-in providers.
#[derive(
    Clone,
    Copy,
    Eq,
    PartialEq,
    Hash,
    Debug,
    Display,
    EnumIter,
    EnumCount,
    VariantArray,
    VariantNames,
    EnumString,
    IntoStaticStr,
    AsRefStr,
)]
pub enum KnownProvider {
    #[display("api.ipify.org")]
    #[strum(serialize = "ipify")]
    Ipify,
    #[display("api.bigdatacloud.net")]
    #[strum(serialize = "bigdatacloud")]
    BigDataCloud,
    #[display("ipv4.monipv6.org")]
    #[strum(serialize = "monipv6-v4")]
    MonIpv6V4,
    #[display("ipinfo.io")]
    #[strum(serialize = "ipinfo")]
    IpInfo,
    #[display("ipv6.monipv6.org")]
    #[strum(serialize = "monipv6-v6")]
    MonIpv6V6,
    #[display("api-bdc.net")]
    #[strum(serialize = "bdc")]
    Bdc,
    #[display("ifconfig.me")]
    #[strum(serialize = "ifconfig")]
    IfConfig,
}

/// An ordered, immutable list of providers queried together.
#[derive(Clone, Eq, PartialEq, Debug, Default)]
pub struct Registry {
    providers: HttpProviders,
}

// ========================================================================== //

impl Extractor {
    /// Turns a response body into the IP string it carries.
    pub fn decode(&self, body: &[u8]) -> Result<String, FetchError> {
        match self {
            Self::JsonField(field) => decode_json_field(field, body),
            Self::RawText => Ok(String::from_utf8_lossy(body).into_owned()),
        }
    }
}

impl HttpProvider {
    pub fn new(url: impl Into<String>, extractor: Extractor) -> Self {
        Self {
            url: url.into(),
            extractor,
        }
    }

    /// A provider answering with a JSON object holding the address in `field`.
    pub fn json(url: impl Into<String>, field: &'static str) -> Self {
        Self::new(url, Extractor::JsonField(field))
    }

    /// A provider answering with the bare address as plain text.
    pub fn raw(url: impl Into<String>) -> Self {
        Self::new(url, Extractor::RawText)
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn extractor(&self) -> Extractor {
        self.extractor
    }

    /// The key this provider is reported under: the URL's host name,
    /// or the URL itself if it cannot be parsed.
    pub fn host(&self) -> String {
        Url::parse(&self.url)
            .ok()
            .and_then(|url| url.host_str().map(str::to_owned))
            .unwrap_or_else(|| self.url.clone())
    }

    pub fn response_decode(&self, body: Bytes) -> Result<String, FetchError> {
        self.extractor.decode(&body)
    }
}

impl KnownProvider {
    pub const fn request_uri(&self) -> &'static str {
        match self {
            Self::Ipify => "https://api.ipify.org?format=json",
            Self::BigDataCloud => "https://api.bigdatacloud.net/data/client-ip",
            Self::MonIpv6V4 => "https://ipv4.monipv6.org/json",
            Self::IpInfo => "https://ipinfo.io/json",
            Self::MonIpv6V6 => "https://ipv6.monipv6.org/json",
            Self::Bdc => "https://api-bdc.net/data/client-ip",
            Self::IfConfig => "https://ifconfig.me/ip",
        }
    }

    pub const fn extractor(&self) -> Extractor {
        match self {
            Self::Ipify | Self::IpInfo => Extractor::JsonField("ip"),
            Self::BigDataCloud | Self::Bdc => Extractor::JsonField("ipString"),
            Self::MonIpv6V4 | Self::MonIpv6V6 => Extractor::JsonField("ipaddress"),
            Self::IfConfig => Extractor::RawText,
        }
    }

    pub const fn family(&self) -> Family {
        match self {
            Self::Ipify | Self::BigDataCloud | Self::MonIpv6V4 | Self::IpInfo => Family::V4,
            Self::MonIpv6V6 | Self::Bdc | Self::IfConfig => Family::V6,
        }
    }

    pub fn descriptor(&self) -> HttpProvider {
        HttpProvider::new(self.request_uri(), self.extractor())
    }
}

impl From<KnownProvider> for HttpProvider {
    fn from(known: KnownProvider) -> Self {
        known.descriptor()
    }
}

impl Registry {
    pub fn new<P>(providers: P) -> Self
    where
        P: IntoIterator,
        P::Item: Into<HttpProvider>,
    {
        Self {
            providers: providers.into_iter().map(Into::into).collect(),
        }
    }

    /// Builds the registry of the given family out of the `enabled` built-in
    /// providers, keeping the built-in order.
    pub fn known<P>(family: Family, enabled: P) -> Self
    where
        P: IntoIterator<Item = KnownProvider>,
    {
        let enabled: SmallVec<[KnownProvider; KnownProvider::COUNT]> =
            enabled.into_iter().collect();

        Self::new(
            KnownProvider::VARIANTS
                .iter()
                .filter(|known| known.family() == family && enabled.contains(known))
                .copied(),
        )
    }

    /// Every built-in IPv4 provider.
    pub fn ipv4() -> Self {
        Self::known(Family::V4, KnownProvider::VARIANTS.iter().copied())
    }

    /// Every built-in IPv6 provider.
    pub fn ipv6() -> Self {
        Self::known(Family::V6, KnownProvider::VARIANTS.iter().copied())
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &HttpProvider> {
        self.providers.iter()
    }
}

impl AsRef<[HttpProvider]> for Registry {
    fn as_ref(&self) -> &[HttpProvider] {
        &self.providers
    }
}

impl FromIterator<HttpProvider> for Registry {
    fn from_iter<I: IntoIterator<Item = HttpProvider>>(iter: I) -> Self {
        Self::new(iter)
    }
}

fn decode_json_field(field: &str, body: &[u8]) -> Result<String, FetchError> {
    let json: Json = unjson(body).map_err(|source| FetchError::Decode {
        body: String::from_utf8_lossy(body).into_owned(),
        source,
    })?;

    let object = match json {
        Json::Object(object) => object,
        other => {
            return Err(FetchError::Extract(format!(
                "expected a JSON object, got: {}",
                other
            )));
        }
    };

    match object.get(field) {
        Some(Json::String(value)) => Ok(value.clone()),
        Some(value @ (Json::Number(_) | Json::Bool(_))) => Ok(value.to_string()),
        Some(Json::Null) | None => Err(FetchError::Extract(format!("missing field `{}`", field))),
        Some(value) => Err(FetchError::Extract(format!(
            "field `{}` is not a scalar: {}",
            field, value
        ))),
    }
}
