use {
    crate::error::FetchError,
    derive_more::{Debug, Display},
    indexmap::IndexMap,
    itertools::Itertools,
    std::net::IpAddr,
    strum_macros::EnumIs,
};

/// What a single provider reported.
///
/// Both variants display as their bare string, so a printed [ResultMap]
/// reads the same whether a provider failed or not.
#[derive(Clone, Eq, PartialEq, Debug, Display, EnumIs)]
pub enum Outcome {
    #[display("{_0}")]
    Value(String),
    #[display("{_0}")]
    Error(String),
}

/// One [Outcome] per provider, keyed by the provider's host name,
/// in the order the providers were given.
#[derive(Clone, Eq, PartialEq, Debug, Default)]
pub struct ResultMap {
    entries: IndexMap<String, Outcome>,
}

// ========================================================================== //

impl Outcome {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Value(s) | Self::Error(s) => s,
        }
    }

    pub fn value(&self) -> Option<&str> {
        match self {
            Self::Value(value) => Some(value),
            Self::Error(_) => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Value(_) => None,
            Self::Error(err) => Some(err),
        }
    }

    /// The reported value as an address, if it is one.
    pub fn ip(&self) -> Option<IpAddr> {
        self.value()?.trim().parse().ok()
    }

    pub fn into_inner(self) -> String {
        match self {
            Self::Value(s) | Self::Error(s) => s,
        }
    }
}

impl From<Result<String, FetchError>> for Outcome {
    fn from(result: Result<String, FetchError>) -> Self {
        match result {
            Ok(value) => Self::Value(value),
            Err(err) => Self::Error(err.to_string()),
        }
    }
}

impl ResultMap {
    /// Records the outcome for `host`. A host seen before keeps its position
    /// and gets its outcome replaced; the previous one is returned.
    pub fn insert(&mut self, host: impl Into<String>, outcome: Outcome) -> Option<Outcome> {
        self.entries.insert(host.into(), outcome)
    }

    pub fn get(&self, host: &str) -> Option<&Outcome> {
        self.entries.get(host)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Outcome)> {
        self.entries.iter().map(|(host, outcome)| (host.as_str(), outcome))
    }

    /// Hosts that reported an address, along with it.
    pub fn values(&self) -> impl Iterator<Item = (&str, &str)> {
        self.iter()
            .filter_map(|(host, outcome)| Some((host, outcome.value()?)))
    }

    /// Hosts that failed, along with the reason.
    pub fn errors(&self) -> impl Iterator<Item = (&str, &str)> {
        self.iter()
            .filter_map(|(host, outcome)| Some((host, outcome.error()?)))
    }

    /// The merged host -> string view, where errors and values look alike.
    pub fn to_display_map(&self) -> IndexMap<String, String> {
        self.iter()
            .map(|(host, outcome)| (host.to_owned(), outcome.to_string()))
            .collect()
    }
}

impl std::fmt::Display for ResultMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let entries = self
            .iter()
            .map(|(host, outcome)| format!("{:?}: {:?}", host, outcome.as_str()))
            .join(", ");
        write!(f, "{{{}}}", entries)
    }
}

impl<H: Into<String>> FromIterator<(H, Outcome)> for ResultMap {
    fn from_iter<I: IntoIterator<Item = (H, Outcome)>>(iter: I) -> Self {
        let mut map = Self::default();
        for (host, outcome) in iter {
            map.insert(host, outcome);
        }
        map
    }
}

impl IntoIterator for ResultMap {
    type Item = (String, Outcome);
    type IntoIter = indexmap::map::IntoIter<String, Outcome>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
