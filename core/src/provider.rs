//! Providers under test and run-mode provider selection

use serde::{Deserialize, Serialize};

/// One of the two endpoints under test
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// The vendor API called directly
    Direct,
    /// The proxying API in front of the vendor
    Proxy,
}

impl Provider {
    /// Identifier string used in config keys and reports
    pub fn id(&self) -> &'static str {
        match self {
            Provider::Direct => "direct",
            Provider::Proxy => "proxy",
        }
    }

    /// Human-readable name
    pub fn display_name(&self) -> &'static str {
        match self {
            Provider::Direct => "Direct API",
            Provider::Proxy => "Proxy API",
        }
    }

    /// Environment variable consulted when the config omits the API key
    pub fn api_key_env(&self) -> &'static str {
        match self {
            Provider::Direct => "DIRECT_API_KEY",
            Provider::Proxy => "PROXY_API_KEY",
        }
    }

    /// All providers, in report order
    pub fn all() -> &'static [Provider] {
        &[Provider::Direct, Provider::Proxy]
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id())
    }
}

/// Benchmark run mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Mode {
    /// Paired requests against both providers
    Comparison,
    /// Load against the proxy only
    Loadtest,
}

impl Mode {
    /// Providers that take part in a run of this mode
    pub fn active_providers(&self) -> &'static [Provider] {
        match self {
            Mode::Comparison => &[Provider::Direct, Provider::Proxy],
            Mode::Loadtest => &[Provider::Proxy],
        }
    }

    /// Whether `provider` takes part in this mode
    pub fn is_active(&self, provider: Provider) -> bool {
        self.active_providers().contains(&provider)
    }

    /// Identifier string
    pub fn id(&self) -> &'static str {
        match self {
            Mode::Comparison => "comparison",
            Mode::Loadtest => "loadtest",
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id())
    }
}

/// Unrecognised mode string
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown mode {0:?} (expected \"comparison\" or \"loadtest\")")]
pub struct UnknownMode(pub String);

impl std::str::FromStr for Mode {
    type Err = UnknownMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "comparison" => Ok(Mode::Comparison),
            "loadtest" => Ok(Mode::Loadtest),
            other => Err(UnknownMode(other.to_string())),
        }
    }
}

impl TryFrom<String> for Mode {
    type Error = UnknownMode;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Mode> for String {
    fn from(mode: Mode) -> Self {
        mode.id().to_string()
    }
}

/// Per-provider slots
///
/// Used wherever something exists once per provider: completers, executors,
/// result collections, statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderMap<T> {
    /// Value for the direct provider
    #[serde(default = "Option::default", skip_serializing_if = "Option::is_none")]
    pub direct: Option<T>,
    /// Value for the proxy provider
    #[serde(default = "Option::default", skip_serializing_if = "Option::is_none")]
    pub proxy: Option<T>,
}

impl<T> Default for ProviderMap<T> {
    fn default() -> Self {
        Self {
            direct: None,
            proxy: None,
        }
    }
}

impl<T> ProviderMap<T> {
    /// Create an empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the value for a provider
    pub fn get(&self, provider: Provider) -> Option<&T> {
        match provider {
            Provider::Direct => self.direct.as_ref(),
            Provider::Proxy => self.proxy.as_ref(),
        }
    }

    /// Get a mutable reference to the value for a provider
    pub fn get_mut(&mut self, provider: Provider) -> Option<&mut T> {
        match provider {
            Provider::Direct => self.direct.as_mut(),
            Provider::Proxy => self.proxy.as_mut(),
        }
    }

    /// Set the value for a provider, returning the previous one
    pub fn insert(&mut self, provider: Provider, value: T) -> Option<T> {
        let slot = match provider {
            Provider::Direct => &mut self.direct,
            Provider::Proxy => &mut self.proxy,
        };
        slot.replace(value)
    }

    /// Builder-style insert
    pub fn with(mut self, provider: Provider, value: T) -> Self {
        self.insert(provider, value);
        self
    }

    /// Whether a value exists for `provider`
    pub fn contains(&self, provider: Provider) -> bool {
        self.get(provider).is_some()
    }

    /// Providers that have a value, in report order
    pub fn providers(&self) -> Vec<Provider> {
        self.iter().map(|(provider, _)| provider).collect()
    }

    /// Iterate present entries in report order
    pub fn iter(&self) -> impl Iterator<Item = (Provider, &T)> {
        Provider::all()
            .iter()
            .filter_map(move |&provider| self.get(provider).map(|value| (provider, value)))
    }

    /// Number of present entries
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Whether no entries are present
    pub fn is_empty(&self) -> bool {
        self.direct.is_none() && self.proxy.is_none()
    }

    /// Transform every present value
    pub fn map<U>(&self, mut f: impl FnMut(Provider, &T) -> U) -> ProviderMap<U> {
        ProviderMap {
            direct: self.direct.as_ref().map(|v| f(Provider::Direct, v)),
            proxy: self.proxy.as_ref().map(|v| f(Provider::Proxy, v)),
        }
    }
}
