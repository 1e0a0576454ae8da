//! Endpoint descriptors built from configuration.

use url::Url;

use crate::config::BackendConfig;
use crate::connection::OperatingMode;

/// Where to connect for a given mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointDescriptor {
    pub mode: OperatingMode,
    /// Seed list in preference order. Exactly one entry for `Fallback`.
    pub members: Vec<Url>,
    pub replica_set: Option<String>,
}

impl EndpointDescriptor {
    /// Human readable member list for logs.
    pub fn describe(&self) -> String {
        self.members
            .iter()
            .map(|u| u.as_str().trim_end_matches('/'))
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Descriptors for both modes.
#[derive(Debug, Clone)]
pub struct EndpointSet {
    primary: EndpointDescriptor,
    fallback: EndpointDescriptor,
}

impl EndpointSet {
    pub fn new(primary: EndpointDescriptor, fallback: EndpointDescriptor) -> Self {
        Self { primary, fallback }
    }

    /// Build descriptors from validated configuration.
    pub fn from_config(config: &BackendConfig) -> Result<Self, url::ParseError> {
        let members = config
            .primary_seeds
            .iter()
            .map(|s| parse_address(s))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            primary: EndpointDescriptor {
                mode: OperatingMode::Primary,
                members,
                replica_set: config.replica_set.clone(),
            },
            fallback: EndpointDescriptor {
                mode: OperatingMode::Fallback,
                members: vec![parse_address(&config.fallback_address)?],
                replica_set: None,
            },
        })
    }

    pub fn for_mode(&self, mode: OperatingMode) -> &EndpointDescriptor {
        match mode {
            OperatingMode::Primary => &self.primary,
            OperatingMode::Fallback => &self.fallback,
        }
    }
}

/// Parse `host:port` or a full URL into a base URL.
///
/// The path always ends with `/` so relative check paths join beneath it.
pub fn parse_address(address: &str) -> Result<Url, url::ParseError> {
    let address = address.trim();
    if address.is_empty() {
        return Err(url::ParseError::EmptyHost);
    }
    let mut url = if address.contains("://") {
        Url::parse(address)?
    } else {
        Url::parse(&format!("http://{}", address))?
    };
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}
