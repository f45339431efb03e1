use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::constants::profiles::DEFAULT_PROFILE_NAME;

/// Media services a profile can hold credentials for
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceKind {
    Lidarr,
    Radarr,
    Sonarr,
    Sabnzbd,
    Nzbget,
    Tautulli,
    Overseerr,
    Qbittorrent,
}

impl ServiceKind {
    pub const ALL: [ServiceKind; 8] = [
        ServiceKind::Lidarr,
        ServiceKind::Radarr,
        ServiceKind::Sonarr,
        ServiceKind::Sabnzbd,
        ServiceKind::Nzbget,
        ServiceKind::Tautulli,
        ServiceKind::Overseerr,
        ServiceKind::Qbittorrent,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceKind::Lidarr => "lidarr",
            ServiceKind::Radarr => "radarr",
            ServiceKind::Sonarr => "sonarr",
            ServiceKind::Sabnzbd => "sabnzbd",
            ServiceKind::Nzbget => "nzbget",
            ServiceKind::Tautulli => "tautulli",
            ServiceKind::Overseerr => "overseerr",
            ServiceKind::Qbittorrent => "qbittorrent",
        }
    }

    /// Services that authenticate with username/password instead of an API key
    pub fn uses_basic_auth(&self) -> bool {
        matches!(self, ServiceKind::Nzbget | ServiceKind::Qbittorrent)
    }
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServiceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ServiceKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| format!("unknown service kind '{}'", s))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServiceAuth {
    ApiKey { api_key: String },
    Basic { username: String, password: String },
}

impl ServiceAuth {
    /// Empty credentials of the scheme the service expects
    pub fn empty_for(kind: ServiceKind) -> Self {
        if kind.uses_basic_auth() {
            ServiceAuth::Basic {
                username: String::new(),
                password: String::new(),
            }
        } else {
            ServiceAuth::ApiKey {
                api_key: String::new(),
            }
        }
    }

    pub fn api_key(&self) -> Option<&str> {
        match self {
            ServiceAuth::ApiKey { api_key } => Some(api_key),
            ServiceAuth::Basic { .. } => None,
        }
    }

    pub fn basic(&self) -> Option<(&str, &str)> {
        match self {
            ServiceAuth::Basic { username, password } => Some((username, password)),
            ServiceAuth::ApiKey { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceCredential {
    pub enabled: bool,
    pub host: String,
    pub auth: ServiceAuth,
    #[serde(default)]
    pub custom_headers: BTreeMap<String, String>,
    pub strict_tls: bool,
}

impl ServiceCredential {
    pub fn empty(kind: ServiceKind) -> Self {
        Self {
            enabled: false,
            host: String::new(),
            auth: ServiceAuth::empty_for(kind),
            custom_headers: BTreeMap::new(),
            strict_tls: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WakeOnLan {
    pub enabled: bool,
    pub mac_address: String,
    pub broadcast_address: String,
}

/// One named environment of service credentials
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    pub is_enabled: bool,
    pub services: BTreeMap<ServiceKind, ServiceCredential>,
    #[serde(default)]
    pub wake_on_lan: WakeOnLan,
}

impl Profile {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_enabled: false,
            services: ServiceKind::ALL
                .into_iter()
                .map(|kind| (kind, ServiceCredential::empty(kind)))
                .collect(),
            wake_on_lan: WakeOnLan::default(),
        }
    }

    /// The profile created on first launch
    pub fn default_profile() -> Self {
        let mut profile = Self::new(DEFAULT_PROFILE_NAME);
        profile.is_enabled = true;
        profile
    }

    pub fn service(&self, kind: ServiceKind) -> Option<&ServiceCredential> {
        self.services.get(&kind)
    }

    pub fn service_mut(&mut self, kind: ServiceKind) -> &mut ServiceCredential {
        self.services
            .entry(kind)
            .or_insert_with(|| ServiceCredential::empty(kind))
    }

    /// Fill in any service the map is missing and fix auth schemes that do
    /// not match their service.
    pub fn normalize_services(&mut self) {
        for kind in ServiceKind::ALL {
            let credential = self.service_mut(kind);
            if kind.uses_basic_auth() != credential.auth.basic().is_some() {
                credential.auth = ServiceAuth::empty_for(kind);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_profile_has_every_service() {
        let profile = Profile::new("home");
        assert_eq!(profile.services.len(), ServiceKind::ALL.len());
        assert!(profile
            .service(ServiceKind::Nzbget)
            .unwrap()
            .auth
            .basic()
            .is_some());
        assert!(profile
            .service(ServiceKind::Radarr)
            .unwrap()
            .auth
            .api_key()
            .is_some());
    }

    #[test]
    fn test_service_kind_parse() {
        assert_eq!("sonarr".parse::<ServiceKind>().unwrap(), ServiceKind::Sonarr);
        assert!("plex".parse::<ServiceKind>().is_err());
    }

    #[test]
    fn test_normalize_repairs_missing_and_mismatched() {
        let mut profile = Profile::new("home");
        profile.services.remove(&ServiceKind::Lidarr);
        profile.service_mut(ServiceKind::Nzbget).auth = ServiceAuth::ApiKey {
            api_key: "wrong".into(),
        };

        profile.normalize_services();

        assert!(profile.service(ServiceKind::Lidarr).is_some());
        assert_eq!(
            profile.service(ServiceKind::Nzbget).unwrap().auth,
            ServiceAuth::empty_for(ServiceKind::Nzbget)
        );
    }
}
