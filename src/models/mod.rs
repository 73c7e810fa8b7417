mod request;

pub use request::*;

use serde::Serialize;
use std::fmt;

/// Canonical names of the configuration sets pushed to the router
pub mod feature_name {
    pub const INTERFACE: &str = "interface";
    pub const NAT: &str = "nat";
    pub const DHCP: &str = "dhcp";
    pub const DNS: &str = "dns";
}

/// Feature identifies one configuration set, in the order they are applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Feature {
    Interface,
    Nat,
    Dhcp,
    Dns,
}

impl Feature {
    pub fn as_str(&self) -> &'static str {
        match self {
            Feature::Interface => feature_name::INTERFACE,
            Feature::Nat => feature_name::NAT,
            Feature::Dhcp => feature_name::DHCP,
            Feature::Dns => feature_name::DNS,
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A formatted configuration set ready to be sent as one commit
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigSet {
    pub feature: Feature,
    pub lines: Vec<String>,
    /// Confirmation printed once the device has accepted the set
    pub confirmation: String,
}
