use serde::Serialize;

/// DhcpScope holds the first and last address handed out by the LAN DHCP server.
/// Both ends are kept as typed by the user; the router validates them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DhcpScope {
    pub start: String,
    pub end: String,
}

impl DhcpScope {
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
        }
    }
}

/// ConfigurationRequest is everything one run will push to the router.
/// Built once from flags and prompts, consumed by the dispatcher.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConfigurationRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interface: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub nat_enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dhcp_scope: Option<DhcpScope>,
    pub dns_enabled: bool,
}

impl ConfigurationRequest {
    /// Interface and description, only when both are set and non-empty
    pub fn interface_description(&self) -> Option<(&str, &str)> {
        match (self.interface.as_deref(), self.description.as_deref()) {
            (Some(iface), Some(desc)) if !iface.is_empty() && !desc.is_empty() => {
                Some((iface, desc))
            }
            _ => None,
        }
    }

    /// True when the request would not change anything on the device
    pub fn is_empty(&self) -> bool {
        self.interface_description().is_none()
            && !self.nat_enabled
            && self.dhcp_scope.is_none()
            && !self.dns_enabled
    }
}
