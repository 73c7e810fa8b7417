//! VyOS configuration-line templates
//!
//! Each feature renders to an ordered list of `set ...` lines. Order matters:
//! the router applies them one after another inside a single commit.

use tera::{Context, Tera};

use crate::models::{ConfigSet, ConfigurationRequest, DhcpScope, Feature};

/// LAN subnet the NAT, DHCP and DNS sets are scoped to
pub const LAN_SUBNET: &str = "192.168.56.0/24";
/// Router address on the LAN, used as the DNS listen address
pub const LAN_ADDRESS: &str = "192.168.56.1";
/// Outbound (WAN) interface for the masquerade rule
pub const WAN_INTERFACE: &str = "eth0";
pub const NAT_RULE: u32 = 100;
pub const DHCP_NETWORK_NAME: &str = "LAN";

const INTERFACE_TEMPLATE: &str =
    r#"set interfaces ethernet {{ interface }} description "{{ description }}""#;

const NAT_TEMPLATE: &str = "\
set nat source rule {{ rule }} outbound-interface {{ outbound }}
set nat source rule {{ rule }} source address {{ subnet }}
set nat source rule {{ rule }} translation address masquerade";

const DHCP_TEMPLATE: &str = "set service dhcp-server shared-network-name {{ network }} \
subnet {{ subnet }} start {{ start }} stop {{ end }}";

const DNS_TEMPLATE: &str = r#"set service dns forwarding cache-size "0"
set service dns forwarding listen-address "{{ listen }}"
set service dns forwarding allow-from "{{ subnet }}""#;

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// A value would spill into a second configuration-line
    #[error("{field} must be a single line, got {value:?}")]
    LineBreak { field: &'static str, value: String },

    #[error("invalid command template: {0}")]
    Template(#[from] tera::Error),
}

type Result<T> = std::result::Result<T, CommandError>;

/// Values are substituted verbatim, so a line break would inject extra commands
fn single_line<'a>(field: &'static str, value: &'a str) -> Result<&'a str> {
    if value.contains(['\n', '\r']) {
        return Err(CommandError::LineBreak {
            field,
            value: value.to_string(),
        });
    }
    Ok(value)
}

/// Render a template with autoescaping off and split it into lines
fn render_lines(template: &str, context: &Context) -> Result<Vec<String>> {
    let rendered = Tera::one_off(template, context, false)?;
    Ok(rendered.lines().map(str::to_string).collect())
}

/// Set the description of an ethernet interface
pub fn interface_description(interface: &str, description: &str) -> Result<Vec<String>> {
    let mut context = Context::new();
    context.insert("interface", single_line("interface", interface)?);
    context.insert("description", single_line("description", description)?);
    render_lines(INTERFACE_TEMPLATE, &context)
}

/// Masquerade LAN traffic leaving the WAN interface
pub fn nat() -> Result<Vec<String>> {
    let mut context = Context::new();
    context.insert("rule", &NAT_RULE);
    context.insert("outbound", WAN_INTERFACE);
    context.insert("subnet", LAN_SUBNET);
    render_lines(NAT_TEMPLATE, &context)
}

pub fn dhcp(scope: &DhcpScope) -> Result<Vec<String>> {
    let mut context = Context::new();
    context.insert("network", DHCP_NETWORK_NAME);
    context.insert("subnet", LAN_SUBNET);
    context.insert("start", single_line("DHCP start address", &scope.start)?);
    context.insert("end", single_line("DHCP end address", &scope.end)?);
    render_lines(DHCP_TEMPLATE, &context)
}

/// DNS forwarding for the LAN with caching disabled
pub fn dns() -> Result<Vec<String>> {
    let mut context = Context::new();
    context.insert("listen", LAN_ADDRESS);
    context.insert("subnet", LAN_SUBNET);
    render_lines(DNS_TEMPLATE, &context)
}

/// Build the configuration sets for a request, in apply order:
/// interface, NAT, DHCP, DNS. Features not requested are left out.
pub fn plan(request: &ConfigurationRequest) -> Result<Vec<ConfigSet>> {
    let mut sets = Vec::new();

    if let Some((interface, description)) = request.interface_description() {
        sets.push(ConfigSet {
            feature: Feature::Interface,
            lines: interface_description(interface, description)?,
            confirmation: format!(
                "Interface {} description set to '{}'",
                interface, description
            ),
        });
    }

    if request.nat_enabled {
        sets.push(ConfigSet {
            feature: Feature::Nat,
            lines: nat()?,
            confirmation: "NAT enabled".to_string(),
        });
    }

    if let Some(scope) = &request.dhcp_scope {
        sets.push(ConfigSet {
            feature: Feature::Dhcp,
            lines: dhcp(scope)?,
            confirmation: format!("DHCP configured with scope {} - {}", scope.start, scope.end),
        });
    }

    if request.dns_enabled {
        sets.push(ConfigSet {
            feature: Feature::Dns,
            lines: dns()?,
            confirmation: "DNS resolution enabled".to_string(),
        });
    }

    Ok(sets)
}
