//! Apply the planned configuration sets over one session

use std::io::Write;

use crate::config::TargetConfig;
use crate::models::{ConfigSet, Feature};
use crate::session::{Connector, SessionError};

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// Nothing was sent: the session could not be opened
    #[error("session setup failed: {0}")]
    Setup(#[source] SessionError),

    /// A set was rejected; sets before it stay applied
    #[error("{feature} configuration failed{}: {source}", applied_suffix(.applied))]
    Send {
        feature: Feature,
        applied: Vec<Feature>,
        #[source]
        source: SessionError,
    },

    /// Every set was applied but the session did not close cleanly
    #[error("disconnect failed: {0}")]
    Disconnect(#[source] SessionError),

    #[error("could not write progress: {0}")]
    Output(#[from] std::io::Error),
}

fn applied_suffix(applied: &[Feature]) -> String {
    if applied.is_empty() {
        " (nothing applied)".to_string()
    } else {
        let names: Vec<&str> = applied.iter().map(Feature::as_str).collect();
        format!(" (already applied: {})", names.join(", "))
    }
}

/// Connect, send every set in order, print a confirmation after each, and
/// disconnect. Stops at the first rejected set without rolling back earlier
/// ones. The session is disconnected on every path once it was opened.
/// Returns the features that were applied.
pub fn apply(
    sets: &[ConfigSet],
    connector: &dyn Connector,
    target: &TargetConfig,
    out: &mut dyn Write,
) -> Result<Vec<Feature>, DispatchError> {
    let mut session = connector
        .connect(target)
        .map_err(DispatchError::Setup)?;

    let mut applied = Vec::with_capacity(sets.len());
    let mut failure = writeln!(out, "Connected to VyOS device.")
        .err()
        .map(DispatchError::Output);

    for set in sets {
        if failure.is_some() {
            break;
        }
        tracing::info!(feature = %set.feature, lines = set.lines.len(), "Sending configuration set");
        match session.send_config_set(&set.lines) {
            Ok(transcript) => {
                tracing::debug!(feature = %set.feature, "Device output:\n{}", transcript);
                applied.push(set.feature);
                if let Err(e) = writeln!(out, "{}", set.confirmation) {
                    failure = Some(DispatchError::Output(e));
                    break;
                }
            }
            Err(source) => {
                tracing::warn!(feature = %set.feature, "Configuration set rejected: {}", source);
                failure = Some(DispatchError::Send {
                    feature: set.feature,
                    applied: applied.clone(),
                    source,
                });
                break;
            }
        }
    }

    let disconnected = session.disconnect();

    if let Some(err) = failure {
        if let Err(e) = disconnected {
            tracing::warn!("Disconnect after failure also failed: {}", e);
        }
        return Err(err);
    }

    disconnected.map_err(DispatchError::Disconnect)?;
    writeln!(out, "Disconnected from VyOS device.")?;
    Ok(applied)
}

/// Print the sets without connecting
pub fn print_plan(sets: &[ConfigSet], out: &mut dyn Write) -> std::io::Result<()> {
    if sets.is_empty() {
        writeln!(out, "Nothing to configure.")?;
        return Ok(());
    }
    for set in sets {
        writeln!(out, "# {}", set.feature)?;
        for line in &set.lines {
            writeln!(out, "{}", line)?;
        }
    }
    Ok(())
}
