//! Remote management session seam
//!
//! The dispatcher only talks to [`ConfigSession`]; [`ssh::SshConnector`] is the
//! production implementation over libssh2.

pub mod ssh;

use crate::config::TargetConfig;

pub use ssh::SshConnector;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("TCP connection to {addr} failed: {reason}")]
    Connect { addr: String, reason: String },

    #[error("SSH authentication failed for {user}: all methods exhausted")]
    Auth { user: String },

    #[error("SSH {stage} failed: {source}")]
    Ssh {
        stage: &'static str,
        #[source]
        source: ssh2::Error,
    },

    #[error("I/O error on SSH channel: {0}")]
    Io(#[from] std::io::Error),

    #[error("SSH channel closed before the device prompt appeared")]
    Closed,

    #[error("device rejected `{command}`: {output}")]
    Rejected { command: String, output: String },
}

impl SessionError {
    pub(crate) fn ssh(stage: &'static str) -> impl FnOnce(ssh2::Error) -> Self {
        move |source| SessionError::Ssh { stage, source }
    }
}

/// One authenticated session able to apply configuration sets
pub trait ConfigSession {
    /// Enter configuration mode, send every line in order, commit, and leave
    /// configuration mode. Returns the device output for the whole set.
    fn send_config_set(&mut self, lines: &[String]) -> Result<String, SessionError>;

    /// Close the session. Called exactly once per session.
    fn disconnect(&mut self) -> Result<(), SessionError>;
}

/// Opens sessions to a target
pub trait Connector {
    fn connect(&self, target: &TargetConfig) -> Result<Box<dyn ConfigSession>, SessionError>;
}
