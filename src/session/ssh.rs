use std::io::{Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::sync::OnceLock;
use std::time::Duration;

use super::{ConfigSession, Connector, SessionError};
use crate::config::TargetConfig;

/// Device types this connector knows how to drive
pub const SUPPORTED_DEVICE_TYPES: &[&str] = &["vyos"];

/// Output fragments VyOS prints when a set, commit or save goes wrong
const ERROR_MARKERS: &[&str] = &[
    "Invalid command",
    "Set failed",
    "Commit failed",
    "Failed to generate committed config",
    "is not valid",
    "Error:",
];

/// Keyboard-interactive prompt handler that always responds with the password
struct PasswordPrompt {
    password: String,
}

impl ssh2::KeyboardInteractivePrompt for PasswordPrompt {
    fn prompt<'a>(
        &mut self,
        _username: &str,
        _instructions: &str,
        prompts: &[ssh2::Prompt<'a>],
    ) -> Vec<String> {
        prompts.iter().map(|_| self.password.clone()).collect()
    }
}

/// Create an SSH session and authenticate with password + keyboard-interactive.
/// Returns the authenticated Session. Blocking.
pub fn ssh_connect(target: &TargetConfig) -> Result<ssh2::Session, SessionError> {
    let addr = target.address();
    let timeout = Duration::from_secs(target.timeout_secs);
    let connect_err = |reason: String| SessionError::Connect {
        addr: addr.clone(),
        reason,
    };

    let sock_addr = addr
        .to_socket_addrs()
        .map_err(|e| connect_err(format!("invalid address: {}", e)))?
        .next()
        .ok_or_else(|| connect_err("address did not resolve".to_string()))?;

    let tcp = TcpStream::connect_timeout(&sock_addr, timeout)
        .map_err(|e| connect_err(e.to_string()))?;

    if let Err(e) = tcp.set_read_timeout(Some(timeout)) {
        tracing::debug!("Could not set read timeout on {}: {}", addr, e);
    }
    if let Err(e) = tcp.set_write_timeout(Some(timeout)) {
        tracing::debug!("Could not set write timeout on {}: {}", addr, e);
    }

    let mut session = ssh2::Session::new().map_err(SessionError::ssh("session setup"))?;
    session.set_tcp_stream(tcp);
    session.set_timeout(timeout.as_millis().min(u32::MAX as u128) as u32);
    session.handshake().map_err(SessionError::ssh("handshake"))?;

    // Try password auth first
    match session.userauth_password(&target.username, &target.password) {
        Ok(_) if session.authenticated() => return Ok(session),
        _ => {}
    }

    // Keyboard-interactive fallback for images that disable plain password auth
    let mut prompter = PasswordPrompt {
        password: target.password.clone(),
    };
    if let Err(e) = session.userauth_keyboard_interactive(&target.username, &mut prompter) {
        tracing::debug!("Keyboard-interactive auth failed for {}: {}", target.username, e);
    }

    if session.authenticated() {
        Ok(session)
    } else {
        Err(SessionError::Auth {
            user: target.username.clone(),
        })
    }
}

/// Strip terminal escape sequences the VyOS shell mixes into its output
fn strip_ansi(s: &str) -> String {
    static ANSI: OnceLock<Option<regex_lite::Regex>> = OnceLock::new();
    match ANSI.get_or_init(|| regex_lite::Regex::new(r"\x1b\[[0-9;?]*[A-Za-z]").ok()) {
        Some(re) => re.replace_all(s, "").into_owned(),
        None => s.to_string(),
    }
}

/// True when the output ends at a shell prompt: `user@host:~$` in operational
/// mode, `user@host#` in configuration mode.
fn ends_with_prompt(output: &str) -> bool {
    let last = output.trim_end().rsplit('\n').next().unwrap_or("").trim();
    last.contains('@') && (last.ends_with('$') || last.ends_with('#'))
}

/// Decode everything read so far; `Some` once it ends at a prompt.
/// Decoding the whole buffer keeps characters split across reads intact.
fn prompt_output(raw: &[u8]) -> Option<String> {
    let clean = strip_ansi(&String::from_utf8_lossy(raw));
    ends_with_prompt(&clean).then_some(clean)
}

fn in_config_mode(output: &str) -> bool {
    output.trim_end().ends_with('#')
}

/// First VyOS error marker found in the output
fn find_error_marker(output: &str) -> Option<&'static str> {
    ERROR_MARKERS.iter().copied().find(|m| output.contains(m))
}

/// Drop the trailing prompt line
fn without_prompt(output: &str) -> &str {
    match output.trim_end().rsplit_once('\n') {
        Some((body, _prompt)) => body.trim_end(),
        None => "",
    }
}

/// Interactive VyOS shell over a PTY channel
pub struct VyosShell {
    session: ssh2::Session,
    channel: ssh2::Channel,
    save: bool,
}

impl VyosShell {
    /// Open a shell on an authenticated session and prepare the terminal
    pub fn open(session: ssh2::Session, save: bool) -> Result<Self, SessionError> {
        let mut channel = session
            .channel_session()
            .map_err(SessionError::ssh("channel open"))?;
        channel
            .request_pty("vt100", None, Some((512, 24, 0, 0)))
            .map_err(SessionError::ssh("pty request"))?;
        channel.shell().map_err(SessionError::ssh("shell start"))?;

        let mut shell = Self {
            session,
            channel,
            save,
        };
        shell.read_until_prompt()?;
        shell.run("set terminal length 0")?;
        shell.run("set terminal width 512")?;
        Ok(shell)
    }

    fn read_until_prompt(&mut self) -> Result<String, SessionError> {
        let mut raw = Vec::new();
        let mut buf = [0u8; 4096];
        loop {
            let n = self.channel.read(&mut buf)?;
            if n == 0 {
                return Err(SessionError::Closed);
            }
            raw.extend_from_slice(&buf[..n]);
            if let Some(output) = prompt_output(&raw) {
                return Ok(output);
            }
        }
    }

    /// Send one command line and return everything up to the next prompt
    fn run(&mut self, command: &str) -> Result<String, SessionError> {
        tracing::debug!("> {}", command);
        self.channel.write_all(format!("{}\n", command).as_bytes())?;
        self.channel.flush()?;
        self.read_until_prompt()
    }

    /// Like `run`, but device-side errors become `Rejected`
    fn run_checked(&mut self, command: &str) -> Result<String, SessionError> {
        let output = self.run(command)?;
        if let Some(marker) = find_error_marker(&output) {
            tracing::warn!("VyOS rejected '{}' ({})", command, marker);
            return Err(SessionError::Rejected {
                command: command.to_string(),
                output: without_prompt(&output).to_string(),
            });
        }
        Ok(output)
    }

    fn apply_lines(&mut self, lines: &[String]) -> Result<String, SessionError> {
        let mut transcript = String::new();
        for line in lines {
            transcript.push_str(without_prompt(&self.run_checked(line)?));
            transcript.push('\n');
        }
        transcript.push_str(without_prompt(&self.run_checked("commit")?));
        transcript.push('\n');
        if self.save {
            transcript.push_str(without_prompt(&self.run_checked("save")?));
            transcript.push('\n');
        }
        Ok(transcript)
    }
}

impl ConfigSession for VyosShell {
    fn send_config_set(&mut self, lines: &[String]) -> Result<String, SessionError> {
        let entered = self.run("configure")?;
        if !in_config_mode(&entered) {
            return Err(SessionError::Rejected {
                command: "configure".to_string(),
                output: without_prompt(&entered).to_string(),
            });
        }

        match self.apply_lines(lines) {
            Ok(transcript) => {
                self.run("exit")?;
                Ok(transcript)
            }
            Err(e) => {
                // Leave configuration mode without keeping the partial set
                if let Err(exit_err) = self.run("exit discard") {
                    tracing::warn!("Failed to discard pending changes: {}", exit_err);
                }
                Err(e)
            }
        }
    }

    fn disconnect(&mut self) -> Result<(), SessionError> {
        if let Err(e) = self.channel.write_all(b"exit\n") {
            tracing::debug!("Could not send exit before disconnect: {}", e);
        }
        if let Err(e) = self.channel.send_eof() {
            tracing::debug!("Could not send EOF before disconnect: {}", e);
        }
        self.channel.close().map_err(SessionError::ssh("channel close"))?;
        self.session
            .disconnect(None, "Disconnected", None)
            .map_err(SessionError::ssh("disconnect"))
    }
}

/// Production connector: SSH to the target and open a VyOS shell
#[derive(Debug, Default, Clone, Copy)]
pub struct SshConnector;

impl Connector for SshConnector {
    fn connect(&self, target: &TargetConfig) -> Result<Box<dyn ConfigSession>, SessionError> {
        if !SUPPORTED_DEVICE_TYPES.contains(&target.device_type.as_str()) {
            return Err(SessionError::Connect {
                addr: target.address(),
                reason: format!("unsupported device type '{}'", target.device_type),
            });
        }

        tracing::info!("Connecting to {} as {}", target.address(), target.username);
        let session = ssh_connect(target)?;
        let shell = VyosShell::open(session, target.save)?;
        tracing::info!("SSH shell ready on {}", target.address());
        Ok(Box::new(shell))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;

    #[test]
    fn test_prompt_detection() {
        assert!(ends_with_prompt("Welcome to VyOS\nvyos@vyos:~$ "));
        assert!(ends_with_prompt("set terminal length 0\r\nvyos@vyos:~$"));
        assert!(ends_with_prompt("configure\n[edit]\nvyos@vyos# "));
        assert!(!ends_with_prompt("Welcome to VyOS\nvyos@vy"));
        assert!(!ends_with_prompt("set nat source rule 100 outbound-interface eth0"));
        assert!(!ends_with_prompt(""));
    }

    #[test]
    fn test_prompt_output_keeps_split_characters() {
        let echoed = "set interfaces ethernet eth1 description \"Büro\"\r\n[edit]\r\nvyos@vyos# ".as_bytes();
        let split = echoed.iter().position(|&b| b == 0xC3).unwrap() + 1;

        let mut raw = echoed[..split].to_vec();
        assert_eq!(prompt_output(&raw), None);

        raw.extend_from_slice(&echoed[split..]);
        let output = prompt_output(&raw).unwrap();
        assert!(output.contains("\"Büro\""));
        assert!(!output.contains('\u{FFFD}'));
    }

    #[test]
    fn test_config_mode_detection() {
        assert!(in_config_mode("configure\n[edit]\nvyos@vyos# "));
        assert!(!in_config_mode("configure\nvyos@vyos:~$ "));
    }

    #[test]
    fn test_find_error_marker() {
        let out = "set foo bar\n\n  Configuration path: [foo] is not valid\n  Set failed\n\n[edit]\nvyos@vyos# ";
        assert_eq!(find_error_marker(out), Some("Set failed"));
        assert_eq!(find_error_marker("show\n  Invalid command: [show]\nvyos@vyos# "), Some("Invalid command"));
        assert_eq!(find_error_marker("commit\n[edit]\nvyos@vyos# "), None);
        assert_eq!(find_error_marker("No configuration changes to commit\nvyos@vyos# "), None);
    }

    #[test]
    fn test_without_prompt() {
        assert_eq!(without_prompt("commit\n[edit]\nvyos@vyos# "), "commit\n[edit]");
        assert_eq!(without_prompt("vyos@vyos# "), "");
    }

    #[test]
    fn test_strip_ansi() {
        assert_eq!(strip_ansi("\x1b[?2004hvyos@vyos:~$ \x1b[0m"), "vyos@vyos:~$ ");
        assert_eq!(strip_ansi("plain"), "plain");
    }

    #[test]
    fn test_connect_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let target = TargetConfig {
            host: "127.0.0.1".to_string(),
            port,
            timeout_secs: 2,
            ..Default::default()
        };
        let err = SshConnector.connect(&target).err().unwrap();
        assert!(matches!(err, SessionError::Connect { .. }), "{}", err);
    }

    #[test]
    fn test_unsupported_device_type() {
        let target = TargetConfig {
            device_type: "cisco_ios".to_string(),
            ..Default::default()
        };
        let err = SshConnector.connect(&target).err().unwrap();
        assert!(err.to_string().contains("unsupported device type 'cisco_ios'"));
    }
}
