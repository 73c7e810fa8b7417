//! Interactive fallback for anything not given on the command line

use std::io::{self, BufRead, Write};

use crate::cli::Cli;
use crate::models::{ConfigurationRequest, DhcpScope};

/// The only answer treated as "yes" (compared case-insensitively, no trimming)
pub const AFFIRMATIVE: &str = "yes";

/// Source of answers for interactive questions
pub trait Prompter {
    /// Ask a question and return the answer without its line ending
    fn ask(&mut self, question: &str) -> io::Result<String>;

    /// Ask a yes/no question; anything but "yes" is a no
    fn confirm(&mut self, question: &str) -> io::Result<bool> {
        let answer = self.ask(&format!("{} (yes/no): ", question))?;
        Ok(is_affirmative(&answer))
    }
}

pub fn is_affirmative(answer: &str) -> bool {
    answer.eq_ignore_ascii_case(AFFIRMATIVE)
}

/// Prompter over any reader/writer pair; the console uses stdin/stdout
pub struct IoPrompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> IoPrompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl IoPrompter<io::StdinLock<'static>, io::Stdout> {
    pub fn console() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> Prompter for IoPrompter<R, W> {
    fn ask(&mut self, question: &str) -> io::Result<String> {
        write!(self.output, "{}", question)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("input closed while waiting for: {}", question.trim_end()),
            ));
        }
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }
}

/// Build the request from flags, prompting for whatever is missing.
/// Each field is asked for at most once.
pub fn collect_request(cli: &Cli, prompter: &mut dyn Prompter) -> io::Result<ConfigurationRequest> {
    let interface = match cli.interface.clone() {
        Some(iface) => iface,
        None => loop {
            let answer = prompter.ask("Enter interface: ")?;
            let answer = answer.trim();
            if !answer.is_empty() {
                break answer.to_string();
            }
        },
    };

    let description = match cli.description.clone() {
        Some(desc) => Some(desc),
        None if prompter.confirm("Do you want to provide a description for the interface?")? => {
            Some(prompter.ask("Enter description for the interface: ")?)
        }
        None => None,
    };

    let nat_enabled = cli.enable_nat || prompter.confirm("Do you want to enable NAT?")?;

    let dhcp_scope = match cli.dhcp_scope.as_deref() {
        Some([start, end]) => Some(DhcpScope::new(start.as_str(), end.as_str())),
        Some(other) => {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("--dhcp-scope takes exactly 2 addresses, got {}", other.len()),
            ))
        }
        None if prompter.confirm("Do you want to configure DHCP scope?")? => {
            let start = prompter.ask("Enter DHCP start IP: ")?;
            let end = prompter.ask("Enter DHCP end IP: ")?;
            Some(DhcpScope::new(start, end))
        }
        None => None,
    };

    let dns_enabled =
        cli.enable_dns || prompter.confirm("Do you want to enable DNS resolution?")?;

    let request = ConfigurationRequest {
        interface: Some(interface),
        description,
        nat_enabled,
        dhcp_scope,
        dns_enabled,
    };
    tracing::debug!(?request, "Configuration request collected");
    Ok(request)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::VecDeque;

    /// Replays canned answers and records every question asked
    pub(crate) struct ScriptedPrompter {
        answers: VecDeque<String>,
        pub asked: Vec<String>,
    }

    impl ScriptedPrompter {
        pub(crate) fn new(answers: &[&str]) -> Self {
            Self {
                answers: answers.iter().map(|a| a.to_string()).collect(),
                asked: Vec::new(),
            }
        }
    }

    impl Prompter for ScriptedPrompter {
        fn ask(&mut self, question: &str) -> io::Result<String> {
            self.asked.push(question.to_string());
            self.answers
                .pop_front()
                .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "no more answers"))
        }
    }

    pub(crate) fn all_flags() -> Cli {
        Cli {
            interface: Some("eth1".to_string()),
            description: Some("WAN link".to_string()),
            enable_nat: true,
            dhcp_scope: Some(vec!["192.168.56.100".to_string(), "192.168.56.200".to_string()]),
            enable_dns: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_all_flags_never_prompt() {
        let mut prompter = ScriptedPrompter::new(&[]);
        let req = collect_request(&all_flags(), &mut prompter).unwrap();

        assert!(prompter.asked.is_empty());
        assert_eq!(req.interface.as_deref(), Some("eth1"));
        assert_eq!(req.description.as_deref(), Some("WAN link"));
        assert!(req.nat_enabled);
        assert_eq!(req.dhcp_scope, Some(DhcpScope::new("192.168.56.100", "192.168.56.200")));
        assert!(req.dns_enabled);
    }

    #[test]
    fn test_no_flags_prompts_everything_once() {
        let mut prompter = ScriptedPrompter::new(&[
            "eth2",
            "yes",
            "LAN side",
            "YES",
            "Yes",
            "10.0.0.10",
            "10.0.0.20",
            "yEs",
        ]);
        let req = collect_request(&Cli::default(), &mut prompter).unwrap();

        assert_eq!(prompter.asked.len(), 8);
        assert_eq!(req.interface.as_deref(), Some("eth2"));
        assert_eq!(req.description.as_deref(), Some("LAN side"));
        assert!(req.nat_enabled);
        assert_eq!(req.dhcp_scope, Some(DhcpScope::new("10.0.0.10", "10.0.0.20")));
        assert!(req.dns_enabled);
    }

    #[test]
    fn test_anything_but_yes_is_no() {
        for answer in ["", "y", "no", "yes please", "1"] {
            let mut prompter = ScriptedPrompter::new(&["eth1", answer, answer, answer, answer]);
            let req = collect_request(&Cli::default(), &mut prompter).unwrap();

            assert_eq!(prompter.asked.len(), 5, "answer {:?}", answer);
            assert_eq!(req.description, None);
            assert!(!req.nat_enabled);
            assert_eq!(req.dhcp_scope, None);
            assert!(!req.dns_enabled);
        }
    }

    #[test]
    fn test_padded_yes_is_no() {
        for answer in [" yes", "yes ", "yes\t", " YES "] {
            assert!(!is_affirmative(answer), "answer {:?}", answer);
        }
        assert!(is_affirmative("YES"));

        let mut prompter = ScriptedPrompter::new(&["eth1", "no", " yes ", "no", "yes\t"]);
        let req = collect_request(&Cli::default(), &mut prompter).unwrap();
        assert!(!req.nat_enabled);
        assert!(!req.dns_enabled);
    }

    #[test]
    fn test_interface_reprompts_until_non_empty() {
        let mut prompter = ScriptedPrompter::new(&["", "   ", "eth0", "no", "no", "no", "no"]);
        let req = collect_request(&Cli::default(), &mut prompter).unwrap();

        assert_eq!(req.interface.as_deref(), Some("eth0"));
        assert_eq!(
            prompter.asked.iter().filter(|q| q.as_str() == "Enter interface: ").count(),
            3
        );
    }

    #[test]
    fn test_dhcp_addresses_are_not_validated() {
        let mut prompter =
            ScriptedPrompter::new(&["eth1", "no", "no", "yes", "not-an-ip", "999.1.1.1", "no"]);
        let req = collect_request(&Cli::default(), &mut prompter).unwrap();

        assert_eq!(req.dhcp_scope, Some(DhcpScope::new("not-an-ip", "999.1.1.1")));
    }

    #[test]
    fn test_eof_is_an_error() {
        let mut prompter = ScriptedPrompter::new(&["eth1"]);
        let err = collect_request(&Cli::default(), &mut prompter).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn test_io_prompter_reads_lines() {
        let input = b"eth1\r\nyes\n".as_slice();
        let mut output = Vec::new();
        let mut prompter = IoPrompter::new(input, &mut output);

        assert_eq!(prompter.ask("Enter interface: ").unwrap(), "eth1");
        assert!(prompter.confirm("Do you want to enable NAT?").unwrap());
        let err = prompter.ask("Enter DHCP start IP: ").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);

        drop(prompter);
        let written = String::from_utf8(output).unwrap();
        assert!(written.starts_with("Enter interface: Do you want to enable NAT? (yes/no): "));
    }
}
