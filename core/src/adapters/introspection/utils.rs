//! Parsers for process and socket table output.
//!
//! Kept platform-independent so every parser is tested on every host.

use std::collections::BTreeSet;
use std::process::Output;

use regex::Regex;

use crate::error::{Error, Result};

pub struct Utils;

impl Utils {
    /// Stdout of a finished command, or `CommandFailed` if it exited non-zero.
    ///
    /// A failing `ss` or `netstat` prints nothing; that must never parse as
    /// an empty socket table.
    pub fn successful_stdout(program: &str, output: Output) -> Result<Vec<u8>> {
        if !output.status.success() {
            return Err(Error::CommandFailed(format!(
                "{} exited with {}",
                program, output.status
            )));
        }
        Ok(output.stdout)
    }

    /// Parse an address:port string.
    ///
    /// Handles multiple address formats:
    /// - IPv4: "127.0.0.1:3000" or "*:8080"
    /// - IPv6: "\[::1]:3000" or "\[fe80::1]:8080"
    /// - Scoped: "192.168.1.5%wlan0:5000"
    pub fn parse_address(address: &str) -> Option<(String, u16)> {
        if address.starts_with('[') {
            // IPv6 format: [::1]:3000
            let bracket_end = address.find(']')?;
            if bracket_end + 1 >= address.len() || address.as_bytes()[bracket_end + 1] != b':' {
                return None;
            }
            let addr = &address[..=bracket_end];
            let port_str = &address[bracket_end + 2..];
            let port: u16 = port_str.parse().ok()?;
            Some((addr.to_string(), port))
        } else {
            // IPv4 format: 127.0.0.1:3000 or *:8080
            let last_colon = address.rfind(':')?;
            let addr = &address[..last_colon];
            let port_str = &address[last_colon + 1..];
            let port: u16 = port_str.parse().ok()?;
            let addr = if addr.is_empty() { "*" } else { addr };
            Some((addr.to_string(), port))
        }
    }

    /// Compare process names, ignoring case, directories and a `.exe` suffix.
    pub fn process_name_matches(candidate: &str, target: &str) -> bool {
        fn normalize(name: &str) -> &str {
            let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
            match base.len().checked_sub(4) {
                Some(cut) if base.is_char_boundary(cut) && base[cut..].eq_ignore_ascii_case(".exe") => {
                    &base[..cut]
                }
                _ => base,
            }
        }

        let candidate = normalize(candidate.trim());
        !candidate.is_empty() && candidate.eq_ignore_ascii_case(normalize(target.trim()))
    }

    /// Parse `ps -axo pid,comm` output into the pids running `name`.
    ///
    /// Header lines are skipped because their first column is not numeric.
    pub fn parse_ps_output(output: &str, name: &str) -> Vec<u32> {
        let mut pids = BTreeSet::new();

        for line in output.lines() {
            let trimmed = line.trim();
            let mut parts = trimmed.splitn(2, char::is_whitespace);

            let pid: u32 = match parts.next().and_then(|s| s.parse().ok()) {
                Some(p) => p,
                None => continue,
            };
            let command = match parts.next() {
                Some(s) => s.trim(),
                None => continue,
            };

            if Self::process_name_matches(command, name) {
                pids.insert(pid);
            }
        }

        pids.into_iter().collect()
    }

    /// Parse `tasklist /FO CSV /NH` output into the pids running `name`.
    ///
    /// Example output:
    /// ```text
    /// "System Idle Process","0","Services","0","8 K"
    /// "RISK.exe","5432","Console","1","45,000 K"
    /// ```
    pub fn parse_tasklist_output(output: &str, name: &str) -> Vec<u32> {
        let mut pids = BTreeSet::new();

        for line in output.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with("\"Image Name\"") {
                continue;
            }

            let fields: Vec<&str> = line.trim_matches('"').split("\",\"").collect();
            if fields.len() < 2 {
                continue;
            }

            let pid: u32 = match fields[1].parse() {
                Ok(p) => p,
                Err(_) => continue,
            };

            if Self::process_name_matches(fields[0], name) {
                pids.insert(pid);
            }
        }

        pids.into_iter().collect()
    }

    /// Parse `ss -Huanp` output into the UDP ports owned by `pid`.
    ///
    /// Example line:
    /// ```text
    /// UNCONN 0      0        0.0.0.0:41234      0.0.0.0:*    users:(("RISK.exe",pid=4242,fd=55))
    /// ```
    pub fn parse_ss_udp_output(output: &str, pid: u32) -> Vec<u16> {
        let regex = Regex::new(r"pid=(\d+)").expect("valid pid regex");
        let mut ports = BTreeSet::new();

        for line in output.lines() {
            let components: Vec<&str> = line.split_whitespace().collect();
            if components.len() < 6 {
                continue;
            }

            let process = components[5..].join(" ");
            let owned = regex
                .captures_iter(&process)
                .filter_map(|caps| caps[1].parse::<u32>().ok())
                .any(|found| found == pid);
            if !owned {
                continue;
            }

            if let Some((_, port)) = Self::parse_address(components[3]) {
                ports.insert(port);
            }
        }

        ports.into_iter().collect()
    }

    /// Parse `lsof -nP -a -p PID -iUDP` output into local UDP ports.
    ///
    /// Connected sockets print `local->remote`; only the local side counts.
    pub fn parse_lsof_udp_output(output: &str) -> Vec<u16> {
        let mut ports = BTreeSet::new();

        for line in output.lines().skip(1) {
            let components: Vec<&str> = line.split_whitespace().collect();
            if components.len() < 9 {
                continue;
            }

            let Some(name) = components[8..]
                .iter()
                .rev()
                .find(|c| c.contains(':') && !c.starts_with("0x") && !c.starts_with("0t"))
            else {
                continue;
            };

            let local = name.split("->").next().unwrap_or(name);
            if let Some((_, port)) = Self::parse_address(local) {
                ports.insert(port);
            }
        }

        ports.into_iter().collect()
    }

    /// Parse `netstat -ano -p udp` output into the UDP ports owned by `pid`.
    ///
    /// Example output:
    /// ```text
    ///   Proto  Local Address          Foreign Address        State           PID
    ///   UDP    0.0.0.0:5353           *:*                                    2468
    ///   UDP    [::]:50000             *:*                                    5432
    /// ```
    pub fn parse_netstat_udp_output(output: &str, pid: u32) -> Vec<u16> {
        let mut ports = BTreeSet::new();

        for line in output.lines() {
            let line = line.trim();
            if !line.get(..3).is_some_and(|p| p.eq_ignore_ascii_case("UDP")) {
                continue;
            }

            let tokens: Vec<&str> = line.split_whitespace().collect();
            if tokens.len() < 4 {
                continue;
            }

            let found: u32 = match tokens[tokens.len() - 1].parse() {
                Ok(p) => p,
                Err(_) => continue,
            };
            if found != pid {
                continue;
            }

            if let Some((_, port)) = Self::parse_address(tokens[1]) {
                ports.insert(port);
            }
        }

        ports.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    fn output(raw_status: i32, stdout: &str) -> Output {
        use std::os::unix::process::ExitStatusExt;
        Output {
            status: std::process::ExitStatus::from_raw(raw_status),
            stdout: stdout.as_bytes().to_vec(),
            stderr: Vec::new(),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_successful_stdout_passes_output() {
        let stdout = Utils::successful_stdout("ss", output(0, "UNCONN 0 0")).unwrap();
        assert_eq!(stdout, b"UNCONN 0 0");
    }

    #[cfg(unix)]
    #[test]
    fn test_non_zero_exit_is_command_failure() {
        // wait status 256 is exit code 1
        let err = Utils::successful_stdout("ss", output(256, "")).unwrap_err();
        assert!(matches!(err, Error::CommandFailed(msg) if msg.starts_with("ss exited")));
    }

    #[test]
    fn test_parse_ipv4_address() {
        let (addr, port) = Utils::parse_address("127.0.0.1:3000").unwrap();
        assert_eq!(addr, "127.0.0.1");
        assert_eq!(port, 3000);

        let (addr, port) = Utils::parse_address("*:8080").unwrap();
        assert_eq!(addr, "*");
        assert_eq!(port, 8080);

        let (addr, port) = Utils::parse_address("192.168.1.5%wlan0:5000").unwrap();
        assert_eq!(addr, "192.168.1.5%wlan0");
        assert_eq!(port, 5000);
    }

    #[test]
    fn test_parse_ipv6_address() {
        let (addr, port) = Utils::parse_address("[::1]:3000").unwrap();
        assert_eq!(addr, "[::1]");
        assert_eq!(port, 3000);

        assert!(Utils::parse_address("[::]:*").is_none());
        assert!(Utils::parse_address("0.0.0.0:*").is_none());
    }

    #[test]
    fn test_process_name_matches() {
        assert!(Utils::process_name_matches("RISK.exe", "RISK"));
        assert!(Utils::process_name_matches("risk", "RISK"));
        assert!(Utils::process_name_matches(
            "/Applications/RISK.app/Contents/MacOS/RISK",
            "RISK"
        ));
        assert!(Utils::process_name_matches(r"C:\Games\RISK.EXE", "RISK.exe"));
        assert!(!Utils::process_name_matches("RISKY", "RISK"));
        assert!(!Utils::process_name_matches("", "RISK"));
    }

    #[test]
    fn test_parse_ps_output() {
        let output = "  PID COMMAND
    1 systemd
 4242 RISK.exe
 4243 wineserver
 5000 RISK
";
        assert_eq!(Utils::parse_ps_output(output, "RISK"), vec![4242, 5000]);
        assert!(Utils::parse_ps_output(output, "steam").is_empty());
    }

    #[test]
    fn test_parse_tasklist_output() {
        let output = r#""System Idle Process","0","Services","0","8 K"
"RISK.exe","5432","Console","1","45,000 K"
"explorer.exe","1200","Console","1","90,000 K"
"#;
        assert_eq!(Utils::parse_tasklist_output(output, "RISK"), vec![5432]);
    }

    #[test]
    fn test_parse_ss_udp_output() {
        let output = r#"UNCONN 0      0            0.0.0.0:41234      0.0.0.0:*    users:(("RISK.exe",pid=4242,fd=55))
ESTAB  0      0      192.168.1.5:41235  52.1.2.3:9000    users:(("RISK.exe",pid=4242,fd=56))
UNCONN 0      0               [::]:5353         [::]:*    users:(("avahi-daemon",pid=800,fd=12))
UNCONN 0      0          127.0.0.1:323       0.0.0.0:*
"#;
        assert_eq!(Utils::parse_ss_udp_output(output, 4242), vec![41234, 41235]);
        assert_eq!(Utils::parse_ss_udp_output(output, 800), vec![5353]);
        assert!(Utils::parse_ss_udp_output(output, 42).is_empty());
    }

    #[test]
    fn test_parse_lsof_udp_output() {
        let output = r#"COMMAND   PID USER   FD   TYPE             DEVICE SIZE/OFF NODE NAME
RISK    12345 me     30u  IPv4 0x3d8015e195af1f3f      0t0  UDP *:50123
RISK    12345 me     31u  IPv4 0x3d8015e195af1f40      0t0  UDP 192.168.1.2:50124->1.2.3.4:6000
"#;
        assert_eq!(Utils::parse_lsof_udp_output(output), vec![50123, 50124]);
    }

    #[test]
    fn test_parse_netstat_udp_output() {
        let output = r#"
Active Connections

  Proto  Local Address          Foreign Address        State           PID
  UDP    0.0.0.0:5353           *:*                                    2468
  UDP    0.0.0.0:50000          *:*                                    5432
  UDP    [::]:50001             *:*                                    5432
  TCP    0.0.0.0:135            0.0.0.0:0              LISTENING       5432
"#;
        assert_eq!(Utils::parse_netstat_udp_output(output, 5432), vec![50000, 50001]);
    }
}
