//! Command dispatch.
//!
//! Turns a token sequence into a [`Reply`], running external tools through a
//! [`CommandExecutor`] and reading or updating the connection's [`Session`].

use super::command::{CommandKind, HELP_TEXT};
use super::framing::Reply;
use super::session::Session;
use crate::config::ConsoleConfig;
use crate::executor::CommandExecutor;
use crate::wifi::{self, addr, Nmcli};
use log::{info, warn};

/// Message for names not in the command table.
pub const UNKNOWN_COMMAND: &str = "unknown command";

/// Message for commands missing a required argument.
pub const BAD_FORMAT: &str = "bad format";

/// Routes commands to their handlers.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    nmcli: Nmcli,
    ip_program: String,
    privilege: Vec<String>,
}

impl Dispatcher {
    /// Create a dispatcher using the tool locations from `config`.
    pub fn new(config: &ConsoleConfig) -> Self {
        Self {
            nmcli: Nmcli::new(config.nmcli_program.clone()),
            ip_program: config.ip_program.clone(),
            privilege: config.privilege_command.clone(),
        }
    }

    /// Dispatch one tokenized command line.
    ///
    /// Returns `None` for an empty token sequence; every other input gets a
    /// reply.
    pub fn dispatch(
        &self,
        tokens: &[String],
        session: &mut Session,
        executor: &dyn CommandExecutor,
    ) -> Option<Reply> {
        let (name, args) = tokens.split_first()?;

        let Some(kind) = CommandKind::from_name(name) else {
            info!("Unknown command: {:?}", name);
            return Some(Reply::new(1, UNKNOWN_COMMAND));
        };
        info!("Command: {}", kind);

        let reply = match kind {
            CommandKind::Help => Reply::new(0, HELP_TEXT),
            CommandKind::Scan => self.run(executor, &self.nmcli.rescan()),
            CommandKind::List => self.list(session, executor),
            CommandKind::Connect => self.connect(args, session, executor),
            CommandKind::Address => self.addresses(executor),
            CommandKind::RadioOn => self.run(executor, &self.nmcli.radio(true)),
            CommandKind::RadioOff => self.run(executor, &self.nmcli.radio(false)),
            CommandKind::Reboot => self.run(executor, &self.privileged("reboot")),
            CommandKind::PowerOff => self.run(executor, &self.privileged("poweroff")),
        };
        Some(reply)
    }

    fn run(&self, executor: &dyn CommandExecutor, argv: &[String]) -> Reply {
        let out = executor.execute(argv);
        Reply::new(out.status, out.output)
    }

    fn privileged(&self, program: &str) -> Vec<String> {
        let mut argv = self.privilege.clone();
        argv.push(program.to_string());
        argv
    }

    fn list(&self, session: &mut Session, executor: &dyn CommandExecutor) -> Reply {
        let out = executor.execute(&self.nmcli.list());
        if !out.success() {
            return Reply::new(out.status, out.output);
        }

        match wifi::parse_network_list(&out.output) {
            Ok(candidates) => {
                info!("Listed {} network(s)", candidates.len());
                let table = wifi::format_network_table(&candidates);
                session.replace_candidates(candidates);
                Reply::new(out.status, table)
            }
            Err(e) => {
                warn!("Unreadable network list, returning raw output: {}", e);
                Reply::new(out.status, out.output)
            }
        }
    }

    fn connect(
        &self,
        args: &[String],
        session: &Session,
        executor: &dyn CommandExecutor,
    ) -> Reply {
        let Some(target) = args.first() else {
            return Reply::new(1, BAD_FORMAT);
        };
        let password = args.get(1).map(String::as_str);

        let argv = match session.resolve(target) {
            Some(candidate) => {
                info!(
                    "Connecting to #{} {:?} via BSSID {}",
                    candidate.index, candidate.ssid, candidate.bssid
                );
                self.nmcli.connect(&candidate.bssid, password)
            }
            None => {
                info!("Connecting to SSID {:?}", target);
                self.nmcli.connect(target, password)
            }
        };
        self.run(executor, &argv)
    }

    fn addresses(&self, executor: &dyn CommandExecutor) -> Reply {
        let out = executor.execute(&addr::ip_addr_argv(&self.ip_program));
        if !out.success() {
            return Reply::new(out.status, out.output);
        }

        match addr::parse_interfaces(&out.output) {
            Ok(interfaces) => Reply::new(out.status, addr::format_addresses(&interfaces)),
            Err(e) => {
                warn!("Unreadable interface list, returning raw output: {}", e);
                Reply::new(out.status, out.output)
            }
        }
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new(&ConsoleConfig::default())
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted executor for tests.

    use crate::executor::{CommandExecutor, ExecOutput};
    use std::sync::Mutex;

    /// Answers by matching a word in argv; records every call.
    #[derive(Default)]
    pub struct FakeExecutor {
        pub calls: Mutex<Vec<Vec<String>>>,
        responses: Vec<(&'static str, ExecOutput)>,
    }

    impl FakeExecutor {
        pub fn new() -> Self {
            Self::default()
        }

        /// Respond with `output` to any argv containing `word`.
        pub fn on(mut self, word: &'static str, status: i32, output: &str) -> Self {
            self.responses.push((word, ExecOutput::new(status, output)));
            self
        }

        pub fn calls(&self) -> Vec<Vec<String>> {
            self.calls.lock().unwrap().clone()
        }

        pub fn last_call(&self) -> Vec<String> {
            self.calls().last().cloned().unwrap_or_default()
        }
    }

    impl CommandExecutor for FakeExecutor {
        fn execute(&self, argv: &[String]) -> ExecOutput {
            self.calls.lock().unwrap().push(argv.to_vec());
            self.responses
                .iter()
                .find(|(word, _)| argv.iter().any(|a| a == word))
                .map(|(_, out)| out.clone())
                .unwrap_or_else(|| ExecOutput::new(0, ""))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::FakeExecutor;
    use super::*;

    const NETWORKS: &str = "\
BSSID: AA:BB:CC:DD:EE:01
SSID: HomeNet
SECURITY: WPA2
SIGNAL: 72
IN-USE: *
CHAN: 6
BSSID: AA:BB:CC:DD:EE:02
SSID: Cafe Guest
SECURITY: --
SIGNAL: 40
IN-USE:
CHAN: 11
";

    fn tokens(line: &str) -> Vec<String> {
        crate::console::tokenize(line).unwrap()
    }

    fn dispatch(exec: &FakeExecutor, session: &mut Session, line: &str) -> Option<Reply> {
        Dispatcher::default().dispatch(&tokens(line), session, exec)
    }

    fn strs(argv: &[String]) -> Vec<&str> {
        argv.iter().map(String::as_str).collect()
    }

    #[test]
    fn test_empty_tokens_no_reply() {
        let exec = FakeExecutor::new();
        assert_eq!(dispatch(&exec, &mut Session::new(), "   "), None);
        assert!(exec.calls().is_empty());
    }

    #[test]
    fn test_unknown_command_any_case() {
        let exec = FakeExecutor::new();
        for line in ["frobnicate", "FROBNICATE", "Connect x"] {
            assert_eq!(
                dispatch(&exec, &mut Session::new(), line),
                Some(Reply::new(1, UNKNOWN_COMMAND))
            );
        }
        assert!(exec.calls().is_empty());
    }

    #[test]
    fn test_help_no_external_call() {
        let exec = FakeExecutor::new();
        let reply = dispatch(&exec, &mut Session::new(), "HELP").unwrap();
        assert_eq!(reply, Reply::new(0, HELP_TEXT));
        assert!(exec.calls().is_empty());
    }

    #[test]
    fn test_scan_passes_through() {
        let exec = FakeExecutor::new().on("rescan", 10, "Error: Scanning not allowed");
        let reply = dispatch(&exec, &mut Session::new(), "s").unwrap();
        assert_eq!(reply, Reply::new(10, "Error: Scanning not allowed"));
        assert_eq!(strs(&exec.last_call()), vec!["nmcli", "device", "wifi", "rescan"]);
    }

    #[test]
    fn test_list_renders_and_caches() {
        let exec = FakeExecutor::new().on("list", 0, NETWORKS);
        let mut session = Session::new();
        let reply = dispatch(&exec, &mut session, "list").unwrap();

        assert_eq!(reply.code, 0);
        assert_eq!(
            reply.message,
            "SSID (BSSID) SECURITY SIGNAL (CHANNEL)\n\
             0) *HomeNet (AA:BB:CC:DD:EE:01) WPA2 72 (6)\n\
             1) Cafe Guest (AA:BB:CC:DD:EE:02) -- 40 (11)"
        );
        let indices: Vec<usize> = session.candidates().iter().map(|c| c.index).collect();
        assert_eq!(indices, vec![0, 1]);
    }

    #[test]
    fn test_list_failure_keeps_session() {
        let mut session = Session::new();
        let ok = FakeExecutor::new().on("list", 0, NETWORKS);
        dispatch(&ok, &mut session, "list");

        let failing = FakeExecutor::new().on("list", 8, "NetworkManager is not running");
        let reply = dispatch(&failing, &mut session, "l").unwrap();
        assert_eq!(reply, Reply::new(8, "NetworkManager is not running"));
        assert_eq!(session.candidates().len(), 2);
    }

    #[test]
    fn test_list_unparseable_falls_back_to_raw() {
        let mut session = Session::new();
        let raw = "BSSID: AA\nSSID: x\n";
        let exec = FakeExecutor::new().on("list", 0, raw);
        let reply = dispatch(&exec, &mut session, "list").unwrap();
        assert_eq!(reply, Reply::new(0, raw));
        assert!(session.candidates().is_empty());
    }

    #[test]
    fn test_conn_missing_target() {
        let exec = FakeExecutor::new();
        assert_eq!(
            dispatch(&exec, &mut Session::new(), "conn"),
            Some(Reply::new(1, BAD_FORMAT))
        );
        assert!(exec.calls().is_empty());
    }

    #[test]
    fn test_conn_by_index_uses_bssid() {
        let exec = FakeExecutor::new()
            .on("list", 0, NETWORKS)
            .on("connect", 0, "Device 'wlan0' successfully activated");
        let mut session = Session::new();
        dispatch(&exec, &mut session, "list");

        let reply = dispatch(&exec, &mut session, r#"c 1 "pa ss""#).unwrap();
        assert_eq!(reply.code, 0);
        assert_eq!(
            strs(&exec.last_call()),
            vec![
                "nmcli",
                "device",
                "wifi",
                "connect",
                "AA:BB:CC:DD:EE:02",
                "password",
                "pa ss"
            ]
        );
    }

    #[test]
    fn test_conn_out_of_range_is_literal_ssid() {
        let exec = FakeExecutor::new().on("list", 0, NETWORKS);
        let mut session = Session::new();
        dispatch(&exec, &mut session, "list");

        for target in ["2", "99", "-1", "one"] {
            dispatch(&exec, &mut session, &format!("conn {}", target));
            assert_eq!(
                strs(&exec.last_call()),
                vec!["nmcli", "device", "wifi", "connect", target]
            );
        }
    }

    #[test]
    fn test_conn_without_list_is_literal() {
        let exec = FakeExecutor::new();
        dispatch(&exec, &mut Session::new(), r#"conn "My Wifi""#);
        assert_eq!(
            strs(&exec.last_call()),
            vec!["nmcli", "device", "wifi", "connect", "My Wifi"]
        );
    }

    #[test]
    fn test_conn_failure_passes_through() {
        let exec = FakeExecutor::new().on("connect", 4, "Error: Secrets were required");
        let reply = dispatch(&exec, &mut Session::new(), "conn Home wrong").unwrap();
        assert_eq!(reply, Reply::new(4, "Error: Secrets were required"));
    }

    #[test]
    fn test_addr_formats_up_interfaces() {
        let json = r#"[
          {"ifname":"lo","operstate":"UNKNOWN","addr_info":[{"local":"127.0.0.1"}]},
          {"ifname":"wlan0","operstate":"UP","addr_info":[{"local":"192.168.1.9"},{"local":"fe80::2"}]}
        ]"#;
        let exec = FakeExecutor::new().on("addr", 0, json);
        let reply = dispatch(&exec, &mut Session::new(), "a").unwrap();
        assert_eq!(reply, Reply::new(0, "wlan0 192.168.1.9,fe80::2"));
        assert_eq!(strs(&exec.last_call()), vec!["ip", "-j", "addr"]);
    }

    #[test]
    fn test_addr_unparseable_falls_back() {
        let raw = r#"[{"ifname":"wlan0"}]"#;
        let exec = FakeExecutor::new().on("addr", 0, raw);
        let reply = dispatch(&exec, &mut Session::new(), "addr").unwrap();
        assert_eq!(reply, Reply::new(0, raw));
    }

    #[test]
    fn test_radio_toggle() {
        let exec = FakeExecutor::new();
        dispatch(&exec, &mut Session::new(), "ON");
        assert_eq!(strs(&exec.last_call()), vec!["nmcli", "radio", "wifi", "on"]);
        dispatch(&exec, &mut Session::new(), "off");
        assert_eq!(strs(&exec.last_call()), vec!["nmcli", "radio", "wifi", "off"]);
    }

    #[test]
    fn test_power_commands_use_privilege_prefix() {
        let exec = FakeExecutor::new().on("reboot", 1, "sudo: a password is required");
        let reply = dispatch(&exec, &mut Session::new(), "r").unwrap();
        assert_eq!(reply, Reply::new(1, "sudo: a password is required"));
        assert_eq!(strs(&exec.last_call()), vec!["sudo", "-n", "reboot"]);

        dispatch(&exec, &mut Session::new(), "p");
        assert_eq!(strs(&exec.last_call()), vec!["sudo", "-n", "poweroff"]);
    }

    #[test]
    fn test_power_commands_without_prefix() {
        let config = ConsoleConfig {
            privilege_command: Vec::new(),
            ..ConsoleConfig::default()
        };
        let exec = FakeExecutor::new();
        Dispatcher::new(&config).dispatch(&tokens("reboot"), &mut Session::new(), &exec);
        assert_eq!(strs(&exec.last_call()), vec!["reboot"]);
    }
}
