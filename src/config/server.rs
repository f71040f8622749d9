use crate::constants::DEFAULT_STARTUP_TIMEOUT_MS;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

/// How to launch the tool server child process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub name: String,
    pub command: PathBuf,
    pub args: Vec<String>,
    pub env: HashMap<String, String>,
    pub workdir: Option<PathBuf>,
    /// Upper bound for the child to answer its first `tools/list`.
    pub startup_timeout: Duration,
}

impl ServerConfig {
    pub fn new(name: impl Into<String>, command: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            command: command.into(),
            args: Vec::new(),
            env: HashMap::new(),
            workdir: None,
            startup_timeout: Duration::from_millis(DEFAULT_STARTUP_TIMEOUT_MS),
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn with_startup_timeout(mut self, timeout: Duration) -> Self {
        self.startup_timeout = timeout;
        self
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawServer {
    #[serde(default)]
    pub(crate) name: Option<String>,
    pub(crate) command: Option<String>,
    #[serde(default)]
    pub(crate) args: Vec<String>,
    #[serde(default)]
    pub(crate) env: HashMap<String, String>,
    pub(crate) workdir: Option<String>,
    pub(crate) startup_timeout_ms: Option<u64>,
}

impl RawServer {
    /// Expands `${VAR}` and `~` in command, args and workdir.
    pub(crate) fn into_config(self, command: String) -> ServerConfig {
        let expand = |s: &str| -> String {
            shellexpand::full(s)
                .map(|cow| cow.into_owned())
                .unwrap_or_else(|_| s.to_string())
        };

        let command = PathBuf::from(expand(&command));
        let workdir = self.workdir.map(|d| PathBuf::from(expand(&d)));
        let args = self.args.into_iter().map(|arg| expand(&arg)).collect();

        ServerConfig {
            name: self.name.unwrap_or_else(|| "tools".to_string()),
            command,
            args,
            env: self.env,
            workdir,
            startup_timeout: Duration::from_millis(
                self.startup_timeout_ms.unwrap_or(DEFAULT_STARTUP_TIMEOUT_MS),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    #[test]
    #[serial]
    fn expands_env_vars_in_command_and_args() {
        unsafe {
            env::set_var("TEST_TOOL_ROOT", "/path/to/tools");
            env::set_var("TEST_TOOL_ARG", "example-arg");
        }

        let raw = RawServer {
            name: Some("clock".to_string()),
            command: None,
            args: vec!["--flag".to_string(), "${TEST_TOOL_ARG}".to_string()],
            env: HashMap::new(),
            workdir: Some("${TEST_TOOL_ROOT}/work".to_string()),
            startup_timeout_ms: Some(250),
        };

        let config = raw.into_config("${TEST_TOOL_ROOT}/server".to_string());

        let cmd = config.command.to_str().expect("valid utf8");
        assert!(cmd.contains("/path/to/tools/server"));
        assert_eq!(config.args, vec!["--flag", "example-arg"]);
        assert_eq!(config.startup_timeout, Duration::from_millis(250));

        let workdir = config.workdir.expect("workdir exists");
        assert!(workdir.to_str().expect("utf8").contains("/path/to/tools/work"));

        unsafe {
            env::remove_var("TEST_TOOL_ROOT");
            env::remove_var("TEST_TOOL_ARG");
        }
    }

    #[test]
    fn unexpandable_values_are_kept_verbatim() {
        let raw = RawServer {
            name: None,
            command: None,
            args: vec!["${TEST_TOOL_UNSET_VARIABLE_XYZ}".to_string()],
            env: HashMap::new(),
            workdir: None,
            startup_timeout_ms: None,
        };

        let config = raw.into_config("server".to_string());
        assert_eq!(config.name, "tools");
        assert_eq!(config.args, vec!["${TEST_TOOL_UNSET_VARIABLE_XYZ}"]);
        assert_eq!(
            config.startup_timeout,
            Duration::from_millis(DEFAULT_STARTUP_TIMEOUT_MS)
        );
    }
}
