//! Starts claude with a profile's credentials in its environment.
//!
//! Secrets only travel through environment variables so they never show up
//! in process listings.

use std::ffi::{OsStr, OsString};
use std::io;
use std::process::{Command, ExitStatus, Stdio};

use tracing::{debug, info};

use crate::config::claude_binary;
use crate::error::{CmError, Result};
use crate::profile::Profile;

/// Always passed first, before any caller arguments.
pub const SKIP_PERMISSIONS_FLAG: &str = "--dangerously-skip-permissions";

pub const ENV_AUTH_TOKEN: &str = "ANTHROPIC_AUTH_TOKEN";
pub const ENV_BASE_URL: &str = "ANTHROPIC_BASE_URL";
pub const ENV_OPUS_MODEL: &str = "ANTHROPIC_DEFAULT_OPUS_MODEL";
pub const ENV_SONNET_MODEL: &str = "ANTHROPIC_DEFAULT_SONNET_MODEL";
pub const ENV_HAIKU_MODEL: &str = "ANTHROPIC_DEFAULT_HAIKU_MODEL";

/// Variables a profile adds on top of the inherited environment.
/// Unset overrides are left out entirely.
pub fn profile_env(profile: &Profile) -> Vec<(&'static str, &str)> {
    let mut vars = vec![
        (ENV_AUTH_TOKEN, profile.token.as_str()),
        (ENV_BASE_URL, profile.base_url.as_str()),
    ];
    let overrides = [
        (ENV_OPUS_MODEL, profile.opus_model.as_deref()),
        (ENV_SONNET_MODEL, profile.sonnet_model.as_deref()),
        (ENV_HAIKU_MODEL, profile.haiku_model.as_deref()),
    ];
    vars.extend(
        overrides
            .into_iter()
            .filter_map(|(key, value)| value.map(|v| (key, v))),
    );
    vars
}

/// Launches the assistant binary.
#[derive(Debug, Clone)]
pub struct Launcher {
    program: OsString,
}

impl Default for Launcher {
    /// `claude`, or whatever `CM_CLAUDE_BIN` names.
    fn default() -> Self {
        Self::new(claude_binary())
    }
}

impl Launcher {
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &OsStr {
        &self.program
    }

    /// The command `launch` would run, with stdio inherited.
    pub fn command<S: AsRef<OsStr>>(&self, profile: &Profile, extra_args: &[S]) -> Command {
        let mut command = Command::new(&self.program);
        command
            .arg(SKIP_PERMISSIONS_FLAG)
            .args(extra_args)
            .envs(profile_env(profile))
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());
        command
    }

    /// Run claude for `profile` and block until it exits, returning its exit code.
    pub fn launch<S: AsRef<OsStr>>(&self, profile: &Profile, extra_args: &[S]) -> Result<i32> {
        let program = self.program.to_string_lossy().into_owned();
        info!(
            model = %profile.name,
            program = %program,
            extra_args = extra_args.len(),
            "launching assistant"
        );

        let status = self
            .command(profile, extra_args)
            .status()
            .map_err(|source| match source.kind() {
                io::ErrorKind::NotFound => CmError::LaunchNotFound {
                    program: program.clone(),
                },
                _ => CmError::Launch {
                    program: program.clone(),
                    source,
                },
            })?;

        let code = exit_code(status);
        debug!(program = %program, code, "assistant exited");
        Ok(code)
    }
}

/// Exit code of a finished child; on Unix a signal death maps to 128 + signal.
fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::ModelOverrides;
    use chrono::Utc;
    use std::collections::HashMap;

    fn profile(overrides: ModelOverrides) -> Profile {
        Profile::new(
            "work",
            "tok-123",
            "https://api.example.com",
            None,
            overrides,
            Utc::now(),
        )
    }

    fn envs(command: &Command) -> HashMap<String, Option<String>> {
        command
            .get_envs()
            .map(|(k, v)| {
                (
                    k.to_string_lossy().into_owned(),
                    v.map(|v| v.to_string_lossy().into_owned()),
                )
            })
            .collect()
    }

    #[test]
    fn credentials_go_into_the_environment_only() {
        let launcher = Launcher::new("claude");
        let command = launcher.command(&profile(ModelOverrides::default()), &["--resume"]);

        let args: Vec<_> = command.get_args().map(|a| a.to_string_lossy()).collect();
        assert_eq!(args, vec![SKIP_PERMISSIONS_FLAG, "--resume"]);
        assert!(!args.iter().any(|a| a.contains("tok-123")));

        let envs = envs(&command);
        assert_eq!(envs[ENV_AUTH_TOKEN].as_deref(), Some("tok-123"));
        assert_eq!(envs[ENV_BASE_URL].as_deref(), Some("https://api.example.com"));
    }

    #[test]
    fn unset_overrides_are_not_touched() {
        let command = Launcher::new("claude").command(
            &profile(ModelOverrides {
                sonnet: Some("sonnet-x".to_string()),
                ..Default::default()
            }),
            &[] as &[&str],
        );
        let envs = envs(&command);
        assert_eq!(envs[ENV_SONNET_MODEL].as_deref(), Some("sonnet-x"));
        assert!(!envs.contains_key(ENV_OPUS_MODEL));
        assert!(!envs.contains_key(ENV_HAIKU_MODEL));
    }

    #[test]
    fn missing_binary_is_reported_as_not_found() {
        let launcher = Launcher::new("cm-test-definitely-not-installed-binary");
        let err = launcher
            .launch(&profile(ModelOverrides::default()), &[] as &[&str])
            .unwrap_err();
        assert!(
            matches!(err, CmError::LaunchNotFound { ref program } if program.contains("not-installed")),
            "{err:?}"
        );
    }
}
