// Shutdown issuing behind a narrow trait so handlers can be exercised with fakes.

use std::process::Stdio;
use tokio::process::Command;
use tracing::{error, info, warn};

#[derive(Debug, thiserror::Error)]
pub enum PowerError {
    #[error("shutdown command is empty")]
    EmptyCommand,
    #[error("failed to start `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// ShutdownIssuer starts a host shutdown without waiting for it to complete.
pub trait ShutdownIssuer: Send + Sync {
    /// Returns once the action has been issued. An error means it could not be
    /// issued at all; success says nothing about the host actually powering off.
    fn issue_shutdown(&self) -> Result<(), PowerError>;
}

/// Issues shutdown by spawning an external command (`sudo shutdown -h now` by default).
#[derive(Debug, Clone)]
pub struct CommandIssuer {
    program: String,
    args: Vec<String>,
}

impl CommandIssuer {
    /// Creates an issuer from a program followed by its arguments.
    pub fn new(command: Vec<String>) -> Result<Self, PowerError> {
        let mut parts = command.into_iter();
        let program = parts
            .next()
            .filter(|p| !p.trim().is_empty())
            .ok_or(PowerError::EmptyCommand)?;
        Ok(Self {
            program,
            args: parts.collect(),
        })
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }
}

impl ShutdownIssuer for CommandIssuer {
    /// Must be called from within a tokio runtime: the child is reaped by a background task.
    fn issue_shutdown(&self) -> Result<(), PowerError> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .spawn()
            .map_err(|source| PowerError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        info!(
            component = "power",
            event = "shutdown_issued",
            program = %self.program,
            args = ?self.args,
            pid = ?child.id(),
            "shutdown command started"
        );

        let program = self.program.clone();
        tokio::task::spawn(async move {
            match child.wait().await {
                Ok(status) if status.success() => {
                    info!(
                        component = "power",
                        event = "shutdown_command_exited",
                        program = %program,
                        "shutdown command finished"
                    );
                }
                Ok(status) => {
                    warn!(
                        component = "power",
                        event = "shutdown_command_failed",
                        program = %program,
                        status = %status,
                        "shutdown command exited unsuccessfully"
                    );
                }
                Err(e) => {
                    error!(
                        component = "power",
                        event = "shutdown_command_wait_failed",
                        program = %program,
                        error = %e,
                        "failed to wait for shutdown command"
                    );
                }
            }
        });

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_splits_program_and_args() {
        let issuer = CommandIssuer::new(vec![
            "sudo".to_string(),
            "shutdown".to_string(),
            "-h".to_string(),
            "now".to_string(),
        ])
        .unwrap();
        assert_eq!(issuer.program(), "sudo");
        assert_eq!(issuer.args(), ["shutdown", "-h", "now"]);
    }

    #[test]
    fn test_new_rejects_empty_command() {
        assert!(matches!(
            CommandIssuer::new(vec![]),
            Err(PowerError::EmptyCommand)
        ));
        assert!(matches!(
            CommandIssuer::new(vec!["  ".to_string()]),
            Err(PowerError::EmptyCommand)
        ));
    }

    #[tokio::test]
    async fn test_missing_binary_is_reported() {
        let issuer =
            CommandIssuer::new(vec!["/nonexistent/powerrelay-shutdown".to_string()]).unwrap();
        let err = issuer.issue_shutdown().unwrap_err();
        assert!(matches!(err, PowerError::Spawn { .. }));
        assert!(err.to_string().contains("/nonexistent/powerrelay-shutdown"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_harmless_command_is_issued() {
        let issuer = CommandIssuer::new(vec!["true".to_string()]).unwrap();
        tokio_test::assert_ok!(issuer.issue_shutdown());
    }
}
