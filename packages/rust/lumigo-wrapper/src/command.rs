//! Package manager invocation for the node tracer dependency.

use crate::constants::tracer;
use crate::error::{Result, WrapError};
use async_trait::async_trait;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// A command line to run in the service directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl fmt::Display for PackageCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Supported node package managers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PackageManager {
    #[default]
    Npm,
    Yarn,
    Pnpm,
}

impl FromStr for PackageManager {
    type Err = WrapError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "npm" => Ok(PackageManager::Npm),
            "yarn" => Ok(PackageManager::Yarn),
            "pnpm" => Ok(PackageManager::Pnpm),
            other => Err(WrapError::UnsupportedPackageManager(other.to_string())),
        }
    }
}

impl PackageManager {
    /// Resolves the configured manager name, defaulting to npm.
    pub fn resolve(configured: Option<&str>) -> Result<Self> {
        configured.map_or(Ok(PackageManager::Npm), |name| name.parse())
    }

    fn program(self) -> &'static str {
        match self {
            PackageManager::Npm => "npm",
            PackageManager::Yarn => "yarn",
            PackageManager::Pnpm => "pnpm",
        }
    }

    pub fn install(self, version: &str) -> PackageCommand {
        let verb = match self {
            PackageManager::Npm => "install",
            PackageManager::Yarn | PackageManager::Pnpm => "add",
        };
        PackageCommand {
            program: self.program().to_string(),
            args: vec![
                verb.to_string(),
                format!("{}@{}", tracer::NODE_PACKAGE, version),
            ],
        }
    }

    pub fn uninstall(self) -> PackageCommand {
        let verb = match self {
            PackageManager::Npm => "uninstall",
            PackageManager::Yarn | PackageManager::Pnpm => "remove",
        };
        PackageCommand {
            program: self.program().to_string(),
            args: vec![verb.to_string(), tracer::NODE_PACKAGE.to_string()],
        }
    }
}

/// Runs package manager commands on behalf of the wrapper.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Runs `command` in `cwd` to completion; a non-zero exit is an error.
    async fn run(&self, command: &PackageCommand, cwd: &Path) -> Result<()>;
}

/// Spawns the command as a child process and waits for it.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShellCommandRunner;

#[async_trait]
impl CommandRunner for ShellCommandRunner {
    async fn run(&self, command: &PackageCommand, cwd: &Path) -> Result<()> {
        tracing::debug!(command = %command, cwd = %cwd.display(), "running package manager");

        let status = tokio::process::Command::new(&command.program)
            .args(&command.args)
            .current_dir(cwd)
            .status()
            .await?;

        if status.success() {
            Ok(())
        } else {
            Err(WrapError::CommandFailed {
                command: command.to_string(),
                status: status.to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_install_commands() {
        let cases = [
            (PackageManager::Npm, "npm install @lumigo/tracer@latest"),
            (PackageManager::Yarn, "yarn add @lumigo/tracer@latest"),
            (PackageManager::Pnpm, "pnpm add @lumigo/tracer@latest"),
        ];
        for (manager, expected) in cases {
            assert_eq!(manager.install("latest").to_string(), expected);
        }

        assert_eq!(
            PackageManager::Npm.install("1.80.2").to_string(),
            "npm install @lumigo/tracer@1.80.2"
        );
    }

    #[test]
    fn test_uninstall_commands() {
        let cases = [
            (PackageManager::Npm, "npm uninstall @lumigo/tracer"),
            (PackageManager::Yarn, "yarn remove @lumigo/tracer"),
            (PackageManager::Pnpm, "pnpm remove @lumigo/tracer"),
        ];
        for (manager, expected) in cases {
            assert_eq!(manager.uninstall().to_string(), expected);
        }
    }

    #[test]
    fn test_resolve_package_manager() {
        assert_eq!(PackageManager::resolve(None).unwrap(), PackageManager::Npm);
        assert_eq!(
            PackageManager::resolve(Some("yarn")).unwrap(),
            PackageManager::Yarn
        );
        assert!(matches!(
            PackageManager::resolve(Some("bun")),
            Err(WrapError::UnsupportedPackageManager(name)) if name == "bun"
        ));
    }

    #[tokio::test]
    async fn test_shell_runner_reports_failure() {
        let dir = tempfile::tempdir().unwrap();
        let command = PackageCommand {
            program: "sh".to_string(),
            args: vec!["-c".to_string(), "exit 3".to_string()],
        };

        let err = ShellCommandRunner.run(&command, dir.path()).await.unwrap_err();
        assert!(matches!(err, WrapError::CommandFailed { command, .. } if command == "sh -c exit 3"));
    }
}
