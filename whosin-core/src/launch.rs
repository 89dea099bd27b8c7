// ABOUTME: Resolves how to launch the Bedrock dedicated server on the current platform
// ABOUTME: Picks the executable name, absolute working directory, and extra environment

use crate::config::ServerConfig;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Platform the server build targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerOs {
    Linux,
    Win32,
}

impl ServerOs {
    /// Resolve the configured value; "auto" follows the host platform.
    ///
    /// Unknown values fall back to Linux.
    pub fn resolve(configured: &str) -> Self {
        match configured {
            "win32" => ServerOs::Win32,
            "auto" if cfg!(windows) => ServerOs::Win32,
            _ => ServerOs::Linux,
        }
    }

    pub fn default_executable(self) -> &'static str {
        match self {
            ServerOs::Linux => "bedrock_server",
            ServerOs::Win32 => "bedrock_server.exe",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ServerOs::Linux => "linux",
            ServerOs::Win32 => "win32",
        }
    }
}

/// Everything needed to spawn the server process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchSpec {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub working_dir: PathBuf,
    pub env: Vec<(String, String)>,
}

impl LaunchSpec {
    /// Build the launch spec for the configured Bedrock server
    pub fn for_server(config: &ServerConfig) -> Result<Self> {
        let os = ServerOs::resolve(&config.os);
        tracing::info!(platform = os.as_str(), "Server platform selected");

        let working_dir = absolute(Path::new(&config.path))?;
        let executable = config
            .executable
            .as_deref()
            .unwrap_or_else(|| os.default_executable());
        let program = working_dir.join(executable);
        tracing::debug!(program = %program.display(), "Server executable resolved");

        let env = match os {
            // Bedrock ships its shared libraries next to the executable
            ServerOs::Linux => vec![("LD_LIBRARY_PATH".to_string(), ".".to_string())],
            ServerOs::Win32 => Vec::new(),
        };

        Ok(Self {
            program,
            args: Vec::new(),
            working_dir,
            env,
        })
    }

    /// Launch an arbitrary program, used for tests and custom wrappers
    pub fn command(
        program: impl Into<PathBuf>,
        args: impl IntoIterator<Item = impl Into<String>>,
        working_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            working_dir: working_dir.into(),
            env: Vec::new(),
        }
    }
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().context("Failed to read current directory")?;
    Ok(cwd.join(path))
}
