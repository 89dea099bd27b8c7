// ABOUTME: Configuration parsing from TOML file with environment variable overrides
// ABOUTME: Validates required fields, provides defaults, and writes the starter config file
use crate::paths;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Placeholder values written into a fresh config file
const TOKEN_PLACEHOLDER: &str = "[YOUR_TELEGRAM_BOT_TOKEN]";
const CHATROOM_PLACEHOLDER: &str =
    "[YOUR_TELEGRAM_CHATROOM_ID (send /getChatroomId to the bot from the chat room)]";

/// Starter config written when none exists
pub const DEFAULT_CONFIG: &str = r#"# whosin configuration

[server]
# Directory containing the bedrock_server executable
path = "../mcb"
# auto | linux | win32
os = "auto"
# Echo the server console to this terminal
echo_output = true

[telegram]
bot_token = "[YOUR_TELEGRAM_BOT_TOKEN]"
chatroom_id = "[YOUR_TELEGRAM_CHATROOM_ID (send /getChatroomId to the bot from the chat room)]"
# Relay chat messages into the game with the `say` command
chat_to_server = false
# Telegram user ids allowed to talk to the bot (empty = everyone)
allowed_users = []

[messages]
server_start = "Minecraft server started!"
join = "{0} join server."
leave = "{0} leave server."
chat_format = "<{0}> {1}"
"#;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub messages: MessagesConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Directory containing the server executable; also its working directory
    #[serde(default = "default_server_path")]
    pub path: String,
    /// Target platform: "auto", "linux" or "win32"
    #[serde(default = "default_os")]
    pub os: String,
    /// Executable file name override (defaults per platform)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub executable: Option<String>,
    #[serde(default = "default_true")]
    pub echo_output: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            path: default_server_path(),
            os: default_os(),
            executable: None,
            echo_output: true,
        }
    }
}

// ─── TelegramConfig ─────────────────────────────────────────────

#[derive(Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    pub bot_token: String,
    /// Destination chat for notifications and source chat for the relay
    pub chatroom_id: String,
    #[serde(default)]
    pub chat_to_server: bool,
    #[serde(default)]
    pub allowed_users: Vec<i64>,
}

// Custom Debug impl to redact bot_token
impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("bot_token", &"[REDACTED]")
            .field("chatroom_id", &self.chatroom_id)
            .field("chat_to_server", &self.chat_to_server)
            .field("allowed_users", &self.allowed_users)
            .finish()
    }
}

/// Message templates; `{0}` is the player name (or chat sender), `{1}` the chat body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessagesConfig {
    #[serde(default = "default_server_start")]
    pub server_start: String,
    #[serde(default = "default_join")]
    pub join: String,
    #[serde(default = "default_leave")]
    pub leave: String,
    #[serde(default = "default_chat_format")]
    pub chat_format: String,
}

impl Default for MessagesConfig {
    fn default() -> Self {
        Self {
            server_start: default_server_start(),
            join: default_join(),
            leave: default_leave(),
            chat_format: default_chat_format(),
        }
    }
}

fn default_server_path() -> String {
    "../mcb".to_string()
}

fn default_os() -> String {
    "auto".to_string()
}

fn default_true() -> bool {
    true
}

fn default_server_start() -> String {
    "Minecraft server started!".to_string()
}

fn default_join() -> String {
    "{0} join server.".to_string()
}

fn default_leave() -> String {
    "{0} leave server.".to_string()
}

fn default_chat_format() -> String {
    "<{0}> {1}".to_string()
}

/// Expand tilde (~) to home directory in paths
/// Logs a warning if expansion fails and falls back to the original path
fn expand_tilde(path: &str) -> String {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(base_dirs) = directories::BaseDirs::new() {
            return base_dirs
                .home_dir()
                .join(stripped)
                .to_string_lossy()
                .to_string();
        } else {
            tracing::warn!(
                path = %path,
                "Failed to expand tilde in path: could not determine home directory"
            );
        }
    } else if path == "~" {
        if let Some(base_dirs) = directories::BaseDirs::new() {
            return base_dirs.home_dir().to_string_lossy().to_string();
        } else {
            tracing::warn!("Failed to expand tilde: could not determine home directory");
        }
    }
    path.to_string()
}

impl Config {
    /// Find the config file, checking multiple locations in order:
    /// 1. WHOSIN_CONFIG_PATH env var (if set)
    /// 2. ./config.toml (current directory)
    /// 3. ~/.config/whosin/config.toml (XDG config dir)
    pub fn find_config_file() -> Option<PathBuf> {
        if let Ok(env_path) = std::env::var("WHOSIN_CONFIG_PATH") {
            let path = PathBuf::from(&env_path);
            if path.exists() {
                return Some(path);
            }
        }

        let local_config = PathBuf::from("config.toml");
        if local_config.exists() {
            return Some(local_config);
        }

        let xdg_config = paths::config_file();
        if xdg_config.exists() {
            return Some(xdg_config);
        }

        None
    }

    /// Pick the config file to use: an explicit path wins, then the search in
    /// [`Config::find_config_file`], then `./config.toml` as the place to create one
    pub fn resolve_path(explicit: Option<PathBuf>) -> PathBuf {
        explicit
            .or_else(Self::find_config_file)
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }

    /// Load configuration from a specific file, then apply env overrides and validate
    pub fn load_from(path: &Path) -> Result<Self> {
        tracing::info!(path = %path.display(), "Loading configuration from file");
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let mut config = toml::from_str::<Config>(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;

        config.apply_env_overrides()?;
        config.server.path = expand_tilde(&config.server.path);
        config.validate()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(val) = std::env::var("TELEGRAM_BOT_TOKEN") {
            self.telegram.bot_token = val;
            // Clear from environment to prevent exposure to the server child process
            std::env::remove_var("TELEGRAM_BOT_TOKEN");
        }
        if let Ok(val) = std::env::var("TELEGRAM_CHATROOM_ID") {
            self.telegram.chatroom_id = val;
        }
        if let Ok(val) = std::env::var("TELEGRAM_CHAT_TO_SERVER") {
            self.telegram.chat_to_server = val.parse().with_context(|| {
                format!("TELEGRAM_CHAT_TO_SERVER must be true or false, got: {}", val)
            })?;
        }
        if let Ok(val) = std::env::var("SERVER_PATH") {
            self.server.path = val;
        }
        if let Ok(val) = std::env::var("SERVER_OS") {
            self.server.os = val;
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        let token = self.telegram.bot_token.trim();
        if token.is_empty() || token == TOKEN_PLACEHOLDER {
            anyhow::bail!(
                "telegram.bot_token is required (set in config.toml or TELEGRAM_BOT_TOKEN env var)"
            );
        }

        let chatroom = self.telegram.chatroom_id.trim();
        if chatroom.is_empty() || chatroom == CHATROOM_PLACEHOLDER {
            anyhow::bail!(
                "telegram.chatroom_id is required (set in config.toml or TELEGRAM_CHATROOM_ID env var)"
            );
        }

        if !matches!(self.server.os.as_str(), "auto" | "linux" | "win32") {
            anyhow::bail!(
                "Invalid server.os '{}'. Use 'auto', 'linux' or 'win32'",
                self.server.os
            );
        }

        if self.server.path.trim().is_empty() {
            anyhow::bail!("server.path must not be empty");
        }

        Ok(())
    }

    /// Write the starter config to `path`.
    ///
    /// Refuses to overwrite an existing file unless `force` is set.
    pub fn write_default(path: &Path, force: bool) -> Result<()> {
        if path.exists() && !force {
            anyhow::bail!(
                "{} already exists (use --force to overwrite)",
                path.display()
            );
        }
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        std::fs::write(path, DEFAULT_CONFIG)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }
}
