// ABOUTME: Classifies one Bedrock server console line into a semantic event
// ABOUTME: Recognizes server start, player connect, and player disconnect log lines

use once_cell::sync::Lazy;
use regex::Regex;

static SERVER_STARTED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\[.*?\] Server started\.\r?$").expect("server started pattern is valid")
});

static PLAYER_CONNECTED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\[.*?\] Player connected: (.+), xuid: \d+\r?$")
        .expect("player connected pattern is valid")
});

static PLAYER_DISCONNECTED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\[.*?\] Player disconnected: (.+), xuid: \d+\r?$")
        .expect("player disconnected pattern is valid")
});

/// Semantic interpretation of a single console line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchedEvent {
    /// The server finished starting and accepts connections
    ServerReady,
    /// A player joined; `name` is captured verbatim
    PlayerJoined { name: String },
    /// A player left
    PlayerLeft { name: String },
    /// Anything else
    Unmatched,
}

impl MatchedEvent {
    /// Short label for structured logs
    pub fn kind(&self) -> &'static str {
        match self {
            MatchedEvent::ServerReady => "server_ready",
            MatchedEvent::PlayerJoined { .. } => "player_joined",
            MatchedEvent::PlayerLeft { .. } => "player_left",
            MatchedEvent::Unmatched => "unmatched",
        }
    }
}

/// Classify one complete line (without its `\n`).
///
/// Lines that only partly resemble a pattern classify as `Unmatched`.
pub fn match_line(line: &str) -> MatchedEvent {
    if SERVER_STARTED.is_match(line) {
        return MatchedEvent::ServerReady;
    }
    if let Some(caps) = PLAYER_CONNECTED.captures(line) {
        return MatchedEvent::PlayerJoined {
            name: caps[1].to_string(),
        };
    }
    if let Some(caps) = PLAYER_DISCONNECTED.captures(line) {
        return MatchedEvent::PlayerLeft {
            name: caps[1].to_string(),
        };
    }
    MatchedEvent::Unmatched
}
