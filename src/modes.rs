use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::MatchpointError;

/// The game modes the core schedules. Each mode fixes its own match size,
/// compatibility gates, rating applicability and static config payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameMode {
    Fps,
    Chess,
    Moba,
    Rts,
}

impl GameMode {
    pub const ALL: [GameMode; 4] = [GameMode::Fps, GameMode::Chess, GameMode::Moba, GameMode::Rts];

    pub fn as_str(&self) -> &'static str {
        match self {
            GameMode::Fps => "fps",
            GameMode::Chess => "chess",
            GameMode::Moba => "moba",
            GameMode::Rts => "rts",
        }
    }

    /// Number of players a match in this mode requires.
    pub fn players_per_match(&self) -> usize {
        match self {
            GameMode::Fps | GameMode::Moba => 10,
            GameMode::Chess | GameMode::Rts => 2,
        }
    }

    /// Whether the core settles ratings for this mode. Only chess today;
    /// other modes finish without rating updates.
    pub fn rated(&self) -> bool {
        matches!(self, GameMode::Chess)
    }

    pub fn config(&self) -> &'static ModeConfig {
        match self {
            GameMode::Fps => &FPS_CONFIG,
            GameMode::Chess => &CHESS_CONFIG,
            GameMode::Moba => &MOBA_CONFIG,
            GameMode::Rts => &RTS_CONFIG,
        }
    }
}

impl fmt::Display for GameMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GameMode {
    type Err = MatchpointError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fps" => Ok(GameMode::Fps),
            "chess" => Ok(GameMode::Chess),
            "moba" => Ok(GameMode::Moba),
            "rts" => Ok(GameMode::Rts),
            other => Err(MatchpointError::InvalidInput(format!(
                "unknown game mode: {other}"
            ))),
        }
    }
}

/// Static per-mode configuration, shared by reference and attached to match
/// payloads as-is. Never cloned or mutated.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModeConfig {
    pub max_players: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub map_size: Option<MapSize>,
    #[serde(rename = "gameTime", skip_serializing_if = "Option::is_none")]
    pub game_time_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_control: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub increment: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resources: Option<&'static [&'static str]>,
}

/// Map dimensions come in two historical shapes: a width/height pair (fps)
/// and a plain label (rts).
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(untagged)]
pub enum MapSize {
    Grid { width: u32, height: u32 },
    Label(&'static str),
}

pub static FPS_CONFIG: ModeConfig = ModeConfig {
    max_players: 10,
    team_size: None,
    map_size: Some(MapSize::Grid {
        width: 1000,
        height: 1000,
    }),
    game_time_ms: Some(600_000),
    time_control: None,
    increment: None,
    resources: None,
};

pub static CHESS_CONFIG: ModeConfig = ModeConfig {
    max_players: 2,
    team_size: None,
    map_size: None,
    game_time_ms: None,
    time_control: Some("10+0"),
    increment: Some(0),
    resources: None,
};

pub static MOBA_CONFIG: ModeConfig = ModeConfig {
    max_players: 10,
    team_size: Some(5),
    map_size: None,
    game_time_ms: Some(1_800_000),
    time_control: None,
    increment: None,
    resources: None,
};

pub static RTS_CONFIG: ModeConfig = ModeConfig {
    max_players: 2,
    team_size: None,
    map_size: Some(MapSize::Label("128x128")),
    game_time_ms: None,
    time_control: None,
    increment: None,
    resources: Some(&["minerals", "gas"]),
};

impl ModeConfig {
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}
