//! Match result persistence.
//!
//! The room layer only hands finished results to a `MatchRecorder`; storage
//! failures are logged here and never reach the room or its players.

use log::{info, warn};
use serde::{Serialize, Deserialize};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::io::AsyncWriteExt;

use crate::game::types::Difficulty;
use crate::server::matchmaking::types::RoomId;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MatchResult {
    pub room_id: RoomId,
    pub player1: String,
    pub player2: String,
    pub score1: u32,
    pub score2: u32,
    /// User id of the winner, "AI", or None on a tie.
    pub winner: Option<String>,
    pub ai_difficulty: Option<Difficulty>,
    pub finished_at_ms: u64,
}

pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Sink for finished matches. Called from inside the actor system.
pub trait MatchRecorder: Send + Sync {
    fn record(&self, result: MatchResult);
}

/// Writes each result to the log only.
pub struct LogRecorder;

impl MatchRecorder for LogRecorder {
    fn record(&self, result: MatchResult) {
        info!(
            "[Records] {} finished {}-{} ({} vs {}), winner={}",
            result.room_id,
            result.score1,
            result.score2,
            result.player1,
            result.player2,
            result.winner.as_deref().unwrap_or("none")
        );
    }
}

/// Appends one JSON object per match to a file.
pub struct JsonLinesRecorder {
    path: PathBuf,
}

impl JsonLinesRecorder {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl MatchRecorder for JsonLinesRecorder {
    fn record(&self, result: MatchResult) {
        let mut line = match serde_json::to_string(&result) {
            Ok(line) => line,
            Err(e) => {
                warn!("[Records] Failed to serialize result of {}: {}", result.room_id, e);
                return;
            }
        };
        line.push('\n');
        let path = self.path.clone();
        let room_id = result.room_id;
        actix::spawn(async move {
            match append_line(&path, &line).await {
                Ok(()) => info!("[Records] Result of {} appended to {}", room_id, path.display()),
                Err(e) => warn!("[Records] Failed to persist result of {}: {}", room_id, e),
            }
        });
    }
}

async fn append_line(path: &Path, line: &str) -> std::io::Result<()> {
    let mut file = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await?;
    file.write_all(line.as_bytes()).await?;
    file.flush().await
}
