//! Provider payload types and conversion into portable records.

use chrono::DateTime;
use serde::Deserialize;

use chessbridge_core_types::{GameRecord, GameResult, PlayerSummary};

/// Monthly-games response envelope.
#[derive(Debug, Deserialize)]
pub struct GamesResponse {
    #[serde(default)]
    pub games: Vec<ProviderGame>,
}

/// One game as the provider serves it.
#[derive(Debug, Deserialize)]
pub struct ProviderGame {
    pub url: String,
    #[serde(default)]
    pub pgn: Option<String>,
    #[serde(default)]
    pub time_control: String,
    #[serde(default)]
    pub end_time: i64,
    pub white: ProviderPlayer,
    pub black: ProviderPlayer,
}

#[derive(Debug, Deserialize)]
pub struct ProviderPlayer {
    pub username: String,
    #[serde(default)]
    pub rating: u32,
    #[serde(default)]
    pub result: String,
}

/// Per-color result codes the provider uses for a draw.
const DRAW_CODES: &[&str] = &[
    "agreed",
    "stalemate",
    "repetition",
    "insufficient",
    "timevsinsufficient",
    "50move",
];

fn result_from_sides(white: &str, black: &str) -> GameResult {
    if white == "win" {
        GameResult::WhiteWins
    } else if black == "win" {
        GameResult::BlackWins
    } else if DRAW_CODES.contains(&white) || DRAW_CODES.contains(&black) {
        GameResult::Draw
    } else {
        GameResult::Unknown
    }
}

impl ProviderGame {
    /// Convert into a portable record; games without movetext are
    /// dropped here rather than failing downstream.
    pub fn into_record(self) -> Option<GameRecord> {
        let movetext = self.pgn.filter(|pgn| !pgn.trim().is_empty())?;
        let id = self
            .url
            .rsplit('/')
            .next()
            .filter(|segment| !segment.is_empty())
            .unwrap_or("unknown")
            .to_string();
        let result = result_from_sides(&self.white.result, &self.black.result);
        let end_time = DateTime::from_timestamp(self.end_time, 0).unwrap_or_default();

        Some(GameRecord {
            id,
            url: self.url,
            white: PlayerSummary {
                username: self.white.username,
                rating: self.white.rating,
            },
            black: PlayerSummary {
                username: self.black.username,
                rating: self.black.rating,
            },
            result,
            time_control: self.time_control,
            end_time,
            movetext,
        })
    }
}

/// Convert a full response, dropping records without movetext.
pub fn records_from_response(response: GamesResponse) -> Vec<GameRecord> {
    response
        .games
        .into_iter()
        .filter_map(ProviderGame::into_record)
        .collect()
}
