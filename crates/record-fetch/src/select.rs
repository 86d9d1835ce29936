//! Picking the target record out of a month of games.

use chessbridge_core_types::GameRecord;

/// Select the record to export.
///
/// When the page URL carried a game id, the record whose URL contains
/// it wins; otherwise the most recently dated record is taken. Months
/// with no usable record yield `None`.
pub fn select_record<'a>(
    games: &'a [GameRecord],
    game_id: Option<&str>,
) -> Option<&'a GameRecord> {
    if let Some(id) = game_id {
        if let Some(exact) = games.iter().find(|game| game.url.contains(id)) {
            return Some(exact);
        }
    }
    games.iter().max_by_key(|game| game.end_time)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use chessbridge_core_types::{GameResult, PlayerSummary};

    fn record(id: &str, end_time: i64) -> GameRecord {
        GameRecord {
            id: id.to_string(),
            url: format!("https://www.chess.com/game/live/{id}"),
            white: PlayerSummary {
                username: "anna".to_string(),
                rating: 1500,
            },
            black: PlayerSummary {
                username: "boris".to_string(),
                rating: 1480,
            },
            result: GameResult::WhiteWins,
            time_control: "600".to_string(),
            end_time: Utc.timestamp_opt(end_time, 0).unwrap(),
            movetext: format!("1. e4 e5 ;{id}"),
        }
    }

    #[test]
    fn exact_id_match_wins_over_recency() {
        let games = vec![record("111", 100), record("222", 999)];
        let selected = select_record(&games, Some("111")).expect("record");
        assert_eq!(selected.id, "111");
    }

    #[test]
    fn falls_back_to_most_recent() {
        let games = vec![record("111", 100), record("222", 999), record("333", 500)];
        let selected = select_record(&games, Some("444")).expect("record");
        assert_eq!(selected.id, "222");

        let selected = select_record(&games, None).expect("record");
        assert_eq!(selected.id, "222");
    }

    #[test]
    fn empty_month_selects_nothing() {
        assert!(select_record(&[], None).is_none());
    }
}
