use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::cards::format_cards;
use crate::game::HandState;

/// Immutable summary of one completed hand.
///
/// All four body fields are flat text so the record can be stored as-is in
/// a single table row keyed by `id`.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct HandHistory {
    /// Session id the hand was played under
    pub id: String,
    /// Starting stack, dealer and blind seats
    pub main_info: String,
    /// Every seat's hole cards
    pub dealt: String,
    /// The whole action log, space-joined
    pub actions: String,
    /// Signed net chips per seat
    pub result: String,
    /// Timestamp of finalization (RFC3339 format)
    #[serde(default)]
    pub ts: Option<String>,
}

impl HandHistory {
    /// Formats the history of a hand. Callers only invoke this once the
    /// hand is finished; see [`crate::engine::Engine::finalize`].
    pub fn from_state(id: impl Into<String>, state: &HandState) -> Self {
        Self {
            id: id.into(),
            main_info: format_main_info(state),
            dealt: format_dealt(state),
            actions: state.log().join(" "),
            result: format_result(state),
            ts: Some(Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)),
        }
    }

    /// Parses `result` back into `(seat position, net chips)` pairs.
    /// Malformed entries are skipped.
    pub fn net_by_seat(&self) -> Vec<(usize, i64)> {
        self.result
            .split(';')
            .filter_map(|entry| {
                let (label, value) = entry.trim().split_once(':')?;
                let seat = label.trim().strip_prefix("Player ")?.parse().ok()?;
                let net = value.trim().parse::<i64>().ok()?;
                Some((seat, net))
            })
            .collect()
    }

    pub fn net_for(&self, seat: usize) -> Option<i64> {
        self.net_by_seat()
            .into_iter()
            .find_map(|(s, net)| (s == seat).then_some(net))
    }
}

pub fn format_main_info(state: &HandState) -> String {
    let cfg = state.config();
    let label = |idx: usize| state.seat(idx).map_or(idx + 1, |s| s.position());
    format!(
        "Stack {}; Dealer: Player {}; Small blind: Player {} ({}); Big blind: Player {} ({})",
        cfg.starting_stack,
        label(cfg.dealer_index),
        label(cfg.small_blind_index()),
        cfg.small_blind,
        label(cfg.big_blind_index()),
        cfg.big_blind
    )
}

pub fn format_dealt(state: &HandState) -> String {
    state
        .seats()
        .iter()
        .map(|s| {
            let cards = s.hole_cards().map(|h| format_cards(&h)).unwrap_or_default();
            format!("Player {}: {}", s.position(), cards)
        })
        .collect::<Vec<_>>()
        .join("; ")
}

pub fn format_result(state: &HandState) -> String {
    state
        .seats()
        .iter()
        .map(|s| format!("Player {}: {:+}", s.position(), s.net()))
        .collect::<Vec<_>>()
        .join("; ")
}
