//! Decision policy: hand state plus analysis in, one action out.
//!
//! [`decide`] is a pure function of its inputs. It never mutates the hand and
//! never touches the execution channel.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::analysis::{DiscardCandidate, HandAnalysis, MeldKind, MeldOffer};
use crate::core::config::{AutoPlayConfig, Strategy};
use crate::core::danger::{DangerTable, danger_level, risk_of, safest_tile};
use crate::core::hand::HandState;
use crate::core::phase::{PhaseError, TurnPhase};
use crate::core::tile::Tile;

const AGARI_CONFIDENCE: f64 = 1.0;
const AGGRESSIVE_CONFIDENCE: f64 = 0.9;
const REGRESSING_CONFIDENCE: f64 = 0.7;
const DEFENSIVE_CONFIDENCE: f64 = 0.8;
const BALANCED_CONFIDENCE: f64 = 0.85;
const MELD_CONFIDENCE: f64 = 0.75;
/// Danger above this level lowers balanced confidence even below the defense threshold.
const PARTIAL_RISK_LEVEL: f64 = 0.1;
const PARTIAL_RISK_SCALE: f64 = 0.8;

pub const REASON_DISABLED: &str = "disabled";
pub const REASON_NO_CANDIDATE: &str = "no suitable candidate";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown action {0:?} (expected discard, meld, riichi, agari or pass)")]
pub struct UnknownActionError(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Discard,
    Meld,
    Riichi,
    Agari,
    Pass,
}

impl Action {
    pub const fn as_str(self) -> &'static str {
        match self {
            Action::Discard => "discard",
            Action::Meld => "meld",
            Action::Riichi => "riichi",
            Action::Agari => "agari",
            Action::Pass => "pass",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = UnknownActionError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "discard" => Ok(Action::Discard),
            "meld" => Ok(Action::Meld),
            "riichi" => Ok(Action::Riichi),
            "agari" => Ok(Action::Agari),
            "pass" => Ok(Action::Pass),
            other => Err(UnknownActionError(other.to_string())),
        }
    }
}

/// A meld claim ready for dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MeldCall {
    pub kind: MeldKind,
    pub tile: Tile,
    pub combination: Vec<Tile>,
}

impl From<&MeldOffer> for MeldCall {
    fn from(offer: &MeldOffer) -> Self {
        Self {
            kind: offer.kind,
            tile: offer.tile,
            combination: offer.combination.clone(),
        }
    }
}

/// Outcome of one decision cycle. Built fresh per call and consumed by the execution gate.
#[derive(Debug, PartialEq, Serialize)]
pub struct Decision {
    action: Action,
    tile: Option<Tile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    meld: Option<MeldCall>,
    confidence: f64,
    reason: String,
}

impl Decision {
    pub fn pass(reason: impl Into<String>) -> Self {
        Self {
            action: Action::Pass,
            tile: None,
            meld: None,
            confidence: 0.0,
            reason: reason.into(),
        }
    }

    pub fn discard(tile: Tile, confidence: f64, reason: impl Into<String>) -> Self {
        Self {
            action: Action::Discard,
            tile: Some(tile),
            meld: None,
            confidence,
            reason: reason.into(),
        }
    }

    pub fn meld(call: MeldCall, confidence: f64, reason: impl Into<String>) -> Self {
        Self {
            action: Action::Meld,
            tile: Some(call.tile),
            meld: Some(call),
            confidence,
            reason: reason.into(),
        }
    }

    pub fn riichi(confidence: f64, reason: impl Into<String>) -> Self {
        Self {
            action: Action::Riichi,
            tile: None,
            meld: None,
            confidence,
            reason: reason.into(),
        }
    }

    pub fn agari(confidence: f64, reason: impl Into<String>) -> Self {
        Self {
            action: Action::Agari,
            tile: None,
            meld: None,
            confidence,
            reason: reason.into(),
        }
    }

    pub fn action(&self) -> Action {
        self.action
    }

    pub fn tile(&self) -> Option<Tile> {
        self.tile
    }

    pub fn meld_call(&self) -> Option<&MeldCall> {
        self.meld.as_ref()
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    pub fn band(&self) -> ConfidenceBand {
        ConfidenceBand::of(self.confidence)
    }

    /// One-line human summary, e.g. `discard 5m (90%): attack discard 5m ...`.
    pub fn summary(&self) -> String {
        let tile = self
            .tile
            .map(|tile| format!(" {tile}"))
            .unwrap_or_default();
        format!(
            "{}{} ({:.1}%): {}",
            self.action,
            tile,
            self.confidence * 100.0,
            self.reason
        )
    }
}

/// Coarse confidence grouping used when presenting decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfidenceBand {
    /// Below 0.6.
    Low,
    /// From 0.6 up to 0.8.
    Medium,
    High,
}

impl ConfidenceBand {
    pub fn of(confidence: f64) -> Self {
        if confidence < 0.6 {
            Self::Low
        } else if confidence < 0.8 {
            Self::Medium
        } else {
            Self::High
        }
    }
}

/// Choose an action for the current turn.
///
/// Order of precedence: disabled, invalid phase, complete hand (draw phase),
/// meld offer (choice phase, `auto_meld`), then the configured discard strategy.
pub fn decide(
    hand: &HandState,
    phase: TurnPhase,
    analysis: &HandAnalysis,
    danger: Option<&DangerTable>,
    config: &AutoPlayConfig,
) -> Result<Decision, PhaseError> {
    if !config.enabled {
        return Ok(Decision::pass(REASON_DISABLED));
    }
    let phase = phase.require_decidable()?;

    if phase == TurnPhase::Draw && analysis.is_complete() {
        return Ok(Decision::agari(AGARI_CONFIDENCE, "hand is complete"));
    }

    if phase == TurnPhase::Choice && config.auto_meld {
        if let Some(decision) = analysis.meld.as_ref().and_then(meld_decision) {
            return Ok(decision);
        }
    }

    Ok(discard_decision(hand, analysis, danger, config))
}

fn meld_decision(offer: &MeldOffer) -> Option<Decision> {
    let best = offer.improving.first()?;
    Some(Decision::meld(
        MeldCall::from(offer),
        MELD_CONFIDENCE,
        format!(
            "{} on {} (shanten after {}, waits {})",
            offer.kind, offer.tile, offer.shanten_after, best.waits
        ),
    ))
}

fn discard_decision(
    hand: &HandState,
    analysis: &HandAnalysis,
    danger: Option<&DangerTable>,
    config: &AutoPlayConfig,
) -> Decision {
    let level = danger_level(hand, danger);
    let decision = match config.strategy {
        Strategy::Aggressive => aggressive(analysis),
        Strategy::Defensive => defensive(hand, danger, level, config)
            .or_else(|| balanced(hand, analysis, danger, level, config)),
        Strategy::Balanced => balanced(hand, analysis, danger, level, config),
    };
    decision.unwrap_or_else(|| Decision::pass(REASON_NO_CANDIDATE))
}

fn aggressive(analysis: &HandAnalysis) -> Option<Decision> {
    if let Some(best) = analysis.discards.first() {
        return Some(Decision::discard(
            best.discard,
            AGGRESSIVE_CONFIDENCE,
            candidate_reason("attack discard", best),
        ));
    }
    analysis.regressing.first().map(|best| {
        Decision::discard(
            best.discard,
            REGRESSING_CONFIDENCE,
            candidate_reason("shanten-regressing discard", best),
        )
    })
}

/// Safest held tile, only when hand danger is strictly above the threshold.
fn defensive(
    hand: &HandState,
    danger: Option<&DangerTable>,
    level: f64,
    config: &AutoPlayConfig,
) -> Option<Decision> {
    if level <= config.defense_threshold {
        return None;
    }
    let tile = safest_tile(hand, danger)?;
    Some(Decision::discard(
        tile,
        DEFENSIVE_CONFIDENCE,
        format!(
            "defensive discard {tile} (risk {:.2}, hand danger {level:.2})",
            risk_of(danger, tile)
        ),
    ))
}

fn balanced(
    hand: &HandState,
    analysis: &HandAnalysis,
    danger: Option<&DangerTable>,
    level: f64,
    config: &AutoPlayConfig,
) -> Option<Decision> {
    if let Some(decision) = defensive(hand, danger, level, config) {
        return Some(decision);
    }
    let best = analysis.discards.first()?;
    let mut confidence = BALANCED_CONFIDENCE;
    if level > PARTIAL_RISK_LEVEL {
        confidence *= PARTIAL_RISK_SCALE;
    }
    Some(Decision::discard(
        best.discard,
        confidence,
        candidate_reason("balanced discard", best),
    ))
}

fn candidate_reason(label: &str, candidate: &DiscardCandidate) -> String {
    format!(
        "{label} {} (waits {}, score {})",
        candidate.discard, candidate.waits, candidate.score
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tile(s: &str) -> Tile {
        s.parse().expect("tile")
    }

    fn candidate(discard: &str, waits: u32, score: u32) -> DiscardCandidate {
        DiscardCandidate {
            discard: tile(discard),
            waits,
            score,
        }
    }

    fn enabled(strategy: Strategy) -> AutoPlayConfig {
        AutoPlayConfig {
            enabled: true,
            strategy,
            ..AutoPlayConfig::default()
        }
    }

    /// 13 tiles: draw phase.
    fn draw_hand() -> HandState {
        HandState::from_notation("123456789m1234p").expect("hand")
    }

    fn analysis_with(discards: Vec<DiscardCandidate>) -> HandAnalysis {
        HandAnalysis {
            shanten: 1,
            discards,
            ..HandAnalysis::default()
        }
    }

    #[test]
    fn confidence_bands_split_at_sixty_and_eighty_percent() {
        assert_eq!(ConfidenceBand::of(0.0), ConfidenceBand::Low);
        assert_eq!(ConfidenceBand::of(0.59), ConfidenceBand::Low);
        assert_eq!(ConfidenceBand::of(0.6), ConfidenceBand::Medium);
        assert_eq!(Decision::discard(tile("1p"), 0.68, "risky").band(), ConfidenceBand::Medium);
        assert_eq!(ConfidenceBand::of(0.8), ConfidenceBand::High);
        assert_eq!(Decision::agari(1.0, "complete").band(), ConfidenceBand::High);
    }

    #[test]
    fn disabled_passes_even_on_invalid_phase() {
        let hand = HandState::from_notation("123m").expect("hand");
        let decision = decide(
            &hand,
            hand.phase(),
            &analysis_with(vec![candidate("1m", 4, 0)]),
            None,
            &AutoPlayConfig::default(),
        )
        .expect("decide");
        assert_eq!(decision.action(), Action::Pass);
        assert_eq!(decision.confidence(), 0.0);
        assert_eq!(decision.reason(), REASON_DISABLED);
    }

    #[test]
    fn invalid_phase_is_an_error() {
        let hand = HandState::from_notation("123m").expect("hand");
        let err = decide(
            &hand,
            hand.phase(),
            &HandAnalysis::default(),
            None,
            &enabled(Strategy::Balanced),
        )
        .expect_err("phase error");
        assert_eq!(err, PhaseError { tile_count: 3 });
    }

    #[test]
    fn complete_hand_declares_agari_for_every_strategy() {
        let hand = draw_hand();
        let analysis = HandAnalysis {
            shanten: -1,
            discards: vec![candidate("1m", 8, 0)],
            ..HandAnalysis::default()
        };
        for strategy in Strategy::ALL {
            let decision =
                decide(&hand, TurnPhase::Draw, &analysis, None, &enabled(strategy)).expect("ok");
            assert_eq!(decision.action(), Action::Agari);
            assert_eq!(decision.confidence(), 1.0);
        }
    }

    #[test]
    fn complete_hand_in_choice_phase_is_not_agari() {
        let hand = HandState::from_notation("123456789m12345p").expect("hand");
        let analysis = HandAnalysis {
            shanten: -1,
            discards: vec![candidate("5p", 8, 0)],
            ..HandAnalysis::default()
        };
        let decision = decide(
            &hand,
            TurnPhase::Choice,
            &analysis,
            None,
            &enabled(Strategy::Aggressive),
        )
        .expect("ok");
        assert_eq!(decision.action(), Action::Discard);
    }

    #[test]
    fn aggressive_takes_top_ranked_discard() {
        let hand = draw_hand();
        let analysis = analysis_with(vec![candidate("5m", 8, 2000), candidate("9m", 6, 8000)]);
        let table = DangerTable::from_risks([(tile("5m"), 0.9)]).expect("table");
        let decision = decide(
            &hand,
            TurnPhase::Draw,
            &analysis,
            Some(&table),
            &enabled(Strategy::Aggressive),
        )
        .expect("ok");
        assert_eq!(decision.action(), Action::Discard);
        assert_eq!(decision.tile(), Tile::new(4));
        assert_eq!(decision.confidence(), 0.9);
        assert!(decision.reason().contains("5m"));
        assert!(decision.reason().contains("waits 8"));
    }

    #[test]
    fn aggressive_falls_back_to_regressing_results() {
        let analysis = HandAnalysis {
            shanten: 2,
            regressing: vec![candidate("1p", 20, 0)],
            ..HandAnalysis::default()
        };
        let decision = decide(
            &draw_hand(),
            TurnPhase::Draw,
            &analysis,
            None,
            &enabled(Strategy::Aggressive),
        )
        .expect("ok");
        assert_eq!(decision.tile(), Some(tile("1p")));
        assert_eq!(decision.confidence(), 0.7);
    }

    #[test]
    fn defensive_discards_safest_tile_when_danger_exceeds_threshold() {
        let hand = draw_hand();
        let mut risks: Vec<(Tile, f64)> = hand.held().map(|t| (t, 0.3)).collect();
        risks.push((tile("5m"), 0.5));
        risks.push((tile("2p"), 0.01));
        let table = DangerTable::from_risks(risks).expect("table");
        let decision = decide(
            &hand,
            TurnPhase::Draw,
            &analysis_with(vec![candidate("5m", 8, 0)]),
            Some(&table),
            &enabled(Strategy::Defensive),
        )
        .expect("ok");
        assert_eq!(decision.action(), Action::Discard);
        assert_eq!(decision.tile(), Tile::new(10));
        assert_eq!(decision.confidence(), 0.8);
    }

    #[test]
    fn defensive_delegates_to_balanced_when_safe() {
        let decision = decide(
            &draw_hand(),
            TurnPhase::Draw,
            &analysis_with(vec![candidate("9m", 8, 0)]),
            None,
            &enabled(Strategy::Defensive),
        )
        .expect("ok");
        assert_eq!(decision.tile(), Some(tile("9m")));
        assert_eq!(decision.confidence(), 0.85);
    }

    #[test]
    fn danger_equal_to_threshold_stays_offensive() {
        let table = DangerTable::from_risks([(tile("3m"), 0.15)]).expect("table");
        let decision = decide(
            &draw_hand(),
            TurnPhase::Draw,
            &analysis_with(vec![candidate("9m", 8, 0)]),
            Some(&table),
            &enabled(Strategy::Balanced),
        )
        .expect("ok");
        assert_eq!(decision.tile(), Some(tile("9m")));
        assert!((decision.confidence() - 0.85 * 0.8).abs() < 1e-9);
    }

    #[test]
    fn balanced_keeps_full_confidence_at_low_danger() {
        let table = DangerTable::from_risks([(tile("3m"), 0.1)]).expect("table");
        let decision = decide(
            &draw_hand(),
            TurnPhase::Draw,
            &analysis_with(vec![candidate("9m", 8, 0)]),
            Some(&table),
            &enabled(Strategy::Balanced),
        )
        .expect("ok");
        assert_eq!(decision.confidence(), 0.85);
    }

    #[test]
    fn balanced_defends_above_threshold() {
        let table =
            DangerTable::from_risks([(tile("3m"), 0.6), (tile("1m"), 0.2)]).expect("table");
        let hand = HandState::from_notation("1113m").expect("hand");
        let decision = decide(
            &hand,
            TurnPhase::Draw,
            &analysis_with(vec![candidate("3m", 8, 0)]),
            Some(&table),
            &enabled(Strategy::Balanced),
        )
        .expect("ok");
        assert_eq!(decision.tile(), Some(tile("1m")));
        assert_eq!(decision.confidence(), 0.8);
        assert!(decision.reason().contains("defensive discard 1m"));
    }

    #[test]
    fn no_candidate_passes() {
        for strategy in Strategy::ALL {
            let decision = decide(
                &draw_hand(),
                TurnPhase::Draw,
                &HandAnalysis::default(),
                None,
                &enabled(strategy),
            )
            .expect("ok");
            assert_eq!(decision.action(), Action::Pass);
            assert_eq!(decision.confidence(), 0.0);
            assert_eq!(decision.reason(), REASON_NO_CANDIDATE);
        }
    }

    fn meld_analysis(improving: Vec<DiscardCandidate>) -> HandAnalysis {
        HandAnalysis {
            shanten: 2,
            discards: vec![candidate("9m", 4, 0)],
            regressing: Vec::new(),
            meld: Some(MeldOffer {
                tile: tile("5p"),
                kind: MeldKind::Sequence,
                combination: vec![tile("4p"), tile("5p"), tile("6p")],
                shanten_after: 1,
                improving,
            }),
        }
    }

    #[test]
    fn improving_meld_is_claimed_with_its_kind() {
        let hand = HandState::from_notation("123456789m466p11z").expect("hand");
        let config = AutoPlayConfig {
            auto_meld: true,
            ..enabled(Strategy::Balanced)
        };
        let decision = decide(
            &hand,
            TurnPhase::Choice,
            &meld_analysis(vec![candidate("1z", 12, 0)]),
            None,
            &config,
        )
        .expect("ok");
        assert_eq!(decision.action(), Action::Meld);
        assert_eq!(decision.confidence(), 0.75);
        let call = decision.meld_call().expect("meld call");
        assert_eq!(call.kind, MeldKind::Sequence);
        assert_eq!(call.combination.len(), 3);
        assert_eq!(decision.tile(), Some(tile("5p")));
    }

    #[test]
    fn meld_without_improvement_falls_through_to_discard() {
        let hand = HandState::from_notation("123456789m466p11z").expect("hand");
        let config = AutoPlayConfig {
            auto_meld: true,
            ..enabled(Strategy::Balanced)
        };
        let decision = decide(
            &hand,
            TurnPhase::Choice,
            &meld_analysis(Vec::new()),
            None,
            &config,
        )
        .expect("ok");
        assert_eq!(decision.action(), Action::Discard);
        assert_eq!(decision.tile(), Some(tile("9m")));
    }

    #[test]
    fn meld_offer_ignored_without_auto_meld() {
        let hand = HandState::from_notation("123456789m466p11z").expect("hand");
        let decision = decide(
            &hand,
            TurnPhase::Choice,
            &meld_analysis(vec![candidate("1z", 12, 0)]),
            None,
            &enabled(Strategy::Balanced),
        )
        .expect("ok");
        assert_eq!(decision.action(), Action::Discard);
    }

    #[test]
    fn identical_inputs_give_identical_decisions() {
        let hand = draw_hand();
        let table = DangerTable::from_risks([(tile("4p"), 0.12)]).expect("table");
        let analysis = analysis_with(vec![candidate("4p", 8, 1000)]);
        for strategy in Strategy::ALL {
            let config = enabled(strategy);
            let first = decide(&hand, TurnPhase::Draw, &analysis, Some(&table), &config);
            let second = decide(&hand, TurnPhase::Draw, &analysis, Some(&table), &config);
            assert_eq!(first, second);
        }
    }

    #[test]
    fn action_names_round_trip_and_reject_unknown() {
        for action in [
            Action::Discard,
            Action::Meld,
            Action::Riichi,
            Action::Agari,
            Action::Pass,
        ] {
            assert_eq!(action.as_str().parse::<Action>(), Ok(action));
        }
        assert_eq!(
            "tsumogiri".parse::<Action>(),
            Err(UnknownActionError("tsumogiri".to_string()))
        );
    }

    #[test]
    fn summary_embeds_tile_and_confidence() {
        let decision = Decision::discard(tile("7z"), 0.8, "defensive discard 7z");
        assert_eq!(decision.summary(), "discard 7z (80.0%): defensive discard 7z");
    }
}
