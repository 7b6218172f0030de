//! Move proposals produced by ushers and consumed by kernels.

use serde::{Deserialize, Serialize};

use cemc_core::SiteFlip;

/// Kind of move performed by an usher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MoveKind {
    /// Single-site species change.
    Flip,
    /// Two-site species exchange.
    Swap,
    /// Table-directed exchange across linked sublattices.
    TableSwap,
    /// Stoichiometric reaction changing species counts.
    ReactionFlip,
}

impl MoveKind {
    /// Stable label used in acceptance-rate reporting.
    pub fn as_str(&self) -> &'static str {
        match self {
            MoveKind::Flip => "flip",
            MoveKind::Swap => "swap",
            MoveKind::TableSwap => "table-swap",
            MoveKind::ReactionFlip => "reaction-flip",
        }
    }
}

/// A candidate step together with its detailed-balance correction.
///
/// `log_ratio` is `ln(p_reverse / p_forward)` for the proposal mechanism; it
/// is zero for symmetric moves and enters the Metropolis exponent directly.
/// An empty `step` is a null move: it must still be evaluated and counted as
/// a rejection, never dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Proposal {
    /// Site flips making up the move (empty for a null move).
    pub step: Vec<SiteFlip>,
    /// Natural log of the reverse-to-forward proposal probability ratio.
    pub log_ratio: f64,
    /// Move family that produced the proposal.
    pub kind: MoveKind,
    /// Non-fatal diagnostic attached to null moves (e.g. a table entry whose
    /// species is absent from the structure).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl Proposal {
    /// A proposal carrying an actual step.
    pub fn step(kind: MoveKind, step: Vec<SiteFlip>, log_ratio: f64) -> Self {
        Self {
            step,
            log_ratio,
            kind,
            note: None,
        }
    }

    /// A null move, optionally annotated with the reason.
    pub fn null(kind: MoveKind, note: impl Into<Option<String>>) -> Self {
        Self {
            step: Vec::new(),
            log_ratio: 0.0,
            kind,
            note: note.into(),
        }
    }

    /// Whether this proposal is a null move.
    pub fn is_null(&self) -> bool {
        self.step.is_empty()
    }
}
