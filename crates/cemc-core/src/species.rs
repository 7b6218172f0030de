//! Closed set of species value types occupying lattice sites.

use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

/// A chemical species that may occupy a lattice site.
///
/// This is a closed set with a canonical comparable key rather than an open
/// trait: an ordinary element, a charge-decorated ion, or a vacancy. Only the
/// key participates in equality and ordering, so two `Ion` values with the
/// same symbol and oxidation state are the same species everywhere in the
/// engine (chemical-potential tables, swap tables, site spaces).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Species {
    /// A neutral element identified by its symbol, e.g. `Ni`.
    Element {
        /// Element symbol.
        symbol: String,
    },
    /// A charge-decorated species, e.g. `Li+` or `Ni3+`.
    Ion {
        /// Element symbol.
        symbol: String,
        /// Signed oxidation state.
        oxidation_state: i32,
    },
    /// An empty site.
    Vacancy,
}

impl Species {
    /// Convenience constructor for a neutral element.
    pub fn element(symbol: impl Into<String>) -> Self {
        Species::Element {
            symbol: symbol.into(),
        }
    }

    /// Convenience constructor for a charge-decorated ion.
    pub fn ion(symbol: impl Into<String>, oxidation_state: i32) -> Self {
        Species::Ion {
            symbol: symbol.into(),
            oxidation_state,
        }
    }

    /// Canonical key used in chemical-potential and swap-table lookups.
    pub fn canonical_key(&self) -> String {
        match self {
            Species::Element { symbol } => symbol.clone(),
            Species::Ion {
                symbol,
                oxidation_state,
            } => {
                let sign = if *oxidation_state >= 0 { '+' } else { '-' };
                format!("{symbol}{}{}", oxidation_state.abs(), sign)
            }
            Species::Vacancy => "Vac".to_string(),
        }
    }

    /// Formal charge carried by the species (0 for elements and vacancies).
    pub fn charge(&self) -> i32 {
        match self {
            Species::Ion {
                oxidation_state, ..
            } => *oxidation_state,
            _ => 0,
        }
    }

    /// Whether this species is a vacancy.
    pub fn is_vacancy(&self) -> bool {
        matches!(self, Species::Vacancy)
    }
}

impl Display for Species {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.canonical_key())
    }
}
