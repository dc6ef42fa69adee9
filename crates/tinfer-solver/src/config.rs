//! Solver settings.

use crate::context::Optimism;
use serde::{Deserialize, Serialize};
use tinfer_common::limits::{MAX_SOLVE_ROUNDS, MAX_SUBTYPE_DEPTH};

/// Tunables for one inference session.
///
/// Every field has a default, so a JSON document only needs the fields it
/// changes:
///
/// ```json
/// { "maxRounds": 200, "dumpRounds": true }
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SolverConfig {
    /// Rounds of the fixed-point loop before the solver stops and marks
    /// whatever is left unsolvable.
    pub max_rounds: u32,
    /// Nesting depth at which subtype checks give up and answer `false`.
    pub max_subtype_depth: u32,
    /// Whether worst-case unification treats distinct unresolved variables as
    /// comparable when computing bounds shared by every remaining overload.
    pub worst_case_optimism: Optimism,
    /// Log the node table at `trace` level after each round.
    pub dump_rounds: bool,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            max_rounds: MAX_SOLVE_ROUNDS,
            max_subtype_depth: MAX_SUBTYPE_DEPTH,
            worst_case_optimism: Optimism::Pessimistic,
            dump_rounds: false,
        }
    }
}

impl SolverConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
#[path = "../tests/config_tests.rs"]
mod tests;
