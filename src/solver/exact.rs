use crate::domain::{LabelRules, Team};

use super::SolverMember;
use super::scoring::{respects_same_team, score};

/// Enumerates all `2^n` assignments of the free (non-preassigned) members to
/// A/B, keeping the lowest-scoring assignment that respects the hard
/// `same_team` constraint. Ties are broken by lowest bitmask, i.e. first
/// encountered.
pub fn solve_exact(
    members: &[SolverMember],
    preassigned: &[Option<Team>],
    rules: &LabelRules,
) -> Vec<Team> {
    let free_indices: Vec<usize> =
        (0..members.len()).filter(|&i| preassigned[i].is_none()).collect();
    let n = free_indices.len();

    debug_assert!(n <= 12, "exact solver called with n={n} > 12");

    let mut best: Option<(i64, Vec<Team>)> = None;
    let total: u32 = 1u32 << n;

    for mask in 0..total {
        let mut assignment: Vec<Team> = preassigned
            .iter()
            .map(|t| t.unwrap_or(Team::TeamA))
            .collect();

        for (bit, &idx) in free_indices.iter().enumerate() {
            assignment[idx] = if (mask >> bit) & 1 == 0 { Team::TeamA } else { Team::TeamB };
        }

        if !respects_same_team(members, &assignment, rules) {
            continue;
        }

        let candidate_score = score(members, &assignment, rules);

        match &best {
            Some((best_score, _)) if *best_score <= candidate_score => {}
            _ => best = Some((candidate_score, assignment)),
        }
    }

    // |members| = 0 falls out naturally (n = 0, mask = 0, empty assignment).
    best.map(|(_, assignment)| assignment).unwrap_or_default()
}
