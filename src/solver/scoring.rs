use crate::domain::{Label, LabelRules, Team};

use super::SolverMember;

pub const EVEN_WEIGHT: i64 = 5;
pub const SIZE_WEIGHT: i64 = 3;

/// `score(A, B) = 5 * Σ_{L: rules[L]=even} |countA(L) - countB(L)| + 3 * ||A| - |B||`
pub fn score(members: &[SolverMember], assignment: &[Team], rules: &LabelRules) -> i64 {
    let mut size_a: i64 = 0;
    let mut size_b: i64 = 0;
    let mut label_penalty: i64 = 0;

    for label in rules.even_labels() {
        let (count_a, count_b) = count_label(members, assignment, label);
        label_penalty += (count_a - count_b).abs();
    }

    for team in assignment {
        match team {
            Team::TeamA => size_a += 1,
            Team::TeamB => size_b += 1,
            Team::None => {}
        }
    }

    EVEN_WEIGHT * label_penalty + SIZE_WEIGHT * (size_a - size_b).abs()
}

fn count_label(members: &[SolverMember], assignment: &[Team], label: Label) -> (i64, i64) {
    let mut count_a = 0i64;
    let mut count_b = 0i64;

    for (member, team) in members.iter().zip(assignment) {
        if !member.labels.contains(&label) {
            continue;
        }
        match team {
            Team::TeamA => count_a += 1,
            Team::TeamB => count_b += 1,
            Team::None => {}
        }
    }

    (count_a, count_b)
}

/// Does this assignment respect the hard `same_team` constraint for every
/// holder of `rules.same_team_label()`?
pub fn respects_same_team(members: &[SolverMember], assignment: &[Team], rules: &LabelRules) -> bool {
    let Some(label) = rules.same_team_label() else {
        return true;
    };

    let mut seen: Option<Team> = None;
    for (member, team) in members.iter().zip(assignment) {
        if !member.labels.contains(&label) {
            continue;
        }
        match seen {
            None => seen = Some(*team),
            Some(prev) => {
                if prev != *team {
                    return false;
                }
            }
        }
    }

    true
}
