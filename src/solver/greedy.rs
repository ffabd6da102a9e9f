use rand::Rng;

use crate::domain::{Label, LabelRules, Team};

use super::SolverMember;
use super::scoring::{respects_same_team, score};

const MAX_SWEEPS: usize = 100;

/// Greedy placement + 2-opt local search, used when the number of free
/// (non-preassigned) members exceeds the exact solver's `n ≤ 12` cutoff.
pub fn solve_greedy(
    members: &[SolverMember],
    preassigned: &[Option<Team>],
    rules: &LabelRules,
    rng: &mut impl Rng,
) -> Vec<Team> {
    let n = members.len();
    let mut assignment: Vec<Team> = vec![Team::None; n];
    let mut locked = vec![false; n];

    for (i, team) in preassigned.iter().enumerate() {
        if let Some(team) = team {
            assignment[i] = *team;
            locked[i] = true;
        }
    }

    // Step 2: place same_team holders on a single fixed side.
    if let Some(same_team_label) = rules.same_team_label() {
        let holder_indices: Vec<usize> =
            (0..n).filter(|&i| members[i].labels.contains(&same_team_label)).collect();

        if !holder_indices.is_empty() {
            let existing_side =
                holder_indices.iter().find_map(|&i| match assignment[i] {
                    Team::None => None,
                    team => Some(team),
                });

            let side = existing_side.unwrap_or_else(|| {
                if rng.random_bool(0.5) { Team::TeamA } else { Team::TeamB }
            });

            for &i in &holder_indices {
                assignment[i] = side;
                locked[i] = true;
            }
        }
    }

    // Step 3/4: place the rest, highest even-label count first, lower-score side first.
    let mut order: Vec<usize> = (0..n).filter(|&i| !locked[i]).collect();
    order.sort_by_key(|&i| std::cmp::Reverse(even_label_count(&members[i], rules)));

    let mut even_labels: Vec<Label> = rules.even_labels().collect();
    even_labels.sort();

    let mut count_a = vec![0i64; even_labels.len()];
    let mut count_b = vec![0i64; even_labels.len()];
    let mut size_a = 0i64;
    let mut size_b = 0i64;

    // seed running counts from any already-placed (locked) members
    for (i, team) in assignment.iter().enumerate() {
        match team {
            Team::TeamA => {
                size_a += 1;
                for (li, label) in even_labels.iter().enumerate() {
                    if members[i].labels.contains(label) {
                        count_a[li] += 1;
                    }
                }
            }
            Team::TeamB => {
                size_b += 1;
                for (li, label) in even_labels.iter().enumerate() {
                    if members[i].labels.contains(label) {
                        count_b[li] += 1;
                    }
                }
            }
            Team::None => {}
        }
    }

    for i in order {
        let member_even: Vec<bool> =
            even_labels.iter().map(|label| members[i].labels.contains(label)).collect();

        let mut label_penalty_a = 0i64;
        let mut label_penalty_b = 0i64;
        for (li, carries) in member_even.iter().enumerate() {
            if *carries {
                label_penalty_a += (count_a[li] + 1 - count_b[li]).abs() - (count_a[li] - count_b[li]).abs();
                label_penalty_b += (count_a[li] - (count_b[li] + 1)).abs() - (count_a[li] - count_b[li]).abs();
            }
        }
        let size_delta_a = (size_a + 1 - size_b).abs() - (size_a - size_b).abs();
        let size_delta_b = (size_a - (size_b + 1)).abs() - (size_a - size_b).abs();

        let score_a = 5 * label_penalty_a + 3 * size_delta_a;
        let score_b = 5 * label_penalty_b + 3 * size_delta_b;

        let place_a = score_a <= score_b;

        assignment[i] = if place_a { Team::TeamA } else { Team::TeamB };

        if place_a {
            size_a += 1;
            for (li, carries) in member_even.iter().enumerate() {
                if *carries {
                    count_a[li] += 1;
                }
            }
        } else {
            size_b += 1;
            for (li, carries) in member_even.iter().enumerate() {
                if *carries {
                    count_b[li] += 1;
                }
            }
        }
    }

    two_opt(members, assignment, &locked, rules)
}

fn even_label_count(member: &SolverMember, rules: &LabelRules) -> usize {
    rules.even_labels().filter(|label| member.labels.contains(label)).count()
}

fn two_opt(
    members: &[SolverMember],
    mut assignment: Vec<Team>,
    locked: &[bool],
    rules: &LabelRules,
) -> Vec<Team> {
    for _sweep in 0..MAX_SWEEPS {
        let a_members: Vec<usize> = (0..assignment.len())
            .filter(|&i| !locked[i] && assignment[i] == Team::TeamA)
            .collect();
        let b_members: Vec<usize> = (0..assignment.len())
            .filter(|&i| !locked[i] && assignment[i] == Team::TeamB)
            .collect();

        let current_score = score(members, &assignment, rules);
        let mut improved = false;

        'scan: for &i in &a_members {
            for &j in &b_members {
                assignment.swap(i, j);
                let ok = respects_same_team(members, &assignment, rules);
                let candidate_score = score(members, &assignment, rules);

                if ok && candidate_score < current_score {
                    improved = true;
                    break 'scan;
                }

                // revert, this swap didn't help
                assignment.swap(i, j);
            }
        }

        if !improved {
            break;
        }
    }

    assignment
}
