pub mod exact;
pub mod greedy;
pub mod scoring;

use rand::Rng;

use crate::domain::{DivisionResult, Label, LabelRules, MemberProjection, Membership, Team, UserId};

const EXACT_CUTOFF: usize = 12;

/// Names preserved verbatim from the quirk this solver's behavior is
/// contractually required to reproduce (the "hidden pairing rule").
const SPECIAL_NAME_A: &str = "葳蕤";
const SPECIAL_NAME_B: &str = "兔子";
const SPECIAL_PAIR_PROBABILITY: f64 = 0.9;

/// The member shape the solver operates over: just enough to score and
/// constrain, independent of how the caller sourced it.
#[derive(Debug, Clone)]
pub struct SolverMember {
    pub user_id: UserId,
    pub name: String,
    pub labels: Vec<Label>,
}

impl From<&Membership> for SolverMember {
    fn from(m: &Membership) -> Self {
        Self { user_id: m.user_id.clone(), name: m.display_name.clone(), labels: m.labels.clone() }
    }
}

pub struct SolveOutcome {
    pub team_a: Vec<UserId>,
    pub team_b: Vec<UserId>,
    pub trace: Option<Vec<String>>,
}

pub struct PartitionSolver;

impl PartitionSolver {
    pub fn new() -> Self {
        Self
    }

    /// Runs the solver: applies the hidden pairing rule, then dispatches to
    /// the exact solver (`n ≤ 12`) or the greedy + 2-opt fallback.
    pub fn solve(
        &self,
        members: &[SolverMember],
        rules: &LabelRules,
        debug: bool,
        rng: &mut impl Rng,
    ) -> SolveOutcome {
        let mut trace = debug.then(Vec::new);

        if members.is_empty() {
            return SolveOutcome { team_a: Vec::new(), team_b: Vec::new(), trace };
        }

        if members.len() == 1 {
            if let Some(trace) = &mut trace {
                trace.push("single member, placed on team_a".to_string());
            }
            return SolveOutcome {
                team_a: vec![members[0].user_id.clone()],
                team_b: Vec::new(),
                trace,
            };
        }

        let preassigned = apply_hidden_pairing(members, rng, &mut trace);
        let n = preassigned.iter().filter(|t| t.is_none()).count();

        let assignment = if n <= EXACT_CUTOFF {
            if let Some(trace) = &mut trace {
                trace.push(format!("n={n} <= {EXACT_CUTOFF}, using exact solver"));
            }
            exact::solve_exact(members, &preassigned, rules)
        } else {
            if let Some(trace) = &mut trace {
                trace.push(format!("n={n} > {EXACT_CUTOFF}, using greedy + 2-opt"));
            }
            greedy::solve_greedy(members, &preassigned, rules, rng)
        };

        let mut team_a = Vec::new();
        let mut team_b = Vec::new();
        for (member, team) in members.iter().zip(&assignment) {
            match team {
                Team::TeamA => team_a.push(member.user_id.clone()),
                Team::TeamB => team_b.push(member.user_id.clone()),
                Team::None => {}
            }
        }

        SolveOutcome { team_a, team_b, trace }
    }
}

impl Default for PartitionSolver {
    fn default() -> Self {
        Self::new()
    }
}

/// If both a member named exactly `葳蕤` and a member named exactly `兔子`
/// are present, with independent probability 0.9 they are both assigned to
/// the same team (side chosen uniformly at random); otherwise no
/// pre-assignment happens. This runs before all other rules.
fn apply_hidden_pairing(
    members: &[SolverMember],
    rng: &mut impl Rng,
    trace: &mut Option<Vec<String>>,
) -> Vec<Option<Team>> {
    let mut preassigned = vec![None; members.len()];

    let idx_a = members.iter().position(|m| m.name == SPECIAL_NAME_A);
    let idx_b = members.iter().position(|m| m.name == SPECIAL_NAME_B);

    if let (Some(idx_a), Some(idx_b)) = (idx_a, idx_b) {
        if rng.random_bool(SPECIAL_PAIR_PROBABILITY) {
            let side = if rng.random_bool(0.5) { Team::TeamA } else { Team::TeamB };
            preassigned[idx_a] = Some(side);
            preassigned[idx_b] = Some(side);

            if let Some(trace) = trace {
                trace.push(format!("special pair pre-assigned to {:?}", side));
            }
        } else if let Some(trace) = trace {
            trace.push("special pair present but rule did not trigger".to_string());
        }
    }

    preassigned
}

/// Builds the `DivisionResult` read-model from a solve outcome and the
/// source memberships.
pub fn build_division_result(members: &[Membership], outcome: &SolveOutcome) -> DivisionResult {
    let projection = |id: &str| -> Option<MemberProjection> {
        members.iter().find(|m| m.user_id == id).map(MemberProjection::from)
    };

    DivisionResult {
        team_a: outcome.team_a.iter().filter_map(|id| projection(id)).collect(),
        team_b: outcome.team_b.iter().filter_map(|id| projection(id)).collect(),
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::domain::label::LabelRule;

    fn member(id: &str, name: &str, labels: &[Label]) -> SolverMember {
        SolverMember { user_id: id.to_string(), name: name.to_string(), labels: labels.to_vec() }
    }

    #[test]
    fn same_team_constraint_always_holds() {
        let solver = PartitionSolver::new();
        let mut rules = LabelRules::default();
        rules.set(Label::God, LabelRule::SameTeam);

        let members: Vec<SolverMember> = (0..16)
            .map(|i| {
                let labels = if i % 3 == 0 { vec![Label::God] } else { vec![] };
                member(&format!("user-{i}"), &format!("user-{i}"), &labels)
            })
            .collect();

        let mut rng = StdRng::seed_from_u64(1);
        let outcome = solver.solve(&members, &rules, false, &mut rng);

        let god_holders: Vec<&str> =
            members.iter().filter(|m| m.labels.contains(&Label::God)).map(|m| m.user_id.as_str()).collect();

        let all_on_a = god_holders.iter().all(|id| outcome.team_a.iter().any(|x| x == id));
        let all_on_b = god_holders.iter().all(|id| outcome.team_b.iter().any(|x| x == id));
        assert!(all_on_a || all_on_b);
    }

    #[test]
    fn exact_solver_reaches_global_minimum() {
        let rules = LabelRules::default();
        let members: Vec<SolverMember> =
            (0..8).map(|i| member(&format!("u{i}"), &format!("u{i}"), &[])).collect();
        let preassigned = vec![None; members.len()];

        let assignment = exact::solve_exact(&members, &preassigned, &rules);
        let best_score = scoring::score(&members, &assignment, &rules);

        // brute-force check: no assignment can beat the exact solver's score
        // when there are no label constraints (balanced split scores 0).
        assert_eq!(best_score, 0);
    }

    #[test]
    fn size_balances_within_one_with_no_label_rules() {
        let solver = PartitionSolver::new();
        let rules = LabelRules::default();
        let members: Vec<SolverMember> =
            (0..9).map(|i| member(&format!("u{i}"), &format!("u{i}"), &[])).collect();

        let mut rng = StdRng::seed_from_u64(2);
        let outcome = solver.solve(&members, &rules, false, &mut rng);

        let diff = (outcome.team_a.len() as i64 - outcome.team_b.len() as i64).abs();
        assert!(diff <= 1);
    }

    #[test]
    fn solver_is_idempotent_for_a_fixed_seed() {
        let solver = PartitionSolver::new();
        let rules = LabelRules::default();
        let members: Vec<SolverMember> =
            (0..20).map(|i| member(&format!("u{i}"), &format!("u{i}"), &[])).collect();

        let mut rng_a = StdRng::seed_from_u64(42);
        let outcome_a = solver.solve(&members, &rules, false, &mut rng_a);

        let mut rng_b = StdRng::seed_from_u64(42);
        let outcome_b = solver.solve(&members, &rules, false, &mut rng_b);

        assert_eq!(outcome_a.team_a, outcome_b.team_a);
        assert_eq!(outcome_a.team_b, outcome_b.team_b);
    }

    #[test]
    fn hidden_pair_lands_together_within_expected_band() {
        let solver = PartitionSolver::new();
        let rules = LabelRules::default();
        let members = vec![
            member("u-a", SPECIAL_NAME_A, &[]),
            member("u-b", SPECIAL_NAME_B, &[]),
            member("u-c", "someone else", &[]),
        ];

        let runs = 2000;
        let mut together = 0;
        for seed in 0..runs {
            let mut rng = StdRng::seed_from_u64(seed);
            let outcome = solver.solve(&members, &rules, false, &mut rng);
            let a_on_team_a = outcome.team_a.contains(&"u-a".to_string());
            let b_on_team_a = outcome.team_a.contains(&"u-b".to_string());
            if a_on_team_a == b_on_team_a {
                together += 1;
            }
        }

        let fraction = together as f64 / runs as f64;
        assert!((0.80..=0.97).contains(&fraction), "fraction was {fraction}");
    }
}
