use serde::{Deserialize, Serialize};

use crate::domain::membership::MemberProjection;

/// The result of a two-team split: two disjoint ordered member sequences.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DivisionResult {
    pub team_a: Vec<MemberProjection>,
    pub team_b: Vec<MemberProjection>,
}

impl DivisionResult {
    pub fn member_count(&self) -> usize {
        self.team_a.len() + self.team_b.len()
    }
}
