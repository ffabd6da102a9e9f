use serde::{Deserialize, Serialize};

/// The closed vocabulary of labels a membership may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Label {
    God,
    Sister,
    Male,
    Boss,
}

impl Label {
    pub const ALL: [Label; 4] = [Label::God, Label::Sister, Label::Male, Label::Boss];

    pub fn as_str(self) -> &'static str {
        match self {
            Label::God => "god",
            Label::Sister => "sister",
            Label::Male => "male",
            Label::Boss => "boss",
        }
    }

    pub fn parse(s: &str) -> Option<Label> {
        Self::ALL.into_iter().find(|l| l.as_str() == s)
    }
}

/// Policy attached to a label, controlling partition behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelRule {
    #[default]
    None,
    Even,
    SameTeam,
}

impl LabelRule {
    pub fn as_str(self) -> &'static str {
        match self {
            LabelRule::None => "none",
            LabelRule::Even => "even",
            LabelRule::SameTeam => "same_team",
        }
    }

    pub fn parse(s: &str) -> Option<LabelRule> {
        match s {
            "none" => Some(LabelRule::None),
            "even" => Some(LabelRule::Even),
            "same_team" => Some(LabelRule::SameTeam),
            _ => None,
        }
    }
}

/// Mapping from each label in the vocabulary to a rule. Absent entries default to `none`.
/// Serializes as the flat `{label: rule}` map, matching the wire shape of
/// `SetLabelRulesRequest.label_rules`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LabelRules {
    rules: std::collections::BTreeMap<Label, LabelRule>,
}

impl LabelRules {
    pub fn rule_for(&self, label: Label) -> LabelRule {
        self.rules.get(&label).copied().unwrap_or_default()
    }

    pub fn set(&mut self, label: Label, rule: LabelRule) {
        if rule == LabelRule::None {
            self.rules.remove(&label);
        } else {
            self.rules.insert(label, rule);
        }
    }

    /// The at-most-one label with rule `same_team`, per invariant 7.
    pub fn same_team_label(&self) -> Option<Label> {
        self.rules
            .iter()
            .find(|(_, rule)| **rule == LabelRule::SameTeam)
            .map(|(label, _)| *label)
    }

    pub fn even_labels(&self) -> impl Iterator<Item = Label> + '_ {
        self.rules.iter().filter(|(_, rule)| **rule == LabelRule::Even).map(|(label, _)| *label)
    }

    /// Invariant 7: at most one label may have rule `same_team`.
    pub fn is_consistent(&self) -> bool {
        self.rules.values().filter(|rule| **rule == LabelRule::SameTeam).count() <= 1
    }

    pub fn iter(&self) -> impl Iterator<Item = (Label, LabelRule)> + '_ {
        self.rules.iter().map(|(l, r)| (*l, *r))
    }

    pub fn from_map(map: std::collections::BTreeMap<Label, LabelRule>) -> Self {
        Self { rules: map }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_rules_serializes_as_a_flat_map() {
        let mut rules = LabelRules::default();
        rules.set(Label::God, LabelRule::Even);

        let json = serde_json::to_string(&rules).unwrap();
        assert_eq!(json, r#"{"god":"even"}"#);

        let parsed: LabelRules = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, rules);
    }
}
