//! Strategy data models and rule-shape normalization.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A leaf requirement: an (indicator, trigger) pair that must have a
/// matching alert in the candidate set.
///
/// `indicator` may be an abbreviated key (e.g. `extreme_zones`) or the
/// display name alerts carry; see `indicators::names`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    pub indicator: String,
    pub trigger: String,
}

impl Condition {
    pub fn new(indicator: impl Into<String>, trigger: impl Into<String>) -> Self {
        Self {
            indicator: indicator.into(),
            trigger: trigger.into(),
        }
    }
}

/// Logical operators for combining conditions within a group and groups
/// within a strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum GroupOperator {
    And,
    Or,
}

impl Default for GroupOperator {
    fn default() -> Self {
        GroupOperator::And
    }
}

/// An AND/OR cluster of leaf conditions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleGroup {
    pub operator: GroupOperator,
    pub conditions: Vec<Condition>,
}

/// Rule shape as stored by the registry.
///
/// Two historical representations exist: the grouped form, and a legacy
/// flat condition list interpreted as a single implicit AND group. The
/// registry normalizes to [`RuleComposition`] once, at read time; nothing
/// downstream ever branches on the shape again.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RuleSpec {
    Grouped {
        rule_groups: Vec<RuleGroup>,
        #[serde(default)]
        inter_group_operator: GroupOperator,
    },
    Flat {
        conditions: Vec<Condition>,
    },
}

impl RuleSpec {
    pub fn normalize(self) -> RuleComposition {
        match self {
            RuleSpec::Grouped {
                rule_groups,
                inter_group_operator,
            } => RuleComposition {
                groups: rule_groups,
                inter_group_operator,
            },
            RuleSpec::Flat { conditions } => RuleComposition {
                groups: vec![RuleGroup {
                    operator: GroupOperator::And,
                    conditions,
                }],
                inter_group_operator: GroupOperator::And,
            },
        }
    }
}

/// Normalized boolean rule composition: groups combined with one
/// inter-group operator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleComposition {
    pub groups: Vec<RuleGroup>,
    pub inter_group_operator: GroupOperator,
}

impl RuleComposition {
    /// All leaf conditions across every group, in declaration order.
    pub fn leaf_conditions(&self) -> impl Iterator<Item = &Condition> {
        self.groups.iter().flat_map(|g| g.conditions.iter())
    }
}

/// Evaluation window declared by a strategy.
///
/// `Any` is an explicit variant; it is never encoded as a magic number in
/// the minutes field. `Any` strategies are searched across the fixed
/// bucket set, one bucket at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Timeframe {
    Any,
    FixedMinutes(i64),
}

impl Timeframe {
    pub fn fixed_minutes(self) -> Option<i64> {
        match self {
            Timeframe::FixedMinutes(n) => Some(n),
            Timeframe::Any => None,
        }
    }
}

/// A named boolean rule composition owned by the registry.
///
/// The engine treats strategies as read-only snapshots for the duration of
/// one evaluation pass; `rules` is already normalized.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Strategy {
    pub id: Option<i64>,
    pub name: String,
    pub enabled: bool,
    pub timeframe: Timeframe,
    /// Registry metadata reserved for an explicit directional tag. The
    /// token-heuristic classifier does not consult it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threshold_sign: Option<i16>,
    pub rules: RuleComposition,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
