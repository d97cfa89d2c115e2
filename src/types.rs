// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Dopamine Rewards Engine - Type Definitions

use serde::{Deserialize, Serialize};
use std::fmt;

// ─── Contribution Type ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ContributionType {
    Money,
    Time,
}

impl Default for ContributionType {
    fn default() -> Self { ContributionType::Money }
}

impl ContributionType {
    pub const ALL: [ContributionType; 2] = [ContributionType::Money, ContributionType::Time];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Money => "money",
            Self::Time => "time",
        }
    }

    /// Unit noun used in the success message ("25 dollars", "10 minutes").
    pub fn unit_plural(&self) -> &'static str {
        match self {
            Self::Money => "dollars",
            Self::Time => "minutes",
        }
    }

    /// Short label shown on spinner rows.
    pub fn format_amount(&self, amount: u32) -> String {
        match self {
            Self::Money => format!("{}$", amount),
            Self::Time => format!("{}m", amount),
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "money" => Some(Self::Money),
            "time" => Some(Self::Time),
            _ => None,
        }
    }
}

impl fmt::Display for ContributionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Selectable Item ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum DisplayValue {
    Number(i64),
    Text(String),
}

impl fmt::Display for DisplayValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{}", n),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// One slot on a wheel, coin or spinner track. Order within a sequence
/// determines its rotational/positional bucket.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SelectableItem {
    pub id: String,
    pub display_value: DisplayValue,
}

impl SelectableItem {
    pub fn new(id: impl Into<String>, display_value: DisplayValue) -> Self {
        Self { id: id.into(), display_value }
    }

    pub fn amount(amount: u32) -> Self {
        Self::new(amount.to_string(), DisplayValue::Number(amount as i64))
    }

    pub fn contribution_type(kind: ContributionType) -> Self {
        Self::new(kind.as_str(), DisplayValue::Text(kind.as_str().to_string()))
    }

    /// Numeric payload, if any.
    pub fn number(&self) -> Option<i64> {
        match self.display_value {
            DisplayValue::Number(n) => Some(n),
            DisplayValue::Text(_) => None,
        }
    }
}

// ─── Funding Goal ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Goal {
    pub id: String,
    pub name: String,
    pub description: String,
}

impl Goal {
    pub fn new(id: &str, name: &str, description: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
        }
    }

    pub fn to_item(&self) -> SelectableItem {
        SelectableItem::new(self.id.clone(), DisplayValue::Text(self.name.clone()))
    }
}

/// The wheel's stock funding goals, in wheel order.
pub fn default_goals() -> Vec<Goal> {
    vec![
        Goal::new("books", "Books", "Investment in knowledge"),
        Goal::new("robotics", "Robotics", "Building the future"),
        Goal::new("travel", "Travel", "Exploring the world"),
        Goal::new("stocks", "Stocks", "Growing wealth"),
        Goal::new("savings", "Savings", "Future security"),
        Goal::new("startup", "Startup", "Entrepreneurship"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contribution_type_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&ContributionType::Money).unwrap(), "\"money\"");
        let t: ContributionType = serde_json::from_str("\"time\"").unwrap();
        assert_eq!(t, ContributionType::Time);
    }

    #[test]
    fn selectable_item_camel_case_untagged() {
        let item = SelectableItem::amount(25);
        let json = serde_json::to_string(&item).unwrap();
        assert_eq!(json, r#"{"id":"25","displayValue":25}"#);
        let goal = default_goals()[2].to_item();
        assert_eq!(goal.display_value, DisplayValue::Text("Travel".into()));
        assert_eq!(goal.number(), None);
    }

    #[test]
    fn amount_labels() {
        assert_eq!(ContributionType::Money.format_amount(5), "5$");
        assert_eq!(ContributionType::Time.format_amount(15), "15m");
        assert_eq!(ContributionType::parse("money"), Some(ContributionType::Money));
        assert_eq!(ContributionType::parse("gold"), None);
    }
}
