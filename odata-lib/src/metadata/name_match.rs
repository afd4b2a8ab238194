//! Matching user-supplied names against schema names

use serde::Deserialize;
use serde::Serialize;

/// How approximate names are matched against schema names.
///
/// Names are compared in tiers. The first tier that yields a match wins and,
/// within a tier, the first declared schema element wins:
///
/// 1. exact match
/// 2. case-insensitive match
/// 3. case-insensitive match ignoring non-alphanumeric characters
///    (`Order_Details` matches `OrderDetails`)
/// 4. tier 3 after removing a simple English plural suffix from both sides
///    (`Categories` matches `Category`)
///
/// Each policy enables the tiers up to its own level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NameMatchPolicy {
    /// Tier 1 only.
    Exact,
    /// Tiers 1-2.
    CaseInsensitive,
    /// Tiers 1-3.
    Alphanumeric,
    /// Tiers 1-4.
    #[default]
    Relaxed,
}

impl NameMatchPolicy {
    fn max_tier(self) -> u8 {
        match self {
            Self::Exact => 1,
            Self::CaseInsensitive => 2,
            Self::Alphanumeric => 3,
            Self::Relaxed => 4,
        }
    }

    /// Returns the best tier at which `candidate` matches `name`, if any.
    ///
    /// Lower tiers are better matches.
    pub fn match_tier(self, candidate: &str, name: &str) -> Option<u8> {
        let max = self.max_tier();
        if candidate == name {
            return Some(1);
        }
        if max >= 2 && candidate.to_lowercase() == name.to_lowercase() {
            return Some(2);
        }
        if max < 3 {
            return None;
        }
        let candidate = normalize(candidate);
        let name = normalize(name);
        if candidate.is_empty() {
            return None;
        }
        if candidate == name {
            return Some(3);
        }
        if max >= 4 && singular(&candidate) == singular(&name) {
            return Some(4);
        }
        None
    }

    /// Returns `true` if `candidate` matches `name` at any enabled tier.
    pub fn matches(self, candidate: &str, name: &str) -> bool {
        self.match_tier(candidate, name).is_some()
    }

    /// Finds the best matching candidate for `name`.
    ///
    /// Returns the candidate's index and the tier it matched at.
    pub fn best_match<'a, I>(self, candidates: I, name: &str) -> Option<(usize, u8)>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut best: Option<(usize, u8)> = None;
        for (index, candidate) in candidates.into_iter().enumerate() {
            let Some(tier) = self.match_tier(candidate, name) else {
                continue;
            };
            if best.is_none_or(|(_, best_tier)| tier < best_tier) {
                best = Some((index, tier));
                if tier == 1 {
                    break;
                }
            }
        }
        best
    }
}

fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

fn singular(name: &str) -> String {
    if name.len() > 3 {
        if let Some(stem) = name.strip_suffix("ies") {
            return format!("{}y", stem);
        }
    }
    for suffix in ["ches", "shes", "sses", "xes"] {
        if name.ends_with(suffix) {
            return name[..name.len() - 2].to_string();
        }
    }
    if name.len() > 1 && name.ends_with('s') && !name.ends_with("ss") {
        return name[..name.len() - 1].to_string();
    }
    name.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_policy() {
        let policy = NameMatchPolicy::Exact;
        assert_eq!(policy.match_tier("Products", "Products"), Some(1));
        assert_eq!(policy.match_tier("Products", "products"), None);
    }

    #[test]
    fn test_case_insensitive_policy() {
        let policy = NameMatchPolicy::CaseInsensitive;
        assert_eq!(policy.match_tier("Products", "PRODUCTS"), Some(2));
        assert_eq!(policy.match_tier("Order_Details", "OrderDetails"), None);
    }

    #[test]
    fn test_alphanumeric_policy() {
        let policy = NameMatchPolicy::Alphanumeric;
        assert_eq!(policy.match_tier("Order_Details", "OrderDetails"), Some(3));
        assert_eq!(policy.match_tier("Order_Details", "order_details"), Some(2));
        assert_eq!(policy.match_tier("Category", "Categories"), None);
    }

    #[test]
    fn test_relaxed_policy_plurals() {
        let policy = NameMatchPolicy::Relaxed;
        assert_eq!(policy.match_tier("Category", "Categories"), Some(4));
        assert_eq!(policy.match_tier("Employees", "Employee"), Some(4));
        assert_eq!(policy.match_tier("Address", "Addresses"), Some(4));
        assert_eq!(policy.match_tier("Address", "Addres"), None);
        assert_eq!(policy.match_tier("Day", "Days"), Some(4));
    }

    #[test]
    fn test_best_match_prefers_lower_tier() {
        let candidates = ["products", "Product", "Products"];
        let policy = NameMatchPolicy::Relaxed;
        assert_eq!(policy.best_match(candidates, "Products"), Some((2, 1)));
        assert_eq!(policy.best_match(candidates, "PRODUCTS"), Some((0, 2)));
    }

    #[test]
    fn test_best_match_first_declared_wins_tie() {
        let candidates = ["Ship_Name", "ShipName_"];
        let policy = NameMatchPolicy::Alphanumeric;
        assert_eq!(policy.best_match(candidates, "shipname"), Some((0, 3)));
    }

    #[test]
    fn test_no_match() {
        let policy = NameMatchPolicy::Relaxed;
        assert_eq!(policy.best_match(["Products"], "Orders"), None);
    }
}
