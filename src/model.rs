// 🏠 Data Model - Households and Supplies
// Closed enumerations for vulnerability attributes and supply categories,
// plus the two records the engine and summarizer work over.

use crate::error::ModelError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

// ============================================================================
// LABEL NORMALIZATION
// ============================================================================

/// Normalize a free-text label into enum form: "has infant" → "HAS_INFANT"
pub fn normalize_label(raw: &str) -> String {
    raw.trim().to_uppercase().replace(' ', "_")
}

// ============================================================================
// VULNERABILITY ATTRIBUTE
// ============================================================================

/// Household-level vulnerability flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VulnerabilityAttribute {
    HasInfant,
    HasSenior,
    Pregnant,
    Lactating,
    Pwd,
    Diabetic,
    Injured,
}

impl VulnerabilityAttribute {
    pub const ALL: [VulnerabilityAttribute; 7] = [
        VulnerabilityAttribute::HasInfant,
        VulnerabilityAttribute::HasSenior,
        VulnerabilityAttribute::Pregnant,
        VulnerabilityAttribute::Lactating,
        VulnerabilityAttribute::Pwd,
        VulnerabilityAttribute::Diabetic,
        VulnerabilityAttribute::Injured,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            VulnerabilityAttribute::HasInfant => "HAS_INFANT",
            VulnerabilityAttribute::HasSenior => "HAS_SENIOR",
            VulnerabilityAttribute::Pregnant => "PREGNANT",
            VulnerabilityAttribute::Lactating => "LACTATING",
            VulnerabilityAttribute::Pwd => "PWD",
            VulnerabilityAttribute::Diabetic => "DIABETIC",
            VulnerabilityAttribute::Injured => "INJURED",
        }
    }

    /// Match an already-normalized token against the enumeration
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|a| a.as_str() == label)
    }
}

impl fmt::Display for VulnerabilityAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VulnerabilityAttribute {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_label(&normalize_label(s))
            .ok_or_else(|| ModelError::UnknownAttribute(s.trim().to_string()))
    }
}

// ============================================================================
// SUPPLY CATEGORY
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SupplyCategory {
    Staple,
    Protein,
    PriorityNutrition,
    GeneralHealth,
    /// Always held back in reserve, never distributed automatically
    SpecializedMed,
}

impl SupplyCategory {
    pub const ALL: [SupplyCategory; 5] = [
        SupplyCategory::Staple,
        SupplyCategory::Protein,
        SupplyCategory::PriorityNutrition,
        SupplyCategory::GeneralHealth,
        SupplyCategory::SpecializedMed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SupplyCategory::Staple => "STAPLE",
            SupplyCategory::Protein => "PROTEIN",
            SupplyCategory::PriorityNutrition => "PRIORITY_NUTRITION",
            SupplyCategory::GeneralHealth => "GENERAL_HEALTH",
            SupplyCategory::SpecializedMed => "SPECIALIZED_MED",
        }
    }

    pub fn is_reserved(&self) -> bool {
        matches!(self, SupplyCategory::SpecializedMed)
    }
}

impl fmt::Display for SupplyCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SupplyCategory {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let label = normalize_label(s);
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == label)
            .ok_or_else(|| ModelError::UnknownCategory(s.trim().to_string()))
    }
}

// ============================================================================
// RECEIVED ITEMS
// ============================================================================

/// Ordered item → quantity tally. Insertion order is allocation order.
///
/// Tallies are u64: several lines with the same name can sum past u32::MAX.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceivedItems {
    entries: Vec<(String, u64)>,
}

impl ReceivedItems {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add units under an item name. Zero is ignored; repeated names sum.
    pub fn add(&mut self, item: &str, quantity: u32) {
        if quantity == 0 {
            return;
        }
        match self.entries.iter_mut().find(|(name, _)| name == item) {
            Some((_, existing)) => *existing += u64::from(quantity),
            None => self.entries.push((item.to_string(), u64::from(quantity))),
        }
    }

    pub fn get(&self, item: &str) -> Option<u64> {
        self.entries
            .iter()
            .find(|(name, _)| name == item)
            .map(|(_, qty)| *qty)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.entries.iter().map(|(name, qty)| (name.as_str(), *qty))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn total_units(&self) -> u64 {
        self.entries.iter().map(|(_, qty)| *qty).sum()
    }

    /// "5 pcs of Rice + 2 pcs of Milk"
    pub fn packing_list(&self) -> String {
        self.entries
            .iter()
            .map(|(name, qty)| format!("{} pcs of {}", qty, name))
            .collect::<Vec<_>>()
            .join(" + ")
    }
}

// ============================================================================
// HOUSEHOLD
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Household {
    pub id: String,
    pub head_name: String,
    member_count: u32,
    pub attributes: BTreeSet<VulnerabilityAttribute>,
    received: ReceivedItems,
}

impl Household {
    /// Build a household; sizes below 1 are rejected
    pub fn new(
        id: impl Into<String>,
        head_name: impl Into<String>,
        member_count: i64,
        attributes: impl IntoIterator<Item = VulnerabilityAttribute>,
    ) -> Result<Self, ModelError> {
        let member_count = u32::try_from(member_count)
            .ok()
            .filter(|count| *count >= 1)
            .ok_or(ModelError::InvalidMemberCount(member_count))?;

        Ok(Household {
            id: id.into(),
            head_name: head_name.into(),
            member_count,
            attributes: attributes.into_iter().collect(),
            received: ReceivedItems::new(),
        })
    }

    pub fn member_count(&self) -> u32 {
        self.member_count
    }

    pub fn has_attribute(&self, attribute: VulnerabilityAttribute) -> bool {
        self.attributes.contains(&attribute)
    }

    pub fn received(&self) -> &ReceivedItems {
        &self.received
    }

    /// Space-separated attribute labels, e.g. "HAS_INFANT PWD"
    pub fn attribute_labels(&self) -> String {
        self.attributes
            .iter()
            .map(|a| a.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub(crate) fn replace_received(&mut self, received: ReceivedItems) {
        self.received = received;
    }
}

/// Sum of member counts; the population figure both engine and summary use
pub fn total_population(households: &[Household]) -> u64 {
    households.iter().map(|h| u64::from(h.member_count)).sum()
}

// ============================================================================
// SUPPLY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Supply {
    pub name: String,
    pub category: SupplyCategory,
    pub total_quantity: u32,
    /// None = open to every household, split per capita
    pub target: Option<VulnerabilityAttribute>,
    leftover: u32,
}

impl Supply {
    pub fn new(
        name: impl Into<String>,
        category: SupplyCategory,
        total_quantity: u32,
        target: Option<VulnerabilityAttribute>,
    ) -> Result<Self, ModelError> {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(ModelError::EmptySupplyName);
        }

        Ok(Supply {
            name,
            category,
            total_quantity,
            target,
            leftover: 0,
        })
    }

    /// Manual-entry constructor: quantity arrives as text from a form field
    pub fn from_input(
        name: &str,
        category: SupplyCategory,
        quantity: &str,
        target: Option<VulnerabilityAttribute>,
    ) -> Result<Self, ModelError> {
        let total_quantity = quantity
            .trim()
            .parse::<u32>()
            .map_err(|_| ModelError::InvalidQuantity(quantity.trim().to_string()))?;
        Supply::new(name, category, total_quantity, target)
    }

    pub fn leftover(&self) -> u32 {
        self.leftover
    }

    pub fn is_targeted(&self) -> bool {
        self.target.is_some()
    }

    /// "ALL" for general items, otherwise the target label
    pub fn target_label(&self) -> &'static str {
        self.target.map(|t| t.as_str()).unwrap_or("ALL")
    }

    pub(crate) fn set_leftover(&mut self, leftover: u32) {
        self.leftover = leftover.min(self.total_quantity);
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_household_rejects_non_positive_size() {
        assert_eq!(
            Household::new("F1", "Cruz", 0, []),
            Err(ModelError::InvalidMemberCount(0))
        );
        assert_eq!(
            Household::new("F1", "Cruz", -3, []),
            Err(ModelError::InvalidMemberCount(-3))
        );
        assert!(Household::new("F1", "Cruz", 1, []).is_ok());
    }

    #[test]
    fn test_household_attributes_collapse_duplicates() {
        let h = Household::new(
            "F1",
            "Cruz",
            4,
            [
                VulnerabilityAttribute::Pwd,
                VulnerabilityAttribute::HasInfant,
                VulnerabilityAttribute::Pwd,
            ],
        )
        .unwrap();

        assert_eq!(h.attributes.len(), 2);
        assert!(h.has_attribute(VulnerabilityAttribute::Pwd));
        assert!(!h.has_attribute(VulnerabilityAttribute::Injured));
        assert_eq!(h.attribute_labels(), "HAS_INFANT PWD");
    }

    #[test]
    fn test_attribute_parsing_normalizes_case_and_spaces() {
        assert_eq!(
            "has infant".parse::<VulnerabilityAttribute>(),
            Ok(VulnerabilityAttribute::HasInfant)
        );
        assert_eq!(
            " pwd ".parse::<VulnerabilityAttribute>(),
            Ok(VulnerabilityAttribute::Pwd)
        );
        assert!("ELDERLY".parse::<VulnerabilityAttribute>().is_err());
    }

    #[test]
    fn test_category_parsing() {
        assert_eq!(
            "specialized med".parse::<SupplyCategory>(),
            Ok(SupplyCategory::SpecializedMed)
        );
        assert_eq!("Staple".parse::<SupplyCategory>(), Ok(SupplyCategory::Staple));
        assert!(matches!(
            "snacks".parse::<SupplyCategory>(),
            Err(ModelError::UnknownCategory(_))
        ));
    }

    #[test]
    fn test_received_items_sum_and_keep_order() {
        let mut items = ReceivedItems::new();
        items.add("Rice", 5);
        items.add("Milk", 2);
        items.add("Rice", 3);
        items.add("Water", 0);

        let collected: Vec<_> = items.iter().collect();
        assert_eq!(collected, vec![("Rice", 8), ("Milk", 2)]);
        assert_eq!(items.total_units(), 10);
        assert_eq!(items.packing_list(), "8 pcs of Rice + 2 pcs of Milk");
    }

    #[test]
    fn test_supply_from_input() {
        let s = Supply::from_input(" Rice ", SupplyCategory::Staple, " 120 ", None).unwrap();
        assert_eq!(s.name, "Rice");
        assert_eq!(s.total_quantity, 120);
        assert_eq!(s.leftover(), 0);
        assert_eq!(s.target_label(), "ALL");

        assert_eq!(
            Supply::from_input("Rice", SupplyCategory::Staple, "-4", None),
            Err(ModelError::InvalidQuantity("-4".to_string()))
        );
        assert_eq!(
            Supply::from_input("Rice", SupplyCategory::Staple, "2.5", None),
            Err(ModelError::InvalidQuantity("2.5".to_string()))
        );
        assert_eq!(
            Supply::from_input("  ", SupplyCategory::Staple, "3", None),
            Err(ModelError::EmptySupplyName)
        );
    }

    #[test]
    fn test_leftover_never_exceeds_total() {
        let mut s = Supply::new("Gauze", SupplyCategory::GeneralHealth, 10, None).unwrap();
        s.set_leftover(25);
        assert_eq!(s.leftover(), 10);
    }

    #[test]
    fn test_total_population() {
        let households = vec![
            Household::new("A", "Ana", 10, []).unwrap(),
            Household::new("B", "Ben", 15, []).unwrap(),
        ];
        assert_eq!(total_population(&households), 25);
    }
}
