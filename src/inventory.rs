// 📦 Inventory - the warehouse supply lines
// Manual entry plus a CSV loader for operator-authored inventory sheets.

use crate::error::{ImportError, ModelError, SessionError};
use crate::model::{Supply, SupplyCategory, VulnerabilityAttribute};
use csv::{ReaderBuilder, Trim};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

/// One row of an inventory sheet: `category,name,quantity,target`
#[derive(Debug, Deserialize)]
struct SupplyRow {
    category: String,
    name: String,
    quantity: String,
    #[serde(default)]
    target: String,
}

impl SupplyRow {
    fn into_supply(self) -> Result<Supply, ModelError> {
        let category: SupplyCategory = self.category.parse()?;
        let target = parse_target(&self.target)?;
        Supply::from_input(&self.name, category, &self.quantity, target)
    }
}

/// Empty, "ALL" or "EVERYONE" mean a general item
pub fn parse_target(raw: &str) -> Result<Option<VulnerabilityAttribute>, ModelError> {
    let trimmed = raw.trim();
    if trimmed.is_empty()
        || trimmed.eq_ignore_ascii_case("all")
        || trimmed.eq_ignore_ascii_case("everyone")
    {
        return Ok(None);
    }
    trimmed.parse().map(Some)
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
    supplies: Vec<Supply>,
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_supplies(supplies: Vec<Supply>) -> Self {
        Inventory { supplies }
    }

    /// Load an inventory sheet from disk
    pub fn load_csv(file_path: &Path) -> Result<Self, ImportError> {
        let text = fs::read_to_string(file_path).map_err(|source| ImportError::Io {
            path: file_path.to_path_buf(),
            source,
        })?;
        let inventory = Self::from_csv_str(&text)?;
        info!(
            file = %file_path.display(),
            supplies = inventory.len(),
            "inventory loaded"
        );
        Ok(inventory)
    }

    /// Parse an inventory sheet. Unlike household import, a bad row is an error.
    pub fn from_csv_str(text: &str) -> Result<Self, ImportError> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .trim(Trim::All)
            .flexible(true)
            .from_reader(text.trim_start_matches('\u{feff}').as_bytes());

        let headers = reader.headers()?.clone();
        let mut supplies = Vec::new();
        for result in reader.records() {
            let record = result?;
            let line = record.position().map(|p| p.line() as usize).unwrap_or(0);
            let row: SupplyRow = record.deserialize(Some(&headers))?;
            let supply = row
                .into_supply()
                .map_err(|source| ImportError::InvalidSupplyRow { line, source })?;
            supplies.push(supply);
        }

        Ok(Inventory { supplies })
    }

    pub fn add(&mut self, supply: Supply) {
        self.supplies.push(supply);
    }

    /// Remove every line with this name; returns how many were removed
    pub fn remove(&mut self, name: &str) -> Result<usize, SessionError> {
        let before = self.supplies.len();
        self.supplies.retain(|s| s.name != name);
        match before - self.supplies.len() {
            0 => Err(SessionError::UnknownSupply(name.to_string())),
            removed => Ok(removed),
        }
    }

    pub fn supplies(&self) -> &[Supply] {
        &self.supplies
    }

    pub(crate) fn supplies_mut(&mut self) -> &mut [Supply] {
        &mut self.supplies
    }

    pub fn len(&self) -> usize {
        self.supplies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.supplies.is_empty()
    }

    pub fn total_units(&self) -> u64 {
        self.supplies.iter().map(|s| u64::from(s.total_quantity)).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHEET: &str = "category,name,quantity,target\n\
STAPLE,Rice (kg),500,\n\
protein,Canned Sardines,240,ALL\n\
Priority Nutrition,Infant Formula,60,has infant\n\
SPECIALIZED_MED,Insulin Pens,25,DIABETIC\n";

    #[test]
    fn test_parse_target() {
        assert_eq!(parse_target(""), Ok(None));
        assert_eq!(parse_target("Everyone"), Ok(None));
        assert_eq!(parse_target("pwd"), Ok(Some(VulnerabilityAttribute::Pwd)));
        assert!(parse_target("teenagers").is_err());
    }

    #[test]
    fn test_load_sheet() {
        let inventory = Inventory::from_csv_str(SHEET).unwrap();
        assert_eq!(inventory.len(), 4);

        let supplies = inventory.supplies();
        assert_eq!(supplies[0].name, "Rice (kg)");
        assert_eq!(supplies[0].target, None);
        assert_eq!(supplies[1].category, SupplyCategory::Protein);
        assert_eq!(supplies[2].target, Some(VulnerabilityAttribute::HasInfant));
        assert_eq!(supplies[3].category, SupplyCategory::SpecializedMed);
        assert_eq!(inventory.total_units(), 825);
    }

    #[test]
    fn test_bad_row_names_the_line() {
        let text = "category,name,quantity,target\nSTAPLE,Rice,10,\nSNACKS,Chips,5,\n";
        match Inventory::from_csv_str(text) {
            Err(ImportError::InvalidSupplyRow { line, source }) => {
                assert_eq!(line, 3);
                assert_eq!(source, ModelError::UnknownCategory("SNACKS".to_string()));
            }
            other => panic!("expected InvalidSupplyRow, got {:?}", other),
        }
    }

    #[test]
    fn test_bad_row_line_counts_blank_lines() {
        let text = "category,name,quantity,target\n\nSTAPLE,Rice,10,\nSNACKS,Chips,5,\n";
        match Inventory::from_csv_str(text) {
            Err(ImportError::InvalidSupplyRow { line, .. }) => assert_eq!(line, 4),
            other => panic!("expected InvalidSupplyRow, got {:?}", other),
        }
    }

    #[test]
    fn test_add_and_remove() {
        let mut inventory = Inventory::new();
        inventory.add(Supply::new("Rice", SupplyCategory::Staple, 10, None).unwrap());
        inventory.add(Supply::new("Milk", SupplyCategory::Protein, 4, None).unwrap());

        assert_eq!(inventory.remove("Rice"), Ok(1));
        assert_eq!(inventory.len(), 1);
        assert_eq!(
            inventory.remove("Rice"),
            Err(SessionError::UnknownSupply("Rice".to_string()))
        );
    }
}
