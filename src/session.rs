// 🗂️ Relief Session - the application state behind every front end
//
// Owns the loaded households, the inventory and the last distribution run.
// Every mutating operation takes &mut self, so one session can never have two
// runs (or a run and a reload) in flight at once. Hosts that share a session
// across threads wrap it in a Mutex.

use crate::audit::{AuditAction, AuditLog};
use crate::config::AppConfig;
use crate::engine::{reserve_lines, Allocation, AllocationEngine, ReserveLine};
use crate::error::SessionError;
use crate::importer::ImportOutcome;
use crate::inventory::Inventory;
use crate::model::{total_population, Household, Supply, SupplyCategory, VulnerabilityAttribute};
use crate::reports::{render_claim_stubs, render_packing_list, render_reserve_report, write_report};
use crate::summary::{summarize, DemographicSummary};
use anyhow::Result;
use chrono::{DateTime, Local};
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;

/// Everything one completed run produced
#[derive(Debug, Clone, Serialize)]
pub struct DistributionRun {
    pub allocation: Allocation,
    pub summary: DemographicSummary,
    pub completed_at: DateTime<Local>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportPaths {
    pub packing_list: PathBuf,
    pub reserve_report: PathBuf,
    pub claim_stubs: PathBuf,
}

#[derive(Debug, Default)]
pub struct ReliefSession {
    households: Vec<Household>,
    inventory: Inventory,
    last_run: Option<DistributionRun>,
    engine: AllocationEngine,
    audit: Option<AuditLog>,
}

impl ReliefSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_audit(mut self, audit: AuditLog) -> Self {
        self.audit = Some(audit);
        self
    }

    /// Session with the audit log the config asks for
    pub fn from_config(config: &AppConfig) -> Self {
        let session = ReliefSession::new();
        if config.audit_enabled {
            session.with_audit(AuditLog::new(config.audit_log_path()))
        } else {
            session
        }
    }

    pub fn households(&self) -> &[Household] {
        &self.households
    }

    pub fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    pub fn supplies(&self) -> &[Supply] {
        self.inventory.supplies()
    }

    pub fn last_run(&self) -> Option<&DistributionRun> {
        self.last_run.as_ref()
    }

    pub fn audit_log(&self) -> Option<&AuditLog> {
        self.audit.as_ref()
    }

    pub fn record(&self, action: AuditAction, details: &str) {
        if let Some(audit) = &self.audit {
            audit.record_or_warn(action, details);
        }
    }

    // ========================================================================
    // DATA ENTRY
    // ========================================================================

    /// Replace the whole household set; the previous run is discarded
    pub fn load_households(&mut self, outcome: ImportOutcome, source: &str) {
        info!(source, summary = %outcome.summary(), "replacing household set");
        self.households = outcome.households;
        self.invalidate_run();
        self.record(AuditAction::DataLoad, &format!("Loaded demographics from: {}", source));
    }

    /// Replace the whole inventory (sheet import)
    pub fn load_inventory(&mut self, inventory: Inventory, source: &str) {
        let count = inventory.len();
        self.inventory = inventory;
        self.invalidate_run();
        self.record(
            AuditAction::InventoryAdd,
            &format!("Loaded {} supply lines from: {}", count, source),
        );
    }

    pub fn add_supply(&mut self, supply: Supply) {
        let details = format!("Added {}x {}", supply.total_quantity, supply.name);
        self.inventory.add(supply);
        self.invalidate_run();
        self.record(AuditAction::InventoryAdd, &details);
    }

    /// Manual entry straight from form fields
    pub fn add_supply_from_input(
        &mut self,
        category: SupplyCategory,
        name: &str,
        quantity: &str,
        target: Option<VulnerabilityAttribute>,
    ) -> Result<(), SessionError> {
        let supply = Supply::from_input(name, category, quantity, target)?;
        self.add_supply(supply);
        Ok(())
    }

    pub fn remove_supply(&mut self, name: &str) -> Result<usize, SessionError> {
        let removed = self.inventory.remove(name)?;
        self.invalidate_run();
        self.record(
            AuditAction::InventoryRemove,
            &format!("Removed {} line(s) of {}", removed, name),
        );
        Ok(removed)
    }

    /// Drop the last run and clear what it wrote into households and supplies
    fn invalidate_run(&mut self) {
        self.last_run = None;
        Allocation::default().apply(&mut self.households, self.inventory.supplies_mut());
    }

    // ========================================================================
    // DISTRIBUTION
    // ========================================================================

    /// Reset → allocate → summarize as one step
    pub fn run_distribution(&mut self) -> Result<&DistributionRun, SessionError> {
        if self.households.is_empty() || self.inventory.is_empty() {
            return Err(SessionError::MissingData {
                households: self.households.len(),
                supplies: self.inventory.len(),
            });
        }

        let population = total_population(&self.households);
        let allocation = self.engine.allocate_in_place(
            &mut self.households,
            self.inventory.supplies_mut(),
            population,
        );
        let summary = summarize(&self.households);

        self.record(
            AuditAction::DistributionRun,
            &format!("Computed rations for {} families.", self.households.len()),
        );

        Ok(&*self.last_run.insert(DistributionRun {
            allocation,
            summary,
            completed_at: Local::now(),
        }))
    }

    pub fn summary(&self) -> DemographicSummary {
        summarize(&self.households)
    }

    pub fn reserve_lines(&self) -> Vec<ReserveLine> {
        reserve_lines(self.inventory.supplies())
    }

    // ========================================================================
    // EXPORT
    // ========================================================================

    pub fn export(&self, config: &AppConfig) -> Result<ExportPaths> {
        let run = self.last_run.as_ref().ok_or(SessionError::NoDistribution)?;

        let paths = ExportPaths {
            packing_list: config.packing_list_path(),
            reserve_report: config.reserve_report_path(),
            claim_stubs: config.claim_stubs_path(),
        };

        write_report(&paths.packing_list, &render_packing_list(&self.households))?;
        write_report(
            &paths.reserve_report,
            &render_reserve_report(&self.reserve_lines(), run.completed_at),
        )?;
        write_report(&paths.claim_stubs, &render_claim_stubs(&self.households))?;

        self.record(AuditAction::Export, "Files generated: HTML, TXT, HTML.");
        Ok(paths)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::importer::parse_households;
    use std::fs;

    const HOUSEHOLDS: &str = "id,head,size,priority\n\
F1,Santos,4,HAS_INFANT\n\
F2,Reyes,6,HAS_SENIOR;PWD\n";

    fn loaded_session() -> ReliefSession {
        let mut session = ReliefSession::new();
        session.load_households(parse_households(HOUSEHOLDS).unwrap(), "inline");
        session
            .add_supply_from_input(SupplyCategory::Staple, "Rice", "100", None)
            .unwrap();
        session
            .add_supply_from_input(
                SupplyCategory::PriorityNutrition,
                "Formula",
                "7",
                Some(VulnerabilityAttribute::HasInfant),
            )
            .unwrap();
        session
            .add_supply_from_input(SupplyCategory::SpecializedMed, "Insulin", "12", None)
            .unwrap();
        session
    }

    fn temp_dir(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("equieat-session-{}-{}", name, std::process::id()))
    }

    #[test]
    fn test_run_requires_data() {
        let mut session = ReliefSession::new();
        assert_eq!(
            session.run_distribution().unwrap_err(),
            SessionError::MissingData { households: 0, supplies: 0 }
        );

        session.load_households(parse_households(HOUSEHOLDS).unwrap(), "inline");
        assert_eq!(
            session.run_distribution().unwrap_err(),
            SessionError::MissingData { households: 2, supplies: 0 }
        );
    }

    #[test]
    fn test_run_distribution() {
        let mut session = loaded_session();
        let run = session.run_distribution().unwrap();

        assert_eq!(run.summary.total_population, 10);
        assert_eq!(run.summary.with_pwd, 1);
        assert!(run.allocation.is_conserved());

        let households = session.households();
        assert_eq!(households[0].received().get("Rice"), Some(40));
        assert_eq!(households[1].received().get("Rice"), Some(60));
        assert_eq!(households[0].received().get("Formula"), Some(7));

        let reserve = session.reserve_lines();
        assert_eq!(reserve.len(), 1);
        assert_eq!(reserve[0].name, "Insulin");
        assert_eq!(reserve[0].quantity, 12);
    }

    #[test]
    fn test_invalid_manual_entry() {
        let mut session = ReliefSession::new();
        let err = session
            .add_supply_from_input(SupplyCategory::Staple, "Rice", "lots", None)
            .unwrap_err();
        assert!(matches!(err, SessionError::Model(_)));
        assert!(session.inventory().is_empty());
    }

    #[test]
    fn test_changing_inventory_discards_run() {
        let mut session = loaded_session();
        session.run_distribution().unwrap();
        assert!(session.last_run().is_some());

        session.remove_supply("Rice").unwrap();
        assert!(session.last_run().is_none());
        assert!(session.households().iter().all(|h| h.received().is_empty()));
        assert!(session.supplies().iter().all(|s| s.leftover() == 0));
    }

    #[test]
    fn test_reload_replaces_households() {
        let mut session = loaded_session();
        session.run_distribution().unwrap();

        let outcome = parse_households("id,name,size\nN1,Diaz,3\n").unwrap();
        session.load_households(outcome, "second.csv");

        assert_eq!(session.households().len(), 1);
        assert_eq!(session.households()[0].id, "N1");
        assert!(session.last_run().is_none());
    }

    #[test]
    fn test_export_requires_run() {
        let session = loaded_session();
        let config = AppConfig {
            output_dir: temp_dir("norun"),
            ..AppConfig::default()
        };
        assert!(session.export(&config).is_err());
    }

    #[test]
    fn test_export_writes_three_files_and_audits() {
        let dir = temp_dir("export");
        let config = AppConfig {
            output_dir: dir.clone(),
            ..AppConfig::default()
        };

        let mut session = ReliefSession::from_config(&config);
        session.load_households(parse_households(HOUSEHOLDS).unwrap(), "inline");
        session
            .add_supply_from_input(SupplyCategory::SpecializedMed, "Insulin", "12", None)
            .unwrap();
        session
            .add_supply_from_input(SupplyCategory::Staple, "Rice", "9", None)
            .unwrap();
        session.run_distribution().unwrap();

        let paths = session.export(&config).unwrap();
        let packing = fs::read_to_string(&paths.packing_list).unwrap();
        let reserve = fs::read_to_string(&paths.reserve_report).unwrap();
        let stubs = fs::read_to_string(&paths.claim_stubs).unwrap();

        assert!(packing.contains("3 pcs of Rice"));
        assert!(reserve.contains("Insulin"));
        assert!(reserve.contains("Rice"), "9 over 10 people leaves rounding excess");
        assert!(stubs.contains("FAMILY: Santos"));

        let audit = fs::read_to_string(config.audit_log_path()).unwrap();
        for action in ["DATA_LOAD", "INVENTORY_ADD", "DISTRIBUTION_RUN", "EXPORT"] {
            assert!(audit.contains(action), "missing {} entry", action);
        }

        let _ = fs::remove_dir_all(&dir);
    }
}
