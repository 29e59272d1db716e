// ==========================================
// SNT Planner - Stratification API
// ==========================================
// Responsibility: threshold configuration lifecycle, batch risk
// calculation, summaries and GeoJSON export.
// Rule: an invalid threshold map is rejected with every violation and
// nothing is stored.
// ==========================================

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use crate::api::error::{ApiError, ApiResult};
use crate::domain::stratification::{
    AdminUnitRow, GeoFeatureCollection, StratificationConfig, StratificationResult,
    StratificationSummary, ThresholdMap,
};
use crate::domain::types::StratificationMetric;
use crate::engine::{InterventionDecisionEngine, RiskClassifier};
use crate::store::ProjectStore;

// ==========================================
// Requests
// ==========================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigCreate {
    pub name: String,
    pub metric: StratificationMetric,
    pub thresholds: ThresholdMap,
    /// New configs activate by default, deactivating the previous one.
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub thresholds: Option<ThresholdMap>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

// ==========================================
// StratificationApi
// ==========================================
pub struct StratificationApi {
    store: Arc<ProjectStore>,
    classifier: RiskClassifier,
    decision_engine: Arc<InterventionDecisionEngine>,
}

impl StratificationApi {
    pub fn new(store: Arc<ProjectStore>, decision_engine: Arc<InterventionDecisionEngine>) -> Self {
        Self {
            store,
            classifier: RiskClassifier::new(),
            decision_engine,
        }
    }

    /// Create a threshold configuration. The four ranges must tile
    /// [0, +inf); violations are all reported and nothing is stored.
    pub fn create_config(
        &self,
        project_id: &str,
        request: ConfigCreate,
    ) -> ApiResult<StratificationConfig> {
        let violations = self.classifier.validate_thresholds(&request.thresholds);
        if !violations.is_empty() {
            return Err(ApiError::validation(violations));
        }
        // Project must exist before anything is written.
        self.store.get_project(project_id)?;

        let config = StratificationConfig {
            config_id: Uuid::new_v4().to_string(),
            project_id: project_id.to_string(),
            name: request.name,
            metric: request.metric,
            thresholds: request.thresholds,
            is_active: request.is_active,
            created_at: Utc::now().naive_utc(),
        };
        self.store.save_config(config.clone())?;
        info!(project_id, config_id = %config.config_id, "stratification config created");
        Ok(config)
    }

    pub fn list_configs(&self, project_id: &str) -> ApiResult<Vec<StratificationConfig>> {
        Ok(self.store.list_configs(project_id)?)
    }

    /// Partial config update. A threshold change is revalidated and
    /// drops the previous result set (it no longer describes the
    /// configuration).
    pub fn update_config(
        &self,
        project_id: &str,
        config_id: &str,
        update: ConfigUpdate,
    ) -> ApiResult<StratificationConfig> {
        let mut config = self.store.get_config(project_id, config_id)?;

        if let Some(thresholds) = update.thresholds {
            let violations = self.classifier.validate_thresholds(&thresholds);
            if !violations.is_empty() {
                return Err(ApiError::validation(violations));
            }
            config.thresholds = thresholds;
            self.store.replace_results(project_id, config_id, Vec::new())?;
        }
        if let Some(name) = update.name {
            config.name = name;
        }
        if let Some(is_active) = update.is_active {
            config.is_active = is_active;
        }

        self.store.save_config(config.clone())?;
        Ok(config)
    }

    /// Batch classify admin-unit rows against a config and replace the
    /// config's result set wholesale.
    pub fn calculate(
        &self,
        project_id: &str,
        config_id: &str,
        rows: &[AdminUnitRow],
    ) -> ApiResult<Vec<StratificationResult>> {
        if rows.is_empty() {
            return Err(ApiError::InvalidInput(
                "no admin unit rows supplied for calculation".to_string(),
            ));
        }
        let config = self.store.get_config(project_id, config_id)?;
        let results = self
            .classifier
            .calculate(&config, rows, &self.decision_engine);
        self.store
            .replace_results(project_id, config_id, results.clone())?;
        info!(
            project_id,
            config_id,
            units = results.len(),
            "stratification calculated"
        );
        Ok(results)
    }

    pub fn get_results(
        &self,
        project_id: &str,
        config_id: &str,
    ) -> ApiResult<Vec<StratificationResult>> {
        // Surface a missing config rather than an empty result set.
        self.store.get_config(project_id, config_id)?;
        Ok(self.store.results(project_id, config_id)?)
    }

    pub fn get_summary(
        &self,
        project_id: &str,
        config_id: &str,
    ) -> ApiResult<StratificationSummary> {
        let config = self.store.get_config(project_id, config_id)?;
        let results = self.store.results(project_id, config_id)?;
        Ok(self.classifier.summarize(&config, &results))
    }

    /// Join results to stored unit geometry. Any unit without geometry
    /// fails the whole export, naming the units.
    pub fn get_geojson(
        &self,
        project_id: &str,
        config_id: &str,
    ) -> ApiResult<GeoFeatureCollection> {
        self.store.get_config(project_id, config_id)?;
        let results = self.store.results(project_id, config_id)?;

        let geometries: BTreeMap<String, Value> = self
            .store
            .admin_units(project_id)?
            .into_iter()
            .filter_map(|u| u.geometry.map(|g| (u.admin_unit_code, g)))
            .collect();

        self.classifier
            .to_geojson(&results, &geometries)
            .map_err(|missing_units| ApiError::SourceMismatch {
                reason: "admin units without geometry in the loaded unit data".to_string(),
                missing_units,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::stratification::ThresholdRange;
    use crate::domain::types::RiskLevel;
    use crate::store::AdminUnitRecord;
    use serde_json::json;

    fn setup() -> (StratificationApi, Arc<ProjectStore>, String) {
        let store = Arc::new(ProjectStore::new());
        let project = store.create_project("test", None).unwrap();
        let engine = Arc::new(InterventionDecisionEngine::new());
        (
            StratificationApi::new(store.clone(), engine),
            store,
            project.project_id,
        )
    }

    fn standard_request() -> ConfigCreate {
        let mut thresholds = ThresholdMap::new();
        thresholds.insert(RiskLevel::VeryLow, ThresholdRange::new(0.0, 1.0));
        thresholds.insert(RiskLevel::Low, ThresholdRange::new(1.0, 5.0));
        thresholds.insert(RiskLevel::Moderate, ThresholdRange::new(5.0, 25.0));
        thresholds.insert(RiskLevel::High, ThresholdRange::new(25.0, 100.0));
        ConfigCreate {
            name: "National PfPR".to_string(),
            metric: StratificationMetric::Pfpr,
            thresholds,
            is_active: true,
        }
    }

    fn rows() -> Vec<AdminUnitRow> {
        vec![
            AdminUnitRow {
                admin_unit_name: "North".to_string(),
                admin_unit_code: "ND".to_string(),
                metric_value: 30.0,
                population: Some(100_000),
                cases_annual: Some(12_000),
                deaths_annual: Some(60),
            },
            AdminUnitRow {
                admin_unit_name: "South".to_string(),
                admin_unit_code: "SD".to_string(),
                metric_value: 0.4,
                population: Some(80_000),
                cases_annual: Some(300),
                deaths_annual: Some(1),
            },
        ]
    }

    #[test]
    fn test_create_config_rejects_bad_tiling_with_all_violations() {
        let (api, _store, project_id) = setup();
        let mut request = standard_request();
        request
            .thresholds
            .insert(RiskLevel::Low, ThresholdRange::new(2.0, 5.0));
        request
            .thresholds
            .insert(RiskLevel::VeryLow, ThresholdRange::new(0.5, 1.0));

        let err = api.create_config(&project_id, request).unwrap_err();
        match err {
            ApiError::Validation { reasons } => assert_eq!(reasons.len(), 2),
            other => panic!("expected Validation, got {:?}", other),
        }
        // Nothing stored.
        assert!(api.list_configs(&project_id).unwrap().is_empty());
    }

    #[test]
    fn test_calculate_replaces_results_wholesale() {
        let (api, _store, project_id) = setup();
        let config = api.create_config(&project_id, standard_request()).unwrap();

        let first = api.calculate(&project_id, &config.config_id, &rows()).unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(first[0].risk_level, RiskLevel::High);
        assert_eq!(first[1].risk_level, RiskLevel::VeryLow);

        let single = &rows()[..1];
        api.calculate(&project_id, &config.config_id, single).unwrap();
        let stored = api.get_results(&project_id, &config.config_id).unwrap();
        assert_eq!(stored.len(), 1);
    }

    #[test]
    fn test_summary_aggregates_population_and_cases() {
        let (api, _store, project_id) = setup();
        let config = api.create_config(&project_id, standard_request()).unwrap();
        api.calculate(&project_id, &config.config_id, &rows()).unwrap();

        let summary = api.get_summary(&project_id, &config.config_id).unwrap();
        assert_eq!(summary.total_units, 2);
        assert_eq!(summary.total_population, 180_000);
        assert_eq!(summary.total_cases, 12_300);
        assert_eq!(summary.risk_distribution[&RiskLevel::High], 1);
    }

    #[test]
    fn test_geojson_source_mismatch_names_units() {
        let (api, store, project_id) = setup();
        let config = api.create_config(&project_id, standard_request()).unwrap();
        api.calculate(&project_id, &config.config_id, &rows()).unwrap();

        // Only one of the two units carries geometry.
        store
            .load_admin_units(
                &project_id,
                vec![AdminUnitRecord {
                    admin_unit_code: "ND".to_string(),
                    admin_unit_name: "North".to_string(),
                    population: 100_000,
                    geometry: Some(json!({"type": "Point", "coordinates": [0.0, 0.0]})),
                    cases_annual: None,
                    deaths_annual: None,
                }],
            )
            .unwrap();

        let err = api.get_geojson(&project_id, &config.config_id).unwrap_err();
        match err {
            ApiError::SourceMismatch { missing_units, .. } => {
                assert_eq!(missing_units, vec!["SD".to_string()]);
            }
            other => panic!("expected SourceMismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_update_thresholds_drops_stale_results() {
        let (api, _store, project_id) = setup();
        let config = api.create_config(&project_id, standard_request()).unwrap();
        api.calculate(&project_id, &config.config_id, &rows()).unwrap();

        let mut thresholds = standard_request().thresholds;
        thresholds.insert(RiskLevel::Moderate, ThresholdRange::new(5.0, 30.0));
        thresholds.insert(RiskLevel::High, ThresholdRange::new(30.0, 100.0));
        api.update_config(
            &project_id,
            &config.config_id,
            ConfigUpdate {
                thresholds: Some(thresholds),
                ..Default::default()
            },
        )
        .unwrap();

        assert!(api
            .get_results(&project_id, &config.config_id)
            .unwrap()
            .is_empty());
    }
}
