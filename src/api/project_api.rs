// ==========================================
// SNT Planner - Project API
// ==========================================
// Responsibility: project lifecycle and national data loading
// (admin units with population/geometry/burden, baseline epidemiology).
// ==========================================

use std::sync::Arc;

use tracing::info;

use crate::api::error::{ApiError, ApiResult};
use crate::domain::forecast::BaselineData;
use crate::store::{AdminUnitRecord, Project, ProjectStore};

pub struct ProjectApi {
    store: Arc<ProjectStore>,
}

impl ProjectApi {
    pub fn new(store: Arc<ProjectStore>) -> Self {
        Self { store }
    }

    /// Create a project; all 10 workflow steps start NotStarted.
    pub fn create_project(&self, name: &str, country: Option<&str>) -> ApiResult<Project> {
        if name.trim().is_empty() {
            return Err(ApiError::InvalidInput(
                "project name must not be empty".to_string(),
            ));
        }
        Ok(self.store.create_project(name, country)?)
    }

    pub fn get_project(&self, project_id: &str) -> ApiResult<Project> {
        Ok(self.store.get_project(project_id)?)
    }

    pub fn list_projects(&self) -> ApiResult<Vec<Project>> {
        Ok(self.store.list_projects()?)
    }

    pub fn delete_project(&self, project_id: &str) -> ApiResult<()> {
        self.store.delete_project(project_id)?;
        info!(project_id, "project deleted");
        Ok(())
    }

    /// Replace the project's admin unit records wholesale.
    pub fn load_admin_units(
        &self,
        project_id: &str,
        units: Vec<AdminUnitRecord>,
    ) -> ApiResult<usize> {
        if units.is_empty() {
            return Err(ApiError::InvalidInput(
                "no admin unit records supplied".to_string(),
            ));
        }
        let count = self.store.load_admin_units(project_id, units)?;
        info!(project_id, count, "admin units loaded");
        Ok(count)
    }

    pub fn admin_units(&self, project_id: &str) -> ApiResult<Vec<AdminUnitRecord>> {
        Ok(self.store.admin_units(project_id)?)
    }

    /// Set the project-level pre-intervention baseline used by
    /// forecasting.
    pub fn set_baseline(&self, project_id: &str, baseline: BaselineData) -> ApiResult<()> {
        if baseline.baseline_cases < 0.0 || baseline.baseline_deaths < 0.0 {
            return Err(ApiError::InvalidInput(
                "baseline cases and deaths must be non-negative".to_string(),
            ));
        }
        Ok(self.store.set_baseline(project_id, baseline)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_and_list_projects() {
        let api = ProjectApi::new(Arc::new(ProjectStore::new()));
        api.create_project("Nigeria SNT 2026", Some("NG")).unwrap();
        api.create_project("Chad SNT 2026", Some("TD")).unwrap();
        assert_eq!(api.list_projects().unwrap().len(), 2);
    }

    #[test]
    fn test_blank_name_is_rejected() {
        let api = ProjectApi::new(Arc::new(ProjectStore::new()));
        let err = api.create_project("  ", None).unwrap_err();
        assert!(matches!(err, ApiError::InvalidInput(_)));
    }

    #[test]
    fn test_load_admin_units_requires_records() {
        let api = ProjectApi::new(Arc::new(ProjectStore::new()));
        let project = api.create_project("p", None).unwrap();
        let err = api
            .load_admin_units(&project.project_id, Vec::new())
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidInput(_)));
    }

    #[test]
    fn test_delete_project_removes_it() {
        let api = ProjectApi::new(Arc::new(ProjectStore::new()));
        let project = api.create_project("p", None).unwrap();
        api.delete_project(&project.project_id).unwrap();
        let err = api.get_project(&project.project_id).unwrap_err();
        assert!(matches!(err, ApiError::NotFound { .. }));
    }
}
