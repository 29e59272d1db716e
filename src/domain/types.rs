// ==========================================
// SNT Planner - Domain Type Definitions
// ==========================================
// The typed vocabulary shared by all engines.
// Serialization format: snake_case (wire/API convention)
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// Risk Level
// ==========================================
// Order matters: VeryLow < Low < Moderate < High.
// Classification precedence follows this order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    VeryLow,
    Low,
    Moderate,
    High,
}

impl RiskLevel {
    /// All levels in classification precedence order.
    pub const ALL: [RiskLevel; 4] = [
        RiskLevel::VeryLow,
        RiskLevel::Low,
        RiskLevel::Moderate,
        RiskLevel::High,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::VeryLow => "very_low",
            RiskLevel::Low => "low",
            RiskLevel::Moderate => "moderate",
            RiskLevel::High => "high",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// Stratification Metric
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StratificationMetric {
    /// Plasmodium falciparum parasite rate (%)
    Pfpr,
    /// Annual incidence per 1,000 population
    Incidence,
    /// Entomological inoculation rate
    Eir,
}

impl fmt::Display for StratificationMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StratificationMetric::Pfpr => write!(f, "pfpr"),
            StratificationMetric::Incidence => write!(f, "incidence"),
            StratificationMetric::Eir => write!(f, "eir"),
        }
    }
}

// ==========================================
// Workflow Step Keys
// ==========================================
// The 10 fixed SNT planning steps, in canonical order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum StepKey {
    PlanningPreparedness,
    DataAssembly,
    SituationAnalysis,
    Stratification,
    InterventionTailoring,
    ImpactForecasting,
    ScenarioSelection,
    ResourceOptimization,
    ServiceDelivery,
    MonitoringEvaluation,
}

impl StepKey {
    /// Canonical step order for sequential navigation.
    pub const ORDER: [StepKey; 10] = [
        StepKey::PlanningPreparedness,
        StepKey::DataAssembly,
        StepKey::SituationAnalysis,
        StepKey::Stratification,
        StepKey::InterventionTailoring,
        StepKey::ImpactForecasting,
        StepKey::ScenarioSelection,
        StepKey::ResourceOptimization,
        StepKey::ServiceDelivery,
        StepKey::MonitoringEvaluation,
    ];

    /// Human-readable label for UI display.
    pub fn label(&self) -> &'static str {
        match self {
            StepKey::PlanningPreparedness => "Planning and Preparedness",
            StepKey::DataAssembly => "Data Assembly and Management",
            StepKey::SituationAnalysis => "Situation Analysis",
            StepKey::Stratification => "Stratification",
            StepKey::InterventionTailoring => "Intervention Tailoring",
            StepKey::ImpactForecasting => "Impact Forecasting",
            StepKey::ScenarioSelection => "Strategic Scenario Selection",
            StepKey::ResourceOptimization => "Resource Optimization",
            StepKey::ServiceDelivery => "Service Delivery",
            StepKey::MonitoringEvaluation => "Monitoring and Evaluation",
        }
    }
}

impl fmt::Display for StepKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StepKey::PlanningPreparedness => "planning_preparedness",
            StepKey::DataAssembly => "data_assembly",
            StepKey::SituationAnalysis => "situation_analysis",
            StepKey::Stratification => "stratification",
            StepKey::InterventionTailoring => "intervention_tailoring",
            StepKey::ImpactForecasting => "impact_forecasting",
            StepKey::ScenarioSelection => "scenario_selection",
            StepKey::ResourceOptimization => "resource_optimization",
            StepKey::ServiceDelivery => "service_delivery",
            StepKey::MonitoringEvaluation => "monitoring_evaluation",
        };
        write!(f, "{}", s)
    }
}

// ==========================================
// Step Status
// ==========================================
// Lifecycle: NotStarted -> InProgress -> Completed, reopen goes back
// to InProgress. Accessibility is derived, never a status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    NotStarted,
    InProgress,
    Completed,
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepStatus::NotStarted => write!(f, "not_started"),
            StepStatus::InProgress => write!(f, "in_progress"),
            StepStatus::Completed => write!(f, "completed"),
        }
    }
}

// ==========================================
// Prerequisite Type
// ==========================================
// Blocking prerequisites gate access; non-blocking ones only inform
// UI hints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrerequisiteType {
    Blocking,
    NonBlocking,
}

// ==========================================
// Intervention Codes
// ==========================================
// The fixed WHO intervention catalog.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum InterventionCode {
    /// Case Management
    Cm,
    /// Insecticide-Treated Nets
    Itn,
    /// Indoor Residual Spraying
    Irs,
    /// Seasonal Malaria Chemoprevention
    Smc,
    /// Perennial Malaria Chemoprevention
    Pmc,
    /// Intermittent Preventive Treatment in Pregnancy
    Iptp,
    /// RTS,S / R21 Vaccine
    Vaccine,
    /// Larval Source Management
    Lsm,
}

impl InterventionCode {
    pub const ALL: [InterventionCode; 8] = [
        InterventionCode::Cm,
        InterventionCode::Itn,
        InterventionCode::Irs,
        InterventionCode::Smc,
        InterventionCode::Pmc,
        InterventionCode::Iptp,
        InterventionCode::Vaccine,
        InterventionCode::Lsm,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            InterventionCode::Cm => "cm",
            InterventionCode::Itn => "itn",
            InterventionCode::Irs => "irs",
            InterventionCode::Smc => "smc",
            InterventionCode::Pmc => "pmc",
            InterventionCode::Iptp => "iptp",
            InterventionCode::Vaccine => "vaccine",
            InterventionCode::Lsm => "lsm",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            InterventionCode::Cm => "Case Management",
            InterventionCode::Itn => "Insecticide-Treated Nets",
            InterventionCode::Irs => "Indoor Residual Spraying",
            InterventionCode::Smc => "Seasonal Malaria Chemoprevention",
            InterventionCode::Pmc => "Perennial Malaria Chemoprevention",
            InterventionCode::Iptp => "Intermittent Preventive Treatment in Pregnancy",
            InterventionCode::Vaccine => "Malaria Vaccine (RTS,S/R21)",
            InterventionCode::Lsm => "Larval Source Management",
        }
    }
}

impl fmt::Display for InterventionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// Scenario Type
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioType {
    Ideal,
    Prioritized,
    BudgetConstrained,
    Custom,
}

impl fmt::Display for ScenarioType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScenarioType::Ideal => write!(f, "ideal"),
            ScenarioType::Prioritized => write!(f, "prioritized"),
            ScenarioType::BudgetConstrained => write!(f, "budget_constrained"),
            ScenarioType::Custom => write!(f, "custom"),
        }
    }
}

// ==========================================
// Forecast Status
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForecastStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl fmt::Display for ForecastStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ForecastStatus::Pending => write!(f, "pending"),
            ForecastStatus::Running => write!(f, "running"),
            ForecastStatus::Completed => write!(f, "completed"),
            ForecastStatus::Failed => write!(f, "failed"),
        }
    }
}

// ==========================================
// Cost Category
// ==========================================
// Whether an intervention cost recurs every program year or is a
// one-time outlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostRecurrence {
    Recurring,
    OneTime,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_order_has_10_steps() {
        assert_eq!(StepKey::ORDER.len(), 10);
    }

    #[test]
    fn test_risk_level_ordering() {
        assert!(RiskLevel::VeryLow < RiskLevel::Low);
        assert!(RiskLevel::Moderate < RiskLevel::High);
    }

    #[test]
    fn test_snake_case_serialization() {
        assert_eq!(
            serde_json::to_string(&RiskLevel::VeryLow).unwrap(),
            "\"very_low\""
        );
        assert_eq!(
            serde_json::to_string(&StepKey::DataAssembly).unwrap(),
            "\"data_assembly\""
        );
        assert_eq!(
            serde_json::to_string(&InterventionCode::Iptp).unwrap(),
            "\"iptp\""
        );
        assert_eq!(
            serde_json::to_string(&ScenarioType::BudgetConstrained).unwrap(),
            "\"budget_constrained\""
        );
    }

    #[test]
    fn test_display_matches_serde() {
        assert_eq!(RiskLevel::VeryLow.to_string(), "very_low");
        assert_eq!(StepKey::MonitoringEvaluation.to_string(), "monitoring_evaluation");
        assert_eq!(ForecastStatus::Failed.to_string(), "failed");
    }
}
