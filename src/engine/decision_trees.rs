// ==========================================
// SNT Planner - WHO Decision Tree Catalog
// ==========================================
// Static eligibility criteria and tailoring questions per
// intervention, following WHO guidance for subnational tailoring.
// Loaded once, read-only at evaluation time.
// ==========================================

use std::collections::BTreeMap;

use crate::domain::intervention::{
    EligibilityCriterion, InterventionDecisionTree, QuestionKind, TailoringOption,
    TailoringQuestion,
};
use crate::domain::types::{InterventionCode, RiskLevel};

fn option(value: &str, label: &str) -> TailoringOption {
    TailoringOption {
        value: value.to_string(),
        label: label.to_string(),
        conditions: BTreeMap::new(),
    }
}

fn option_if(value: &str, label: &str, key: &str, condition: &str) -> TailoringOption {
    let mut conditions = BTreeMap::new();
    conditions.insert(key.to_string(), condition.to_string());
    TailoringOption {
        value: value.to_string(),
        label: label.to_string(),
        conditions,
    }
}

fn select(id: &str, question: &str, options: Vec<TailoringOption>) -> TailoringQuestion {
    TailoringQuestion {
        id: id.to_string(),
        question: question.to_string(),
        kind: QuestionKind::Select {
            options,
            default: None,
        },
        help_text: None,
    }
}

fn numeric(
    id: &str,
    question: &str,
    min_value: f64,
    max_value: f64,
    default: f64,
) -> TailoringQuestion {
    TailoringQuestion {
        id: id.to_string(),
        question: question.to_string(),
        kind: QuestionKind::Numeric {
            min_value,
            max_value,
            default: Some(default),
        },
        help_text: None,
    }
}

fn with_help(mut q: TailoringQuestion, help: &str) -> TailoringQuestion {
    q.help_text = Some(help.to_string());
    q
}

fn risk_criterion(levels: &[RiskLevel]) -> EligibilityCriterion {
    EligibilityCriterion::RiskLevel {
        levels: levels.to_vec(),
    }
}

/// Build the full static catalog, one tree per intervention.
pub fn catalog() -> Vec<InterventionDecisionTree> {
    vec![
        itn_tree(),
        irs_tree(),
        smc_tree(),
        iptp_tree(),
        vaccine_tree(),
        cm_tree(),
        pmc_tree(),
        lsm_tree(),
    ]
}

fn itn_tree() -> InterventionDecisionTree {
    InterventionDecisionTree {
        intervention_code: InterventionCode::Itn,
        intervention_name: InterventionCode::Itn.label(),
        eligibility_criteria: vec![risk_criterion(&[
            RiskLevel::Low,
            RiskLevel::Moderate,
            RiskLevel::High,
        ])],
        tailoring_questions: vec![
            with_help(
                select(
                    "itn_type",
                    "What type of ITN is most appropriate?",
                    vec![
                        option("standard_llin", "Standard LLIN"),
                        option_if("pbo_llin", "PBO LLIN", "pyrethroid_resistance_pct", ">40"),
                        option_if(
                            "dual_ai_llin",
                            "Dual Active-Ingredient LLIN",
                            "pyrethroid_resistance_pct",
                            ">60",
                        ),
                    ],
                ),
                "Select based on local insecticide resistance data",
            ),
            select(
                "distribution_strategy",
                "What distribution strategy?",
                vec![
                    option("mass_campaign", "Mass campaign (3-year cycle)"),
                    option("continuous", "Continuous distribution (ANC/EPI)"),
                    option("hybrid", "Hybrid (campaign + continuous top-up)"),
                ],
            ),
            with_help(
                numeric("coverage_target", "Target coverage (%)?", 50.0, 100.0, 80.0),
                "WHO recommends universal coverage (1 net per 2 people)",
            ),
        ],
    }
}

fn irs_tree() -> InterventionDecisionTree {
    InterventionDecisionTree {
        intervention_code: InterventionCode::Irs,
        intervention_name: InterventionCode::Irs.label(),
        eligibility_criteria: vec![risk_criterion(&[RiskLevel::Moderate, RiskLevel::High])],
        tailoring_questions: vec![
            with_help(
                select(
                    "insecticide_class",
                    "Insecticide class?",
                    vec![
                        option("pyrethroid", "Pyrethroid"),
                        option("organophosphate", "Organophosphate (Pirimiphos-methyl)"),
                        option("carbamate", "Carbamate (Bendiocarb)"),
                        option("neonicotinoid", "Neonicotinoid (Clothianidin)"),
                    ],
                ),
                "Based on local vector susceptibility testing",
            ),
            with_help(
                numeric("spray_rounds", "Spray rounds per year?", 1.0, 2.0, 1.0),
                "Depends on insecticide residual duration and transmission season length",
            ),
            select(
                "geographic_targeting",
                "Geographic targeting approach?",
                vec![
                    option("universal", "Universal (all structures)"),
                    option("targeted_high_risk", "High-risk areas only"),
                    option("focal", "Focal (outbreak/hotspot response)"),
                ],
            ),
        ],
    }
}

fn smc_tree() -> InterventionDecisionTree {
    InterventionDecisionTree {
        intervention_code: InterventionCode::Smc,
        intervention_name: InterventionCode::Smc.label(),
        eligibility_criteria: vec![
            risk_criterion(&[RiskLevel::Moderate, RiskLevel::High]),
            EligibilityCriterion::Seasonality {
                required: "seasonal".to_string(),
            },
        ],
        tailoring_questions: vec![
            with_help(
                select(
                    "target_age",
                    "Target age group?",
                    vec![
                        option("3_59_months", "3-59 months (standard)"),
                        option("3_10_years", "3-10 years (extended)"),
                    ],
                ),
                "Extended age group if high burden in 5-10 year olds",
            ),
            with_help(
                numeric("num_cycles", "Number of monthly cycles?", 3.0, 5.0, 4.0),
                "Based on length of high transmission season",
            ),
            select(
                "delivery_strategy",
                "Delivery approach?",
                vec![
                    option("door_to_door", "Door-to-door"),
                    option("fixed_point", "Fixed distribution points"),
                    option("school_based", "School-based (if extended age)"),
                ],
            ),
        ],
    }
}

fn iptp_tree() -> InterventionDecisionTree {
    InterventionDecisionTree {
        intervention_code: InterventionCode::Iptp,
        intervention_name: InterventionCode::Iptp.label(),
        eligibility_criteria: vec![risk_criterion(&[
            RiskLevel::Low,
            RiskLevel::Moderate,
            RiskLevel::High,
        ])],
        tailoring_questions: vec![
            with_help(
                numeric("num_doses", "Minimum IPTp-SP doses?", 3.0, 8.0, 3.0),
                "WHO recommends at least 3 doses at each ANC visit",
            ),
            select(
                "delivery_platform",
                "Delivery platform?",
                vec![
                    option("anc_facility", "ANC at health facility"),
                    option("community", "Community-based delivery"),
                ],
            ),
        ],
    }
}

fn vaccine_tree() -> InterventionDecisionTree {
    InterventionDecisionTree {
        intervention_code: InterventionCode::Vaccine,
        intervention_name: InterventionCode::Vaccine.label(),
        eligibility_criteria: vec![risk_criterion(&[RiskLevel::Moderate, RiskLevel::High])],
        tailoring_questions: vec![
            select(
                "vaccine_product",
                "Vaccine product?",
                vec![
                    option("rtss", "RTS,S/AS01"),
                    option("r21", "R21/Matrix-M"),
                ],
            ),
            select(
                "delivery_platform",
                "Delivery platform?",
                vec![
                    option("epi_routine", "Routine EPI (integrated)"),
                    option("campaign", "Catch-up campaign + routine"),
                ],
            ),
            numeric("age_first_dose", "Age at first dose (months)?", 5.0, 17.0, 5.0),
        ],
    }
}

fn cm_tree() -> InterventionDecisionTree {
    InterventionDecisionTree {
        intervention_code: InterventionCode::Cm,
        intervention_name: InterventionCode::Cm.label(),
        // Case management is universal across all risk levels.
        eligibility_criteria: vec![risk_criterion(&[
            RiskLevel::VeryLow,
            RiskLevel::Low,
            RiskLevel::Moderate,
            RiskLevel::High,
        ])],
        tailoring_questions: vec![
            select(
                "diagnostic_approach",
                "Diagnostic approach?",
                vec![
                    option("microscopy", "Microscopy"),
                    option("rdt", "Rapid Diagnostic Test (RDT)"),
                    option("both", "Both (microscopy + RDT)"),
                ],
            ),
            select(
                "treatment_protocol",
                "First-line treatment?",
                vec![
                    option("al", "Artemether-Lumefantrine (AL)"),
                    option("asaq", "Artesunate-Amodiaquine (ASAQ)"),
                    option("dha_ppq", "DHA-Piperaquine"),
                ],
            ),
            with_help(
                TailoringQuestion {
                    id: "community_case_mgmt".to_string(),
                    question: "Include community case management (iCCM)?".to_string(),
                    kind: QuestionKind::Boolean {
                        default: Some(true),
                    },
                    help_text: None,
                },
                "Community health workers diagnose and treat uncomplicated malaria",
            ),
        ],
    }
}

fn pmc_tree() -> InterventionDecisionTree {
    InterventionDecisionTree {
        intervention_code: InterventionCode::Pmc,
        intervention_name: InterventionCode::Pmc.label(),
        eligibility_criteria: vec![
            risk_criterion(&[RiskLevel::Moderate, RiskLevel::High]),
            EligibilityCriterion::Seasonality {
                required: "perennial".to_string(),
            },
        ],
        tailoring_questions: vec![
            numeric("num_doses", "Number of PMC doses?", 3.0, 6.0, 3.0),
            select(
                "drug_regimen",
                "Drug regimen?",
                vec![
                    option("sp", "Sulfadoxine-Pyrimethamine (SP)"),
                    option("dha_ppq", "DHA-Piperaquine"),
                ],
            ),
        ],
    }
}

fn lsm_tree() -> InterventionDecisionTree {
    InterventionDecisionTree {
        intervention_code: InterventionCode::Lsm,
        intervention_name: InterventionCode::Lsm.label(),
        eligibility_criteria: vec![EligibilityCriterion::Setting {
            settings: vec!["urban".to_string(), "peri_urban".to_string()],
        }],
        tailoring_questions: vec![
            select(
                "lsm_type",
                "LSM approach?",
                vec![
                    option("environmental", "Environmental management"),
                    option("biological", "Biological control (Bti/Bs)"),
                    option("combined", "Combined approach"),
                ],
            ),
            select(
                "targeting",
                "Targeting approach?",
                vec![
                    option("all_sites", "All identified breeding sites"),
                    option("productive_sites", "Most productive sites only"),
                ],
            ),
        ],
    }
}
