//! Rubric configuration checks: weights, cutoffs, thresholds and phase order.

use crate::config::toml_config::{ReportConfig, KNOWN_PHASES, OUTPUT_FORMATS};
use crate::utils::validation::{
    validate_non_negative, validate_one_of, validate_path, validate_range,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

const WEIGHT_TOLERANCE: f64 = 0.001;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub severity: Severity,
    pub field: String,
    pub value: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigReport {
    pub findings: Vec<Finding>,
}

impl ConfigReport {
    pub fn is_valid(&self) -> bool {
        self.errors().next().is_none()
    }

    pub fn errors(&self) -> impl Iterator<Item = &Finding> {
        self.findings
            .iter()
            .filter(|f| f.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Finding> {
        self.findings
            .iter()
            .filter(|f| f.severity == Severity::Warning)
    }

    fn error(&mut self, field: &str, value: impl ToString, message: impl Into<String>) {
        self.findings.push(Finding {
            severity: Severity::Error,
            field: field.to_string(),
            value: value.to_string(),
            message: message.into(),
        });
    }

    fn warning(&mut self, field: &str, value: impl ToString, message: impl Into<String>) {
        self.findings.push(Finding {
            severity: Severity::Warning,
            field: field.to_string(),
            value: value.to_string(),
            message: message.into(),
        });
    }

    /// 把驗證器回傳的錯誤轉為 finding
    fn absorb(&mut self, result: crate::utils::error::Result<()>) {
        if let Err(crate::utils::error::EtlError::InvalidConfigValueError {
            field,
            value,
            reason,
        }) = result
        {
            self.error(&field, value, reason);
        }
    }

    fn check_weight_group(&mut self, group: &str, weights: &[(&str, f64)]) {
        let mut all_valid = true;
        for (name, weight) in weights {
            let field = format!("{}.{}", group, name);
            let result = validate_non_negative(&field, *weight);
            all_valid &= result.is_ok();
            self.absorb(result);
        }
        if !all_valid {
            return;
        }

        let total: f64 = weights.iter().map(|(_, w)| w).sum();
        if total <= 0.0 {
            self.error(group, total, "Weights must not all be zero");
        } else if (total - 1.0).abs() > WEIGHT_TOLERANCE {
            self.warning(
                group,
                format!("{:.3}", total),
                "Weights do not sum to 1.0; they will be renormalized",
            );
        }
    }
}

/// 驗證評分規則配置，回傳所有錯誤與警告
pub fn validate_rubric(config: &ReportConfig) -> ConfigReport {
    let mut report = ConfigReport::default();

    // 階段順序
    let mut seen = HashSet::new();
    for phase in &config.pipeline.execution_order {
        report.absorb(validate_one_of(
            "pipeline.execution_order",
            phase,
            &KNOWN_PHASES,
        ));
        if !seen.insert(phase.as_str()) {
            report.error(
                "pipeline.execution_order",
                phase,
                "Phase listed more than once",
            );
        }
    }

    // 輸入與輸出路徑
    report.absorb(validate_path("inputs.orders", &config.inputs.orders));
    report.absorb(validate_path("inputs.survey", &config.inputs.survey));
    report.absorb(validate_path("inputs.menu", &config.inputs.menu));
    for format in &config.outputs.formats {
        report.absorb(validate_one_of("outputs.formats", format, &OUTPUT_FORMATS));
    }

    if let (Some(start), Some(end)) = (config.filters.start_date, config.filters.end_date) {
        if start > end {
            report.error(
                "filters.start_date",
                start,
                format!("start_date is after end_date ({})", end),
            );
        }
    }

    // 權重
    let scoring = &config.scoring;
    report.check_weight_group(
        "scoring.demand",
        &[
            ("order_volume", scoring.demand.order_volume),
            ("zone_coverage", scoring.demand.zone_coverage),
        ],
    );
    report.check_weight_group(
        "scoring.preference",
        &[
            ("rating", scoring.preference.rating),
            ("satisfaction", scoring.preference.satisfaction),
            ("reorder", scoring.preference.reorder),
        ],
    );
    report.check_weight_group(
        "scoring.overall",
        &[
            ("demand", scoring.overall.demand),
            ("preference", scoring.overall.preference),
        ],
    );

    report.absorb(validate_range(
        "tiers.driver_cutoff",
        config.tiers.driver_cutoff,
        0.0,
        100.0,
    ));

    // MVP 門檻
    let mvp = &config.mvp;
    if !(mvp.near_ready_ratio > 0.0 && mvp.near_ready_ratio <= 1.0) {
        report.error(
            "mvp.near_ready_ratio",
            mvp.near_ready_ratio,
            "Ratio must be greater than 0 and at most 1",
        );
    }

    let active = [
        mvp.min_partners,
        mvp.min_cuisines,
        mvp.min_dishes,
        mvp.min_orders,
        mvp.min_core_drivers,
    ]
    .iter()
    .filter(|t| **t > 0)
    .count();

    if active == 0 {
        report.warning(
            "mvp",
            0,
            "Every MVP threshold is disabled; all zones with data will be MVP Ready",
        );
    } else if mvp.near_ready_max_gaps > active {
        report.warning(
            "mvp.near_ready_max_gaps",
            mvp.near_ready_max_gaps,
            format!("Larger than the number of active criteria ({})", active),
        );
    }

    if config.synthesis.top_n == 0 {
        report.warning("synthesis.top_n", 0, "Dashboard top-dish lists will be empty");
    }

    report
}
