use crate::config::config_check::validate_rubric;
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::Validate;
use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const PHASE_LOAD: &str = "load";
pub const PHASE_ANALYZE: &str = "analyze";
pub const PHASE_SYNTHESIZE: &str = "synthesize";
pub const PHASE_CONSISTENCY: &str = "consistency";

pub const KNOWN_PHASES: [&str; 4] = [PHASE_LOAD, PHASE_ANALYZE, PHASE_SYNTHESIZE, PHASE_CONSISTENCY];
pub const OUTPUT_FORMATS: [&str; 2] = ["csv", "json"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    pub pipeline: PipelineInfo,
    #[serde(default)]
    pub inputs: InputConfig,
    #[serde(default)]
    pub outputs: OutputConfig,
    #[serde(default)]
    pub filters: FilterConfig,
    #[serde(default)]
    pub mvp: MvpThresholds,
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub tiers: TierConfig,
    #[serde(default)]
    pub synthesis: SynthesisConfig,
    pub monitoring: Option<MonitoringConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineInfo {
    pub name: String,
    pub description: Option<String>,
    pub version: Option<String>,
    #[serde(default = "default_execution_order")]
    pub execution_order: Vec<String>, // 階段執行順序
    #[serde(default = "default_true")]
    pub continue_on_failure: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    pub orders: String,
    pub survey: String,
    pub menu: String,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            orders: "raw/orders.csv".to_string(),
            survey: "raw/survey.csv".to_string(),
            menu: "raw/menu.csv".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub clean_dir: String,
    pub analysis_dir: String,
    pub dashboard_dir: String,
    pub formats: Vec<String>,
    pub bundle: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            clean_dir: "clean".to_string(),
            analysis_dir: "analysis".to_string(),
            dashboard_dir: "dashboard".to_string(),
            formats: vec!["csv".to_string(), "json".to_string()],
            bundle: false,
        }
    }
}

/// 訂單日期範圍，日期以字串表示 (例如 "2024-01-01")
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl FilterConfig {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start_date.map_or(true, |start| date >= start)
            && self.end_date.map_or(true, |end| date <= end)
    }
}

/// MVP 門檻；0 代表停用該條件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MvpThresholds {
    pub min_partners: u32,
    pub min_cuisines: u32,
    pub min_dishes: u32,
    pub min_orders: u32,
    pub min_core_drivers: u32,
    pub near_ready_max_gaps: usize,
    pub near_ready_ratio: f64,
}

impl Default for MvpThresholds {
    fn default() -> Self {
        Self {
            min_partners: 5,
            min_cuisines: 3,
            min_dishes: 15,
            min_orders: 50,
            min_core_drivers: 0,
            near_ready_max_gaps: 1,
            near_ready_ratio: 0.8,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub demand: DemandWeights,
    pub preference: PreferenceWeights,
    pub overall: OverallWeights,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemandWeights {
    pub order_volume: f64,
    pub zone_coverage: f64,
}

impl Default for DemandWeights {
    fn default() -> Self {
        Self {
            order_volume: 0.7,
            zone_coverage: 0.3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreferenceWeights {
    pub rating: f64,
    pub satisfaction: f64,
    pub reorder: f64,
}

impl Default for PreferenceWeights {
    fn default() -> Self {
        Self {
            rating: 0.3,
            satisfaction: 0.4,
            reorder: 0.3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverallWeights {
    pub demand: f64,
    pub preference: f64,
}

impl Default for OverallWeights {
    fn default() -> Self {
        Self {
            demand: 0.5,
            preference: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TierConfig {
    pub driver_cutoff: f64,
    pub min_orders: usize,
}

impl Default for TierConfig {
    fn default() -> Self {
        Self {
            driver_cutoff: 60.0,
            min_orders: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesisConfig {
    pub top_n: usize,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self { top_n: 5 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub enabled: bool,
    pub log_json: Option<bool>,
}

fn default_execution_order() -> Vec<String> {
    KNOWN_PHASES.iter().map(|p| p.to_string()).collect()
}

fn default_true() -> bool {
    true
}

impl ReportConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(EtlError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| EtlError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${DINNEROO_DATA})，找不到的變數保留原樣
    fn substitute_env_vars(content: &str) -> String {
        let re = Regex::new(r"\$\{([^}]+)\}").unwrap();

        re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .to_string()
    }

    pub fn phase_enabled(&self, phase: &str) -> bool {
        self.pipeline.execution_order.iter().any(|p| p == phase)
    }

    pub fn wants_format(&self, format: &str) -> bool {
        self.outputs.formats.iter().any(|f| f == format)
    }

    pub fn clean_path(&self, file: &str) -> String {
        join_path(&self.outputs.clean_dir, file)
    }

    pub fn analysis_path(&self, file: &str) -> String {
        join_path(&self.outputs.analysis_dir, file)
    }

    pub fn dashboard_path(&self, file: &str) -> String {
        join_path(&self.outputs.dashboard_dir, file)
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.enabled).unwrap_or(false)
    }

    pub fn log_json(&self) -> bool {
        self.monitoring
            .as_ref()
            .and_then(|m| m.log_json)
            .unwrap_or(false)
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            pipeline: PipelineInfo {
                name: "dinneroo-readiness".to_string(),
                description: None,
                version: None,
                execution_order: default_execution_order(),
                continue_on_failure: true,
            },
            inputs: InputConfig::default(),
            outputs: OutputConfig::default(),
            filters: FilterConfig::default(),
            mvp: MvpThresholds::default(),
            scoring: ScoringConfig::default(),
            tiers: TierConfig::default(),
            synthesis: SynthesisConfig::default(),
            monitoring: None,
        }
    }
}

fn join_path(dir: &str, file: &str) -> String {
    let dir = dir.trim_end_matches('/');
    if dir.is_empty() || dir == "." {
        file.to_string()
    } else {
        format!("{}/{}", dir, file)
    }
}

impl Validate for ReportConfig {
    fn validate(&self) -> Result<()> {
        let report = validate_rubric(self);
        if let Some(finding) = report.errors().next() {
            return Err(EtlError::InvalidConfigValueError {
                field: finding.field.clone(),
                value: finding.value.clone(),
                reason: finding.message.clone(),
            });
        }
        Ok(())
    }
}
