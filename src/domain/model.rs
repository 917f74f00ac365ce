use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;

/// 清理後的訂單列
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRow {
    pub order_id: String,
    pub order_date: NaiveDate,
    pub zone: String,
    pub partner: String,
    pub cuisine: String,
    pub dish: String,
    pub order_value: Option<f64>,
    pub rating: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurveyResponse {
    pub response_id: String,
    pub zone: String,
    pub dish: String,
    pub satisfaction: Option<f64>,
    pub would_reorder: Option<bool>,
}

/// 菜單/合作夥伴目錄中的一道菜
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuItem {
    pub partner: String,
    pub zone: String,
    pub cuisine: String,
    pub dish: String,
    pub price: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DishTier {
    #[serde(rename = "Core Driver")]
    CoreDriver,
    #[serde(rename = "Preference Driver")]
    PreferenceDriver,
    #[serde(rename = "Demand Driver")]
    DemandDriver,
    #[serde(rename = "Niche")]
    Niche,
    #[serde(rename = "Insufficient Data")]
    InsufficientData,
}

impl DishTier {
    pub const ALL: [DishTier; 5] = [
        DishTier::CoreDriver,
        DishTier::PreferenceDriver,
        DishTier::DemandDriver,
        DishTier::Niche,
        DishTier::InsufficientData,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            DishTier::CoreDriver => "Core Driver",
            DishTier::PreferenceDriver => "Preference Driver",
            DishTier::DemandDriver => "Demand Driver",
            DishTier::Niche => "Niche",
            DishTier::InsufficientData => "Insufficient Data",
        }
    }
}

impl fmt::Display for DishTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MvpStatus {
    #[serde(rename = "MVP Ready")]
    MvpReady,
    #[serde(rename = "Near Ready")]
    NearReady,
    #[serde(rename = "Developing")]
    Developing,
    #[serde(rename = "No Data")]
    NoData,
}

impl MvpStatus {
    pub const ALL: [MvpStatus; 4] = [
        MvpStatus::MvpReady,
        MvpStatus::NearReady,
        MvpStatus::Developing,
        MvpStatus::NoData,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            MvpStatus::MvpReady => "MVP Ready",
            MvpStatus::NearReady => "Near Ready",
            MvpStatus::Developing => "Developing",
            MvpStatus::NoData => "No Data",
        }
    }
}

impl fmt::Display for MvpStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// 每道菜的分數列，寫入 analysis/dish_scores.csv
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DishScore {
    pub dish_key: String,
    pub dish: String,
    pub order_count: usize,
    pub zone_count: usize,
    pub partner_count: usize,
    pub avg_rating: Option<f64>,
    pub survey_responses: usize,
    pub avg_satisfaction: Option<f64>,
    pub reorder_rate: Option<f64>,
    pub demand_score: Option<f64>,
    pub preference_score: Option<f64>,
    pub overall_score: Option<f64>,
    pub tier: DishTier,
}

/// 每個區域的 MVP 評估列，寫入 analysis/zone_analysis.csv
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneAnalysis {
    pub zone: String,
    pub partner_count: usize,
    pub cuisine_count: usize,
    pub dish_count: usize,
    pub order_count: usize,
    pub core_driver_count: usize,
    pub avg_rating: Option<f64>,
    pub readiness_score: f64,
    pub mvp_status: MvpStatus,
    pub gaps: String,
}

/// 各輸入檔案的資料品質統計
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileQuality {
    pub path: String,
    pub missing: bool,
    pub rows_read: usize,
    pub rows_kept: usize,
    pub skipped_malformed: usize,
    pub filtered_out: usize,
    pub duplicates: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataQualityReport {
    pub generated_at: String,
    pub files: BTreeMap<String, FileQuality>,
}

/// 單一階段的執行產出
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PhaseOutput {
    pub phase: String,
    pub records: usize,
    pub artifacts: Vec<String>,
}

fn dish_key_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[^\p{Alphabetic}\p{Nd}]+").expect("static regex"))
}

fn whitespace_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\s+").expect("static regex"))
}

/// 菜名正規化：小寫、非字母數字 (含非拉丁文字) 的字元合併為單一空白
pub fn dish_key(name: &str) -> String {
    let lowered = name.to_lowercase();
    dish_key_pattern()
        .replace_all(&lowered, " ")
        .trim()
        .to_string()
}

/// 去除頭尾空白並合併內部連續空白
pub fn clean_label(value: &str) -> String {
    whitespace_pattern()
        .replace_all(value.trim(), " ")
        .to_string()
}
