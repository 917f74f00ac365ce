use crate::config::config_check::{validate_rubric, ConfigReport};
use crate::config::toml_config::{FilterConfig, ReportConfig, PHASE_LOAD};
use crate::core::{Pipeline, Storage};
use crate::domain::model::{
    clean_label, dish_key, DataQualityReport, FileQuality, MenuItem, OrderRow, PhaseOutput,
    SurveyResponse,
};
use crate::utils::error::{EtlError, Result};
use crate::utils::tables::{read_csv, write_csv, write_json, TableRead};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Deserialize;
use std::collections::HashSet;
use std::sync::Arc;

pub const CLEAN_ORDERS: &str = "orders.csv";
pub const CLEAN_SURVEY: &str = "survey.csv";
pub const CLEAN_MENU: &str = "menu.csv";
pub const DATA_QUALITY: &str = "data_quality.json";
pub const CONFIG_VALIDATION: &str = "config_validation.json";

/// 原始訂單匯出，所有欄位先以字串讀入
#[derive(Debug, Clone, Deserialize)]
pub struct RawOrder {
    pub order_id: String,
    pub order_date: String,
    pub zone: String,
    pub partner: String,
    #[serde(default)]
    pub cuisine: String,
    pub dish: String,
    #[serde(default)]
    pub order_value: String,
    #[serde(default)]
    pub rating: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawSurvey {
    pub response_id: String,
    #[serde(default)]
    pub zone: String,
    pub dish: String,
    #[serde(default)]
    pub satisfaction: String,
    #[serde(default)]
    pub would_reorder: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawMenuItem {
    pub partner: String,
    pub zone: String,
    #[serde(default)]
    pub cuisine: String,
    pub dish: String,
    #[serde(default)]
    pub price: String,
}

pub struct RawTables {
    pub orders: TableRead<RawOrder>,
    pub survey: TableRead<RawSurvey>,
    pub menu: TableRead<RawMenuItem>,
    pub config_report: ConfigReport,
}

pub struct CleanTables {
    pub orders: Vec<OrderRow>,
    pub survey: Vec<SurveyResponse>,
    pub menu: Vec<MenuItem>,
    pub quality: DataQualityReport,
    pub config_report: ConfigReport,
}

/// 支援 2024-03-01、01/03/2024 與含時間的格式
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%d/%m/%Y") {
        return Some(date);
    }
    if let Ok(datetime) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S") {
        return Some(datetime.date());
    }
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.date_naive())
}

/// 寬鬆數字解析，去除貨幣符號與千分位
pub fn parse_number(value: &str) -> Option<f64> {
    let cleaned: String = value
        .trim()
        .chars()
        .filter(|c| !matches!(c, '£' | '$' | '€' | ','))
        .collect();
    match cleaned.to_lowercase().as_str() {
        "" | "n/a" | "na" | "null" | "none" | "-" => None,
        other => other.parse::<f64>().ok().filter(|v| v.is_finite()),
    }
}

pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "yes" | "y" | "true" | "1" => Some(true),
        "no" | "n" | "false" | "0" => Some(false),
        _ => None,
    }
}

fn parse_score(value: &str) -> Option<f64> {
    parse_number(value).filter(|v| (1.0..=5.0).contains(v))
}

fn base_quality<T>(path: &str, table: &TableRead<T>) -> FileQuality {
    FileQuality {
        path: path.to_string(),
        missing: table.missing,
        rows_read: table.rows_read,
        skipped_malformed: table.skipped,
        ..Default::default()
    }
}

pub fn clean_orders(
    path: &str,
    table: &TableRead<RawOrder>,
    filters: &FilterConfig,
) -> (Vec<OrderRow>, FileQuality) {
    let mut quality = base_quality(path, table);
    let mut seen = HashSet::new();
    let mut rows = Vec::new();

    for raw in &table.rows {
        let order_id = clean_label(&raw.order_id);
        let zone = clean_label(&raw.zone);
        let partner = clean_label(&raw.partner);
        let dish = clean_label(&raw.dish);
        let key = dish_key(&dish);

        let Some(order_date) = parse_date(&raw.order_date) else {
            tracing::debug!("Order {}: unparseable date '{}'", order_id, raw.order_date);
            quality.skipped_malformed += 1;
            continue;
        };
        if order_id.is_empty() || zone.is_empty() || partner.is_empty() || key.is_empty() {
            tracing::debug!("Order '{}': missing required field", order_id);
            quality.skipped_malformed += 1;
            continue;
        }
        if !filters.contains(order_date) {
            quality.filtered_out += 1;
            continue;
        }
        if !seen.insert((order_id.clone(), key)) {
            quality.duplicates += 1;
            continue;
        }

        rows.push(OrderRow {
            order_id,
            order_date,
            zone,
            partner,
            cuisine: clean_label(&raw.cuisine),
            dish,
            order_value: parse_number(&raw.order_value),
            rating: parse_score(&raw.rating),
        });
    }

    quality.rows_kept = rows.len();
    (rows, quality)
}

pub fn clean_survey(
    path: &str,
    table: &TableRead<RawSurvey>,
) -> (Vec<SurveyResponse>, FileQuality) {
    let mut quality = base_quality(path, table);
    let mut rows = Vec::new();

    for raw in &table.rows {
        let dish = clean_label(&raw.dish);
        if dish_key(&dish).is_empty() {
            quality.skipped_malformed += 1;
            continue;
        }
        rows.push(SurveyResponse {
            response_id: clean_label(&raw.response_id),
            zone: clean_label(&raw.zone),
            dish,
            satisfaction: parse_score(&raw.satisfaction),
            would_reorder: parse_bool(&raw.would_reorder),
        });
    }

    quality.rows_kept = rows.len();
    (rows, quality)
}

pub fn clean_menu(path: &str, table: &TableRead<RawMenuItem>) -> (Vec<MenuItem>, FileQuality) {
    let mut quality = base_quality(path, table);
    let mut seen = HashSet::new();
    let mut rows = Vec::new();

    for raw in &table.rows {
        let partner = clean_label(&raw.partner);
        let zone = clean_label(&raw.zone);
        let dish = clean_label(&raw.dish);
        let key = dish_key(&dish);
        if partner.is_empty() || zone.is_empty() || key.is_empty() {
            quality.skipped_malformed += 1;
            continue;
        }
        if !seen.insert((partner.clone(), zone.clone(), key)) {
            quality.duplicates += 1;
            continue;
        }
        rows.push(MenuItem {
            partner,
            zone,
            cuisine: clean_label(&raw.cuisine),
            dish,
            price: parse_number(&raw.price),
        });
    }

    quality.rows_kept = rows.len();
    (rows, quality)
}

/// 第一階段：驗證配置、讀入原始檔並清理
pub struct LoadPipeline<S: Storage> {
    storage: S,
    config: Arc<ReportConfig>,
}

impl<S: Storage> LoadPipeline<S> {
    pub fn new(storage: S, config: Arc<ReportConfig>) -> Self {
        Self { storage, config }
    }
}

#[async_trait::async_trait]
impl<S: Storage> Pipeline for LoadPipeline<S> {
    type Extracted = RawTables;
    type Transformed = CleanTables;

    fn name(&self) -> &str {
        PHASE_LOAD
    }

    async fn extract(&self) -> Result<RawTables> {
        let config_report = validate_rubric(&self.config);
        for warning in config_report.warnings() {
            tracing::warn!("⚠️ Config {}: {}", warning.field, warning.message);
        }

        let inputs = &self.config.inputs;
        tracing::info!(
            "📥 Reading raw inputs: {}, {}, {}",
            inputs.orders,
            inputs.survey,
            inputs.menu
        );

        let orders = read_csv::<_, RawOrder>(&self.storage, &inputs.orders).await?;
        let survey = read_csv::<_, RawSurvey>(&self.storage, &inputs.survey).await?;
        let menu = read_csv::<_, RawMenuItem>(&self.storage, &inputs.menu).await?;

        Ok(RawTables {
            orders,
            survey,
            menu,
            config_report,
        })
    }

    async fn transform(&self, data: RawTables) -> Result<CleanTables> {
        let inputs = &self.config.inputs;
        let (orders, orders_quality) =
            clean_orders(&inputs.orders, &data.orders, &self.config.filters);
        let (survey, survey_quality) = clean_survey(&inputs.survey, &data.survey);
        let (menu, menu_quality) = clean_menu(&inputs.menu, &data.menu);

        tracing::info!(
            "🧹 Cleaned {} orders, {} survey responses, {} menu items",
            orders.len(),
            survey.len(),
            menu.len()
        );

        let mut quality = DataQualityReport {
            generated_at: chrono::Utc::now().to_rfc3339(),
            ..Default::default()
        };
        quality.files.insert("orders".to_string(), orders_quality);
        quality.files.insert("survey".to_string(), survey_quality);
        quality.files.insert("menu".to_string(), menu_quality);

        Ok(CleanTables {
            orders,
            survey,
            menu,
            quality,
            config_report: data.config_report,
        })
    }

    async fn load(&self, result: CleanTables) -> Result<PhaseOutput> {
        let config_path = self.config.clean_path(CONFIG_VALIDATION);
        write_json(&self.storage, &config_path, &result.config_report).await?;

        if let Some(error) = result.config_report.errors().next() {
            return Err(EtlError::InvalidConfigValueError {
                field: error.field.clone(),
                value: error.value.clone(),
                reason: error.message.clone(),
            });
        }

        let orders_path = self.config.clean_path(CLEAN_ORDERS);
        let survey_path = self.config.clean_path(CLEAN_SURVEY);
        let menu_path = self.config.clean_path(CLEAN_MENU);
        let quality_path = self.config.clean_path(DATA_QUALITY);

        write_csv(&self.storage, &orders_path, &result.orders).await?;
        write_csv(&self.storage, &survey_path, &result.survey).await?;
        write_csv(&self.storage, &menu_path, &result.menu).await?;
        write_json(&self.storage, &quality_path, &result.quality).await?;

        Ok(PhaseOutput {
            phase: PHASE_LOAD.to_string(),
            records: result.orders.len() + result.survey.len() + result.menu.len(),
            artifacts: vec![config_path, orders_path, survey_path, menu_path, quality_path],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::tables::parse_csv;

    #[test]
    fn test_parse_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 1);
        assert_eq!(parse_date("2024-03-01"), expected);
        assert_eq!(parse_date("01/03/2024"), expected);
        assert_eq!(parse_date("2024-03-01 18:30:00"), expected);
        assert_eq!(parse_date("2024-03-01T18:30:00Z"), expected);
        assert_eq!(parse_date("March 1st"), None);
        assert_eq!(parse_date(""), None);
    }

    #[test]
    fn test_parse_number_and_bool() {
        assert_eq!(parse_number("£1,250.50"), Some(1250.5));
        assert_eq!(parse_number("n/a"), None);
        assert_eq!(parse_number("abc"), None);
        assert_eq!(parse_bool("Yes"), Some(true));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
        assert_eq!(parse_score("7"), None);
        assert_eq!(parse_score("4"), Some(4.0));
    }

    #[test]
    fn test_clean_orders_skips_filters_and_dedupes() {
        let csv = "\
order_id,order_date,zone,partner,cuisine,dish,order_value,rating
1,2024-03-01, North ,Wok,Thai,Pad Thai,12.50,5
1,2024-03-01,North,Wok,Thai,pad-thai,12.50,5
2,not-a-date,North,Wok,Thai,Pad Thai,,
3,2023-12-31,North,Wok,Thai,Pad Thai,,
4,2024-03-02,,Wok,Thai,Pad Thai,,
5,2024-03-03,South,Pasta Co,Italian,Lasagne,£9,9
";
        let table = parse_csv::<RawOrder>("orders.csv", csv.as_bytes());
        let filters = FilterConfig {
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1),
            end_date: None,
        };

        let (rows, quality) = clean_orders("orders.csv", &table, &filters);

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].zone, "North");
        assert_eq!(rows[0].rating, Some(5.0));
        assert_eq!(rows[1].order_value, Some(9.0));
        // 評分超出 1..=5 視為缺值
        assert_eq!(rows[1].rating, None);
        assert_eq!(quality.rows_read, 6);
        assert_eq!(quality.rows_kept, 2);
        assert_eq!(quality.duplicates, 1);
        assert_eq!(quality.filtered_out, 1);
        assert_eq!(quality.skipped_malformed, 2);
    }

    #[test]
    fn test_clean_survey_and_menu() {
        let survey = parse_csv::<RawSurvey>(
            "survey.csv",
            "response_id,zone,dish,satisfaction,would_reorder\nr1,North,Pad Thai,5,yes\nr2,North,,4,no\nr3,South,Lasagne,0,maybe\n"
                .as_bytes(),
        );
        let (responses, quality) = clean_survey("survey.csv", &survey);
        assert_eq!(responses.len(), 2);
        assert_eq!(quality.skipped_malformed, 1);
        assert_eq!(responses[1].satisfaction, None);
        assert_eq!(responses[1].would_reorder, None);

        let menu = parse_csv::<RawMenuItem>(
            "menu.csv",
            "partner,zone,cuisine,dish,price\nWok,North,Thai,Pad Thai,9.5\nWok,North,Thai,PAD THAI,9.5\nWok,North,Thai,Green Curry,\n"
                .as_bytes(),
        );
        let (items, quality) = clean_menu("menu.csv", &menu);
        assert_eq!(items.len(), 2);
        assert_eq!(quality.duplicates, 1);
        assert_eq!(items[1].price, None);
    }

    #[test]
    fn test_non_latin_dishes_survive_cleaning() {
        let menu = parse_csv::<RawMenuItem>(
            "menu.csv",
            "partner,zone,cuisine,dish,price\n\
             Wok,North,Chinese,宮保雞丁,9\n\
             Wok,North,Chinese,麻婆豆腐,8\n\
             Pho House,North,Vietnamese,Phở Bò,10\n\
             Bistro,North,French,Crème Brûlée,6\n"
                .as_bytes(),
        );
        let (items, quality) = clean_menu("menu.csv", &menu);
        assert_eq!(items.len(), 4);
        assert_eq!(quality.skipped_malformed, 0);

        let orders = parse_csv::<RawOrder>(
            "orders.csv",
            "order_id,order_date,zone,partner,cuisine,dish,order_value,rating\n\
             1,2024-03-01,North,Wok,Chinese,宮保雞丁,12,5\n\
             2,2024-03-01,North,Bistro,French,Crème Brûlée,6,4\n\
             2,2024-03-01,North,Bistro,French,crème brûlée,6,4\n"
                .as_bytes(),
        );
        let (rows, quality) = clean_orders("orders.csv", &orders, &FilterConfig::default());
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].dish, "宮保雞丁");
        assert_eq!(quality.skipped_malformed, 0);
        // 大小寫不同的同一道菜視為重複
        assert_eq!(quality.duplicates, 1);
    }

    #[test]
    fn test_missing_required_column_skips_every_row() {
        let table = parse_csv::<RawMenuItem>(
            "menu.csv",
            "partner,cuisine,dish\nWok,Thai,Pad Thai\n".as_bytes(),
        );
        assert_eq!(table.rows.len(), 0);
        assert_eq!(table.skipped, 1);
    }
}
