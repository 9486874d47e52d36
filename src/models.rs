use crate::store::Row;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    Green,
    Yellow,
    Red,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Green => "Green",
            Self::Yellow => "Yellow",
            Self::Red => "Red",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "Green" => Some(Self::Green),
            "Yellow" => Some(Self::Yellow),
            "Red" => Some(Self::Red),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    Pending,
    #[serde(rename = "Scale-up")]
    ScaleUp,
    Exit,
    Archived,
}

impl Verdict {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::ScaleUp => "Scale-up",
            Self::Exit => "Exit",
            Self::Archived => "Archived",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "Pending" => Some(Self::Pending),
            "Scale-up" => Some(Self::ScaleUp),
            "Exit" => Some(Self::Exit),
            "Archived" => Some(Self::Archived),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Quadrant {
    Star,
    Pivot,
    Risk,
    Stop,
}

impl Quadrant {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Star => "Star",
            Self::Pivot => "Pivot",
            Self::Risk => "Risk",
            Self::Stop => "Stop",
        }
    }
}

pub mod columns {
    pub const PROJECT_ID: &str = "ProjectID";
    pub const PROJECT_NAME: &str = "ProjectName";
    pub const SS_VISION: &str = "SS_Vision";
    pub const SS_RESONANCE: &str = "SS_Resonance";
    pub const SS_CONTEXT: &str = "SS_Context";
    pub const VV_MARKET: &str = "VV_Market";
    pub const VV_SPEED: &str = "VV_Speed";
    pub const VV_FRICTION: &str = "VV_Friction";
    pub const WORK_HOURS: &str = "Work_Hours";
    /// Legacy header still present in older workbooks; read-side alias for [`WORK_HOURS`].
    pub const ASSET_VOLUME: &str = "Asset_Volume";
    pub const LEAD_PERSON: &str = "Lead_Person";
    pub const STATUS: &str = "Status";
    pub const SSAA_INSIGHT: &str = "SSAA_Insight";
    pub const TARGET_REVENUE: &str = "Target_Revenue";
    pub const ACTUAL_REVENUE: &str = "Actual_Revenue";
    pub const TARGET_PROFIT: &str = "Target_Profit";
    pub const ACTUAL_PROFIT: &str = "Actual_Profit";
    pub const KPI_NAME: &str = "KPI_Name";
    pub const KPI_TARGET: &str = "KPI_Target";
    pub const KPI_ACTUAL: &str = "KPI_Actual";
    pub const DECISION_DATE: &str = "Decision_Date";
    pub const VERDICT: &str = "Verdict";
    pub const SETTINGS_KEY: &str = "Key";
    pub const SETTINGS_VALUE: &str = "Value";
    pub const CAPTURE_DATE: &str = "CaptureDate";
}

/// Editable semantic field name -> store column. `id` is deliberately absent:
/// the row key is immutable through the update contract.
pub static EVALUATION_FIELD_COLUMNS: Lazy<BTreeMap<&'static str, &'static str>> =
    Lazy::new(|| {
        BTreeMap::from([
            ("name", columns::PROJECT_NAME),
            ("visionScore", columns::SS_VISION),
            ("resonanceScore", columns::SS_RESONANCE),
            ("contextScore", columns::SS_CONTEXT),
            ("marketScore", columns::VV_MARKET),
            ("speedScore", columns::VV_SPEED),
            ("frictionScore", columns::VV_FRICTION),
            ("workHours", columns::WORK_HOURS),
            ("leadPerson", columns::LEAD_PERSON),
            ("status", columns::STATUS),
            ("insightNote", columns::SSAA_INSIGHT),
            ("targetRevenue", columns::TARGET_REVENUE),
            ("actualRevenue", columns::ACTUAL_REVENUE),
            ("targetProfit", columns::TARGET_PROFIT),
            ("actualProfit", columns::ACTUAL_PROFIT),
            ("kpiName", columns::KPI_NAME),
            ("kpiTarget", columns::KPI_TARGET),
            ("kpiActual", columns::KPI_ACTUAL),
            ("decisionDate", columns::DECISION_DATE),
            ("verdict", columns::VERDICT),
        ])
    });

pub const RATING_FIELDS: [&str; 6] = [
    "visionScore",
    "resonanceScore",
    "contextScore",
    "marketScore",
    "speedScore",
    "frictionScore",
];

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectEvaluation {
    pub id: String,
    pub name: String,
    pub vision_score: u8,
    pub resonance_score: u8,
    pub context_score: u8,
    pub market_score: u8,
    pub speed_score: u8,
    pub friction_score: u8,
    pub work_hours: f64,
    pub lead_person: String,
    pub status: Status,
    pub insight_note: String,
    pub target_revenue: f64,
    pub actual_revenue: f64,
    pub target_profit: f64,
    pub actual_profit: f64,
    pub kpi_name: String,
    pub kpi_target: f64,
    pub kpi_actual: f64,
    pub decision_date: String,
    pub verdict: Verdict,
}

impl ProjectEvaluation {
    /// Builds an evaluation from a raw store row. Missing or malformed
    /// numerics coerce to 0 and unknown enum text falls back to the default
    /// variant; range validation belongs to the write path, not here.
    pub fn from_row(row: &Row) -> Self {
        Self {
            id: cell(row, columns::PROJECT_ID).to_string(),
            name: cell(row, columns::PROJECT_NAME).to_string(),
            vision_score: rating(row, columns::SS_VISION),
            resonance_score: rating(row, columns::SS_RESONANCE),
            context_score: rating(row, columns::SS_CONTEXT),
            market_score: rating(row, columns::VV_MARKET),
            speed_score: rating(row, columns::VV_SPEED),
            friction_score: rating(row, columns::VV_FRICTION),
            work_hours: work_hours(row),
            lead_person: cell(row, columns::LEAD_PERSON).to_string(),
            status: Status::parse(cell(row, columns::STATUS)).unwrap_or(Status::Green),
            insight_note: cell(row, columns::SSAA_INSIGHT).to_string(),
            target_revenue: number(row, columns::TARGET_REVENUE),
            actual_revenue: number(row, columns::ACTUAL_REVENUE),
            target_profit: number(row, columns::TARGET_PROFIT),
            actual_profit: number(row, columns::ACTUAL_PROFIT),
            kpi_name: cell(row, columns::KPI_NAME).to_string(),
            kpi_target: number(row, columns::KPI_TARGET),
            kpi_actual: number(row, columns::KPI_ACTUAL),
            decision_date: cell(row, columns::DECISION_DATE).to_string(),
            verdict: Verdict::parse(cell(row, columns::VERDICT)).unwrap_or(Verdict::Pending),
        }
    }
}

fn cell<'a>(row: &'a Row, column: &str) -> &'a str {
    row.get(column).map(String::as_str).unwrap_or("")
}

fn number(row: &Row, column: &str) -> f64 {
    cell(row, column).trim().parse::<f64>().unwrap_or(0.0)
}

fn rating(row: &Row, column: &str) -> u8 {
    number(row, column) as u8
}

fn work_hours(row: &Row) -> f64 {
    if row.contains_key(columns::WORK_HOURS) {
        number(row, columns::WORK_HOURS)
    } else {
        number(row, columns::ASSET_VOLUME)
    }
}
