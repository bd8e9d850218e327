//! # Request Model
//!
//! The input contract for a generation run. A request is one JSON object:
//! the report data, optional engine config, and page decoration (background,
//! footer, letterhead). Everything is plain serde so callers in any language
//! can produce it.
//!
//! Reports are tagged by `type` and converted into [`ContentBlock`]s before
//! layout; callers that want full control send `"type": "blocks"` directly.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::style::{FontVariant, LineSpacing};

/// One document generation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub report: Report,

    #[serde(default)]
    pub config: EngineConfig,

    /// Background image: http(s) URL, data URI, file path or raw base64.
    #[serde(default)]
    pub background: Option<String>,

    /// Footer template, centred at the bottom of every page. May contain
    /// `{{pageNumber}}` and `{{totalPages}}`.
    #[serde(default)]
    pub footer: Option<String>,

    #[serde(default)]
    pub letterhead: Option<Letterhead>,

    #[serde(default)]
    pub metadata: Metadata,

    /// Custom TrueType fonts replacing the standard ones per variant.
    #[serde(default)]
    pub fonts: Vec<FontEntry>,

    /// Download name; derived from the report when absent.
    #[serde(default)]
    pub filename: Option<String>,
}

/// Document metadata embedded in the PDF.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Metadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub creator: Option<String>,
}

/// Organisation header repeated at the top of every page.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Letterhead {
    /// First line is drawn bold at `font_size`; the rest smaller.
    pub lines: Vec<String>,
    #[serde(default = "default_letterhead_size")]
    pub font_size: f64,
}

fn default_letterhead_size() -> f64 {
    14.0
}

/// A custom font for one variant. `src` is a data URI, file path or base64.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FontEntry {
    pub variant: FontVariant,
    pub family: String,
    pub src: String,
}

/// The report kinds the engine knows how to lay out.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Report {
    SalarySlip(SalarySlip),
    Letter(Letter),
    LessonPlan(LessonPlan),
    Blocks {
        blocks: Vec<ContentBlock>,
        #[serde(default, rename = "lineSpacing")]
        line_spacing: Option<LineSpacing>,
    },
}

/// A salary slip. Every amount arrives precomputed; the engine only
/// formats and places them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalarySlip {
    pub employee: Employee,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    #[serde(default)]
    pub payment_date: Option<NaiveDate>,
    pub basic_salary: f64,
    #[serde(default)]
    pub bank: Option<BankDetails>,
    #[serde(default)]
    pub earnings: Vec<LineItem>,
    #[serde(default)]
    pub deductions: Vec<LineItem>,
    pub totals: SlipTotals,
    #[serde(default)]
    pub remarks: Option<String>,
    #[serde(default)]
    pub line_spacing: Option<LineSpacing>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub name: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub employee_id: Option<String>,
    #[serde(default)]
    pub schools: Vec<String>,
    #[serde(default)]
    pub join_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BankDetails {
    #[serde(default)]
    pub bank_name: Option<String>,
    #[serde(default)]
    pub account_title: Option<String>,
    #[serde(default)]
    pub account_number: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineItem {
    pub category: String,
    pub amount: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlipTotals {
    pub gross_earnings: f64,
    pub total_deductions: f64,
    pub net_payable: f64,
}

/// A free-form letter. `body` uses inline markup and list syntax.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Letter {
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub recipient: Vec<String>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub salutation: Option<String>,
    pub body: String,
    #[serde(default)]
    pub closing: Option<String>,
    #[serde(default)]
    pub signatory: Vec<String>,
    #[serde(default)]
    pub line_spacing: Option<LineSpacing>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonPlan {
    pub title: String,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub grade: Option<String>,
    #[serde(default)]
    pub teacher: Option<String>,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub objectives: Vec<String>,
    #[serde(default)]
    pub materials: Vec<String>,
    #[serde(default)]
    pub activities: Vec<Activity>,
    #[serde(default)]
    pub assessment: Option<String>,
    #[serde(default)]
    pub homework: Option<String>,
    #[serde(default)]
    pub line_spacing: Option<LineSpacing>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Activity {
    pub name: String,
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub description: String,
}

// ── Content blocks ──────────────────────────────────────────────

/// A unit of page content. Blocks lay out top to bottom in order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ContentBlock {
    /// Paragraphs and list items, one per input line.
    LetterBody { text: String },

    /// Two side-by-side label/value columns.
    TwoColumnFields { left: FieldGroup, right: FieldGroup },

    /// A bordered, centred highlight line such as a net total.
    TotalsBox { text: String },

    Table(TableBlock),

    Heading {
        text: String,
        #[serde(default = "default_heading_level")]
        level: u8,
        #[serde(default)]
        align: Align,
    },

    /// A thin horizontal rule across the content width.
    Separator,

    Spacer { height: f64 },
}

fn default_heading_level() -> u8 {
    1
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Align {
    #[default]
    Left,
    Center,
}

/// A titled list of label/value pairs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FieldGroup {
    pub title: String,
    #[serde(default)]
    pub fields: Vec<Field>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Field {
    pub label: String,
    #[serde(default)]
    pub value: Option<String>,
}

impl Field {
    pub fn new(label: impl Into<String>, value: Option<String>) -> Self {
        Self {
            label: label.into(),
            value,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableBlock {
    pub columns: Vec<TableColumn>,
    #[serde(default)]
    pub rows: Vec<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableColumn {
    pub header: String,
    /// Relative width weight. Columns share the content width in
    /// proportion to their weights.
    #[serde(default = "default_weight")]
    pub weight: f64,
}

fn default_weight() -> f64 {
    1.0
}
