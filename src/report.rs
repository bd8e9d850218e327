//! # Report Conversion
//!
//! Turns each report kind into the content blocks the composer lays out.
//! Values are formatted here and nowhere else; no amounts are computed.

use crate::config::EngineConfig;
use crate::format::{format_currency, format_date, format_month, format_ordinal_date};
use crate::model::{
    Align, ContentBlock, Field, FieldGroup, LessonPlan, Letter, LineItem, Report, SalarySlip,
    TableBlock, TableColumn,
};
use crate::style::LineSpacing;

/// Room left for a handwritten signature above the signatory block.
const SIGNATURE_SPACE: f64 = 30.0;
const SECTION_GAP: f64 = 8.0;

impl Report {
    /// The content blocks this report lays out as.
    pub fn to_blocks(&self, config: &EngineConfig) -> Vec<ContentBlock> {
        match self {
            Report::SalarySlip(slip) => salary_slip_blocks(slip, config),
            Report::Letter(letter) => letter_blocks(letter),
            Report::LessonPlan(plan) => lesson_plan_blocks(plan, config),
            Report::Blocks { blocks, .. } => blocks.clone(),
        }
    }

    /// Line spacing chosen on the report form, if any.
    pub fn line_spacing(&self) -> Option<LineSpacing> {
        match self {
            Report::SalarySlip(slip) => slip.line_spacing,
            Report::Letter(letter) => letter.line_spacing,
            Report::LessonPlan(plan) => plan.line_spacing,
            Report::Blocks { line_spacing, .. } => *line_spacing,
        }
    }

    /// A document title for the PDF metadata.
    pub fn title(&self) -> Option<String> {
        match self {
            Report::SalarySlip(slip) => Some(format!(
                "Salary Slip - {} - {}",
                slip.employee.name,
                format_month(slip.period_start)
            )),
            Report::Letter(letter) => letter.subject.clone(),
            Report::LessonPlan(plan) => Some(plan.title.clone()),
            Report::Blocks { .. } => None,
        }
    }

    /// Download name derived from the report contents.
    pub fn suggested_filename(&self) -> String {
        let stem = match self {
            Report::SalarySlip(slip) => format!(
                "salary-slip-{}-{}",
                slugify(&slip.employee.name),
                slip.period_start.format("%Y-%m")
            ),
            Report::Letter(letter) => match (&letter.subject, letter.date) {
                (Some(subject), _) if !slugify(subject).is_empty() => {
                    format!("letter-{}", slugify(subject))
                }
                (_, Some(date)) => format!("letter-{}", date.format("%Y-%m-%d")),
                _ => "letter".to_string(),
            },
            Report::LessonPlan(plan) => format!("lesson-plan-{}", slugify(&plan.title)),
            Report::Blocks { .. } => "document".to_string(),
        };
        format!("{}.pdf", stem.trim_end_matches('-'))
    }
}

/// Lowercase ASCII alphanumerics joined by single hyphens.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    for ch in text.chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    slug.trim_end_matches('-').to_string()
}

fn heading(text: impl Into<String>, level: u8, align: Align) -> ContentBlock {
    ContentBlock::Heading {
        text: text.into(),
        level,
        align,
    }
}

fn body(text: impl Into<String>) -> ContentBlock {
    ContentBlock::LetterBody { text: text.into() }
}

fn spacer(height: f64) -> ContentBlock {
    ContentBlock::Spacer { height }
}

fn field(label: &str, value: Option<String>) -> Field {
    Field::new(label, value.filter(|v| !v.trim().is_empty()))
}

fn amounts(title: &str, items: &[LineItem], currency: &str) -> FieldGroup {
    FieldGroup {
        title: title.to_string(),
        fields: items
            .iter()
            .map(|item| field(&item.category, Some(format_currency(item.amount, currency))))
            .collect(),
    }
}

fn salary_slip_blocks(slip: &SalarySlip, config: &EngineConfig) -> Vec<ContentBlock> {
    let currency = config.currency.as_str();
    let employee = &slip.employee;
    let bank = slip.bank.as_ref();

    let employee_details = FieldGroup {
        title: "EMPLOYEE DETAILS".into(),
        fields: vec![
            field("Name", Some(employee.name.clone())),
            field("Designation", employee.title.clone()),
            field("Employee ID", employee.employee_id.clone()),
            field("School", Some(employee.schools.join(", "))),
            field("Joining Date", employee.join_date.map(format_date)),
        ],
    };
    let payment_details = FieldGroup {
        title: "PAYMENT DETAILS".into(),
        fields: vec![
            field(
                "Pay Period",
                Some(format!(
                    "{} to {}",
                    format_date(slip.period_start),
                    format_date(slip.period_end)
                )),
            ),
            field("Payment Date", slip.payment_date.map(format_date)),
            field("Basic Salary", Some(format_currency(slip.basic_salary, currency))),
            field("Bank", bank.and_then(|b| b.bank_name.clone())),
            field("Account Title", bank.and_then(|b| b.account_title.clone())),
            field("Account Number", bank.and_then(|b| b.account_number.clone())),
        ],
    };

    let mut blocks = vec![
        heading("SALARY SLIP", 1, Align::Center),
        heading(
            format!("For the month of {}", format_month(slip.period_start)),
            3,
            Align::Center,
        ),
        ContentBlock::TwoColumnFields {
            left: employee_details,
            right: payment_details,
        },
        spacer(SECTION_GAP),
        ContentBlock::Separator,
        ContentBlock::TwoColumnFields {
            left: amounts("EARNINGS", &slip.earnings, currency),
            right: amounts("DEDUCTIONS", &slip.deductions, currency),
        },
        spacer(SECTION_GAP),
        body(format!(
            "*Gross Earnings:* {}\n*Total Deductions:* {}",
            format_currency(slip.totals.gross_earnings, currency),
            format_currency(slip.totals.total_deductions, currency)
        )),
        spacer(SECTION_GAP),
        ContentBlock::TotalsBox {
            text: format!(
                "NET PAYABLE: {}",
                format_currency(slip.totals.net_payable, currency)
            ),
        },
    ];

    if let Some(remarks) = slip.remarks.as_deref().filter(|r| !r.trim().is_empty()) {
        blocks.push(spacer(SECTION_GAP));
        blocks.push(heading("Remarks", 3, Align::Left));
        blocks.push(body(remarks));
    }
    blocks.push(spacer(SECTION_GAP * 2.0));
    blocks.push(body(
        "_This is a computer-generated salary slip and does not require a signature._",
    ));
    blocks
}

fn letter_blocks(letter: &Letter) -> Vec<ContentBlock> {
    let mut blocks = Vec::new();
    let mut header = Vec::new();
    if let Some(reference) = &letter.reference {
        header.push(format!("*Ref:* {}", reference));
    }
    if let Some(date) = letter.date {
        header.push(format!("*Date:* {}", format_ordinal_date(date)));
    }
    if !header.is_empty() {
        blocks.push(body(header.join("\n")));
        blocks.push(spacer(SECTION_GAP));
    }
    if !letter.recipient.is_empty() {
        blocks.push(body(letter.recipient.join("\n")));
        blocks.push(spacer(SECTION_GAP));
    }
    if let Some(subject) = &letter.subject {
        blocks.push(heading(format!("Subject: {}", subject), 3, Align::Left));
    }
    if let Some(salutation) = &letter.salutation {
        blocks.push(body(salutation.as_str()));
        blocks.push(spacer(SECTION_GAP / 2.0));
    }
    blocks.push(body(letter.body.as_str()));
    if let Some(closing) = &letter.closing {
        blocks.push(spacer(SECTION_GAP));
        blocks.push(body(closing.as_str()));
    }
    if !letter.signatory.is_empty() {
        blocks.push(spacer(SIGNATURE_SPACE));
        let mut lines = letter.signatory.iter();
        let mut signature = Vec::new();
        if let Some(name) = lines.next() {
            signature.push(format!("*{}*", name));
        }
        signature.extend(lines.cloned());
        blocks.push(body(signature.join("\n")));
    }
    blocks
}

fn lesson_plan_blocks(plan: &LessonPlan, config: &EngineConfig) -> Vec<ContentBlock> {
    let empty = config.empty_group_text.as_str();
    let mut blocks = vec![
        heading(plan.title.as_str(), 1, Align::Center),
        ContentBlock::TwoColumnFields {
            left: FieldGroup {
                title: "LESSON DETAILS".into(),
                fields: vec![
                    field("Subject", plan.subject.clone()),
                    field("Grade", plan.grade.clone()),
                    field("Teacher", plan.teacher.clone()),
                ],
            },
            right: FieldGroup {
                title: "SCHEDULE".into(),
                fields: vec![
                    field("Date", plan.date.map(format_date)),
                    field("Duration", plan.duration.clone()),
                ],
            },
        },
        spacer(SECTION_GAP),
        heading("Learning Objectives", 2, Align::Left),
    ];

    if plan.objectives.is_empty() {
        blocks.push(body(empty));
    } else {
        let numbered: Vec<String> = plan
            .objectives
            .iter()
            .enumerate()
            .map(|(i, o)| format!("{}. {}", i + 1, o))
            .collect();
        blocks.push(body(numbered.join("\n")));
    }

    blocks.push(heading("Materials", 2, Align::Left));
    if plan.materials.is_empty() {
        blocks.push(body(empty));
    } else {
        let bullets: Vec<String> = plan.materials.iter().map(|m| format!("- {}", m)).collect();
        blocks.push(body(bullets.join("\n")));
    }

    blocks.push(heading("Activities", 2, Align::Left));
    if plan.activities.is_empty() {
        blocks.push(body(empty));
    } else {
        let placeholder = &config.value_placeholder;
        blocks.push(ContentBlock::Table(TableBlock {
            columns: vec![
                TableColumn {
                    header: "Activity".into(),
                    weight: 2.0,
                },
                TableColumn {
                    header: "Duration".into(),
                    weight: 1.0,
                },
                TableColumn {
                    header: "Description".into(),
                    weight: 4.0,
                },
            ],
            rows: plan
                .activities
                .iter()
                .map(|a| {
                    vec![
                        a.name.clone(),
                        a.duration.clone().unwrap_or_else(|| placeholder.clone()),
                        a.description.clone(),
                    ]
                })
                .collect(),
        }));
    }

    for (title, text) in [("Assessment", &plan.assessment), ("Homework", &plan.homework)] {
        if let Some(text) = text.as_deref().filter(|t| !t.trim().is_empty()) {
            blocks.push(spacer(SECTION_GAP));
            blocks.push(heading(title, 2, Align::Left));
            blocks.push(body(text));
        }
    }
    blocks
}
