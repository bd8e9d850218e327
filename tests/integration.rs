//! Integration tests for the Folio generation pipeline.
//!
//! These go from a JSON request to laid-out pages and PDF bytes through the
//! public API only. They cover:
//! - pagination of long letters and where continuation pages start
//! - salary slip fallbacks and the totals box
//! - background fetch failures degrading to a solid fill
//! - letterhead and footer decoration on every page
//! - byte-identical output for identical requests

use std::time::Duration;

use folio::asset::{fetch_background, BackgroundAsset};
use folio::layout::Document;
use folio::style::Color;
use folio::surface::DrawOp;
use folio::{layout_document, parse_request, render, FolioError, GenerateRequest};

// ─── Helpers ────────────────────────────────────────────────────

fn request(json: &str) -> GenerateRequest {
    parse_request(json).expect("request should parse")
}

fn white() -> BackgroundAsset {
    BackgroundAsset::Solid(Color::WHITE)
}

fn layout(req: &GenerateRequest) -> Document {
    layout_document(req, white()).expect("layout should succeed").0
}

/// All text on a page, in paint order.
fn page_texts(doc: &Document, page: usize) -> Vec<(String, f64, f64)> {
    doc.pages[page]
        .surface
        .texts()
        .map(|(t, x, y)| (t.to_string(), x, y))
        .collect()
}

fn all_text(doc: &Document) -> String {
    (0..doc.page_count())
        .flat_map(|p| page_texts(doc, p))
        .map(|(t, _, _)| t)
        .collect::<Vec<_>>()
        .join(" ")
}

fn long_body(words: usize) -> String {
    const VOCAB: [&str; 5] = [
        "administration",
        "responsibilities",
        "correspondence",
        "acknowledgement",
        "implementation",
    ];
    (0..words)
        .map(|i| VOCAB[i % VOCAB.len()])
        .collect::<Vec<_>>()
        .join(" ")
}

fn letter_json(body: &str, extra: &str) -> String {
    format!(
        r#"{{
            "report": {{
                "type": "letter",
                "date": "2025-03-01",
                "recipient": ["The Principal", "North Campus"],
                "subject": "Annual Review",
                "salutation": "Dear Sir,",
                "body": {},
                "closing": "Regards,",
                "signatory": ["Ayesha Khan", "Senior Teacher"]
            }},
            "config": {{"baseFontSize": 12, "lineSpacing": "1.5"}}
            {}
        }}"#,
        serde_json::to_string(body).unwrap(),
        extra
    )
}

fn salary_slip_json(extra: &str) -> String {
    format!(
        r#"{{
            "report": {{
                "type": "salarySlip",
                "employee": {{"name": "Ayesha Khan", "title": "Senior Teacher", "schools": ["North Campus"]}},
                "periodStart": "2025-01-01",
                "periodEnd": "2025-01-31",
                "basicSalary": 50000,
                "earnings": [{{"category": "Salary", "amount": 50000}}],
                "deductions": [],
                "totals": {{"grossEarnings": 50000, "totalDeductions": 0, "netPayable": 50000}}
            }}
            {}
        }}"#,
        extra
    )
}

// ─── Pagination ─────────────────────────────────────────────────

#[test]
fn long_letter_continues_at_body_top() {
    let req = request(&letter_json(&long_body(200), ""));
    let doc = layout(&req);

    assert!(doc.page_count() > 1, "expected overflow, got {} page", doc.page_count());
    let body_top = doc.geometry.body_top();
    let (_, _, first_y) = page_texts(&doc, 1)
        .into_iter()
        .next()
        .expect("second page should carry text");
    assert!((first_y - body_top).abs() < 1e-6);
    assert!(first_y < doc.geometry.height - doc.geometry.margin + 1e-6);
}

#[test]
fn no_text_drops_below_the_body() {
    let req = request(&letter_json(&long_body(400), ""));
    let doc = layout(&req);
    let bottom = doc.geometry.body_bottom();
    for page in 0..doc.page_count() {
        for (text, _, y) in page_texts(&doc, page) {
            assert!(y >= bottom - 0.01, "'{}' at {} is below the body", text, y);
        }
    }
}

#[test]
fn every_page_gets_letterhead_and_footer() {
    let extra = r#", "letterhead": {"lines": ["Greenfield School System", "12 Canal Road"]},
                     "footer": "Page {{pageNumber}} of {{totalPages}}""#;
    let req = request(&letter_json(&long_body(300), extra));
    let doc = layout(&req);
    assert!(doc.page_count() > 1);

    for page in 0..doc.page_count() {
        let texts = page_texts(&doc, page);
        assert!(
            texts.iter().any(|(t, _, _)| t == "Greenfield School System"),
            "page {} has no letterhead",
            page + 1
        );
        // The footer of the last page is painted by the writer.
        if page + 1 < doc.page_count() {
            assert!(texts.iter().any(|(t, _, _)| t.contains("{{pageNumber}}")));
        }
    }

    let rendered = render(&req, white()).unwrap();
    let pdf = String::from_utf8_lossy(&rendered.bytes).to_string();
    assert!(pdf.contains(&format!("/Count {}", rendered.page_count)));
    assert_eq!(rendered.filename, "letter-annual-review.pdf");
}

// ─── Salary slip ────────────────────────────────────────────────

#[test]
fn salary_slip_falls_back_for_empty_deductions() {
    let req = request(&salary_slip_json(""));
    let doc = layout(&req);
    assert_eq!(doc.page_count(), 1);

    let texts = page_texts(&doc, 0);
    let deductions = texts
        .iter()
        .find(|(t, _, _)| t == "DEDUCTIONS")
        .expect("deductions heading");
    let none = texts
        .iter()
        .find(|(t, _, _)| t == "None")
        .expect("empty group text");
    assert!(none.2 < deductions.2);
    assert!((none.1 - deductions.1).abs() < 1e-6);

    let net = texts
        .iter()
        .filter(|(t, _, _)| t == "NET PAYABLE: PKR 50,000.00")
        .count();
    assert_eq!(net, 1);
    assert!(texts.iter().any(|(t, _, _)| t == "N/A"));
}

#[test]
fn totals_box_is_filled_and_bordered() {
    let req = request(&salary_slip_json(""));
    let doc = layout(&req);
    let boxed = doc.pages[0].surface.ops().iter().any(|op| {
        matches!(
            op,
            DrawOp::Rect { fill: Some(fill), border: Some(_), .. } if *fill == Color::TOTALS_FILL
        )
    });
    assert!(boxed);
}

#[test]
fn salary_slip_pdf_carries_title() {
    let req = request(&salary_slip_json(r#", "metadata": {"author": "Accounts"}"#));
    let rendered = render(&req, white()).unwrap();
    let pdf = String::from_utf8_lossy(&rendered.bytes).to_string();
    assert!(pdf.contains("/Title (Salary Slip - Ayesha Khan - January 2025)"));
    assert!(pdf.contains("/Author (Accounts)"));
    assert_eq!(rendered.filename, "salary-slip-ayesha-khan-2025-01.pdf");
}

// ─── Background ─────────────────────────────────────────────────

fn text_positions(doc: &Document) -> Vec<Vec<(String, f64, f64)>> {
    (0..doc.page_count()).map(|p| page_texts(doc, p)).collect()
}

#[tokio::test]
async fn background_timeout_keeps_layout_unchanged() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });

    let url = format!("http://{}/letterhead-bg.png", addr);
    let background = fetch_background(Some(&url), Duration::from_millis(150), Color::WHITE).await;
    server.abort();
    assert!(matches!(background, BackgroundAsset::Solid(c) if c == Color::WHITE));

    let req = request(&salary_slip_json(""));
    let (with_fallback, _) = layout_document(&req, background).unwrap();
    let without = layout(&req);

    assert!(matches!(
        with_fallback.pages[0].surface.ops()[0],
        DrawOp::Rect { fill: Some(c), .. } if c == Color::WHITE
    ));
    assert_eq!(text_positions(&with_fallback), text_positions(&without));
}

#[tokio::test]
async fn generate_json_with_unreachable_background() {
    // Nothing listens on port 9 of the loopback; connection is refused.
    let json = salary_slip_json(r#", "background": "http://127.0.0.1:9/bg.png", "config": {"fetchTimeoutMs": 500}"#);
    let rendered = folio::generate_json(&json).await.unwrap();
    assert_eq!(rendered.page_count, 1);
    let pdf = String::from_utf8_lossy(&rendered.bytes).to_string();
    assert!(pdf.contains("/CreationDate (D:"));
    assert!(!pdf.contains("/XObject"));
}

// ─── Lesson plan ────────────────────────────────────────────────

#[test]
fn lesson_plan_table_repeats_header_across_pages() {
    let activities: Vec<String> = (0..60)
        .map(|i| {
            format!(
                r#"{{"name": "Activity {}", "duration": "10 min", "description": "Pairs discuss the reading and report back to the class"}}"#,
                i + 1
            )
        })
        .collect();
    let json = format!(
        r#"{{
            "report": {{
                "type": "lessonPlan",
                "title": "Fractions",
                "subject": "Mathematics",
                "grade": "5",
                "objectives": ["Compare fractions", "Add like fractions"],
                "materials": ["Fraction strips"],
                "activities": [{}]
            }}
        }}"#,
        activities.join(",")
    );
    let doc = layout(&request(&json));
    assert!(doc.page_count() > 1);

    for page in 0..doc.page_count() {
        let texts = page_texts(&doc, page);
        if texts.iter().any(|(t, _, _)| t.starts_with("Activity ")) {
            assert!(
                texts.iter().any(|(t, _, _)| t == "Description"),
                "page {} has rows without a header",
                page + 1
            );
        }
    }

    let all = all_text(&doc);
    assert!(all.contains("Activity 60"));
    assert!(all.contains("Compare fractions"));
    assert!(page_texts(&doc, 0).iter().any(|(t, _, _)| t == "1."));
}

// ─── Requests ───────────────────────────────────────────────────

#[test]
fn identical_requests_give_identical_bytes() {
    let req = request(&letter_json(&long_body(250), r#", "footer": "Page {{pageNumber}}""#));
    let a = render(&req, white()).unwrap();
    let b = render(&req, white()).unwrap();
    assert_eq!(a.bytes, b.bytes);
}

#[test]
fn malformed_requests_are_rejected() {
    let err = parse_request(r#"{"report": {"type": "invoice"}}"#).unwrap_err();
    assert!(matches!(err, FolioError::ParseError { .. }));
    assert!(parse_request("not json").is_err());
}

#[test]
fn explicit_filename_gets_pdf_extension() {
    let req = request(&salary_slip_json(r#", "filename": "january-slip""#));
    let rendered = render(&req, white()).unwrap();
    assert_eq!(rendered.filename, "january-slip.pdf");
}

#[test]
fn content_blocks_render_directly() {
    let json = r#"{
        "report": {"type": "blocks", "blocks": [
            {"type": "heading", "text": "Notice", "align": "center"},
            {"type": "letterBody", "text": "1. First step\n- Second step"},
            {"type": "separator"},
            {"type": "totalsBox", "text": "TOTAL: 5"}
        ]}
    }"#;
    let doc = layout(&request(json));
    let texts = page_texts(&doc, 0);
    let first = texts.iter().find(|(t, _, _)| t == "First step").unwrap();
    let second = texts.iter().find(|(t, _, _)| t == "Second step").unwrap();
    assert!((first.1 - second.1).abs() < 1e-6);
    let numbered = texts.iter().find(|(t, _, _)| t == "1.").unwrap();
    let bullet = texts.iter().find(|(t, _, _)| t == "•").unwrap();
    assert!((numbered.1 - bullet.1).abs() < 1e-6);
}
