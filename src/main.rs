//! # Folio CLI
//!
//! Usage:
//!   folio request.json -o slip.pdf
//!   echo '{ ... }' | folio
//!   folio --example > request.json
//!
//! Without `-o` the file is named after the report. Set `RUST_LOG=debug`
//! to see page allocation and font loading.

use std::env;
use std::fs;
use std::io::{self, Read};

#[tokio::main]
async fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();

    if args.iter().any(|a| a == "--example") {
        print!("{}", example_salary_slip_json());
        return;
    }

    if let Err(e) = run(&args).await {
        eprintln!("✗ {}", e);
        std::process::exit(1);
    }
}

async fn run(args: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    let input = if args.len() > 1 && !args[1].starts_with('-') {
        fs::read_to_string(&args[1]).map_err(|e| format!("cannot read {}: {}", args[1], e))?
    } else {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        buf
    };

    let output_path = args
        .windows(2)
        .find(|w| w[0] == "-o")
        .map(|w| w[1].clone());

    let rendered = folio::generate_json(&input).await?;
    let path = output_path.unwrap_or_else(|| rendered.filename.clone());
    fs::write(&path, &rendered.bytes).map_err(|e| format!("cannot write {}: {}", path, e))?;
    eprintln!(
        "✓ Written {} bytes ({} pages) to {}",
        rendered.bytes.len(),
        rendered.page_count,
        path
    );
    Ok(())
}

fn example_salary_slip_json() -> &'static str {
    r##"{
  "report": {
    "type": "salarySlip",
    "employee": {
      "name": "Ayesha Khan",
      "title": "Senior Teacher",
      "employeeId": "EMP-0142",
      "schools": ["North Campus"],
      "joinDate": "2021-08-16"
    },
    "periodStart": "2025-01-01",
    "periodEnd": "2025-01-31",
    "paymentDate": "2025-02-01",
    "basicSalary": 50000,
    "bank": {
      "bankName": "Meezan Bank",
      "accountTitle": "Ayesha Khan",
      "accountNumber": "0123-4567890"
    },
    "earnings": [
      { "category": "Salary", "amount": 50000 },
      { "category": "Conveyance", "amount": 3500 }
    ],
    "deductions": [
      { "category": "Provident Fund", "amount": 2500 }
    ],
    "totals": { "grossEarnings": 53500, "totalDeductions": 2500, "netPayable": 51000 },
    "remarks": "Conveyance allowance added from *January*."
  },
  "footer": "Page {{pageNumber}} of {{totalPages}}",
  "letterhead": {
    "lines": ["Greenfield School System", "12 Canal Road, Lahore"]
  },
  "metadata": { "author": "Accounts Office" }
}
"##
}
