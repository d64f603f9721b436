use anyhow::Result;
use carebot_core::lookup::{
    MedicineQuery, MedicineVerifier, TrustedMedicineTable, VerificationReport, VerificationStatus,
};
use colored::Colorize;

/// Checks a medicine against the trusted table and prints the verdict.
pub async fn run(query: MedicineQuery) -> Result<()> {
    let table = TrustedMedicineTable::builtin()?;
    let report = table.verify(&query).await?;
    print_report(&report);
    Ok(())
}

fn print_report(report: &VerificationReport) {
    let status = match report.status {
        VerificationStatus::Safe => "SAFE".bright_green().bold(),
        VerificationStatus::Warning => "WARNING".bright_yellow().bold(),
        VerificationStatus::Expired => "EXPIRED".bright_red().bold(),
    };
    println!("{status}  {}", report.message);
    println!("  Medicine:     {}", report.medicine_name);
    println!("  Manufacturer: {}", report.manufacturer);
    if let Some(batch) = &report.batch_number {
        println!("  Batch:        {batch}");
    }
    if let Some(expiry) = report.expiry_date {
        println!("  Expires:      {expiry}");
    }
    if let Some(description) = &report.description {
        println!("  {}", description.bright_black());
    }
}
