//! Medicine authenticity verification.

use chrono::{NaiveDate, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{CareError, Result};

/// What the user read off the packaging.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedicineQuery {
    pub name: String,
    pub manufacturer: String,
    #[serde(default)]
    pub batch_number: Option<String>,
    /// ISO date (`YYYY-MM-DD`)
    #[serde(default)]
    pub expiry_date: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    Safe,
    Warning,
    Expired,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationReport {
    pub medicine_name: String,
    pub manufacturer: String,
    pub batch_number: Option<String>,
    pub expiry_date: Option<NaiveDate>,
    pub status: VerificationStatus,
    pub message: String,
    /// Only filled for verified medicines
    pub description: Option<String>,
}

/// Looks a medicine up in some source of truth.
#[async_trait::async_trait]
pub trait MedicineVerifier: Send + Sync {
    async fn verify(&self, query: &MedicineQuery) -> Result<VerificationReport>;
}

/// A medicine known to be genuine.
#[derive(Debug, Clone)]
pub struct TrustedMedicine {
    pub name: String,
    pub manufacturer: String,
    batch_pattern: Regex,
    pub description: String,
}

impl TrustedMedicine {
    pub fn new(
        name: impl Into<String>,
        manufacturer: impl Into<String>,
        batch_pattern: &str,
        description: impl Into<String>,
    ) -> Result<Self> {
        let batch_pattern = Regex::new(batch_pattern)
            .map_err(|e| CareError::config(format!("Invalid batch pattern '{batch_pattern}': {e}")))?;
        Ok(Self {
            name: name.into(),
            manufacturer: manufacturer.into(),
            batch_pattern,
            description: description.into(),
        })
    }

    fn matches(&self, name_lower: &str, manufacturer_lower: &str) -> bool {
        self.name.to_lowercase().contains(name_lower)
            && self.manufacturer.to_lowercase().contains(manufacturer_lower)
    }
}

/// In-memory table of trusted medicines.
#[derive(Debug, Clone)]
pub struct TrustedMedicineTable {
    entries: Vec<TrustedMedicine>,
}

impl TrustedMedicineTable {
    pub fn new(entries: Vec<TrustedMedicine>) -> Self {
        Self { entries }
    }

    /// The table shipped with the application.
    pub fn builtin() -> Result<Self> {
        Ok(Self::new(vec![
            TrustedMedicine::new(
                "Paracetamol 500mg",
                "Cipla Ltd",
                "^(PCM|PAR)",
                "Pain reliever and fever reducer",
            )?,
            TrustedMedicine::new(
                "Dolo 650",
                "Micro Labs",
                "^(DOL|DL)",
                "Fever and pain relief medication",
            )?,
            TrustedMedicine::new("Crocin 650", "GSK", "^(CRO|CR)", "Fever and pain relief")?,
            TrustedMedicine::new(
                "Azithromycin 500mg",
                "Cipla Ltd",
                "^(AZI|AZ)",
                "Antibiotic for bacterial infections",
            )?,
        ]))
    }

    pub fn entries(&self) -> &[TrustedMedicine] {
        &self.entries
    }

    /// Verifies `query` as of `today`.
    pub fn verify_on(&self, query: &MedicineQuery, today: NaiveDate) -> Result<VerificationReport> {
        let name = query.name.trim();
        let manufacturer = query.manufacturer.trim();
        if name.is_empty() || manufacturer.is_empty() {
            return Err(CareError::validation(
                "Please fill in medicine name and manufacturer",
            ));
        }

        let batch_number = query
            .batch_number
            .as_deref()
            .map(str::trim)
            .filter(|b| !b.is_empty())
            .map(str::to_string);
        let expiry_date = query
            .expiry_date
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(|d| {
                NaiveDate::parse_from_str(d, "%Y-%m-%d").map_err(|e| {
                    CareError::validation(format!("Invalid expiry date '{d}': {e}"))
                })
            })
            .transpose()?;

        let name_lower = name.to_lowercase();
        let manufacturer_lower = manufacturer.to_lowercase();
        let trusted = self
            .entries
            .iter()
            .find(|m| m.matches(&name_lower, &manufacturer_lower));

        let (status, message, description) = match trusted {
            None => (
                VerificationStatus::Warning,
                "Medicine not found in our database. Please consult a pharmacist.",
                None,
            ),
            Some(_) if expiry_date.is_some_and(|d| d < today) => (
                VerificationStatus::Expired,
                "This medicine has expired. Do not use it.",
                None,
            ),
            Some(medicine)
                if batch_number
                    .as_deref()
                    .is_some_and(|b| !medicine.batch_pattern.is_match(b)) =>
            {
                (
                    VerificationStatus::Warning,
                    "Batch number format does not match standard pattern. Verify with pharmacist.",
                    None,
                )
            }
            Some(medicine) => (
                VerificationStatus::Safe,
                "This medicine is verified as authentic and safe to use.",
                Some(medicine.description.clone()),
            ),
        };

        Ok(VerificationReport {
            medicine_name: name.to_string(),
            manufacturer: manufacturer.to_string(),
            batch_number,
            expiry_date,
            status,
            message: message.to_string(),
            description,
        })
    }
}

#[async_trait::async_trait]
impl MedicineVerifier for TrustedMedicineTable {
    async fn verify(&self, query: &MedicineQuery) -> Result<VerificationReport> {
        let report = self.verify_on(query, Utc::now().date_naive())?;
        tracing::debug!(
            medicine = %report.medicine_name,
            status = ?report.status,
            "Medicine verified against trusted table"
        );
        Ok(report)
    }
}
