//! Lookup services used by the report and verification forms.
//!
//! Both are traits returning `Result`; the bundled implementations are
//! in-memory tables and can be swapped for a real backend.

mod hospital;
mod medicine;

pub use hospital::{
    Availability, GeoLocation, Hospital, HospitalMatch, HospitalMatcher, IncidentReport,
    IncidentType, Priority, StaticHospitalDirectory, SuggestedArea,
};
pub use medicine::{
    MedicineQuery, MedicineVerifier, TrustedMedicine, TrustedMedicineTable, VerificationReport,
    VerificationStatus,
};
