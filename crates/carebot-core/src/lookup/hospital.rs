//! Emergency incident reports and hospital matching.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CareError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IncidentType {
    Accident,
    HeartAttack,
    Stroke,
    Breathing,
    Injury,
    Poisoning,
    Other,
}

impl IncidentType {
    pub const ALL: [IncidentType; 7] = [
        IncidentType::Accident,
        IncidentType::HeartAttack,
        IncidentType::Stroke,
        IncidentType::Breathing,
        IncidentType::Injury,
        IncidentType::Poisoning,
        IncidentType::Other,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            IncidentType::Accident => "accident",
            IncidentType::HeartAttack => "heart-attack",
            IncidentType::Stroke => "stroke",
            IncidentType::Breathing => "breathing",
            IncidentType::Injury => "injury",
            IncidentType::Poisoning => "poisoning",
            IncidentType::Other => "other",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            IncidentType::Accident => "Accident",
            IncidentType::HeartAttack => "Heart Attack",
            IncidentType::Stroke => "Stroke",
            IncidentType::Breathing => "Breathing Issue",
            IncidentType::Injury => "Severe Injury",
            IncidentType::Poisoning => "Poisoning",
            IncidentType::Other => "Other Emergency",
        }
    }
}

impl FromStr for IncidentType {
    type Err = CareError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_lowercase();
        IncidentType::ALL
            .into_iter()
            .find(|t| t.id() == wanted)
            .ok_or_else(|| CareError::validation(format!("Unknown incident type: '{s}'")))
    }
}

impl fmt::Display for IncidentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    #[default]
    High,
    Critical,
}

impl FromStr for Priority {
    type Err = CareError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            "critical" => Ok(Priority::Critical),
            other => Err(CareError::validation(format!("Unknown priority: '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoLocation {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub address: Option<String>,
}

/// An emergency reported by a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncidentReport {
    pub incident_type: Option<IncidentType>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub location: Option<GeoLocation>,
}

impl IncidentReport {
    pub fn new(incident_type: IncidentType) -> Self {
        Self {
            incident_type: Some(incident_type),
            description: None,
            priority: Priority::default(),
            location: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_location(mut self, location: GeoLocation) -> Self {
        self.location = Some(location);
        self
    }

    /// Checks the report is complete enough to dispatch.
    pub fn validate(&self) -> Result<IncidentType> {
        let incident_type = self
            .incident_type
            .ok_or_else(|| CareError::validation("Please select an incident type"))?;

        if let Some(location) = &self.location {
            if !(-90.0..=90.0).contains(&location.latitude)
                || !(-180.0..=180.0).contains(&location.longitude)
            {
                return Err(CareError::validation(format!(
                    "Location out of range: {}, {}",
                    location.latitude, location.longitude
                )));
            }
        }

        Ok(incident_type)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Availability {
    Available,
    Full,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hospital {
    pub name: String,
    pub distance_km: f64,
    pub availability: Availability,
    pub specialization: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestedArea {
    pub name: String,
    pub distance_km: f64,
}

/// Outcome of a hospital search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "results", rename_all = "snake_case")]
pub enum HospitalMatch {
    /// Hospitals that can take the patient, nearest first.
    Hospitals(Vec<Hospital>),
    /// No hospital available; wider areas to search, nearest first.
    SuggestedAreas(Vec<SuggestedArea>),
}

/// Finds hospitals able to take an incident.
#[async_trait::async_trait]
pub trait HospitalMatcher: Send + Sync {
    async fn find_nearby(&self, report: &IncidentReport) -> Result<HospitalMatch>;
}

/// Fixed directory of hospitals and fallback areas.
#[derive(Debug, Clone, Default)]
pub struct StaticHospitalDirectory {
    hospitals: Vec<Hospital>,
    suggested_areas: Vec<SuggestedArea>,
}

impl StaticHospitalDirectory {
    pub fn new(hospitals: Vec<Hospital>, suggested_areas: Vec<SuggestedArea>) -> Self {
        Self {
            hospitals,
            suggested_areas,
        }
    }

    /// The directory shipped with the application.
    pub fn builtin() -> Self {
        Self::new(
            vec![
                Hospital {
                    name: "Apollo Emergency Center".into(),
                    distance_km: 2.3,
                    availability: Availability::Available,
                    specialization: "Multi-specialty".into(),
                },
                Hospital {
                    name: "Max Hospital Emergency".into(),
                    distance_km: 3.1,
                    availability: Availability::Available,
                    specialization: "Trauma Care".into(),
                },
            ],
            vec![
                SuggestedArea {
                    name: "Delhi NCR".into(),
                    distance_km: 15.0,
                },
                SuggestedArea {
                    name: "Noida".into(),
                    distance_km: 20.0,
                },
                SuggestedArea {
                    name: "Gurgaon".into(),
                    distance_km: 25.0,
                },
            ],
        )
    }
}

#[async_trait::async_trait]
impl HospitalMatcher for StaticHospitalDirectory {
    async fn find_nearby(&self, report: &IncidentReport) -> Result<HospitalMatch> {
        let incident_type = report.validate()?;

        let mut available: Vec<Hospital> = self
            .hospitals
            .iter()
            .filter(|h| h.availability == Availability::Available)
            .cloned()
            .collect();
        available.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));

        tracing::info!(
            incident = incident_type.id(),
            priority = ?report.priority,
            matches = available.len(),
            "Hospital search completed"
        );

        if !available.is_empty() {
            return Ok(HospitalMatch::Hospitals(available));
        }

        let mut areas = self.suggested_areas.clone();
        areas.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));
        Ok(HospitalMatch::SuggestedAreas(areas))
    }
}
