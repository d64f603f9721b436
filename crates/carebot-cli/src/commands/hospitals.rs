use anyhow::{Result, anyhow};
use carebot_core::lookup::{
    Availability, HospitalMatch, HospitalMatcher, IncidentReport, IncidentType, Priority,
    StaticHospitalDirectory,
};
use colored::Colorize;

/// Parses an incident type id, listing the valid ids on failure.
pub fn parse_incident(id: &str) -> Result<IncidentType> {
    id.parse::<IncidentType>().map_err(|err| {
        let known: Vec<&str> = IncidentType::ALL.iter().map(|t| t.id()).collect();
        anyhow!("{err} (expected one of: {})", known.join(", "))
    })
}

/// Reports an incident and prints where to go.
pub async fn run(incident: &str, priority: &str, description: Option<String>) -> Result<()> {
    let mut report = IncidentReport::new(parse_incident(incident)?)
        .with_priority(priority.parse::<Priority>()?);
    if let Some(description) = description {
        report = report.with_description(description);
    }

    let directory = StaticHospitalDirectory::builtin();
    match directory.find_nearby(&report).await? {
        HospitalMatch::Hospitals(hospitals) => {
            println!("{}", "Nearby hospitals:".bright_green().bold());
            for hospital in hospitals {
                let availability = match hospital.availability {
                    Availability::Available => "available".green(),
                    Availability::Full => "full".red(),
                };
                println!(
                    "  {:<28} {:>5.1} km  {}  {}",
                    hospital.name,
                    hospital.distance_km,
                    availability,
                    hospital.specialization.bright_black()
                );
            }
        }
        HospitalMatch::SuggestedAreas(areas) => {
            println!(
                "{}",
                "No hospital nearby can take the patient. Try these areas:".bright_yellow()
            );
            for area in areas {
                println!("  {:<28} {:>5.1} km", area.name, area.distance_km);
            }
        }
    }
    Ok(())
}
