use anyhow::{Context, Result, bail};
use medintel_core::IdentityResolver;
use medintel_core::config::MedintelConfig;
use medintel_core::prescription::{PrescriptionBackend, PrescriptionRecord};
use medintel_infrastructure::HttpPrescriptionBackend;

/// Fetches and prints history. Unlike the page, a failed fetch is an error here.
pub async fn run(config: &MedintelConfig, fragment: &str, json: bool) -> Result<()> {
    let records = fetch(config, fragment).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
    } else {
        print_records(&records);
    }
    Ok(())
}

async fn fetch(config: &MedintelConfig, fragment: &str) -> Result<Vec<PrescriptionRecord>> {
    let identity = IdentityResolver::new(&config.identity).resolve(fragment);
    if !identity.has_patient() {
        bail!("No patient id in '{}'", fragment);
    }

    let backend = HttpPrescriptionBackend::from_config(&config.backend);
    backend
        .fetch_history(&identity.patient_id)
        .await
        .with_context(|| {
            format!(
                "Failed to fetch prescriptions for patient {} from {}",
                identity.patient_id,
                backend.base_url()
            )
        })
}

fn print_records(records: &[PrescriptionRecord]) {
    if records.is_empty() {
        println!("No past prescriptions found.");
        return;
    }

    for (i, record) in records.iter().enumerate() {
        let created = record
            .created_at
            .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "date unknown".to_string());
        println!(
            "Prescription #{} ({}, doctor {}, {})",
            i + 1,
            created,
            record.doctor_id,
            record.status.as_str()
        );
        for item in &record.prescriptions {
            println!("  - {}  x{}  {}", item.name, item.count, item.dosage);
        }
    }
}
