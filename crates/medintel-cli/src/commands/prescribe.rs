use std::sync::Arc;

use anyhow::{Context, Result, anyhow, bail};
use medintel_application::PrescriptionSyncService;
use medintel_core::IdentityResolver;
use medintel_core::config::MedintelConfig;
use medintel_core::prescription::{LineItemField, PrescriptionDraft};
use medintel_infrastructure::HttpPrescriptionBackend;

pub async fn run(config: &MedintelConfig, fragment: &str, items: &[String]) -> Result<()> {
    let identity = IdentityResolver::new(&config.identity).resolve(fragment);
    if !identity.has_patient() {
        bail!("No patient id in '{}'", fragment);
    }
    if !identity.has_doctor() {
        bail!("No doctor id in '{}' and none configured", fragment);
    }

    let draft = build_draft(items)?;

    let backend = Arc::new(HttpPrescriptionBackend::from_config(&config.backend));
    let sync = PrescriptionSyncService::new(backend);
    let record = sync
        .save(&identity, draft.to_items())
        .await
        .context("Failed to save prescription")?;

    println!(
        "Prescription saved successfully! ({} item(s) for patient {})",
        record.prescriptions.len(),
        record.patient_id
    );
    Ok(())
}

/// Fills a draft from `name:count:dosage` arguments, one row each.
fn build_draft(items: &[String]) -> Result<PrescriptionDraft> {
    let mut draft = PrescriptionDraft::new();

    for (i, raw) in items.iter().enumerate() {
        let mut parts = raw.splitn(3, ':');
        let (Some(name), Some(count), Some(dosage)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(anyhow!("Invalid item '{}': expected name:count:dosage", raw));
        };

        let row = if i == 0 { 0 } else { draft.add_row() };
        draft.set_field(row, LineItemField::Name, name.trim())?;
        draft.set_field(row, LineItemField::Count, count.trim())?;
        draft.set_field(row, LineItemField::Dosage, dosage.trim())?;
    }

    Ok(draft)
}

#[cfg(test)]
mod tests {
    use super::*;
    use medintel_core::prescription::LineItem;

    #[test]
    fn test_build_draft_rows_in_order() {
        let items = vec![
            "Paracetamol:6:1-1-1".to_string(),
            "Cetirizine:10:0-0-1".to_string(),
        ];

        let draft = build_draft(&items).unwrap();

        assert_eq!(
            draft.to_items(),
            vec![
                LineItem::new("Paracetamol", "6", "1-1-1"),
                LineItem::new("Cetirizine", "10", "0-0-1"),
            ]
        );
    }

    #[test]
    fn test_build_draft_keeps_colons_in_dosage() {
        let draft = build_draft(&["Ibuprofen:4:1 tab: after food".to_string()]).unwrap();
        assert_eq!(draft.items()[0].dosage, "1 tab: after food");
    }

    #[test]
    fn test_build_draft_rejects_malformed_item() {
        let err = build_draft(&["Paracetamol:6".to_string()]).unwrap_err();
        assert!(err.to_string().contains("name:count:dosage"));
    }
}
