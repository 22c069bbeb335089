use anyhow::Result;
use medintel_core::IdentityResolver;
use medintel_core::config::MedintelConfig;

pub fn run(config: &MedintelConfig, fragment: &str) -> Result<()> {
    let identity = IdentityResolver::new(&config.identity).resolve(fragment);

    println!("room:    {}", identity.room);
    println!("patient: {}", display_or_none(&identity.patient_id));
    println!("doctor:  {}", display_or_none(&identity.doctor_id));
    Ok(())
}

fn display_or_none(value: &str) -> &str {
    if value.is_empty() { "(none)" } else { value }
}
