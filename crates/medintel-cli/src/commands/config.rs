use anyhow::Result;
use medintel_core::config::MedintelConfig;
use medintel_infrastructure::ConfigService;

pub fn show(service: &ConfigService, config: &MedintelConfig) -> Result<()> {
    match service.config_path() {
        Ok(path) if path.exists() => println!("# {}", path.display()),
        Ok(path) => println!("# {} (not found, using defaults)", path.display()),
        Err(e) => tracing::warn!("[Config] Could not determine config path: {}", e),
    }
    print!("{}", toml::to_string_pretty(config)?);
    Ok(())
}
