use anyhow::Result;

use mailbrief::config::Config;

pub fn sources(config: &Config, json: bool) -> Result<()> {
    let registry = config.registry()?;
    let registrations = registry.registrations();

    if json {
        println!("{}", serde_json::to_string_pretty(&registrations)?);
        return Ok(());
    }

    println!("Registered newsletter sources ({})", registrations.len());
    println!("================================");
    for info in registrations {
        println!("{} ({})", info.source, info.parser);
        if !info.email_patterns.is_empty() {
            println!("  emails:  {}", info.email_patterns.join(", "));
        }
        if !info.domain_patterns.is_empty() {
            println!("  domains: {}", info.domain_patterns.join(", "));
        }
    }

    Ok(())
}
