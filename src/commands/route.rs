use anyhow::Result;

use mailbrief::config::Config;
use mailbrief::registry::extract_email_address;

pub fn route(config: &Config, from: &str) -> Result<()> {
    let registry = config.registry()?;

    let Some(address) = extract_email_address(from) else {
        println!("No email address found in: {from}");
        return Ok(());
    };

    match registry.find_parser(from) {
        Some(found) => {
            println!("Sender:  {address}");
            println!("Source:  {}", found.source);
            println!("Parser:  {}", found.parser.name());
            println!("Match:   {}", found.match_type.as_str());
        }
        None => {
            println!("Sender:  {address}");
            println!("No parser registered for this sender");
        }
    }

    Ok(())
}
