use super::config::CustodyConfig;
use std::path::Path;

/// Print the configured committee with derived identities
pub fn execute(config_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let config = CustodyConfig::load(config_path)?;
    let committee = config.committee()?;

    println!(
        "Committee: {} members, quorum {}",
        committee.len(),
        committee.quorum()
    );
    println!();
    for (label, id) in config.committee.members.iter().zip(committee.members()) {
        println!("  {:<16} {}", label, id);
    }

    Ok(())
}
