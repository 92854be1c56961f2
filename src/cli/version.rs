/// Display version information
pub fn execute() {
    println!("custody {}", env!("CARGO_PKG_VERSION"));
    println!(
        "Shared-custody approval ledger (snapshot schema v{})",
        custody::ledger::snapshot::SNAPSHOT_VERSION
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_execute() {
        execute();
    }
}
