//! Inspect a saved ledger
//!
//! The state file is fully re-validated before anything is printed, so a
//! file that `inspect` accepts is one `replay --state` will resume from.

use super::config::CustodyConfig;
use super::replay::Directory;
use super::state_file::StateFile;
use custody::custodian::Amount;
use custody::ledger::{ExecutionOutcome, LedgerState};
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Serialize)]
struct ProposalView {
    index: u64,
    status: &'static str,
    proposer: String,
    target: String,
    value: Amount,
    payload: String,
    confirmations: u32,
    confirmed_by: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    failure: Option<String>,
}

#[derive(Debug, Serialize)]
struct LedgerView {
    schema_version: u32,
    members: Vec<String>,
    quorum: u32,
    pool_balance: Amount,
    proposals: Vec<ProposalView>,
}

fn build_view(
    schema_version: u32,
    state: &LedgerState,
    pool_balance: Amount,
    directory: &Directory,
) -> LedgerView {
    let members = state.committee().members();
    let proposals = state
        .proposals()
        .iter()
        .enumerate()
        .map(|(row, p)| ProposalView {
            index: row as u64,
            status: p.status(),
            proposer: directory.label(&p.proposer),
            target: directory.label(&p.target),
            value: p.value,
            payload: hex::encode(&p.payload),
            confirmations: p.confirmations,
            confirmed_by: members
                .iter()
                .enumerate()
                .filter(|(column, _)| state.matrix().get(row, *column))
                .map(|(_, m)| directory.label(m))
                .collect(),
            failure: match &p.outcome {
                Some(ExecutionOutcome::Failed { reason }) => Some(reason.clone()),
                _ => None,
            },
        })
        .collect();

    LedgerView {
        schema_version,
        members: members.iter().map(|m| directory.label(m)).collect(),
        quorum: state.committee().quorum(),
        pool_balance,
        proposals,
    }
}

pub fn execute(
    state_path: &Path,
    config_path: Option<&Path>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let file = StateFile::load(state_path)?;
    let schema_version = file.ledger.schema_version;
    let state = file
        .ledger
        .into_state()
        .map_err(|e| format!("State file '{}' is invalid: {}", state_path.display(), e))?;

    let mut directory = Directory::default();
    if let Some(path) = config_path {
        for member in &CustodyConfig::load(path)?.committee.members {
            directory.resolve(member)?;
        }
    }

    let view = build_view(schema_version, &state, file.pool_balance, &directory);

    if json {
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    println!("Ledger: {}", state_path.display());
    println!(
        "Committee: {} (quorum {})",
        view.members.join(", "),
        view.quorum
    );
    println!("Pool balance: {}", view.pool_balance);
    println!("Proposals: {}", view.proposals.len());
    for p in &view.proposals {
        println!();
        println!(
            "  #{} [{}] {} -> {} value {}",
            p.index, p.status, p.proposer, p.target, p.value
        );
        if !p.payload.is_empty() {
            println!("     payload: {}", p.payload);
        }
        println!(
            "     confirmations: {}/{} {:?}",
            p.confirmations, view.quorum, p.confirmed_by
        );
        if let Some(reason) = &p.failure {
            println!("     failed: {}", reason);
        }
    }

    Ok(())
}
