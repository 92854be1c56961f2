//! Replay a scripted session against a vault
//!
//! Script format (TOML):
//!
//! ```toml
//! [custodian]
//! rejecting = ["mallory"]      # targets whose calls revert (optional)
//!
//! [[step]]
//! op = "deposit"
//! caller = "anyone"
//! amount = 100
//!
//! [[step]]
//! op = "submit"
//! caller = "alice"
//! target = "dave"
//! value = 5
//! payload = "deadbeef"         # hex, optional
//!
//! [[step]]
//! op = "execute"
//! caller = "carol"
//! index = 0
//! expect = "QuorumNotMet"      # "ok" or an error kind (optional)
//! ```

use super::config::CustodyConfig;
use super::state_file::StateFile;
use custody::audit::AuditTrail;
use custody::custodian::{Amount, InMemoryCustodian};
use custody::identity::AccountId;
use custody::vault::Vault;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReplayScript {
    #[serde(default)]
    pub custodian: ScriptCustodian,

    #[serde(default, rename = "step")]
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScriptCustodian {
    #[serde(default)]
    pub rejecting: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Step {
    #[serde(flatten)]
    pub action: Action,

    /// "ok" or the expected error kind
    pub expect: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum Action {
    Deposit {
        caller: String,
        amount: u64,
    },
    Submit {
        caller: String,
        target: String,
        #[serde(default)]
        value: u64,
        #[serde(default)]
        payload: String,
    },
    Confirm {
        caller: String,
        index: u64,
    },
    Revoke {
        caller: String,
        index: u64,
    },
    Execute {
        caller: String,
        index: u64,
    },
}

impl ReplayScript {
    pub fn load(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read script '{}': {}", path.display(), e))?;
        Self::parse(&contents)
            .map_err(|e| format!("Failed to parse script '{}': {}", path.display(), e).into())
    }

    pub fn parse(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }
}

/// Identity <-> label mapping for readable output.
#[derive(Debug, Default)]
pub struct Directory {
    labels: HashMap<AccountId, String>,
}

impl Directory {
    pub fn resolve(&mut self, name: &str) -> Result<AccountId, Box<dyn std::error::Error>> {
        let id: AccountId = name
            .parse()
            .map_err(|e| format!("Invalid identity '{}': {}", name, e))?;
        self.labels.entry(id).or_insert_with(|| name.trim().to_string());
        Ok(id)
    }

    pub fn label(&self, id: &AccountId) -> String {
        self.labels
            .get(id)
            .cloned()
            .unwrap_or_else(|| id.short())
    }
}

/// Outcome of one replayed step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepReport {
    pub description: String,
    /// "ok" or the error kind
    pub outcome: String,
    pub detail: Option<String>,
    pub matched: bool,
}

/// Run every step in order. Errors from the vault are reported, not raised.
///
/// Events are moved into `trail` after each step, so the bus never holds
/// more than one step's worth and nothing is dropped on long scripts.
pub async fn run_script(
    vault: &Vault<InMemoryCustodian>,
    script: &ReplayScript,
    directory: &mut Directory,
    trail: &mut AuditTrail,
) -> Result<Vec<StepReport>, Box<dyn std::error::Error>> {
    let mut subscription = vault.subscribe();
    for target in &script.custodian.rejecting {
        let id = directory.resolve(target)?;
        vault.custodian().reject_calls_to(id).await;
    }

    let mut reports = Vec::with_capacity(script.steps.len());
    for step in &script.steps {
        let (description, result) = match &step.action {
            Action::Deposit { caller, amount } => {
                let caller_id = directory.resolve(caller)?;
                let result = vault
                    .deposit(&caller_id, Amount::from(*amount))
                    .await
                    .map(|balance| format!("balance {}", balance))
                    .map_err(|e| ("CustodianError", e.to_string()));
                (format!("deposit {} by {}", amount, caller), result)
            }
            Action::Submit {
                caller,
                target,
                value,
                payload,
            } => {
                let caller_id = directory.resolve(caller)?;
                let target_id = directory.resolve(target)?;
                let payload_bytes = hex::decode(payload.trim_start_matches("0x"))
                    .map_err(|e| format!("Invalid payload hex '{}': {}", payload, e))?;
                let result = vault
                    .submit(&caller_id, target_id, Amount::from(*value), payload_bytes)
                    .await
                    .map(|index| format!("index {}", index))
                    .map_err(|e| (e.kind(), e.to_string()));
                (
                    format!("submit {} -> {} by {}", value, target, caller),
                    result,
                )
            }
            Action::Confirm { caller, index } => {
                let caller_id = directory.resolve(caller)?;
                let result = vault
                    .confirm(&caller_id, *index)
                    .await
                    .map(|_| String::new())
                    .map_err(|e| (e.kind(), e.to_string()));
                (format!("confirm #{} by {}", index, caller), result)
            }
            Action::Revoke { caller, index } => {
                let caller_id = directory.resolve(caller)?;
                let result = vault
                    .revoke(&caller_id, *index)
                    .await
                    .map(|_| String::new())
                    .map_err(|e| (e.kind(), e.to_string()));
                (format!("revoke #{} by {}", index, caller), result)
            }
            Action::Execute { caller, index } => {
                let caller_id = directory.resolve(caller)?;
                let result = vault
                    .execute(&caller_id, *index)
                    .await
                    .map(|_| String::new())
                    .map_err(|e| (e.kind(), e.to_string()));
                (format!("execute #{} by {}", index, caller), result)
            }
        };

        let (outcome, detail) = match result {
            Ok(detail) if detail.is_empty() => ("ok".to_string(), None),
            Ok(detail) => ("ok".to_string(), Some(detail)),
            Err((kind, message)) => (kind.to_string(), Some(message)),
        };
        let matched = step
            .expect
            .as_deref()
            .map(|expected| expected.eq_ignore_ascii_case(&outcome))
            .unwrap_or(true);

        reports.push(StepReport {
            description,
            outcome,
            detail,
            matched,
        });
        trail.record_pending(&mut subscription);
    }

    Ok(reports)
}

/// Replay a script, print results and the audit trail, and optionally
/// persist the resulting ledger.
pub async fn execute(
    config_path: &Path,
    script_path: &Path,
    state_path: Option<&Path>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = CustodyConfig::load(config_path)?;
    let committee = config.committee()?;

    let mut directory = Directory::default();
    for member in &config.committee.members {
        directory.resolve(member)?;
    }

    let existing = match state_path {
        Some(path) if path.exists() => Some(StateFile::load(path)?),
        _ => None,
    };

    let vault = match existing {
        Some(state) => {
            if state.ledger.committee != committee.to_record() {
                return Err(format!(
                    "Committee in '{}' does not match the state file",
                    config_path.display()
                )
                .into());
            }
            let custodian = Arc::new(InMemoryCustodian::with_balance(state.pool_balance));
            Vault::restore(state.ledger, custodian)?
        }
        None => Vault::new(committee, Arc::new(InMemoryCustodian::new())),
    };
    let vault = match config.dispatch_timeout()? {
        Some(timeout) => vault.with_dispatch_timeout(timeout),
        None => vault,
    };

    let script = ReplayScript::load(script_path)?;
    let mut trail = AuditTrail::new();
    let reports = run_script(&vault, &script, &mut directory, &mut trail).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(trail.entries())?);
    } else {
        println!("Replay: {}", script_path.display());
        println!();
        for (i, report) in reports.iter().enumerate() {
            let marker = if report.matched { " " } else { "!" };
            match &report.detail {
                Some(detail) => println!(
                    "{} [{:>3}] {:<40} {} ({})",
                    marker, i, report.description, report.outcome, detail
                ),
                None => println!(
                    "{} [{:>3}] {:<40} {}",
                    marker, i, report.description, report.outcome
                ),
            }
        }
        println!();
        println!("Audit trail ({} events):", trail.len());
        for entry in trail.entries() {
            println!("  {}", entry);
        }
        println!();
        println!(
            "Proposals: {}  Pool balance: {}",
            vault.transaction_count().await,
            vault.balance().await?
        );
    }

    if let Some(path) = state_path {
        let file = StateFile {
            ledger: vault.snapshot().await,
            pool_balance: vault.balance().await?,
        };
        file.save(path)?;
        if !json {
            println!("State saved: {}", path.display());
        }
    }

    let mismatched = reports.iter().filter(|r| !r.matched).count();
    if mismatched > 0 {
        return Err(format!("{} step(s) did not match their expected outcome", mismatched).into());
    }

    Ok(())
}
