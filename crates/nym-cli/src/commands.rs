use std::sync::Arc;

use anyhow::{anyhow, bail, Context};
use colored::Colorize;
use nym_ledger::{LedgerReader, SystemClock};
use nym_query::{EffectiveRecord, GetNymRequest, NodeConfig, NymLedger};
use nym_types::{AttributeUpdate, Did, NymVersion, Role};

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = node_config(&cli)?;
    let ledger = NymLedger::open(&config, Arc::new(SystemClock)).context("opening ledger")?;
    let format = cli.format;

    let result = match cli.command {
        Command::Append(args) => cmd_append(&ledger, args, format),
        Command::Get(args) => cmd_get(&ledger, args, format),
        Command::History(args) => cmd_history(&ledger, args, format),
        Command::Verify(_) => cmd_verify(&ledger, format),
    };
    ledger.close()?;
    result
}

fn node_config(cli: &Cli) -> anyhow::Result<NodeConfig> {
    let mut config = match &cli.config {
        Some(path) => NodeConfig::load(path)?,
        None => NodeConfig::default(),
    };
    if let Some(log) = &cli.log {
        config.log_path = Some(log.clone());
    }
    if config.log_path.is_none() {
        bail!("no ledger file; pass --log or set log_path in --config");
    }
    Ok(config)
}

fn build_update(args: AppendArgs) -> anyhow::Result<AttributeUpdate> {
    let identifier = args.identifier.ok_or_else(|| anyhow!("--identifier is required"))?;
    let dest = args.dest.ok_or_else(|| anyhow!("--dest is required"))?;
    let mut update = AttributeUpdate::new(Did::parse(&identifier)?, Did::parse(&dest)?);

    if let Some(verkey) = args.verkey {
        update = update.with_verkey(verkey);
    }
    if let Some(role) = args.role {
        update = update.with_role(Some(Role::parse(&role)?));
    } else if args.clear_role {
        update = update.with_role(None);
    }
    if let Some(doc) = args.diddoc {
        update = update.with_diddoc_content(doc);
    }
    if let Some(version) = args.nym_version {
        update = update.with_version(NymVersion::try_from(version)?);
    }
    Ok(update)
}

fn cmd_append(ledger: &NymLedger, args: AppendArgs, format: OutputFormat) -> anyhow::Result<()> {
    let seq_no = match args.json {
        Some(json) => ledger.append_json(&json)?,
        None => ledger.append(build_update(args)?)?,
    };
    let txn = ledger.log().get_by_seq_no(seq_no)?;

    match format {
        OutputFormat::Json => println!(
            "{}",
            serde_json::json!({
                "seqNo": txn.seq_no,
                "txnTime": txn.txn_time,
                "txnHash": hex::encode(txn.txn_hash),
            })
        ),
        OutputFormat::Text => {
            println!("{} Appended seqNo {}", "✓".green().bold(), seq_no.to_string().yellow());
            println!("  dest: {}", txn.dest().to_string().cyan());
            println!("  txnTime: {}", txn.txn_time);
            println!("  hash: {}", hex::encode(&txn.txn_hash[..8]).dimmed());
        }
    }
    Ok(())
}

fn cmd_get(ledger: &NymLedger, args: GetArgs, format: OutputFormat) -> anyhow::Result<()> {
    let request = GetNymRequest {
        identifier: args.identifier.unwrap_or_else(|| args.dest.clone()),
        dest: args.dest,
        seq_no: args.seq_no,
        timestamp: args.timestamp,
    };

    let reply = match ledger.get_nym(&request) {
        Ok(reply) => reply,
        Err(e) => {
            if format == OutputFormat::Json {
                println!("{}", serde_json::to_string(&e.to_reply())?);
            }
            return Err(anyhow!("{}: {}", e.code(), e.to_reply().message));
        }
    };

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string(&reply)?),
        OutputFormat::Text => {
            let data = reply.nym_data()?;
            println!(
                "{} {}",
                "NYM".bold(),
                reply.dest.to_string().cyan().bold()
            );
            println!("  resolved at: seqNo {}, txnTime {}", reply.seq_no, reply.txn_time);
            println!("  created by: {}", data.identifier);
            if let Some(verkey) = &data.verkey {
                println!("  verkey: {verkey}");
            }
            match &data.role {
                Some(Some(role)) => println!("  role: {} ({})", role, role.code()),
                Some(None) => println!("  role: {}", "cleared".dimmed()),
                None => {}
            }
            if let Some(doc) = &data.diddoc_content {
                println!("  diddocContent: {doc}");
            }
            if let Some(version) = data.version {
                println!("  version: {}", u8::from(version));
            }
        }
    }
    Ok(())
}

fn cmd_history(ledger: &NymLedger, args: HistoryArgs, format: OutputFormat) -> anyhow::Result<()> {
    let dest = Did::parse(&args.dest)?;
    let history = ledger.history(&dest)?;
    if history.is_empty() {
        bail!("no updates for {dest}");
    }

    match format {
        OutputFormat::Json => {
            let entries = history
                .iter()
                .map(history_entry)
                .collect::<Result<Vec<_>, _>>()?;
            println!("{}", serde_json::Value::Array(entries));
        }
        OutputFormat::Text => {
            for record in &history {
                let txn = ledger.log().get_by_seq_no(record.seq_no)?;
                let mut set = Vec::new();
                if txn.update.verkey.is_set() {
                    set.push("verkey");
                }
                if txn.update.role.is_set() {
                    set.push("role");
                }
                if txn.update.diddoc_content.is_set() {
                    set.push("diddocContent");
                }
                if txn.update.version.is_set() {
                    set.push("version");
                }
                println!(
                    "{}  t={}  by {}  sets [{}]",
                    format!("#{}", record.seq_no).yellow(),
                    record.txn_time,
                    txn.update.identifier.short_id(),
                    set.join(", ")
                );
            }
        }
    }
    Ok(())
}

fn history_entry(record: &EffectiveRecord) -> serde_json::Result<serde_json::Value> {
    serde_json::to_value(nym_query::NymData::from(record))
}

fn cmd_verify(ledger: &NymLedger, format: OutputFormat) -> anyhow::Result<()> {
    let report = ledger.verify()?;

    if format == OutputFormat::Json {
        println!(
            "{}",
            serde_json::json!({
                "txnCount": report.txn_count,
                "valid": report.is_valid(),
                "violations": report
                    .violations
                    .iter()
                    .map(|v| serde_json::json!({ "seqNo": v.seq_no, "description": v.description }))
                    .collect::<Vec<_>>(),
            })
        );
    } else if report.is_valid() {
        println!("{} Ledger integrity verified", "✓".green().bold());
        println!("  Transactions: {}", report.txn_count.to_string().bold());
        println!("  Sequence: {}", "contiguous".green());
        println!("  txnTime: {}", "monotonic".green());
        println!("  Hash chain: {}", "valid".green());
    } else {
        println!("{} Ledger integrity violated", "✗".red().bold());
        for v in &report.violations {
            println!("  seqNo {}: {}", v.seq_no, v.description);
        }
    }

    if !report.is_valid() {
        bail!("{} integrity violation(s)", report.violations.len());
    }
    Ok(())
}
