use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use serde::Deserialize;
use serde_with::serde_as;
use statehub::{
    parse_field,
    receipt::address_from_key,
    recover_signer,
    utils::{
        conf::Conf,
        logger::{setup_tracing, LogMe},
    },
    Address, ChainedCallCommand, CommandChain, LocalSigner, MessageBuilder, ReceiptSigner,
    SettlementRecord, SpendReceipt, U256,
};
use tracing::info;

#[derive(Parser, Debug)]
#[command(version, about = "Encode state channel messages", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    #[arg(long)]
    config_file: Option<String>,

    #[arg(long, action = clap::ArgAction::SetTrue)]
    json_logs: Option<bool>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Channel creation payload
    Channel {
        #[arg(long, value_parser = parse_u256)]
        amount: U256,
        #[arg(long, value_parser = parse_u256)]
        channel_id: Option<U256>,
        /// Receiver address, takes precedence over --channel-id
        #[arg(long)]
        to: Option<Address>,
    },
    /// Wrap a hex body with the message header
    Header {
        #[arg(long)]
        body: String,
        /// Registered channel deposit as ID:AMOUNT, repeatable
        #[arg(long, value_parser = parse_deposit)]
        deposit: Vec<(U256, U256)>,
    },
    /// Unsigned settlement record
    Settlement(RecordArgs),
    /// Signed settlement receipt as JSON
    Spend(RecordArgs),
    /// Serialize a JSON list of chained calls
    Chain {
        #[arg(long)]
        file: PathBuf,
        /// Prepend the message header
        #[arg(long, action = clap::ArgAction::SetTrue)]
        wrap: bool,
    },
    /// Print the address that signed a JSON receipt
    Recover {
        #[arg(long)]
        file: PathBuf,
    },
}

#[derive(ClapArgs, Debug)]
struct RecordArgs {
    #[arg(long, value_parser = parse_u256)]
    channel_id: U256,
    #[arg(long, value_parser = parse_u256)]
    round: U256,
    #[arg(long, value_parser = parse_u256)]
    balance_a: U256,
    #[arg(long, value_parser = parse_u256)]
    balance_b: U256,
}

impl From<RecordArgs> for SettlementRecord {
    fn from(args: RecordArgs) -> Self {
        SettlementRecord {
            channel_id: args.channel_id,
            round: args.round,
            balance_a: args.balance_a,
            balance_b: args.balance_b,
        }
    }
}

#[serde_as]
#[derive(Deserialize, Debug)]
struct ChainEntry {
    #[serde(flatten)]
    command: ChainedCallCommand,
    #[serde_as(as = "serde_with::hex::Hex")]
    #[serde(default)]
    call_data: Vec<u8>,
}

fn parse_u256(s: &str) -> Result<U256, String> {
    parse_field(s).map_err(|e| e.to_string())
}

fn parse_deposit(s: &str) -> Result<(U256, U256), String> {
    let (id, amount) = s
        .split_once(':')
        .ok_or_else(|| format!("expected ID:AMOUNT, got {s:?}"))?;
    Ok((parse_u256(id)?, parse_u256(amount)?))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = Conf::new(args.config_file, args.json_logs).context("reading config")?;
    setup_tracing(config.log_format.into())?;

    let output = run(args.command, &config).await.log_error("statehub")?;
    println!("{output}");
    Ok(())
}

async fn run(command: Command, config: &Conf) -> Result<String> {
    let mut builder = MessageBuilder::new(config.version);
    match command {
        Command::Channel {
            amount,
            channel_id,
            to,
        } => Ok(builder.build_channel_creation_message(channel_id, amount, to)?),
        Command::Header { body, deposit } => {
            for (id, amount) in deposit {
                builder.register_channel_deposit(id, amount);
            }
            Ok(builder.build_header_wrapped(&body)?)
        }
        Command::Settlement(record) => Ok(builder.build_settlement_record(&record.into())?),
        Command::Spend(record) => {
            let key = config.signing_key()?;
            info!(signer = %address_from_key(&key), "Signing settlement record");
            let receipt = ReceiptSigner::new(LocalSigner)
                .build_spend_receipt(&record.into(), &key)
                .await?;
            Ok(serde_json::to_string_pretty(&receipt)?)
        }
        Command::Chain { file, wrap } => {
            let content = std::fs::read_to_string(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            let entries: Vec<ChainEntry> =
                serde_json::from_str(&content).context("parsing chained calls")?;
            let mut chain = CommandChain::new();
            for (i, entry) in entries.into_iter().enumerate() {
                chain
                    .append(entry.command, &entry.call_data)
                    .with_context(|| format!("appending command {i}"))?;
            }
            if wrap {
                Ok(builder.build_payload(&chain)?)
            } else {
                Ok(chain.serialize())
            }
        }
        Command::Recover { file } => {
            let content = std::fs::read_to_string(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            let receipt: SpendReceipt =
                serde_json::from_str(&content).context("parsing receipt")?;
            Ok(recover_signer(&receipt)?.to_string())
        }
    }
}
