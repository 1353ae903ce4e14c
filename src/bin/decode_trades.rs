//! Trade decoder binary - decodes Seaport trades out of transaction hashes.

use std::{fmt::Display, path::PathBuf, time::Duration};

use alloy::{
    primitives::TxHash,
    providers::ProviderBuilder,
    rpc::client::RpcClient,
    transports::layers::RetryBackoffLayer,
};
use chrono::{Local, TimeZone, Utc};
use clap::Parser;
use seaport_trades::{
    Seaport,
    batch::{self, BatchItem, BatchSummary},
    decode::TransactionDecoder,
    naming::{CollectionNames, Etherscan},
    subgraph,
    types::DecodedTransaction,
};
use tracing::info;
use url::Url;

#[derive(Parser, Debug)]
#[command(name = "decode_trades")]
#[command(about = "Decode Seaport trades from Ethereum transactions")]
struct Args {
    /// RPC URL to connect to, overrides NODE_RPC_URL
    #[arg(short, long)]
    rpc_url: Option<String>,

    /// CSV file to write the decoded rows to
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Display block times in UTC instead of the local time zone
    #[arg(long)]
    utc: bool,

    /// Transaction hashes to decode
    #[arg(required = true)]
    hashes: Vec<TxHash>,
}

/// Environment configuration, every entry optional.
#[derive(Debug, serde::Deserialize)]
struct EnvConfig {
    node_rpc_url: Option<String>,
    etherscan_api_key: Option<String>,
    timeout_seconds: Option<u64>,
}

#[derive(Debug, thiserror::Error)]
#[error("no RPC URL, pass --rpc-url or set NODE_RPC_URL")]
struct MissingRpcUrl;

fn print_transaction(tx: &DecodedTransaction) {
    println!("\nTransaction: {}", tx.hash);
    println!("{}", "-".repeat(60));
    println!("Block: {}", tx.block_number);
    println!("From: {}", tx.from);
    if let Some(to) = tx.to {
        println!("To: {to}");
    }
    println!("Gas Used: {}", tx.gas_used);
    println!("Gas Price: {} Gwei", tx.gas_price_gwei());
    println!("Transaction Fee: {} ETH", tx.fee_eth());

    let Some(trade) = tx.trade() else {
        println!("No Seaport trade in this transaction");
        return;
    };
    println!("\nNFT Trade Details:");
    println!("{}", "-".repeat(60));
    println!("Seller: {}", trade.offerer);
    println!("Buyer: {}", trade.recipient);
    for item in &trade.offer {
        let id = item
            .identifier
            .map(|id| format!(" #{id}"))
            .unwrap_or_default();
        let name = item.collection_name.as_deref().unwrap_or("");
        println!("  offer: {} {}{} {}", item.item_type, item.token, id, name);
        if let Some(link) = &item.marketplace_link {
            println!("         {link}");
        }
    }
    for item in &trade.consideration {
        let amount = item
            .amount_eth
            .map(|eth| format!("{eth} ETH"))
            .unwrap_or_else(|| item.amount.to_string());
        println!("  consideration: {} {} -> {}", item.item_type, amount, item.recipient);
    }
    if tx.events.len() > 1 {
        println!("  ({} more OrderFulfilled events)", tx.events.len() - 1);
    }
    println!("\nTrade Price: {} ETH", tx.total_price_eth);
}

fn report<Tz>(items: &[BatchItem], tz: &Tz, output: Option<&PathBuf>) -> Result<(), Box<dyn std::error::Error>>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    for item in items {
        match &item.result {
            Ok(tx) => print_transaction(tx),
            Err(e) => println!("\nTransaction: {}\n  error: {e}", item.hash),
        }
    }

    if let Some(path) = output {
        batch::write_rows(path, &batch::rows(items, tz))?;
    }

    println!("\n{}", BatchSummary::new(items));
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("Warning: Failed to load .env file: {}", e);
    }
    let args = Args::parse();
    let env: EnvConfig = envy::from_env()?;

    if std::env::var("RUST_LOG").is_err() {
        unsafe {
            std::env::set_var("RUST_LOG", "info");
        }
    }
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let rpc_url = args
        .rpc_url
        .clone()
        .or(env.node_rpc_url)
        .ok_or(MissingRpcUrl)?;
    let timeout = env
        .timeout_seconds
        .map(Duration::from_secs)
        .unwrap_or(subgraph::DEFAULT_TIMEOUT);

    let client = RpcClient::builder()
        .layer(RetryBackoffLayer::new(10, 100, 200))
        .connect(&rpc_url)
        .await?;
    let provider = ProviderBuilder::new().connect_client(client);

    let seaport = Seaport::mainnet();
    let etherscan = match env.etherscan_api_key.filter(|key| !key.is_empty()) {
        Some(key) => Some(Etherscan::new(
            Url::parse(Etherscan::API_URL)?,
            key,
            seaport.chain_id(),
            timeout,
        )?),
        None => None,
    };
    info!(
        hashes = args.hashes.len(),
        etherscan = etherscan.is_some(),
        "Decoding transactions"
    );

    let decoder = TransactionDecoder::new(provider, seaport, CollectionNames::new(etherscan));
    let items = batch::decode_batch(&decoder, &args.hashes).await;

    if args.utc {
        report(&items, &Utc, args.output.as_ref())
    } else {
        report(&items, &Local, args.output.as_ref())
    }
}
