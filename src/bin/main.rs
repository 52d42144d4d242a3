//! nwc CLI - one wallet call per invocation
//!
//!   nwc balance                      → {"balance": 21000}
//!   nwc info                         → {"alias": ..., "methods": [...]}
//!   nwc invoice <msats> <memo>       → {"invoice": "lnbc..."}
//!   nwc pay <bolt11>                 → {"preimage": ..., "fees_paid": ...}
//!   nwc keysend <pubkey> <msats>     → {"preimage": ..., "fees_paid": ...}
//!   nwc lookup <bolt11>              → invoice record
//!   nwc transactions                 → [invoice records]
//!
//! Configuration:
//!   --uri <nostr+walletconnect://...>   or NWC_URI
//!   --timeout <secs>                    or NWC_TIMEOUT_SECS (default 30)
//!
//! Output format:
//!   --json     Output compact JSON (default for non-tty)
//!   --pretty   Pretty-print JSON (default for tty)

use anyhow::{anyhow, bail, Context};
use beenode_nwc::logging::init_logging;
use beenode_nwc::{NwcClient, NwcError, SessionConfig};
use serde_json::{json, Value};
use std::env;
use std::io::IsTerminal;
use std::time::Duration;
use tracing::debug;

const URI_ENV: &str = "NWC_URI";
const TIMEOUT_ENV: &str = "NWC_TIMEOUT_SECS";

fn main() {
    init_logging();

    let args: Vec<String> = env::args().collect();
    let opts = match ParsedArgs::parse(&args[1..]) {
        Ok(opts) => opts,
        Err(e) => {
            eprintln!("{}", e);
            print_usage();
            std::process::exit(2);
        }
    };

    if opts.help {
        print_usage();
        return;
    }

    if opts.version {
        println!("nwc {}", env!("CARGO_PKG_VERSION"));
        return;
    }

    let Some(command) = opts.command.clone() else {
        print_usage();
        return;
    };

    let pretty = !opts.json && (opts.pretty || std::io::stdout().is_terminal());
    match run(&opts, &command) {
        Ok(output) => println!("{}", render(&output, pretty)),
        Err(e) => {
            let err = match e.downcast_ref::<NwcError>() {
                Some(NwcError::Remote { code, message }) => json!({"error": message, "code": code}),
                Some(NwcError::ResponseTimeout(_)) => json!({"error": e.to_string(), "code": "TIMEOUT"}),
                _ => json!({"error": format!("{:#}", e)}),
            };
            eprintln!("{}", render(&err, pretty));
            std::process::exit(1);
        }
    }
}

fn render(value: &Value, pretty: bool) -> String {
    let rendered = if pretty { serde_json::to_string_pretty(value) } else { serde_json::to_string(value) };
    rendered.unwrap_or_else(|_| value.to_string())
}

fn run(opts: &ParsedArgs, command: &str) -> anyhow::Result<Value> {
    let uri = opts
        .uri
        .clone()
        .or_else(|| env::var(URI_ENV).ok())
        .ok_or_else(|| anyhow!("No connection string: pass --uri or set {}", URI_ENV))?;

    let timeout = match opts.timeout.clone().or_else(|| env::var(TIMEOUT_ENV).ok()) {
        Some(raw) => raw.parse::<u64>().with_context(|| format!("Invalid timeout: {}", raw))?,
        None => SessionConfig::default().response_timeout.as_secs(),
    };
    let config = SessionConfig::default().with_response_timeout(Duration::from_secs(timeout));
    let client = NwcClient::with_config(&uri, config)?;
    debug!(command, client = %client.identity().client_pubkey_hex(), "Running");

    let rt = tokio::runtime::Runtime::new().context("tokio runtime")?;
    rt.block_on(async {
        let args = &opts.args;
        let output = match command {
            "balance" => serde_json::to_value(client.get_balance().await?)?,
            "info" => serde_json::to_value(client.get_info().await?)?,
            "invoice" => {
                let amount = parse_amount(arg(args, 0, "amount")?)?;
                let description = args.get(1).map(String::as_str).unwrap_or("");
                json!({"invoice": client.make_invoice(amount, description).await?})
            }
            "pay" => serde_json::to_value(client.pay_invoice(arg(args, 0, "invoice")?).await?)?,
            "keysend" => {
                let pubkey = arg(args, 0, "pubkey")?;
                let amount = parse_amount(arg(args, 1, "amount")?)?;
                serde_json::to_value(client.pay_keysend(pubkey, amount).await?)?
            }
            "lookup" => serde_json::to_value(client.lookup_invoice(arg(args, 0, "invoice")?).await?)?,
            "transactions" | "txs" => serde_json::to_value(client.list_transactions().await?)?,
            other => bail!("Unknown command: {}", other),
        };
        Ok::<Value, anyhow::Error>(output)
    })
}

fn arg<'a>(args: &'a [String], index: usize, name: &str) -> anyhow::Result<&'a str> {
    args.get(index).map(String::as_str).ok_or_else(|| anyhow!("Missing <{}>", name))
}

fn parse_amount(raw: &str) -> anyhow::Result<u64> {
    raw.parse::<u64>().with_context(|| format!("Invalid amount (msats): {}", raw))
}

#[derive(Default)]
struct ParsedArgs {
    command: Option<String>,
    args: Vec<String>,
    uri: Option<String>,
    timeout: Option<String>,
    json: bool,
    pretty: bool,
    help: bool,
    version: bool,
}

impl ParsedArgs {
    fn parse(args: &[String]) -> Result<Self, String> {
        let mut opts = ParsedArgs::default();
        let mut iter = args.iter();
        while let Some(a) = iter.next() {
            match a.as_str() {
                "--uri" | "-u" => opts.uri = Some(iter.next().ok_or("--uri needs a value")?.clone()),
                "--timeout" | "-t" => opts.timeout = Some(iter.next().ok_or("--timeout needs a value")?.clone()),
                "--json" => opts.json = true,
                "--pretty" => opts.pretty = true,
                "--help" | "-h" => opts.help = true,
                "--version" | "-V" => opts.version = true,
                _ if opts.command.is_none() => opts.command = Some(a.clone()),
                _ => opts.args.push(a.clone()),
            }
        }
        Ok(opts)
    }
}

fn print_usage() {
    eprintln!(
        "Usage: nwc [--uri <uri>] [--timeout <secs>] [--json|--pretty] <command> [args]\n\
         \n\
         Commands:\n\
         \x20 balance                    Wallet balance (msats)\n\
         \x20 info                       Wallet capabilities\n\
         \x20 invoice <msats> [memo]     Create an invoice\n\
         \x20 pay <bolt11>               Pay an invoice\n\
         \x20 keysend <pubkey> <msats>   Pay a node directly\n\
         \x20 lookup <bolt11>            Look up an invoice\n\
         \x20 transactions               List transactions\n\
         \n\
         Environment:\n\
         \x20 {}       Connection string\n\
         \x20 {}  Reply timeout in seconds\n\
         \x20 NWC_LOG_JSON=1        JSON logs on stderr",
        URI_ENV, TIMEOUT_ENV
    );
}
