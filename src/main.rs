//! netting-verifier CLI
//!
//! Verify obligation transactions and build netting transactions from the
//! command line. Set `RUST_LOG=debug` to trace clause evaluation.
//!
//! # Usage
//!
//! ```bash
//! # Verify a transaction file
//! netting-verifier verify --input tx.json
//!
//! # Build and verify a payment netting transaction
//! netting-verifier net --input obligations.json --type payment
//!
//! # Generate a random payment netting transaction
//! netting-verifier generate --parties 10 --obligations 30 --output tx.json
//! ```

use netting_verifier::core::currency::CurrencyCode;
use netting_verifier::core::party::PublicKey;
use netting_verifier::core::transaction::{Contract, TransactionForContract};
use netting_verifier::obligation::commands::ObligationCommand;
use netting_verifier::obligation::contract::ObligationContract;
use netting_verifier::obligation::generation::{
    generate_close_out_netting, generate_payment_netting, NettingProposal,
};
use netting_verifier::obligation::net_state::NetType;
use netting_verifier::obligation::state::ObligationState;
use netting_verifier::simulation::stress_test::{generate_random_obligations, NetworkConfig};
use std::fs;
use std::process;

type State = ObligationState<CurrencyCode>;
type Transaction = TransactionForContract<State, ObligationCommand<CurrencyCode>>;

fn print_usage() {
    eprintln!(
        r#"netting-verifier — clause-based obligation transaction verification

USAGE:
    netting-verifier <COMMAND> [OPTIONS]

COMMANDS:
    verify      Verify a transaction against the obligation contract
    net         Build a netting transaction from obligations and verify it
    generate    Generate a random payment netting transaction (for testing)
    help        Show this message

OPTIONS (verify):
    --input <FILE>      Path to JSON transaction file
    --format <FORMAT>   Output format: text (default) or json

OPTIONS (net):
    --input <FILE>      Path to JSON obligations file
    --type <TYPE>       payment (default) or close-out
    --signer <KEY>      Signing key; required for close-out
    --format <FORMAT>   Output format: text (default) or json

OPTIONS (generate):
    --parties <N>       Number of parties (default: 10)
    --obligations <N>   Number of obligations (default: 30)
    --currency <CODE>   Currency code (default: USD)
    --output <FILE>     Write to file instead of stdout

EXAMPLES:
    netting-verifier verify --input tx.json --format json
    netting-verifier net --input obligations.json --type close-out --signer key-party-000
    netting-verifier generate --parties 20 --obligations 60 --output tx.json"#
    );
}

fn fail(message: impl std::fmt::Display) -> ! {
    eprintln!("Error: {}", message);
    process::exit(1);
}

/// Collect `--flag value` pairs, rejecting flags not in `allowed`.
fn parse_options(args: &[String], allowed: &[&str]) -> Vec<(String, String)> {
    let mut options = Vec::new();
    let mut i = 0;
    while i < args.len() {
        let flag = args[i].as_str();
        if !allowed.contains(&flag) {
            eprintln!("Unknown option: {}", flag);
            process::exit(1);
        }
        i += 1;
        let value = args
            .get(i)
            .cloned()
            .unwrap_or_else(|| fail(format!("{} requires a value", flag)));
        options.push((flag.to_string(), value));
        i += 1;
    }
    options
}

fn option<'a>(options: &'a [(String, String)], flag: &str) -> Option<&'a str> {
    options
        .iter()
        .rev()
        .find(|(f, _)| f == flag)
        .map(|(_, v)| v.as_str())
}

fn read_json<T: serde::de::DeserializeOwned>(path: &str) -> T {
    let content = fs::read_to_string(path)
        .unwrap_or_else(|e| fail(format!("reading file '{}': {}", path, e)));
    serde_json::from_str(&content).unwrap_or_else(|e| fail(format!("parsing JSON in '{}': {}", path, e)))
}

fn to_json<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|e| fail(format!("serializing output: {}", e)))
}

#[derive(serde::Serialize)]
struct VerificationOutput {
    transaction: String,
    valid: bool,
    inputs: usize,
    outputs: usize,
    commands: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn report(tx: &Transaction, format: &str) -> bool {
    let result = ObligationContract::new().verify(tx);
    let valid = result.is_ok();

    if format == "json" {
        let output = VerificationOutput {
            transaction: tx.id.to_string(),
            valid,
            inputs: tx.inputs.len(),
            outputs: tx.outputs.len(),
            commands: tx.commands.len(),
            error: result.err().map(|e| e.to_string()),
        };
        println!("{}", to_json(&output));
    } else {
        println!("Transaction:    {}", tx.id);
        println!("States:         {} in, {} out", tx.inputs.len(), tx.outputs.len());
        println!("Commands:       {}", tx.commands.len());
        match result {
            Ok(()) => println!("Result:         ACCEPTED"),
            Err(e) => println!("Result:         REJECTED ({})", e),
        }
    }
    valid
}

fn cmd_verify(args: &[String]) {
    let options = parse_options(args, &["--input", "--format"]);
    let path = option(&options, "--input").unwrap_or_else(|| fail("--input <FILE> is required"));
    let format = option(&options, "--format").unwrap_or("text");

    let tx: Transaction = read_json(path);
    if !report(&tx, format) {
        process::exit(2);
    }
}

#[derive(serde::Deserialize)]
struct ObligationsFile {
    obligations: Vec<State>,
}

fn cmd_net(args: &[String]) {
    let options = parse_options(args, &["--input", "--type", "--signer", "--format"]);
    let path = option(&options, "--input").unwrap_or_else(|| fail("--input <FILE> is required"));
    let format = option(&options, "--format").unwrap_or("text");
    let net_type: NetType = option(&options, "--type")
        .unwrap_or("payment")
        .parse()
        .unwrap_or_else(|e| fail(e));

    let file: ObligationsFile = read_json(path);
    let proposal: NettingProposal<CurrencyCode> = match net_type {
        NetType::Payment => generate_payment_netting(file.obligations),
        NetType::CloseOut => {
            let signer = option(&options, "--signer")
                .map(|key| PublicKey::new(key))
                .unwrap_or_else(|| fail("--signer <KEY> is required for close-out netting"));
            generate_close_out_netting(&signer, file.obligations)
        }
    }
    .unwrap_or_else(|e| fail(e));

    if format == "json" {
        println!("{}", to_json(&proposal));
    } else {
        println!("{}\n", proposal);
    }

    let tx = proposal.into_signed_transaction();
    if !report(&tx, format) {
        process::exit(2);
    }
}

fn cmd_generate(args: &[String]) {
    let options = parse_options(args, &["--parties", "--obligations", "--currency", "--output"]);
    let parties: usize = option(&options, "--parties")
        .map(|s| s.parse().unwrap_or_else(|_| fail("--parties requires a number")))
        .unwrap_or(10);
    let obligations_count: usize = option(&options, "--obligations")
        .map(|s| s.parse().unwrap_or_else(|_| fail("--obligations requires a number")))
        .unwrap_or(30);
    let currency = CurrencyCode::new(option(&options, "--currency").unwrap_or("USD"));

    let config = NetworkConfig {
        party_count: parties,
        avg_obligations_per_party: (obligations_count / parties.max(1)).max(1),
        currency,
        ..Default::default()
    };

    let obligations = generate_random_obligations(&config).unwrap_or_else(|e| fail(e));
    let count = obligations.len();
    let tx = generate_payment_netting(obligations)
        .unwrap_or_else(|e| fail(e))
        .into_signed_transaction();
    let json = to_json(&tx);

    if let Some(path) = option(&options, "--output") {
        fs::write(path, &json).unwrap_or_else(|e| fail(format!("writing to '{}': {}", path, e)));
        eprintln!(
            "Generated netting of {} obligations across {} parties → {}",
            count, parties, path
        );
    } else {
        println!("{}", json);
    }
}

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    let command = args[1].as_str();
    let rest = &args[2..];

    match command {
        "verify" => cmd_verify(rest),
        "net" => cmd_net(rest),
        "generate" => cmd_generate(rest),
        "help" | "--help" | "-h" => print_usage(),
        _ => {
            eprintln!("Unknown command: {}", command);
            print_usage();
            process::exit(1);
        }
    }
}
