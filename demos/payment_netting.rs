//! Payment netting example.
//!
//! Builds a three-party obligation network, nets it down with payment
//! netting, and shows the contract accepting the result only once every
//! involved party has signed.

use chrono::{TimeZone, Utc};
use netting_verifier::prelude::*;

fn main() {
    println!("╔═══════════════════════════════════════════════╗");
    println!("║  netting-verifier: Multilateral Payment Net   ║");
    println!("╚═══════════════════════════════════════════════╝\n");

    let central_bank = Party::new("CENTRAL-BANK", PublicKey::new("key-central-bank"));
    let usd = Terms::new(
        vec!["obligation-v1".to_string()],
        vec![Issued::new(central_bank.reference(vec![1]), CurrencyCode::new("USD"))],
        Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap(),
    )
    .unwrap();

    let brazil = Party::new("BR-TREASURY", PublicKey::new("key-br"));
    let india = Party::new("IN-RBI", PublicKey::new("key-in"));
    let china = Party::new("CN-PBOC", PublicKey::new("key-cn"));

    println!("Obligations:");
    println!("  Brazil → India:  $100M");
    println!("  India  → China:  $80M");
    println!("  China  → Brazil: $120M\n");

    let obligations = vec![
        ObligationState::new(brazil.clone(), usd.clone(), 100_000_000_00, india.owning_key.clone()),
        ObligationState::new(india.clone(), usd.clone(), 80_000_000_00, china.owning_key.clone()),
        ObligationState::new(china.clone(), usd.clone(), 120_000_000_00, brazil.owning_key.clone()),
    ];

    let positions = BalanceMatrix::extract(&usd, &obligations)
        .unwrap()
        .net_positions()
        .unwrap();
    println!("━━━ Net Positions (minor units) ━━━\n");
    for (party, position) in positions.positions() {
        println!("  {:<10} {:>16}", party, position);
    }
    println!();

    let proposal = generate_payment_netting(obligations).unwrap();
    println!("━━━ Proposal ━━━\n");
    println!("{}\n", proposal);
    for output in &proposal.outputs {
        println!("  {}", output);
    }
    println!();

    let contract = ObligationContract::new();

    println!("━━━ Verification ━━━\n");
    let partial = proposal
        .clone()
        .into_transaction(vec![brazil.owning_key.clone(), india.owning_key.clone()]);
    match contract.verify(&partial) {
        Ok(()) => println!("  Signed by BR, IN:      accepted"),
        Err(e) => println!("  Signed by BR, IN:      rejected ({})", e),
    }

    let full = proposal.into_signed_transaction();
    match contract.verify(&full) {
        Ok(()) => println!("  Signed by all parties: accepted"),
        Err(e) => println!("  Signed by all parties: rejected ({})", e),
    }
}
