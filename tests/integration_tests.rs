use chrono::{DateTime, Duration, TimeZone, Utc};
use netting_verifier::prelude::*;
use rust_decimal_macros::dec;

type State = ObligationState<CurrencyCode>;
type Command = ObligationCommand<CurrencyCode>;
type Tx = TransactionForContract<State, Command>;

fn due() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2030, 6, 30, 0, 0, 0).unwrap()
}

fn bank() -> Party {
    Party::new("MegaBank", PublicKey::new("key-megabank"))
}

fn usd_terms() -> Terms<CurrencyCode> {
    Terms::new(
        vec!["obligation-v1".to_string()],
        vec![Issued::new(bank().reference(vec![1]), CurrencyCode::new("USD"))],
        due(),
    )
    .unwrap()
}

fn gbp_terms() -> Terms<CurrencyCode> {
    Terms::new(
        vec!["obligation-v1".to_string()],
        vec![Issued::new(bank().reference(vec![1]), CurrencyCode::new("GBP"))],
        due(),
    )
    .unwrap()
}

fn party(name: &str) -> Party {
    Party::new(name, PublicKey::new(format!("key-{}", name.to_lowercase())))
}

fn key(name: &str) -> PublicKey {
    party(name).owning_key
}

fn owes(obligor: &str, beneficiary: &str, quantity: u64) -> State {
    owes_under(usd_terms(), obligor, beneficiary, quantity)
}

fn owes_under(terms: Terms<CurrencyCode>, obligor: &str, beneficiary: &str, quantity: u64) -> State {
    ObligationState::new(party(obligor), terms, quantity, key(beneficiary))
}

fn signed(value: Command, signers: &[&str]) -> AuthenticatedCommand<Command> {
    AuthenticatedCommand::new(value, signers.iter().map(|s| key(s)))
}

fn verify(tx: &Tx) -> Result<(), VerificationError> {
    ObligationContract::new().verify(tx)
}

/// A single debt cannot be netted into nothing: the beneficiary's claim
/// would vanish without settlement.
#[test]
fn lone_debt_close_out_rejected() {
    let tx = Tx::new(
        vec![owes("X", "Y", 100)],
        vec![],
        vec![signed(ObligationCommand::Net(NetType::CloseOut), &["Y"])],
    );
    let err = verify(&tx).unwrap_err();
    assert!(matches!(err, VerificationError::Conservation { .. }));
}

#[test]
fn mutual_close_out_one_signer_accepted() {
    let tx = Tx::new(
        vec![owes("X", "Y", 100), owes("Y", "X", 100)],
        vec![],
        vec![signed(ObligationCommand::Net(NetType::CloseOut), &["Y"])],
    );
    assert!(verify(&tx).is_ok());
}

#[test]
fn payment_cycle_needs_every_signature() {
    let inputs = vec![owes("A", "B", 50), owes("B", "C", 50), owes("C", "A", 50)];

    let partial = Tx::new(
        inputs.clone(),
        vec![],
        vec![signed(ObligationCommand::Net(NetType::Payment), &["A", "B"])],
    );
    match verify(&partial).unwrap_err() {
        VerificationError::Authorization { missing, .. } => assert_eq!(missing, vec![key("C")]),
        other => panic!("expected authorization failure, got {other}"),
    }

    let full = Tx::new(
        inputs,
        vec![],
        vec![signed(ObligationCommand::Net(NetType::Payment), &["A", "B", "C"])],
    );
    assert!(verify(&full).is_ok());
}

#[test]
fn template_change_rejected() {
    let tx = Tx::new(
        vec![owes_under(usd_terms(), "A", "B", 100)],
        vec![owes_under(gbp_terms(), "A", "B", 90)],
        vec![signed(ObligationCommand::Net(NetType::Payment), &["A", "B"])],
    );
    // The two terms land in separate groups, neither of which conserves
    assert!(verify(&tx).is_err());

    let group_key = NetState::Multilateral { template: usd_terms() };
    let err = verify_net_command(
        &[owes_under(usd_terms(), "A", "B", 100)],
        &[owes_under(gbp_terms(), "A", "B", 90)],
        &signed(ObligationCommand::Net(NetType::Payment), &["A", "B"]),
        &group_key,
    )
    .unwrap_err();
    assert!(matches!(err, VerificationError::Structural { .. }));
}

#[test]
fn authorization_asymmetry() {
    // Close-out between two parties: one signature suffices
    let close_out = Tx::new(
        vec![owes("A", "B", 70), owes("B", "A", 30)],
        vec![owes("A", "B", 40)],
        vec![signed(ObligationCommand::Net(NetType::CloseOut), &["B"])],
    );
    assert!(verify(&close_out).is_ok());

    // Payment among three parties: one signature is not enough
    let payment = Tx::new(
        vec![owes("A", "B", 100), owes("B", "C", 100)],
        vec![owes("A", "C", 100)],
        vec![signed(ObligationCommand::Net(NetType::Payment), &["A"])],
    );
    assert!(matches!(
        verify(&payment),
        Err(VerificationError::Authorization { .. })
    ));
}

#[test]
fn close_out_groups_each_pair_separately() {
    // A and B close out, but the A/C debt is in its own group and does not conserve
    let tx = Tx::new(
        vec![owes("A", "B", 10), owes("B", "A", 10), owes("A", "C", 5)],
        vec![],
        vec![signed(ObligationCommand::Net(NetType::CloseOut), &["A"])],
    );
    assert!(matches!(
        verify(&tx),
        Err(VerificationError::Conservation { .. })
    ));
}

#[test]
fn payment_nets_across_currencies_independently() {
    let tx = Tx::new(
        vec![
            owes_under(usd_terms(), "A", "B", 10),
            owes_under(usd_terms(), "B", "A", 10),
            owes_under(gbp_terms(), "A", "B", 7),
        ],
        vec![owes_under(gbp_terms(), "A", "B", 7)],
        vec![signed(ObligationCommand::Net(NetType::Payment), &["A", "B"])],
    );
    assert!(verify(&tx).is_ok());
}

#[test]
fn close_out_cannot_create_obligations_from_nothing() {
    let outputs = vec![owes("X", "Y", 10), owes("Y", "X", 10)];

    let unsigned = Tx::new(
        vec![],
        outputs.clone(),
        vec![signed(ObligationCommand::Net(NetType::CloseOut), &[])],
    );
    assert!(matches!(
        verify(&unsigned),
        Err(VerificationError::Authorization { .. })
    ));

    let signed_by_both = Tx::new(
        vec![],
        outputs,
        vec![signed(ObligationCommand::Net(NetType::CloseOut), &["X", "Y"])],
    );
    assert!(matches!(
        verify(&signed_by_both),
        Err(VerificationError::Authorization { .. })
    ));
}

#[test]
fn payment_without_inputs_netting_to_zero_needs_no_signature() {
    let tx = Tx::new(
        vec![],
        vec![owes("X", "Y", 10), owes("Y", "X", 10)],
        vec![signed(ObligationCommand::Net(NetType::Payment), &[])],
    );
    assert!(verify(&tx).is_ok());
}

#[test]
fn defaulted_obligations_cannot_be_netted() {
    let tx = Tx::new(
        vec![
            owes("X", "Y", 10).with_lifecycle(Lifecycle::Defaulted),
            owes("Y", "X", 10).with_lifecycle(Lifecycle::Defaulted),
        ],
        vec![],
        vec![signed(ObligationCommand::Net(NetType::CloseOut), &["X"])],
    );
    let err = verify(&tx).unwrap_err();
    assert!(err.to_string().contains("normal lifecycle"));
}

#[test]
fn netting_rejects_zero_sized_output() {
    let mut empty = owes("X", "Y", 1);
    empty.quantity = 0;
    let tx = Tx::new(
        vec![owes("X", "Y", 10)],
        vec![owes("X", "Y", 10), empty],
        vec![signed(ObligationCommand::Net(NetType::Payment), &["X", "Y"])],
    );
    let err = verify(&tx).unwrap_err();
    assert!(err.to_string().contains("zero sized outputs"));
}

#[test]
fn command_nobody_handles_is_rejected() {
    let tx = Tx::new(
        vec![owes("A", "B", 10)],
        vec![owes("A", "C", 10)],
        vec![
            signed(ObligationCommand::Move, &["B"]),
            signed(
                ObligationCommand::Exit(Amount::new(1, owes_under(gbp_terms(), "A", "B", 1).issuance_key())),
                &["B"],
            ),
        ],
    );
    match verify(&tx).unwrap_err() {
        VerificationError::UnclaimedCommand { command } => assert!(command.starts_with("Exit")),
        other => panic!("expected unclaimed command, got {other}"),
    }
}

#[test]
fn issue_move_exit_lifecycle() {
    let issue = Tx::new(
        vec![],
        vec![owes("A", "B", 1_000_00)],
        vec![signed(ObligationCommand::Issue { nonce: 42 }, &["A"])],
    );
    assert!(verify(&issue).is_ok());

    let transfer = Tx::new(
        vec![owes("A", "B", 1_000_00)],
        vec![owes("A", "C", 1_000_00)],
        vec![signed(ObligationCommand::Move, &["B"])],
    );
    assert!(verify(&transfer).is_ok());

    let exit_amount = Amount::from_decimal(dec!(250.00), owes("A", "C", 1).issuance_key()).unwrap();
    assert_eq!(exit_amount.quantity(), 250_00);
    let exit = Tx::new(
        vec![owes("A", "C", 1_000_00)],
        vec![owes("A", "C", 750_00)],
        vec![signed(ObligationCommand::Exit(exit_amount), &["C"])],
    );
    assert!(verify(&exit).is_ok());

    let default = Tx::new(
        vec![owes("A", "C", 750_00)],
        vec![owes("A", "C", 750_00).with_lifecycle(Lifecycle::Defaulted)],
        vec![signed(ObligationCommand::SetLifecycle(Lifecycle::Defaulted), &["C"])],
    )
    .with_time(due() + Duration::days(2));
    assert!(verify(&default).is_ok());

    let early = Tx::new(
        vec![owes("A", "C", 750_00)],
        vec![owes("A", "C", 750_00).with_lifecycle(Lifecycle::Defaulted)],
        vec![signed(ObligationCommand::SetLifecycle(Lifecycle::Defaulted), &["C"])],
    )
    .with_time(due() - Duration::days(2));
    assert!(matches!(
        verify(&early),
        Err(VerificationError::Requirement { .. })
    ));
}

#[test]
fn generated_netting_round_trips_through_json() {
    let proposal = generate_payment_netting(vec![
        owes("A", "B", 100),
        owes("B", "C", 60),
        owes("C", "A", 30),
    ])
    .unwrap();
    let tx = proposal.into_signed_transaction();

    let json = serde_json::to_string(&tx).unwrap();
    let parsed: Tx = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed.id, tx.id);
    assert!(verify(&parsed).is_ok());
}

#[test]
fn empty_transaction_is_trivially_valid() {
    let tx = Tx::new(vec![], vec![], vec![]);
    assert!(verify(&tx).is_ok());
}
