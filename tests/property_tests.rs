use chrono::{TimeZone, Utc};
use netting_verifier::prelude::*;
use proptest::prelude::*;

type State = ObligationState<CurrencyCode>;
type Command = ObligationCommand<CurrencyCode>;
type Tx = TransactionForContract<State, Command>;

fn terms(currency: &str) -> Terms<CurrencyCode> {
    let bank = Party::new("MegaBank", PublicKey::new("key-megabank"));
    Terms::new(
        vec!["obligation-v1".to_string()],
        vec![Issued::new(bank.reference(vec![1]), CurrencyCode::new(currency))],
        Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap(),
    )
    .unwrap()
}

fn party(name: &str) -> Party {
    Party::new(name, PublicKey::new(format!("key-{}", name)))
}

/// Generate a random party name from a small pool (to increase netting overlap).
fn arb_party() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec!["a", "b", "c", "d", "e", "f"])
}

/// Generate a random currency from a small pool.
fn arb_currency() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec!["USD", "GBP", "JPY"])
}

/// Generate a random obligation (ensuring obligor != beneficiary).
fn arb_obligation() -> impl Strategy<Value = State> {
    (arb_party(), arb_party(), 1u64..10_000_000u64, arb_currency()).prop_filter_map(
        "obligor must differ from beneficiary",
        |(obligor, beneficiary, quantity, currency)| {
            (obligor != beneficiary).then(|| {
                ObligationState::new(
                    party(obligor),
                    terms(currency),
                    quantity,
                    party(beneficiary).owning_key,
                )
            })
        },
    )
}

/// Obligations that all share USD terms.
fn arb_usd_obligation() -> impl Strategy<Value = State> {
    (arb_party(), arb_party(), 1u64..10_000_000u64).prop_filter_map(
        "obligor must differ from beneficiary",
        |(obligor, beneficiary, quantity)| {
            (obligor != beneficiary).then(|| {
                ObligationState::new(party(obligor), terms("USD"), quantity, party(beneficiary).owning_key)
            })
        },
    )
}

proptest! {
    /// Every state lands in exactly one group, with its role preserved,
    /// and every member of a group shares the group's key.
    #[test]
    fn grouping_partitions_states(
        inputs in prop::collection::vec(arb_obligation(), 0..20),
        outputs in prop::collection::vec(arb_obligation(), 0..20),
    ) {
        let groups = group_states(&inputs, &outputs, State::bilateral_net_state);

        let total: usize = groups.iter().map(InOutGroup::len).sum();
        prop_assert_eq!(total, inputs.len() + outputs.len());

        for group in &groups {
            for state in group.inputs.iter().chain(&group.outputs) {
                prop_assert_eq!(&state.bilateral_net_state(), &group.key);
            }
        }

        for (i, a) in groups.iter().enumerate() {
            for b in groups.iter().skip(i + 1) {
                prop_assert_ne!(&a.key, &b.key);
            }
        }

        let regathered: Vec<State> = groups.iter().flat_map(|g| g.inputs.clone()).collect();
        prop_assert_eq!(regathered.len(), inputs.len());
    }

    /// Regrouping one group's own states yields exactly that group.
    #[test]
    fn regrouping_is_idempotent(
        inputs in prop::collection::vec(arb_obligation(), 1..20),
        outputs in prop::collection::vec(arb_obligation(), 0..20),
    ) {
        for group in group_states(&inputs, &outputs, State::multilateral_net_state) {
            let again = group_states(&group.inputs, &group.outputs, State::multilateral_net_state);
            prop_assert_eq!(again.len(), 1);
            prop_assert_eq!(&again[0], &group);
        }
    }

    /// Net positions always sum to zero.
    #[test]
    fn net_positions_balance(obligations in prop::collection::vec(arb_usd_obligation(), 0..40)) {
        let positions = BalanceMatrix::extract(&terms("USD"), &obligations)
            .unwrap()
            .net_positions()
            .unwrap();
        prop_assert!(positions.is_balanced());
        let debt: i128 = positions.debtors().iter().map(|(_, v)| *v).sum();
        prop_assert_eq!(debt, positions.total_net_settlement());
    }

    /// Generated payment netting is accepted once every party signs, and
    /// never increases the total owed.
    #[test]
    fn generated_payment_netting_verifies(obligations in prop::collection::vec(arb_usd_obligation(), 1..40)) {
        let proposal = generate_payment_netting(obligations).unwrap();
        prop_assert!(proposal.net_total().unwrap().quantity() <= proposal.gross_total().unwrap().quantity());

        let tx = proposal.into_signed_transaction();
        prop_assert!(ObligationContract::new().verify(&tx).is_ok());
    }

    /// Changing any output by a single unit breaks conservation.
    #[test]
    fn one_unit_change_rejected(
        obligations in prop::collection::vec(arb_usd_obligation(), 1..40),
        bump_up in any::<bool>(),
        pick in any::<prop::sample::Index>(),
    ) {
        let mut tx: Tx = generate_payment_netting(obligations).unwrap().into_signed_transaction();
        prop_assume!(!tx.outputs.is_empty());

        let idx = pick.index(tx.outputs.len());
        let output = &mut tx.outputs[idx];
        if bump_up {
            output.quantity += 1;
        } else {
            prop_assume!(output.quantity > 1);
            output.quantity -= 1;
        }

        let result = ObligationContract::new().verify(&tx);
        prop_assert!(
            matches!(result, Err(VerificationError::Conservation { .. })),
            "expected conservation failure, got {:?}",
            result
        );
    }

    /// Verification depends only on the transaction's content.
    #[test]
    fn verification_is_deterministic(
        inputs in prop::collection::vec(arb_obligation(), 0..15),
        outputs in prop::collection::vec(arb_obligation(), 0..15),
        payment in any::<bool>(),
    ) {
        let net_type = if payment { NetType::Payment } else { NetType::CloseOut };
        let signers: Vec<PublicKey> = ["a", "b", "c"].iter().map(|n| party(n).owning_key).collect();
        let tx = Tx::new(
            inputs,
            outputs,
            vec![AuthenticatedCommand::new(ObligationCommand::Net(net_type), signers)],
        );

        let contract = ObligationContract::new();
        let first = contract.verify(&tx);
        let second = contract.verify(&tx.clone());
        prop_assert_eq!(first, second);
    }
}
