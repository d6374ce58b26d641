//! Balance accounting for netting: who owes whom, and each party's net position.

use crate::core::amount::{Amount, AmountError, Token};
use crate::core::party::PublicKey;
use crate::error::VerificationError;
use crate::obligation::state::ObligationState;
use crate::obligation::terms::Terms;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Aggregated amounts owed from each obligor key to each beneficiary key.
///
/// Several states between the same ordered pair collapse into one entry
/// holding their sum. Built fresh per verification and then discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceMatrix<P> {
    template: Terms<P>,
    entries: BTreeMap<(PublicKey, PublicKey), Amount<Terms<P>>>,
}

impl<P: Token> BalanceMatrix<P> {
    /// Sum the amounts due between each (obligor, beneficiary) pair in `states`.
    ///
    /// Every state is counted against `template`; callers check that the
    /// states actually carry it.
    pub fn extract(
        template: &Terms<P>,
        states: &[ObligationState<P>],
    ) -> Result<Self, VerificationError> {
        let mut entries: BTreeMap<(PublicKey, PublicKey), Amount<Terms<P>>> = BTreeMap::new();

        for state in states {
            let key = (state.obligor.owning_key.clone(), state.beneficiary.clone());
            let amount = Amount::new(state.quantity, template.clone());
            let total = match entries.get(&key) {
                Some(existing) => existing.checked_add(&amount)?,
                None => amount,
            };
            entries.insert(key, total);
        }

        Ok(Self {
            template: template.clone(),
            entries,
        })
    }

    pub fn template(&self) -> &Terms<P> {
        &self.template
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Aggregated quantity owed by `obligor` to `beneficiary`.
    pub fn edge_amount(&self, obligor: &PublicKey, beneficiary: &PublicKey) -> u64 {
        self.entries
            .get(&(obligor.clone(), beneficiary.clone()))
            .map(Amount::quantity)
            .unwrap_or(0)
    }

    /// All entries as (obligor, beneficiary, amount).
    pub fn entries(&self) -> impl Iterator<Item = (&PublicKey, &PublicKey, &Amount<Terms<P>>)> {
        self.entries.iter().map(|((o, b), amount)| (o, b, amount))
    }

    /// Sum of every entry.
    pub fn gross_total(&self) -> Result<Amount<Terms<P>>, VerificationError> {
        Ok(Amount::sum_or_zero(
            self.entries.values().cloned(),
            self.template.clone(),
        )?)
    }

    /// Reduce the matrix to each party's net position: what it is owed
    /// minus what it owes. Parties that come out flat are omitted.
    pub fn net_positions(&self) -> Result<NetPositions, VerificationError> {
        let mut positions = NetPositions::new();
        for ((obligor, beneficiary), amount) in &self.entries {
            positions.apply(obligor, beneficiary, amount.quantity())?;
        }
        positions.strip_flat();
        Ok(positions)
    }

    /// Offset each pair's debts against each other, leaving at most one
    /// direction per pair.
    ///
    /// If A owes B 100 and B owes A 60, the result holds A owes B 40.
    pub fn net_amounts_due(&self) -> BTreeMap<(PublicKey, PublicKey), u64> {
        let mut netted = BTreeMap::new();
        let mut seen: BTreeSet<(PublicKey, PublicKey)> = BTreeSet::new();

        for (obligor, beneficiary) in self.entries.keys() {
            let pair = if obligor <= beneficiary {
                (obligor.clone(), beneficiary.clone())
            } else {
                (beneficiary.clone(), obligor.clone())
            };
            if !seen.insert(pair) {
                continue;
            }

            let forward = self.edge_amount(obligor, beneficiary);
            let backward = self.edge_amount(beneficiary, obligor);
            if forward > backward {
                netted.insert((obligor.clone(), beneficiary.clone()), forward - backward);
            } else if backward > forward {
                netted.insert((beneficiary.clone(), obligor.clone()), backward - forward);
            }
        }

        netted
    }
}

/// Net position of each party.
///
/// A positive balance means the party is owed (net creditor); a negative
/// balance means it owes (net debtor). Two position sets compare equal when
/// every party's net position matches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NetPositions {
    positions: BTreeMap<PublicKey, i128>,
}

impl NetPositions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one debt: the obligor loses `quantity`, the beneficiary gains it.
    pub fn apply(
        &mut self,
        obligor: &PublicKey,
        beneficiary: &PublicKey,
        quantity: u64,
    ) -> Result<(), VerificationError> {
        let debit = self.positions.entry(obligor.clone()).or_insert(0);
        *debit = debit
            .checked_sub(i128::from(quantity))
            .ok_or_else(|| position_overflow(obligor))?;

        let credit = self.positions.entry(beneficiary.clone()).or_insert(0);
        *credit = credit
            .checked_add(i128::from(quantity))
            .ok_or_else(|| position_overflow(beneficiary))?;
        Ok(())
    }

    fn strip_flat(&mut self) {
        self.positions.retain(|_, amount| *amount != 0);
    }

    /// Net position of `party`; zero if it does not appear.
    pub fn position(&self, party: &PublicKey) -> i128 {
        self.positions.get(party).copied().unwrap_or(0)
    }

    pub fn positions(&self) -> &BTreeMap<PublicKey, i128> {
        &self.positions
    }

    pub fn is_empty(&self) -> bool {
        self.positions.values().all(|amount| *amount == 0)
    }

    /// Sum of all positions is zero: every debit has a matching credit.
    pub fn is_balanced(&self) -> bool {
        self.positions.values().sum::<i128>() == 0
    }

    /// Total that must actually move to settle: the sum of positive positions.
    pub fn total_net_settlement(&self) -> i128 {
        self.positions.values().filter(|v| **v > 0).sum()
    }

    /// Net debtors with the amount each owes, in key order.
    pub fn debtors(&self) -> Vec<(PublicKey, i128)> {
        self.positions
            .iter()
            .filter(|(_, v)| **v < 0)
            .map(|(k, v)| (k.clone(), -v))
            .collect()
    }

    /// Net creditors with the amount each is owed, in key order.
    pub fn creditors(&self) -> Vec<(PublicKey, i128)> {
        self.positions
            .iter()
            .filter(|(_, v)| **v > 0)
            .map(|(k, v)| (k.clone(), *v))
            .collect()
    }
}

fn position_overflow(party: &PublicKey) -> VerificationError {
    VerificationError::Arithmetic(AmountError::PositionOverflow {
        party: party.to_string(),
    })
}

impl fmt::Display for NetPositions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self
            .positions
            .iter()
            .map(|(party, amount)| format!("{}: {}", party, amount))
            .collect();
        write!(f, "{{{}}}", rendered.join(", "))
    }
}
