//! Partitioning of a transaction's states into independently verifiable groups.
//!
//! Two states land in the same group exactly when the caller's key
//! projection yields equal values for them. Groups come out in order of
//! the first state that produced each key (inputs before outputs), and the
//! states inside a group keep their original relative order, so the result
//! is fully deterministic for a given transaction.

use crate::core::transaction::TransactionForContract;
use std::collections::HashMap;
use std::hash::Hash;

/// The inputs and outputs sharing one grouping key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InOutGroup<S, K> {
    pub inputs: Vec<S>,
    pub outputs: Vec<S>,
    pub key: K,
}

impl<S, K> InOutGroup<S, K> {
    pub fn len(&self) -> usize {
        self.inputs.len() + self.outputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty() && self.outputs.is_empty()
    }
}

/// Group `inputs` and `outputs` by the key `key_of` derives from each state.
pub fn group_states<S, K, F>(inputs: &[S], outputs: &[S], key_of: F) -> Vec<InOutGroup<S, K>>
where
    S: Clone,
    K: Eq + Hash + Clone,
    F: Fn(&S) -> K,
{
    let mut slots: HashMap<K, usize> = HashMap::new();
    let mut groups: Vec<InOutGroup<S, K>> = Vec::new();

    let mut slot_for = |key: K, groups: &mut Vec<InOutGroup<S, K>>| -> usize {
        *slots.entry(key.clone()).or_insert_with(|| {
            groups.push(InOutGroup {
                inputs: Vec::new(),
                outputs: Vec::new(),
                key,
            });
            groups.len() - 1
        })
    };

    for state in inputs {
        let slot = slot_for(key_of(state), &mut groups);
        groups[slot].inputs.push(state.clone());
    }
    for state in outputs {
        let slot = slot_for(key_of(state), &mut groups);
        groups[slot].outputs.push(state.clone());
    }

    groups
}

impl<S: Clone, C> TransactionForContract<S, C> {
    /// Group this transaction's inputs and outputs by `key_of`.
    pub fn group_states<K, F>(&self, key_of: F) -> Vec<InOutGroup<S, K>>
    where
        K: Eq + Hash + Clone,
        F: Fn(&S) -> K,
    {
        group_states(&self.inputs, &self.outputs, key_of)
    }
}
