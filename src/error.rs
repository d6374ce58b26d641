//! Rejection reasons for transaction verification.
//!
//! Every variant is terminal: a transaction that produces any of these is
//! invalid as a whole. Variants carry the clause, group key and rule text
//! needed to reconstruct why a transaction was refused.

use crate::core::amount::AmountError;
use crate::core::party::PublicKey;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerificationError {
    /// Wrong command cardinality, or states that should share terms do not.
    #[error("structural violation in {context}: {reason}")]
    Structural { context: String, reason: String },

    /// Input and output balances differ for a netting group.
    #[error("amounts owed on input and output must match in group {group}: input {input}, output {output}")]
    Conservation {
        group: String,
        input: String,
        output: String,
    },

    /// The signer set does not satisfy the rule for this command.
    #[error("insufficient signatures in {context}: {reason} (missing {})", display_keys(.missing))]
    Authorization {
        context: String,
        reason: String,
        missing: Vec<PublicKey>,
    },

    /// A command was present but no clause processed it.
    #[error("no clause processed command {command}")]
    UnclaimedCommand { command: String },

    #[error("arithmetic failure: {0}")]
    Arithmetic(#[from] AmountError),

    /// A clause declared `MatchBehaviour::Error` for the outcome it reached.
    #[error("clause {clause} {outcome} but is configured to reject that outcome")]
    ClauseMustMatch { clause: String, outcome: String },

    /// Two clauses in the same evaluation both claimed one command.
    #[error("command {command} claimed by {clause} was already claimed in this group")]
    CommandClaimedTwice { clause: String, command: String },

    /// A composite clause found none of its children applicable.
    #[error("no sub-clause of {clause} matched the commands present")]
    NoClauseMatched { clause: String },

    /// A named contract rule evaluated false.
    #[error("failed requirement in {clause}: {rule}")]
    Requirement { clause: String, rule: String },
}

fn display_keys(keys: &[PublicKey]) -> String {
    let rendered: Vec<&str> = keys.iter().map(PublicKey::as_str).collect();
    format!("[{}]", rendered.join(", "))
}

/// Fail with [`VerificationError::Requirement`] unless `condition` holds.
pub fn require_that(condition: bool, clause: &str, rule: &str) -> Result<(), VerificationError> {
    if condition {
        Ok(())
    } else {
        Err(VerificationError::Requirement {
            clause: clause.to_string(),
            rule: rule.to_string(),
        })
    }
}
