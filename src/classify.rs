//! Maps recognition outcomes to grammaticality predictions.
//!
//! Label convention, fixed by the dataset: 0 = grammatical, 1 = ungrammatical.
//! A recognized sequence therefore predicts 0. Swapping the mapping would
//! silently invert precision and recall downstream.

use log::warn;

use crate::earley;
use crate::grammar::Grammar;

pub const GRAMMATICAL: u8 = 0;
pub const UNGRAMMATICAL: u8 = 1;

/// Recognition result to prediction label.
pub fn classify(recognized: bool) -> u8 {
    if recognized {
        GRAMMATICAL
    } else {
        UNGRAMMATICAL
    }
}

/// Run the recognizer on one token sequence and produce a prediction.
///
/// This is the single place where per-row anomalies are absorbed: a budget
/// fault counts as "not recognized" so one pathological row never aborts the
/// rest of the batch.
pub fn predict<S: AsRef<str>>(grammar: &Grammar, tokens: &[S], max_states: Option<usize>) -> u8 {
    let recognized = match earley::recognize_with_budget(grammar, tokens, max_states) {
        Ok(hit) => hit,
        Err(fault) => {
            warn!("treating row as ungrammatical: {}", fault);
            false
        }
    };
    classify(recognized)
}
