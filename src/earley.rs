//! Earley recognizer for arbitrary CFGs, including epsilon productions and
//! (indirect) left recursion.
//!
//! This is a membership test, not a parser: the chart holds dotted states but
//! no back-pointers, and recognition short-circuits as soon as one completed
//! start-symbol state spanning the whole input is found. Worst case is the
//! standard O(n^3 * |G|) Earley bound, fine for sentence-length inputs and
//! teaching-scale grammars.

use std::collections::HashSet;
use std::fmt;

use log::debug;

use crate::grammar::{Grammar, SymbolId, SymbolKind};

/// A dotted production: `prod` with `dot` symbols already matched, started
/// at input position `origin`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct State {
    prod: usize,
    dot: usize,
    origin: usize,
}

/// Recoverable recognizer failure. Folded into a negative prediction by the
/// classifier, never propagated out of a batch run.
#[derive(Debug)]
pub enum RecognitionFault {
    /// The chart grew past the configured state budget.
    BudgetExhausted { states: usize },
}

impl fmt::Display for RecognitionFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecognitionFault::BudgetExhausted { states } => {
                write!(f, "recognition aborted after {} chart states", states)
            }
        }
    }
}

impl std::error::Error for RecognitionFault {}

/// Decide whether `tokens` is in the grammar's language. Never faults.
pub fn recognize<S: AsRef<str>>(grammar: &Grammar, tokens: &[S]) -> bool {
    recognize_with_budget(grammar, tokens, None).unwrap_or(false)
}

/// Membership test with an optional cap on total chart states, as a guard
/// against pathological grammar/input pairs.
pub fn recognize_with_budget<S: AsRef<str>>(
    grammar: &Grammar,
    tokens: &[S],
    max_states: Option<usize>,
) -> Result<bool, RecognitionFault> {
    // Resolve tokens against the terminal index up front; a single
    // out-of-vocabulary token can never be scanned, so the sequence is
    // unrecognizable without building any chart.
    let mut input: Vec<SymbolId> = Vec::with_capacity(tokens.len());
    for tok in tokens {
        match grammar.terminal_id(tok.as_ref()) {
            Some(id) => input.push(id),
            None => {
                debug!("token '{}' is not a terminal of the grammar", tok.as_ref());
                return Ok(false);
            }
        }
    }

    let n = input.len();
    let mut chart: Vec<Vec<State>> = vec![Vec::new(); n + 1];
    let mut seen: Vec<HashSet<State>> = vec![HashSet::new(); n + 1];
    let mut total = 0usize;

    fn push(
        chart: &mut [Vec<State>],
        seen: &mut [HashSet<State>],
        total: &mut usize,
        pos: usize,
        state: State,
    ) {
        if seen[pos].insert(state) {
            chart[pos].push(state);
            *total += 1;
        }
    }

    for &p in grammar.prods_of(grammar.start_id()) {
        let state = State { prod: p, dot: 0, origin: 0 };
        push(&mut chart, &mut seen, &mut total, 0, state);
    }

    for i in 0..=n {
        // The worklist is the position's own state list; states appended
        // during processing are picked up by the growing index bound.
        let mut idx = 0;
        while idx < chart[i].len() {
            let st = chart[i][idx];
            idx += 1;

            if let Some(budget) = max_states {
                if total > budget {
                    return Err(RecognitionFault::BudgetExhausted { states: total });
                }
            }

            let prod = grammar.production(st.prod);
            match prod.rhs.get(st.dot) {
                // Predict
                Some(&next) if grammar.kind(next) == SymbolKind::Nonterminal => {
                    for &p in grammar.prods_of(next) {
                        let state = State { prod: p, dot: 0, origin: i };
                        push(&mut chart, &mut seen, &mut total, i, state);
                    }
                    // Nullable fix (Aycock & Horspool): a nullable prediction
                    // may complete invisibly at this same position, so advance
                    // the predictor's dot directly. Without this, states
                    // predicted after the epsilon completion fires are missed.
                    if grammar.is_nullable(next) {
                        let state = State { prod: st.prod, dot: st.dot + 1, origin: st.origin };
                        push(&mut chart, &mut seen, &mut total, i, state);
                    }
                }
                // Scan
                Some(&next) => {
                    if i < n && input[i] == next {
                        let state = State { prod: st.prod, dot: st.dot + 1, origin: st.origin };
                        push(&mut chart, &mut seen, &mut total, i + 1, state);
                    }
                }
                // Complete
                None => {
                    let lhs = prod.lhs;
                    if i == n && st.origin == 0 && lhs == grammar.start_id() {
                        // One derivation is enough; stop here.
                        return Ok(true);
                    }
                    let mut j = 0;
                    while j < chart[st.origin].len() {
                        let parent = chart[st.origin][j];
                        j += 1;
                        let parent_prod = grammar.production(parent.prod);
                        if parent_prod.rhs.get(parent.dot) == Some(&lhs) {
                            let state = State {
                                prod: parent.prod,
                                dot: parent.dot + 1,
                                origin: parent.origin,
                            };
                            push(&mut chart, &mut seen, &mut total, i, state);
                        }
                    }
                }
            }
        }
    }

    Ok(false)
}
