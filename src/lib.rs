//! Grammaticality classification over part-of-speech tag sequences.
//!
//! A CFG is loaded once per run, an Earley recognizer decides membership for
//! each row's POS sequence, and recognition success maps to the prediction
//! label 0 (grammatical). Predictions are scored against ground truth with a
//! confusion matrix and precision/recall.

pub mod classify;
pub mod dataset;
pub mod earley;
pub mod eval;
pub mod grammar;

pub use classify::{classify, predict};
pub use earley::{recognize, recognize_with_budget, RecognitionFault};
pub use eval::{Confusion, Metrics};
pub use grammar::{Grammar, GrammarError, Production, SymbolId};
