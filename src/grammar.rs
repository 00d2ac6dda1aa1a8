//! In-memory CFG model and text loader.
//!
//! Grammars are written one or more productions per line in the usual
//! `LHS -> RHS1 RHS2 ... | RHS3 ...` form. Blank lines and `#` comment lines
//! are ignored. Terminals may be quoted (`'DT'`); unquoted symbols that never
//! appear on a left-hand side are treated as terminals by convention, since
//! POS tags are plain tokens in most hand-authored grammar files.

use std::collections::HashMap;
use std::fmt;

/// Interned handle for a grammar symbol; the `Grammar` owns the string table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SymbolId(usize);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SymbolKind {
    Terminal,
    Nonterminal,
}

/// A single rewrite rule. An empty `rhs` is an epsilon production.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Production {
    pub lhs: SymbolId,
    pub rhs: Vec<SymbolId>,
}

/// Errors raised while parsing a grammar description.
#[derive(Debug)]
pub enum GrammarError {
    /// No productions found in the input text.
    Empty,
    /// A production line without the `->` separator.
    MissingArrow { line: usize },
    /// Nothing to the left of `->`.
    EmptyLhs { line: usize },
    /// More than one token to the left of `->`.
    MultiTokenLhs { line: usize, lhs: String },
    /// A quoted (terminal) symbol used as a left-hand side.
    QuotedLhs { line: usize, lhs: String },
    /// The same symbol used both quoted (terminal) and as a nonterminal.
    KindConflict { line: usize, symbol: String },
}

impl fmt::Display for GrammarError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GrammarError::Empty => write!(f, "grammar contains no productions"),
            GrammarError::MissingArrow { line } => {
                write!(f, "line {}: production is missing the '->' separator", line)
            }
            GrammarError::EmptyLhs { line } => {
                write!(f, "line {}: production has an empty left-hand side", line)
            }
            GrammarError::MultiTokenLhs { line, lhs } => {
                write!(f, "line {}: left-hand side '{}' must be a single symbol", line, lhs)
            }
            GrammarError::QuotedLhs { line, lhs } => {
                write!(f, "line {}: quoted terminal '{}' cannot appear as a left-hand side", line, lhs)
            }
            GrammarError::KindConflict { line, symbol } => {
                write!(
                    f,
                    "line {}: symbol '{}' is used both as a terminal and a nonterminal",
                    line, symbol
                )
            }
        }
    }
}

impl std::error::Error for GrammarError {}

/// A context-free grammar with interned symbols and a fixed start symbol.
///
/// Immutable after `load`; safe to share by reference across worker threads.
#[derive(Debug)]
pub struct Grammar {
    names: Vec<String>,
    kinds: Vec<SymbolKind>,
    ids: HashMap<String, SymbolId>,
    productions: Vec<Production>,
    by_lhs: Vec<Vec<usize>>,
    nullable: Vec<bool>,
    start: SymbolId,
}

#[derive(Default)]
struct SymbolTable {
    names: Vec<String>,
    kinds: Vec<SymbolKind>,
    ids: HashMap<String, SymbolId>,
}

impl SymbolTable {
    fn intern(&mut self, name: &str, kind: SymbolKind) -> SymbolId {
        if let Some(&id) = self.ids.get(name) {
            return id;
        }
        let id = SymbolId(self.names.len());
        self.names.push(name.to_string());
        self.kinds.push(kind);
        self.ids.insert(name.to_string(), id);
        id
    }
}

/// Raw right-hand-side token before symbol kinds are known.
struct RawToken {
    text: String,
    quoted: bool,
}

/// One production as written, before interning.
struct RawProduction {
    line: usize,
    lhs: String,
    rhs: Vec<RawToken>,
}

fn unquote(token: &str) -> Option<&str> {
    let bytes = token.as_bytes();
    if bytes.len() >= 2 {
        let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
        if (first == b'\'' && last == b'\'') || (first == b'"' && last == b'"') {
            return Some(&token[1..token.len() - 1]);
        }
    }
    None
}

impl Grammar {
    /// Parse a grammar from its textual description.
    pub fn load(text: &str) -> Result<Grammar, GrammarError> {
        let raw = parse_lines(text)?;
        if raw.is_empty() {
            return Err(GrammarError::Empty);
        }
        Grammar::build(raw)
    }

    fn build(raw: Vec<RawProduction>) -> Result<Grammar, GrammarError> {
        let mut table = SymbolTable::default();

        // Left-hand sides first, so every defined symbol is a nonterminal
        // before right-hand sides are classified.
        for prod in &raw {
            table.intern(&prod.lhs, SymbolKind::Nonterminal);
        }

        let mut productions: Vec<Production> = Vec::with_capacity(raw.len());
        for prod in &raw {
            let lhs = table.ids[&prod.lhs];
            let mut rhs = Vec::with_capacity(prod.rhs.len());
            for tok in &prod.rhs {
                let id = table.intern(&tok.text, SymbolKind::Terminal);
                if tok.quoted && table.kinds[id.0] == SymbolKind::Nonterminal {
                    return Err(GrammarError::KindConflict {
                        line: prod.line,
                        symbol: tok.text.clone(),
                    });
                }
                rhs.push(id);
            }
            productions.push(Production { lhs, rhs });
        }

        let mut by_lhs: Vec<Vec<usize>> = vec![Vec::new(); table.names.len()];
        for (i, prod) in productions.iter().enumerate() {
            by_lhs[prod.lhs.0].push(i);
        }

        let nullable = compute_nullable(table.names.len(), &productions);
        let start = productions[0].lhs;

        Ok(Grammar {
            names: table.names,
            kinds: table.kinds,
            ids: table.ids,
            productions,
            by_lhs,
            nullable,
            start,
        })
    }

    /// Name of the start symbol (left-hand side of the first production).
    pub fn start_symbol(&self) -> &str {
        &self.names[self.start.0]
    }

    pub fn start_id(&self) -> SymbolId {
        self.start
    }

    /// True if the symbol is known to the grammar and classified terminal.
    pub fn is_terminal(&self, symbol: &str) -> bool {
        self.ids
            .get(symbol)
            .map(|id| self.kinds[id.0] == SymbolKind::Terminal)
            .unwrap_or(false)
    }

    /// Resolve a token to its id, only if it is a terminal of this grammar.
    ///
    /// Out-of-vocabulary tokens resolve to `None`, which lets callers reject
    /// a sequence before building any chart.
    pub fn terminal_id(&self, token: &str) -> Option<SymbolId> {
        self.ids
            .get(token)
            .copied()
            .filter(|id| self.kinds[id.0] == SymbolKind::Terminal)
    }

    pub fn kind(&self, id: SymbolId) -> SymbolKind {
        self.kinds[id.0]
    }

    pub fn symbol_name(&self, id: SymbolId) -> &str {
        &self.names[id.0]
    }

    /// Whether the nonterminal can derive the empty string.
    pub fn is_nullable(&self, id: SymbolId) -> bool {
        self.nullable[id.0]
    }

    /// Productions with the given nonterminal on the left, in file order.
    pub fn productions_for<'a>(
        &'a self,
        nonterminal: &str,
    ) -> impl Iterator<Item = &'a Production> + 'a {
        let indices = self
            .ids
            .get(nonterminal)
            .map(|id| self.by_lhs[id.0].as_slice())
            .unwrap_or(&[]);
        indices.iter().map(move |&i| &self.productions[i])
    }

    /// Indices into the production table for a nonterminal, in file order.
    pub(crate) fn prods_of(&self, id: SymbolId) -> &[usize] {
        &self.by_lhs[id.0]
    }

    pub(crate) fn production(&self, index: usize) -> &Production {
        &self.productions[index]
    }
}

fn parse_lines(text: &str) -> Result<Vec<RawProduction>, GrammarError> {
    let mut out = Vec::new();
    for (lineno, line) in text.lines().enumerate() {
        let lineno = lineno + 1;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let (lhs_part, rhs_part) = match line.split_once("->") {
            Some(parts) => parts,
            None => return Err(GrammarError::MissingArrow { line: lineno }),
        };
        let lhs_part = lhs_part.trim();
        if lhs_part.is_empty() {
            return Err(GrammarError::EmptyLhs { line: lineno });
        }
        if lhs_part.split_whitespace().count() > 1 {
            return Err(GrammarError::MultiTokenLhs {
                line: lineno,
                lhs: lhs_part.to_string(),
            });
        }
        if unquote(lhs_part).is_some() {
            return Err(GrammarError::QuotedLhs {
                line: lineno,
                lhs: lhs_part.to_string(),
            });
        }

        // Alternatives are separated by bare '|' tokens; a quoted '|' is an
        // ordinary terminal. An empty alternative is an epsilon production.
        let mut alternatives: Vec<Vec<RawToken>> = vec![Vec::new()];
        for tok in rhs_part.split_whitespace() {
            if tok == "|" {
                alternatives.push(Vec::new());
                continue;
            }
            let (text, quoted) = match unquote(tok) {
                Some(inner) => (inner.to_string(), true),
                None => (tok.to_string(), false),
            };
            alternatives.last_mut().unwrap().push(RawToken { text, quoted });
        }
        for rhs in alternatives {
            out.push(RawProduction {
                line: lineno,
                lhs: lhs_part.to_string(),
                rhs,
            });
        }
    }
    Ok(out)
}

fn compute_nullable(symbol_count: usize, productions: &[Production]) -> Vec<bool> {
    let mut nullable = vec![false; symbol_count];
    let mut changed = true;
    while changed {
        changed = false;
        for prod in productions {
            if nullable[prod.lhs.0] {
                continue;
            }
            if prod.rhs.iter().all(|sym| nullable[sym.0]) {
                nullable[prod.lhs.0] = true;
                changed = true;
            }
        }
    }
    nullable
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOY: &str = "\
        # toy noun-phrase grammar\n\
        S -> NP VP\n\
        NP -> DT NN\n\
        VP -> VBZ\n";

    #[test]
    fn loads_toy_grammar() {
        let g = Grammar::load(TOY).unwrap();
        assert_eq!(g.start_symbol(), "S");
        assert!(g.is_terminal("DT"));
        assert!(g.is_terminal("NN"));
        assert!(g.is_terminal("VBZ"));
        assert!(!g.is_terminal("NP"));
        assert_eq!(g.productions_for("S").count(), 1);
        assert_eq!(g.productions_for("NP").count(), 1);
    }

    #[test]
    fn alternatives_expand_to_separate_productions() {
        let g = Grammar::load("S -> A B | C\nA -> x\nB -> y\nC -> z").unwrap();
        let prods: Vec<_> = g.productions_for("S").collect();
        assert_eq!(prods.len(), 2);
        assert_eq!(prods[0].rhs.len(), 2);
        assert_eq!(prods[1].rhs.len(), 1);
    }

    #[test]
    fn quoted_terminals_are_stripped() {
        let g = Grammar::load("S -> 'DT' \"NN\"").unwrap();
        assert!(g.is_terminal("DT"));
        assert!(g.is_terminal("NN"));
    }

    #[test]
    fn empty_alternative_is_epsilon() {
        let g = Grammar::load("S -> A S |\nA -> a").unwrap();
        assert!(g.is_nullable(g.start_id()));
        let epsilons = g.productions_for("S").filter(|p| p.rhs.is_empty()).count();
        assert_eq!(epsilons, 1);
    }

    #[test]
    fn nullability_propagates_through_chains() {
        let g = Grammar::load("S -> A B\nA -> |\nB -> A A").unwrap();
        assert!(g.is_nullable(g.start_id()));
    }

    #[test]
    fn undefined_rhs_symbol_is_a_terminal() {
        // Lazy policy: a symbol with no productions is a terminal.
        let g = Grammar::load("S -> Missing").unwrap();
        assert!(g.is_terminal("Missing"));
    }

    #[test]
    fn rejects_empty_text_and_comment_only_text() {
        assert!(matches!(Grammar::load(""), Err(GrammarError::Empty)));
        assert!(matches!(
            Grammar::load("# nothing here\n\n"),
            Err(GrammarError::Empty)
        ));
    }

    #[test]
    fn rejects_missing_arrow() {
        assert!(matches!(
            Grammar::load("S NP VP"),
            Err(GrammarError::MissingArrow { line: 1 })
        ));
    }

    #[test]
    fn rejects_multi_token_lhs() {
        assert!(matches!(
            Grammar::load("S NP -> VP"),
            Err(GrammarError::MultiTokenLhs { .. })
        ));
    }

    #[test]
    fn rejects_quoted_lhs() {
        assert!(matches!(
            Grammar::load("'DT' -> x"),
            Err(GrammarError::QuotedLhs { .. })
        ));
    }

    #[test]
    fn rejects_symbol_used_as_both_kinds() {
        assert!(matches!(
            Grammar::load("S -> 'NP'\nNP -> DT"),
            Err(GrammarError::KindConflict { .. })
        ));
    }
}
