//! Automaton builder: cross-reference validation and derived attributes.
//!
//! Takes the raw description record and resolves every name against the
//! declared sets, producing an immutable machine indexed by dense state
//! ids. All the invariants live here: membership of the initial and final
//! states, transition endpoints, input and stack symbols, per-(state,
//! symbol) uniqueness for DFAs, and the dead-end rule – a state with no
//! outgoing transitions must be final. States that never appear on the
//! left of a transition still get an (empty) edge list so the emitters can
//! iterate uniformly.

use crate::error::{CompileError, CompileResult};
use crate::parser::{Flavor, RawDescription, RawTransition};
use rustc_hash::{FxHashMap, FxHashSet};

/// Input symbol position of a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputSym {
  /// A concrete alphabet symbol.
  Sym(char),
  /// The `$` end-of-input marker.
  End,
  /// No symbol consumed.
  Epsilon,
}

impl InputSym {
  pub fn consumes(self) -> bool {
    !matches!(self, InputSym::Epsilon)
  }
}

/// Counter-state guard of a one-counter transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterGuard {
  Any,
  Zero,
  Positive,
}

/// Counter action of a one-counter transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterAction {
  Nop,
  Inc,
  Dec,
}

#[derive(Debug, Clone)]
pub struct DfaEdge {
  pub sym: char,
  pub to: usize,
}

#[derive(Debug, Clone)]
pub struct CtrEdge {
  pub sym: InputSym,
  pub guard: CounterGuard,
  pub to: usize,
  pub action: CounterAction,
}

/// Raw pushdown transition; `push` is the full replacement string with the
/// new top last. Atomization happens in a separate pass.
#[derive(Debug, Clone)]
pub struct DpdaEdge {
  pub sym: InputSym,
  pub top: char,
  pub to: usize,
  pub push: Vec<char>,
}

#[derive(Debug, Clone)]
pub struct Dfa {
  pub alphabet: Vec<char>,
  pub states: Vec<String>,
  pub initial: usize,
  pub is_final: Vec<bool>,
  pub edges: Vec<Vec<DfaEdge>>,
}

#[derive(Debug, Clone)]
pub struct Ctr {
  pub alphabet: Vec<char>,
  pub states: Vec<String>,
  pub initial: usize,
  pub is_final: Vec<bool>,
  pub edges: Vec<Vec<CtrEdge>>,
  /// True iff some ε-transition enters the state; such states additionally
  /// get a `_no_consume` header that dispatches without reading.
  pub eps_entry: Vec<bool>,
}

#[derive(Debug, Clone)]
pub struct Dpda {
  pub alphabet: Vec<char>,
  pub states: Vec<String>,
  pub initial: usize,
  pub is_final: Vec<bool>,
  pub stack: Vec<char>,
  pub bottom: char,
  pub edges: Vec<Vec<DpdaEdge>>,
}

/// A validated machine of any flavor.
#[derive(Debug, Clone)]
pub enum Automaton {
  Dfa(Dfa),
  Ctr(Ctr),
  Dpda(Dpda),
}

/// Validate the raw description into a machine, or fail on the first
/// violated invariant.
pub fn build(raw: &RawDescription, source: &str) -> CompileResult<Automaton> {
  let alphabet = SymbolSet::from_raw(&raw.alphabet, "alphabet", source)?;
  if alphabet.symbols.is_empty() {
    return Err(CompileError::invalid("alphabet must not be empty"));
  }
  let states = StateTable::from_raw(&raw.states, source)?;

  let initial = states.resolve(&raw.initial.0, source, raw.initial.1)?;
  let mut is_final = vec![false; states.names.len()];
  for (name, loc) in &raw.finals {
    is_final[states.resolve(name, source, *loc)?] = true;
  }

  match raw.flavor {
    Flavor::Dfa => build_dfa(raw, source, alphabet, states, initial, is_final),
    Flavor::Ctr => build_ctr(raw, source, alphabet, states, initial, is_final),
    Flavor::Dpda => build_dpda(raw, source, alphabet, states, initial, is_final),
  }
}

fn build_dfa(
  raw: &RawDescription,
  source: &str,
  alphabet: SymbolSet,
  states: StateTable,
  initial: usize,
  is_final: Vec<bool>,
) -> CompileResult<Automaton> {
  let mut edges: Vec<Vec<DfaEdge>> = vec![Vec::new(); states.names.len()];
  let mut seen: FxHashSet<(usize, char)> = FxHashSet::default();

  for trans in &raw.transitions {
    let RawTransition::Dfa { from, sym, to, loc } = trans else {
      unreachable!("parser only yields DFA transitions for kind=dfa");
    };
    let from = states.resolve(from, source, *loc)?;
    let to = states.resolve(to, source, *loc)?;
    let sym = alphabet.resolve(sym, source, *loc)?;
    if !seen.insert((from, sym)) {
      return Err(CompileError::at(
        source,
        *loc,
        format!("Duplicate transition ({},{sym})", states.names[from]),
      ));
    }
    edges[from].push(DfaEdge { sym, to });
  }

  reject_dead_ends(&states.names, &is_final, |q| edges[q].is_empty())?;

  Ok(Automaton::Dfa(Dfa {
    alphabet: alphabet.symbols,
    states: states.names,
    initial,
    is_final,
    edges,
  }))
}

fn build_ctr(
  raw: &RawDescription,
  source: &str,
  alphabet: SymbolSet,
  states: StateTable,
  initial: usize,
  is_final: Vec<bool>,
) -> CompileResult<Automaton> {
  let mut edges: Vec<Vec<CtrEdge>> = vec![Vec::new(); states.names.len()];
  let mut eps_entry = vec![false; states.names.len()];

  for trans in &raw.transitions {
    let RawTransition::Ctr {
      from,
      sym,
      guard,
      to,
      action,
      loc,
    } = trans
    else {
      unreachable!("parser only yields CTR transitions for kind=ctr");
    };
    let from = states.resolve(from, source, *loc)?;
    let to = states.resolve(to, source, *loc)?;
    let sym = resolve_input_sym(sym.as_deref(), &alphabet, source, *loc)?;
    let guard = match guard.as_deref() {
      None => CounterGuard::Any,
      Some("z") => CounterGuard::Zero,
      Some("p") => CounterGuard::Positive,
      Some(other) => {
        return Err(CompileError::at(
          source,
          *loc,
          format!("unknown counter guard '{other}' (expected z, p or empty)"),
        ));
      }
    };
    let action = match action.as_deref() {
      None => CounterAction::Nop,
      Some("i") => CounterAction::Inc,
      Some("d") => CounterAction::Dec,
      Some(other) => {
        return Err(CompileError::at(
          source,
          *loc,
          format!("unknown counter action '{other}' (expected i, d or empty)"),
        ));
      }
    };
    if sym == InputSym::Epsilon {
      eps_entry[to] = true;
    }
    edges[from].push(CtrEdge {
      sym,
      guard,
      to,
      action,
    });
  }

  reject_dead_ends(&states.names, &is_final, |q| edges[q].is_empty())?;

  Ok(Automaton::Ctr(Ctr {
    alphabet: alphabet.symbols,
    states: states.names,
    initial,
    is_final,
    edges,
    eps_entry,
  }))
}

fn build_dpda(
  raw: &RawDescription,
  source: &str,
  alphabet: SymbolSet,
  states: StateTable,
  initial: usize,
  is_final: Vec<bool>,
) -> CompileResult<Automaton> {
  let stack = SymbolSet::from_raw(&raw.stack, "stack", source)?;
  if stack.symbols.is_empty() {
    return Err(CompileError::invalid("stack alphabet must not be empty"));
  }
  let (bottom_name, bottom_loc) = raw
    .bottom
    .as_ref()
    .expect("parser guarantees a bottom clause for kind=dpda");
  let bottom = stack.resolve(bottom_name, source, *bottom_loc)?;

  let mut edges: Vec<Vec<DpdaEdge>> = vec![Vec::new(); states.names.len()];

  for trans in &raw.transitions {
    let RawTransition::Dpda {
      from,
      sym,
      top,
      to,
      push,
      loc,
    } = trans
    else {
      unreachable!("parser only yields DPDA transitions for kind=dpda");
    };
    let from = states.resolve(from, source, *loc)?;
    let to = states.resolve(to, source, *loc)?;
    let sym = resolve_input_sym(sym.as_deref(), &alphabet, source, *loc)?;
    let top = stack.resolve(top, source, *loc)?;
    // Each pushed symbol is checked against the stack alphabet, not just
    // the tested top.
    let mut pushed = Vec::new();
    if let Some(push) = push {
      for c in push.chars() {
        if !stack.set.contains(&c) {
          return Err(CompileError::at(
            source,
            *loc,
            format!("pushed symbol '{c}' is not in the stack alphabet"),
          ));
        }
        pushed.push(c);
      }
    }
    edges[from].push(DpdaEdge {
      sym,
      top,
      to,
      push: pushed,
    });
  }

  reject_dead_ends(&states.names, &is_final, |q| edges[q].is_empty())?;

  Ok(Automaton::Dpda(Dpda {
    alphabet: alphabet.symbols,
    states: states.names,
    initial,
    is_final,
    stack: stack.symbols,
    bottom,
    edges,
  }))
}

fn resolve_input_sym(
  field: Option<&str>,
  alphabet: &SymbolSet,
  source: &str,
  loc: usize,
) -> CompileResult<InputSym> {
  match field {
    None => Ok(InputSym::Epsilon),
    Some("$") => Ok(InputSym::End),
    Some(text) => Ok(InputSym::Sym(alphabet.resolve(text, source, loc)?)),
  }
}

/// A state with no outgoing transitions must be final.
fn reject_dead_ends(
  names: &[String],
  is_final: &[bool],
  no_edges: impl Fn(usize) -> bool,
) -> CompileResult<()> {
  for q in 0..names.len() {
    if no_edges(q) && !is_final[q] {
      return Err(CompileError::invalid(format!(
        "Dead end non-final transition: state '{}' has no outgoing transitions",
        names[q]
      )));
    }
  }
  Ok(())
}

/// Declared states indexed by name.
struct StateTable {
  names: Vec<String>,
  map: FxHashMap<String, usize>,
}

impl StateTable {
  fn from_raw(raw: &[(String, usize)], source: &str) -> CompileResult<Self> {
    let mut names = Vec::with_capacity(raw.len());
    let mut map = FxHashMap::default();
    for (name, loc) in raw {
      if map.insert(name.clone(), names.len()).is_some() {
        return Err(CompileError::at(
          source,
          *loc,
          format!("state '{name}' is declared twice"),
        ));
      }
      names.push(name.clone());
    }
    Ok(Self { names, map })
  }

  fn resolve(&self, name: &str, source: &str, loc: usize) -> CompileResult<usize> {
    self.map.get(name).copied().ok_or_else(|| {
      CompileError::at(source, loc, format!("unknown state '{name}'"))
    })
  }
}

/// An ordered set of distinct single-character symbols. The declaration
/// order is authoritative: every numeric encoding downstream derives from
/// a symbol's position here.
struct SymbolSet {
  symbols: Vec<char>,
  set: FxHashSet<char>,
}

impl SymbolSet {
  fn from_raw(raw: &[(String, usize)], what: &str, source: &str) -> CompileResult<Self> {
    let mut symbols = Vec::with_capacity(raw.len());
    let mut set = FxHashSet::default();
    for (text, loc) in raw {
      let mut chars = text.chars();
      let (Some(c), None) = (chars.next(), chars.next()) else {
        return Err(CompileError::at(
          source,
          *loc,
          format!("{what} symbol '{text}' must be a single character"),
        ));
      };
      if !set.insert(c) {
        return Err(CompileError::at(
          source,
          *loc,
          format!("{what} symbol '{c}' is declared twice"),
        ));
      }
      symbols.push(c);
    }
    Ok(Self { symbols, set })
  }

  fn resolve(&self, text: &str, source: &str, loc: usize) -> CompileResult<char> {
    let mut chars = text.chars();
    if let (Some(c), None) = (chars.next(), chars.next())
      && self.set.contains(&c)
    {
      return Ok(c);
    }
    Err(CompileError::at(
      source,
      loc,
      format!("unknown symbol '{text}'"),
    ))
  }
}
