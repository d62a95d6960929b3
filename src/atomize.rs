//! Pushdown atomization: multi-symbol pushes become chains of elementary
//! stack actions.
//!
//! A raw transition `(q, σ, γ) → (q′, w)` may rewrite the top of stack to
//! an arbitrary string. The emitted headers can only perform one
//! elementary action per step, so each raw transition is lowered to atoms
//! of exactly one of three kinds: `pop` (w is empty), `replace` (|w| = 1)
//! or `push` (one symbol on top of the tested one). Longer strings build a
//! chain through synthetic interior states: the tested top is rewritten to
//! the bottom-most new symbol first, then the rest is pushed in order, so
//! the last symbol of `w` ends up exposed. Only the first atom of a chain
//! carries the original input symbol; interior atoms consume nothing.
//!
//! Interior states are namespaced by a per-machine chain counter, so two
//! long pushes out of the same state can never collide.

use crate::automaton::{Dpda, InputSym};

/// Elementary stack action of an atom transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AtomAction {
  /// Remove the tested top, exposing the symbol below.
  Pop,
  /// Overwrite the tested top in place.
  Replace(char),
  /// Append one symbol above the tested top.
  Push(char),
}

#[derive(Debug, Clone)]
pub struct AtomEdge {
  pub sym: InputSym,
  pub top: char,
  pub to: usize,
  pub action: AtomAction,
}

/// The atomized machine: original states plus synthetic interiors, every
/// edge an elementary action.
#[derive(Debug, Clone)]
pub struct AtomDpda {
  pub alphabet: Vec<char>,
  pub states: Vec<String>,
  pub initial: usize,
  pub is_final: Vec<bool>,
  pub stack: Vec<char>,
  pub bottom: char,
  pub edges: Vec<Vec<AtomEdge>>,
  /// True iff some ε-atom enters the state; such states additionally get
  /// an `_empty` header that dispatches without reading.
  pub eps_entry: Vec<bool>,
}

/// Lower every raw transition to atoms.
pub fn atomize(dpda: &Dpda) -> AtomDpda {
  let mut states = dpda.states.clone();
  let mut is_final = dpda.is_final.clone();
  let mut edges: Vec<Vec<AtomEdge>> = vec![Vec::new(); states.len()];
  let mut chain = 0usize;

  for from in 0..dpda.edges.len() {
    for raw in &dpda.edges[from] {
      match raw.push.as_slice() {
        [] => edges[from].push(AtomEdge {
          sym: raw.sym,
          top: raw.top,
          to: raw.to,
          action: AtomAction::Pop,
        }),
        [only] => edges[from].push(AtomEdge {
          sym: raw.sym,
          top: raw.top,
          to: raw.to,
          action: AtomAction::Replace(*only),
        }),
        w => {
          // Rewrite the tested top to w[0] when needed, then push the rest
          // in order; the interior stops of the chain are fresh states.
          let mut actions = Vec::with_capacity(w.len());
          if raw.top != w[0] {
            actions.push(AtomAction::Replace(w[0]));
          }
          actions.extend(w[1..].iter().map(|&c| AtomAction::Push(c)));

          let mut targets = Vec::with_capacity(actions.len());
          for interior in 0..actions.len() - 1 {
            targets.push(states.len());
            states.push(format!("{}.{chain}.{interior}", dpda.states[from]));
            is_final.push(false);
            edges.push(Vec::new());
          }
          targets.push(raw.to);

          let mut cur = from;
          let mut sym = raw.sym;
          let mut top = raw.top;
          for (action, target) in actions.into_iter().zip(targets) {
            edges[cur].push(AtomEdge {
              sym,
              top,
              to: target,
              action,
            });
            top = match action {
              AtomAction::Replace(c) | AtomAction::Push(c) => c,
              AtomAction::Pop => unreachable!("chains never contain pops"),
            };
            cur = target;
            sym = InputSym::Epsilon;
          }
          chain += 1;
        }
      }
    }
  }

  let mut eps_entry = vec![false; states.len()];
  for outgoing in &edges {
    for edge in outgoing {
      if edge.sym == InputSym::Epsilon {
        eps_entry[edge.to] = true;
      }
    }
  }

  AtomDpda {
    alphabet: dpda.alphabet.clone(),
    states,
    initial: dpda.initial,
    is_final,
    stack: dpda.stack.clone(),
    bottom: dpda.bottom,
    edges,
    eps_entry,
  }
}
