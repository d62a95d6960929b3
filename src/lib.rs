//! Crate root: wires together the compilation pipeline.
//!
//! The stages are intentionally small and composable so they can be
//! evolved independently:
//! - `tokenizer` performs lexical analysis and produces a flat token stream.
//! - `parser` owns the clause grammar and returns a raw description record.
//! - `automaton` validates cross-references and derives per-state attributes.
//! - `atomize` lowers multi-symbol pushdown transitions to elementary atoms.
//! - `encoding` fixes the symbol-stream bit layout.
//! - `emit` renders the header families that run inside the C preprocessor.
//! - `error` centralises reporting utilities shared by the other modules.

pub mod atomize;
pub mod automaton;
pub mod emit;
pub mod encoding;
pub mod error;
pub mod parser;
pub mod tokenizer;

pub use automaton::Automaton;
pub use emit::HeaderSet;
pub use error::{CompileError, CompileResult};

use encoding::Encoding;

/// Parse and validate a description into a machine.
pub fn build_automaton(description: &str) -> CompileResult<Automaton> {
  let tokens = tokenizer::tokenize(description)?;
  let raw = parser::parse(tokens, description)?;
  automaton::build(&raw, description)
}

/// Render the header family for a validated machine.
pub fn emit_headers(automaton: &Automaton) -> HeaderSet {
  match automaton {
    Automaton::Dfa(dfa) => {
      let enc = Encoding::for_alphabet(&dfa.alphabet);
      emit::dfa::emit(dfa, &enc)
    }
    Automaton::Ctr(ctr) => {
      let enc = Encoding::for_alphabet(&ctr.alphabet);
      emit::ctr::emit(ctr, &enc)
    }
    Automaton::Dpda(dpda) => {
      let atom = atomize::atomize(dpda);
      log::info!(
        "atomized {} transitions into {} atoms across {} states",
        dpda.edges.iter().map(Vec::len).sum::<usize>(),
        atom.edges.iter().map(Vec::len).sum::<usize>(),
        atom.states.len()
      );
      let enc = Encoding::for_alphabet(&atom.alphabet);
      emit::dpda::emit(&atom, &enc)
    }
  }
}

/// Compile a description into its header family.
pub fn compile(description: &str) -> CompileResult<HeaderSet> {
  Ok(emit_headers(&build_automaton(description)?))
}
