//! One-counter header family: entry, include-level decoder, the counter
//! machinery, and one or two headers per state.
//!
//! Unlike the counter-driven families, the stream position here comes
//! from `__INCLUDE_LEVEL__`: every consumed symbol descends exactly one
//! include level, so the decoder shifts `INPUT` by the current depth.
//! That forces the consume deferral protocol: a header entered without
//! consuming (`_no_consume`) sits one level too deep to include a
//! consuming successor directly, so it records the successor in
//! `NEXT_STATE`, defines `CONSUME` and returns; the nearest consuming
//! ancestor performs the include at the correct depth.
//!
//! The counter itself is a binary number held in whether the `CB0…CB7`
//! macros are defined. `inc.h` ripples a carry towards the high bits,
//! `dec.h` ripples a borrow and re-derives the `IS_ZERO` flag. Counter
//! files never touch `__COUNTER__`, `__INCLUDE_LEVEL__` or `CUR_SYM`, so
//! counter traffic cannot disturb the stream position.

use crate::automaton::{CounterAction, CounterGuard, Ctr, InputSym};
use crate::emit::{HeaderSet, conjoin, push_symbol_codes};
use crate::encoding::Encoding;

/// Width of the preprocessor counter in bits. A 64-bit `INPUT` can feed
/// at most 64 increments, so eight bits leave ample headroom.
const COUNTER_BITS: u32 = 8;

/// Include depth of the decoder when the entry header is included from
/// the translation unit: entry at level 1, state headers at 2, decoder
/// reads at 3. The emitted structure below is the only source of this
/// constant.
const BASE_LEVEL: u32 = 3;

pub fn emit(ctr: &Ctr, enc: &Encoding) -> HeaderSet {
  let mut set = HeaderSet::new();
  set.push("ctr.h", entry(ctr, enc));
  set.push("get_sym.h", level_decoder(enc));
  set.push("init_ctr.h", init_ctr());
  set.push("stab.h", stab());
  set.push("next2pow.h", next2pow());
  set.push("advance_msb.h", carry_chain());
  set.push("advance_lsb.h", borrow_chain());
  set.push("inc.h", inc());
  set.push("dec.h", dec());
  for q in 0..ctr.states.len() {
    set.push(state_file(ctr, q), state_header(ctr, q, true));
    if ctr.eps_entry[q] {
      set.push(no_consume_file(ctr, q), state_header(ctr, q, false));
    }
  }
  set
}

pub(crate) fn state_file(ctr: &Ctr, q: usize) -> String {
  format!("ctr_{}.h", ctr.states[q])
}

pub(crate) fn no_consume_file(ctr: &Ctr, q: usize) -> String {
  format!("ctr_{}_no_consume.h", ctr.states[q])
}

fn entry(ctr: &Ctr, enc: &Encoding) -> String {
  let mut lines = vec![
    "/* Define INPUT, include this file, then test for RECOGNIZED. */".to_string(),
    "#ifndef INPUT".to_string(),
    "#error \"INPUT must be defined before including ctr.h\"".to_string(),
    "#endif".to_string(),
  ];
  push_symbol_codes(&mut lines, enc);
  lines.push(format!("#define CTR_BASE_LEVEL {BASE_LEVEL}"));
  lines.push(
    "#define GET_SYM ((INPUT >> ((__INCLUDE_LEVEL__ - CTR_BASE_LEVEL) * A_SIZE)) & A_MASK)"
      .to_string(),
  );
  lines.push("#include \"stab.h\"".to_string());
  lines.push("#include \"init_ctr.h\"".to_string());
  lines.push(format!("#include \"{}\"", state_file(ctr, ctr.initial)));
  finish(lines)
}

/// The include-level decoder: no padding needed, the position advances by
/// descending, not by evaluation counting.
fn level_decoder(enc: &Encoding) -> String {
  let mut lines = vec!["#undef CUR_SYM".to_string()];
  for (arm, &(sym, _)) in enc.codes.iter().enumerate() {
    let name = Encoding::macro_name(sym);
    let keyword = if arm == 0 { "#if" } else { "#elif" };
    lines.push(format!("{keyword} GET_SYM == {name}"));
    lines.push(format!("#define CUR_SYM {name}"));
  }
  lines.push("#elif GET_SYM == END".to_string());
  lines.push("#define CUR_SYM END".to_string());
  lines.push("#else".to_string());
  lines.push("#define CUR_SYM (-1)".to_string());
  lines.push("#endif".to_string());
  finish(lines)
}

fn init_ctr() -> String {
  let mut lines: Vec<String> = (0..COUNTER_BITS).map(|bit| format!("#undef CB{bit}")).collect();
  lines.push("#undef IS_ZERO".to_string());
  lines.push("#define IS_ZERO 1".to_string());
  finish(lines)
}

/// Pad `__COUNTER__` to a multiple of four so files that divide it can
/// rely on the alignment.
fn stab() -> String {
  finish(vec![
    "#if (__COUNTER__ & 3) != 0".to_string(),
    "#include \"stab.h\"".to_string(),
    "#endif".to_string(),
  ])
}

fn inc() -> String {
  finish(vec![
    "#ifndef CB0".to_string(),
    "#define CB0".to_string(),
    "#else".to_string(),
    "#undef CB0".to_string(),
    "#include \"advance_msb.h\"".to_string(),
    "#endif".to_string(),
    "#undef IS_ZERO".to_string(),
    "#define IS_ZERO 0".to_string(),
  ])
}

fn dec() -> String {
  finish(vec![
    "#ifdef CB0".to_string(),
    "#undef CB0".to_string(),
    "#else".to_string(),
    "#define CB0".to_string(),
    "#include \"advance_lsb.h\"".to_string(),
    "#endif".to_string(),
    "#include \"next2pow.h\"".to_string(),
  ])
}

/// Carry propagation for `inc.h`, unrolled over the high bits.
fn carry_chain() -> String {
  let mut lines = Vec::new();
  for bit in 1..COUNTER_BITS {
    lines.push(format!("#ifndef CB{bit}"));
    lines.push(format!("#define CB{bit}"));
    lines.push("#else".to_string());
    lines.push(format!("#undef CB{bit}"));
  }
  for _ in 1..COUNTER_BITS {
    lines.push("#endif".to_string());
  }
  finish(lines)
}

/// Borrow propagation for `dec.h`, unrolled over the high bits.
fn borrow_chain() -> String {
  let mut lines = Vec::new();
  for bit in 1..COUNTER_BITS {
    lines.push(format!("#ifdef CB{bit}"));
    lines.push(format!("#undef CB{bit}"));
    lines.push("#else".to_string());
    lines.push(format!("#define CB{bit}"));
  }
  for _ in 1..COUNTER_BITS {
    lines.push("#endif".to_string());
  }
  finish(lines)
}

/// Re-derive the zero flag: the counter is back at zero iff every bit is
/// clear again.
fn next2pow() -> String {
  let mut lines = vec!["#undef IS_ZERO".to_string()];
  for bit in 0..COUNTER_BITS {
    lines.push(format!("#ifndef CB{bit}"));
  }
  lines.push("#define IS_ZERO 1".to_string());
  for _ in 0..COUNTER_BITS {
    lines.push("#endif".to_string());
  }
  lines.push("#ifndef IS_ZERO".to_string());
  lines.push("#define IS_ZERO 0".to_string());
  lines.push("#endif".to_string());
  finish(lines)
}

fn state_header(ctr: &Ctr, q: usize, consuming: bool) -> String {
  let is_final = ctr.is_final[q];
  let mut lines = Vec::new();
  if consuming {
    lines.push("#include \"get_sym.h\"".to_string());
  }
  if is_final {
    lines.push("#define RECOGNIZED".to_string());
  }

  let mut keyword = "#if";
  for edge in &ctr.edges[q] {
    let mut conjuncts = Vec::new();
    match edge.sym {
      InputSym::Sym(c) => conjuncts.push(format!("CUR_SYM == {}", Encoding::macro_name(c))),
      InputSym::End => conjuncts.push("CUR_SYM == END".to_string()),
      InputSym::Epsilon => {}
    }
    match edge.guard {
      CounterGuard::Zero => conjuncts.push("IS_ZERO".to_string()),
      CounterGuard::Positive => conjuncts.push("!IS_ZERO".to_string()),
      CounterGuard::Any => {}
    }
    lines.push(format!("{keyword} {}", conjoin(&conjuncts)));
    keyword = "#elif";

    if is_final {
      lines.push("#undef RECOGNIZED".to_string());
    }
    match edge.action {
      CounterAction::Inc => lines.push("#include \"inc.h\"".to_string()),
      CounterAction::Dec => lines.push("#include \"dec.h\"".to_string()),
      CounterAction::Nop => {}
    }
    if edge.sym.consumes() {
      if consuming {
        lines.push(format!("#include \"{}\"", state_file(ctr, edge.to)));
      } else {
        lines.push("#undef NEXT_STATE".to_string());
        lines.push(format!("#define NEXT_STATE \"{}\"", state_file(ctr, edge.to)));
        lines.push("#define CONSUME".to_string());
      }
    } else {
      lines.push(format!("#include \"{}\"", no_consume_file(ctr, edge.to)));
    }
  }
  if is_final {
    lines.push(format!("{keyword} CUR_SYM != END"));
    lines.push("#undef RECOGNIZED".to_string());
    keyword = "#elif";
  }
  if keyword == "#elif" {
    lines.push("#endif".to_string());
  }

  if consuming {
    lines.push("#ifdef CONSUME".to_string());
    lines.push("#undef CONSUME".to_string());
    lines.push("#include NEXT_STATE".to_string());
    lines.push("#endif".to_string());
  }
  finish(lines)
}

fn finish(lines: Vec<String>) -> String {
  let mut out = lines.join("\n");
  out.push('\n');
  out
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::automaton::{Automaton, build};
  use crate::parser;
  use crate::tokenizer::tokenize;

  fn emit_text(source: &str) -> HeaderSet {
    let raw = parser::parse(tokenize(source).unwrap(), source).unwrap();
    let Automaton::Ctr(ctr) = build(&raw, source).unwrap() else {
      panic!("expected a CTR");
    };
    let enc = Encoding::for_alphabet(&ctr.alphabet);
    emit(&ctr, &enc)
  }

  // aⁿbⁿ: count up on a, down on b, accept at zero after the end.
  const AN_BN: &str = "kind=ctr alphabet={a,b} states={s,t,u} initial=s final={u} \
                       transitions={(s,a,)->(s,i),(s,$,z)->(u,),(s,b,p)->(t,d),\
                       (t,b,p)->(t,d),(t,$,z)->(u,)}";

  #[test]
  fn emits_the_full_machinery_file_set() {
    let set = emit_text(AN_BN);
    let names: Vec<&str> = set.names().collect();
    assert_eq!(
      names,
      vec![
        "ctr.h",
        "get_sym.h",
        "init_ctr.h",
        "stab.h",
        "next2pow.h",
        "advance_msb.h",
        "advance_lsb.h",
        "inc.h",
        "dec.h",
        "ctr_s.h",
        "ctr_t.h",
        "ctr_u.h",
      ]
    );
  }

  #[test]
  fn no_consume_header_appears_only_for_eps_entered_states() {
    let set = emit_text(
      "kind=ctr alphabet={a} states={s,u} initial=s final={u} \
       transitions={(s,a,)->(s,i),(s,,z)->(u,)}",
    );
    assert!(set.get("ctr_u_no_consume.h").is_some());
    assert!(set.get("ctr_s_no_consume.h").is_none());
  }

  #[test]
  fn entry_wires_stream_then_counter_then_initial_state() {
    let set = emit_text(AN_BN);
    let entry = set.get("ctr.h").unwrap();
    assert!(entry.contains("#define CTR_BASE_LEVEL 3"));
    assert!(entry.contains("__INCLUDE_LEVEL__ - CTR_BASE_LEVEL"));
    let stab = entry.find("#include \"stab.h\"").unwrap();
    let init = entry.find("#include \"init_ctr.h\"").unwrap();
    let first = entry.find("#include \"ctr_s.h\"").unwrap();
    assert!(stab < init && init < first);
  }

  #[test]
  fn guards_and_actions_appear_in_dispatch_order() {
    let set = emit_text(AN_BN);
    let s = set.get("ctr_s.h").unwrap();
    assert!(s.starts_with("#include \"get_sym.h\"\n"));
    assert!(s.contains("#if CUR_SYM == A_a\n#include \"inc.h\"\n#include \"ctr_s.h\""));
    assert!(s.contains("#elif CUR_SYM == END && IS_ZERO\n#include \"ctr_u.h\""));
    assert!(s.contains("#elif CUR_SYM == A_b && !IS_ZERO\n#include \"dec.h\"\n#include \"ctr_t.h\""));
  }

  #[test]
  fn consuming_header_carries_the_consume_catcher() {
    let set = emit_text(AN_BN);
    let s = set.get("ctr_s.h").unwrap();
    assert!(s.ends_with(
      "#ifdef CONSUME\n\
       #undef CONSUME\n\
       #include NEXT_STATE\n\
       #endif\n"
    ));
  }

  #[test]
  fn no_consume_header_defers_consuming_edges() {
    let set = emit_text(
      "kind=ctr alphabet={a} states={s,u} initial=s final={u} \
       transitions={(s,a,)->(s,i),(s,,z)->(u,),(u,a,)->(s,)}",
    );
    let u = set.get("ctr_u_no_consume.h").unwrap();
    assert!(!u.contains("get_sym.h"), "must not re-read the symbol");
    assert!(u.contains(
      "#undef NEXT_STATE\n\
       #define NEXT_STATE \"ctr_s.h\"\n\
       #define CONSUME"
    ));
    assert!(!u.contains("#ifdef CONSUME"), "no catcher at the wrong depth");
  }

  #[test]
  fn final_state_guard_survives_only_at_end() {
    let set = emit_text(AN_BN);
    let u = set.get("ctr_u.h").unwrap();
    assert_eq!(
      u,
      "#include \"get_sym.h\"\n\
       #define RECOGNIZED\n\
       #if CUR_SYM != END\n\
       #undef RECOGNIZED\n\
       #endif\n\
       #ifdef CONSUME\n\
       #undef CONSUME\n\
       #include NEXT_STATE\n\
       #endif\n"
    );
  }

  #[test]
  fn counter_files_cannot_disturb_the_stream() {
    let set = emit_text(AN_BN);
    for name in [
      "init_ctr.h",
      "inc.h",
      "dec.h",
      "advance_msb.h",
      "advance_lsb.h",
      "next2pow.h",
    ] {
      let text = set.get(name).unwrap();
      assert!(!text.contains("__COUNTER__"), "{name} must not tick the counter");
      assert!(!text.contains("__INCLUDE_LEVEL__"), "{name} must not read the level");
      assert!(!text.contains("CUR_SYM"), "{name} must not touch the symbol");
    }
  }
}
