//! End-to-end scenarios: whole descriptions through parse, build,
//! atomize and emit, asserting on the emitted header families.

use ppac::encoding::Encoding;
use std::fs;

const DFA_A_STAR_B: &str = "kind=dfa alphabet={a,b} states={s,t} initial=s final={t} \
                            transitions={(s,a)->s,(s,b)->t}";

const CTR_AN_BN: &str = "kind=ctr alphabet={a,b} states={s,t,u} initial=s final={u} \
                         transitions={(s,a,)->(s,i),(s,$,z)->(u,),(s,b,p)->(t,d),\
                         (t,b,p)->(t,d),(t,$,z)->(u,)}";

const DPDA_BALANCED: &str = "kind=dpda alphabet={a,b} states={q,f} initial=q final={f} \
                             stack={Z,X} bottom=Z \
                             transitions={(q,a,Z)->(q,ZX),(q,a,X)->(q,XX),(q,b,X)->(q,),\
                             (q,$,Z)->(f,Z)}";

#[test]
fn dfa_family_has_exactly_the_documented_files() {
  let set = ppac::compile(DFA_A_STAR_B).unwrap();
  let names: Vec<&str> = set.names().collect();
  assert_eq!(names, vec!["dfa.h", "get_sym.h", "dfa_s.h", "dfa_t.h"]);
}

#[test]
fn reference_word_encoding_matches_the_two_symbol_layout() {
  // a→0b10, b→0b11, A_SIZE=2: "aab" packs to 0b111010 and "aa" to 0b1010
  let enc = Encoding::for_alphabet(&['a', 'b']);
  assert_eq!(enc.encode_word("aab"), 0b111010);
  assert_eq!(enc.encode_word("aa"), 0b1010);
}

#[test]
fn dfa_acceptance_structure_follows_the_machine() {
  let set = ppac::compile(DFA_A_STAR_B).unwrap();
  // only the final state's headers mention RECOGNIZED at all
  assert!(!set.get("dfa_s.h").unwrap().contains("RECOGNIZED"));
  let t = set.get("dfa_t.h").unwrap();
  assert!(t.contains("#define RECOGNIZED"));
  assert!(t.contains("#if CUR_SYM != END\n#undef RECOGNIZED"));
  // the entry wires the initial state, not the final one
  assert!(set.get("dfa.h").unwrap().ends_with("#include \"dfa_s.h\"\n"));
}

#[test]
fn empty_final_set_never_defines_recognized() {
  let set = ppac::compile(
    "kind=dfa alphabet={a} states={s} initial=s final={} transitions={(s,a)->s}",
  )
  .unwrap();
  for name in set.names().collect::<Vec<_>>() {
    assert!(
      !set.get(name).unwrap().contains("RECOGNIZED"),
      "{name} must not mention RECOGNIZED"
    );
  }
}

#[test]
fn ctr_family_has_exactly_the_documented_files() {
  let set = ppac::compile(CTR_AN_BN).unwrap();
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
fn ctr_stream_uses_include_levels_not_the_counter() {
  let set = ppac::compile(CTR_AN_BN).unwrap();
  assert!(set.get("ctr.h").unwrap().contains("__INCLUDE_LEVEL__"));
  assert!(!set.get("get_sym.h").unwrap().contains("__COUNTER__"));
}

#[test]
fn dpda_family_has_exactly_the_documented_files() {
  let set = ppac::compile(DPDA_BALANCED).unwrap();
  let names: Vec<&str> = set.names().collect();
  assert_eq!(names, vec!["dpda.h", "get_sym.h", "dpda_q.h", "dpda_f.h"]);
}

#[test]
fn dpda_synthetic_states_get_their_own_headers() {
  // XYZ forces a replace plus two pushes through two interior states
  let set = ppac::compile(
    "kind=dpda alphabet={a,b} states={q,f} initial=q final={f} stack={Z,X,Y} bottom=Z \
     transitions={(q,a,Z)->(q,XYZ),(q,b,Z)->(q,),(q,$,X)->(f,X)}",
  )
  .unwrap();
  let names: Vec<&str> = set.names().collect();
  assert!(names.contains(&"dpda_q.0.0.h"));
  assert!(names.contains(&"dpda_q.0.1.h"));
  // interior states entered by ε-pushes dispatch without re-reading
  assert!(names.contains(&"dpda_q.0.1_empty.h"));
  assert!(names.contains(&"dpda_q_empty.h"));
}

#[test]
fn every_dpda_header_keeps_top_offsets_in_step_with_its_lines() {
  for source in [
    DPDA_BALANCED,
    "kind=dpda alphabet={a,b} states={q,f} initial=q final={f} stack={Z,X,Y} bottom=Z \
     transitions={(q,a,Z)->(q,XYZ),(q,b,Z)->(q,),(q,$,X)->(f,X)}",
  ] {
    let set = ppac::compile(source).unwrap();
    for name in set.names().collect::<Vec<_>>() {
      if !name.starts_with("dpda_") {
        continue;
      }
      let text = set.get(name).unwrap();
      assert!(text.starts_with("#line NEXT_ST_SYM\n"));
      for (i, line) in text.lines().enumerate() {
        let mut rest = line;
        while let Some(pos) = rest.find("TOP(") {
          rest = &rest[pos + 4..];
          let close = rest.find(')').unwrap();
          let offset: usize = rest[..close].parse().unwrap();
          assert_eq!(offset, i + 1 - 2, "bad TOP offset in {name} line {}", i + 1);
          rest = &rest[close..];
        }
      }
    }
  }
}

#[test]
fn dead_end_scenario_fails_with_the_documented_diagnostic() {
  let err = ppac::compile(
    "kind=dfa alphabet={a} states={s,t} initial=s final={} transitions={(s,a)->t}",
  )
  .unwrap_err();
  assert!(err.to_string().contains("Dead end non-final transition"));
}

#[test]
fn duplicate_transition_scenario_fails_with_the_documented_diagnostic() {
  let err = ppac::compile(
    "kind=dfa alphabet={a} states={s,t,u} initial=s final={t,u} \
     transitions={(s,a)->t,(s,a)->u}",
  )
  .unwrap_err();
  assert!(err.to_string().contains("Duplicate transition"));
}

#[test]
fn header_set_writes_into_a_fresh_directory() {
  let set = ppac::compile(DFA_A_STAR_B).unwrap();
  let dir = std::env::temp_dir().join(format!("ppac-pipeline-{}", std::process::id()));
  let nested = dir.join("out");
  set.write_to_dir(&nested).unwrap();
  let written = fs::read_to_string(nested.join("dfa.h")).unwrap();
  assert_eq!(written, set.get("dfa.h").unwrap());
  assert!(nested.join("dfa_t.h").exists());
  fs::remove_dir_all(&dir).unwrap();
}
