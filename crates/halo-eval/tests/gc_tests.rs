//! Garbage collector tests driven through scripts.
//!
//! Covers:
//! - `gc_collect()` mid-expression never frees live operands
//! - unreachable objects are reclaimed, reachable ones survive
//! - the automatic threshold policy and disabling it
//! - objects kept alive only through captures, fields, iterators and pins
//! - `print_gc_info()` output

use halo_eval::{HeapStats, Interpreter, InterpreterConfig};
use halo_lexer::scan;
use halo_parser::parse;
use pretty_assertions::assert_eq;

// ══════════════════════════════════════════════════════════════════════════════
// Helpers
// ══════════════════════════════════════════════════════════════════════════════

/// Run a script under `config`; returns its output and the final heap stats.
fn run_with(config: InterpreterConfig, source: &str) -> (String, HeapStats) {
    let stmts = match parse(scan(source)).into_result() {
        Ok(stmts) => stmts,
        Err(err) => panic!("unexpected parse error:\n{err}"),
    };
    let mut out = Vec::new();
    let stats = {
        let mut interp = Interpreter::with_config(config, &b""[..], &mut out);
        if let Err(err) = interp.execute(&stmts) {
            panic!("unexpected execution error:\n{err}");
        }
        interp.heap_stats()
    };
    (String::from_utf8(out).unwrap(), stats)
}

fn run(source: &str) -> String {
    run_with(InterpreterConfig::default(), source).0
}

/// Collect after every statement.
fn eager() -> InterpreterConfig {
    InterpreterConfig::default().with_gc_threshold(1)
}

/// Number of native builtins allocated by a fresh interpreter.
const BUILTIN_OBJECTS: usize = 10;

// ══════════════════════════════════════════════════════════════════════════════
// Explicit collection
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn collect_mid_expression_keeps_operands() {
    let out = run(
        r#"
fun noisy():
  gc_collect();
  return "b";
end
var s = "a" + noisy();
println(s);
println([1, 2] + [noisy()]);
println([["x"], noisy(), ["y"]]);
"#,
    );
    assert_eq!(out, "ab\n[1, 2, b]\n[[x], b, [y]]\n");
}

#[test]
fn collect_inside_method_keeps_receiver_and_arguments() {
    let out = run(
        r#"
class Node:
  var label;
  fun _init_(label):
    gc_collect();
    my.label = label + "!";
  end
  fun show(suffix):
    gc_collect();
    return my.label + suffix;
  end
end
println(Node("n" + "1").show("-" + "x"));
"#,
    );
    assert_eq!(out, "n1!-x\n");
}

#[test]
fn unreachable_objects_are_freed() {
    let (_, stats) = run_with(
        InterpreterConfig::default(),
        "var x = [1, 2, 3];\nx = null;\ngc_collect();",
    );
    assert_eq!(stats.collections, 1);
    assert_eq!(stats.freed_total, 1);
    assert_eq!(stats.live, BUILTIN_OBJECTS);
}

#[test]
fn reachable_objects_survive() {
    let (out, stats) = run_with(
        InterpreterConfig::default(),
        r#"
var keep = ["a", ["b"]];
gc_collect();
println(keep);
"#,
    );
    assert_eq!(out, "[a, [b]]\n");
    // The outer list, "a", the inner list and "b".
    assert_eq!(stats.live, BUILTIN_OBJECTS + 4);
}

#[test]
fn cycles_are_collected() {
    let (_, stats) = run_with(
        InterpreterConfig::default(),
        "var l = [];\nl.put(l);\nl = null;\ngc_collect();",
    );
    assert_eq!(stats.freed_total, 1);
    assert_eq!(stats.live, BUILTIN_OBJECTS);
}

// ══════════════════════════════════════════════════════════════════════════════
// Automatic policy
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn threshold_triggers_collections() {
    let (out, stats) = run_with(
        eager(),
        r#"
var keep = [];
for i in (0, 50):
  keep.put(to_str(i));
  var tmp = "garbage" + to_str(i);
end
println(keep.len());
println(keep[49]);
"#,
    );
    assert_eq!(out, "50\n49\n");
    assert!(stats.collections > 0);
    assert!(stats.freed_total > 0);
}

#[test]
fn zero_threshold_disables_automatic_collection() {
    let config = InterpreterConfig::default().with_gc_threshold(0);
    let (_, stats) = run_with(
        config,
        "for i in (0, 20):\n  var tmp = \"x\" + to_str(i);\nend",
    );
    assert_eq!(stats.collections, 0);
    assert_eq!(stats.freed_total, 0);
}

#[test]
fn eager_collection_keeps_captures_alive() {
    let (out, _) = run_with(
        eager(),
        r#"
fun make():
  var state = ["seed"];
  return lambda[state](): state.put("x"); return state.len(); end;
end
var f = make();
var junk = [[1], [2], [3]];
junk = null;
println(f());
println(f());
"#,
    );
    assert_eq!(out, "2\n3\n");
}

#[test]
fn eager_collection_keeps_iterator_sources_alive() {
    let (out, _) = run_with(
        eager(),
        r#"
fun letters():
  return "a" + "b" + "c";
end
for c in letters():
  var junk = [c, c];
  print(c);
end
println("");
for x in [[1], [2]]:
  var junk = [x];
  print(x);
end
println("");
"#,
    );
    assert_eq!(out, "abc\n[1][2]\n");
}

#[test]
fn eager_collection_keeps_assignment_targets_alive() {
    let (out, _) = run_with(
        eager(),
        r#"
class Holder:
  var items;
end
fun fresh():
  var h = Holder();
  h.items = [];
  return h;
end
fun grow(list):
  var junk = [1, 2, 3];
  list.put("v");
  return list;
end
fun holder_items():
  return fresh().items;
end
var l = holder_items();
l = grow(l);
println(l);
var m = [[0]];
m[0] = grow(m[0]);
println(m);
"#,
    );
    assert_eq!(out, "[v]\n[[0, v]]\n");
}

// ══════════════════════════════════════════════════════════════════════════════
// Reporting
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn print_gc_info_on_a_fresh_interpreter() {
    assert_eq!(
        run("print_gc_info();"),
        "gc: 10 live, 0 collections, 0 freed, 10 allocated\n"
    );
}

#[test]
fn print_gc_info_after_a_collection() {
    assert_eq!(
        run("var x = \"tmp\";\nx = null;\ngc_collect();\nprint_gc_info();"),
        "gc: 10 live, 1 collections, 1 freed, 11 allocated\n"
    );
}
