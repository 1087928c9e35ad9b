//! Integration tests for the halo tree-walking evaluator.
//!
//! Covers:
//! - the end-to-end scenarios (arithmetic, concatenation, recursion,
//!   construction, range loops, undefined calls)
//! - numeric promotion, integer overflow and division by zero
//! - short-circuit logic and truthiness
//! - block scoping and the function-boundary lookup rule
//! - if/while/for control flow, `break` and `continue`
//! - native builtins (console, conversions, recursion ceiling)
//! - error rendering and call traces

use halo_eval::{ErrorKind, ExecError, Interpreter, Value};
use halo_lexer::scan;
use halo_parser::{parse, parse_expr};
use pretty_assertions::assert_eq;

// ══════════════════════════════════════════════════════════════════════════════
// Helpers
// ══════════════════════════════════════════════════════════════════════════════

/// Run a script with the given stdin; returns everything written to stdout
/// and the execution result.
fn exec_with_input(source: &str, input: &str) -> (String, Result<(), ExecError>) {
    let stmts = match parse(scan(source)).into_result() {
        Ok(stmts) => stmts,
        Err(err) => panic!("unexpected parse error:\n{err}"),
    };
    let mut out = Vec::new();
    let result = {
        let mut interp = Interpreter::with_io(input.as_bytes(), &mut out);
        interp.execute(&stmts)
    };
    (String::from_utf8(out).unwrap(), result)
}

/// Run a script that must succeed and return its output.
fn run(source: &str) -> String {
    let (out, result) = exec_with_input(source, "");
    if let Err(err) = result {
        panic!("unexpected execution error:\n{err}\noutput so far:\n{out}");
    }
    out
}

/// Run a script that must fail and return the rendered error.
fn run_err(source: &str) -> String {
    exec_err(source).to_string()
}

fn exec_err(source: &str) -> ExecError {
    match exec_with_input(source, "").1 {
        Ok(()) => panic!("expected an execution error for:\n{source}"),
        Err(err) => err,
    }
}

/// Evaluate a single expression on a fresh interpreter.
fn eval(source: &str) -> Value {
    let expr = parse_expr(scan(source)).unwrap();
    let mut out = Vec::new();
    let mut interp = Interpreter::with_io(&b""[..], &mut out);
    interp.evaluate(&expr).unwrap()
}

// ══════════════════════════════════════════════════════════════════════════════
// Scenarios
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn scenario_two_plus_two() {
    assert_eq!(eval("2+2"), Value::Int(4));
    assert_eq!(run("println(2+2);"), "4\n");
}

#[test]
fn scenario_string_concatenation() {
    assert_eq!(run(r#"println("Hello"+"World");"#), "HelloWorld\n");
}

#[test]
fn scenario_recursive_factorial() {
    let out = run(
        r#"
fun fact(n):
  if n <= 1:
    return 1;
  end
  return n * fact(n - 1);
end
println(fact(5));
"#,
    );
    assert_eq!(out, "120\n");
}

#[test]
fn scenario_point_construction() {
    let out = run(
        r#"
class Point:
  var x, y;
  fun _init_(a, b):
    my.x = a;
    my.y = b;
  end
end
println(Point(3, 4));
"#,
    );
    assert_eq!(out, "Point[x=3, y=4]\n");
}

#[test]
fn scenario_range_loop() {
    assert_eq!(run("for i in (1, 4): println(i); end"), "1\n2\n3\n");
}

#[test]
fn scenario_undefined_call_reports_line() {
    assert_eq!(
        run_err("var a = 1;\nfoo();"),
        "Execution error\nline 2: <call expression> 'foo' is not defined"
    );
}

// ══════════════════════════════════════════════════════════════════════════════
// Arithmetic
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn int_arithmetic_stays_integral() {
    assert_eq!(eval("7 / 2"), Value::Int(3));
    assert_eq!(eval("7 % 3"), Value::Int(1));
    assert_eq!(eval("-7 / 2"), Value::Int(-3));
    assert_eq!(eval("-7 % 2"), Value::Int(-1));
    assert_eq!(eval("2 + 3 * 4"), Value::Int(14));
    assert_eq!(eval("(2 + 3) * 4"), Value::Int(20));
}

#[test]
fn mixed_arithmetic_promotes_to_float() {
    assert_eq!(eval("7 / 2.0"), Value::Float(3.5));
    assert_eq!(eval("1 + 2.5"), Value::Float(3.5));
    assert_eq!(eval("2.0 * 3"), Value::Float(6.0));
    assert_eq!(run("println(4.0);"), "4.000000\n");
}

#[test]
fn float_modulo_is_an_operand_error() {
    assert_eq!(
        run_err("println(7.0 % 2);"),
        "Execution error\nline 1: <binary expression> incorrect operand types for '%' operator"
    );
}

#[test]
fn division_by_zero() {
    let err = exec_err("var x = 1;\nx = x / 0;");
    assert_eq!(err.kind, ErrorKind::Arithmetic);
    assert_eq!(
        err.to_string(),
        "Execution error\nline 2: <binary expression> division by zero"
    );
    assert_eq!(
        run_err("println(5 % 0);"),
        "Execution error\nline 1: <binary expression> division by zero"
    );
}

#[test]
fn float_division_by_zero_is_infinite() {
    assert_eq!(eval("1.0 / 0"), Value::Float(f64::INFINITY));
}

#[test]
fn integer_overflow_is_reported() {
    assert_eq!(
        run_err("println(9223372036854775807 + 1);"),
        "Execution error\nline 1: <binary expression> integer overflow in '+' operator"
    );
    assert_eq!(
        run_err("var m = 9223372036854775807;\nm *= 2;"),
        "Execution error\nline 2: <assignment statement> integer overflow in '*' operator"
    );
}

#[test]
fn operand_type_errors() {
    assert_eq!(
        run_err(r#"println(1 + "a");"#),
        "Execution error\nline 1: <binary expression> incorrect operand types for '+' operator"
    );
    assert_eq!(
        run_err(r#"println(-"a");"#),
        "Execution error\nline 1: <unary expression> incorrect operand types for '-' operator"
    );
    assert_eq!(
        run_err("println(null < 1);"),
        "Execution error\nline 1: <binary expression> incorrect operand types for '<' operator"
    );
}

#[test]
fn comparisons() {
    assert_eq!(eval("1 < 2"), Value::Bool(true));
    assert_eq!(eval("2 <= 2.0"), Value::Bool(true));
    assert_eq!(eval("3 > 4"), Value::Bool(false));
    assert_eq!(eval(r#""abc" < "abd""#), Value::Bool(true));
    assert_eq!(eval(r#""b" >= "abc""#), Value::Bool(true));
}

#[test]
fn nan_comparisons_are_false() {
    assert_eq!(eval("0.0 / 0.0 < 1.0"), Value::Bool(false));
    assert_eq!(eval("0.0 / 0.0 >= 1.0"), Value::Bool(false));
    assert_eq!(eval("1 > 0.0 / 0.0"), Value::Bool(false));
    assert_eq!(eval("0.0 / 0.0 == 0.0 / 0.0"), Value::Bool(false));
    assert_eq!(
        run("var n = 0.0 / 0.0;\nprintln(n < 1.0);\nprintln(n <= n);"),
        "false\nfalse\n"
    );
}

#[test]
fn non_finite_floats_render_lowercase() {
    assert_eq!(
        run("println(0.0 / 0.0);\nprintln(1.0 / 0);\nprintln(-1.0 / 0);\nprintln(2.5);"),
        "nan\ninf\n-inf\n2.500000\n"
    );
}

#[test]
fn equality_is_structural_for_strings_and_lists() {
    assert_eq!(eval(r#""ab" == "a" + "b""#), Value::Bool(true));
    assert_eq!(eval("[1, [2]] == [1, [2]]"), Value::Bool(true));
    assert_eq!(eval("[1, 2] != [1, 3]"), Value::Bool(true));
    assert_eq!(eval("null == null"), Value::Bool(true));
    assert_eq!(eval("1 == 1.0"), Value::Bool(false));
    assert_eq!(eval(r#"1 == "1""#), Value::Bool(false));
}

#[test]
fn compound_assignment_on_variables() {
    let out = run(
        r#"
var x = 10;
x += 5;
x -= 3;
x *= 2;
x /= 4;
x %= 4;
println(x);
var s = "a";
s += "b";
println(s);
"#,
    );
    assert_eq!(out, "2\nab\n");
}

// ══════════════════════════════════════════════════════════════════════════════
// Logic & truthiness
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn logical_operators_yield_the_deciding_operand() {
    assert_eq!(eval("0 and 1"), Value::Int(0));
    assert_eq!(eval("2 and 3"), Value::Int(3));
    assert_eq!(eval("0 or 5"), Value::Int(5));
    assert_eq!(eval("not 0"), Value::Bool(true));
    assert_eq!(run(r#"println(null or "d");"#), "d\n");
}

#[test]
fn logical_operators_short_circuit() {
    // The right operands would fail if evaluated.
    assert_eq!(run("println(2 or undefined_name);"), "2\n");
    assert_eq!(run("println(false and 1 / 0);"), "false\n");
}

#[test]
fn falsy_values() {
    let out = run(
        r#"
for v in [0, 0.0, "", false, null, []]:
  if v:
    println("truthy");
  else
    println("falsy");
  end
end
if [0] and "0" and -1:
  println("all truthy");
end
"#,
    );
    assert_eq!(out, "falsy\n".repeat(6) + "all truthy\n");
}

// ══════════════════════════════════════════════════════════════════════════════
// Scoping
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn block_locals_vanish_after_the_block() {
    assert_eq!(
        run_err("if true:\n  var inner = 1;\nend\nprintln(inner);"),
        "Execution error\nline 4: <variable> name 'inner' is not found"
    );
}

#[test]
fn blocks_can_shadow_and_assign_outer_names() {
    let out = run(
        r#"
var x = 1;
if true:
  var x = 2;
  println(x);
end
while x < 3:
  x += 1;
end
println(x);
"#,
    );
    assert_eq!(out, "2\n3\n");
}

#[test]
fn functions_see_globals_but_not_caller_blocks() {
    let (out, result) = exec_with_input(
        r#"
var g = "global";
fun show():
  println(g);
  println(local);
end
if true:
  var local = 1;
  show();
end
"#,
        "",
    );
    assert_eq!(out, "global\n");
    assert_eq!(
        result.unwrap_err().to_string(),
        "Execution error\nline 5: <variable> name 'local' is not found\n  at line 9: show"
    );
}

#[test]
fn functions_do_not_see_caller_locals() {
    assert_eq!(
        run_err("fun f():\n  return y;\nend\nfun g():\n  var y = 1;\n  return f();\nend\ng();"),
        "Execution error\nline 2: <variable> name 'y' is not found\n  at line 6: f\n  at line 8: g"
    );
}

#[test]
fn duplicate_definition_in_one_scope() {
    assert_eq!(
        run_err("var a = 1;\nvar a = 2;"),
        "Execution error\nline 2: <var statement> name 'a' is defined already"
    );
    assert_eq!(
        run_err("fun f(x):\n  var x = 1;\nend\nf(0);"),
        "Execution error\nline 2: <var statement> name 'x' is defined already\n  at line 4: f"
    );
}

#[test]
fn assignment_to_an_undefined_name() {
    let err = exec_err("zz = 1;");
    assert_eq!(err.kind, ErrorKind::Name);
    assert_eq!(
        err.to_string(),
        "Execution error\nline 1: <assignment statement> name 'zz' is not defined"
    );
}

// ══════════════════════════════════════════════════════════════════════════════
// Control flow
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn if_elif_else_chain() {
    let out = run(
        r#"
fun grade(n):
  if n >= 90:
    return "A";
  elif n >= 80:
    return "B";
  else:
    return "C";
  end
end
println(grade(95));
println(grade(85));
println(grade(10));
"#,
    );
    assert_eq!(out, "A\nB\nC\n");
}

#[test]
fn while_with_break_and_continue() {
    let out = run(
        r#"
var i = 0;
while true:
  i += 1;
  if i == 2:
    continue;
  end
  if i > 4:
    break;
  end
  println(i);
end
"#,
    );
    assert_eq!(out, "1\n3\n4\n");
}

#[test]
fn range_with_negative_step() {
    assert_eq!(
        run(r#"for i in (10, 0, -3): print(i); print(" "); end println("");"#),
        "10 7 4 1 \n"
    );
}

#[test]
fn empty_range_runs_no_iterations() {
    assert_eq!(run(r#"for i in (3, 3): println(i); end println("done");"#), "done\n");
}

#[test]
fn range_counter_ignores_body_assignments() {
    assert_eq!(run("for i in (0, 3): println(i); i = 100; end"), "0\n1\n2\n");
}

#[test]
fn range_errors() {
    assert_eq!(
        run_err("for i in (0, 10, 0): println(i); end"),
        "Execution error\nline 1: <for statement> range step must not be zero"
    );
    assert_eq!(
        run_err("for i in (0, 2.5): println(i); end"),
        "Execution error\nline 1: <for statement> range bounds must be integers"
    );
}

#[test]
fn for_each_over_list_with_break_and_continue() {
    let out = run(
        r#"
for x in [1, 2, 3, 4, 5]:
  if x == 2:
    continue;
  end
  if x == 4:
    break;
  end
  println(x);
end
"#,
    );
    assert_eq!(out, "1\n3\n");
}

#[test]
fn for_each_over_string_yields_characters() {
    assert_eq!(
        run(r#"for c in "héy": print(c); print("."); end println("");"#),
        "h.é.y.\n"
    );
}

#[test]
fn for_each_over_non_iterable() {
    assert_eq!(
        run_err("for x in 5: println(x); end"),
        "Execution error\nline 1: <for statement> 'int' object is not iterable"
    );
}

#[test]
fn return_leaves_nested_loops() {
    let out = run(
        r#"
fun find(items, wanted):
  for i in (0, items.len()):
    while true:
      if items[i] == wanted:
        return i;
      end
      break;
    end
  end
  return -1;
end
println(find([5, 6, 7], 7));
println(find([5, 6, 7], 8));
"#,
    );
    assert_eq!(out, "2\n-1\n");
}

#[test]
fn function_without_return_yields_null() {
    assert_eq!(run("fun f():\n  var x = 1;\nend\nprintln(f());"), "null\n");
}

// ══════════════════════════════════════════════════════════════════════════════
// Builtins
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn print_and_println() {
    assert_eq!(run(r#"print("a"); print(1); println(""); println(true);"#), "a1\ntrue\n");
}

#[test]
fn readln_strips_line_endings() {
    let (out, result) = exec_with_input(
        r#"
var a = readln();
var b = readln();
var c = readln();
println(a + "," + b + "," + c + ".");
"#,
        "alice\r\nbob\n",
    );
    result.unwrap();
    assert_eq!(out, "alice,bob,.\n");
}

#[test]
fn conversions() {
    let out = run(
        r#"
println(to_int(" 42 ") + 1);
println(to_int(3.9));
println(to_int(true));
println(to_float("2.5"));
println(to_float(2));
println(to_str(12) + "!");
println(to_str([1, "a"]));
"#,
    );
    assert_eq!(out, "43\n3\n1\n2.500000\n2.000000\n12!\n[1, a]\n");
}

#[test]
fn conversion_errors_carry_no_line() {
    assert_eq!(
        run_err(r#"to_int("abc");"#),
        "Execution error\n<native fun> invalid argument value in 'to_int'"
    );
    assert_eq!(
        run_err("to_int([1]);"),
        "Execution error\n<native fun> invalid argument type in 'to_int'"
    );
    assert_eq!(
        run_err("to_float(null);"),
        "Execution error\n<native fun> invalid argument type in 'to_float'"
    );
}

#[test]
fn builtin_arity_is_checked() {
    assert_eq!(
        run_err("println(1, 2);"),
        "Execution error\nline 1: <call expression> incorrect number of arguments for 'println'"
    );
}

#[test]
fn recursion_ceiling_builtins() {
    assert_eq!(
        run("println(get_recursion_depth());\nset_recursion_depth(50);\nprintln(get_recursion_depth());"),
        "1024\n50\n"
    );
    assert_eq!(
        run_err("set_recursion_depth(0);"),
        "Execution error\n<native fun> invalid depth value in 'set_recursion_depth'"
    );
    assert_eq!(
        run_err(r#"set_recursion_depth("10");"#),
        "Execution error\n<native fun> invalid argument type in 'set_recursion_depth'"
    );
}

#[test]
fn builtins_render_as_native_functions() {
    assert_eq!(run("println(println);"), "<native fun println>\n");
}

// ══════════════════════════════════════════════════════════════════════════════
// Recursion depth
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn exceeding_the_recursion_ceiling() {
    let err = exec_err(
        r#"set_recursion_depth(10);
fun down(n):
  return down(n + 1);
end
down(0);
"#,
    );
    assert_eq!(err.kind, ErrorKind::Recursion);
    let rendered = err.to_string();
    let mut lines = rendered.lines();
    assert_eq!(lines.next(), Some("Execution error"));
    assert_eq!(
        lines.next(),
        Some("line 3: <callable> max function depth exceeded '10'")
    );
    assert_eq!(err.trace.len(), 10);
    assert_eq!(err.trace.last().map(|f| f.line), Some(5));
}

#[test]
fn deep_recursion_within_a_raised_ceiling() {
    let out = run(
        r#"
set_recursion_depth(5000);
fun sum(n):
  if n == 0:
    return 0;
  end
  return n + sum(n - 1);
end
println(sum(3000));
"#,
    );
    assert_eq!(out, "4501500\n");
}

#[test]
fn depth_resets_after_an_error_in_a_call() {
    let stmts = parse(scan("fun f():\n  return 1 / 0;\nend\n")).into_result().unwrap();
    let call = parse(scan("f();")).into_result().unwrap();
    let mut out = Vec::new();
    let mut interp = Interpreter::with_io(&b""[..], &mut out);
    interp.execute(&stmts).unwrap();
    for _ in 0..3 {
        assert!(interp.execute(&call).is_err());
    }
    interp
        .execute(&parse(scan("set_recursion_depth(1);\nfun g():\n  return 1;\nend\ng();")).into_result().unwrap())
        .unwrap();
}

// ══════════════════════════════════════════════════════════════════════════════
// Errors & traces
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn trace_lists_each_enclosing_call() {
    assert_eq!(
        run_err(
            r#"fun inner():
  return 1 / 0;
end
fun outer():
  return inner();
end
outer();
"#
        ),
        "Execution error\nline 2: <binary expression> division by zero\n  at line 5: inner\n  at line 7: outer"
    );
}

#[test]
fn calling_a_non_callable() {
    assert_eq!(
        run_err("var x = 1;\nx();"),
        "Execution error\nline 2: <call expression> 'x' is not a function or lambda"
    );
}

#[test]
fn function_arity_mismatch() {
    assert_eq!(
        run_err("fun f(a, b):\n  return a;\nend\nf(1);"),
        "Execution error\nline 4: <call expression> incorrect number of arguments for 'f'"
    );
}

#[test]
fn output_before_an_error_is_kept() {
    let (out, result) = exec_with_input("println(1);\nprintln(2 / 0);\nprintln(3);", "");
    assert_eq!(out, "1\n");
    assert!(result.is_err());
}

#[test]
fn errors_serialize_to_json() {
    let err = exec_err("fun f():\n  return nope;\nend\nf();");
    let json = serde_json::to_value(&err).unwrap();
    assert_eq!(json["kind"], "name");
    assert_eq!(json["line"], 2);
    assert_eq!(json["construct"], "variable");
    assert_eq!(json["trace"][0]["callee"], "f");
}

#[test]
fn definitions_persist_across_executions() {
    let mut out = Vec::new();
    {
        let mut interp = Interpreter::with_io(&b""[..], &mut out);
        interp
            .execute(&parse(scan("var total = 1;")).into_result().unwrap())
            .unwrap();
        interp
            .execute(&parse(scan("total += 41;")).into_result().unwrap())
            .unwrap();
        assert_eq!(interp.global("total"), Some(Value::Int(42)));
        let expr = parse_expr(scan("total * 2")).unwrap();
        let value = interp.evaluate(&expr).unwrap();
        assert_eq!(interp.to_str(value), "84");
    }
    assert!(out.is_empty());
}
