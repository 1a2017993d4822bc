// ABOUTME: Tests for the macros and functions the bootstrap file installs

use lisp_vm::builtins::register_builtins;
use lisp_vm::context::Context;
use lisp_vm::parser::{parse, run_parser};

fn setup() -> Context {
    let mut context = Context::new();
    register_builtins(&mut context, &[]);
    let boot = include_str!("../src/boot.lisp");
    run_parser(boot, |datum| -> Result<(), String> {
        let expr = datum.map_err(|e| e.to_string())?;
        context.eval(expr).map(|_| ()).map_err(|e| e.to_string())
    })
    .expect("boot should load");
    context
}

fn eval_ok(context: &Context, source: &str) -> String {
    context
        .eval(parse(source).unwrap())
        .unwrap_or_else(|e| panic!("{} failed: {}", source, e))
        .to_string()
}

#[test]
fn test_list_and_helpers() {
    let context = setup();
    assert_eq!(eval_ok(&context, "(list 1 2 3)"), "(1 2 3)");
    assert_eq!(eval_ok(&context, "(list)"), "()");
    assert_eq!(eval_ok(&context, "(cadr '(1 2 3))"), "2");
    assert_eq!(eval_ok(&context, "(cddr '(1 2 3))"), "(3)");
    assert_eq!(eval_ok(&context, "(not #f)"), "#t");
    assert_eq!(eval_ok(&context, "(not 0)"), "#f");
}

#[test]
fn test_append_and_map() {
    let context = setup();
    assert_eq!(eval_ok(&context, "(append '(1 2) '(3 4))"), "(1 2 3 4)");
    assert_eq!(eval_ok(&context, "(append '() '(1))"), "(1)");
    assert_eq!(
        eval_ok(&context, "(map (fun (x) (* x x)) '(1 2 3))"),
        "(1 4 9)"
    );
    assert_eq!(eval_ok(&context, "(map car '((1 2) (3 4)))"), "(1 3)");
}

#[test]
fn test_defun_and_defmacro() {
    let context = setup();
    eval_ok(&context, "(defun square (x) (* x x))");
    assert_eq!(eval_ok(&context, "(square 7)"), "49");

    eval_ok(&context, "(defmacro const-five () 5)");
    assert_eq!(eval_ok(&context, "(const-five)"), "5");
    assert_eq!(eval_ok(&context, "(meta? const-five)"), "#t");
}

#[test]
fn test_let_binds_in_parallel() {
    let context = setup();
    assert_eq!(eval_ok(&context, "(let ((x 1) (y 2)) (+ x y))"), "3");
    // Parallel, not sequential: inner x refers to the outer scope.
    eval_ok(&context, "(def x 10)");
    assert_eq!(eval_ok(&context, "(let ((x 1) (y x)) y)"), "10");
}

#[test]
fn test_when_and_unless() {
    let context = setup();
    assert_eq!(eval_ok(&context, "(when #t 1 2)"), "2");
    assert_eq!(eval_ok(&context, "(when #f 1 2)"), "()");
    assert_eq!(eval_ok(&context, "(unless #f 'ran)"), "ran");
    assert_eq!(eval_ok(&context, "(unless #t 'ran)"), "()");
}

#[test]
fn test_cond_takes_first_truthy_clause() {
    let context = setup();
    eval_ok(
        &context,
        "(defun classify (n) (cond ((< n 0) 'negative) ((= n 0) 'zero) (#t 'positive)))",
    );
    assert_eq!(eval_ok(&context, "(classify -5)"), "negative");
    assert_eq!(eval_ok(&context, "(classify 0)"), "zero");
    assert_eq!(eval_ok(&context, "(classify 3)"), "positive");
    assert_eq!(eval_ok(&context, "(cond)"), "()");
    assert_eq!(eval_ok(&context, "(cond (#f 1))"), "()");
}

#[test]
fn test_and_or_short_circuit() {
    let context = setup();
    assert_eq!(eval_ok(&context, "(and)"), "#t");
    assert_eq!(eval_ok(&context, "(and 1 2 3)"), "3");
    assert_eq!(eval_ok(&context, "(and #f (error \"not reached\"))"), "#f");
    assert_eq!(eval_ok(&context, "(or)"), "#f");
    assert_eq!(eval_ok(&context, "(or #f 2)"), "2");
    assert_eq!(eval_ok(&context, "(or 1 (error \"not reached\"))"), "1");
    // or evaluates its test once.
    eval_ok(&context, "(def hits 0)");
    eval_ok(&context, "(defun bump () (set! hits (+ hits 1)) hits)");
    assert_eq!(eval_ok(&context, "(or (bump) 99)"), "1");
    assert_eq!(eval_ok(&context, "hits"), "1");
}

#[test]
fn test_quasiquote_unquote_and_splicing() {
    let context = setup();
    assert_eq!(eval_ok(&context, "`x"), "x");
    assert_eq!(eval_ok(&context, "`(1 2 3)"), "(1 2 3)");
    assert_eq!(eval_ok(&context, "(begin (def x 5) `(a ,x b))"), "(a 5 b)");
    assert_eq!(
        eval_ok(&context, "`(1 ,(+ 1 1) ,@(list 3 4) 5)"),
        "(1 2 3 4 5)"
    );
    assert_eq!(eval_ok(&context, "`(a (b ,(+ 2 3)))"), "(a (b 5))");
    assert_eq!(eval_ok(&context, "`(,@(list 1 2))"), "(1 2)");
}

#[test]
fn test_quasiquote_in_macro_definitions() {
    let context = setup();
    eval_ok(
        &context,
        "(defmacro swap! (a b) `(let ((tmp ,a)) (set! ,a ,b) (set! ,b tmp)))",
    );
    eval_ok(&context, "(def p 1)");
    eval_ok(&context, "(def q 2)");
    eval_ok(&context, "(swap! p q)");
    assert_eq!(eval_ok(&context, "p"), "2");
    assert_eq!(eval_ok(&context, "q"), "1");
}

#[test]
fn test_or_expansion_avoids_capture() {
    let context = setup();
    // The binding or introduces must not capture a user variable named tmp.
    eval_ok(&context, "(def tmp 'outer)");
    assert_eq!(eval_ok(&context, "(or #f tmp)"), "outer");
}
