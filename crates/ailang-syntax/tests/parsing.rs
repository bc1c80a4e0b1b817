//! Integration tests for the surface parser against the §8.4 scenario
//! sources and a handful of structural edge cases.

use ailang_syntax::ast::*;
use ailang_syntax::parse;

#[test]
fn parses_arithmetic_with_precedence() {
    let file = parse("func main() -> Int { 1 + 2 * 3 }").unwrap();
    assert_eq!(file.decls.len(), 1);
    let Decl::Func(f) = &file.decls[0] else {
        panic!("expected a func decl");
    };
    match &f.body {
        Expr::Block(stmts, _) => match &stmts[0] {
            Expr::BinOp { op: BinOp::Add, rhs, .. } => {
                assert!(matches!(**rhs, Expr::BinOp { op: BinOp::Mul, .. }));
            }
            other => panic!("unexpected body: {other:?}"),
        },
        other => panic!("expected a block body: {other:?}"),
    }
}

#[test]
fn parses_option_sum_type_and_match() {
    let src = r#"
        type Option[a] = Some(a) | None
        func main() -> Int {
            match Some(42) {
                Some(n) => n,
                None => 0,
            }
        }
    "#;
    let file = parse(src).unwrap();
    assert_eq!(file.decls.len(), 2);
    let Decl::TypeDef(def) = &file.decls[0] else {
        panic!("expected a type def");
    };
    assert_eq!(def.name, "Option");
    assert_eq!(def.ctors.len(), 2);
    assert_eq!(def.ctors[0].name, "Some");
    assert_eq!(def.ctors[1].name, "None");
}

#[test]
fn parses_effect_annotation() {
    let src = r#"func main() -> () ! {IO} { _io_println("ok") }"#;
    let file = parse(src).unwrap();
    let Decl::Func(f) = &file.decls[0] else {
        panic!("expected a func decl");
    };
    let effects = f.effects.as_ref().expect("effects annotation present");
    assert_eq!(effects.len(), 1);
    assert_eq!(effects[0].0, "IO");
}

#[test]
fn parses_selective_import() {
    let src = "import Geometry (Point, distance)\nfunc main() -> Int { 0 }";
    let file = parse(src).unwrap();
    assert_eq!(file.imports.len(), 1);
    assert_eq!(file.imports[0].module_path, "Geometry");
    assert_eq!(
        file.imports[0].names.as_ref().unwrap(),
        &vec!["Point".to_string(), "distance".to_string()]
    );
}

#[test]
fn parses_namespace_import_with_no_name_list() {
    let src = "import Geometry\nfunc main() -> Int { 0 }";
    let file = parse(src).unwrap();
    assert!(file.imports[0].names.is_none());
}

#[test]
fn parses_list_pattern_with_tail() {
    let src = r#"
        func head(xs: List[Int]) -> Int {
            match xs {
                [] => 0,
                [x, ...rest] => x,
            }
        }
    "#;
    let file = parse(src).unwrap();
    let Decl::Func(f) = &file.decls[0] else { panic!() };
    let Expr::Block(stmts, _) = &f.body else { panic!() };
    let Expr::Match { arms, .. } = &stmts[0] else { panic!() };
    assert_eq!(arms.len(), 2);
    match &arms[1].pattern {
        Pattern::List { elements, tail, .. } => {
            assert_eq!(elements.len(), 1);
            assert!(tail.is_some());
        }
        other => panic!("unexpected pattern: {other:?}"),
    }
}

#[test]
fn unterminated_block_is_a_parse_error_not_a_panic() {
    let err = parse("func main() -> Int { 1 + ").unwrap_err();
    assert!(!err.message.is_empty());
}

#[test]
fn duplicate_pattern_bindings_are_detectable_by_caller() {
    // The parser itself doesn't reject duplicate bindings (that's an
    // elaboration-time concern, §3.3); it just needs to expose them.
    let pat = Pattern::Tuple(
        vec![
            Pattern::Var("x".into(), ailang_common::Span::dummy()),
            Pattern::Var("x".into(), ailang_common::Span::dummy()),
        ],
        ailang_common::Span::dummy(),
    );
    let mut vars = Vec::new();
    pat.bound_vars(&mut vars);
    assert_eq!(vars, vec!["x", "x"]);
}
