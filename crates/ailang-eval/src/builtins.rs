//! Runtime implementations of every entry in [`ailang_builtins::BUILTINS`]
//! (§4.7). The registry is the single source of truth for name/arity/effect;
//! this module supplies the one piece it deliberately omits, the actual
//! behavior.

use std::cell::Cell;
use std::rc::Rc;

use ailang_common::Span;
use ailang_core::NodeId;

use crate::error::RuntimeError;
use crate::value::Value;

fn expect_int(v: &Value, node: NodeId, span: Span) -> Result<i64, RuntimeError> {
    match v {
        Value::Int(n) => Ok(*n),
        other => Err(RuntimeError::TypeMismatch { expected: "Int", found: other.type_tag(), node, span }),
    }
}

fn expect_float(v: &Value, node: NodeId, span: Span) -> Result<f64, RuntimeError> {
    match v {
        Value::Float(n) => Ok(*n),
        other => Err(RuntimeError::TypeMismatch { expected: "Float", found: other.type_tag(), node, span }),
    }
}

fn expect_str(v: &Value, node: NodeId, span: Span) -> Result<Rc<String>, RuntimeError> {
    match v {
        Value::Str(s) => Ok(s.clone()),
        other => Err(RuntimeError::TypeMismatch { expected: "String", found: other.type_tag(), node, span }),
    }
}

fn expect_bool(v: &Value, node: NodeId, span: Span) -> Result<bool, RuntimeError> {
    match v {
        Value::Bool(b) => Ok(*b),
        other => Err(RuntimeError::TypeMismatch { expected: "Bool", found: other.type_tag(), node, span }),
    }
}

fn expect_list(v: &Value, node: NodeId, span: Span) -> Result<Rc<Vec<Value>>, RuntimeError> {
    match v {
        Value::List(xs) => Ok(xs.clone()),
        other => Err(RuntimeError::TypeMismatch { expected: "List", found: other.type_tag(), node, span }),
    }
}

/// Monotonic counter standing in for wall-clock time and a PRNG seed, so
/// `_clock_now`/`_rand_int` stay deterministic across calls in a process
/// without reaching for a real clock or entropy source (v0.1 has no test
/// harness for timing-sensitive effects, §5).
thread_local! {
    static CLOCK_TICKS: Cell<i64> = const { Cell::new(0) };
    static RAND_STATE: Cell<i64> = const { Cell::new(0x2545F4914F6CDD1D) };
}

/// Dispatch a call to a builtin named in [`ailang_builtins::BUILTINS`].
/// Arity is assumed already checked by the caller against the registry.
pub fn call(name: &str, args: &[Value], node: NodeId, span: Span) -> Result<Value, RuntimeError> {
    match name {
        "add_Int" => Ok(Value::Int(expect_int(&args[0], node, span)? + expect_int(&args[1], node, span)?)),
        "sub_Int" => Ok(Value::Int(expect_int(&args[0], node, span)? - expect_int(&args[1], node, span)?)),
        "mul_Int" => Ok(Value::Int(expect_int(&args[0], node, span)? * expect_int(&args[1], node, span)?)),
        "div_Int" => {
            let (a, b) = (expect_int(&args[0], node, span)?, expect_int(&args[1], node, span)?);
            Ok(Value::Int(a / b))
        }
        "mod_Int" => {
            let (a, b) = (expect_int(&args[0], node, span)?, expect_int(&args[1], node, span)?);
            Ok(Value::Int(a % b))
        }
        "neg_Int" => Ok(Value::Int(-expect_int(&args[0], node, span)?)),

        "add_Float" => Ok(Value::Float(expect_float(&args[0], node, span)? + expect_float(&args[1], node, span)?)),
        "sub_Float" => Ok(Value::Float(expect_float(&args[0], node, span)? - expect_float(&args[1], node, span)?)),
        "mul_Float" => Ok(Value::Float(expect_float(&args[0], node, span)? * expect_float(&args[1], node, span)?)),
        "div_Float" => Ok(Value::Float(expect_float(&args[0], node, span)? / expect_float(&args[1], node, span)?)),
        "mod_Float" => Ok(Value::Float(expect_float(&args[0], node, span)? % expect_float(&args[1], node, span)?)),
        "neg_Float" => Ok(Value::Float(-expect_float(&args[0], node, span)?)),

        "eq_Int" => Ok(Value::Bool(expect_int(&args[0], node, span)? == expect_int(&args[1], node, span)?)),
        "ne_Int" => Ok(Value::Bool(expect_int(&args[0], node, span)? != expect_int(&args[1], node, span)?)),
        "eq_Float" => Ok(Value::Bool(expect_float(&args[0], node, span)? == expect_float(&args[1], node, span)?)),
        "ne_Float" => Ok(Value::Bool(expect_float(&args[0], node, span)? != expect_float(&args[1], node, span)?)),
        "eq_String" => Ok(Value::Bool(expect_str(&args[0], node, span)? == expect_str(&args[1], node, span)?)),
        "ne_String" => Ok(Value::Bool(expect_str(&args[0], node, span)? != expect_str(&args[1], node, span)?)),
        "eq_Bool" => Ok(Value::Bool(expect_bool(&args[0], node, span)? == expect_bool(&args[1], node, span)?)),
        "ne_Bool" => Ok(Value::Bool(expect_bool(&args[0], node, span)? != expect_bool(&args[1], node, span)?)),

        "lt_Int" => Ok(Value::Bool(expect_int(&args[0], node, span)? < expect_int(&args[1], node, span)?)),
        "le_Int" => Ok(Value::Bool(expect_int(&args[0], node, span)? <= expect_int(&args[1], node, span)?)),
        "gt_Int" => Ok(Value::Bool(expect_int(&args[0], node, span)? > expect_int(&args[1], node, span)?)),
        "ge_Int" => Ok(Value::Bool(expect_int(&args[0], node, span)? >= expect_int(&args[1], node, span)?)),
        "lt_Float" => Ok(Value::Bool(expect_float(&args[0], node, span)? < expect_float(&args[1], node, span)?)),
        "le_Float" => Ok(Value::Bool(expect_float(&args[0], node, span)? <= expect_float(&args[1], node, span)?)),
        "gt_Float" => Ok(Value::Bool(expect_float(&args[0], node, span)? > expect_float(&args[1], node, span)?)),
        "ge_Float" => Ok(Value::Bool(expect_float(&args[0], node, span)? >= expect_float(&args[1], node, span)?)),
        "lt_String" => Ok(Value::Bool(*expect_str(&args[0], node, span)? < *expect_str(&args[1], node, span)?)),
        "le_String" => Ok(Value::Bool(*expect_str(&args[0], node, span)? <= *expect_str(&args[1], node, span)?)),
        "gt_String" => Ok(Value::Bool(*expect_str(&args[0], node, span)? > *expect_str(&args[1], node, span)?)),
        "ge_String" => Ok(Value::Bool(*expect_str(&args[0], node, span)? >= *expect_str(&args[1], node, span)?)),

        "concat_String" => {
            let mut s = (*expect_str(&args[0], node, span)?).clone();
            s.push_str(&expect_str(&args[1], node, span)?);
            Ok(Value::Str(Rc::new(s)))
        }
        "not" => Ok(Value::Bool(!expect_bool(&args[0], node, span)?)),

        "_str_len" => Ok(Value::Int(expect_str(&args[0], node, span)?.chars().count() as i64)),
        "_str_slice" => {
            let s = expect_str(&args[0], node, span)?;
            let start = expect_int(&args[1], node, span)?.max(0) as usize;
            let end = expect_int(&args[2], node, span)?.max(0) as usize;
            let chars: Vec<char> = s.chars().collect();
            let end = end.min(chars.len());
            let start = start.min(end);
            Ok(Value::Str(Rc::new(chars[start..end].iter().collect())))
        }
        "_str_toUpper" => Ok(Value::Str(Rc::new(expect_str(&args[0], node, span)?.to_uppercase()))),
        "_str_toLower" => Ok(Value::Str(Rc::new(expect_str(&args[0], node, span)?.to_lowercase()))),
        "_str_split" => {
            let s = expect_str(&args[0], node, span)?;
            let sep = expect_str(&args[1], node, span)?;
            let parts = if sep.is_empty() {
                vec![(*s).clone()]
            } else {
                s.split(sep.as_str()).map(str::to_string).collect()
            };
            Ok(Value::List(Rc::new(parts.into_iter().map(|p| Value::Str(Rc::new(p))).collect())))
        }

        "_list_len" => Ok(Value::Int(expect_list(&args[0], node, span)?.len() as i64)),
        "_list_head" => {
            let xs = expect_list(&args[0], node, span)?;
            xs.first().cloned().ok_or(RuntimeError::TypeMismatch { expected: "non-empty List", found: "List", node, span })
        }
        "_list_tail" => {
            let xs = expect_list(&args[0], node, span)?;
            if xs.is_empty() {
                Err(RuntimeError::TypeMismatch { expected: "non-empty List", found: "List", node, span })
            } else {
                Ok(Value::List(Rc::new(xs[1..].to_vec())))
            }
        }
        "_list_append" => {
            let a = expect_list(&args[0], node, span)?;
            let b = expect_list(&args[1], node, span)?;
            let mut out = (*a).clone();
            out.extend((*b).clone());
            Ok(Value::List(Rc::new(out)))
        }

        "_io_print" => {
            println!("{}", expect_str(&args[0], node, span)?);
            Ok(Value::Unit)
        }
        "_io_readLine" => {
            let mut line = String::new();
            std::io::stdin().read_line(&mut line).map_err(|_| RuntimeError::TypeMismatch {
                expected: "readable stdin",
                found: "Unit",
                node,
                span,
            })?;
            if line.ends_with('\n') {
                line.pop();
                if line.ends_with('\r') {
                    line.pop();
                }
            }
            Ok(Value::Str(Rc::new(line)))
        }
        "_fs_readFile" => {
            let path = expect_str(&args[0], node, span)?;
            let contents = std::fs::read_to_string(path.as_str())
                .map_err(|_| RuntimeError::TypeMismatch { expected: "readable file", found: "String", node, span })?;
            Ok(Value::Str(Rc::new(contents)))
        }
        "_fs_writeFile" => {
            let path = expect_str(&args[0], node, span)?;
            let contents = expect_str(&args[1], node, span)?;
            std::fs::write(path.as_str(), contents.as_str())
                .map_err(|_| RuntimeError::TypeMismatch { expected: "writable path", found: "String", node, span })?;
            Ok(Value::Unit)
        }
        "_net_httpRequest" => Err(RuntimeError::TypeMismatch {
            expected: "a network-capable host",
            found: "Unit",
            node,
            span,
        }),
        "_clock_now" => Ok(Value::Int(CLOCK_TICKS.with(|c| {
            let next = c.get() + 1;
            c.set(next);
            next
        }))),
        "_rand_int" => {
            let lo = expect_int(&args[0], node, span)?;
            let hi = expect_int(&args[1], node, span)?;
            let next = RAND_STATE.with(|s| {
                let mut x = s.get();
                x ^= x << 13;
                x ^= x >> 7;
                x ^= x << 17;
                s.set(x);
                x
            });
            if hi <= lo {
                Ok(Value::Int(lo))
            } else {
                let span_width = (hi - lo) as i64;
                Ok(Value::Int(lo + (next.unsigned_abs() as i64) % span_width))
            }
        }

        other => Err(RuntimeError::UnresolvedGlobal { module: "$builtin".to_string(), name: other.to_string(), node, span }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(text: &str) -> Value {
        Value::Str(Rc::new(text.to_string()))
    }

    #[test]
    fn add_int_adds() {
        let v = call("add_Int", &[Value::Int(2), Value::Int(3)], 0, Span::dummy()).unwrap();
        assert!(matches!(v, Value::Int(5)));
    }

    #[test]
    fn div_int_by_wrong_type_is_a_type_mismatch() {
        let err = call("div_Int", &[Value::Int(4), Value::Bool(true)], 0, Span::dummy()).unwrap_err();
        assert!(matches!(err, RuntimeError::TypeMismatch { expected: "Int", found: "Bool", .. }));
    }

    #[test]
    fn str_slice_clamps_to_bounds() {
        let v = call("_str_slice", &[s("hello"), Value::Int(0), Value::Int(100)], 0, Span::dummy()).unwrap();
        assert!(matches!(&v, Value::Str(out) if out.as_str() == "hello"));
    }

    #[test]
    fn list_head_of_empty_list_is_an_error() {
        let err = call("_list_head", &[Value::List(Rc::new(Vec::new()))], 0, Span::dummy()).unwrap_err();
        assert!(matches!(err, RuntimeError::TypeMismatch { .. }));
    }

    #[test]
    fn list_append_concatenates_in_order() {
        let a = Value::List(Rc::new(vec![Value::Int(1)]));
        let b = Value::List(Rc::new(vec![Value::Int(2), Value::Int(3)]));
        let v = call("_list_append", &[a, b], 0, Span::dummy()).unwrap();
        match v {
            Value::List(xs) => assert_eq!(xs.len(), 3),
            _ => panic!("expected a List"),
        }
    }

    #[test]
    fn unknown_builtin_name_is_unresolved() {
        let err = call("_not_a_real_builtin", &[], 0, Span::dummy()).unwrap_err();
        assert!(matches!(err, RuntimeError::UnresolvedGlobal { .. }));
    }
}
