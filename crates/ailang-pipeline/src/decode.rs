//! The JSON-Arg Decoder (§6.1): type-directed decoding from a
//! `serde_json::Value` into an AILANG runtime [`Value`], using the
//! parameter's inferred type to disambiguate JSON's untyped `number` into
//! `Int` or `Float`, and to walk a record's field types for `object`.

use rustc_hash::FxHashMap;
use std::rc::Rc;

use ailang_eval::Value;
use ailang_types::Ty;

use crate::error::PipelineError;

/// `null → Unit`, `number → Int` (or `Float` by type), `string → String`,
/// `bool → Bool`, `array → List`, `object → Record`.
pub fn decode_json_arg(json: &serde_json::Value, ty: &Ty) -> Result<Value, PipelineError> {
    match (json, ty) {
        (serde_json::Value::Null, _) => Ok(Value::Unit),
        (serde_json::Value::Bool(b), _) => Ok(Value::Bool(*b)),
        (serde_json::Value::String(s), _) => Ok(Value::Str(Rc::new(s.clone()))),
        (serde_json::Value::Number(n), Ty::Con(con)) if con.name == "Float" => {
            n.as_f64().map(Value::Float).ok_or(PipelineError::ArgDecode { expected: "Float".to_string(), found: "number" })
        }
        (serde_json::Value::Number(n), _) => {
            if let Some(i) = n.as_i64() {
                Ok(Value::Int(i))
            } else if let Some(f) = n.as_f64() {
                Ok(Value::Float(f))
            } else {
                Err(PipelineError::ArgDecode { expected: ty.to_string(), found: "number" })
            }
        }
        (serde_json::Value::Array(items), Ty::App(_, args)) if ty.head_name() == Some("List") => {
            let elem_ty = args.first().cloned().unwrap_or(Ty::unit());
            let decoded: Result<Vec<Value>, PipelineError> = items.iter().map(|item| decode_json_arg(item, &elem_ty)).collect();
            Ok(Value::List(Rc::new(decoded?)))
        }
        (serde_json::Value::Array(_), _) => Err(PipelineError::ArgDecode { expected: ty.to_string(), found: "array" }),
        (serde_json::Value::Object(fields), Ty::Record(row)) => {
            let mut out = FxHashMap::default();
            for (label, field_ty) in &row.fields {
                let Some(value) = fields.get(label) else {
                    return Err(PipelineError::ArgDecode { expected: format!("a field '{label}'"), found: "object" });
                };
                out.insert(label.clone(), decode_json_arg(value, field_ty)?);
            }
            Ok(Value::Record(Rc::new(out)))
        }
        (serde_json::Value::Object(_), _) => Err(PipelineError::ArgDecode { expected: ty.to_string(), found: "object" }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ailang_types::{RecordRow, TyCon};

    #[test]
    fn null_decodes_to_unit() {
        assert!(matches!(decode_json_arg(&serde_json::Value::Null, &Ty::unit()).unwrap(), Value::Unit));
    }

    #[test]
    fn whole_number_decodes_to_int_by_default() {
        let v = decode_json_arg(&serde_json::json!(42), &Ty::int()).unwrap();
        assert!(matches!(v, Value::Int(42)));
    }

    #[test]
    fn number_decodes_to_float_when_the_type_says_so() {
        let v = decode_json_arg(&serde_json::json!(3), &Ty::float()).unwrap();
        assert!(matches!(v, Value::Float(f) if f == 3.0));
    }

    #[test]
    fn string_and_bool_decode_directly() {
        assert!(matches!(decode_json_arg(&serde_json::json!("hi"), &Ty::string()).unwrap(), Value::Str(s) if &*s == "hi"));
        assert!(matches!(decode_json_arg(&serde_json::json!(true), &Ty::bool()).unwrap(), Value::Bool(true)));
    }

    #[test]
    fn array_decodes_element_by_element_using_the_list_type_argument() {
        let ty = Ty::list(Ty::int());
        let v = decode_json_arg(&serde_json::json!([1, 2, 3]), &ty).unwrap();
        match v {
            Value::List(xs) => assert_eq!(xs.len(), 3),
            other => panic!("expected a List, got {other:?}"),
        }
    }

    #[test]
    fn object_decodes_into_a_record_field_by_field() {
        let ty = Ty::Record(RecordRow::closed([("x".to_string(), Ty::int()), ("y".to_string(), Ty::string())]));
        let v = decode_json_arg(&serde_json::json!({"x": 1, "y": "a"}), &ty).unwrap();
        match v {
            Value::Record(fields) => {
                assert!(matches!(fields.get("x"), Some(Value::Int(1))));
                assert!(matches!(fields.get("y"), Some(Value::Str(s)) if &**s == "a"));
            }
            other => panic!("expected a Record, got {other:?}"),
        }
    }

    #[test]
    fn missing_record_field_is_reported() {
        let ty = Ty::Record(RecordRow::closed([("x".to_string(), Ty::int())]));
        let err = decode_json_arg(&serde_json::json!({}), &ty).unwrap_err();
        assert!(matches!(err, PipelineError::ArgDecode { .. }));
    }

    #[test]
    fn unsupported_shape_combination_is_reported_rather_than_panicking() {
        let ty = Ty::Con(TyCon::new("Bogus"));
        let err = decode_json_arg(&serde_json::json!([1]), &ty).unwrap_err();
        assert!(matches!(err, PipelineError::ArgDecode { .. }));
    }
}
