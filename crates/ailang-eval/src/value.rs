//! Runtime values (§3.4, §4.6).

use std::fmt;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use ailang_core::Expr;

/// `{params, body, env}` -- a lambda closed over its defining environment.
#[derive(Clone, Debug)]
pub struct Closure {
    pub params: Vec<String>,
    pub body: Rc<Expr>,
    pub env: Env,
}

/// A runtime algebraic data type value: a constructor tag plus its fields.
/// Nullary constructors carry zero fields (§3.4).
#[derive(Clone, Debug, PartialEq)]
pub struct TaggedValue {
    pub type_name: String,
    pub ctor_name: String,
    pub fields: Vec<Value>,
}

/// A class instance's method table at runtime: method name -> callable
/// value (§3.4). Supplied at a `DictApp` call site, read at a `DictRef`.
#[derive(Clone, Debug)]
pub struct Dictionary {
    pub class: String,
    pub methods: FxHashMap<String, Value>,
}

pub type Builtin = Rc<dyn Fn(&[Value]) -> Result<Value, crate::error::RuntimeError>>;

/// A `LetRec` binding's lazy slot (§4.6): evaluation is deferred until the
/// name is first looked up, so mutually recursive bindings can close over
/// each other before any of them has a value yet.
#[derive(Clone)]
pub enum ThunkSlot {
    Pending(Rc<Expr>, Env),
    InProgress,
    Done(Value),
}

#[derive(Clone)]
pub enum Value {
    Int(i64),
    Float(f64),
    Str(Rc<String>),
    Bool(bool),
    Unit,
    List(Rc<Vec<Value>>),
    Tuple(Rc<Vec<Value>>),
    Record(Rc<FxHashMap<String, Value>>),
    Closure(Rc<Closure>),
    Tagged(Rc<TaggedValue>),
    Dictionary(Rc<Dictionary>),
    Builtin { name: Rc<str>, arity: usize, func: Builtin },
    /// Only ever bound by `LetRec`; forced away the first time it's looked
    /// up (§4.6). Never observed by pattern matching or builtin dispatch.
    Thunk(Rc<std::cell::RefCell<ThunkSlot>>),
}

/// Structural equality (§4.6); closures, dictionaries, builtins, and
/// thunks are never equal to anything, including themselves.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.structural_eq(other)
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{n}"),
            Value::Float(n) => write!(f, "{n}"),
            Value::Str(s) => write!(f, "{s:?}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Unit => write!(f, "()"),
            Value::List(xs) => write!(f, "{xs:?}"),
            Value::Tuple(xs) => write!(f, "({xs:?})"),
            Value::Record(fields) => write!(f, "{fields:?}"),
            Value::Closure(_) => write!(f, "<closure>"),
            Value::Tagged(t) => write!(f, "{}::{}({:?})", t.type_name, t.ctor_name, t.fields),
            Value::Dictionary(d) => write!(f, "<dict {}>", d.class),
            Value::Builtin { name, .. } => write!(f, "<builtin {name}>"),
            Value::Thunk(_) => write!(f, "<thunk>"),
        }
    }
}

impl Value {
    pub fn type_tag(&self) -> &'static str {
        match self {
            Value::Int(_) => "Int",
            Value::Float(_) => "Float",
            Value::Str(_) => "String",
            Value::Bool(_) => "Bool",
            Value::Unit => "Unit",
            Value::List(_) => "List",
            Value::Tuple(_) => "Tuple",
            Value::Record(_) => "Record",
            Value::Closure(_) => "Closure",
            Value::Tagged(_) => "Tagged",
            Value::Dictionary(_) => "Dictionary",
            Value::Builtin { .. } => "Builtin",
            Value::Thunk(_) => "Thunk",
        }
    }

    /// Structural equality for literals, tuples, lists, records, and tagged
    /// values (§4.6 pattern matching semantics). Closures and builtins are
    /// never compared.
    pub fn structural_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Unit, Value::Unit) => true,
            (Value::List(a), Value::List(b)) => {
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x.structural_eq(y))
            }
            (Value::Tuple(a), Value::Tuple(b)) => {
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x.structural_eq(y))
            }
            (Value::Tagged(a), Value::Tagged(b)) => {
                a.type_name == b.type_name
                    && a.ctor_name == b.ctor_name
                    && a.fields.len() == b.fields.len()
                    && a.fields.iter().zip(b.fields.iter()).all(|(x, y)| x.structural_eq(y))
            }
            _ => false,
        }
    }
}

/// A chain of lexical scopes (§3.4). Cloning an `Env` is cheap: each scope
/// is reference-counted, so closures can capture one without copying the
/// bindings it holds.
#[derive(Clone, Debug, Default)]
pub struct Env {
    scopes: Rc<Scope>,
}

#[derive(Debug, Default)]
struct Scope {
    parent: Option<Rc<Scope>>,
    bindings: std::cell::RefCell<FxHashMap<String, Value>>,
}

impl Env {
    pub fn root() -> Self {
        Env { scopes: Rc::new(Scope::default()) }
    }

    pub fn child(&self) -> Self {
        Env {
            scopes: Rc::new(Scope { parent: Some(self.scopes.clone()), bindings: Default::default() }),
        }
    }

    pub fn bind(&self, name: impl Into<String>, value: Value) {
        self.scopes.bindings.borrow_mut().insert(name.into(), value);
    }

    pub fn lookup(&self, name: &str) -> Option<Value> {
        let mut scope = Some(self.scopes.as_ref());
        while let Some(s) = scope {
            if let Some(v) = s.bindings.borrow().get(name) {
                return Some(v.clone());
            }
            scope = s.parent.as_deref();
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ailang_common::Span;

    #[test]
    fn child_scope_shadows_without_mutating_parent() {
        let root = Env::root();
        root.bind("x", Value::Int(1));
        let child = root.child();
        child.bind("x", Value::Int(2));
        assert!(matches!(child.lookup("x"), Some(Value::Int(2))));
        assert!(matches!(root.lookup("x"), Some(Value::Int(1))));
    }

    #[test]
    fn structural_eq_compares_tagged_values_by_ctor_and_fields() {
        let a = Value::Tagged(Rc::new(TaggedValue { type_name: "Option".into(), ctor_name: "Some".into(), fields: vec![Value::Int(1)] }));
        let b = Value::Tagged(Rc::new(TaggedValue { type_name: "Option".into(), ctor_name: "Some".into(), fields: vec![Value::Int(1)] }));
        let c = Value::Tagged(Rc::new(TaggedValue { type_name: "Option".into(), ctor_name: "Some".into(), fields: vec![Value::Int(2)] }));
        assert!(a.structural_eq(&b));
        assert!(!a.structural_eq(&c));
    }

    #[test]
    fn structural_eq_never_equates_closures() {
        let env = Env::root();
        let body = Rc::new(Expr::Var { id: 0, name: "x".into(), span: Span::dummy() });
        let c1 = Value::Closure(Rc::new(Closure { params: vec!["x".into()], body: body.clone(), env: env.clone() }));
        let c2 = Value::Closure(Rc::new(Closure { params: vec!["x".into()], body, env }));
        assert!(!c1.structural_eq(&c2));
    }
}
