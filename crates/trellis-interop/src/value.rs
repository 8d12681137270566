use std::fmt;
use std::rc::Rc;

use crate::{CallbackId, JsRef};

/// One positional argument of a marshalled call.
#[derive(Clone)]
pub enum Arg {
    Null,
    Bool(bool),
    Number(f64),
    Int(i64),
    Str(String),
    Ref(JsRef),
    /// Host closure; registered as a proxy when the call is marshalled.
    Callback(crate::Callback),
    /// Proxy that is already registered (the caller manages its lifetime).
    Proxy(CallbackId),
    Array(Vec<Arg>),
    /// Object literal; keys keep their order.
    Object(Vec<(String, Arg)>),
    /// Expression inserted verbatim.
    Raw(String),
}

impl Arg {
    pub fn callback(f: impl Fn(&[Value]) + 'static) -> Self {
        Arg::Callback(Rc::new(f))
    }

    pub fn raw(expr: impl Into<String>) -> Self {
        Arg::Raw(expr.into())
    }
}

impl fmt::Debug for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arg::Null => write!(f, "Null"),
            Arg::Bool(b) => write!(f, "Bool({b})"),
            Arg::Number(n) => write!(f, "Number({n})"),
            Arg::Int(n) => write!(f, "Int({n})"),
            Arg::Str(s) => write!(f, "Str({s:?})"),
            Arg::Ref(r) => write!(f, "Ref({r})"),
            Arg::Callback(_) => write!(f, "Callback(<closure>)"),
            Arg::Proxy(id) => write!(f, "Proxy({id})"),
            Arg::Array(items) => f.debug_tuple("Array").field(items).finish(),
            Arg::Object(fields) => f.debug_tuple("Object").field(fields).finish(),
            Arg::Raw(s) => write!(f, "Raw({s:?})"),
        }
    }
}

impl From<&str> for Arg {
    fn from(s: &str) -> Self {
        Arg::Str(s.to_string())
    }
}

impl From<String> for Arg {
    fn from(s: String) -> Self {
        Arg::Str(s)
    }
}

impl From<&String> for Arg {
    fn from(s: &String) -> Self {
        Arg::Str(s.clone())
    }
}

impl From<f64> for Arg {
    fn from(v: f64) -> Self {
        Arg::Number(v)
    }
}

impl From<f32> for Arg {
    fn from(v: f32) -> Self {
        Arg::Number(v as f64)
    }
}

impl From<i32> for Arg {
    fn from(v: i32) -> Self {
        Arg::Int(v as i64)
    }
}

impl From<i64> for Arg {
    fn from(v: i64) -> Self {
        Arg::Int(v)
    }
}

impl From<u32> for Arg {
    fn from(v: u32) -> Self {
        Arg::Int(v as i64)
    }
}

impl From<u64> for Arg {
    fn from(v: u64) -> Self {
        Arg::Int(v as i64)
    }
}

impl From<usize> for Arg {
    fn from(v: usize) -> Self {
        Arg::Int(v as i64)
    }
}

impl From<bool> for Arg {
    fn from(b: bool) -> Self {
        Arg::Bool(b)
    }
}

impl From<JsRef> for Arg {
    fn from(r: JsRef) -> Self {
        Arg::Ref(r)
    }
}

impl From<&JsRef> for Arg {
    fn from(r: &JsRef) -> Self {
        Arg::Ref(*r)
    }
}

impl<T: Into<Arg>> From<Option<T>> for Arg {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Arg::Null)
    }
}

/// Decoded result of a synchronous call or argument of a callback.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Value {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Ref(JsRef),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_js_ref(&self) -> Option<JsRef> {
        match self {
            Value::Ref(r) => Some(*r),
            _ => None,
        }
    }

    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }
}

/// What a bridge hands back before the marshaller decodes it.
#[derive(Clone, Debug, PartialEq)]
pub enum BridgeValue<H> {
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Object(H),
}

/// Invariant decimal form: `.` separator, no grouping, JS literals for
/// non-finite values.
pub fn encode_number(v: f64) -> String {
    if v.is_nan() {
        "NaN".to_string()
    } else if v.is_infinite() {
        if v > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else {
        format!("{v}")
    }
}

/// Quoted, escaped string literal.
pub fn encode_string(s: &str) -> String {
    serde_json::Value::String(s.to_owned()).to_string()
}
