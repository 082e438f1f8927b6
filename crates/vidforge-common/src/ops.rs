//! The operation mini-language.
//!
//! Clients describe a job as an ordered list of raw strings, each either a
//! bare `name` or `name:key1=val1,key2=val2`. [`parse_ops`] turns that list
//! into [`Operation`] descriptors with loosely typed [`OpValue`] arguments.
//!
//! ```
//! use vidforge_common::{parse_ops, OpValue};
//!
//! let ops = parse_ops(["resize:width=1280,height=-2", "grayscale"]);
//! assert_eq!(ops.len(), 2);
//! assert_eq!(ops[0].name, "resize");
//! assert_eq!(ops[0].get("width"), Some(&OpValue::Int(1280)));
//! assert_eq!(ops[0].get("height"), Some(&OpValue::Str("-2".into())));
//! ```

use std::collections::BTreeMap;
use std::fmt;

/// A coerced operation argument value.
#[derive(Debug, Clone, PartialEq)]
pub enum OpValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl OpValue {
    /// Coerce a raw argument value.
    ///
    /// Priority: case-insensitive `true`/`false`, then all-digit integers,
    /// then anything containing a `.` as a float. Values that fail numeric
    /// conversion are kept as strings.
    pub fn parse(raw: &str) -> Self {
        let v = raw.trim();

        if v.eq_ignore_ascii_case("true") {
            return OpValue::Bool(true);
        }
        if v.eq_ignore_ascii_case("false") {
            return OpValue::Bool(false);
        }

        if !v.is_empty() && v.bytes().all(|b| b.is_ascii_digit()) {
            return v
                .parse::<i64>()
                .map(OpValue::Int)
                .unwrap_or_else(|_| OpValue::Str(v.to_string()));
        }

        if v.contains('.') {
            if let Ok(f) = v.parse::<f64>() {
                return OpValue::Float(f);
            }
        }

        OpValue::Str(v.to_string())
    }

    /// Truthiness: non-zero numbers, `true`, and non-empty strings.
    pub fn is_truthy(&self) -> bool {
        match self {
            OpValue::Bool(b) => *b,
            OpValue::Int(i) => *i != 0,
            OpValue::Float(f) => *f != 0.0,
            OpValue::Str(s) => !s.is_empty(),
        }
    }

    /// Integer view of the value. Floats are truncated toward zero.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            OpValue::Bool(b) => Some(i64::from(*b)),
            OpValue::Int(i) => Some(*i),
            OpValue::Float(f) if f.is_finite() => Some(f.trunc() as i64),
            OpValue::Float(_) => None,
            OpValue::Str(s) => {
                let s = s.trim();
                s.parse::<i64>().ok().or_else(|| {
                    s.parse::<f64>()
                        .ok()
                        .filter(|f| f.is_finite())
                        .map(|f| f.trunc() as i64)
                })
            }
        }
    }
}

impl fmt::Display for OpValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OpValue::Bool(b) => write!(f, "{b}"),
            OpValue::Int(i) => write!(f, "{i}"),
            // Integral floats keep their decimal point: `2.0`, not `2`.
            OpValue::Float(x) if x.is_finite() && x.fract() == 0.0 => write!(f, "{x:.1}"),
            OpValue::Float(x) => write!(f, "{x}"),
            OpValue::Str(s) => f.write_str(s),
        }
    }
}

/// A parsed operation descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    /// Lower-cased operation name. Unknown names are kept; the compiler
    /// ignores them.
    pub name: String,
    /// Keyword arguments. A key given without `=` is recorded as `true`.
    pub args: BTreeMap<String, OpValue>,
}

impl Operation {
    /// Create an operation with no arguments.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: BTreeMap::new(),
        }
    }

    /// Look up an argument.
    pub fn get(&self, key: &str) -> Option<&OpValue> {
        self.args.get(key)
    }

    /// Whether an argument is present and truthy.
    pub fn flag(&self, key: &str) -> bool {
        self.get(key).is_some_and(OpValue::is_truthy)
    }

    /// Render an argument for the command line, or `default` when absent.
    pub fn value_or(&self, key: &str, default: &str) -> String {
        self.get(key)
            .map(ToString::to_string)
            .unwrap_or_else(|| default.to_string())
    }
}

/// Parse a single raw operation string.
///
/// Returns `None` for empty input.
pub fn parse_op(raw: &str) -> Option<Operation> {
    if raw.trim().is_empty() {
        return None;
    }

    let (name, arg_list) = match raw.split_once(':') {
        Some((name, args)) => (name, args),
        None => (raw, ""),
    };

    let mut op = Operation::new(name.trim().to_lowercase());

    for part in arg_list.split(',').filter(|p| !p.is_empty()) {
        match part.split_once('=') {
            Some((key, value)) => {
                op.args.insert(key.trim().to_string(), OpValue::parse(value));
            }
            None => {
                op.args.insert(part.trim().to_string(), OpValue::Bool(true));
            }
        }
    }

    Some(op)
}

/// Parse an ordered list of raw operation strings, preserving order and
/// duplicates.
pub fn parse_ops<I, S>(raws: I) -> Vec<Operation>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    raws.into_iter()
        .filter_map(|raw| parse_op(raw.as_ref()))
        .collect()
}
