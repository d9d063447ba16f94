//! Stable textual form of argument values, as literals of the target language.
//!
//! Rendering is total over representable values and byte-identical across
//! runs: mapping entries are ordered by their rendered key. A single-entry
//! mapping `{"$ref": name}` renders as the bare identifier `name`.

use super::error::ReprError;
use regex::Regex;
use serde_yaml_ng::{Mapping, Number, Value};
use std::fmt::Write;
use std::sync::OnceLock;

/// Mapping key marking a reference to a previously produced name.
pub const REF_KEY: &str = "$ref";

/// Render a value as a single-line literal.
pub fn render(value: &Value) -> Result<String, ReprError> {
    let mut out = String::new();
    write_value(&mut out, value)?;
    Ok(out)
}

/// A `{"$ref": name}` value referring to `name`.
pub fn reference(name: &str) -> Value {
    let mut map = Mapping::new();
    map.insert(Value::String(REF_KEY.to_string()), Value::String(name.to_string()));
    Value::Mapping(map)
}

fn identifier() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid identifier regex"))
}

fn dotted_identifier() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)*$")
            .expect("valid dotted identifier regex")
    })
}

/// A plain ASCII identifier, usable as an assignment target.
pub(crate) fn is_identifier(name: &str) -> bool {
    identifier().is_match(name)
}

/// An identifier or an attribute chain of them, usable as a reference.
pub(crate) fn is_reference(name: &str) -> bool {
    dotted_identifier().is_match(name)
}

fn write_value(out: &mut String, value: &Value) -> Result<(), ReprError> {
    match value {
        Value::Null => out.push_str("None"),
        Value::Bool(true) => out.push_str("True"),
        Value::Bool(false) => out.push_str("False"),
        Value::Number(n) => write_number(out, n)?,
        Value::String(s) => write_str(out, s),
        Value::Sequence(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_value(out, item)?;
            }
            out.push(']');
        }
        Value::Mapping(map) => {
            if let Some(name) = as_reference(map)? {
                out.push_str(name);
                return Ok(());
            }
            let mut entries = Vec::with_capacity(map.len());
            for (k, v) in map {
                entries.push((render_key(k)?, v));
            }
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            out.push('{');
            for (i, (k, v)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                out.push_str(&k);
                out.push_str(": ");
                write_value(out, v)?;
            }
            out.push('}');
        }
        Value::Tagged(tagged) => return Err(ReprError::Tagged(tagged.tag.to_string())),
    }
    Ok(())
}

fn as_reference(map: &Mapping) -> Result<Option<&str>, ReprError> {
    if map.len() != 1 {
        return Ok(None);
    }
    match map.get(REF_KEY) {
        None => Ok(None),
        Some(Value::String(name)) if is_reference(name) => Ok(Some(name)),
        Some(Value::String(name)) => Err(ReprError::InvalidReference(name.clone())),
        Some(other) => Err(ReprError::InvalidReference(format!("{:?}", other))),
    }
}

fn render_key(key: &Value) -> Result<String, ReprError> {
    match key {
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => render(key),
        _ => Err(ReprError::NonScalarKey),
    }
}

fn write_number(out: &mut String, n: &Number) -> Result<(), ReprError> {
    if n.is_f64() {
        let f = n.as_f64().unwrap_or(f64::NAN);
        out.push_str(&float_repr(f)?);
    } else if let Some(i) = n.as_i64() {
        let _ = write!(out, "{}", i);
    } else if let Some(u) = n.as_u64() {
        let _ = write!(out, "{}", u);
    }
    Ok(())
}

/// Shortest round-trip float text with an explicitly signed, two-digit exponent.
fn float_repr(f: f64) -> Result<String, ReprError> {
    if !f.is_finite() {
        return Err(ReprError::NonFiniteFloat(f));
    }
    let text = format!("{:?}", f);
    let Some((mantissa, exp)) = text.split_once('e') else {
        return Ok(text);
    };
    let (sign, digits) = match exp.strip_prefix('-') {
        Some(d) => ('-', d),
        None => ('+', exp),
    };
    Ok(format!("{}e{}{:0>2}", mantissa, sign, digits))
}

fn write_str(out: &mut String, s: &str) {
    let quote = if s.contains('\'') && !s.contains('"') {
        '"'
    } else {
        '\''
    };
    out.push(quote);
    for ch in s.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c if (c as u32) < 0x20 || c as u32 == 0x7f => {
                let _ = write!(out, "\\x{:02x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push(quote);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn yaml(s: &str) -> Value {
        serde_yaml_ng::from_str(s).unwrap()
    }

    #[test]
    fn test_identifier() {
        assert!(is_identifier("df"));
        assert!(is_identifier("_x9"));
        assert!(!is_identifier("9x"));
        assert!(!is_identifier("a-b"));
        assert!(!is_identifier("df.age"));
        assert!(!is_identifier(""));
    }

    #[test]
    fn test_reference_names() {
        assert!(is_reference("df"));
        assert!(is_reference("df.age"));
        assert!(is_reference("op.load.csv"));
        assert!(!is_reference("df."));
        assert!(!is_reference(".df"));
        assert!(!is_reference("df age"));
    }

    #[test]
    fn test_scalars() {
        assert_eq!(render(&Value::Null).unwrap(), "None");
        assert_eq!(render(&Value::Bool(true)).unwrap(), "True");
        assert_eq!(render(&Value::Bool(false)).unwrap(), "False");
        assert_eq!(render(&yaml("42")).unwrap(), "42");
        assert_eq!(render(&yaml("-7")).unwrap(), "-7");
        assert_eq!(render(&yaml("18446744073709551615")).unwrap(), "18446744073709551615");
    }

    #[test]
    fn test_floats() {
        assert_eq!(render(&yaml("1.0")).unwrap(), "1.0");
        assert_eq!(render(&yaml("0.1")).unwrap(), "0.1");
        assert_eq!(float_repr(1e16).unwrap(), "1e+16");
        assert_eq!(float_repr(1.5e300).unwrap(), "1.5e+300");
        assert_eq!(float_repr(1e-7).unwrap(), "1e-07");
        assert_eq!(float_repr(-0.0).unwrap(), "-0.0");
    }

    #[test]
    fn test_non_finite_float_rejected() {
        assert!(matches!(render(&yaml(".nan")), Err(ReprError::NonFiniteFloat(_))));
        assert!(matches!(render(&yaml(".inf")), Err(ReprError::NonFiniteFloat(_))));
    }

    #[test]
    fn test_strings() {
        assert_eq!(render(&Value::String("name".into())).unwrap(), "'name'");
        assert_eq!(render(&Value::String("it's".into())).unwrap(), "\"it's\"");
        assert_eq!(render(&Value::String("a'b\"c".into())).unwrap(), "'a\\'b\"c'");
        assert_eq!(render(&Value::String("x\ny\\".into())).unwrap(), "'x\\ny\\\\'");
        assert_eq!(render(&Value::String("\u{1}".into())).unwrap(), "'\\x01'");
        assert_eq!(render(&Value::String("ñandú".into())).unwrap(), "'ñandú'");
    }

    #[test]
    fn test_nested_structures() {
        let v = yaml("[a, 1, [true, null], {z: 1, a: [x]}]");
        assert_eq!(render(&v).unwrap(), "['a', 1, [True, None], {'a': ['x'], 'z': 1}]");
    }

    #[test]
    fn test_mapping_order_is_stable() {
        let a = yaml("{b: 1, a: 2, c: 3}");
        let b = yaml("{c: 3, a: 2, b: 1}");
        assert_eq!(render(&a).unwrap(), render(&b).unwrap());
        assert_eq!(render(&a).unwrap(), "{'a': 2, 'b': 1, 'c': 3}");
    }

    #[test]
    fn test_scalar_keys() {
        assert_eq!(render(&yaml("{1: a, true: b}")).unwrap(), "{1: 'a', True: 'b'}");
        assert_eq!(render(&yaml("{[1]: a}")), Err(ReprError::NonScalarKey));
    }

    #[test]
    fn test_reference() {
        assert_eq!(render(&reference("df2")).unwrap(), "df2");
        assert_eq!(render(&yaml("{$ref: op.F}")).unwrap(), "op.F");
        assert_eq!(render(&yaml("[{$ref: df}]")).unwrap(), "[df]");
        assert!(matches!(
            render(&yaml("{$ref: 'not valid'}")),
            Err(ReprError::InvalidReference(_))
        ));
        // Two keys: an ordinary mapping
        assert_eq!(render(&yaml("{$ref: df, x: 1}")).unwrap(), "{'$ref': 'df', 'x': 1}");
    }

    #[test]
    fn test_tagged_rejected() {
        assert!(matches!(render(&yaml("!custom 5")), Err(ReprError::Tagged(_))));
    }
}
