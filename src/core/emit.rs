//! Statement rendering: `<target> = [<receiver>.]<name>(<arguments>)`.

use super::classify::Placement;
use super::error::CodegenError;
use super::repr;
use super::types::{OperationDescriptor, OperationRecord, RESERVED_KEYS};

/// Render the call arguments of the record at `index`.
///
/// With a fixed parameter list only declared parameters are emitted, in
/// declaration order. Otherwise every non-reserved record argument is
/// emitted in record order.
pub fn serialize_arguments(
    index: usize,
    record: &OperationRecord,
    descriptor: &OperationDescriptor,
) -> Result<String, CodegenError> {
    let fixed = !descriptor.accepts_overflow && !descriptor.parameters.is_empty();

    let keys: Vec<&str> = if fixed {
        descriptor
            .parameters
            .iter()
            .map(|p| p.name.as_str())
            .filter(|name| record.arguments.contains_key(*name))
            .collect()
    } else {
        record
            .arguments
            .keys()
            .map(String::as_str)
            .filter(|key| !RESERVED_KEYS.contains(key))
            .collect()
    };

    let mut rendered = Vec::with_capacity(keys.len());
    for key in keys {
        let value = &record.arguments[key];
        let text = repr::render(value).map_err(|source| CodegenError::Serialization {
            index,
            argument: key.to_string(),
            source,
        })?;
        rendered.push(format!("{}={}", key, text));
    }
    Ok(rendered.join(", "))
}

/// Render one record as an assignment statement.
pub fn emit(
    index: usize,
    record: &OperationRecord,
    descriptor: &OperationDescriptor,
    placement: &Placement,
) -> Result<String, CodegenError> {
    let arguments = serialize_arguments(index, record, descriptor)?;
    let mut code = format!("{} = ", placement.target);
    if let Some(receiver) = &placement.receiver {
        code.push_str(receiver);
        code.push('.');
    }
    code.push_str(&descriptor.name);
    code.push('(');
    code.push_str(&arguments);
    code.push(')');
    Ok(code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::catalog::Catalog;
    use crate::core::classify::NamingStrategy;
    use crate::core::error::ReprError;
    use serde_yaml_ng::Value;

    fn placement(target: &str, receiver: Option<&str>) -> Placement {
        Placement {
            strategy: NamingStrategy::Transformation,
            target: target.to_string(),
            receiver: receiver.map(str::to_string),
        }
    }

    #[test]
    fn test_emit_simple_transformation() {
        let r = OperationRecord::new("cols.upper").with_source("df").with_arg("cols", "name");
        let d = Catalog::builtin().unwrap().resolve("cols.upper").unwrap();
        let code = emit(0, &r, &d, &placement("df", Some("df"))).unwrap();
        assert_eq!(code, "df = df.upper(cols='name')");
    }

    #[test]
    fn test_fixed_parameters_filter_and_order() {
        let r = OperationRecord::new("cols.pad")
            .with_source("df")
            .with_arg("fillchar", "*")
            .with_arg("bogus", 1)
            .with_arg("cols", "id")
            .with_arg("width", 5);
        let d = Catalog::builtin().unwrap().resolve("cols.pad").unwrap();
        let args = serialize_arguments(0, &r, &d).unwrap();
        assert_eq!(args, "cols='id', width=5, fillchar='*'");
    }

    #[test]
    fn test_overflow_keeps_record_order_and_drops_reserved() {
        let r = OperationRecord::new("load.csv")
            .with_source("op")
            .with_arg("target", "ignored")
            .with_arg("sep", ";")
            .with_arg("filepath_or_buffer", "data.csv")
            .with_arg("dtype_backend", "pyarrow")
            .with_arg("options", Value::Null);
        let d = Catalog::builtin().unwrap().resolve("load.csv").unwrap();
        let args = serialize_arguments(0, &r, &d).unwrap();
        assert_eq!(args, "sep=';', filepath_or_buffer='data.csv', dtype_backend='pyarrow'");
    }

    #[test]
    fn test_no_parameters_emits_everything() {
        let r = OperationRecord::new("rows.reverse").with_source("df").with_arg("extra", true);
        let d = Catalog::builtin().unwrap().resolve("rows.reverse").unwrap();
        assert_eq!(serialize_arguments(0, &r, &d).unwrap(), "extra=True");
    }

    #[test]
    fn test_emit_without_receiver() {
        let r = OperationRecord::new("Optimus").with_arg("engine", "pandas");
        let d = Catalog::builtin().unwrap().resolve("Optimus").unwrap();
        let code = emit(0, &r, &d, &placement("op", None)).unwrap();
        assert_eq!(code, "op = Optimus(engine='pandas')");
    }

    #[test]
    fn test_emit_reference_argument() {
        let r = OperationRecord::new("cols.append")
            .with_source("df")
            .with_arg("dfs", Value::Sequence(vec![repr::reference("df2")]));
        let d = Catalog::builtin().unwrap().resolve("cols.append").unwrap();
        let code = emit(0, &r, &d, &placement("df", Some("df"))).unwrap();
        assert_eq!(code, "df = df.append(dfs=[df2])");
    }

    #[test]
    fn test_serialization_error_carries_index_and_argument() {
        let r = OperationRecord::new("cols.round")
            .with_source("df")
            .with_arg("decimals", f64::NAN);
        let d = Catalog::builtin().unwrap().resolve("cols.round").unwrap();
        let err = serialize_arguments(7, &r, &d).unwrap_err();
        match err {
            CodegenError::Serialization {
                index,
                argument,
                source,
            } => {
                assert_eq!(index, 7);
                assert_eq!(argument, "decimals");
                assert!(matches!(source, ReprError::NonFiniteFloat(_)));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
