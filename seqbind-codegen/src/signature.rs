// Signature normalization: a source function -> canonical call shape.

use std::collections::HashSet;

use crate::diagnostics::DiagnosticKind;
use crate::naming::param_name;
use crate::schema::{Function, TypeRef};

/// How the callee reports its results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultShape<T> {
    /// No results.
    Void,
    /// One non-error result.
    Value(T),
    /// A single `error` result: boolean-success convention, no value.
    Fallible,
    /// A value followed by an `error`.
    FallibleValue(T),
}

impl<T> ResultShape<T> {
    pub fn is_fallible(&self) -> bool {
        matches!(self, ResultShape::Fallible | ResultShape::FallibleValue(_))
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            ResultShape::Value(t) | ResultShape::FallibleValue(t) => Some(t),
            ResultShape::Void | ResultShape::Fallible => None,
        }
    }

    pub fn try_map<U, E>(self, f: impl FnOnce(T) -> Result<U, E>) -> Result<ResultShape<U>, E> {
        Ok(match self {
            ResultShape::Void => ResultShape::Void,
            ResultShape::Fallible => ResultShape::Fallible,
            ResultShape::Value(t) => ResultShape::Value(f(t)?),
            ResultShape::FallibleValue(t) => ResultShape::FallibleValue(f(t)?),
        })
    }
}

/// A parameter with its generated name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapeParam<T> {
    pub name: String,
    pub ty: T,
}

/// Canonical form of a signature, before type mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallShape {
    pub params: Vec<ShapeParam<TypeRef>>,
    pub result: ResultShape<TypeRef>,
}

/// Normalize a function's parameters and results.
pub fn normalize(func: &Function) -> Result<CallShape, DiagnosticKind> {
    // Distinct source names can collapse to one Rust name (`x` and `X`);
    // later ones fall back to `p<i>`, which no kept name can take.
    let mut taken = HashSet::new();
    let params = func
        .params
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let mut name = param_name(i, &p.name);
            if !taken.insert(name.clone()) {
                name = format!("p{i}");
                taken.insert(name.clone());
            }
            ShapeParam {
                name,
                ty: p.ty.clone(),
            }
        })
        .collect();

    let result = match func.results.as_slice() {
        [] => ResultShape::Void,
        [only] if only.ty.is_error() => ResultShape::Fallible,
        [only] => ResultShape::Value(only.ty.clone()),
        // A leading error is left to the type mapper, which rejects it as a
        // value type.
        [value, err] if err.ty.is_error() => ResultShape::FallibleValue(value.ty.clone()),
        [_, second] => return Err(DiagnosticKind::ResultNotError(second.ty.to_string())),
        more => return Err(DiagnosticKind::TooManyResults(more.len())),
    };

    Ok(CallShape { params, result })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn func(params: &[(&str, &str)], results: &[&str]) -> Function {
        let json = serde_json::json!({
            "name": "F",
            "params": params.iter().map(|(n, t)| serde_json::json!({"name": n, "type": t})).collect::<Vec<_>>(),
            "results": results.iter().map(|t| serde_json::json!({"type": t})).collect::<Vec<_>>(),
        });
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn result_shapes() {
        assert_eq!(normalize(&func(&[], &[])).unwrap().result, ResultShape::Void);
        assert_eq!(
            normalize(&func(&[], &["int64"])).unwrap().result,
            ResultShape::Value("int64".parse().unwrap())
        );
        assert_eq!(normalize(&func(&[], &["error"])).unwrap().result, ResultShape::Fallible);
        assert_eq!(
            normalize(&func(&[], &["string", "error"])).unwrap().result,
            ResultShape::FallibleValue("string".parse().unwrap())
        );
    }

    #[test]
    fn three_results_are_rejected() {
        assert_eq!(
            normalize(&func(&[], &["int", "int", "error"])),
            Err(DiagnosticKind::TooManyResults(3))
        );
    }

    #[test]
    fn second_result_must_be_error() {
        assert_eq!(
            normalize(&func(&[], &["int", "string"])),
            Err(DiagnosticKind::ResultNotError("string".into()))
        );
    }

    #[test]
    fn params_keep_order_and_get_safe_names() {
        let shape = normalize(&func(
            &[("", "int"), ("p0", "int"), ("name", "string"), ("seq_out", "bool"), ("type", "int")],
            &[],
        ))
        .unwrap();
        let names: Vec<&str> = shape.params.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["p0", "p1", "name", "p3", "r#type"]);
        assert_eq!(shape.params[2].ty, "string".parse().unwrap());
    }

    #[test]
    fn colliding_param_names_are_made_distinct() {
        let names = |params: &[(&str, &str)]| -> Vec<String> {
            normalize(&func(params, &[]))
                .unwrap()
                .params
                .into_iter()
                .map(|p| p.name)
                .collect()
        };
        assert_eq!(names(&[("x", "int64"), ("X", "int64")]), ["x", "p1"]);
        assert_eq!(names(&[("", "int64"), ("P0", "int64")]), ["p0", "p1"]);
        assert_eq!(names(&[("self", "int"), ("self_", "int")]), ["self_", "p1"]);
        assert_eq!(names(&[("aB", "int"), ("a_b", "int"), ("AB", "int")]), ["a_b", "p1", "ab"]);
    }

    #[test]
    fn fallible_helpers() {
        let shape: ResultShape<u8> = ResultShape::FallibleValue(1);
        assert!(shape.is_fallible());
        assert_eq!(shape.value(), Some(&1));
        let mapped = shape.try_map(|v| Ok::<_, ()>(v + 1)).unwrap();
        assert_eq!(mapped, ResultShape::FallibleValue(2));
        assert!(!ResultShape::<u8>::Void.is_fallible());
    }
}
