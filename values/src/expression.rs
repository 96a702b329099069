//! Derived-value evaluation.

use tessera_core::{RecordValue, RecordValueSet, ValueError, ValueErrorKind, ValueErrorSet};
use tessera_registry::{Module, ValueExpr};

/// Recompute every field that declares an expression.
///
/// Fields are evaluated in definition order, so an expression may read a
/// field computed before it. A derived field holds one value at place 0; an
/// empty result removes the field's values.
pub fn evaluate_expressions(module: &Module, values: &mut RecordValueSet) -> ValueErrorSet {
    let mut errors = ValueErrorSet::new();

    for field in &module.fields {
        let Some(expr) = &field.expression else {
            continue;
        };

        match evaluate(expr, values) {
            Ok(result) => {
                values.retain(|v| v.name != field.name);
                if !result.is_empty() {
                    let mut v = RecordValue::new(&field.name, result);
                    v.updated = true;
                    values.push(v);
                }
            }
            Err(input) => {
                errors.push(
                    ValueError::new(ValueErrorKind::InvalidExpression)
                        .with_meta("field", field.name.as_str())
                        .with_meta("input", input),
                );
            }
        }
    }

    errors
}

/// Evaluate one expression; the error names the input that is not numeric.
fn evaluate(expr: &ValueExpr, values: &RecordValueSet) -> Result<String, String> {
    let first = |name: &str| {
        values
            .first(name)
            .filter(|v| !v.deleted)
            .map(|v| v.value.trim().to_string())
            .unwrap_or_default()
    };

    match expr {
        ValueExpr::Literal(s) => Ok(s.clone()),
        ValueExpr::Copy(name) => Ok(first(name.as_str())),
        ValueExpr::Concat { fields, separator } => Ok(fields
            .iter()
            .map(|f| first(f.as_str()))
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(separator.as_str())),
        ValueExpr::Sum(fields) => fold_numbers(fields, &first, 0.0, |acc, n| acc + n),
        ValueExpr::Product(fields) => fold_numbers(fields, &first, 1.0, |acc, n| acc * n),
    }
}

fn fold_numbers(
    fields: &[String],
    first: &dyn Fn(&str) -> String,
    init: f64,
    op: impl Fn(f64, f64) -> f64,
) -> Result<String, String> {
    let mut acc = init;
    for name in fields {
        let raw = first(name.as_str());
        if raw.is_empty() {
            continue;
        }
        let n: f64 = raw.parse().map_err(|_| name.clone())?;
        acc = op(acc, n);
    }
    Ok(format_number(acc))
}

/// Shortest decimal representation without a trailing `.0`.
pub(crate) fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}
