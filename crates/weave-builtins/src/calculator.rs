//! Arithmetic demo tool: folds operands with `+`, `-`, `*`, or `/`.
//!
//! Operands are gathered from, in order: an explicit `value` config key,
//! every upstream agent's `result` field (in producer-id order), then an
//! explicit `const` config key. The op is applied as a left fold.

use weave_core::model::ParamMap;
use weave_core::tool::{BoxFuture, Tool};

pub const TOOL_NAME: &str = "calculator";

pub struct CalculatorTool;

impl Tool for CalculatorTool {
    fn name(&self) -> &str {
        TOOL_NAME
    }

    fn description(&self) -> &str {
        "Folds numeric operands (config value/const, upstream results) with add/sub/mul/div"
    }

    fn execute(&self, parameters: ParamMap) -> BoxFuture<'_, Result<ParamMap, String>> {
        Box::pin(async move { compute(&parameters) })
    }
}

fn compute(parameters: &ParamMap) -> Result<ParamMap, String> {
    let op = parameters
        .get("op")
        .and_then(|v| v.as_str())
        .unwrap_or("add")
        .to_string();

    let mut operands: Vec<f64> = Vec::new();

    if let Some(value) = parameters.get("value").and_then(|v| v.as_f64()) {
        operands.push(value);
    }

    let mut upstream_keys: Vec<&String> = parameters
        .iter()
        .filter(|(_, v)| v.is_object())
        .map(|(k, _)| k)
        .collect();
    upstream_keys.sort();
    for key in upstream_keys {
        if let Some(result) = parameters
            .get(key.as_str())
            .and_then(|v| v.get("result"))
            .and_then(|v| v.as_f64())
        {
            operands.push(result);
        }
    }

    if let Some(c) = parameters.get("const").and_then(|v| v.as_f64()) {
        operands.push(c);
    }

    if operands.is_empty() {
        return Err("calculator: no numeric operands found (need 'value', 'const', or an upstream 'result')".into());
    }

    let result = match op.as_str() {
        "add" => operands.iter().sum(),
        "sub" => fold(&operands, |a, b| a - b),
        "mul" => operands.iter().product(),
        "div" => {
            if operands.len() < 2 {
                return Err("calculator: 'div' requires at least two operands".into());
            }
            if operands[1..].iter().any(|&b| b == 0.0) {
                return Err("calculator: division by zero".into());
            }
            fold(&operands, |a, b| a / b)
        }
        other => return Err(format!("calculator: unknown op '{other}'")),
    };

    let mut output = ParamMap::new();
    output.insert("result".into(), serde_json::json!(result));
    Ok(output)
}

fn fold(operands: &[f64], f: impl Fn(f64, f64) -> f64) -> f64 {
    let mut iter = operands.iter();
    let first = *iter.next().expect("operands is non-empty");
    iter.fold(first, |acc, &x| f(acc, x))
}
