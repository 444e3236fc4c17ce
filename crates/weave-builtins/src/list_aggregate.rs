//! List aggregation demo tool: collects upstream `items` arrays (or its own
//! `items` config) and reduces them via a `reducer` config key.

use weave_core::model::ParamMap;
use weave_core::tool::{BoxFuture, Tool};

pub const TOOL_NAME: &str = "list_aggregate";

pub struct ListAggregateTool;

impl Tool for ListAggregateTool {
    fn name(&self) -> &str {
        TOOL_NAME
    }

    fn description(&self) -> &str {
        "Aggregates upstream 'items' arrays with a reducer (sum/count/min/max/concat)"
    }

    fn execute(&self, parameters: ParamMap) -> BoxFuture<'_, Result<ParamMap, String>> {
        Box::pin(async move { aggregate(&parameters) })
    }
}

fn collect_items(parameters: &ParamMap) -> Vec<serde_json::Value> {
    let mut items = Vec::new();

    if let Some(own) = parameters.get("items").and_then(|v| v.as_array()) {
        items.extend(own.iter().cloned());
    }

    let mut upstream_keys: Vec<&String> = parameters
        .iter()
        .filter(|(_, v)| v.is_object())
        .map(|(k, _)| k)
        .collect();
    upstream_keys.sort();
    for key in upstream_keys {
        if let Some(arr) = parameters
            .get(key.as_str())
            .and_then(|v| v.get("items"))
            .and_then(|v| v.as_array())
        {
            items.extend(arr.iter().cloned());
        }
    }

    items
}

fn aggregate(parameters: &ParamMap) -> Result<ParamMap, String> {
    let reducer = parameters
        .get("reducer")
        .and_then(|v| v.as_str())
        .unwrap_or("sum")
        .to_string();

    let items = collect_items(parameters);
    if items.is_empty() {
        return Err("list_aggregate: no items found (need own 'items' or an upstream 'items' array)".into());
    }

    let mut output = ParamMap::new();

    match reducer.as_str() {
        "concat" => {
            output.insert("items".into(), serde_json::Value::Array(items));
        }
        "count" => {
            output.insert("result".into(), serde_json::json!(items.len()));
        }
        "sum" | "min" | "max" => {
            let numbers: Vec<f64> = items
                .iter()
                .map(|v| v.as_f64().ok_or_else(|| format!("list_aggregate: non-numeric item {v}")))
                .collect::<Result<_, _>>()?;
            let result = match reducer.as_str() {
                "sum" => numbers.iter().sum(),
                "min" => numbers.iter().cloned().fold(f64::INFINITY, f64::min),
                "max" => numbers.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
                _ => unreachable!(),
            };
            output.insert("result".into(), serde_json::json!(result));
        }
        other => return Err(format!("list_aggregate: unknown reducer '{other}'")),
    }

    Ok(output)
}
