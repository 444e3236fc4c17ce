//! Chart series shaping demo tool: reshapes an aggregated numeric/list input
//! into `{labels: [...], values: [...]}` suitable for a charting frontend.
//! Pure data transform — no rendering.

use weave_core::model::ParamMap;
use weave_core::tool::{BoxFuture, Tool};

pub const TOOL_NAME: &str = "chart_series";

pub struct ChartSeriesTool;

impl Tool for ChartSeriesTool {
    fn name(&self) -> &str {
        TOOL_NAME
    }

    fn description(&self) -> &str {
        "Reshapes a numeric/list input into {labels, values} for charting"
    }

    fn execute(&self, parameters: ParamMap) -> BoxFuture<'_, Result<ParamMap, String>> {
        Box::pin(async move { shape(&parameters) })
    }
}

fn find_items(parameters: &ParamMap) -> Option<Vec<serde_json::Value>> {
    if let Some(own) = parameters.get("items").and_then(|v| v.as_array()) {
        return Some(own.clone());
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
            return Some(arr.clone());
        }
    }
    None
}

fn shape(parameters: &ParamMap) -> Result<ParamMap, String> {
    let items = find_items(parameters)
        .ok_or_else(|| "chart_series: no 'items' list found (own config or upstream)".to_string())?;

    let explicit_labels: Option<Vec<String>> = parameters.get("labels").and_then(|v| v.as_array()).map(|arr| {
        arr.iter()
            .map(|v| v.as_str().map(str::to_string).unwrap_or_else(|| v.to_string()))
            .collect()
    });

    let mut labels = Vec::with_capacity(items.len());
    let mut values = Vec::with_capacity(items.len());

    for (idx, item) in items.iter().enumerate() {
        if let Some(obj) = item.as_object() {
            let label = obj
                .get("label")
                .and_then(|v| v.as_str())
                .map(str::to_string)
                .unwrap_or_else(|| idx.to_string());
            let value = obj
                .get("value")
                .and_then(|v| v.as_f64())
                .ok_or_else(|| format!("chart_series: item {idx} is an object with no numeric 'value'"))?;
            labels.push(label);
            values.push(value);
        } else {
            let value = item
                .as_f64()
                .ok_or_else(|| format!("chart_series: item {idx} is neither numeric nor a {{label, value}} object"))?;
            values.push(value);
            labels.push(
                explicit_labels
                    .as_ref()
                    .and_then(|l| l.get(idx).cloned())
                    .unwrap_or_else(|| idx.to_string()),
            );
        }
    }

    let mut output = ParamMap::new();
    output.insert("labels".into(), serde_json::json!(labels));
    output.insert("values".into(), serde_json::json!(values));
    Ok(output)
}
