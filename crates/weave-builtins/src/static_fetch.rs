//! Static data fetch demo tool: returns a fixed, in-memory dataset keyed by
//! a `dataset` config key. No network I/O — "static" per the spec's scope.

use weave_core::model::ParamMap;
use weave_core::tool::{BoxFuture, Tool};

pub const TOOL_NAME: &str = "static_fetch";

pub struct StaticFetchTool;

impl Tool for StaticFetchTool {
    fn name(&self) -> &str {
        TOOL_NAME
    }

    fn description(&self) -> &str {
        "Returns a fixed in-memory dataset named by the 'dataset' config key"
    }

    fn execute(&self, parameters: ParamMap) -> BoxFuture<'_, Result<ParamMap, String>> {
        Box::pin(async move { fetch(&parameters) })
    }
}

fn fetch(parameters: &ParamMap) -> Result<ParamMap, String> {
    let dataset = parameters
        .get("dataset")
        .and_then(|v| v.as_str())
        .ok_or_else(|| "static_fetch: missing 'dataset' config key".to_string())?;

    let items = match dataset {
        "sales" => serde_json::json!([120, 95, 140, 110, 175, 160, 132]),
        "users" => serde_json::json!([
            {"id": 1, "name": "ada"},
            {"id": 2, "name": "grace"},
            {"id": 3, "name": "margaret"},
        ]),
        "temperatures" => serde_json::json!([18.5, 19.1, 21.4, 22.0, 20.7]),
        other => return Err(format!("static_fetch: unknown dataset '{other}'")),
    };

    let mut output = ParamMap::new();
    output.insert("items".into(), items);
    Ok(output)
}
