use crate::error::{HarnessError, Result};
use crate::llm::tools::{LlmTool, ToolDescriptor};
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashMap;

#[derive(Debug, Deserialize, JsonSchema)]
struct WeatherArgs {
    /// The location to get the weather for
    location: String,
}

/// Static weather lookup used to exercise the tool-calling path
///
/// Every location reports the same forecast. The tool exists so that traces contain a
/// real model → tool → model round trip without depending on an outside service.
///
/// # Examples
///
/// ```ignore
/// use trace_harness::llm::tools::WeatherTool;
///
/// let args = HashMap::from([("location".to_string(), json!("Paris"))]);
/// let result = WeatherTool.run(&args)?;
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct WeatherTool;

impl WeatherTool {
    pub const NAME: &'static str = "get_weather";

    fn parameters() -> Value {
        let mut schema = serde_json::to_value(schemars::schema_for!(WeatherArgs))
            .unwrap_or_else(|_| Value::Object(Map::new()));
        if let Some(object) = schema.as_object_mut() {
            object.remove("$schema");
            object.remove("title");
        }
        schema
    }
}

impl LlmTool for WeatherTool {
    fn run(&self, args: &HashMap<String, Value>) -> Result<Value> {
        let object: Map<String, Value> =
            args.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
        let args: WeatherArgs = serde_json::from_value(Value::Object(object))
            .map_err(|e| HarnessError::ToolError(format!("invalid arguments: {}", e)))?;

        Ok(Value::String(format!(
            "The weather in {} is sunny with a high of 25°C and a low of 15°C.",
            args.location
        )))
    }

    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::function(
            Self::NAME,
            "Get weather for the given location",
            Self::parameters(),
        )
    }
}
