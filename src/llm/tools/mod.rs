mod tool;
pub mod weather_tool;

pub use tool::{FunctionDescriptor, LlmTool, ToolDescriptor};
pub use weather_tool::WeatherTool;
