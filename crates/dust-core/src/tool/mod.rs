//! Tool system
//!
//! エージェントホストから呼び出されるツールの定義・登録・実行を扱います。

pub mod definition;
pub mod manager;
pub mod traits;

pub use definition::{SchemaBuilder, ToolDefinition};
pub use manager::ToolManager;
pub use traits::{Tool, ToolResult};
