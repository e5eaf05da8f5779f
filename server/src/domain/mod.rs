//! Query-side domain logic
//!
//! - `dispatch` - coalescing and supersession of analytics queries
//! - `panels` - dashboard chart query templates
//! - `presets` - relative date range selections

pub mod dispatch;
pub mod panels;
pub mod presets;

pub use dispatch::{DispatchError, QueryDispatcher, QueryRows};
pub use panels::{PanelQuery, builtin_panels, find_panel, option_query};
pub use presets::{DateRangePreset, resolve_presets};
