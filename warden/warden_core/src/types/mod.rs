//! Data structures shared across the Warden crates.

pub mod bitmap;
pub mod context;
pub mod row;

pub use bitmap::Bitmap;
pub use context::SessionContext;
pub use row::{ParamType, Row, Value};
