pub mod element;
pub mod language;
pub mod position;
pub mod query;
pub mod report;
pub mod source;

pub use element::*;
pub use language::*;
pub use position::*;
pub use query::*;
pub use report::*;
pub use source::*;
