pub mod cache;
pub mod history;
pub mod project;
pub mod segments;
pub mod status;
pub mod util;
pub mod verify;

pub use cache::*;
pub use history::*;
pub use project::*;
pub use segments::*;
pub use status::*;
pub use util::*;
pub use verify::*;
