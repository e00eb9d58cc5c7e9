pub mod buffer;
pub mod documents;
pub mod endpoints;
pub mod macros;
pub mod paths;
pub mod projection;
pub mod tree;
pub mod workflow;
pub mod workspace;

pub use workflow::{Decision, Prompt, Step};
pub use workspace::{Workspace, WorkspaceOptions};
