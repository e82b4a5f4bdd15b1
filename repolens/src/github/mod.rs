//! GitHub repository access: URL parsing, contents API and tree rendering.

mod contents;
mod repo_ref;
mod tree;

pub use contents::{ContentsClient, DirectoryFailure, DirectoryListing};
pub use repo_ref::RepoRef;
pub use tree::{format_structure, TreeNode};
