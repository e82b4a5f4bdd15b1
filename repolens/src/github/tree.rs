//! Repository tree nodes and their text rendering.

use serde::{Deserialize, Serialize};

/// A node of a repository listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TreeNode {
    File {
        path: String,
    },
    Directory {
        path: String,
        children: Vec<TreeNode>,
    },
    /// A listing entry without a usable `type` or `path`.
    Malformed,
}

impl TreeNode {
    pub fn file(path: impl Into<String>) -> Self {
        Self::File { path: path.into() }
    }

    pub fn directory(path: impl Into<String>, children: Vec<Self>) -> Self {
        Self::Directory {
            path: path.into(),
            children,
        }
    }

    pub fn path(&self) -> Option<&str> {
        match self {
            Self::File { path } | Self::Directory { path, .. } => Some(path),
            Self::Malformed => None,
        }
    }
}

const INDENT: &str = "│   ";

/// Render `nodes` as an indented tree, one line per node, depth-first.
pub fn format_structure(nodes: &[TreeNode], level: usize) -> String {
    let mut out = String::new();
    write_level(&mut out, nodes, level);
    out
}

fn write_level(out: &mut String, nodes: &[TreeNode], level: usize) {
    for node in nodes {
        out.push_str(&INDENT.repeat(level));
        match node {
            TreeNode::Directory { path, children } => {
                out.push_str("├── 📁 ");
                out.push_str(path);
                out.push('\n');
                write_level(out, children, level + 1);
            }
            TreeNode::File { path } => {
                out.push_str("├── 📄 ");
                out.push_str(path);
                out.push('\n');
            }
            TreeNode::Malformed => out.push_str("└── [Unexpected structure or missing type]\n"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_entry_listing_formats_to_two_lines() {
        let tree = vec![
            TreeNode::directory("src", Vec::new()),
            TreeNode::file("README.md"),
        ];
        let rendered = format_structure(&tree, 0);
        assert_eq!(rendered, "├── 📁 src\n├── 📄 README.md\n");
        assert_eq!(rendered.lines().count(), 2);
    }

    #[test]
    fn indentation_tracks_nesting_depth() {
        let tree = vec![TreeNode::directory(
            "src",
            vec![
                TreeNode::directory("src/cli", vec![TreeNode::file("src/cli/args.rs")]),
                TreeNode::file("src/main.rs"),
            ],
        )];
        let rendered = format_structure(&tree, 0);
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(
            lines,
            vec![
                "├── 📁 src",
                "│   ├── 📁 src/cli",
                "│   │   ├── 📄 src/cli/args.rs",
                "│   ├── 📄 src/main.rs",
            ]
        );
    }

    #[test]
    fn starting_level_offsets_every_line() {
        let rendered = format_structure(&[TreeNode::file("a.txt")], 2);
        assert_eq!(rendered, "│   │   ├── 📄 a.txt\n");
    }

    #[test]
    fn malformed_node_renders_placeholder() {
        let rendered = format_structure(&[TreeNode::Malformed], 1);
        assert_eq!(rendered, "│   └── [Unexpected structure or missing type]\n");
    }

    #[test]
    fn formatting_is_deterministic() {
        let tree = vec![
            TreeNode::directory("docs", vec![TreeNode::file("docs/guide.md")]),
            TreeNode::file("Cargo.toml"),
        ];
        assert_eq!(format_structure(&tree, 0), format_structure(&tree, 0));
    }

    #[test]
    fn empty_listing_renders_nothing() {
        assert!(format_structure(&[], 0).is_empty());
    }
}
