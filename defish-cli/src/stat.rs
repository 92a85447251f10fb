//! Pretty-printer for the stored directory tree.

use defish_archive::DirNode;
use std::collections::VecDeque;

const RATIO_COLUMN: usize = 50;

/// Print the tree breadth-first, one line per entry, each level indented
/// with dashes. Files carry a compressed/original ratio column.
pub fn print_tree(tree: &DirNode) {
    let mut queue = VecDeque::new();
    queue.push_back((tree, 0usize));
    while let Some((dir, level)) = queue.pop_front() {
        println!("{}", record_line(&dir.name, level, None));
        for file in &dir.files {
            println!("{}", record_line(&file.name, level + 1, file.compression_ratio()));
        }
        for sub in &dir.dirs {
            queue.push_back((sub, level + 1));
        }
    }
}

fn record_line(name: &str, level: usize, ratio: Option<f64>) -> String {
    let mut line = format!("{}{name}", "-".repeat(level));
    if let Some(ratio) = ratio {
        let pad = RATIO_COLUMN.saturating_sub(line.len()).max(10);
        line.push_str(&format!("{}{:.1} %", " ".repeat(pad), ratio * 100.0));
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use defish_archive::FileNode;

    #[test]
    fn test_record_line_indents_by_level() {
        assert_eq!(record_line("root", 0, None), "root");
        assert_eq!(record_line("sub", 2, None), "--sub");
    }

    #[test]
    fn test_record_line_ratio_column() {
        let line = record_line("a.txt", 1, Some(0.5));
        assert!(line.starts_with("-a.txt"));
        assert!(line.ends_with("50.0 %"));
        assert!(line.len() >= RATIO_COLUMN);
    }

    #[test]
    fn test_print_tree_handles_nested_dirs() {
        let tree = DirNode {
            name: "root".into(),
            files: vec![FileNode {
                name: "a.txt".into(),
                path: None,
                offset: 5,
                length: 10,
                original_size: 20,
            }],
            dirs: vec![DirNode::new("sub")],
        };
        // Smoke test: traversal must terminate and visit every node.
        print_tree(&tree);
    }
}
