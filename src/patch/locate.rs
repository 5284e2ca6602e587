use crate::error::PatchError;
use crate::frontend::syntax::{descendants, is_type_declaration, node_text};
use crate::indexer::stable_id::declaration_id;
use crate::util;
use tracing::warn;
use tree_sitter::Node;

/// Byte span of the text an edit replaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Target {
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclarationKind {
    Method,
    Type,
}

impl DeclarationKind {
    pub fn matches(self, node_kind: &str) -> bool {
        match self {
            Self::Method => node_kind == "method_declaration",
            Self::Type => is_type_declaration(node_kind),
        }
    }

    pub fn what(self) -> &'static str {
        match self {
            Self::Method => "method",
            Self::Type => "class",
        }
    }
}

/// Span from the start of line `start` to the end of line `end` (1-based,
/// inclusive), not counting the last line's terminator.
pub fn locate_range(file: &str, text: &str, start: i64, end: i64) -> Result<Target, PatchError> {
    let starts = util::line_starts(text);
    let line_count = starts.len();
    let out_of_bounds = || PatchError::OutOfBounds {
        file: file.to_string(),
        start,
        end,
        line_count,
    };
    let first = usize::try_from(start).map_err(|_| out_of_bounds())?;
    let last = usize::try_from(end).map_err(|_| out_of_bounds())?;
    if first < 1 || first > last || last > line_count {
        return Err(out_of_bounds());
    }
    Ok(Target {
        start: starts[first - 1],
        end: util::line_end(text, &starts, last - 1),
    })
}

/// Finds the declaration an edit targets.
///
/// A `target_id` wins when some declaration still carries it (and its text
/// agrees with `original`, if given). Otherwise the first declaration in
/// document order whose trimmed text equals the trimmed `original` is used.
pub fn locate_declaration<'t>(
    file: &str,
    source: &str,
    root: Node<'t>,
    kind: DeclarationKind,
    original: Option<&str>,
    target_id: Option<&str>,
) -> Result<Node<'t>, PatchError> {
    let original = original.map(str::trim).filter(|text| !text.is_empty());
    let candidates: Vec<Node<'t>> = descendants(root)
        .into_iter()
        .filter(|node| kind.matches(node.kind()))
        .collect();
    let text_matches = |node: &Node<'t>| {
        original.is_none_or(|wanted| node_text(*node, source).trim() == wanted)
    };

    if let Some(id) = target_id {
        let by_id = candidates
            .iter()
            .find(|node| declaration_id(**node, source).as_deref() == Some(id));
        match by_id {
            Some(node) if text_matches(node) => return Ok(*node),
            Some(_) => warn!(file, target_id = id, "declaration text changed, matching by text"),
            None => warn!(file, target_id = id, "stale declaration id, matching by text"),
        }
    }

    let not_found = || PatchError::NotFound {
        file: file.to_string(),
        what: kind.what(),
    };
    let wanted = original.ok_or_else(not_found)?;
    candidates
        .into_iter()
        .find(|node| node_text(*node, source).trim() == wanted)
        .ok_or_else(not_found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::frontend::CSharpParser;

    #[test]
    fn range_covers_whole_lines() {
        let text = "one\ntwo\r\nthree\nfour";
        let target = locate_range("a.cs", text, 2, 3).unwrap();
        assert_eq!(&text[target.start..target.end], "two\r\nthree");
        let last = locate_range("a.cs", text, 4, 4).unwrap();
        assert_eq!(&text[last.start..last.end], "four");
    }

    #[test]
    fn range_rejects_bad_bounds() {
        let text = "one\ntwo\n";
        for (start, end) in [(0, 1), (2, 1), (1, 4), (-1, 2)] {
            let err = locate_range("a.cs", text, start, end).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::OutOfBounds);
        }
        // trailing newline opens an empty third line
        assert!(locate_range("a.cs", text, 3, 3).is_ok());
    }

    #[test]
    fn first_text_match_wins_without_id() {
        let source = "class A { void Run() {} }\nclass B { void Run() {} }";
        let mut parser = CSharpParser::new().unwrap();
        let tree = parser.parse_tree(source).unwrap();
        let node = locate_declaration(
            "a.cs",
            source,
            tree.root_node(),
            DeclarationKind::Method,
            Some("  void Run() {}\n"),
            None,
        )
        .unwrap();
        assert_eq!(node.start_position().row, 0);
    }

    #[test]
    fn target_id_picks_the_right_duplicate() {
        let source = "class A { void Run() {} }\nclass B { void Run() {} }";
        let mut parser = CSharpParser::new().unwrap();
        let tree = parser.parse_tree(source).unwrap();
        let second = descendants(tree.root_node())
            .into_iter()
            .filter(|n| n.kind() == "method_declaration")
            .nth(1)
            .unwrap();
        let id = declaration_id(second, source).unwrap();
        let node = locate_declaration(
            "a.cs",
            source,
            tree.root_node(),
            DeclarationKind::Method,
            Some("void Run() {}"),
            Some(&id),
        )
        .unwrap();
        assert_eq!(node.start_position().row, 1);
    }
}
