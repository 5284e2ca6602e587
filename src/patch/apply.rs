use crate::error::PatchError;
use crate::frontend::CSharpParser;
use crate::frontend::syntax::{body_members, is_type_declaration};
use crate::patch::locate::{DeclarationKind, Target};
use crate::util;
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use tree_sitter::Node;

const PROBE_CLASS: &str = "__CslensProbe";

fn invalid(file: &str, kind: DeclarationKind, reason: impl Into<String>) -> PatchError {
    PatchError::InvalidReplacement {
        file: file.to_string(),
        what: kind.what(),
        reason: reason.into(),
    }
}

fn significant_children(node: Node<'_>) -> Vec<Node<'_>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .filter(|child| child.kind() != "comment")
        .collect()
}

/// Checks that `new_code` is exactly one declaration of `kind` and returns it
/// trimmed. Methods are parsed inside a throwaway class body.
pub fn validate_replacement(
    parser: &mut CSharpParser,
    kind: DeclarationKind,
    new_code: &str,
    file: &str,
) -> Result<String, PatchError> {
    let code = new_code.trim();
    let wrapped;
    let probe = match kind {
        DeclarationKind::Method => {
            wrapped = format!("class {PROBE_CLASS} {{\n{code}\n}}\n");
            wrapped.as_str()
        }
        DeclarationKind::Type => code,
    };
    let tree = parser
        .parse_tree(probe)
        .ok_or_else(|| invalid(file, kind, "replacement could not be parsed"))?;
    let root = tree.root_node();
    if root.has_error() {
        return Err(invalid(file, kind, "replacement has syntax errors"));
    }
    let top = significant_children(root);
    let declarations = match kind {
        DeclarationKind::Method => match top.as_slice() {
            [class] => body_members(*class)
                .into_iter()
                .filter(|member| member.kind() != "comment")
                .collect(),
            _ => Vec::new(),
        },
        DeclarationKind::Type => top,
    };
    match declarations.as_slice() {
        [single] if kind.matches(single.kind()) => Ok(code.to_string()),
        [single] if kind == DeclarationKind::Type && !is_type_declaration(single.kind()) => Err(
            invalid(file, kind, format!("expected a type declaration, found {}", single.kind())),
        ),
        [single] => Err(invalid(
            file,
            kind,
            format!("expected a method declaration, found {}", single.kind()),
        )),
        [] => Err(invalid(file, kind, "replacement declares nothing")),
        many => Err(invalid(
            file,
            kind,
            format!("expected one declaration, found {}", many.len()),
        )),
    }
}

/// Indentation of the line `offset` sits on, up to the first non-blank.
pub fn line_indent(text: &str, offset: usize) -> &str {
    let line_start = text[..offset].rfind('\n').map(|idx| idx + 1).unwrap_or(0);
    util::leading_whitespace(&text[line_start..])
}

/// Re-indents a trimmed declaration for insertion at a position whose line is
/// indented by `indent`. The first line is placed as is; later lines keep
/// their indentation relative to the least indented of them.
pub fn reindent(code: &str, indent: &str, newline: &str) -> String {
    let mut lines = code.lines();
    let Some(first) = lines.next() else {
        return String::new();
    };
    let rest: Vec<&str> = lines.collect();
    let common = rest
        .iter()
        .filter(|line| !line.trim().is_empty())
        .map(|line| util::leading_whitespace(line).len())
        .min()
        .unwrap_or(0);
    let mut out = String::with_capacity(code.len() + rest.len() * indent.len());
    out.push_str(first.trim_end());
    for line in rest {
        out.push_str(newline);
        let line = line.trim_end();
        if line.is_empty() {
            continue;
        }
        out.push_str(indent);
        out.push_str(&line[common.min(util::leading_whitespace(line).len())..]);
    }
    out
}

pub fn splice(text: &str, target: Target, replacement: &str) -> String {
    let mut out = String::with_capacity(text.len() + replacement.len());
    out.push_str(&text[..target.start]);
    out.push_str(replacement);
    out.push_str(&text[target.end..]);
    out
}

/// Replaces a declaration node with `code`, then re-parses the file and
/// rejects the edit if it introduced syntax errors.
pub fn replace_declaration(
    parser: &mut CSharpParser,
    file: &str,
    text: &str,
    had_errors: bool,
    node: Node<'_>,
    kind: DeclarationKind,
    code: &str,
) -> Result<String, PatchError> {
    let newline = if text.contains("\r\n") { "\r\n" } else { "\n" };
    let indent = line_indent(text, node.start_byte());
    let replacement = reindent(code, indent, newline);
    let target = Target {
        start: node.start_byte(),
        end: node.end_byte(),
    };
    let updated = splice(text, target, &replacement);
    let reparsed = parser
        .parse_tree(&updated)
        .ok_or_else(|| invalid(file, kind, "patched file could not be parsed"))?;
    if reparsed.root_node().has_error() && !had_errors {
        return Err(invalid(file, kind, "patched file has syntax errors"));
    }
    Ok(updated)
}

/// Writes `contents` to a temp file next to `path`, syncs it and renames it
/// over `path`. Either the whole new content lands or `path` is untouched.
pub fn write_atomic(path: &Path, contents: &str) -> io::Result<()> {
    let dir = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut temp = tempfile::Builder::new()
        .prefix(".cslens-")
        .suffix(".tmp")
        .tempfile_in(dir)?;
    temp.write_all(contents.as_bytes())?;
    temp.as_file().sync_all()?;
    if let Ok(metadata) = fs::metadata(path) {
        fs::set_permissions(temp.path(), metadata.permissions())?;
    }
    temp.persist(path).map_err(|err| err.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use tempfile::TempDir;

    #[test]
    fn method_replacement_must_be_one_method() {
        let mut parser = CSharpParser::new().unwrap();
        let ok = validate_replacement(
            &mut parser,
            DeclarationKind::Method,
            "\n  // updated\n  void Run() { Go(); }\n",
            "a.cs",
        )
        .unwrap();
        assert_eq!(ok, "// updated\n  void Run() { Go(); }");

        for bad in ["void Run() {} void Stop() {}", "int count;", "void Run( {"] {
            let err = validate_replacement(&mut parser, DeclarationKind::Method, bad, "a.cs")
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidReplacement, "{bad}");
        }
    }

    #[test]
    fn type_replacement_must_be_one_type() {
        let mut parser = CSharpParser::new().unwrap();
        assert!(
            validate_replacement(&mut parser, DeclarationKind::Type, "record Point(int X);", "a.cs")
                .is_ok()
        );
        for bad in ["class A {} class B {}", "class A {", "using System;"] {
            let err = validate_replacement(&mut parser, DeclarationKind::Type, bad, "a.cs")
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidReplacement, "{bad}");
        }
    }

    #[test]
    fn reindent_keeps_relative_indentation() {
        let code = "void Run()\n{\n    Go();\n\n}";
        assert_eq!(
            reindent(code, "    ", "\n"),
            "void Run()\n    {\n        Go();\n\n    }"
        );
        let copied = "void Run()\n        {\n            Go();\n        }";
        assert_eq!(
            reindent(copied, "  ", "\r\n"),
            "void Run()\r\n  {\r\n      Go();\r\n  }"
        );
    }

    #[test]
    fn atomic_write_replaces_contents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("A.cs");
        fs::write(&path, "old").unwrap();
        write_atomic(&path, "new contents").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "new contents");
        let leftovers = fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(leftovers, 1);
    }

    #[test]
    fn failed_persist_keeps_the_target_and_cleans_up() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("Orders.cs");
        fs::create_dir(&target).unwrap();
        fs::write(target.join("Keep.cs"), "class Keep {}").unwrap();

        let err = write_atomic(&target, "class Orders {}").unwrap_err();
        assert_ne!(err.kind(), io::ErrorKind::NotFound);
        assert!(target.is_dir());
        assert_eq!(
            fs::read_to_string(target.join("Keep.cs")).unwrap(),
            "class Keep {}"
        );
        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["Orders.cs"]);
    }

    #[test]
    fn missing_parent_is_an_error() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("gone").join("A.cs");
        assert!(write_atomic(&target, "class A {}").is_err());
        assert!(!dir.path().join("gone").exists());
    }
}
