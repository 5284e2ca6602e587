use anyhow::{Context, Result};
use std::fs;
use std::path::{Component, Path};

pub fn read_to_string(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("read {}", path.display()))
}

pub fn normalize_rel_path(root: &Path, path: &Path) -> Result<String> {
    let rel = path.strip_prefix(root).with_context(|| {
        format!("strip prefix {} from {}", root.display(), path.display())
    })?;
    Ok(normalize_path(rel))
}

pub fn normalize_path(path: &Path) -> String {
    let mut parts = Vec::new();
    for comp in path.components() {
        match comp {
            Component::Normal(os) => parts.push(os.to_string_lossy().to_string()),
            Component::ParentDir => parts.push("..".to_string()),
            Component::CurDir => {}
            _ => {}
        }
    }
    if parts.is_empty() {
        ".".to_string()
    } else {
        parts.join("/")
    }
}

/// Byte offsets where each line starts. A trailing newline opens one more
/// (empty) line, so `"a\nb\n"` has three lines.
pub fn line_starts(text: &str) -> Vec<usize> {
    let mut starts = vec![0];
    for (idx, byte) in text.bytes().enumerate() {
        if byte == b'\n' {
            starts.push(idx + 1);
        }
    }
    starts
}

/// End offset of the zero-based `line`, excluding its terminator.
pub fn line_end(text: &str, starts: &[usize], line: usize) -> usize {
    let Some(next) = starts.get(line + 1) else {
        return text.len();
    };
    let mut end = next - 1;
    if end > starts[line] && text.as_bytes()[end - 1] == b'\r' {
        end -= 1;
    }
    end
}

pub fn leading_whitespace(line: &str) -> &str {
    let len = line
        .bytes()
        .take_while(|byte| *byte == b' ' || *byte == b'\t')
        .count();
    &line[..len]
}

/// Collapse every whitespace run to a single space and trim the ends.
pub fn collapse_whitespace(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut last_space = false;
    for ch in raw.chars() {
        if ch.is_whitespace() {
            if !last_space {
                out.push(' ');
                last_space = true;
            }
        } else {
            out.push(ch);
            last_space = false;
        }
    }
    out.trim().to_string()
}

pub fn is_blank(value: Option<&str>) -> bool {
    value.map(|v| v.trim().is_empty()).unwrap_or(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_table_counts_trailing_empty_line() {
        assert_eq!(line_starts("a\nb\n"), vec![0, 2, 4]);
        assert_eq!(line_starts(""), vec![0]);
    }

    #[test]
    fn line_end_skips_crlf() {
        let text = "ab\r\ncd";
        let starts = line_starts(text);
        assert_eq!(line_end(text, &starts, 0), 2);
        assert_eq!(line_end(text, &starts, 1), 6);
    }

    #[test]
    fn collapse_whitespace_normalizes_runs() {
        assert_eq!(collapse_whitespace("  (int a,\n   int b) "), "(int a, int b)");
    }
}
