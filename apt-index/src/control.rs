//! Deb822 control paragraph handling shared by the index parsers.

use crate::{AptIndexError, Result};
use std::collections::HashMap;

/// Parse a single control paragraph into lowercased field names and values.
///
/// Continuation lines (leading space or tab) are appended to the previous
/// field, separated by a newline. `keep_indent` preserves the leading
/// whitespace of continuation lines, which the `Release` checksum lists
/// rely on.
pub fn parse_fields(paragraph: &str, keep_indent: bool) -> Result<HashMap<String, String>> {
    let mut fields = HashMap::new();
    let mut current_field: Option<String> = None;
    let mut current_value = String::new();

    for line in paragraph.lines() {
        if line.trim().is_empty() {
            continue;
        }

        if line.starts_with(' ') || line.starts_with('\t') {
            if current_field.is_some() {
                current_value.push('\n');
                if keep_indent {
                    current_value.push_str(line);
                } else {
                    current_value.push_str(line.trim_start());
                }
            }
            continue;
        }

        if let Some(field) = current_field.take() {
            fields.insert(field, std::mem::take(&mut current_value));
        }

        match line.split_once(':') {
            Some((field, value)) => {
                current_field = Some(field.trim().to_lowercase());
                current_value = value.trim().to_string();
            }
            None => {
                return Err(AptIndexError::invalid_package(format!(
                    "Invalid line format: {}",
                    line
                )));
            }
        }
    }

    if let Some(field) = current_field {
        fields.insert(field, current_value);
    }

    Ok(fields)
}

/// Split a control file into its paragraphs. Blank lines separate paragraphs.
pub fn paragraphs(content: &str) -> Vec<String> {
    let mut paragraphs = Vec::new();
    let mut current = String::new();

    for line in content.lines() {
        if line.trim().is_empty() {
            if !current.trim().is_empty() {
                paragraphs.push(std::mem::take(&mut current));
            }
        } else {
            current.push_str(line);
            current.push('\n');
        }
    }

    if !current.trim().is_empty() {
        paragraphs.push(current);
    }

    paragraphs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fields_lowercases_names() {
        let fields = parse_fields("Package: foo\nInstalled-Size: 12\n", false).unwrap();
        assert_eq!(fields.get("package").map(String::as_str), Some("foo"));
        assert_eq!(fields.get("installed-size").map(String::as_str), Some("12"));
    }

    #[test]
    fn test_continuation_lines() {
        let fields =
            parse_fields("Description: short\n long line one\n .\n long line two\n", false)
                .unwrap();
        assert_eq!(
            fields["description"],
            "short\nlong line one\n.\nlong line two"
        );

        let indented = parse_fields("SHA256:\n abc 12 main/Packages\n", true).unwrap();
        assert_eq!(indented["sha256"], "\n abc 12 main/Packages");
    }

    #[test]
    fn test_invalid_line_is_rejected() {
        let err = parse_fields("Package: foo\nthis line has no colon\n", false).unwrap_err();
        assert!(matches!(err, AptIndexError::InvalidPackageData(_)));
    }

    #[test]
    fn test_paragraph_splitting() {
        let content = "Package: a\n\n\nPackage: b\nVersion: 1\n   \nPackage: c";
        let paragraphs = paragraphs(content);
        assert_eq!(paragraphs.len(), 3);
        assert_eq!(paragraphs[1], "Package: b\nVersion: 1\n");
        assert_eq!(paragraphs[2], "Package: c\n");
    }
}
