//! Builds a forward `(i_line) -> (original_file, original_line)` map per preprocessed `.i` file
//! by scanning `#line LINE "FILE"` directives, the bridge between binary and source coordinates.

use reforge_common::ExcludedPrefixes;

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Origin {
    pub file: String,
    pub line: u64,
}

/// A dense forward map from preprocessed-file line number to source origin. A line with no entry
/// (synthetic, or under an excluded prefix) maps to `None`.
pub struct OriginMap {
    lines: Vec<Option<Origin>>,
}

fn parse_line_directive(line: &str) -> Option<(u64, String)> {
    let rest = line.strip_prefix("#line ").or_else(|| line.strip_prefix("# "))?;
    let mut parts = rest.splitn(2, ' ');
    let line_no: u64 = parts.next()?.trim().parse().ok()?;
    let remainder = parts.next()?.trim();
    let file = remainder.trim_matches('"').split(' ').next()?.to_string();
    Some((line_no, file))
}

fn is_synthetic(file: &str) -> bool {
    file.starts_with('<') || file.is_empty()
}

impl OriginMap {
    /// Builds the map by scanning `text` (the `.i` file's contents) line by line.
    pub fn build(text: &str, excluded_prefixes: &ExcludedPrefixes) -> Self {
        let mut lines = Vec::with_capacity(text.lines().count());
        let mut current_file: Option<String> = None;
        let mut next_original_line: u64 = 1;

        for physical_line in text.lines() {
            if let Some((directive_line, file)) = parse_line_directive(physical_line) {
                current_file = Some(file);
                next_original_line = directive_line;
                lines.push(None);
                continue;
            }

            let origin = current_file.as_ref().and_then(|file| {
                if is_synthetic(file) || excluded_prefixes.matches(file) {
                    None
                } else {
                    Some(Origin {
                        file: file.clone(),
                        line: next_original_line,
                    })
                }
            });
            lines.push(origin);
            next_original_line += 1;
        }

        OriginMap { lines }
    }

    /// The source origin of preprocessed-file line `i_line` (1-based), if any.
    pub fn resolve(&self, i_line: u64) -> Option<&Origin> {
        let index = i_line.checked_sub(1)? as usize;
        self.lines.get(index).and_then(|o| o.as_ref())
    }

    pub fn is_empty(&self) -> bool {
        self.lines.iter().all(|o| o.is_none())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_lines_after_a_line_directive() {
        let text = "#line 10 \"main.c\"\nint a;\nint b;\n";
        let map = OriginMap::build(text, &ExcludedPrefixes::default());
        assert_eq!(
            map.resolve(2),
            Some(&Origin {
                file: "main.c".to_string(),
                line: 10
            })
        );
        assert_eq!(
            map.resolve(3),
            Some(&Origin {
                file: "main.c".to_string(),
                line: 11
            })
        );
    }

    #[test]
    fn excluded_prefix_lines_map_to_none() {
        let text = "#line 1 \"/usr/include/stdio.h\"\nint a;\n";
        let map = OriginMap::build(text, &ExcludedPrefixes::default());
        assert_eq!(map.resolve(2), None);
    }

    #[test]
    fn synthetic_file_names_map_to_none() {
        let text = "#line 1 \"<built-in>\"\nint a;\n";
        let map = OriginMap::build(text, &ExcludedPrefixes::default());
        assert_eq!(map.resolve(2), None);
    }
}
