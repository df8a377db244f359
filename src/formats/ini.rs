//! INI reader and writer.
//!
//! Follows the usual `configparser` conventions with interpolation disabled
//! and key case preserved:
//! - `key = value` or `key: value` (the first delimiter wins),
//! - full-line comments starting with `#` or `;` (no inline comments),
//! - indented lines continue the previous value, joined with `\n`,
//! - values in `[DEFAULT]` are inherited by every other section,
//! - duplicate sections or keys, and keys outside of any section, are errors.

use std::fmt::Write as _;


pub const DEFAULT_SECTION: &str = "DEFAULT";


#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IniParseError {
    pub line: usize,
    pub message: String,
}

impl std::fmt::Display for IniParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

impl std::error::Error for IniParseError {}


#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IniSection {
    pub name: String,
    pub entries: Vec<(String, String)>,
}

impl IniSection {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: Vec::new(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(stored, _)| stored == key)
            .map(|(_, value)| value.as_str())
    }

    fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(stored, _)| stored == key)
    }
}


/// A parsed INI document. `sections` never contains the `[DEFAULT]` section.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IniDocument {
    pub defaults: Vec<(String, String)>,
    pub sections: Vec<IniSection>,
}

impl IniDocument {
    pub fn section(&self, name: &str) -> Option<&IniSection> {
        self.sections.iter().find(|section| section.name == name)
    }

    /// Section entries with the `[DEFAULT]` values a section does not override
    /// appended after its own.
    pub fn resolved_sections(&self) -> Vec<IniSection> {
        self.sections
            .iter()
            .map(|section| {
                let mut resolved = section.clone();
                for (key, value) in &self.defaults {
                    if !resolved.contains_key(key) {
                        resolved.entries.push((key.clone(), value.clone()));
                    }
                }
                resolved
            })
            .collect()
    }
}


struct PendingOption {
    key: String,
    lines: Vec<String>,
    indent: usize,
    blank_lines: usize,
}

fn indentation_of(line: &str) -> usize {
    line.len() - line.trim_start().len()
}

fn is_comment(trimmed: &str) -> bool {
    trimmed.starts_with('#') || trimmed.starts_with(';')
}


pub fn parse(source: &str) -> Result<IniDocument, IniParseError> {
    let mut document = IniDocument::default();
    // `None` while outside of any section, `Some(None)` inside `[DEFAULT]`.
    let mut current_section: Option<Option<usize>> = None;
    let mut pending: Option<PendingOption> = None;

    let source = source.strip_prefix('\u{feff}').unwrap_or(source);

    for (line_index, raw_line) in source.lines().enumerate() {
        let line_number = line_index + 1;
        let line = raw_line.trim_end_matches('\r');
        let trimmed = line.trim();

        if trimmed.is_empty() {
            if let Some(option) = pending.as_mut() {
                option.blank_lines += 1;
            }
            continue;
        }

        if is_comment(trimmed) {
            continue;
        }

        let indent = indentation_of(line);

        if let Some(option) = pending.as_mut() {
            if indent > option.indent {
                for _ in 0..option.blank_lines {
                    option.lines.push(String::new());
                }
                option.blank_lines = 0;
                option.lines.push(trimmed.to_string());
                continue;
            }
        }

        if let Some(option) = pending.take() {
            commit_option(&mut document, current_section, option);
        }

        if trimmed.starts_with('[') {
            let Some(close) = trimmed.rfind(']') else {
                return Err(IniParseError {
                    line: line_number,
                    message: format!("unterminated section header: {trimmed:?}"),
                });
            };

            let name = trimmed[1..close].to_string();
            if name.is_empty() {
                return Err(IniParseError {
                    line: line_number,
                    message: "empty section name".to_string(),
                });
            }

            if name == DEFAULT_SECTION {
                current_section = Some(None);
                continue;
            }

            if document.section(&name).is_some() {
                return Err(IniParseError {
                    line: line_number,
                    message: format!("section {name:?} already exists"),
                });
            }

            document.sections.push(IniSection::new(name));
            current_section = Some(Some(document.sections.len() - 1));
            continue;
        }

        let Some(section_slot) = current_section else {
            return Err(IniParseError {
                line: line_number,
                message: format!("option outside of any section: {trimmed:?}"),
            });
        };

        let Some(delimiter) = trimmed.find(['=', ':']) else {
            return Err(IniParseError {
                line: line_number,
                message: format!("expected `key = value`, found {trimmed:?}"),
            });
        };

        let key = trimmed[..delimiter].trim_end().to_string();
        let value = trimmed[delimiter + 1..].trim_start().to_string();

        if key.is_empty() {
            return Err(IniParseError {
                line: line_number,
                message: "empty option name".to_string(),
            });
        }

        let already_defined = match section_slot {
            Some(index) => document.sections[index].contains_key(&key),
            None => document.defaults.iter().any(|(stored, _)| *stored == key),
        };
        if already_defined {
            return Err(IniParseError {
                line: line_number,
                message: format!("option {key:?} already exists in this section"),
            });
        }

        pending = Some(PendingOption {
            key,
            lines: vec![value],
            indent,
            blank_lines: 0,
        });
    }

    if let Some(option) = pending.take() {
        commit_option(&mut document, current_section, option);
    }

    Ok(document)
}

fn commit_option(
    document: &mut IniDocument,
    current_section: Option<Option<usize>>,
    option: PendingOption,
) {
    let value = option.lines.join("\n");

    match current_section {
        Some(Some(index)) => document.sections[index].entries.push((option.key, value)),
        Some(None) => document.defaults.push((option.key, value)),
        // Options are only ever opened inside a section.
        None => {}
    }
}


/// Renders sections back into INI text. Multi-line values are written as
/// tab-indented continuation lines.
pub fn write(sections: &[IniSection]) -> String {
    let mut output = String::new();

    for section in sections {
        let _ = writeln!(output, "[{}]", section.name);

        for (key, value) in &section.entries {
            let mut lines = value.split('\n');
            let first = lines.next().unwrap_or_default();

            if first.is_empty() {
                let _ = writeln!(output, "{key} =");
            } else {
                let _ = writeln!(output, "{key} = {first}");
            }

            for continuation in lines {
                let _ = writeln!(output, "\t{continuation}");
            }
        }

        output.push('\n');
    }

    output
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_sections_and_preserves_case() {
        let document = parse(
            "[PATH]\nNetwork_Support = V:/FF/Support\nlocal: C:/Users/John\n\n[DISK]\nU = \\\\smb\\dfs\\\n",
        )
        .unwrap();

        assert_eq!(document.sections.len(), 2);
        let path = document.section("PATH").unwrap();
        assert_eq!(path.get("Network_Support"), Some("V:/FF/Support"));
        assert_eq!(path.get("local"), Some("C:/Users/John"));
        assert_eq!(document.section("DISK").unwrap().get("U"), Some("\\\\smb\\dfs\\"));
    }

    #[test]
    fn no_interpolation_and_no_inline_comments() {
        let document = parse("[s]\nrate = 100%(x)s ; kept\n").unwrap();

        assert_eq!(
            document.section("s").unwrap().get("rate"),
            Some("100%(x)s ; kept")
        );
    }

    #[test]
    fn first_delimiter_wins() {
        let document = parse("[s]\nurl: http://host/?a=b\nexpr = a:b\n").unwrap();
        let section = document.section("s").unwrap();

        assert_eq!(section.get("url"), Some("http://host/?a=b"));
        assert_eq!(section.get("expr"), Some("a:b"));
    }

    #[test]
    fn continuation_lines_join_with_newlines() {
        let document = parse("[s]\nlist = one\n  two\n\n  three\nnext = x\n").unwrap();
        let section = document.section("s").unwrap();

        assert_eq!(section.get("list"), Some("one\ntwo\n\nthree"));
        assert_eq!(section.get("next"), Some("x"));
    }

    #[test]
    fn defaults_are_inherited() {
        let document = parse("[DEFAULT]\nshared = 1\nlevel = low\n[a]\nlevel = high\n").unwrap();

        assert!(document.section(DEFAULT_SECTION).is_none());
        let resolved = document.resolved_sections();
        assert_eq!(resolved[0].get("level"), Some("high"));
        assert_eq!(resolved[0].get("shared"), Some("1"));
    }

    #[test]
    fn comments_are_skipped() {
        let document = parse("# heading\n[s]\n; note\nkey = value\n").unwrap();

        assert_eq!(document.section("s").unwrap().entries.len(), 1);
    }

    #[test]
    fn rejects_malformed_input() {
        assert_eq!(parse("key = value\n").unwrap_err().line, 1);
        assert_eq!(parse("[s]\njust text\n").unwrap_err().line, 2);
        assert_eq!(parse("[s]\n[s]\n").unwrap_err().line, 2);
        assert_eq!(parse("[s]\na = 1\na = 2\n").unwrap_err().line, 3);
        assert!(parse("[s\n").is_err());
    }

    #[test]
    fn written_documents_parse_back() {
        let mut section = IniSection::new("PATHS");
        section.entries.push(("CONFIG".to_string(), "/home/u/config".to_string()));
        section.entries.push(("Multi".to_string(), "a\nb".to_string()));

        let text = write(&[section.clone()]);
        assert!(text.starts_with("[PATHS]\nCONFIG = /home/u/config\n"));

        let document = parse(&text).unwrap();
        assert_eq!(document.sections, vec![section]);
    }
}
