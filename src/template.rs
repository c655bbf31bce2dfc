use crate::error::Error;
use regex::Regex;

/// One `name=index` line from a template header.
///
/// The name is the exact literal that will be searched for in the statement
/// body; no marker prefix such as `:` is assumed or added. The index is the
/// 1-based logical parameter index callers bind against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    name: String,
    index: usize,
}

impl Declaration {
    /// The declared parameter literal.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The 1-based logical index the literal maps to.
    pub fn index(&self) -> usize {
        self.index
    }
}

/// A statement template split into its declarations and its SQL body.
///
/// Templates may start with a `/* ... */` comment block declaring named
/// parameters, one `name=index` per line:
///
/// ```text
/// /*
/// :name=1
/// :email=2
/// */
/// INSERT INTO users (name, email) VALUES (:name, :email)
/// ```
///
/// The comment block is only recognized as a header when it is the first
/// non-whitespace content of the template, and it ends at the first `*/`.
/// Without a header the whole input is the body and there are no
/// declarations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    declarations: Vec<Declaration>,
    body: String,
}

impl Template {
    /// Splits raw template text into header declarations and body.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TemplateFormat`] if a header block is present but
    /// malformed: an unterminated comment, a line that is not `name=index`,
    /// an index of `0`, a name containing `?`, or a duplicated name.
    pub fn parse(raw: &str) -> crate::Result<Self> {
        let leading = raw.len() - raw.trim_start().len();
        let rest = &raw[leading..];
        if !rest.starts_with("/*") {
            return Ok(Self {
                declarations: Vec::new(),
                body: raw.to_owned(),
            });
        }

        let pattern = Regex::new(r"(?s)\A/\*(?:.*?)\*/")?;
        let header = match pattern.find(rest) {
            Some(m) => m,
            None => {
                return Err(Error::TemplateFormat {
                    reason: "unterminated header comment".to_owned(),
                })
            }
        };

        let declarations = parse_declarations(&rest[2..header.end() - 2])?;
        let body = format!("{}{}", &raw[..leading], &rest[header.end()..]);
        Ok(Self { declarations, body })
    }

    /// The declarations in the order they appear in the header.
    pub fn declarations(&self) -> &[Declaration] {
        &self.declarations
    }

    /// The SQL body with the header comment removed.
    pub fn body(&self) -> &str {
        &self.body
    }
}

fn parse_declarations(header: &str) -> crate::Result<Vec<Declaration>> {
    let mut declarations: Vec<Declaration> = Vec::new();
    for line in header.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let (name, index) = line
            .split_once('=')
            .ok_or_else(|| malformed(line, "expected `name=index`"))?;
        let name = name.trim();
        let index: usize = index
            .trim()
            .parse()
            .map_err(|_| malformed(line, "index is not an integer"))?;
        if name.is_empty() {
            return Err(malformed(line, "empty parameter name"));
        }
        if name.contains('?') {
            return Err(malformed(line, "parameter name may not contain `?`"));
        }
        if index == 0 {
            return Err(malformed(line, "indices are 1-based"));
        }
        if declarations.iter().any(|d| d.name == name) {
            return Err(malformed(line, "duplicate parameter name"));
        }
        declarations.push(Declaration {
            name: name.to_owned(),
            index,
        });
    }
    Ok(declarations)
}

fn malformed(line: &str, reason: &str) -> Error {
    Error::TemplateFormat {
        reason: format!("invalid declaration line `{line}`: {reason}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_without_header() {
        let template = Template::parse("SELECT * FROM t WHERE id = ?").unwrap();
        assert!(template.declarations().is_empty());
        assert_eq!(template.body(), "SELECT * FROM t WHERE id = ?");
    }

    #[test]
    fn test_parse_with_header() {
        let template = Template::parse("/*\nname=2\n*/\nINSERT INTO t(a,b) VALUES (?, name)").unwrap();
        assert_eq!(
            template.declarations(),
            &[Declaration {
                name: "name".to_owned(),
                index: 2,
            }],
        );
        assert_eq!(template.body(), "\nINSERT INTO t(a,b) VALUES (?, name)");
    }

    #[test]
    fn test_parse_preserves_declaration_order() {
        let template = Template::parse("/*\nsecond=2\nfirst=1\n*/\nSELECT 1").unwrap();
        let names: Vec<&str> = template.declarations().iter().map(Declaration::name).collect();
        assert_eq!(names, vec!["second", "first"]);
    }

    #[test]
    fn test_parse_skips_blank_lines_and_trims() {
        let template = Template::parse("/*\n\n  :id = 1  \n\n*/\nSELECT :id").unwrap();
        assert_eq!(template.declarations()[0].name(), ":id");
        assert_eq!(template.declarations()[0].index(), 1);
    }

    #[test]
    fn test_parse_allows_leading_whitespace_before_header() {
        let template = Template::parse("\n  /*\nx=1\n*/SELECT x").unwrap();
        assert_eq!(template.declarations().len(), 1);
        assert_eq!(template.body(), "\n  SELECT x");
    }

    #[test]
    fn test_comment_later_in_body_is_not_a_header() {
        let template = Template::parse("SELECT 1 /* not=1 */").unwrap();
        assert!(template.declarations().is_empty());
        assert_eq!(template.body(), "SELECT 1 /* not=1 */");
    }

    #[test]
    fn test_header_ends_at_first_close() {
        let template = Template::parse("/* a=1 */ SELECT a /* trailing */").unwrap();
        assert_eq!(template.declarations().len(), 1);
        assert_eq!(template.body(), " SELECT a /* trailing */");
    }

    #[test]
    fn test_unterminated_header_is_rejected() {
        let result = Template::parse("/*\nname=1\nSELECT 1");
        assert!(matches!(result, Err(Error::TemplateFormat { .. })));
    }

    #[test]
    fn test_non_declaration_line_is_rejected() {
        let result = Template::parse("/*\nname\n*/\nSELECT 1");
        assert!(matches!(result, Err(Error::TemplateFormat { .. })));
    }

    #[test]
    fn test_non_integer_index_is_rejected() {
        let result = Template::parse("/*\nname=abc\n*/\nSELECT 1");
        assert!(matches!(result, Err(Error::TemplateFormat { .. })));
    }

    #[test]
    fn test_zero_index_is_rejected() {
        let result = Template::parse("/*\nname=0\n*/\nSELECT 1");
        assert!(matches!(result, Err(Error::TemplateFormat { .. })));
    }

    #[test]
    fn test_duplicate_name_is_rejected() {
        let result = Template::parse("/*\nname=1\nname=2\n*/\nSELECT 1");
        assert!(matches!(result, Err(Error::TemplateFormat { .. })));
    }
}
