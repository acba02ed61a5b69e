//! Rewriting of Teχ escape macros in field data into presentation text.
//!
//! The rewrite is a fixed, ordered list of replacements followed by one pass
//! removing grouping braces. Order matters: `{\"a}` must be recognized as an
//! umlaut before its braces are stripped as a plain group.

use std::fmt;
use std::str;

/// Target representation of normalized data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Style {
    /// HTML entities like `&auml;` and `&mdash;`
    #[default]
    Html,
    /// plain Unicode characters like `ä` and `—`
    Unicode,
}

impl str::FromStr for Style {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "html" => Ok(Style::Html),
            "unicode" => Ok(Style::Unicode),
            _ => Err(format!("unknown style '{}', expected 'html' or 'unicode'", s)),
        }
    }
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Style::Html => "html",
            Style::Unicode => "unicode",
        })
    }
}

struct Rule {
    pattern: &'static str,
    // swallow one whitespace character following the pattern
    eats_space: bool,
    html: &'static str,
    unicode: &'static str,
}

const fn rule(pattern: &'static str, html: &'static str, unicode: &'static str) -> Rule {
    Rule {
        pattern,
        eats_space: false,
        html,
        unicode,
    }
}

const RULES: [Rule; 12] = [
    Rule {
        pattern: "\\glqq",
        eats_space: true,
        html: "&bdquo;",
        unicode: "\u{201E}",
    },
    Rule {
        pattern: "\\grqq",
        eats_space: true,
        html: "&rdquo;",
        unicode: "\u{201D}",
    },
    rule("\\ ", "&nbsp;", "\u{00A0}"),
    rule("\\url", "", ""),
    rule("---", "&mdash;", "\u{2014}"),
    rule("{\\\"a}", "&auml;", "ä"),
    rule("{\\\"o}", "&ouml;", "ö"),
    rule("{\\\"u}", "&uuml;", "ü"),
    rule("{\\\"A}", "&Auml;", "Ä"),
    rule("{\\\"O}", "&Ouml;", "Ö"),
    rule("{\\\"U}", "&Uuml;", "Ü"),
    rule("\\ss", "&szlig;", "ß"),
];

impl Rule {
    fn apply(&self, src: &str, style: Style) -> String {
        let replacement = match style {
            Style::Html => self.html,
            Style::Unicode => self.unicode,
        };
        if !self.eats_space {
            return src.replace(self.pattern, replacement);
        }

        let mut result = String::with_capacity(src.len());
        let mut rest = src;
        while let Some(idx) = rest.find(self.pattern) {
            result.push_str(&rest[..idx]);
            result.push_str(replacement);
            rest = &rest[idx + self.pattern.len()..];
            if let Some(chr) = rest.chars().next().filter(|c| c.is_whitespace()) {
                rest = &rest[chr.len_utf8()..];
            }
        }
        result.push_str(rest);
        result
    }
}

/// Can a group not span this character? Mirrors a regex `.`, which stops at line breaks.
fn ends_line(c: char) -> bool {
    matches!(c, '\n' | '\r' | '\u{2028}' | '\u{2029}')
}

/// Replace every group `{X}` by `X` in a single left-to-right pass.
/// A group ends at the first `}` after its `{` and never spans a line break,
/// so nested groups lose only their outermost `{` and first `}`.
pub fn strip_groups(src: &str) -> String {
    let mut result = String::with_capacity(src.len());
    // src[..copied] has been written to `result`
    let mut copied = 0;
    let mut search = 0;
    // every `{` before this offset runs into a line break before any `}`
    let mut unclosed_until = 0;
    while let Some(found) = src[search..].find('{') {
        let open = search + found;
        let inner = open + 1;
        if open < unclosed_until {
            search = inner;
            continue;
        }
        match src[inner..].find(|c: char| c == '}' || ends_line(c)) {
            Some(len) if src[inner + len..].starts_with('}') => {
                result.push_str(&src[copied..open]);
                result.push_str(&src[inner..inner + len]);
                copied = inner + len + 1;
                search = copied;
            }
            Some(len) => {
                unclosed_until = inner + len;
                search = inner;
            }
            None => break,
        }
    }
    result.push_str(&src[copied..]);
    result
}

fn apply_rules(data: &str, style: Style) -> String {
    let mut result = data.to_string();
    for rule in RULES.iter() {
        if result.contains(rule.pattern) {
            result = rule.apply(&result, style);
        }
    }
    result
}

/// Expand known escape macros in `data` and remove residual grouping braces.
///
/// * `\glqq` and `\grqq` become low and high double quotes
/// * `\ ` becomes a non-breaking space
/// * `\url` is dropped, keeping its argument
/// * `---` becomes an em-dash
/// * `{\"a}`, `{\"o}`, `{\"u}`, `{\"A}`, `{\"O}`, `{\"U}` and `\ss` become the German letters
///
/// Removing a group may join text into a macro, as in `-{}--`; such macros are
/// expanded as well, so normalizing the result again changes nothing.
/// Other macros are left untouched; the function never fails.
pub fn normalize(data: &str, style: Style) -> String {
    let expanded = apply_rules(data, style);
    let stripped = strip_groups(&expanded);
    if stripped.len() == expanded.len() {
        stripped
    } else {
        apply_rules(&stripped, style)
    }
}
