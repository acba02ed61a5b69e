use std::convert;
use std::fs;
use std::io;
use std::io::Read;
use std::path;
use std::str;

use crate::errors::{ParsingError, ParsingErrorKind};
use crate::lexer::Cursor;
use crate::types::{BibEntry, Bibliography};

/// Parser turning the source of a `.bib` file into a [`Bibliography`]
///
/// The grammar read is the following:
///
/// ```text
/// bibtex           -> (string | preamble | comment | entry)*
/// string           -> '@STRING' '{' key_equals_value '}'
/// preamble         -> '@PREAMBLE' '{' value '}'
/// comment          -> '@COMMENT' '{' value '}'
/// entry            -> '@' key '{' key ',' key_value_list '}'
/// key_value_list   -> key_equals_value (',' key_equals_value)* ','?
/// key_equals_value -> key '=' value
/// value            -> single_value ('#' single_value)*
/// single_value     -> '{' balanced '}' | '"' text '"' | key
/// ```
///
/// Directive names, entry IDs and field names are case-insensitive.
pub struct Parser {
    src: String,
}

impl Parser {
    /// Use a file at some filepath as source for the parsing process.
    pub fn from_file<P: AsRef<path::Path>>(path: P) -> Result<Parser, io::Error> {
        let mut fd = fs::File::open(path)?;
        let mut src = String::new();
        fd.read_to_string(&mut src)?;
        Ok(Parser { src })
    }

    /// Use a string as source for the parsing process.
    pub fn from_string(src: String) -> Parser {
        Parser { src }
    }

    /// Parse the entire source. Every call starts a fresh session, so
    /// string variables never leak from one call into another.
    pub fn parse(&self) -> Result<Bibliography, ParsingError> {
        log::debug!("parsing {} bytes of bib source", self.src.len());
        Session::new(&self.src).run()
    }
}

impl str::FromStr for Parser {
    type Err = convert::Infallible;

    /// Use a string as source for the parsing process.
    fn from_str(src: &str) -> Result<Self, Self::Err> {
        Ok(Parser::from_string(src.to_string()))
    }
}

/// The kinds of `@` blocks, chosen by the word following `@`
#[derive(Debug, Clone, PartialEq, Eq)]
enum Directive {
    String,
    Preamble,
    Comment,
    /// any other word names an entry type, e.g. “ARTICLE”
    Entry(String),
}

impl Directive {
    fn from_keyword(word: String) -> Directive {
        match word.to_uppercase().as_str() {
            "STRING" => Directive::String,
            "PREAMBLE" => Directive::Preamble,
            "COMMENT" => Directive::Comment,
            _ => Directive::Entry(word),
        }
    }
}

/// Can this byte appear in keys, entry types and entry IDs?
fn is_key_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'_' | b':' | b'.' | b'/' | b'-')
}

/// State of one parse: the cursor, the string variables and the entries read so far.
struct Session<'s> {
    cursor: Cursor<'s>,
    bib: Bibliography,
    current_id: Option<String>,
}

impl<'s> Session<'s> {
    fn new(src: &'s str) -> Session<'s> {
        Session {
            cursor: Cursor::new(src),
            bib: Bibliography::new(),
            current_id: None,
        }
    }

    fn run(mut self) -> Result<Bibliography, ParsingError> {
        while self.cursor.peek_matches("@") {
            if let Err(err) = self.directive() {
                return Err(err.within(self.current_id.take()));
            }
        }
        Ok(self.bib)
    }

    fn directive(&mut self) -> Result<(), ParsingError> {
        let start = self.cursor.pos();
        self.cursor.consume("@")?;
        let directive = Directive::from_keyword(self.key()?);
        log::debug!("directive {:?} at offset {}", directive, start);
        self.cursor.consume("{")?;
        match directive {
            Directive::String => {
                let (name, value) = self.key_equals_value()?;
                self.bib.define_string(name, value);
            }
            Directive::Preamble | Directive::Comment => {
                self.value()?;
            }
            Directive::Entry(kind) => self.entry_body(&kind)?,
        }
        self.cursor.consume("}")?;
        self.current_id = None;
        Ok(())
    }

    fn entry_body(&mut self, kind: &str) -> Result<(), ParsingError> {
        let id = self.key()?;
        log::debug!("reading {} entry {}", kind, id);
        let mut entry = BibEntry::new(&id);
        self.current_id = Some(id);
        self.cursor.consume(",")?;
        self.key_value_list(&mut entry)?;
        self.bib.insert(entry);
        Ok(())
    }

    fn key_value_list(&mut self, entry: &mut BibEntry) -> Result<(), ParsingError> {
        let (name, value) = self.key_equals_value()?;
        entry.set(name, value);
        while self.cursor.peek_matches(",") {
            self.cursor.consume(",")?;
            // a comma may trail the last field
            if self.cursor.peek_matches("}") {
                break;
            }
            let (name, value) = self.key_equals_value()?;
            entry.set(name, value);
        }
        Ok(())
    }

    fn key_equals_value(&mut self) -> Result<(String, String), ParsingError> {
        let key = self.key()?;
        if !self.cursor.peek_matches("=") {
            return Err(self.cursor.error(ParsingErrorKind::EqualsSignMissing));
        }
        self.cursor.consume("=")?;
        let value = self.value()?;
        Ok((key, value))
    }

    /// Read a run of key characters, upper-cased. The run may be empty.
    fn key(&mut self) -> Result<String, ParsingError> {
        let start = self.cursor.pos();
        loop {
            match self.cursor.current() {
                None => return Err(self.cursor.error(ParsingErrorKind::RunawayKey)),
                Some(b) if is_key_byte(b) => self.cursor.advance(),
                Some(_) => break,
            }
        }
        Ok(self.cursor.slice(start, self.cursor.pos()).to_uppercase())
    }

    /// Read a value and all values concatenated to it by `#`.
    fn value(&mut self) -> Result<String, ParsingError> {
        let mut value = self.single_value()?;
        while self.cursor.peek_matches("#") {
            self.cursor.consume("#")?;
            value.push_str(&self.single_value()?);
        }
        Ok(value)
    }

    fn single_value(&mut self) -> Result<String, ParsingError> {
        if self.cursor.peek_matches("{") {
            self.braced_value()
        } else if self.cursor.peek_matches("\"") {
            self.quoted_value()
        } else {
            self.bare_value()
        }
    }

    /// `{…}` with balanced inner braces; `\}` neither opens nor closes a group.
    fn braced_value(&mut self) -> Result<String, ParsingError> {
        let open = self.cursor.pos();
        self.cursor.consume("{")?;
        let start = self.cursor.pos();
        let mut level = 0usize;
        loop {
            let pos = self.cursor.pos();
            match self.cursor.current() {
                None => {
                    return Err(self.cursor.error_at(
                        ParsingErrorKind::UnterminatedValue {
                            partial: self.cursor.slice(start, pos).to_string(),
                        },
                        open,
                    ))
                }
                Some(b'}') if !self.cursor.is_escaped(pos) => {
                    if level == 0 {
                        let value = self.cursor.slice(start, pos).to_string();
                        self.cursor.consume("}")?;
                        return Ok(value);
                    }
                    level -= 1;
                }
                Some(b'{') if !self.cursor.is_escaped(pos) => level += 1,
                Some(_) => {}
            }
            self.cursor.advance();
        }
    }

    /// `"…"` without nesting; `\"` does not end the value.
    fn quoted_value(&mut self) -> Result<String, ParsingError> {
        let open = self.cursor.pos();
        self.cursor.consume("\"")?;
        let start = self.cursor.pos();
        loop {
            let pos = self.cursor.pos();
            match self.cursor.current() {
                None => {
                    return Err(self.cursor.error_at(
                        ParsingErrorKind::UnterminatedValue {
                            partial: self.cursor.slice(start, pos).to_string(),
                        },
                        open,
                    ))
                }
                Some(b'"') if !self.cursor.is_escaped(pos) => {
                    let value = self.cursor.slice(start, pos).to_string();
                    self.cursor.consume("\"")?;
                    return Ok(value);
                }
                Some(_) => self.cursor.advance(),
            }
        }
    }

    /// A string variable or a number.
    fn bare_value(&mut self) -> Result<String, ParsingError> {
        let start = self.cursor.pos();
        let token = self.key()?;
        if let Some(value) = self.bib.string(&token) {
            Ok(value.to_string())
        } else if !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit()) {
            Ok(token)
        } else {
            Err(self
                .cursor
                .error_at(ParsingErrorKind::ValueExpected(token), start))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::error;

    fn parse(src: &str) -> Result<Bibliography, ParsingError> {
        Parser::from_string(src.to_string()).parse()
    }

    fn field(bib: &Bibliography, id: &str, name: &str) -> Option<String> {
        bib.get(id).and_then(|e| e.get(name)).map(str::to_string)
    }

    #[test]
    fn test_tolkien() -> Result<(), Box<dyn error::Error>> {
        let p: Parser = "@book{tolkien1937, author = {J. R. R. Tolkien}}".parse()?;
        let bib = p.parse()?;
        assert_eq!(bib.len(), 1);
        let entry = bib.get("tolkien1937").unwrap();
        assert_eq!(entry.id, "TOLKIEN1937");
        assert_eq!(entry.get("author"), Some("J. R. R. Tolkien"));
        Ok(())
    }

    #[test]
    fn test_taocp() -> Result<(), Box<dyn error::Error>> {
        let src = r#"@book{DBLP:books/lib/Knuth97,
  author    = {Donald Ervin Knuth},
  title     = {The art of computer programming, Volume {I:} Fundamental Algorithms,
               3rd Edition},
  publisher = {Addison-Wesley},
  year      = {1997},
  url       = {https://www.worldcat.org/oclc/312910844},
  isbn      = {0201896834},
  bibsource = {{dblp computer science bibliography}, https://dblp.org}
}"#;
        let bib = parse(src)?;
        assert_eq!(bib.ids().collect::<Vec<_>>(), vec!["DBLP:BOOKS/LIB/KNUTH97"]);
        assert_eq!(field(&bib, "DBLP:books/lib/Knuth97", "year").as_deref(), Some("1997"));
        assert_eq!(
            field(&bib, "DBLP:books/lib/Knuth97", "bibsource").as_deref(),
            Some("{dblp computer science bibliography}, https://dblp.org")
        );
        Ok(())
    }

    #[test]
    fn test_no_directives() -> Result<(), Box<dyn error::Error>> {
        assert!(parse("")?.is_empty());
        assert!(parse("  \n % only a comment")?.is_empty());
        assert!(parse("just some text {with braces}")?.is_empty());
        Ok(())
    }

    #[test]
    fn test_string_variable() -> Result<(), Box<dyn error::Error>> {
        let bib = parse(
            r#"@STRING{usenix = "USENIX Association"}
               @misc{k, publisher = USENIX, note = "Published by " # Usenix}"#,
        )?;
        assert_eq!(field(&bib, "k", "publisher").as_deref(), Some("USENIX Association"));
        assert_eq!(
            field(&bib, "k", "note").as_deref(),
            Some("Published by USENIX Association")
        );
        assert_eq!(bib.string("usenix"), Some("USENIX Association"));
        Ok(())
    }

    #[test]
    fn test_month_shadowed() -> Result<(), Box<dyn error::Error>> {
        let bib = parse("@misc{a, month = jan}")?;
        assert_eq!(field(&bib, "a", "month").as_deref(), Some("January"));

        let bib = parse("@string{jan = {Jan.}} @misc{a, month = jan}")?;
        assert_eq!(field(&bib, "a", "month").as_deref(), Some("Jan."));
        Ok(())
    }

    #[test]
    fn test_sessions_do_not_share_strings() -> Result<(), Box<dyn error::Error>> {
        let bib = parse(r#"@string{x = "v"} @misc{a, f = x}"#)?;
        assert_eq!(field(&bib, "a", "f").as_deref(), Some("v"));
        let err = parse("@misc{a, f = x}").unwrap_err();
        assert_eq!(err.kind, ParsingErrorKind::ValueExpected("X".to_string()));
        Ok(())
    }

    #[test]
    fn test_nested_braces() -> Result<(), Box<dyn error::Error>> {
        let bib = parse("@misc{k, a = {{a}b}, b = {x\\}y}}")?;
        assert_eq!(field(&bib, "k", "a").as_deref(), Some("{a}b"));
        assert_eq!(field(&bib, "k", "b").as_deref(), Some("x\\}y"));
        Ok(())
    }

    #[test]
    fn test_quoted() -> Result<(), Box<dyn error::Error>> {
        let bib = parse(r#"@misc{k, a = "say \"hi\" {now}", b = ""}"#)?;
        assert_eq!(field(&bib, "k", "a").as_deref(), Some(r#"say \"hi\" {now}"#));
        assert_eq!(field(&bib, "k", "b").as_deref(), Some(""));
        Ok(())
    }

    #[test]
    fn test_leading_whitespace_skipped() -> Result<(), Box<dyn error::Error>> {
        let bib = parse("@misc{k, a = {  x }, b = \"\n y \"}")?;
        assert_eq!(field(&bib, "k", "a").as_deref(), Some("x "));
        assert_eq!(field(&bib, "k", "b").as_deref(), Some("y "));
        Ok(())
    }

    #[test]
    fn test_concatenation() -> Result<(), Box<dyn error::Error>> {
        let bib = parse(r#"@misc{k, a = "a" # "b", b = {a} # "b" # 1999}"#)?;
        assert_eq!(field(&bib, "k", "a").as_deref(), Some("ab"));
        assert_eq!(field(&bib, "k", "b").as_deref(), Some("ab1999"));
        Ok(())
    }

    #[test]
    fn test_trailing_comma() -> Result<(), Box<dyn error::Error>> {
        let bib = parse("@misc{k, a={1},}")?;
        let entry = bib.get("k").unwrap();
        assert_eq!(entry.fields.len(), 1);
        assert_eq!(entry.get("A"), Some("1"));
        Ok(())
    }

    #[test]
    fn test_duplicates() -> Result<(), Box<dyn error::Error>> {
        let bib = parse("@misc{k, a={1}, a={2}}")?;
        assert_eq!(field(&bib, "k", "a").as_deref(), Some("2"));

        let bib = parse("@misc{k, a={1}, b={2}} @article{K, c={3}}")?;
        let entry = bib.get("k").unwrap();
        assert_eq!(entry.keys().collect::<Vec<_>>(), vec!["C"]);
        assert_eq!(bib.len(), 1);
        Ok(())
    }

    #[test]
    fn test_every_field_filed() -> Result<(), Box<dyn error::Error>> {
        let bib = parse("@misc{k, a={1}, b=\"2\", c=3,} @misc{j, d={4}}")?;
        let mut keys: Vec<&str> = bib.get("k").unwrap().keys().collect();
        keys.sort_unstable();
        assert_eq!(keys, vec!["A", "B", "C"]);
        assert_eq!(bib.get("j").unwrap().keys().collect::<Vec<_>>(), vec!["D"]);
        Ok(())
    }

    #[test]
    fn test_preamble_and_comment() -> Result<(), Box<dyn error::Error>> {
        let src = r#"@PREAMBLE{"\newcommand{\noop}[1]{}"}
@comment{this is {not} interpreted}
% a line comment
@misc{k, % between tokens
  a % here too
  = {1}}"#;
        let bib = parse(src)?;
        assert_eq!(bib.len(), 1);
        assert_eq!(field(&bib, "k", "a").as_deref(), Some("1"));
        Ok(())
    }

    #[test]
    fn test_unterminated_braces() {
        let err = parse("@misc{k, a={1").unwrap_err();
        assert_eq!(
            err.kind,
            ParsingErrorKind::UnterminatedValue {
                partial: "1".to_string()
            }
        );
        assert_eq!(err.offset, 11);
        assert_eq!(err.entry.as_deref(), Some("K"));
    }

    #[test]
    fn test_unterminated_quotes() {
        let err = parse("@misc{k, a=\"abc").unwrap_err();
        assert_eq!(
            err.kind,
            ParsingErrorKind::UnterminatedValue {
                partial: "abc".to_string()
            }
        );
    }

    #[test]
    fn test_value_expected() {
        let err = parse("@misc{k, a = unknown}").unwrap_err();
        assert_eq!(err.kind, ParsingErrorKind::ValueExpected("UNKNOWN".to_string()));
        assert_eq!(err.snippet, "unknown}");
    }

    #[test]
    fn test_equals_missing() {
        let err = parse("@misc{k, a {1}}").unwrap_err();
        assert_eq!(err.kind, ParsingErrorKind::EqualsSignMissing);
        let err = parse("@misc{k,}").unwrap_err();
        assert_eq!(err.kind, ParsingErrorKind::EqualsSignMissing);
    }

    #[test]
    fn test_token_mismatch() {
        let err = parse("@misc{k a={1}}").unwrap_err();
        assert_eq!(err.kind, ParsingErrorKind::TokenMismatch { expected: "," });
        let err = parse("@misc(k, a={1})").unwrap_err();
        assert_eq!(err.kind, ParsingErrorKind::TokenMismatch { expected: "{" });
        let err = parse("@misc{k, a={1} b={2}}").unwrap_err();
        assert_eq!(err.kind, ParsingErrorKind::TokenMismatch { expected: "}" });
    }

    #[test]
    fn test_runaway_key() {
        let err = parse("@misc{k, a={1}, ").unwrap_err();
        assert_eq!(err.kind, ParsingErrorKind::RunawayKey);
        let err = parse("@misc").unwrap_err();
        assert_eq!(err.kind, ParsingErrorKind::RunawayKey);
    }

    #[test]
    fn test_directive_keyword() {
        assert_eq!(Directive::from_keyword("String".into()), Directive::String);
        assert_eq!(Directive::from_keyword("PREAMBLE".into()), Directive::Preamble);
        assert_eq!(Directive::from_keyword("comment".into()), Directive::Comment);
        assert_eq!(
            Directive::from_keyword("INPROCEEDINGS".into()),
            Directive::Entry("INPROCEEDINGS".into())
        );
    }
}
