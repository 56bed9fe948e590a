//! Streaming markup tokenizer.
//!
//! Splits raw markup into open tags, close tags and text runs. Only tag
//! names are interpreted; attributes are skipped. Comments, doctype and
//! processing instructions, and CDATA sections produce no tokens.

/// A single markup token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token<'a> {
    /// Opening tag with its lowercased name.
    Open { name: String, self_closing: bool },
    /// Closing tag with its lowercased name.
    Close { name: String },
    /// Raw text between tags (entities not decoded).
    Text(&'a str),
}

/// Iterator over the tokens of a markup string.
pub struct Tokenizer<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Tokenizer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    /// Emits text from the current position up to the next `<` after `skip` bytes.
    fn text_run(&mut self, skip: usize) -> Token<'a> {
        let rest = &self.input[self.pos..];
        let end = rest[skip..].find('<').map_or(rest.len(), |i| i + skip);
        self.pos += end;
        Token::Text(&rest[..end])
    }

    /// Skips past `terminator`, or to the end of input if it never appears.
    fn skip_past(&mut self, terminator: &str) {
        let rest = &self.input[self.pos..];
        self.pos += rest
            .find(terminator)
            .map_or(rest.len(), |i| i + terminator.len());
    }

    /// Reads a tag starting at the current `<`. `name_start` is the offset of
    /// the first name character.
    fn read_tag(&mut self, name_start: usize, closing: bool) -> Option<Token<'a>> {
        let rest = &self.input[self.pos..];
        let name_len = rest[name_start..]
            .find(|c: char| !is_name_char(c))
            .unwrap_or(rest.len() - name_start);
        let name = rest[name_start..name_start + name_len].to_ascii_lowercase();

        let end = find_tag_end(&rest[name_start + name_len..])? + name_start + name_len;
        let self_closing = !closing && rest[..end].trim_end().ends_with('/');
        self.pos += end + 1;

        Some(if closing {
            Token::Close { name }
        } else {
            Token::Open { name, self_closing }
        })
    }
}

impl<'a> Iterator for Tokenizer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let rest = &self.input[self.pos..];
            if rest.is_empty() {
                return None;
            }

            if !rest.starts_with('<') {
                return Some(self.text_run(0));
            }

            if rest.starts_with("<!--") {
                self.skip_past("-->");
                continue;
            }
            if rest.starts_with("<![CDATA[") {
                self.skip_past("]]>");
                continue;
            }
            if rest.starts_with("<!") || rest.starts_with("<?") {
                self.skip_past(">");
                continue;
            }

            let mut chars = rest[1..].chars();
            let (name_start, closing) = match (chars.next(), chars.next()) {
                (Some('/'), Some(c)) if c.is_ascii_alphabetic() => (2, true),
                (Some(c), _) if c.is_ascii_alphabetic() => (1, false),
                // A lone '<' is ordinary text.
                _ => return Some(self.text_run(1)),
            };

            match self.read_tag(name_start, closing) {
                Some(token) => return Some(token),
                None => {
                    // Unterminated tag: nothing after it can be structure.
                    self.pos = self.input.len();
                    return None;
                }
            }
        }
    }
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, ':' | '-' | '_' | '.')
}

/// Finds the closing `>` of a tag, skipping quoted attribute values.
fn find_tag_end(s: &str) -> Option<usize> {
    let mut quote: Option<char> = None;
    for (i, c) in s.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '>') => return Some(i),
            _ => {}
        }
    }
    None
}
