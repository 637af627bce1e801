use super::dialect::DialectRules;
use super::{Delimiter, Directive, ExecutionPolicy, Statement};

/// The statement start stops growing once it holds this many separators.
const STATEMENT_START_MAX_SPACES: usize = 8;

/// Characters that split a line into tokens besides whitespace.
const TOKEN_SEPARATORS: &[char] = &['@', ';', ':', '=', '|', '(', ')', ',', '+'];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
enum QuoteState {
    #[default]
    None,
    Standard,
    Alternate {
        closer: String,
    },
}

/// Accumulates script lines until they form one complete statement.
pub struct StatementBuilder {
    rules: &'static dyn DialectRules,
    statement: String,
    line_number: usize,
    empty: bool,
    terminated: bool,
    quote: QuoteState,
    in_block_comment: bool,
    /// Whether anything besides comments and whitespace has been seen.
    non_comment_part_seen: bool,
    delimiter: Delimiter,
    /// First few normalized tokens, used only for keyword matching.
    statement_start: String,
}

impl StatementBuilder {
    pub fn new(rules: &'static dyn DialectRules) -> Self {
        Self {
            rules,
            statement: String::new(),
            line_number: 0,
            empty: true,
            terminated: false,
            quote: QuoteState::None,
            in_block_comment: false,
            non_comment_part_seen: false,
            delimiter: rules.default_delimiter(),
            statement_start: String::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.empty
    }

    pub fn set_line_number(&mut self, line_number: usize) {
        self.line_number = line_number;
    }

    pub fn line_number(&self) -> usize {
        self.line_number
    }

    pub fn text(&self) -> &str {
        &self.statement
    }

    pub fn delimiter(&self) -> &Delimiter {
        &self.delimiter
    }

    fn in_quote(&self) -> bool {
        self.quote != QuoteState::None
    }

    pub fn add_line(&mut self, line: &str) {
        if self.empty {
            self.empty = false;
        } else {
            self.statement.push('\n');
        }

        let normalized = self.rules.normalize_line(line);
        let comment_at = self.scan_tokens(&normalized);
        let code_end = comment_at.unwrap_or(normalized.len());
        let code = self.rules.simplify_line(&normalized[..code_end]);
        self.extend_statement_start(&code);

        let line_start = self.statement.len();
        self.statement.push_str(line);

        if self.in_quote() || self.in_block_comment {
            return;
        }

        self.delimiter =
            self.rules
                .change_delimiter(&code, &self.statement_start, self.delimiter.clone());

        if self.line_terminates(&code) {
            self.statement.truncate(line_start + code_end);
            self.strip_delimiter();
            self.terminated = true;
        }
    }

    fn extend_statement_start(&mut self, simplified: &str) {
        if self.statement_start.matches(' ').count() >= STATEMENT_START_MAX_SPACES {
            return;
        }
        let mut start = self.statement_start.clone();
        start.push_str(simplified);
        let mut collapsed = start.split_whitespace().collect::<Vec<&str>>().join(" ");
        collapsed.push(' ');
        self.statement_start = collapsed;
    }

    /// Feeds every token of the line through the quote and comment state.
    /// Alternate-quote literals are matched on raw characters, since their
    /// delimiter may be any character. Returns the byte offset of a trailing
    /// `--` comment, if any.
    fn scan_tokens(&mut self, line: &str) -> Option<usize> {
        let mut token_start: Option<usize> = None;
        let mut idx = 0;

        while idx < line.len() {
            let rest = &line[idx..];

            if let QuoteState::Alternate { closer } = &self.quote {
                let closer_len = closer.len();
                match rest.find(closer.as_str()) {
                    Some(pos) => {
                        self.quote = QuoteState::None;
                        idx += pos + closer_len;
                        continue;
                    }
                    None => return None,
                }
            }

            let Some(c) = rest.chars().next() else {
                break;
            };

            if rest.starts_with("--") {
                if let Some(start) = token_start.take() {
                    self.apply_token(&line[start..idx]);
                }
                if !self.in_quote() && !self.in_block_comment {
                    return Some(idx);
                }
                idx += 2;
                continue;
            }

            if c.is_whitespace() || TOKEN_SEPARATORS.contains(&c) {
                if let Some(start) = token_start.take() {
                    self.apply_token(&line[start..idx]);
                }
                idx += c.len_utf8();
                continue;
            }

            if token_start.is_none() {
                if !self.in_quote() && !self.in_block_comment {
                    if let Some(alternate) = self.rules.alternate_quote(rest) {
                        self.non_comment_part_seen = true;
                        self.quote = QuoteState::Alternate {
                            closer: alternate.closer,
                        };
                        idx += alternate.opener_len;
                        continue;
                    }
                }
                token_start = Some(idx);
            }
            idx += c.len_utf8();
        }

        if let Some(start) = token_start {
            self.apply_token(&line[start..]);
        }
        None
    }

    fn apply_token(&mut self, raw: &str) {
        let upper = raw.replace("''", "").to_uppercase();
        if upper.is_empty() {
            return;
        }
        let token = self.rules.clean_token(&upper);

        if self.in_block_comment {
            if token.ends_with("*/") {
                self.in_block_comment = false;
            }
            return;
        }

        if self.quote == QuoteState::Standard {
            if has_odd_quotes(token) {
                self.quote = QuoteState::None;
            }
            return;
        }

        if token.starts_with("/*") {
            if !(token.len() >= 4 && token.ends_with("*/")) {
                self.in_block_comment = true;
            }
            return;
        }

        self.non_comment_part_seen = true;
        if has_odd_quotes(token) {
            self.quote = QuoteState::Standard;
        }
    }

    fn line_terminates(&self, code: &str) -> bool {
        let symbol = self.delimiter.symbol.to_uppercase();
        if self.delimiter.alone_on_line {
            code == symbol
        } else {
            code.ends_with(&symbol)
        }
    }

    fn strip_delimiter(&mut self) {
        let trimmed_len = self.statement.trim_end().len();
        let symbol_len = self.delimiter.symbol.len();
        let cut = trimmed_len.saturating_sub(symbol_len);
        if self.statement.is_char_boundary(cut) {
            self.statement.truncate(cut);
        }
        let trimmed_len = self.statement.trim_end().len();
        self.statement.truncate(trimmed_len);
    }

    pub fn directive(&self) -> Option<Directive> {
        self.rules.directive(&self.statement_start)
    }

    /// The active delimiter was seen outside quotes, or the statement is a
    /// directive (which needs no delimiter).
    pub fn is_terminated(&self) -> bool {
        self.terminated || self.directive().is_some()
    }

    /// Comment-only fragments and client-side commands the database never sees.
    pub fn can_discard(&self) -> bool {
        if self.in_quote() || self.in_block_comment {
            return false;
        }
        !self.non_comment_part_seen || self.rules.is_discardable(&self.statement_start)
    }

    pub fn is_incomplete(&self) -> bool {
        self.incomplete_reason().is_some()
    }

    /// Reports why the statement could not be completed at end of input.
    pub fn incomplete_reason(&self) -> Option<&'static str> {
        match self.quote {
            QuoteState::Standard => return Some("unterminated string literal"),
            QuoteState::Alternate { .. } => return Some("unterminated alternate-quote literal"),
            QuoteState::None => {}
        }
        if self.in_block_comment {
            return Some("unterminated block comment");
        }
        if self.delimiter.alone_on_line && !self.terminated {
            return Some("block is missing its closing delimiter");
        }
        None
    }

    pub fn to_statement(&self, policy: ExecutionPolicy) -> Statement {
        Statement::new(self.line_number, self.statement.trim(), policy)
    }
}

fn has_odd_quotes(token: &str) -> bool {
    token.matches('\'').count() % 2 == 1
}
