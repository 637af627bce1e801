use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::{Delimiter, Directive};

/// Characters that may follow a SQL*Plus directive on its line.
const SQL_PLUS_OPTIONAL_LINE_ENDING: &str = r"\s*;?\s*(--.*)?$";

fn directive_regex(body: &str) -> Regex {
    Regex::new(&format!("^{}{}", body, SQL_PLUS_OPTIONAL_LINE_ENDING))
        .unwrap_or_else(|err| panic!("invalid directive pattern {body}: {err}"))
}

fn prefix_regex(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|err| panic!("invalid pattern {pattern}: {err}"))
}

static CONTINUE_ON_ERROR_REGEX: Lazy<Regex> = Lazy::new(|| {
    directive_regex(r"WHENEVER\s+SQLERROR\s+CONTINUE(\s+(NONE|COMMIT|ROLLBACK))?")
});
static EXIT_ON_ERROR_REGEX: Lazy<Regex> = Lazy::new(|| {
    directive_regex(
        r"WHENEVER\s+SQLERROR\s+EXIT(\s+(FAILURE|SUCCESS|WARNING|SQL\.SQLCODE|\d+))?(\s+(COMMIT|ROLLBACK))?",
    )
});
static SERVER_OUTPUT_ON_REGEX: Lazy<Regex> = Lazy::new(|| {
    directive_regex(
        r"SET\s+SERVEROUT(PUT)?\s+ON(\s+SIZE\s+(\d+|UNL(IMITED)?))?(\s+FOR(MAT)?\s+(WRA(PPED)?|WOR(D_WRAPPED)?|TRU(NCATED)?))?",
    )
});
static SERVER_OUTPUT_OFF_REGEX: Lazy<Regex> =
    Lazy::new(|| directive_regex(r"SET\s+SERVEROUT(PUT)?\s+OFF"));

static DISCARDABLE_SQL_PLUS_REGEXES: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"^SET\s+(DEFINE|ECHO|TIMING|SQLBL(ANKLINES)?)\s+(ON|OFF)",
        r"^COLUMN\s+SPOOLFILE",
        r"^SPOOL\s+(OFF|&V_SPOOLFILE)",
    ]
    .iter()
    .map(|pattern| prefix_regex(pattern))
    .collect()
});

static DECLARE_BEGIN_REGEX: Lazy<Regex> = Lazy::new(|| prefix_regex(r"^(DECLARE|BEGIN)(\s.*)?$"));
static PLSQL_REGEX: Lazy<Regex> = Lazy::new(|| {
    prefix_regex(
        r"^CREATE(\s+OR\s+REPLACE)?(\s+(NON)?EDITIONABLE)?\s+(FUNCTION|PROCEDURE|PACKAGE|TYPE|TRIGGER)",
    )
});
static JAVA_REGEX: Lazy<Regex> = Lazy::new(|| {
    prefix_regex(
        r"^CREATE(\s+OR\s+REPLACE)?(\s+AND\s+(RESOLVE|COMPILE))?(\s+NOFORCE)?\s+JAVA\s+(SOURCE|RESOURCE|CLASS)",
    )
});

/// Keywords that can appear before a string literal without a separating space.
static KEYWORDS_BEFORE_STRING_LITERAL_REGEX: Lazy<Regex> =
    Lazy::new(|| prefix_regex(r"^(N|DATE|IF|ELSIF|SELECT|IMMEDIATE|RETURN|IS)('.*)$"));
/// Keywords that can appear after a string literal without a separating space.
static KEYWORDS_AFTER_STRING_LITERAL_REGEX: Lazy<Regex> =
    Lazy::new(|| prefix_regex(r"^(.*')(USING|THEN|FROM|AND|OR|AS)$"));

static Q_QUOTE_PAREN_OPEN_REGEX: Lazy<Regex> = Lazy::new(|| prefix_regex(r"(?i)q'\("));

fn starts_with_ignore_case(text: &str, prefix: &str) -> bool {
    text.get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

/// An alternate-quote opener found at the start of a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlternateQuote {
    /// Byte length of the opener (`q'[`, `NQ'{`, `q'|`, ...).
    pub opener_len: usize,
    pub closer: String,
}

/// Dialect-specific rules consulted by the statement builder.
pub trait DialectRules: Sync {
    fn default_delimiter(&self) -> Delimiter {
        Delimiter::semicolon()
    }

    /// Rewrites quoting spellings into their canonical form. Must keep byte
    /// offsets unchanged, the builder cuts the raw line by them.
    fn normalize_line(&self, line: &str) -> String {
        line.to_string()
    }

    /// Normalizes a raw line for state tracking: escaped quotes removed,
    /// comment markers separated, whitespace collapsed, upper-cased.
    fn simplify_line(&self, line: &str) -> String {
        line.replace("''", "")
            .replace("--", " -- ")
            .split_whitespace()
            .collect::<Vec<&str>>()
            .join(" ")
            .to_uppercase()
    }

    /// Picks the delimiter for the rest of the statement.
    fn change_delimiter(
        &self,
        _line: &str,
        _statement_start: &str,
        current: Delimiter,
    ) -> Delimiter {
        current
    }

    fn clean_token<'a>(&self, token: &'a str) -> &'a str {
        token
    }

    /// Alternate-quote opener at the start of `text`, which is raw script
    /// text beginning at a token boundary.
    fn alternate_quote(&self, _text: &str) -> Option<AlternateQuote> {
        None
    }

    /// Client-side commands that never reach the database.
    fn is_discardable(&self, _statement_start: &str) -> bool {
        false
    }

    fn directive(&self, _statement_start: &str) -> Option<Directive> {
        None
    }
}

/// Plain `;`-terminated SQL.
pub struct GenericRules;

impl DialectRules for GenericRules {}

/// Oracle SQL plus PL/SQL blocks and the SQL*Plus client commands that
/// migration scripts commonly carry.
pub struct OracleRules;

impl OracleRules {
    fn closer_for(special: char) -> String {
        match special {
            '[' => "]'".to_string(),
            '(' => ")'".to_string(),
            '{' => "}'".to_string(),
            '<' => ">'".to_string(),
            other => format!("{}'", other),
        }
    }
}

impl DialectRules for OracleRules {
    fn normalize_line(&self, line: &str) -> String {
        Q_QUOTE_PAREN_OPEN_REGEX
            .replace_all(line, "q'[")
            .replace(")'", "]'")
    }

    fn change_delimiter(&self, line: &str, statement_start: &str, current: Delimiter) -> Delimiter {
        // A lone `/` also runs a plain SQL statement.
        if line == "/" || DECLARE_BEGIN_REGEX.is_match(line) {
            return Delimiter::slash();
        }

        if PLSQL_REGEX.is_match(statement_start) || JAVA_REGEX.is_match(statement_start) {
            return Delimiter::slash();
        }

        current
    }

    fn clean_token<'a>(&self, token: &'a str) -> &'a str {
        if token.len() >= 2 && token.starts_with('\'') && token.ends_with('\'') {
            return token;
        }

        let mut cleaned = token;
        if let Some(literal) = KEYWORDS_BEFORE_STRING_LITERAL_REGEX
            .captures(cleaned)
            .and_then(|caps| caps.get(2))
        {
            cleaned = &cleaned[literal.start()..];
        }
        if let Some(literal) = KEYWORDS_AFTER_STRING_LITERAL_REGEX
            .captures(cleaned)
            .and_then(|caps| caps.get(1))
        {
            cleaned = &cleaned[..literal.end()];
        }
        cleaned
    }

    fn alternate_quote(&self, text: &str) -> Option<AlternateQuote> {
        let prefix_len = if starts_with_ignore_case(text, "Q'") {
            2
        } else if starts_with_ignore_case(text, "NQ'") {
            3
        } else {
            return None;
        };

        let special = text[prefix_len..]
            .chars()
            .next()
            .filter(|c| !c.is_whitespace())?;
        Some(AlternateQuote {
            opener_len: prefix_len + special.len_utf8(),
            closer: Self::closer_for(special),
        })
    }

    fn is_discardable(&self, statement_start: &str) -> bool {
        statement_start == "/ "
            || DISCARDABLE_SQL_PLUS_REGEXES
                .iter()
                .any(|regex| regex.is_match(statement_start))
    }

    fn directive(&self, statement_start: &str) -> Option<Directive> {
        if CONTINUE_ON_ERROR_REGEX.is_match(statement_start) {
            Some(Directive::ExceptionPolicy {
                fail_on_exception: false,
            })
        } else if EXIT_ON_ERROR_REGEX.is_match(statement_start) {
            Some(Directive::ExceptionPolicy {
                fail_on_exception: true,
            })
        } else if SERVER_OUTPUT_ON_REGEX.is_match(statement_start) {
            Some(Directive::OutputEcho { enabled: true })
        } else if SERVER_OUTPUT_OFF_REGEX.is_match(statement_start) {
            Some(Directive::OutputEcho { enabled: false })
        } else {
            None
        }
    }
}

/// Statement dialect, chosen once per script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SqlDialect {
    Generic,
    #[default]
    Oracle,
}

impl SqlDialect {
    pub fn rules(&self) -> &'static dyn DialectRules {
        match self {
            SqlDialect::Generic => &GenericRules,
            SqlDialect::Oracle => &OracleRules,
        }
    }
}
