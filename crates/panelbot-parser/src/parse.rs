//! The order-command grammar.
//!
//! Three grammars are tried in order, accepting the first that yields a
//! recognized command token and at least one order id:
//!
//! 1. ids-then-command: `123,124 refill`
//! 2. command-then-ids: `refill 123 124`
//! 3. command + filler words: `status order 123` (skips "order", "id", ...)

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use panelbot_types::CommandKind;

use crate::aliases::{is_filler, lookup_command};

/// Hard cap on order ids in one message. Exceeding it rejects the whole
/// message rather than silently truncating.
pub const MAX_ORDER_IDS: usize = 100;

const MIN_ID_LEN: usize = 3;
const MAX_ID_LEN: usize = 50;

static DIGIT_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{3,}").expect("digit-run regex compiles"));

/// A successfully parsed order command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    pub kind: CommandKind,
    /// Deduplicated, first-seen order.
    pub order_ids: Vec<String>,
}

/// Malformed input. User-facing, never logged as an incident.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("message is empty")]
    Empty,

    #[error("no recognized command keyword (try: refill, cancel, speedup, status)")]
    NoCommand,

    #[error("no valid order ids found (ids are 3-50 letters/digits)")]
    NoOrderIds,

    #[error("too many order ids in one message: {count} (limit {MAX_ORDER_IDS})")]
    TooManyOrderIds { count: usize },
}

/// Cheap pre-filter: a recognized keyword AND a run of 3+ digits.
///
/// Callers use this to decide whether to invoke the full parser at all,
/// so ordinary chatter never pays the parse cost.
pub fn looks_like_command(text: &str) -> bool {
    if !DIGIT_RUN.is_match(text) {
        return false;
    }
    tokenize(text).iter().any(|t| lookup_command(t).is_some())
}

/// Parse a message into a command intent and order ids.
pub fn parse(text: &str) -> Result<ParsedCommand, ParseError> {
    let tokens = tokenize(text);
    if tokens.is_empty() {
        return Err(ParseError::Empty);
    }

    // Grammar 1: ids first, command last.
    if let Some(kind) = lookup_command(tokens[tokens.len() - 1]) {
        let ids: Vec<&str> = tokens[..tokens.len() - 1].to_vec();
        if !ids.is_empty() && ids.iter().all(|t| is_order_id(t)) {
            return finish(kind, &ids);
        }
    }

    // Grammar 2: command first, ids after.
    if let Some(kind) = lookup_command(tokens[0]) {
        let ids: Vec<&str> = tokens[1..].to_vec();
        if !ids.is_empty() && ids.iter().all(|t| is_order_id(t)) {
            return finish(kind, &ids);
        }
    }

    // Grammar 3: command anywhere, filler words skipped. Only tokens after
    // the command are considered, and a loose id must contain a digit so
    // ordinary words are not mistaken for order ids.
    let mut kind = None;
    let mut ids = Vec::new();
    for token in &tokens {
        if kind.is_none() {
            if let Some(k) = lookup_command(token) {
                kind = Some(k);
            }
            continue;
        }
        if is_filler(token) {
            continue;
        }
        if is_order_id(token) && token.chars().any(|c| c.is_ascii_digit()) {
            ids.push(*token);
        }
    }

    match kind {
        Some(kind) if !ids.is_empty() => finish(kind, &ids),
        Some(_) => Err(ParseError::NoOrderIds),
        None => Err(ParseError::NoCommand),
    }
}

/// Split on commas, whitespace, and newlines; drop empty fragments.
fn tokenize(text: &str) -> Vec<&str> {
    text.split(|c: char| c.is_whitespace() || c == ',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect()
}

/// An order-id token: alphanumeric, 3-50 chars.
fn is_order_id(token: &str) -> bool {
    token.len() >= MIN_ID_LEN
        && token.len() <= MAX_ID_LEN
        && token.chars().all(|c| c.is_ascii_alphanumeric())
        && !is_filler(token)
        && lookup_command(token).is_none()
}

/// Dedupe preserving first-seen order and enforce the cap.
fn finish(kind: CommandKind, raw_ids: &[&str]) -> Result<ParsedCommand, ParseError> {
    let mut order_ids: Vec<String> = Vec::new();
    for id in raw_ids {
        if !order_ids.iter().any(|seen| seen == id) {
            order_ids.push((*id).to_string());
        }
    }

    if order_ids.is_empty() {
        return Err(ParseError::NoOrderIds);
    }
    if order_ids.len() > MAX_ORDER_IDS {
        return Err(ParseError::TooManyOrderIds {
            count: order_ids.len(),
        });
    }

    Ok(ParsedCommand { kind, order_ids })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_then_command() {
        let parsed = parse("123,124 refill").unwrap();
        assert_eq!(parsed.kind, CommandKind::Refill);
        assert_eq!(parsed.order_ids, vec!["123", "124"]);
    }

    #[test]
    fn command_then_ids() {
        let parsed = parse("refill 123 124").unwrap();
        assert_eq!(parsed.kind, CommandKind::Refill);
        assert_eq!(parsed.order_ids, vec!["123", "124"]);
    }

    #[test]
    fn loose_grammar_skips_fillers() {
        let parsed = parse("status order 123").unwrap();
        assert_eq!(parsed.kind, CommandKind::Status);
        assert_eq!(parsed.order_ids, vec!["123"]);

        let parsed = parse("please check my order id 98765").unwrap();
        assert_eq!(parsed.kind, CommandKind::Status);
        assert_eq!(parsed.order_ids, vec!["98765"]);
    }

    #[test]
    fn newline_and_comma_separated_ids() {
        let parsed = parse("cancel 111\n222,333").unwrap();
        assert_eq!(parsed.kind, CommandKind::Cancel);
        assert_eq!(parsed.order_ids, vec!["111", "222", "333"]);
    }

    #[test]
    fn duplicates_collapse_first_seen() {
        let parsed = parse("refill 123,123,124").unwrap();
        assert_eq!(parsed.order_ids, vec!["123", "124"]);
    }

    #[test]
    fn parse_is_pure() {
        let a = parse("refill 123,124");
        let b = parse("refill 123,124");
        assert_eq!(a, b);
    }

    #[test]
    fn alphanumeric_ids_accepted() {
        let parsed = parse("status abc123").unwrap();
        assert_eq!(parsed.order_ids, vec!["abc123"]);
    }

    #[test]
    fn short_and_long_tokens_rejected_as_ids() {
        // "12" is below the minimum id length.
        assert_eq!(parse("refill 12"), Err(ParseError::NoOrderIds));

        let long = "a".repeat(51);
        assert_eq!(parse(&format!("refill {long}")), Err(ParseError::NoOrderIds));
    }

    #[test]
    fn over_one_hundred_ids_rejected_not_truncated() {
        let ids: Vec<String> = (1000..1101).map(|n| n.to_string()).collect();
        assert_eq!(ids.len(), 101);
        let text = format!("refill {}", ids.join(","));
        assert_eq!(parse(&text), Err(ParseError::TooManyOrderIds { count: 101 }));
    }

    #[test]
    fn exactly_one_hundred_ids_accepted() {
        let ids: Vec<String> = (1000..1100).map(|n| n.to_string()).collect();
        let text = format!("status {}", ids.join(" "));
        let parsed = parse(&text).unwrap();
        assert_eq!(parsed.order_ids.len(), 100);
    }

    #[test]
    fn empty_and_garbage_inputs() {
        assert_eq!(parse(""), Err(ParseError::Empty));
        assert_eq!(parse("   \n "), Err(ParseError::Empty));
        assert_eq!(parse("hello there"), Err(ParseError::NoCommand));
        assert_eq!(parse("refill"), Err(ParseError::NoOrderIds));
    }

    #[test]
    fn aliases_resolve() {
        assert_eq!(parse("isi 123").unwrap().kind, CommandKind::Refill);
        assert_eq!(parse("batal 123").unwrap().kind, CommandKind::Cancel);
        assert_eq!(parse("cek 123").unwrap().kind, CommandKind::Status);
        assert_eq!(parse("123 sp").unwrap().kind, CommandKind::SpeedUp);
    }

    #[test]
    fn looks_like_command_heuristic() {
        assert!(looks_like_command("refill 12345"));
        assert!(looks_like_command("can you cek order 98765?"));
        // Keyword without a 3-digit run.
        assert!(!looks_like_command("refill please"));
        // Digits without a keyword.
        assert!(!looks_like_command("my number is 12345"));
        assert!(!looks_like_command("good morning"));
    }
}
