//! Per-message directives typed inline with a prompt, e.g.
//! `--advanced --context=40 what did we decide yesterday?`.
//!
//! Directives only affect the message they appear in and are never stored.

/// Number of history messages used when nothing overrides it.
pub const DEFAULT_CONTEXT_SIZE: usize = 20;
/// Upper bound for the context size; the platform returns at most this many
/// messages per history request.
pub const MAX_CONTEXT_SIZE: usize = 100;

const ADVANCED_TOKENS: [&str; 2] = ["--advanced", "-a"];
const CONTEXT_TOKENS: [&str; 2] = ["--context", "-c"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Directives {
    pub use_advanced_model: bool,
    /// Requested history size. Not clamped here; callers apply the ceiling.
    pub context_size: usize,
}

impl Default for Directives {
    fn default() -> Self {
        Self {
            use_advanced_model: false,
            context_size: DEFAULT_CONTEXT_SIZE,
        }
    }
}

fn parse_positive(value: &str) -> Option<usize> {
    value.parse::<usize>().ok().filter(|n| *n > 0)
}

fn is_advanced(token: &str) -> bool {
    ADVANCED_TOKENS
        .iter()
        .any(|t| t.eq_ignore_ascii_case(token))
}

fn is_context(token: &str) -> bool {
    CONTEXT_TOKENS.iter().any(|t| t.eq_ignore_ascii_case(token))
}

/// Splits `--context=5` style tokens into the flag part and the inline value.
fn inline_context_value(token: &str) -> Option<&str> {
    let (flag, value) = token.split_once('=')?;
    is_context(flag).then_some(value)
}

/// Extracts directives from `text` and returns them with the remaining words
/// joined by single spaces.
///
/// A bare `--context` takes the following word as its value. When that word
/// is not a positive integer both are left in the text untouched. Unknown
/// dash-prefixed words are kept verbatim.
pub fn parse_directives(text: &str) -> (Directives, String) {
    parse_directives_with(text, Directives::default())
}

/// Like [`parse_directives`], starting from `defaults` instead of the
/// built-in defaults.
pub fn parse_directives_with(text: &str, defaults: Directives) -> (Directives, String) {
    let mut directives = defaults;
    let mut residual: Vec<&str> = Vec::new();
    let mut tokens = text.split_whitespace().peekable();

    while let Some(token) = tokens.next() {
        if is_advanced(token) {
            directives.use_advanced_model = true;
            continue;
        }

        if let Some(value) = inline_context_value(token) {
            match parse_positive(value) {
                Some(size) => directives.context_size = size,
                None => tracing::debug!("Ignoring invalid context directive `{}`", token),
            }
            continue;
        }

        if is_context(token) {
            match tokens.peek().and_then(|next| parse_positive(next)) {
                Some(size) => {
                    directives.context_size = size;
                    tokens.next();
                }
                None => residual.push(token),
            }
            continue;
        }

        residual.push(token);
    }

    (directives, residual.join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inline_value_is_extracted() {
        let (directives, rest) = parse_directives("--context=5 hello world");
        assert_eq!(directives.context_size, 5);
        assert!(!directives.use_advanced_model);
        assert_eq!(rest, "hello world");
    }

    #[test]
    fn lookahead_value_is_extracted() {
        let (directives, rest) = parse_directives("--context 5 hello");
        assert_eq!(directives.context_size, 5);
        assert_eq!(rest, "hello");

        let (directives, rest) = parse_directives("hello -c 7 there");
        assert_eq!(directives.context_size, 7);
        assert_eq!(rest, "hello there");
    }

    #[test]
    fn failed_lookahead_preserves_both_tokens() {
        let (directives, rest) = parse_directives("--context abc hello");
        assert_eq!(directives, Directives::default());
        assert_eq!(rest, "--context abc hello");

        let (directives, rest) = parse_directives("what is -c");
        assert_eq!(directives, Directives::default());
        assert_eq!(rest, "what is -c");
    }

    #[test]
    fn invalid_inline_value_is_dropped_silently() {
        let (directives, rest) = parse_directives("-c=0 hi --context=-3 --context=x");
        assert_eq!(directives.context_size, DEFAULT_CONTEXT_SIZE);
        assert_eq!(rest, "hi");
    }

    #[test]
    fn advanced_toggle_in_either_spelling() {
        let (directives, rest) = parse_directives("-a explain monads");
        assert!(directives.use_advanced_model);
        assert_eq!(rest, "explain monads");

        let (directives, rest) = parse_directives("explain --advanced monads");
        assert!(directives.use_advanced_model);
        assert_eq!(rest, "explain monads");
    }

    #[test]
    fn unknown_flags_and_spacing() {
        let (directives, rest) = parse_directives("  --verbose   hi\n\tthere -x=1 ");
        assert_eq!(directives, Directives::default());
        assert_eq!(rest, "--verbose hi there -x=1");
    }

    #[test]
    fn configured_defaults_are_kept_when_absent() {
        let defaults = Directives {
            use_advanced_model: false,
            context_size: 8,
        };
        let (directives, rest) = parse_directives_with("--context nope", defaults);
        assert_eq!(directives.context_size, 8);
        assert_eq!(rest, "--context nope");
    }

    #[test]
    fn later_context_wins_and_ceiling_is_not_applied() {
        let (directives, rest) = parse_directives("-c 3 --context=250 -a go");
        assert_eq!(directives.context_size, 250);
        assert!(directives.use_advanced_model);
        assert_eq!(rest, "go");
    }
}
