#![cfg_attr(not(test), no_std)]

/*!
Low-level implementation of token handling. Takes care of distinctions
between options and positionals, inline `=value` splitting, and the `--`
switch. No type handling or schema lookup happens here.

Unlike a streaming parser, the [`Cursor`] never decides on its own whether an
option takes a value: the resolution engine knows each option's cardinality,
so it asks the cursor for exactly the values it wants with
[`take_value`][Cursor::take_value] and [`take_run`][Cursor::take_run].
*/

mod token;

pub use token::{OptionToken, Token, is_flag};

const TERMINATOR: &str = "--";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Ready,
    PositionalOnly,
}

/**
A `Cursor` walks a borrowed list of tokens, by index. The `'t` lifetime
refers to the borrowed command-line data; every string the cursor hands out
borrows from it.

The cursor never skips the program name; callers pass the tokens after it.
*/
#[derive(Debug, Clone)]
pub struct Cursor<'t, S> {
    tokens: &'t [S],
    position: usize,
    state: State,
}

impl<'t, S> Cursor<'t, S>
where
    S: AsRef<str>,
{
    #[inline]
    #[must_use]
    pub fn new(tokens: &'t [S]) -> Self {
        Self {
            tokens,
            position: 0,
            state: State::Ready,
        }
    }

    /// True once a `--` has been consumed. Everything after that point is
    /// a positional, even if it looks like an option.
    #[inline]
    pub fn is_positional_only(&self) -> bool {
        self.state == State::PositionalOnly
    }

    /// The tokens that haven't been consumed yet.
    #[inline]
    pub fn rest(&self) -> &'t [S] {
        self.tokens.get(self.position..).unwrap_or(&[])
    }

    #[inline]
    fn peek(&self) -> Option<&'t str> {
        self.tokens.get(self.position).map(|token| token.as_ref())
    }

    #[inline]
    fn advance(&mut self) -> Option<&'t str> {
        let token = self.peek()?;
        self.position += 1;
        Some(token)
    }

    /// Get the next token. A `--` is consumed silently (the first time) and
    /// switches the cursor into positional-only mode.
    pub fn next_token(&mut self) -> Option<Token<'t>> {
        loop {
            let token = self.advance()?;

            match self.state {
                State::PositionalOnly => return Some(Token::Positional(token)),
                State::Ready if token == TERMINATOR => self.state = State::PositionalOnly,
                State::Ready if is_flag(token) => {
                    return Some(Token::Option(OptionToken::split(token)));
                }
                State::Ready => return Some(Token::Positional(token)),
            }
        }
    }

    /**
    Get the single value for an option that needs one. Returns [`None`] if
    the tokens are exhausted, if the next token is `--` (which is consumed
    and switches to positional-only mode, but is never a value), or if the
    next token looks like an option and `accept_flag_like` rejects it. The
    engine uses `accept_flag_like` to let negative numbers through.
    */
    pub fn take_value(&mut self, accept_flag_like: impl FnOnce(&str) -> bool) -> Option<&'t str> {
        let token = self.peek()?;

        if self.state == State::Ready {
            if token == TERMINATOR {
                self.position += 1;
                self.state = State::PositionalOnly;
                return None;
            }

            if is_flag(token) && !accept_flag_like(token) {
                return None;
            }
        }

        self.advance()
    }

    /**
    Consume the run of values following a greedy option: every token up to
    (but excluding) the next option, the next `--`, or the end of input.
    */
    pub fn take_run(&mut self) -> Run<'_, 't, S> {
        Run { cursor: self }
    }
}

/// Iterator returned by [`Cursor::take_run`]. Tokens are consumed as the
/// iterator is advanced.
#[derive(Debug)]
pub struct Run<'a, 't, S> {
    cursor: &'a mut Cursor<'t, S>,
}

impl<'t, S> Iterator for Run<'_, 't, S>
where
    S: AsRef<str>,
{
    type Item = &'t str;

    fn next(&mut self) -> Option<&'t str> {
        let token = self.cursor.peek()?;

        match self.cursor.state {
            State::Ready if token == TERMINATOR || is_flag(token) => None,
            _ => self.cursor.advance(),
        }
    }
}
