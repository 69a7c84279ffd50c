use std::fmt;
use std::str::FromStr;

/// Comparison operators accepted in the middle slot of a test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    StrictEq,    // ===
    StrictNotEq, // !==
    LooseEq,     // ==
    LooseNotEq,  // !=
    Gt,          // >
    Lt,          // <
    GtEq,        // >=
    LtEq,        // <=
}

impl Operator {
    pub fn symbol(self) -> &'static str {
        match self {
            Operator::StrictEq => "===",
            Operator::StrictNotEq => "!==",
            Operator::LooseEq => "==",
            Operator::LooseNotEq => "!=",
            Operator::Gt => ">",
            Operator::Lt => "<",
            Operator::GtEq => ">=",
            Operator::LtEq => "<=",
        }
    }
}

impl FromStr for Operator {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "===" => Ok(Operator::StrictEq),
            "!==" => Ok(Operator::StrictNotEq),
            "==" => Ok(Operator::LooseEq),
            "!=" => Ok(Operator::LooseNotEq),
            ">" => Ok(Operator::Gt),
            "<" => Ok(Operator::Lt),
            ">=" => Ok(Operator::GtEq),
            "<=" => Ok(Operator::LtEq),
            _ => Err(()),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Splits a test expression into whitespace separated words.
///
/// There is no quoting: `name == 'John Smith'` is four words.
#[derive(Clone)]
pub struct Tokenizer<'a> {
    input: &'a str,
    cursor: usize,
}

impl<'a> Tokenizer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self { input, cursor: 0 }
    }

    fn remaining(&self) -> &'a str {
        &self.input[self.cursor..]
    }

    fn advance(&mut self, n: usize) {
        self.cursor += n;
    }

    pub fn next_word(&mut self) -> Option<&'a str> {
        let rest = self.remaining();
        let trimmed = rest.trim_start();
        self.advance(rest.len() - trimmed.len());

        if trimmed.is_empty() {
            return None;
        }

        let len = trimmed
            .find(char::is_whitespace)
            .unwrap_or(trimmed.len());
        self.advance(len);
        Some(&trimmed[..len])
    }
}

impl<'a> Iterator for Tokenizer<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_word()
    }
}
