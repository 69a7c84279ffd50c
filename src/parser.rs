use crate::error::Anomaly;
use crate::lexer::{Operator, Tokenizer};
use crate::value::parse_number;

/// Right-hand side of a test after the literal table has been applied.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Null,
    Undefined,
    Number(f64),
    Path(String),
}

impl Operand {
    /// `null`, `undefined` and numeric words are literals; any other word is
    /// a dotted path into the parameter bag.
    pub fn from_word(word: &str) -> Self {
        match word {
            "null" => Operand::Null,
            "undefined" => Operand::Undefined,
            _ => {
                let n = parse_number(word);
                if n.is_nan() {
                    Operand::Path(word.to_string())
                } else {
                    Operand::Number(n)
                }
            }
        }
    }
}

/// A parsed `left operator right` test.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    /// Always a path, even when it looks like a literal.
    pub left: String,
    pub op: Operator,
    pub right: Operand,
}

impl Condition {
    pub fn parse(test: &str) -> Result<Self, Anomaly> {
        let words: Vec<&str> = Tokenizer::new(test).collect();
        let &[left, op, right] = words.as_slice() else {
            return Err(Anomaly::MalformedTest {
                test: test.to_string(),
                words: words.len(),
            });
        };

        let op = op.parse::<Operator>().map_err(|()| Anomaly::UnknownOperator {
            test: test.to_string(),
            operator: op.to_string(),
        })?;

        Ok(Condition {
            left: left.to_string(),
            op,
            right: Operand::from_word(right),
        })
    }
}
