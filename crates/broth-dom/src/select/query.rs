//! A small query-string front end.
//!
//! Understands comma groups of compound selectors joined by descendant
//! (whitespace) and child (`>`) combinators. A compound selector is an
//! optional tag name or `*`, then any number of `#id`, `.class` and
//! attribute tests: `[key]`, `[key=v]`, `[key!=v]`, `[key^=v]`, `[key$=v]`,
//! `[key*=v]`, `[key~=regex]`. Values may be quoted.
//!
//! The result is an [`Evaluator`]; matching lives there.

use crate::error::{DomError, DomResult};

use super::evaluator::Evaluator;

/// Parse a query into an evaluator.
pub(crate) fn parse(query: &str) -> DomResult<Evaluator> {
    let mut parser = QueryParser {
        query,
        chars: query.char_indices().collect(),
        pos: 0,
    };
    let evaluator = parser.group()?;
    tracing::trace!(query, ?evaluator, "parsed query");
    Ok(evaluator)
}

struct QueryParser<'a> {
    query: &'a str,
    chars: Vec<(usize, char)>,
    pos: usize,
}

impl QueryParser<'_> {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).map(|&(_, c)| c)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn skip_whitespace(&mut self) -> bool {
        let start = self.pos;
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
        self.pos > start
    }

    fn error(&self, message: &str) -> DomError {
        let offset = self
            .chars
            .get(self.pos)
            .map_or(self.query.len(), |&(offset, _)| offset);
        DomError::invalid(format!(
            "could not parse query '{}': {message} at offset {offset}",
            self.query
        ))
    }

    fn group(&mut self) -> DomResult<Evaluator> {
        let mut alternatives = vec![self.selector()?];
        while self.eat(',') {
            alternatives.push(self.selector()?);
        }
        if self.peek().is_some() {
            return Err(self.error("unexpected character"));
        }
        Ok(if alternatives.len() == 1 {
            alternatives.swap_remove(0)
        } else {
            Evaluator::Or(alternatives)
        })
    }

    fn selector(&mut self) -> DomResult<Evaluator> {
        let _ = self.skip_whitespace();
        let mut current = self.compound()?;
        loop {
            let had_space = self.skip_whitespace();
            let combinator = if self.eat('>') {
                let _ = self.skip_whitespace();
                Some(true)
            } else if had_space && !matches!(self.peek(), None | Some(',')) {
                Some(false)
            } else {
                None
            };
            let Some(child) = combinator else {
                return Ok(current);
            };
            let next = self.compound()?;
            let structural = if child {
                Evaluator::Parent(Box::new(current))
            } else {
                Evaluator::Ancestor(Box::new(current))
            };
            current = Evaluator::And(vec![next, structural]);
        }
    }

    fn compound(&mut self) -> DomResult<Evaluator> {
        let mut parts = Vec::new();
        if self.eat('*') {
            parts.push(Evaluator::AllElements);
        } else if self.peek().is_some_and(is_ident_char) {
            parts.push(Evaluator::tag(&self.ident())?);
        }
        loop {
            match self.peek() {
                Some('#') => {
                    self.pos += 1;
                    parts.push(Evaluator::id(&self.required_ident("id")?)?);
                }
                Some('.') => {
                    self.pos += 1;
                    parts.push(Evaluator::class(&self.required_ident("class name")?)?);
                }
                Some('[') => {
                    self.pos += 1;
                    parts.push(self.attribute()?);
                }
                _ => break,
            }
        }
        match parts.len() {
            0 => Err(self.error("expected a selector")),
            1 => Ok(parts.swap_remove(0)),
            _ => Ok(Evaluator::And(parts)),
        }
    }

    fn ident(&mut self) -> String {
        let mut ident = String::new();
        while let Some(c) = self.peek().filter(|&c| is_ident_char(c)) {
            ident.push(c);
            self.pos += 1;
        }
        ident
    }

    fn required_ident(&mut self, what: &str) -> DomResult<String> {
        let ident = self.ident();
        if ident.is_empty() {
            return Err(self.error(&format!("expected {what}")));
        }
        Ok(ident)
    }

    fn attribute(&mut self) -> DomResult<Evaluator> {
        let _ = self.skip_whitespace();
        let key = self.required_ident("attribute key")?;
        let _ = self.skip_whitespace();
        if self.eat(']') {
            return Evaluator::attribute(&key);
        }

        let operator = match self.bump() {
            Some('=') => "=",
            Some(c @ ('!' | '^' | '$' | '*' | '~')) if self.eat('=') => match c {
                '!' => "!=",
                '^' => "^=",
                '$' => "$=",
                '*' => "*=",
                _ => "~=",
            },
            _ => return Err(self.error("expected an attribute operator")),
        };
        let _ = self.skip_whitespace();
        let value = self.attribute_value()?;
        let _ = self.skip_whitespace();
        if !self.eat(']') {
            return Err(self.error("expected ']'"));
        }

        match operator {
            "=" => Evaluator::attribute_value(&key, &value),
            "!=" => Evaluator::attribute_value_not(&key, &value),
            "^=" => Evaluator::attribute_value_starting(&key, &value),
            "$=" => Evaluator::attribute_value_ending(&key, &value),
            "*=" => Evaluator::attribute_value_containing(&key, &value),
            _ => Evaluator::attribute_value_matching(&key, &value),
        }
    }

    fn attribute_value(&mut self) -> DomResult<String> {
        let mut value = String::new();
        if let Some(quote @ ('"' | '\'')) = self.peek() {
            self.pos += 1;
            loop {
                match self.bump() {
                    Some(c) if c == quote => return Ok(value),
                    Some(c) => value.push(c),
                    None => return Err(self.error("unterminated quoted value")),
                }
            }
        }
        while let Some(c) = self.peek().filter(|&c| c != ']') {
            value.push(c);
            self.pos += 1;
        }
        Ok(value.trim_end().to_string())
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '-' | '_' | ':')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compound() {
        let evaluator = parse("a.link[href^=http]").unwrap();
        let Evaluator::And(parts) = evaluator else {
            panic!("expected a compound selector");
        };
        assert_eq!(parts.len(), 3);
        assert!(matches!(&parts[0], Evaluator::Tag(name) if name == "a"));
        assert!(matches!(&parts[1], Evaluator::Class(name) if name == "link"));
        assert!(matches!(
            &parts[2],
            Evaluator::AttributeWithValueStarting { key, value } if key == "href" && value == "http"
        ));
    }

    #[test]
    fn test_combinators_and_groups() {
        assert!(matches!(parse("div p").unwrap(), Evaluator::And(_)));
        assert!(matches!(parse("div > p").unwrap(), Evaluator::And(_)));
        assert!(matches!(parse("h1, h2 ,h3").unwrap(), Evaluator::Or(v) if v.len() == 3));
        assert!(matches!(parse("  p  ").unwrap(), Evaluator::Tag(_)));
    }

    #[test]
    fn test_quoted_value() {
        let evaluator = parse(r#"[title="a ] b"]"#).unwrap();
        assert!(matches!(
            evaluator,
            Evaluator::AttributeWithValue { ref value, .. } if value == "a ] b"
        ));
    }

    #[test]
    fn test_errors() {
        assert!(parse("").is_err());
        assert!(parse("div >").is_err());
        assert!(parse("[href").is_err());
        assert!(parse("p, ").is_err());
        assert!(matches!(parse("[a~=(]"), Err(DomError::Pattern { .. })));
    }
}
