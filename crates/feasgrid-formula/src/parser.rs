//! Formula parser
//!
//! A recursive descent parser for grid formulas with proper operator precedence.
//!
//! ```text
//! expression     ::= additive
//! additive       ::= multiplicative ( ("+" | "-") multiplicative )*
//! multiplicative ::= unary ( ("*" | "/") unary )*
//! unary          ::= ("-" | "+") unary | primary
//! primary        ::= NUMBER | "(" expression ")" | call | range | cellref
//! call           ::= NAME "(" [ expression ( "," expression )* ] ")"
//! range          ::= cellref ":" cellref
//! ```

use crate::ast::{BinaryOperator, FormulaExpr, UnaryOperator};
use crate::error::{FormulaError, FormulaResult};
use crate::functions::FunctionRegistry;
use feasgrid_core::{CellAddress, CellRange};

/// Deepest allowed nesting of parentheses, calls, unary signs and
/// binary operators
///
/// Every operator in a chain such as `1+2+3` adds a level to the tree, so
/// this also bounds how many operators one formula may chain.
pub const MAX_NESTING_DEPTH: usize = 64;

/// Parse a formula string into an AST using the built-in functions
///
/// The leading `=` is optional.
///
/// # Example
/// ```rust
/// use feasgrid_formula::parse_formula;
///
/// let ast = parse_formula("=1+2").unwrap();
/// let ast = parse_formula("=SUM(A1:A10)").unwrap();
/// let ast = parse_formula("B2 * (1 + C2)").unwrap();
/// assert!(parse_formula("=FOO(A1)").is_err());
/// ```
pub fn parse_formula(formula: &str) -> FormulaResult<FormulaExpr> {
    parse_formula_with(formula, FunctionRegistry::global())
}

/// Parse a formula string, resolving function names against `registry`
pub fn parse_formula_with(formula: &str, registry: &FunctionRegistry) -> FormulaResult<FormulaExpr> {
    let formula = formula.trim();
    let formula = formula.strip_prefix('=').unwrap_or(formula);

    let mut parser = FormulaParser::new(formula, registry)?;
    if matches!(parser.current_token(), Token::Eof) {
        return Err(FormulaError::Parse("Empty formula".into()));
    }

    let expr = parser.parse_expression()?;

    // Make sure we consumed all input
    if !matches!(parser.current_token(), Token::Eof) {
        return Err(FormulaError::Parse(format!(
            "Unexpected {:?} after expression",
            parser.current_token()
        )));
    }

    Ok(expr)
}

/// Token types
#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Identifier(String), // Function name
    CellRef(String),    // Cell reference like A1

    Plus,
    Minus,
    Star,
    Slash,
    Colon,
    Comma,
    LeftParen,
    RightParen,

    Eof,
}

/// Formula parser
struct FormulaParser<'a> {
    input: &'a str,
    pos: usize,
    current_token: Token,
    depth: usize,
    registry: &'a FunctionRegistry,
}

impl<'a> FormulaParser<'a> {
    fn new(input: &'a str, registry: &'a FunctionRegistry) -> FormulaResult<Self> {
        let mut parser = Self {
            input,
            pos: 0,
            current_token: Token::Eof,
            depth: 0,
            registry,
        };
        parser.advance_token()?;
        Ok(parser)
    }

    // === Token scanning ===

    fn advance_token(&mut self) -> FormulaResult<()> {
        self.current_token = self.scan_token()?;
        Ok(())
    }

    fn scan_token(&mut self) -> FormulaResult<Token> {
        self.skip_whitespace();

        let c = match self.peek_char() {
            Some(c) => c,
            None => return Ok(Token::Eof),
        };

        let token = match c {
            '+' => Token::Plus,
            '-' => Token::Minus,
            '*' => Token::Star,
            '/' => Token::Slash,
            ':' => Token::Colon,
            ',' => Token::Comma,
            '(' => Token::LeftParen,
            ')' => Token::RightParen,
            _ if c.is_ascii_digit()
                || (c == '.' && self.peek_char_at(1).map_or(false, |c| c.is_ascii_digit())) =>
            {
                return self.scan_number();
            }
            _ if c.is_ascii_alphabetic() || c == '_' => return Ok(self.scan_identifier_or_ref()),
            _ => {
                return Err(FormulaError::Parse(format!(
                    "Unexpected character '{}' at position {}",
                    c, self.pos
                )))
            }
        };

        self.advance();
        Ok(token)
    }

    fn scan_number(&mut self) -> FormulaResult<Token> {
        let start = self.pos;

        // Integer part
        while self.peek_char().map_or(false, |c| c.is_ascii_digit()) {
            self.advance();
        }

        // Decimal part
        if self.peek_char() == Some('.') {
            self.advance();
            while self.peek_char().map_or(false, |c| c.is_ascii_digit()) {
                self.advance();
            }
        }

        // Exponent part, only when digits actually follow
        if self.peek_char().map_or(false, |c| c == 'e' || c == 'E') {
            let sign = usize::from(matches!(self.peek_char_at(1), Some('+') | Some('-')));
            if self
                .peek_char_at(1 + sign)
                .map_or(false, |c| c.is_ascii_digit())
            {
                for _ in 0..=sign {
                    self.advance();
                }
                while self.peek_char().map_or(false, |c| c.is_ascii_digit()) {
                    self.advance();
                }
            }
        }

        let num_str = &self.input[start..self.pos];
        num_str
            .parse()
            .map(Token::Number)
            .map_err(|_| FormulaError::Parse(format!("Invalid number '{}'", num_str)))
    }

    fn scan_identifier_or_ref(&mut self) -> Token {
        let start = self.pos;

        while self
            .peek_char()
            .map_or(false, |c| c.is_ascii_alphanumeric() || c == '_')
        {
            self.advance();
        }

        let text = &self.input[start..self.pos];

        // Letters followed by digits is a cell reference, unless it is
        // immediately called like a function
        if Self::is_cell_reference(text) && self.peek_non_whitespace() != Some('(') {
            return Token::CellRef(text.to_string());
        }

        Token::Identifier(text.to_string())
    }

    fn is_cell_reference(text: &str) -> bool {
        let digits_start = text
            .find(|c: char| !c.is_ascii_alphabetic())
            .unwrap_or(text.len());

        digits_start > 0
            && digits_start < text.len()
            && text[digits_start..].bytes().all(|b| b.is_ascii_digit())
    }

    // === Helper methods ===

    fn peek_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn peek_char_at(&self, offset: usize) -> Option<char> {
        self.input[self.pos..].chars().nth(offset)
    }

    fn peek_non_whitespace(&self) -> Option<char> {
        self.input[self.pos..].chars().find(|c| !c.is_whitespace())
    }

    fn advance(&mut self) {
        if let Some(c) = self.peek_char() {
            self.pos += c.len_utf8();
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek_char().map_or(false, |c| c.is_whitespace()) {
            self.advance();
        }
    }

    fn current_token(&self) -> &Token {
        &self.current_token
    }

    fn consume(&mut self) -> FormulaResult<Token> {
        let next = self.scan_token()?;
        Ok(std::mem::replace(&mut self.current_token, next))
    }

    fn expect(&mut self, expected: &Token) -> FormulaResult<()> {
        if self.current_token() == expected {
            self.consume()?;
            Ok(())
        } else {
            Err(FormulaError::Parse(format!(
                "Expected {:?}, got {:?}",
                expected,
                self.current_token()
            )))
        }
    }

    fn enter(&mut self) -> FormulaResult<()> {
        self.depth += 1;
        if self.depth > MAX_NESTING_DEPTH {
            return Err(FormulaError::Parse(format!(
                "Formula nested deeper than {} levels",
                MAX_NESTING_DEPTH
            )));
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    // === Expression parsing with precedence ===
    // Precedence (lowest to highest):
    // 1. Addition/Subtraction: +, -
    // 2. Multiplication/Division: *, /
    // 3. Unary: -, +
    // 4. Primary: numbers, references, ranges, function calls, parentheses

    fn parse_expression(&mut self) -> FormulaResult<FormulaExpr> {
        self.enter()?;
        let expr = self.parse_additive();
        self.leave();
        expr
    }

    fn parse_additive(&mut self) -> FormulaResult<FormulaExpr> {
        let depth = self.depth;
        let mut left = self.parse_multiplicative()?;

        loop {
            let op = match self.current_token() {
                Token::Plus => BinaryOperator::Add,
                Token::Minus => BinaryOperator::Subtract,
                _ => break,
            };

            self.consume()?;
            self.enter()?;
            let right = self.parse_multiplicative()?;
            left = FormulaExpr::BinaryOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        self.depth = depth;
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> FormulaResult<FormulaExpr> {
        let depth = self.depth;
        let mut left = self.parse_unary()?;

        loop {
            let op = match self.current_token() {
                Token::Star => BinaryOperator::Multiply,
                Token::Slash => BinaryOperator::Divide,
                _ => break,
            };

            self.consume()?;
            self.enter()?;
            let right = self.parse_unary()?;
            left = FormulaExpr::BinaryOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        self.depth = depth;
        Ok(left)
    }

    fn parse_unary(&mut self) -> FormulaResult<FormulaExpr> {
        match self.current_token() {
            Token::Minus => {
                self.consume()?;
                self.enter()?;
                let operand = self.parse_unary();
                self.leave();
                Ok(FormulaExpr::UnaryOp {
                    op: UnaryOperator::Negate,
                    operand: Box::new(operand?),
                })
            }
            // Prefix plus (no-op)
            Token::Plus => {
                self.consume()?;
                self.enter()?;
                let operand = self.parse_unary();
                self.leave();
                operand
            }
            _ => self.parse_primary(),
        }
    }

    fn parse_primary(&mut self) -> FormulaResult<FormulaExpr> {
        match self.consume()? {
            Token::Number(n) => Ok(FormulaExpr::Number(n)),

            Token::LeftParen => {
                let expr = self.parse_expression()?;
                self.expect(&Token::RightParen)?;
                Ok(expr)
            }

            Token::CellRef(ref_str) => self.parse_reference(&ref_str),

            Token::Identifier(name) => {
                if matches!(self.current_token(), Token::LeftParen) {
                    self.parse_function_call(name)
                } else {
                    Err(FormulaError::Parse(format!("Unknown name '{}'", name)))
                }
            }

            Token::Eof => Err(FormulaError::Parse("Unexpected end of formula".into())),

            token => Err(FormulaError::Parse(format!("Unexpected token: {:?}", token))),
        }
    }

    /// A cell reference, or the start of a range if a `:` follows
    fn parse_reference(&mut self, ref_str: &str) -> FormulaResult<FormulaExpr> {
        if !matches!(self.current_token(), Token::Colon) {
            return Ok(FormulaExpr::CellRef(CellAddress::parse(ref_str)?));
        }
        self.consume()?;

        match self.consume()? {
            Token::CellRef(end_str) => {
                let invalid = |e: feasgrid_core::Error| {
                    FormulaError::InvalidRange(format!("'{}:{}': {}", ref_str, end_str, e))
                };
                let start = CellAddress::parse(ref_str).map_err(invalid)?;
                let end = CellAddress::parse(&end_str).map_err(invalid)?;
                Ok(FormulaExpr::RangeRef(CellRange::new(start, end)))
            }
            token => Err(FormulaError::Parse(format!(
                "Expected cell reference after '{}:', got {:?}",
                ref_str, token
            ))),
        }
    }

    fn parse_function_call(&mut self, name: String) -> FormulaResult<FormulaExpr> {
        let name = name.to_uppercase();
        let (min_args, max_args) = match self.registry.get(&name) {
            Some(def) => (def.min_args, def.max_args),
            None => return Err(FormulaError::UnknownFunction(name)),
        };

        self.expect(&Token::LeftParen)?;
        self.enter()?;
        let args = self.parse_arguments(&name);
        self.leave();
        let args = args?;
        self.expect(&Token::RightParen)?;

        if args.len() < min_args {
            return Err(FormulaError::ArgumentCount {
                function: name,
                expected: format!("at least {}", min_args),
                actual: args.len(),
            });
        }
        if let Some(max) = max_args {
            if args.len() > max {
                return Err(FormulaError::ArgumentCount {
                    function: name,
                    expected: format!("at most {}", max),
                    actual: args.len(),
                });
            }
        }

        Ok(FormulaExpr::Function { name, args })
    }

    fn parse_arguments(&mut self, name: &str) -> FormulaResult<Vec<FormulaExpr>> {
        let mut args = Vec::new();

        if matches!(self.current_token(), Token::RightParen) {
            return Ok(args);
        }

        loop {
            if matches!(self.current_token(), Token::Comma | Token::RightParen) {
                return Err(FormulaError::Parse(format!(
                    "Empty argument in call to {}",
                    name
                )));
            }
            args.push(self.parse_expression()?);

            if !matches!(self.current_token(), Token::Comma) {
                return Ok(args);
            }
            self.consume()?;
        }
    }
}
