//! Formula parser
//!
//! A tokenizer followed by a recursive descent parser with proper operator
//! precedence: `*` and `/` bind tighter than `+` and `-`, all binary
//! operators are left-associative, and unary minus is supported.

use crate::ast::{BinaryOperator, Expr, UnaryOperator};
use crate::compare::CompareOp;
use crate::error::{FormulaError, FormulaResult};
use tabula_core::{CellId, TableRef, FORMULA_MARKER};

/// Deepest nesting of parentheses, calls and unary operators a formula may use
pub const MAX_NESTING: usize = 128;

/// Parse formula text (starting with `=`) into an AST
///
/// # Example
/// ```rust
/// use tabula_formula::parse_formula;
///
/// let ast = parse_formula("=1+2").unwrap();
/// let ast = parse_formula("=sum(A1;A2;3)").unwrap();
/// let ast = parse_formula("=if(A1<A2;\"yes\";\"no\")").unwrap();
/// ```
pub fn parse_formula(formula: &str) -> FormulaResult<Expr> {
    let body = formula
        .strip_prefix(FORMULA_MARKER)
        .ok_or_else(|| FormulaError::Syntax("formula must start with '='".into()))?;
    parse_expression(body)
}

/// Parse a bare expression (no leading `=`)
pub fn parse_expression(input: &str) -> FormulaResult<Expr> {
    let tokens = tokenize(input)?;
    let mut parser = FormulaParser::new(tokens);

    if parser.is_at_end() {
        return Err(FormulaError::Syntax("empty expression".into()));
    }

    let expr = parser.parse_additive()?;

    // Make sure we consumed all input
    match parser.current_token() {
        Token::Eof => Ok(expr),
        Token::Compare(op) => Err(FormulaError::Syntax(format!(
            "comparison '{}' is only allowed as a function condition",
            op
        ))),
        other => Err(FormulaError::Syntax(format!(
            "unexpected {} after expression",
            other.describe()
        ))),
    }
}

/// Token types
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Literals
    Number(f64),
    Text(String),

    // Identifiers and references
    Word(String), // Function name or bare literal word
    CellRef(CellId),
    TableRef(TableRef),

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Compare(String), // Any run of '<', '>', '='

    // Delimiters
    LeftParen,
    RightParen,
    Separator,

    // End of input
    Eof,
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::Number(n) => format!("number {}", n),
            Token::Text(s) => format!("text \"{}\"", s),
            Token::Word(w) => format!("'{}'", w),
            Token::CellRef(id) => format!("cell {}", id),
            Token::TableRef(r) => format!("reference {}", r),
            Token::Plus => "'+'".into(),
            Token::Minus => "'-'".into(),
            Token::Star => "'*'".into(),
            Token::Slash => "'/'".into(),
            Token::Compare(op) => format!("'{}'", op),
            Token::LeftParen => "'('".into(),
            Token::RightParen => "')'".into(),
            Token::Separator => "';'".into(),
            Token::Eof => "end of formula".into(),
        }
    }
}

/// Split an expression into tokens, skipping whitespace
///
/// The result always ends with [`Token::Eof`].
pub fn tokenize(input: &str) -> FormulaResult<Vec<Token>> {
    let mut lexer = Lexer { input, pos: 0 };
    let mut tokens = Vec::new();
    loop {
        let token = lexer.scan_token()?;
        let done = token == Token::Eof;
        tokens.push(token);
        if done {
            return Ok(tokens);
        }
    }
}

fn is_delimiter(c: char) -> bool {
    c.is_whitespace() || matches!(c, '+' | '-' | '*' | '/' | '(' | ')' | ';' | '<' | '>' | '=' | '"')
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

struct Lexer<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn scan_token(&mut self) -> FormulaResult<Token> {
        self.skip_whitespace();

        let c = match self.peek_char() {
            Some(c) => c,
            None => return Ok(Token::Eof),
        };

        // Single-character tokens
        let single = match c {
            '+' => Some(Token::Plus),
            '-' => Some(Token::Minus),
            '*' => Some(Token::Star),
            '/' => Some(Token::Slash),
            '(' => Some(Token::LeftParen),
            ')' => Some(Token::RightParen),
            ';' => Some(Token::Separator),
            _ => None,
        };
        if let Some(token) = single {
            self.advance();
            return Ok(token);
        }

        // Comparison operators are validated by the parser
        if matches!(c, '<' | '>' | '=') {
            let start = self.pos;
            while self.peek_char().map_or(false, |c| matches!(c, '<' | '>' | '=')) {
                self.advance();
            }
            return Ok(Token::Compare(self.input[start..self.pos].to_string()));
        }

        if c == '"' {
            return self.scan_string();
        }

        // Table-qualified references may start with a digit or contain spaces
        if is_word_char(c) {
            if let Some(table_ref) = self.scan_table_ref() {
                return Ok(Token::TableRef(table_ref));
            }
        }

        let start = self.pos;
        let word = self.scan_word();
        if c.is_ascii_digit() {
            return Self::number(word);
        }
        if let Ok(id) = CellId::parse(word) {
            return Ok(Token::CellRef(id));
        }
        Ok(Token::Word(self.scan_phrase(start).to_string()))
    }

    fn scan_string(&mut self) -> FormulaResult<Token> {
        self.advance(); // Skip opening quote

        let mut s = String::new();
        loop {
            match self.peek_char() {
                Some('"') => {
                    self.advance();
                    // Check for escaped quote ("")
                    if self.peek_char() == Some('"') {
                        s.push('"');
                        self.advance();
                    } else {
                        return Ok(Token::Text(s));
                    }
                }
                Some(c) => {
                    s.push(c);
                    self.advance();
                }
                None => return Err(FormulaError::Syntax("unterminated string".into())),
            }
        }
    }

    /// Scan `<word/space chars>:<cell-id>` if it starts here; leaves the
    /// position untouched otherwise.
    fn scan_table_ref(&mut self) -> Option<TableRef> {
        let input = self.input;
        let rest = &input[self.pos..];
        let name_len = rest
            .find(|c: char| !(is_word_char(c) || c.is_whitespace()))
            .unwrap_or(rest.len());
        if !rest[name_len..].starts_with(':') {
            return None;
        }

        let after_colon = &rest[name_len + 1..];
        let id_len = after_colon
            .find(|c: char| !is_word_char(c))
            .unwrap_or(after_colon.len());
        let candidate = &rest[..name_len + 1 + id_len];

        let table_ref = TableRef::parse(candidate).ok()?;
        self.pos += candidate.len();
        Some(table_ref)
    }

    fn scan_word(&mut self) -> &'a str {
        let input = self.input;
        let start = self.pos;
        while self.peek_char().map_or(false, |c| !is_delimiter(c)) {
            self.advance();
        }
        &input[start..self.pos]
    }

    /// Extend a bare word over the words that follow it, so that
    /// `hello world` stays one literal; stops before any delimiter but space
    fn scan_phrase(&mut self, start: usize) -> &'a str {
        let input = self.input;
        loop {
            let rest = &input[self.pos..];
            let gap = rest.len() - rest.trim_start().len();
            let next = rest[gap..].chars().next();
            if gap == 0 || !next.map_or(false, |c| !is_delimiter(c)) {
                break;
            }
            self.pos += gap;
            self.scan_word();
        }
        &input[start..self.pos]
    }

    fn number(text: &str) -> FormulaResult<Token> {
        let well_formed = text.chars().all(|c| c.is_ascii_digit() || c == '.')
            && text.matches('.').count() <= 1;
        if !well_formed {
            return Err(FormulaError::InvalidNumber(text.to_string()));
        }
        text.parse::<f64>()
            .map(Token::Number)
            .map_err(|_| FormulaError::InvalidNumber(text.to_string()))
    }

    // === Helper methods ===

    fn peek_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
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
}

/// Formula parser
struct FormulaParser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl FormulaParser {
    fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            pos: 0,
            depth: 0,
        }
    }

    // === Token access ===

    fn current_token(&self) -> &Token {
        self.tokens.get(self.pos).unwrap_or(&Token::Eof)
    }

    fn peek_token(&self) -> &Token {
        self.tokens.get(self.pos + 1).unwrap_or(&Token::Eof)
    }

    fn is_at_end(&self) -> bool {
        matches!(self.current_token(), Token::Eof)
    }

    fn consume(&mut self) -> Token {
        let token = self.current_token().clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    fn expect(&mut self, expected: &Token) -> FormulaResult<()> {
        if self.current_token() == expected {
            self.consume();
            Ok(())
        } else {
            Err(FormulaError::Syntax(format!(
                "expected {}, got {}",
                expected.describe(),
                self.current_token().describe()
            )))
        }
    }

    // === Expression parsing with precedence ===
    // Precedence (lowest to highest):
    // 1. Addition/Subtraction: +, -
    // 2. Multiplication/Division: *, /
    // 3. Unary: -, +
    // 4. Primary: literals, references, function calls, parentheses
    //
    // Comparisons are parsed only inside function arguments.

    fn parse_additive(&mut self) -> FormulaResult<Expr> {
        let mut left = self.parse_multiplicative()?;

        loop {
            let op = match self.current_token() {
                Token::Plus => BinaryOperator::Add,
                Token::Minus => BinaryOperator::Subtract,
                _ => break,
            };

            self.consume();
            let right = self.parse_multiplicative()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> FormulaResult<Expr> {
        let mut left = self.parse_unary()?;

        loop {
            let op = match self.current_token() {
                Token::Star => BinaryOperator::Multiply,
                Token::Slash => BinaryOperator::Divide,
                _ => break,
            };

            self.consume();
            let right = self.parse_unary()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    /// Every nested group, call argument and unary operator passes through
    /// here, so this is where nesting depth is bounded
    fn parse_unary(&mut self) -> FormulaResult<Expr> {
        if self.depth >= MAX_NESTING {
            return Err(FormulaError::Syntax("formula nested too deeply".into()));
        }
        self.depth += 1;
        let result = self.parse_prefixed();
        self.depth -= 1;
        result
    }

    fn parse_prefixed(&mut self) -> FormulaResult<Expr> {
        match self.current_token() {
            Token::Minus => {
                self.consume();
                let operand = self.parse_unary()?;
                Ok(Expr::Unary {
                    op: UnaryOperator::Negate,
                    operand: Box::new(operand),
                })
            }
            // Prefix plus (no-op)
            Token::Plus => {
                self.consume();
                self.parse_unary()
            }
            _ => self.parse_primary(),
        }
    }

    fn parse_primary(&mut self) -> FormulaResult<Expr> {
        let is_call = matches!(self.peek_token(), Token::LeftParen);

        match self.consume() {
            Token::Number(n) => Ok(Expr::Number(n)),

            Token::Text(s) => Ok(Expr::Text(s)),

            Token::TableRef(r) => Ok(Expr::TableRef(r)),

            Token::LeftParen => {
                let expr = self.parse_additive()?;
                self.expect(&Token::RightParen)?;
                Ok(expr)
            }

            // A cell-shaped name followed by '(' is still a call, e.g. an unknown `B2(1)`
            Token::CellRef(id) if is_call => self.parse_function_call(id.to_string()),
            Token::CellRef(id) => Ok(Expr::CellRef(id)),

            Token::Word(name) if is_call => self.parse_function_call(name),
            // Anything else is taken literally
            Token::Word(word) => Ok(Expr::Text(word)),

            Token::Compare(op) => Err(FormulaError::Syntax(format!(
                "comparison '{}' is only allowed as a function condition",
                op
            ))),

            other => Err(FormulaError::Syntax(format!(
                "unexpected {}",
                other.describe()
            ))),
        }
    }

    fn parse_function_call(&mut self, name: String) -> FormulaResult<Expr> {
        self.expect(&Token::LeftParen)?;

        let mut args = Vec::new();

        // Parse arguments
        if !matches!(self.current_token(), Token::RightParen) {
            args.push(self.parse_argument()?);

            while matches!(self.current_token(), Token::Separator) {
                self.consume();
                args.push(self.parse_argument()?);
            }
        }

        self.expect(&Token::RightParen)?;

        Ok(Expr::Call {
            name: name.to_lowercase(),
            args,
        })
    }

    /// An argument is an expression, a condition `left op right`, or a
    /// criterion `op operand`.
    fn parse_argument(&mut self) -> FormulaResult<Expr> {
        if let Token::Compare(op) = self.current_token() {
            let op = CompareOp::parse(op)?;
            self.consume();
            let operand = self.parse_additive()?;
            return Ok(Expr::Criterion {
                op,
                operand: Box::new(operand),
            });
        }

        if matches!(self.current_token(), Token::Separator | Token::RightParen) {
            return Err(FormulaError::Syntax("empty argument".into()));
        }

        let left = self.parse_additive()?;

        if let Token::Compare(op) = self.current_token() {
            let op = CompareOp::parse(op)?;
            self.consume();
            let right = self.parse_additive()?;
            return Ok(Expr::Compare {
                op,
                left: Box::new(left),
                right: Box::new(right),
            });
        }

        Ok(left)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn cell(s: &str) -> Expr {
        Expr::CellRef(CellId::parse(s).unwrap())
    }

    fn num(n: f64) -> Box<Expr> {
        Box::new(Expr::Number(n))
    }

    #[test]
    fn test_tokenize() {
        let tokens = tokenize("sum(A1; 2.5)*-x").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Word("sum".into()),
                Token::LeftParen,
                Token::CellRef(CellId::parse("A1").unwrap()),
                Token::Separator,
                Token::Number(2.5),
                Token::RightParen,
                Token::Star,
                Token::Minus,
                Token::Word("x".into()),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_tokenize_table_refs() {
        let tokens = tokenize("Sales 2024:B3+2024:A1").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::TableRef(TableRef::parse("Sales 2024:B3").unwrap()),
                Token::Plus,
                Token::TableRef(TableRef::parse("2024:A1").unwrap()),
                Token::Eof,
            ]
        );

        // Not followed by a cell identifier: a plain word
        let tokens = tokenize("ratio:x").unwrap();
        assert_eq!(tokens[0], Token::Word("ratio:x".into()));
    }

    #[test]
    fn test_tokenize_comparisons() {
        let tokens = tokenize("A1<=5").unwrap();
        assert_eq!(tokens[1], Token::Compare("<=".into()));

        let tokens = tokenize(">>4").unwrap();
        assert_eq!(tokens[0], Token::Compare(">>".into()));
    }

    #[test]
    fn test_invalid_numbers() {
        assert_eq!(
            tokenize("1.2.3"),
            Err(FormulaError::InvalidNumber("1.2.3".into()))
        );
        assert_eq!(
            tokenize("12abc"),
            Err(FormulaError::InvalidNumber("12abc".into()))
        );
        assert_eq!(
            parse_formula("=1+1.2.3").unwrap_err().kind(),
            crate::ErrorKind::InvalidNumber
        );
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_formula("=42").unwrap(), Expr::Number(42.0));
        assert_eq!(parse_formula("=3.14").unwrap(), Expr::Number(3.14));
        assert_eq!(parse_formula("= 7 ").unwrap(), Expr::Number(7.0));
    }

    #[test]
    fn test_parse_string() {
        assert_eq!(
            parse_formula("=\"Hello\"").unwrap(),
            Expr::Text("Hello".into())
        );
        assert_eq!(
            parse_formula("=\"say \"\"hi\"\"\"").unwrap(),
            Expr::Text("say \"hi\"".into())
        );
        assert!(parse_formula("=\"open").is_err());
    }

    #[test]
    fn test_parse_bare_word_is_text() {
        assert_eq!(parse_formula("=pending").unwrap(), Expr::Text("pending".into()));
        assert_eq!(parse_formula("=AB12").unwrap(), Expr::Text("AB12".into()));
    }

    #[test]
    fn test_parse_precedence() {
        // 1+(2*3)
        assert_eq!(
            parse_formula("=1+2*3").unwrap(),
            Expr::Binary {
                op: BinaryOperator::Add,
                left: num(1.0),
                right: Box::new(Expr::Binary {
                    op: BinaryOperator::Multiply,
                    left: num(2.0),
                    right: num(3.0),
                }),
            }
        );

        // (1-2)-3, left associative
        assert_eq!(
            parse_formula("=1-2-3").unwrap(),
            Expr::Binary {
                op: BinaryOperator::Subtract,
                left: Box::new(Expr::Binary {
                    op: BinaryOperator::Subtract,
                    left: num(1.0),
                    right: num(2.0),
                }),
                right: num(3.0),
            }
        );
    }

    #[test]
    fn test_parse_parentheses() {
        let ast = parse_formula("=(1+2)*3").unwrap();
        if let Expr::Binary { op, left, right } = ast {
            assert_eq!(op, BinaryOperator::Multiply);
            assert!(matches!(
                *left,
                Expr::Binary {
                    op: BinaryOperator::Add,
                    ..
                }
            ));
            assert_eq!(*right, Expr::Number(3.0));
        } else {
            panic!("Expected Binary");
        }
    }

    #[test]
    fn test_parse_unary() {
        assert_eq!(
            parse_formula("=-A1").unwrap(),
            Expr::Unary {
                op: UnaryOperator::Negate,
                operand: Box::new(cell("A1")),
            }
        );
        assert_eq!(parse_formula("=+5").unwrap(), Expr::Number(5.0));
    }

    #[test]
    fn test_parse_function() {
        let ast = parse_formula("=SUM(A1;A2;3)").unwrap();
        assert_eq!(
            ast,
            Expr::Call {
                name: "sum".into(),
                args: vec![cell("A1"), cell("A2"), Expr::Number(3.0)],
            }
        );

        let ast = parse_formula("=count()").unwrap();
        assert_eq!(
            ast,
            Expr::Call {
                name: "count".into(),
                args: vec![],
            }
        );
    }

    #[test]
    fn test_parse_condition_and_criterion() {
        let ast = parse_formula("=if(A1<A2;\"yes\";\"no\")").unwrap();
        let Expr::Call { name, args } = ast else {
            panic!("Expected Call");
        };
        assert_eq!(name, "if");
        assert_eq!(
            args[0],
            Expr::Compare {
                op: CompareOp::Less,
                left: Box::new(cell("A1")),
                right: Box::new(cell("A2")),
            }
        );

        let ast = parse_formula("=countif(A1;A2;>=4)").unwrap();
        let Expr::Call { args, .. } = ast else {
            panic!("Expected Call");
        };
        assert_eq!(
            args[2],
            Expr::Criterion {
                op: CompareOp::GreaterEqual,
                operand: num(4.0),
            }
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_formula("1+2").is_err());
        assert!(parse_formula("=").is_err());
        assert!(parse_formula("=(1+2").is_err());
        assert!(parse_formula("=1+").is_err());
        assert!(parse_formula("=sum(1;;2)").is_err());
        assert!(parse_formula("=1 2").is_err());
        assert!(matches!(
            parse_formula("=1<2"),
            Err(FormulaError::Syntax(_))
        ));
        assert_eq!(
            parse_formula("=if(A1=>A2;1;2)"),
            Err(FormulaError::InvalidOperator("=>".into()))
        );
    }

    #[test]
    fn test_collect_table_references() {
        let ast = parse_formula("=sum(A1;ext:B2;(C3+ext:B2)*A1;Costs:A1)").unwrap();
        let tables: Vec<_> = ast.table_refs().into_iter().map(|r| r.to_string()).collect();
        assert_eq!(tables, vec!["Costs:A1".to_string(), "ext:B2".to_string()]);
    }

    #[test]
    fn test_parse_phrase_literals() {
        assert_eq!(
            parse_formula("=hello world").unwrap(),
            Expr::Text("hello world".into())
        );
        assert_eq!(
            parse_formula("=Hello, world").unwrap(),
            Expr::Text("Hello, world".into())
        );
        assert_eq!(
            parse_formula("=room  12").unwrap(),
            Expr::Text("room  12".into())
        );

        let ast = parse_formula("=if(A1<A2;yes please;no)").unwrap();
        let Expr::Call { args, .. } = ast else {
            panic!("Expected Call");
        };
        assert_eq!(args[1], Expr::Text("yes please".into()));
        assert_eq!(args[2], Expr::Text("no".into()));
    }

    #[test]
    fn test_phrase_stops_at_operators() {
        let tokens = tokenize("net pay + 2").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Word("net pay".into()),
                Token::Plus,
                Token::Number(2.0),
                Token::Eof,
            ]
        );
        // A cell identifier on its own is still a reference
        assert_eq!(
            tokenize("A1 ").unwrap()[0],
            Token::CellRef(CellId::parse("A1").unwrap())
        );
    }

    #[test]
    fn test_lowercase_cell_shapes_are_text() {
        assert_eq!(parse_formula("=a1").unwrap(), Expr::Text("a1".into()));
    }

    #[test]
    fn test_nesting_limit() {
        let nested = |depth: usize| format!("={}1{}", "(".repeat(depth), ")".repeat(depth));
        assert_eq!(parse_formula(&nested(50)).unwrap(), Expr::Number(1.0));

        let err = parse_formula(&nested(10_000)).unwrap_err();
        assert_eq!(err, FormulaError::Syntax("formula nested too deeply".into()));
        assert!(parse_formula(&format!("={}1", "-".repeat(10_000))).is_err());
        assert!(parse_formula(&format!("={}1{}", "sum(".repeat(10_000), ")".repeat(10_000))).is_err());
    }
}
