use anyhow::{
    Result,
    bail,
};
use logos::Logos;
use parser_helper::{
    SimpleError,
    LookaheadLexer,
    LogosTokenStream,
    Token as TokenTrait,
    new_parser,
};
use crate::ast::{
    Binding,
    Expr,
};

pub use StartOrEnd::*;


#[derive(Debug, Logos, Clone, PartialEq)]
#[logos(skip "[ \t\r\n]")]
#[logos(skip ";[^\n]*")]
pub enum Token<'a> {
    #[regex("[a-zA-Z_+*/<>=!?-][a-zA-Z0-9_+*/<>=!?-]*")]
    Ident(&'a str),

    #[regex("[0-9]+")]
    Number(&'a str),

    #[token("(", |_|Start)]
    #[token(")", |_|End)]
    Paren(StartOrEnd),

    EOF,
}
impl<'a> TokenTrait for Token<'a> {
    fn eof()->Self {Self::EOF}
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum StartOrEnd {
    Start,
    End,
}


new_parser!(pub struct Parser<'a, 2, Token<'a>, LogosTokenStream<'a, Token<'a>>>);
// public methods
impl<'a> Parser<'a> {
    pub fn new_from_source(source: &'a str)->Parser<'a> {
        Parser::new(
            Token::lexer(source),
            (),
        )
    }

    /// A program is one expression followed by end of input.
    pub fn parse(&mut self)->Result<Expr<'a>> {
        let expr = self.parse_expr()?;
        match self.peek() {
            Token::EOF=>Ok(expr),
            t=>{
                let t = t.clone();
                bail!(self.error(format!("Expected end of input, but got `{t:?}`")));
            },
        }
    }

    pub fn parse_expr(&mut self)->Result<Expr<'a>> {
        match self.peek() {
            Token::Paren(Start)=>match self.peek1() {
                Token::Ident("lambda")=>self.parse_lambda(),
                Token::Ident("if")=>self.parse_if(),
                Token::Ident("letrec")=>self.parse_letrec(),
                _=>self.parse_call(),
            },
            _=>self.parse_lit(),
        }
    }

    fn parse_lambda(&mut self)->Result<Expr<'a>> {
        self.paren_start()?;
        self.match_ident("lambda")?;

        self.paren_start()?;
        let mut formals = Vec::new();
        loop {
            match self.next() {
                Token::Ident(name)=>formals.push(name),
                Token::Paren(End)=>break,
                t=>bail!("Unexpected token: `{t:?}`"),
            }
        }

        let (statements, ret) = self.parse_body()?;

        return Ok(Expr::Lambda {formals, statements, ret: Box::new(ret)});
    }

    fn parse_if(&mut self)->Result<Expr<'a>> {
        self.paren_start()?;
        self.match_ident("if")?;

        let test = self.parse_expr().map(Box::new)?;
        let if_true = self.parse_expr().map(Box::new)?;

        let mut if_false = None;
        match self.peek() {
            Token::Paren(End)=>self.paren_end()?,
            _=>{
                if_false = Some(self.parse_expr().map(Box::new)?);
                self.paren_end()?;
            },
        }

        return Ok(Expr::Conditional {test, if_true, if_false});
    }

    fn parse_letrec(&mut self)->Result<Expr<'a>> {
        self.paren_start()?;
        self.match_ident("letrec")?;

        self.paren_start()?;
        let mut bindings = Vec::new();
        while !self.try_paren_end() {
            self.paren_start()?;
            let name = self.ident()?;
            let expr = self.parse_expr()?;
            self.paren_end()?;

            bindings.push(Binding {name, expr});
        }

        let (statements, ret) = self.parse_body()?;

        return Ok(Expr::LetRec {bindings, statements, ret: Box::new(ret)});
    }

    fn parse_call(&mut self)->Result<Expr<'a>> {
        self.paren_start()?;
        let function = self.parse_expr().map(Box::new)?;

        let mut arguments = Vec::new();
        while !self.try_paren_end() {
            arguments.push(self.parse_expr()?);
        }

        return Ok(Expr::Call {function, arguments});
    }

    /// One or more expressions up to the closing paren; the last one is the
    /// returned value, the rest are effect-only statements.
    fn parse_body(&mut self)->Result<(Vec<Expr<'a>>, Expr<'a>)> {
        let mut exprs = vec![self.parse_expr()?];
        while !self.try_paren_end() {
            exprs.push(self.parse_expr()?);
        }
        let ret = exprs.pop().unwrap();

        return Ok((exprs, ret));
    }

    fn parse_lit(&mut self)->Result<Expr<'a>> {
        match self.next() {
            Token::Number(n)=>match n.parse::<i64>() {
                Ok(value)=>Ok(Expr::Number(value)),
                Err(_)=>bail!(self.error("Integer overflow")),
            },
            Token::Ident(name)=>Ok(Expr::Ident(name)),
            t=>bail!("Unexpected token: {t:?}"),
        }
    }
}
// private helpers
impl<'a> Parser<'a> {
    #[inline]
    fn peek(&mut self)->&Token<'a> {
        self.lookahead(0)
    }

    fn peek1(&mut self)->&Token<'a> {
        self.lookahead(1)
    }

    #[inline]
    fn next(&mut self)->Token<'a> {
        self.take_token()
    }

    #[inline]
    fn error(&mut self, msg: impl Into<String>)->SimpleError<String> {
        self.0.error(msg)
    }

    fn ident(&mut self)->Result<&'a str> {
        match self.take_token() {
            Token::Ident(s)=>Ok(s),
            _=>bail!(self.error("Expected identifier")),
        }
    }

    fn match_ident(&mut self, to_match: &str)->Result<()> {
        match self.take_token() {
            Token::Ident(s)=>if s != to_match {
                bail!(self.error(format!("Expected identifier `{}`, but got `{}`", to_match, s)));
            } else {
                Ok(())
            },
            _=>bail!(self.error("Expected identifier")),
        }
    }

    fn paren_start(&mut self)->Result<()> {
        match self.take_token() {
            Token::Paren(Start)=>Ok(()),
            _=>bail!(self.error("Expected `(`")),
        }
    }

    fn paren_end(&mut self)->Result<()> {
        match self.take_token() {
            Token::Paren(End)=>Ok(()),
            _=>bail!(self.error("Expected `)`")),
        }
    }

    fn try_paren_end(&mut self)->bool {
        match self.peek() {
            Token::Paren(End)=>{
                self.take_token();
                true
            },
            _=>false,
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str)->Expr<'_> {
        Parser::new_from_source(source).parse().unwrap()
    }

    #[test]
    fn parses_literals_and_idents() {
        assert_eq!(parse("42"), Expr::Number(42));
        assert_eq!(parse("zero?"), Expr::Ident("zero?"));
        assert_eq!(parse("+"), Expr::Ident("+"));
    }

    #[test]
    fn parses_calls() {
        assert_eq!(parse("(+ 1 2)"), Expr::Call {
            function: Box::new(Expr::Ident("+")),
            arguments: vec![Expr::Number(1), Expr::Number(2)],
        });
    }

    #[test]
    fn parses_lambdas_with_statement_bodies() {
        assert_eq!(parse("(lambda (x y) (zero? x) y)"), Expr::Lambda {
            formals: vec!["x", "y"],
            statements: vec![Expr::Call {
                function: Box::new(Expr::Ident("zero?")),
                arguments: vec![Expr::Ident("x")],
            }],
            ret: Box::new(Expr::Ident("y")),
        });
    }

    #[test]
    fn parses_nullary_lambdas() {
        assert_eq!(parse("(lambda () 5)"), Expr::Lambda {
            formals: Vec::new(),
            statements: Vec::new(),
            ret: Box::new(Expr::Number(5)),
        });
    }

    #[test]
    fn else_branch_is_optional() {
        assert_eq!(parse("(if t 1 2)"), Expr::Conditional {
            test: Box::new(Expr::Ident("t")),
            if_true: Box::new(Expr::Number(1)),
            if_false: Some(Box::new(Expr::Number(2))),
        });
        assert_eq!(parse("(if t 1)"), Expr::Conditional {
            test: Box::new(Expr::Ident("t")),
            if_true: Box::new(Expr::Number(1)),
            if_false: None,
        });
    }

    #[test]
    fn parses_letrec() {
        assert_eq!(parse("(letrec ((f (lambda (x) x))) (f 1))"), Expr::LetRec {
            bindings: vec![Binding {
                name: "f",
                expr: Expr::Lambda {
                    formals: vec!["x"],
                    statements: Vec::new(),
                    ret: Box::new(Expr::Ident("x")),
                },
            }],
            statements: Vec::new(),
            ret: Box::new(Expr::Call {
                function: Box::new(Expr::Ident("f")),
                arguments: vec![Expr::Number(1)],
            }),
        });
    }

    #[test]
    fn skips_comments() {
        assert_eq!(parse("; doubles its input\n(* 2 21)"), Expr::Call {
            function: Box::new(Expr::Ident("*")),
            arguments: vec![Expr::Number(2), Expr::Number(21)],
        });
    }

    #[test]
    fn rejects_trailing_tokens() {
        assert!(Parser::new_from_source("(+ 1 2) 3").parse().is_err());
    }

    #[test]
    fn rejects_stray_parens() {
        assert!(Parser::new_from_source(")").parse().is_err());
    }
}
