//! Textual operator declarations.
//!
//! ```text
//! decl    := ident '(' (param | '*' | '...') % ',' ')' ('->' returns)?
//! param   := type ident ('=' literal)?
//! type    := base ('[' int? ']' | '?')*
//! base    := ident | 'Future' '(' type ')' | '(' type % ',' ')'
//! returns := type | '(' type % ',' ')'
//! ```
//!
//! Identifiers that are not builtin type names are type variables. A `*`
//! makes every later parameter keyword-only; `...` marks the signature as
//! variadic. `int[2]` is a list of fixed arity 2.

use strand_ir::{Constant, StringInterner};
use strand_types::{Argument, FunctionSignature, Idx, Pool};

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("invalid declaration at byte {position}: {message}")]
pub struct DeclarationError {
    pub position: usize,
    pub message: String,
}

#[derive(Clone, Debug, PartialEq)]
enum Token<'a> {
    Ident(&'a str),
    Int(i64),
    Float(f64),
    Str(&'a str),
    Punct(u8),
    Arrow,
    Ellipsis,
    Eof,
}

struct DeclParser<'a, 'p> {
    src: &'a str,
    pos: usize,
    pool: &'p mut Pool,
    interner: &'p StringInterner,
}

/// Parse one declaration into a signature.
pub fn parse_declaration(
    decl: &str,
    pool: &mut Pool,
    interner: &StringInterner,
) -> Result<FunctionSignature, DeclarationError> {
    let mut parser = DeclParser {
        src: decl,
        pos: 0,
        pool,
        interner,
    };
    parser.declaration()
}

impl<'a> DeclParser<'a, '_> {
    fn error<T>(&self, message: impl Into<String>) -> Result<T, DeclarationError> {
        Err(DeclarationError {
            position: self.pos,
            message: message.into(),
        })
    }

    fn skip_whitespace(&mut self) {
        let rest = &self.src[self.pos..];
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn next_token(&mut self) -> Result<Token<'a>, DeclarationError> {
        self.skip_whitespace();
        let bytes = self.src.as_bytes();
        let Some(&c) = bytes.get(self.pos) else {
            return Ok(Token::Eof);
        };
        let start = self.pos;
        if c.is_ascii_alphabetic() || c == b'_' {
            while bytes
                .get(self.pos)
                .is_some_and(|b| b.is_ascii_alphanumeric() || *b == b'_')
            {
                self.pos += 1;
            }
            return Ok(Token::Ident(&self.src[start..self.pos]));
        }
        if c.is_ascii_digit() {
            while bytes
                .get(self.pos)
                .is_some_and(|b| b.is_ascii_digit() || *b == b'.' || *b == b'e')
            {
                self.pos += 1;
            }
            let text = &self.src[start..self.pos];
            if let Ok(i) = text.parse::<i64>() {
                return Ok(Token::Int(i));
            }
            return match text.parse::<f64>() {
                Ok(f) => Ok(Token::Float(f)),
                Err(_) => self.error(format!("bad number `{text}`")),
            };
        }
        if c == b'"' {
            let Some(len) = self.src[start + 1..].find('"') else {
                return self.error("unterminated string");
            };
            self.pos = start + 1 + len + 1;
            return Ok(Token::Str(&self.src[start + 1..start + 1 + len]));
        }
        if self.src[start..].starts_with("->") {
            self.pos += 2;
            return Ok(Token::Arrow);
        }
        if self.src[start..].starts_with("...") {
            self.pos += 3;
            return Ok(Token::Ellipsis);
        }
        self.pos += 1;
        Ok(Token::Punct(c))
    }

    fn peek(&mut self) -> Result<Token<'a>, DeclarationError> {
        let saved = self.pos;
        let token = self.next_token();
        self.pos = saved;
        token
    }

    fn eat(&mut self, expected: &Token<'_>) -> Result<bool, DeclarationError> {
        let saved = self.pos;
        if self.next_token()? == *expected {
            Ok(true)
        } else {
            self.pos = saved;
            Ok(false)
        }
    }

    fn expect(&mut self, expected: u8) -> Result<(), DeclarationError> {
        if self.eat(&Token::Punct(expected))? {
            Ok(())
        } else {
            self.error(format!("expected `{}`", expected as char))
        }
    }

    fn ident(&mut self) -> Result<&'a str, DeclarationError> {
        match self.next_token()? {
            Token::Ident(s) => Ok(s),
            other => self.error(format!("expected identifier, found {other:?}")),
        }
    }

    fn declaration(&mut self) -> Result<FunctionSignature, DeclarationError> {
        let name = self.ident()?;
        let mut sig = FunctionSignature::new(self.interner.intern(name));
        self.expect(b'(')?;
        let mut kwarg_only = false;
        if !self.eat(&Token::Punct(b')'))? {
            loop {
                if self.eat(&Token::Punct(b'*'))? {
                    kwarg_only = true;
                } else if self.eat(&Token::Ellipsis)? {
                    sig.is_vararg = true;
                } else {
                    let arg = self.param()?;
                    sig.arguments
                        .push(if kwarg_only { arg.keyword_only() } else { arg });
                }
                if self.eat(&Token::Punct(b')'))? {
                    break;
                }
                self.expect(b',')?;
            }
        }
        if self.eat(&Token::Arrow)? {
            if self.peek()? == Token::Punct(b'(') {
                self.expect(b'(')?;
                sig.returns = self.type_list()?;
            } else {
                let (ty, _) = self.ty()?;
                sig.returns.push(ty);
            }
        }
        match self.next_token()? {
            Token::Eof => Ok(sig),
            other => self.error(format!("trailing input {other:?}")),
        }
    }

    fn param(&mut self) -> Result<Argument, DeclarationError> {
        let (ty, arity) = self.ty()?;
        let name = self.ident()?;
        let mut arg = Argument::new(self.interner.intern(name), ty);
        if let Some(n) = arity {
            arg = arg.with_arity(n);
        }
        if self.eat(&Token::Punct(b'='))? {
            arg = arg.with_default(self.literal()?);
        }
        Ok(arg)
    }

    /// Types up to and including the closing `)`.
    fn type_list(&mut self) -> Result<Vec<Idx>, DeclarationError> {
        let mut types = Vec::new();
        if self.eat(&Token::Punct(b')'))? {
            return Ok(types);
        }
        loop {
            types.push(self.ty()?.0);
            if self.eat(&Token::Punct(b')'))? {
                return Ok(types);
            }
            self.expect(b',')?;
        }
    }

    /// A type and, for `T[N]`, its fixed arity.
    fn ty(&mut self) -> Result<(Idx, Option<u32>), DeclarationError> {
        let mut ty = match self.next_token()? {
            Token::Punct(b'(') => {
                let elems = self.type_list()?;
                self.pool.tuple(&elems)
            }
            Token::Ident("Future") => {
                self.expect(b'(')?;
                let (inner, _) = self.ty()?;
                self.expect(b')')?;
                self.pool.future(inner)
            }
            Token::Ident(name) => self.named_type(name),
            other => return self.error(format!("expected type, found {other:?}")),
        };
        let mut arity = None;
        loop {
            if self.eat(&Token::Punct(b'['))? {
                if let Token::Int(n) = self.peek()? {
                    self.next_token()?;
                    let Ok(n) = u32::try_from(n) else {
                        return self.error("list arity out of range");
                    };
                    arity = Some(n);
                }
                self.expect(b']')?;
                ty = self.pool.list(ty);
            } else if self.eat(&Token::Punct(b'?'))? {
                ty = self.pool.optional(ty);
            } else {
                return Ok((ty, arity));
            }
        }
    }

    fn named_type(&mut self, name: &str) -> Idx {
        match name {
            "Tensor" => Idx::TENSOR,
            "int" => Idx::INT,
            "float" => Idx::FLOAT,
            "bool" => Idx::BOOL,
            "str" => Idx::STR,
            "None" => Idx::NONE,
            "number" => Idx::NUMBER,
            "Device" => Idx::DEVICE,
            var => self.pool.var(var),
        }
    }

    fn literal(&mut self) -> Result<Constant, DeclarationError> {
        let negative = self.eat(&Token::Punct(b'-'))?;
        let constant = match self.next_token()? {
            Token::Int(i) => Constant::Int(i),
            Token::Float(f) => Constant::float(f),
            Token::Ident("True") => Constant::Bool(true),
            Token::Ident("False") => Constant::Bool(false),
            Token::Ident("None") => Constant::None,
            Token::Str(s) => Constant::Str(self.interner.intern(s)),
            other => return self.error(format!("expected default value, found {other:?}")),
        };
        if !negative {
            return Ok(constant);
        }
        match constant.negate() {
            Some(c) => Ok(c),
            None => self.error("only numbers can be negated"),
        }
    }
}
