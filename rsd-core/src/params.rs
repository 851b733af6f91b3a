//! The parameter validator.
//!
//! Resolves the trailing name/array token stream of a request into a typed
//! parameter list. Each entry is a name token followed by its values; the
//! name either carries an inline type specification (`"uniform float Kd"`,
//! transient, not persisted) or is resolved through the declaration
//! registry. Element kinds and counts are enforced here, before the
//! handler ever sees the request.

use crate::catalog::ClassCounts;
use crate::declare::{Declarations, ElementType, ParamDecl};
use crate::error::{LexicalCause, ParseError};
use crate::lexer::TokenStream;
use crate::token::Token;
use crate::value::ParamValues;

/// One validated parameter: name, declaration, decoded payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub decl: ParamDecl,
    pub values: ParamValues,
}

/// An ordered name-to-payload mapping, as validated for one request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamList {
    params: Vec<Param>,
}

impl ParamList {
    /// Look up a parameter by name.
    pub fn get(&self, name: &str) -> Option<&Param> {
        self.params.iter().find(|p| p.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Param> {
        self.params.iter()
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

/// Validate a request's trailing parameter list.
///
/// Reads name/value pairs until the next token is a symbol (the following
/// request) or end-of-input; that token is left pending for the caller.
pub fn validate(
    tokens: &mut impl TokenStream,
    decls: &Declarations,
    request: &'static str,
    counts: ClassCounts,
) -> Result<ParamList, ParseError> {
    let mut list = ParamList::default();

    loop {
        if matches!(
            tokens.peek_token()?,
            Token::Symbol { .. } | Token::EndOfInput { .. }
        ) {
            return Ok(list);
        }

        let token = tokens.next_token()?;
        let text = match token {
            Token::Str { value, .. } => value,
            other => {
                return Err(ParseError::TypeMismatch {
                    param: "<parameter name>".to_string(),
                    expected: "string",
                    got: other.kind_name(),
                });
            }
        };

        // Inline specification first; otherwise the registry decides.
        let (decl, name) = match ParamDecl::parse_inline(&text) {
            Some((decl, name)) => (decl, name),
            None => match decls.lookup(&text) {
                Some(&decl) => (decl, text),
                None => return Err(ParseError::UndeclaredParameter { name: text }),
            },
        };

        let values = read_values(tokens, &name, decl.ty)?;

        let expected = counts.for_class(decl.class) * decl.scalars_per_element();
        if values.len() != expected {
            return Err(ParseError::ParameterCountMismatch {
                request,
                param: name,
                expected,
                got: values.len(),
            });
        }

        list.params.push(Param { name, decl, values });
    }
}

/// Decode a parameter payload: a bracketed array, or a lone scalar as the
/// one-element shorthand.
fn read_values(
    tokens: &mut impl TokenStream,
    param: &str,
    ty: ElementType,
) -> Result<ParamValues, ParseError> {
    let mut acc = Accumulator::new(ty);

    match tokens.peek_token()? {
        Token::ArrayOpen { .. } => {
            let open_offset = tokens.next_token()?.span().start;
            loop {
                let token = tokens.next_token()?;
                match token {
                    Token::ArrayClose { .. } => return Ok(acc.finish()),
                    Token::EndOfInput { .. } => {
                        return Err(ParseError::Lexical {
                            offset: open_offset,
                            cause: LexicalCause::UnclosedArray,
                        });
                    }
                    other => acc.push(param, other)?,
                }
            }
        }
        // A request boundary where values belong: report without
        // consuming, so the following request survives recovery.
        Token::Symbol { .. } => Err(ParseError::TypeMismatch {
            param: param.to_string(),
            expected: ty.name(),
            got: "symbol",
        }),
        Token::EndOfInput { .. } => Err(ParseError::TypeMismatch {
            param: param.to_string(),
            expected: ty.name(),
            got: "end of input",
        }),
        _ => {
            let token = tokens.next_token()?;
            acc.push(param, token)?;
            Ok(acc.finish())
        }
    }
}

/// Collects scalars of one element kind, rejecting strays.
struct Accumulator {
    ty: ElementType,
    values: ParamValues,
}

impl Accumulator {
    fn new(ty: ElementType) -> Self {
        let values = match ty {
            ElementType::Integer => ParamValues::Integers(Vec::new()),
            ElementType::String => ParamValues::Strings(Vec::new()),
            _ => ParamValues::Floats(Vec::new()),
        };
        Self { ty, values }
    }

    fn push(&mut self, param: &str, token: Token) -> Result<(), ParseError> {
        match (&mut self.values, token) {
            (ParamValues::Integers(v), Token::Integer { value, .. }) => v.push(value),
            // Integers promote into float payloads; nothing else promotes.
            (ParamValues::Floats(v), Token::Integer { value, .. }) => v.push(value as f64),
            (ParamValues::Floats(v), Token::Float { value, .. }) => v.push(value),
            (ParamValues::Strings(v), Token::Str { value, .. }) => v.push(value),
            (_, other) => {
                return Err(ParseError::TypeMismatch {
                    param: param.to_string(),
                    expected: self.ty.name(),
                    got: other.kind_name(),
                });
            }
        }
        Ok(())
    }

    fn finish(self) -> ParamValues {
        self.values
    }
}
