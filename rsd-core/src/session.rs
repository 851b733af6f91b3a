//! The parse session: dispatcher state machine and fault isolation.
//!
//! A session owns all of its mutable state - input stack, declaration
//! registry, lookahead slot, diagnostics - so concurrent sessions share
//! nothing but the static catalog. One request cycle reads a symbol,
//! looks it up, decodes positionals, validates the parameter list, and
//! only then invokes the handler: a request is either fully
//! decoded-and-dispatched or not dispatched at all.
//!
//! Every per-request failure is recorded and parsing resumes at the next
//! request boundary; one malformed request must never abort a
//! multi-thousand-request stream. Only boundary-destroying lexical faults
//! end the session.

use std::io::Read;

use log::{error, warn};

use crate::catalog::{self, ArgType, RequestDescriptor, RequestKind};
use crate::declare::{Declarations, ParamDecl};
use crate::error::{Diagnostic, LexicalCause, ParseError};
use crate::handler::Handler;
use crate::input::{ArchiveResolver, InputStack};
use crate::lexer::{PeekableTokens, TokenStream};
use crate::params::{self, ParamList};
use crate::span::Location;
use crate::token::Token;
use crate::value::Value;

/// Session tuning knobs.
#[derive(Debug, Clone, Copy)]
pub struct Options {
    /// Maximum inclusion nesting depth.
    pub max_include_depth: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self { max_include_depth: 32 }
    }
}

/// Dispatcher state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// No input pushed yet.
    Idle,
    /// A request loop is active.
    StreamActive,
    /// Terminal: all input consumed.
    Exhausted,
    /// Terminal: a fatal fault ended the session.
    Error,
}

/// Outcome of one dispatch cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// One request was validated and dispatched (inclusion counts).
    Dispatched { request: &'static str },
    /// A recoverable fault was recorded; parsing already resynchronized.
    Recovered { error: ParseError },
    /// All input consumed; terminal.
    Exhausted,
    /// Fatal fault; terminal.
    Fatal { error: ParseError },
}

/// How a finished session ended.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Exhausted,
    Fatal(ParseError),
}

/// End-of-parse accounting: nothing is silently swallowed.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    /// Requests that reached the handler (or pushed an archive).
    pub dispatched: u64,
    /// Requests lost to recoverable faults.
    pub failed: u64,
    pub outcome: Outcome,
}

/// A parse session bound to a handler and an archive resolver.
pub struct Session<H, R> {
    handler: H,
    resolver: R,
    inputs: InputStack,
    decls: Declarations,
    /// One-token lookahead, shared by the request loop and the validator.
    pending: Option<Token>,
    state: State,
    diagnostics: Vec<Diagnostic>,
    dispatched: u64,
    failed: u64,
    fatal: Option<ParseError>,
}

impl<H: Handler, R: ArchiveResolver> Session<H, R> {
    /// Create a session with default options.
    pub fn new(handler: H, resolver: R) -> Self {
        Self::with_options(handler, resolver, Options::default())
    }

    pub fn with_options(handler: H, resolver: R, options: Options) -> Self {
        Self {
            handler,
            resolver,
            inputs: InputStack::new(options.max_include_depth),
            decls: Declarations::with_standard(),
            pending: None,
            state: State::Idle,
            diagnostics: Vec::new(),
            dispatched: 0,
            failed: 0,
            fatal: None,
        }
    }

    /// Push the root input and activate the stream.
    pub fn push_root(
        &mut self,
        source: Box<dyn Read>,
        name: impl Into<String>,
    ) -> Result<(), ParseError> {
        self.inputs.push(source, name)?;
        self.state = State::StreamActive;
        Ok(())
    }

    /// Current dispatcher state.
    #[inline]
    pub fn state(&self) -> State {
        self.state
    }

    /// Every failure recorded so far, queryable at any time.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Requests dispatched so far.
    pub fn dispatched(&self) -> u64 {
        self.dispatched
    }

    /// Requests lost to recoverable faults so far.
    pub fn failed(&self) -> u64 {
        self.failed
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub fn handler_mut(&mut self) -> &mut H {
        &mut self.handler
    }

    /// Tear down the session, returning the handler.
    pub fn into_handler(self) -> H {
        self.handler
    }

    /// Advance by one request.
    pub fn parse_next(&mut self) -> Step {
        match self.state {
            State::Idle | State::Exhausted => return Step::Exhausted,
            State::Error => {
                let error = self.fatal.clone().expect("error state has a fatal fault");
                return Step::Fatal { error };
            }
            State::StreamActive => {}
        }

        loop {
            let token = match self.next_token() {
                Ok(token) => token,
                Err(e) => return self.fault(e),
            };
            match token {
                Token::EndOfInput { .. } => {
                    self.inputs.pop();
                    if self.inputs.is_empty() {
                        self.state = State::Exhausted;
                        return Step::Exhausted;
                    }
                }
                Token::Symbol { name, .. } => {
                    return match self.handle_request(&name) {
                        Ok(request) => {
                            self.dispatched += 1;
                            Step::Dispatched { request }
                        }
                        Err(e) => self.fault(e),
                    };
                }
                other => {
                    // A request boundary must be a symbol.
                    let e = ParseError::TypeMismatch {
                        param: "<request>".to_string(),
                        expected: "symbol",
                        got: other.kind_name(),
                    };
                    return self.fault(e);
                }
            }
        }
    }

    /// Drain the stream, returning the final accounting.
    pub fn run(&mut self) -> Summary {
        loop {
            match self.parse_next() {
                Step::Dispatched { .. } | Step::Recovered { .. } => {}
                Step::Exhausted => {
                    return Summary {
                        dispatched: self.dispatched,
                        failed: self.failed,
                        outcome: Outcome::Exhausted,
                    };
                }
                Step::Fatal { error } => {
                    return Summary {
                        dispatched: self.dispatched,
                        failed: self.failed,
                        outcome: Outcome::Fatal(error),
                    };
                }
            }
        }
    }

    // ======================== request cycle ========================

    /// One recognized request: decode, validate, dispatch.
    fn handle_request(&mut self, name: &str) -> Result<&'static str, ParseError> {
        let desc = catalog::lookup(name).ok_or_else(|| ParseError::UnknownRequest {
            name: name.to_string(),
        })?;

        let args = {
            let ctx = self.inputs.current_mut().expect("stream active");
            let mut tokens = PeekableTokens::new(&mut ctx.lexer, &mut self.pending);
            read_positionals(&mut tokens, desc)?
        };

        let params = if desc.params {
            let counts = desc.arity.counts(&args);
            let ctx = self.inputs.current_mut().expect("stream active");
            let mut tokens = PeekableTokens::new(&mut ctx.lexer, &mut self.pending);
            params::validate(&mut tokens, &self.decls, desc.name, counts)?
        } else {
            ParamList::default()
        };

        match desc.kind {
            RequestKind::Archive => {
                let target = args[0].as_str().expect("positional type checked");
                self.include(target)?;
            }
            RequestKind::Declare => {
                let decl_name = args[0].as_str().expect("positional type checked");
                let spec = args[1].as_str().expect("positional type checked");
                let decl = ParamDecl::parse(spec).ok_or_else(|| ParseError::TypeMismatch {
                    param: decl_name.to_string(),
                    expected: "type specification",
                    got: "string",
                })?;
                self.decls.declare(decl_name, decl);
                self.handler
                    .declare(decl_name, &decl)
                    .map_err(|f| ParseError::HandlerError {
                        request: desc.name,
                        cause: f.message,
                    })?;
            }
            RequestKind::Begin(scope) => self.forward(desc, |h| h.begin_scope(scope, &args))?,
            RequestKind::End(scope) => self.forward(desc, |h| h.end_scope(scope))?,
            RequestKind::Transform(op) => self.forward(desc, |h| h.transform(op, &args))?,
            RequestKind::Attribute(op) => {
                self.forward(desc, |h| h.attribute(op, &args, &params))?
            }
            RequestKind::Primitive(shape) => {
                self.forward(desc, |h| h.primitive(shape, &args, &params))?
            }
        }

        Ok(desc.name)
    }

    /// Invoke the handler, converting its rejection into `HandlerError`.
    fn forward(
        &mut self,
        desc: &'static RequestDescriptor,
        call: impl FnOnce(&mut H) -> crate::handler::HandlerResult,
    ) -> Result<(), ParseError> {
        call(&mut self.handler).map_err(|f| ParseError::HandlerError {
            request: desc.name,
            cause: f.message,
        })
    }

    /// Resolve and push an included archive.
    fn include(&mut self, target: &str) -> Result<(), ParseError> {
        let (source, display) = self
            .resolver
            .resolve(target)
            .map_err(|_| ParseError::ArchiveUnavailable { name: target.to_string() })?;
        debug_assert!(self.pending.is_none(), "lookahead must not cross sources");
        self.inputs.push(source, display)
    }

    // ======================== faults & recovery ========================

    /// Record a fault, then either resynchronize or end the session.
    fn fault(&mut self, error: ParseError) -> Step {
        let diagnostic = Diagnostic {
            error: error.clone(),
            location: self.current_location(&error),
        };
        if error.is_fatal() {
            error!("{diagnostic}");
            self.diagnostics.push(diagnostic);
            self.state = State::Error;
            self.fatal = Some(error.clone());
            return Step::Fatal { error };
        }

        warn!("{diagnostic}");
        self.diagnostics.push(diagnostic);
        self.failed += 1;
        if let Err(fatal) = self.resync() {
            return self.fault(fatal);
        }
        Step::Recovered { error }
    }

    /// Discard tokens until the next symbol naming a known request, or
    /// end-of-input. Malformed streams have no reliable request boundary
    /// marker, so this is best-effort.
    fn resync(&mut self) -> Result<(), ParseError> {
        loop {
            let ctx = match self.inputs.current_mut() {
                Some(ctx) => ctx,
                None => return Ok(()),
            };
            let mut tokens = PeekableTokens::new(&mut ctx.lexer, &mut self.pending);
            match tokens.peek_token() {
                Ok(Token::Symbol { name, .. }) if catalog::is_request(name) => return Ok(()),
                Ok(Token::EndOfInput { .. }) => return Ok(()),
                Ok(_) => {
                    tokens.next_token()?;
                }
                Err(e) if e.is_fatal() => return Err(e),
                // Recoverable lexical noise: keep scanning.
                Err(_) => {}
            }
        }
    }

    fn next_token(&mut self) -> Result<Token, ParseError> {
        let ctx = self.inputs.current_mut().expect("stream active");
        PeekableTokens::new(&mut ctx.lexer, &mut self.pending).next_token()
    }

    /// Where to pin a diagnostic: the error's own offset for lexical
    /// faults, the current read position otherwise.
    fn current_location(&self, error: &ParseError) -> Location {
        let mut location = match self.inputs.current() {
            Some(ctx) => ctx.location(),
            None => Location { source: "<session>".to_string(), offset: 0 },
        };
        if let ParseError::Lexical { offset, .. } = error {
            location.offset = *offset;
        }
        location
    }
}

/// Decode a request's fixed positional arguments.
fn read_positionals(
    tokens: &mut impl TokenStream,
    desc: &'static RequestDescriptor,
) -> Result<Vec<Value>, ParseError> {
    let mut args = Vec::with_capacity(desc.args.len());
    for (i, &arg) in desc.args.iter().enumerate() {
        let value = read_positional(tokens, desc, i, arg)?;
        args.push(value);
    }
    Ok(args)
}

fn read_positional(
    tokens: &mut impl TokenStream,
    desc: &'static RequestDescriptor,
    index: usize,
    arg: ArgType,
) -> Result<Value, ParseError> {
    let mismatch = |got: &'static str| ParseError::TypeMismatch {
        param: format!("{} positional {}", desc.name, index + 1),
        expected: arg.name(),
        got,
    };

    // A request symbol here means the argument list was cut short;
    // report without consuming, so the symbol survives resynchronization.
    if tokens.peek_token()?.is_symbol() {
        return Err(mismatch("symbol"));
    }

    match arg {
        ArgType::Int => match tokens.next_token()? {
            Token::Integer { value, .. } => Ok(Value::Integer(value)),
            other => Err(mismatch(other.kind_name())),
        },
        ArgType::Float => match tokens.next_token()? {
            Token::Float { value, .. } => Ok(Value::Float(value)),
            Token::Integer { value, .. } => Ok(Value::Float(value as f64)),
            other => Err(mismatch(other.kind_name())),
        },
        ArgType::Str => match tokens.next_token()? {
            Token::Str { value, .. } => Ok(Value::String(value)),
            other => Err(mismatch(other.kind_name())),
        },
        ArgType::Floats(required) => {
            let open = match tokens.next_token()? {
                Token::ArrayOpen { span } => span.start,
                other => return Err(mismatch(other.kind_name())),
            };
            let mut items = Vec::new();
            loop {
                match tokens.next_token()? {
                    Token::ArrayClose { .. } => break,
                    Token::Float { value, .. } => items.push(Value::Float(value)),
                    Token::Integer { value, .. } => items.push(Value::Float(value as f64)),
                    Token::EndOfInput { .. } => {
                        return Err(ParseError::Lexical {
                            offset: open,
                            cause: LexicalCause::UnclosedArray,
                        });
                    }
                    other => return Err(mismatch(other.kind_name())),
                }
            }
            if required > 0 && items.len() != required as usize {
                return Err(ParseError::ParameterCountMismatch {
                    request: desc.name,
                    param: format!("positional {}", index + 1),
                    expected: required as usize,
                    got: items.len(),
                });
            }
            Ok(Value::Array(items))
        }
    }
}
