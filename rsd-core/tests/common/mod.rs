//! Shared harness for integration tests: a recording handler, an
//! in-memory archive resolver, and binary stream builders.
#![allow(dead_code)]

use std::collections::HashMap;
use std::io::Read;

use rsd_core::{
    ArchiveResolver, AttributeOp, Handler, HandlerFault, HandlerResult, NullHandler, ParamDecl,
    ParamList, ParamValues, PrimitiveKind, ScopeKind, Session, TransformOp, Value,
};

/// One recorded handler invocation, reduced for comparison (parameter
/// lists become name/payload pairs, declarations their display form).
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Begin(ScopeKind, Vec<Value>),
    End(ScopeKind),
    Declare(String, String),
    Transform(TransformOp, Vec<Value>),
    Attribute(AttributeOp, Vec<Value>, Vec<(String, ParamValues)>),
    Primitive(PrimitiveKind, Vec<Value>, Vec<(String, ParamValues)>),
}

fn reduce(params: &ParamList) -> Vec<(String, ParamValues)> {
    params.iter().map(|p| (p.name.clone(), p.values.clone())).collect()
}

/// Records every call; optionally rejects chosen primitives so tests can
/// exercise handler-fault isolation.
#[derive(Debug, Default)]
pub struct RecordingHandler {
    pub calls: Vec<Call>,
    pub reject_primitive: Option<PrimitiveKind>,
}

impl RecordingHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rejecting(shape: PrimitiveKind) -> Self {
        Self { calls: Vec::new(), reject_primitive: Some(shape) }
    }
}

impl Handler for RecordingHandler {
    fn begin_scope(&mut self, scope: ScopeKind, args: &[Value]) -> HandlerResult {
        self.calls.push(Call::Begin(scope, args.to_vec()));
        Ok(())
    }

    fn end_scope(&mut self, scope: ScopeKind) -> HandlerResult {
        self.calls.push(Call::End(scope));
        Ok(())
    }

    fn declare(&mut self, name: &str, decl: &ParamDecl) -> HandlerResult {
        self.calls.push(Call::Declare(name.to_string(), decl.to_string()));
        Ok(())
    }

    fn transform(&mut self, op: TransformOp, args: &[Value]) -> HandlerResult {
        self.calls.push(Call::Transform(op, args.to_vec()));
        Ok(())
    }

    fn attribute(&mut self, op: AttributeOp, args: &[Value], params: &ParamList) -> HandlerResult {
        self.calls.push(Call::Attribute(op, args.to_vec(), reduce(params)));
        Ok(())
    }

    fn primitive(
        &mut self,
        shape: PrimitiveKind,
        args: &[Value],
        params: &ParamList,
    ) -> HandlerResult {
        if self.reject_primitive == Some(shape) {
            return Err(HandlerFault::new("rejected by test handler"));
        }
        self.calls.push(Call::Primitive(shape, args.to_vec(), reduce(params)));
        Ok(())
    }
}

/// Resolves archive names from an in-memory map.
#[derive(Debug, Default, Clone)]
pub struct MapResolver {
    archives: HashMap<String, Vec<u8>>,
}

impl MapResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, bytes: impl Into<Vec<u8>>) -> Self {
        self.archives.insert(name.to_string(), bytes.into());
        self
    }
}

impl ArchiveResolver for MapResolver {
    fn resolve(&mut self, name: &str) -> std::io::Result<(Box<dyn Read>, String)> {
        match self.archives.get(name) {
            Some(bytes) => Ok((
                Box::new(std::io::Cursor::new(bytes.clone())),
                name.to_string(),
            )),
            None => Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("no archive {name}"),
            )),
        }
    }
}

/// Build a recording session over an in-memory root stream.
pub fn session_over(
    input: impl Into<Vec<u8>>,
    resolver: MapResolver,
) -> Session<RecordingHandler, MapResolver> {
    let mut session = Session::new(RecordingHandler::new(), resolver);
    session
        .push_root(Box::new(std::io::Cursor::new(input.into())), "root")
        .expect("push root");
    session
}

/// Parse a stream to exhaustion and return the recorded calls.
pub fn trace(input: impl Into<Vec<u8>>, resolver: MapResolver) -> Vec<Call> {
    let mut session = session_over(input, resolver);
    let summary = session.run();
    assert_eq!(summary.failed, 0, "unexpected failures: {:?}", session.diagnostics());
    session.into_handler().calls
}

/// Parse with a discarding handler, returning the summary.
pub fn null_parse(input: impl Into<Vec<u8>>) -> rsd_core::Summary {
    let mut session = Session::new(NullHandler, MapResolver::new());
    session
        .push_root(Box::new(std::io::Cursor::new(input.into())), "root")
        .expect("push root");
    session.run()
}

/// Binary stream builders over the documented tag layout.
pub mod bin {
    use rsd_core::lexer::tags;

    pub fn symbol(out: &mut Vec<u8>, name: &str) {
        out.push(tags::SYMBOL);
        out.extend_from_slice(&(name.len() as u32).to_be_bytes());
        out.extend_from_slice(name.as_bytes());
    }

    pub fn string(out: &mut Vec<u8>, value: &str) {
        out.push(tags::STRING);
        out.extend_from_slice(&(value.len() as u32).to_be_bytes());
        out.extend_from_slice(value.as_bytes());
    }

    pub fn int(out: &mut Vec<u8>, value: i32) {
        out.push(tags::INTEGER);
        out.extend_from_slice(&value.to_be_bytes());
    }

    pub fn float(out: &mut Vec<u8>, value: f64) {
        out.push(tags::FLOAT);
        out.extend_from_slice(&value.to_be_bytes());
    }

    pub fn floats(out: &mut Vec<u8>, values: &[f64]) {
        out.push(tags::ARRAY_OPEN);
        for &v in values {
            float(out, v);
        }
        out.push(tags::ARRAY_CLOSE);
    }
}
