//! The scene-construction interface.
//!
//! One method per request category, selected through the request catalog.
//! A handler may be a real renderer back-end, a validating no-op, or a
//! benchmarking no-op; swapping it never alters parser behavior. Every
//! method has a no-op default so implementations override only what they
//! consume.
//!
//! The dispatcher guarantees a request is fully decoded and validated
//! before any method here is invoked, and that calls within one session
//! are strictly sequential.

use crate::catalog::{AttributeOp, PrimitiveKind, ScopeKind, TransformOp};
use crate::declare::ParamDecl;
use crate::params::ParamList;
use crate::value::Value;

/// A handler's rejection of an otherwise valid request.
///
/// Surfaces to the caller as `HandlerError(request, cause)`; recoverable,
/// like any other per-request failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerFault {
    pub message: String,
}

impl HandlerFault {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

impl std::fmt::Display for HandlerFault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for HandlerFault {}

pub type HandlerResult = Result<(), HandlerFault>;

/// Receives validated scene-construction requests.
pub trait Handler {
    /// A bracketing scope opens: frame, world, attribute, transform,
    /// motion, object, solid. Positional arguments per the catalog
    /// (frame number, motion times, ...).
    fn begin_scope(&mut self, scope: ScopeKind, args: &[Value]) -> HandlerResult {
        let _ = (scope, args);
        Ok(())
    }

    /// The matching scope closes.
    fn end_scope(&mut self, scope: ScopeKind) -> HandlerResult {
        let _ = scope;
        Ok(())
    }

    /// A parameter type was declared. The registry has already recorded
    /// it; this is a notification.
    fn declare(&mut self, name: &str, decl: &ParamDecl) -> HandlerResult {
        let _ = (name, decl);
        Ok(())
    }

    /// Accumulate or replace the current transformation.
    fn transform(&mut self, op: TransformOp, args: &[Value]) -> HandlerResult {
        let _ = (op, args);
        Ok(())
    }

    /// Set an attribute: shading assignment, visibility, detail range.
    fn attribute(&mut self, op: AttributeOp, args: &[Value], params: &ParamList) -> HandlerResult {
        let _ = (op, args, params);
        Ok(())
    }

    /// Emit a geometric primitive.
    fn primitive(&mut self, shape: PrimitiveKind, args: &[Value], params: &ParamList) -> HandlerResult {
        let _ = (shape, args, params);
        Ok(())
    }
}

/// Discards every request. Useful for validation-only and throughput runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullHandler;

impl Handler for NullHandler {}
