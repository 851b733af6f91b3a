//! RSD Core Parser
//!
//! Streaming request parser and dispatcher for RSD (Render Scene
//! Description) streams. Tokenizes both wire encodings, validates each
//! request against the static catalog and the session's declaration
//! registry, and dispatches typed calls to a pluggable [`Handler`] -
//! without ever letting one malformed request abort the stream.
//!
//! # Architecture
//!
//! - **lexer.rs** - dual-mode tokenizer (text + packed binary)
//! - **input.rs** - nested input stack for archive inclusion
//! - **catalog.rs** - static request catalog
//! - **declare.rs** - parameter declarations and registry
//! - **params.rs** - parameter-list validation
//! - **session.rs** - dispatcher state machine and fault isolation
//!
//! # Example
//!
//! ```
//! use rsd_core::{NullHandler, Session};
//!
//! let stream = b"WorldBegin\nSphere 1 -1 1 360 \"Cs\" [1 0 0 0 1 0 0 0 1 1 1 1]\nWorldEnd\n";
//! let resolver = rsd_core::resolver_fn(|name: &str| {
//!     Err(std::io::Error::new(std::io::ErrorKind::NotFound, name))
//! });
//!
//! let mut session = Session::new(NullHandler, resolver);
//! session.push_root(Box::new(&stream[..]), "inline").unwrap();
//! let summary = session.run();
//! assert_eq!(summary.dispatched, 3);
//! ```

pub mod catalog;
pub mod declare;
pub mod error;
pub mod handler;
pub mod input;
pub mod lexer;
pub mod params;
pub mod session;
pub mod span;
pub mod token;
pub mod value;

pub use catalog::{
    ArgType, Arity, AttributeOp, ClassCounts, PrimitiveKind, RequestDescriptor, RequestKind,
    ScopeKind, TransformOp, ARCHIVE_REQUEST,
};
pub use declare::{Declarations, ElementType, ParamDecl, StorageClass};
pub use error::{Diagnostic, LexicalCause, ParseError, Severity};
pub use handler::{Handler, HandlerFault, HandlerResult, NullHandler};
pub use input::{resolver_fn, ArchiveResolver, FileResolver, InputStack, ResolverFn};
pub use lexer::{Lexer, Mode};
pub use params::{Param, ParamList};
pub use session::{Options, Outcome, Session, State, Step, Summary};
pub use span::{Location, Span};
pub use token::Token;
pub use value::{ParamValues, Value};
