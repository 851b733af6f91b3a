//! Parse an inline scene and print the dispatched requests.
//!
//! Run with: cargo run --example simple_parse

use rsd_core::{
    AttributeOp, Handler, HandlerResult, ParamList, PrimitiveKind, ScopeKind, Session,
    TransformOp, Value,
};

struct PrintHandler;

impl Handler for PrintHandler {
    fn begin_scope(&mut self, scope: ScopeKind, args: &[Value]) -> HandlerResult {
        println!("begin {scope:?} {args:?}");
        Ok(())
    }

    fn end_scope(&mut self, scope: ScopeKind) -> HandlerResult {
        println!("end {scope:?}");
        Ok(())
    }

    fn transform(&mut self, op: TransformOp, args: &[Value]) -> HandlerResult {
        println!("transform {op:?} {args:?}");
        Ok(())
    }

    fn attribute(&mut self, op: AttributeOp, args: &[Value], params: &ParamList) -> HandlerResult {
        println!("attribute {op:?} {args:?} ({} params)", params.len());
        Ok(())
    }

    fn primitive(
        &mut self,
        shape: PrimitiveKind,
        args: &[Value],
        params: &ParamList,
    ) -> HandlerResult {
        println!("primitive {shape:?} {args:?} ({} params)", params.len());
        Ok(())
    }
}

const SCENE: &[u8] = br#"
# a minimal scene
FrameBegin 1
WorldBegin
Translate 0 0 -5
Surface "plastic" "Kd" [0.7]
Sphere 1 -1 1 360 "Cs" [1 0 0 0 1 0 0 0 1 1 1 1]
WorldEnd
FrameEnd
"#;

fn main() {
    let resolver = rsd_core::resolver_fn(|name: &str| {
        Err(std::io::Error::new(std::io::ErrorKind::NotFound, name.to_string()))
    });

    let mut session = Session::new(PrintHandler, resolver);
    session
        .push_root(Box::new(SCENE), "inline")
        .expect("push root");

    let summary = session.run();
    println!(
        "dispatched {} request(s), {} failed",
        summary.dispatched, summary.failed
    );
    for diagnostic in session.diagnostics() {
        eprintln!("warning: {diagnostic}");
    }
}
