//! Integration tests for well-formed streams: the handler invocation
//! sequence must exactly match the request sequence, with positional and
//! named parameters decoded to the expected values.

mod common;

use common::{session_over, trace, Call, MapResolver};
use pretty_assertions::assert_eq;
use rsd_core::{
    AttributeOp, Outcome, ParamValues, PrimitiveKind, ScopeKind, State, Step, TransformOp, Value,
};

#[test]
fn empty_input_exhausts_with_no_calls() {
    let mut session = session_over("", MapResolver::new());
    assert_eq!(session.parse_next(), Step::Exhausted);
    assert_eq!(session.state(), State::Exhausted);
    assert!(session.into_handler().calls.is_empty());
}

#[test]
fn world_with_sphere() {
    let calls = trace(
        "WorldBegin\nSphere 1 -1 1 360\nWorldEnd\n",
        MapResolver::new(),
    );
    assert_eq!(
        calls,
        vec![
            Call::Begin(ScopeKind::World, vec![]),
            Call::Primitive(
                PrimitiveKind::Sphere,
                vec![
                    Value::Float(1.0),
                    Value::Float(-1.0),
                    Value::Float(1.0),
                    Value::Float(360.0),
                ],
                vec![],
            ),
            Call::End(ScopeKind::World),
        ]
    );
}

#[test]
fn positional_decoding() {
    let calls = trace(
        "FrameBegin 4\nTranslate 0 0.5 -3\nMotionBegin [0 0.5]\nMotionEnd\nFrameEnd\n",
        MapResolver::new(),
    );
    assert_eq!(
        calls,
        vec![
            Call::Begin(ScopeKind::Frame, vec![Value::Integer(4)]),
            Call::Transform(
                TransformOp::Translate,
                vec![Value::Float(0.0), Value::Float(0.5), Value::Float(-3.0)],
            ),
            Call::Begin(
                ScopeKind::Motion,
                vec![Value::Array(vec![Value::Float(0.0), Value::Float(0.5)])],
            ),
            Call::End(ScopeKind::Motion),
            Call::End(ScopeKind::Frame),
        ]
    );
}

#[test]
fn transform_matrix() {
    let calls = trace(
        "ConcatTransform [1 0 0 0 0 1 0 0 0 0 1 0 0 0 0 1]\n",
        MapResolver::new(),
    );
    match &calls[0] {
        Call::Transform(TransformOp::ConcatTransform, args) => {
            let matrix = args[0].as_array().unwrap();
            assert_eq!(matrix.len(), 16);
            assert_eq!(matrix[0], Value::Float(1.0));
        }
        other => panic!("unexpected call {other:?}"),
    }
}

#[test]
fn surface_with_registry_params() {
    let calls = trace(
        "Surface \"plastic\" \"Kd\" [0.8] \"specularcolor\" [1 1 0.9]\n",
        MapResolver::new(),
    );
    assert_eq!(
        calls,
        vec![Call::Attribute(
            AttributeOp::Surface,
            vec![Value::String("plastic".to_string())],
            vec![
                ("Kd".to_string(), ParamValues::Floats(vec![0.8])),
                (
                    "specularcolor".to_string(),
                    ParamValues::Floats(vec![1.0, 1.0, 0.9])
                ),
            ],
        )]
    );
}

#[test]
fn inline_declaration_not_persisted() {
    // The inline spec types this one request; the name stays undeclared.
    let input = "Surface \"a\" \"uniform float gain\" [2.0]\nSurface \"b\" \"gain\" [2.0]\n";
    let mut session = session_over(input, MapResolver::new());
    assert!(matches!(session.parse_next(), Step::Dispatched { .. }));
    assert!(matches!(
        session.parse_next(),
        Step::Recovered { error: rsd_core::ParseError::UndeclaredParameter { .. } }
    ));
}

#[test]
fn declared_parameter_dispatches_typed() {
    let calls = trace(
        "Declare \"intensity\" \"uniform float\"\nLightSource \"pointlight\" 1 \"intensity\" [2.5]\n",
        MapResolver::new(),
    );
    assert_eq!(
        calls,
        vec![
            Call::Declare("intensity".to_string(), "uniform float".to_string()),
            Call::Attribute(
                AttributeOp::LightSource,
                vec![Value::String("pointlight".to_string()), Value::Integer(1)],
                vec![("intensity".to_string(), ParamValues::Floats(vec![2.5]))],
            ),
        ]
    );
}

#[test]
fn polygon_varying_counts() {
    // Three vertices: P wants 3 x 3 scalars, Cs (varying color) 3 x 3.
    let calls = trace(
        "Polygon 3 \"P\" [0 0 0 1 0 0 0 1 0] \"Cs\" [1 0 0 0 1 0 0 0 1]\n",
        MapResolver::new(),
    );
    match &calls[0] {
        Call::Primitive(PrimitiveKind::Polygon, args, params) => {
            assert_eq!(args, &[Value::Integer(3)]);
            assert_eq!(params[0].1.len(), 9);
            assert_eq!(params[1].1.len(), 9);
        }
        other => panic!("unexpected call {other:?}"),
    }
}

#[test]
fn patch_basis_selects_vertex_count() {
    let bilinear_p = "0 0 0 1 0 0 0 1 0 1 1 0";
    let calls = trace(
        format!("Patch \"bilinear\" \"P\" [{bilinear_p}]\n"),
        MapResolver::new(),
    );
    assert!(matches!(&calls[0], Call::Primitive(PrimitiveKind::Patch, _, _)));

    // Bicubic wants 16 vertex points; 4 is a count mismatch.
    let summary = common::null_parse(format!("Patch \"bicubic\" \"P\" [{bilinear_p}]\n"));
    assert_eq!(summary.failed, 1);
}

#[test]
fn scalar_shorthand_and_string_params() {
    let calls = trace(
        "Attribute \"displacementbound\" \"uniform string coordinatesystem\" \"shader\" \"Kd\" 0.5\n",
        MapResolver::new(),
    );
    assert_eq!(
        calls,
        vec![Call::Attribute(
            AttributeOp::Attribute,
            vec![Value::String("displacementbound".to_string())],
            vec![
                (
                    "coordinatesystem".to_string(),
                    ParamValues::Strings(vec!["shader".to_string()])
                ),
                ("Kd".to_string(), ParamValues::Floats(vec![0.5])),
            ],
        )]
    );
}

#[test]
fn comments_are_invisible() {
    let with = "# scene header\nWorldBegin # open\n# nothing\nWorldEnd\n";
    let without = "WorldBegin\nWorldEnd\n";
    assert_eq!(
        trace(with, MapResolver::new()),
        trace(without, MapResolver::new())
    );
}

#[test]
fn reparsing_is_deterministic() {
    let input = "WorldBegin\nColor [1 0.5 0]\nSphere 1 -1 1 360 \"Cs\" [1 0 0 0 1 0 0 0 1 1 1 1]\nWorldEnd\n";
    let first = trace(input, MapResolver::new());
    let second = trace(input, MapResolver::new());
    assert_eq!(first, second);
    assert_eq!(first.len(), 4);
}

#[test]
fn end_to_end_scenario() {
    // Declaration, a primitive referencing it, then an included archive
    // with one further primitive; the trace interleaves in stream order.
    let resolver = MapResolver::new().with("side.rsd", "Disk 0 1 360\n");
    let input = "Declare \"intensity\" \"uniform float\"\n\
                 Sphere 1 -1 1 360 \"intensity\" [2.5]\n\
                 ReadArchive \"side.rsd\"\n";

    let mut session = session_over(input, resolver);
    let summary = session.run();
    assert_eq!(summary.outcome, Outcome::Exhausted);
    assert_eq!(summary.failed, 0);
    assert_eq!(session.state(), State::Exhausted);

    let calls = session.into_handler().calls;
    assert_eq!(
        calls,
        vec![
            Call::Declare("intensity".to_string(), "uniform float".to_string()),
            Call::Primitive(
                PrimitiveKind::Sphere,
                vec![
                    Value::Float(1.0),
                    Value::Float(-1.0),
                    Value::Float(1.0),
                    Value::Float(360.0),
                ],
                vec![("intensity".to_string(), ParamValues::Floats(vec![2.5]))],
            ),
            Call::Primitive(
                PrimitiveKind::Disk,
                vec![Value::Float(0.0), Value::Float(1.0), Value::Float(360.0)],
                vec![],
            ),
        ]
    );
}
