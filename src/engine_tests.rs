//! Pipeline edge cases for the template engine
//!
//! Covers optional-step short-circuiting, soft failures and their
//! diagnostics, the final-string modifier, and native type propagation.

#[cfg(test)]
mod tests {
    use crate::diagnostics::{DiagnosticKind, MemorySink};
    use crate::engine::TemplaEngine;
    use crate::macros::{Constant, Invocation, LazyLoad, ParameterPolicy};
    use crate::modifiers::{AsString, FnModifier, JsonSubString, Modifier, Uppercase};
    use crate::node::Node;
    use crate::value::{Value, ValueError};
    use serde_json::json;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Rejecting;

    impl Modifier for Rejecting {
        fn transform(&self, _value: Value) -> Result<Value, ValueError> {
            Err(ValueError::out_of_domain("object"))
        }

        fn output_type(&self) -> &str {
            "object"
        }
    }

    fn counting(counter: &Arc<AtomicUsize>) -> FnModifier {
        let counter = Arc::clone(counter);
        FnModifier::new(
            move |value| {
                counter.fetch_add(1, Ordering::SeqCst);
                value
            },
            "string|int|float|bool|null",
        )
    }

    fn engine_with(sink: &MemorySink) -> TemplaEngine {
        let mut engine = TemplaEngine::builder()
            .with_diagnostic_sink(sink.clone())
            .build();
        engine
            .add_macro("fruit", Constant::new("orange", "string"))
            .add_macro("count", Constant::new(7, "int"))
            .add_macro("flag", Constant::new(true, "bool"))
            .add_macro("off", Constant::new(false, "bool"))
            .add_macro("phone", Constant::new(Value::Null, "null"))
            .add_modifier("string", AsString)
            .add_modifier("upper", Uppercase)
            .add_modifier("nullify", FnModifier::new(|_| Value::Null, "null"));
        engine
    }

    #[test]
    fn test_whole_token_keeps_native_type() {
        let sink = MemorySink::new();
        let engine = engine_with(&sink);

        assert_eq!(engine.resolve_str("{{ count }}"), Value::Integer(7));
        assert_eq!(engine.resolve_str("{{flag}}"), Value::Boolean(true));
        assert_eq!(engine.resolve_str("{{ phone }}"), Value::Null);
        assert_eq!(engine.resolve_str("{{ count | string }}"), Value::from("7"));
        assert_eq!(engine.resolve_str("{{ count }}\n"), Value::from("7\n"));
        assert!(sink.is_empty());
    }

    #[test]
    fn test_embedded_tokens_are_coerced() {
        let engine = engine_with(&MemorySink::new());

        assert_eq!(
            engine.resolve_str("[{{ count }}|{{ flag }}|{{ off }}|{{ phone }}]"),
            Value::from("[7|1||]")
        );
        assert_eq!(engine.resolve_str(""), Value::from(""));
        assert_eq!(engine.resolve_str("no tokens"), Value::from("no tokens"));
        assert_eq!(
            engine.resolve_str("{{ fruit }{{ fruit}}"),
            Value::from("{{ fruit }orange")
        );
    }

    #[test]
    fn test_optional_step_skips_on_null() {
        let sink = MemorySink::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let mut engine = engine_with(&sink);
        engine.add_modifier("count_calls", counting(&calls));

        assert_eq!(engine.resolve_str("{{ phone | ?count_calls }}"), Value::Null);
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        assert_eq!(engine.resolve_str("{{ fruit | ?count_calls }}"), Value::from("orange"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(sink.is_empty());
    }

    #[test]
    fn test_optional_missing_modifier_on_null_is_silent() {
        let sink = MemorySink::new();
        let engine = engine_with(&sink);

        assert_eq!(engine.resolve_str("{{ phone | ?nosuch }}"), Value::Null);
        assert!(sink.is_empty());
    }

    #[test]
    fn test_required_step_runs_on_null() {
        let engine = engine_with(&MemorySink::new());
        assert_eq!(engine.resolve_str("{{ phone | string }}"), Value::from(""));
        assert_eq!(engine.resolve_str("{{ phone | ?string }}"), Value::Null);
    }

    #[test]
    fn test_null_produced_mid_chain_skips_later_optional_steps() {
        let engine = engine_with(&MemorySink::new());
        assert_eq!(engine.resolve_str("{{ fruit | nullify | ?upper }}"), Value::Null);
        assert_eq!(engine.resolve_str("{{ fruit | nullify | upper }}"), Value::from(""));
    }

    #[test]
    fn test_missing_modifier_leaves_value_and_continues() {
        let sink = MemorySink::new();
        let engine = engine_with(&sink);

        assert_eq!(
            engine.resolve_str("{{ fruit | nosuch | upper }}"),
            Value::from("ORANGE")
        );

        let diagnostics = sink.diagnostics();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].kind, DiagnosticKind::ModifierNotFound);
        assert_eq!(diagnostics[0].message, "modifier not found: nosuch");
        assert_eq!(
            diagnostics[0].context_value("macro"),
            Some("{{ fruit | nosuch | upper }}")
        );
        assert_eq!(diagnostics[0].context_value("modifier"), Some("nosuch"));
        assert_eq!(diagnostics[0].module, "templa");
    }

    #[test]
    fn test_out_of_domain_macro_becomes_null() {
        let sink = MemorySink::new();
        let mut engine = engine_with(&sink);
        engine.add_macro("tags", LazyLoad::new(|_| json!(["a", "b"]), "array"));

        assert_eq!(engine.resolve_str("{{ tags }}"), Value::Null);
        assert_eq!(engine.resolve_str("tags: {{ tags }}."), Value::from("tags: ."));

        let diagnostics = sink.diagnostics();
        assert_eq!(diagnostics.len(), 2);
        assert_eq!(diagnostics[0].kind, DiagnosticKind::OutOfDomainValue);
        assert_eq!(
            diagnostics[0].message,
            "macro produced a value outside string|int|float|bool|null"
        );
        assert_eq!(diagnostics[0].context_value("macro"), Some("{{ tags }}"));
        assert_eq!(diagnostics[0].context_value("found"), Some("array"));
    }

    #[test]
    fn test_out_of_domain_modifier_becomes_null() {
        let sink = MemorySink::new();
        let mut engine = engine_with(&sink);
        engine.add_modifier("reject", Rejecting);

        assert_eq!(engine.resolve_str("{{ fruit | reject | ?upper }}"), Value::Null);

        let diagnostics = sink.diagnostics();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(
            diagnostics[0].message,
            "modifier produced a value outside string|int|float|bool|null"
        );
        assert_eq!(diagnostics[0].context_value("modifier"), Some("reject"));
        assert_eq!(diagnostics[0].context_value("found"), Some("object"));
    }

    #[test]
    fn test_final_string_modifier_only_touches_strings() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut engine = TemplaEngine::builder()
            .with_final_string_modifier(counting(&calls))
            .with_diagnostic_sink(MemorySink::new())
            .build();
        engine
            .add_macro("count", Constant::new(7, "int"))
            .add_macro("fruit", Constant::new("orange", "string"))
            .add_modifier("string", AsString);

        assert_eq!(engine.resolve_str("{{ count }}"), Value::Integer(7));
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        assert_eq!(engine.resolve_str("{{ count | string }}"), Value::from("7"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // Once per embedded token
        engine.resolve_str("{{ fruit }} and {{ fruit }}");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_final_string_modifier_escapes_embedded_values_only() {
        let mut engine = TemplaEngine::builder()
            .with_final_string_modifier(JsonSubString)
            .build();
        engine.add_macro("quote", Constant::new(r#"say "hi""#, "string"));

        assert_eq!(
            engine.resolve_str(r#"{"text": "{{ quote }}"}"#),
            Value::from(r#"{"text": "say \"hi\""}"#)
        );
    }

    #[test]
    fn test_final_string_modifier_applies_to_unknown_tokens() {
        let engine = TemplaEngine::builder()
            .with_final_string_modifier(Uppercase)
            .build();
        assert_eq!(engine.resolve_str("{{ ghost }}"), Value::from("{{ GHOST }}"));
    }

    #[test]
    fn test_unknown_macro_echoes_raw_token() {
        let sink = MemorySink::new();
        let engine = engine_with(&sink);

        assert_eq!(engine.resolve_str("{{ ghost }}"), Value::from("{{ ghost }}"));
        assert_eq!(
            engine.resolve_str("a {{ ghost: x | upper }} b"),
            Value::from("a {{ GHOST: X | UPPER }} b")
        );
        assert!(sink.is_empty());
    }

    #[test]
    fn test_lazy_macro_receives_invocation_each_time() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let mut engine = TemplaEngine::new();
        engine.add_macro(
            "echo",
            LazyLoad::new(
                move |call: &Invocation<'_>| {
                    seen.fetch_add(1, Ordering::SeqCst);
                    json!(format!("{}:{}:{}", call.name, call.parameter.unwrap_or("-"), call.token))
                },
                "string",
            )
            .with_parameters(ParameterPolicy::Any),
        );

        assert_eq!(
            engine.resolve_str("{{ echo:  p  }}"),
            Value::from("echo:p:{{ echo:  p  }}")
        );
        let node = Node::from(json!({"a": "{{ echo }}", "b": ["{{ echo }}"]}));
        engine.resolve_node(&node);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_resolve_node_passes_non_strings_and_keys() {
        let engine = engine_with(&MemorySink::new());
        let node = Node::from(json!({
            "{{ fruit }}": "{{ fruit }}",
            "n": 1.5,
            "b": false,
            "z": null,
            "list": ["{{ count }}", 2, {"deep": "{{ flag }}"}],
        }));

        let resolved = serde_json::Value::from(engine.resolve_node(&node));
        assert_eq!(
            resolved,
            json!({
                "{{ fruit }}": "orange",
                "n": 1.5,
                "b": false,
                "z": null,
                "list": [7, 2, {"deep": true}],
            })
        );
    }

    #[test]
    fn test_validation_scans_whole_tokens_and_unknown_names() {
        let engine = engine_with(&MemorySink::new());

        let valid = engine
            .validate_str("{{ ghost: anything }}", &["ghost"])
            .unwrap();
        assert!(valid.uses("ghost"));

        let errors = engine.validate_str("{{ fruit: x }}", &[]).unwrap_err();
        assert_eq!(errors.first().message(), "param not allowed");
        assert_eq!(errors.first().path().segments()[0], "fruit");
    }

    #[test]
    fn test_required_macro_reports_first_missing_only() {
        let engine = engine_with(&MemorySink::new());

        let errors = engine
            .validate_str("{{ fruit }}", &["fruit", "count", "flag"])
            .unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.first().message(), "required macro: count not found");
        assert!(errors.first().path().is_empty());
    }

    #[test]
    fn test_used_names_recorded_even_for_invalid_tokens() {
        let engine = engine_with(&MemorySink::new());

        let errors = engine
            .validate_str("{{ fruit: a }} {{ fruit: b }} {{ count }}", &["missing"])
            .unwrap_err();
        // Both parameter errors, required check suppressed
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().all(|e| e.message() == "param not allowed"));
    }

    #[test]
    fn test_validate_node_ignores_scalar_leaves() {
        let engine = engine_with(&MemorySink::new());
        let node = Node::from(json!({"a": 1, "b": null, "c": true}));
        let valid = engine.validate_node(&node, &[]).unwrap();
        assert!(valid.used_macros().is_empty());

        let errors = engine.validate_node(&node, &["fruit"]).unwrap_err();
        assert_eq!(errors.first().to_string(), "required macro: fruit not found");
    }
}
