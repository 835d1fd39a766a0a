//! Webhook payload example for the template engine
//!
//! Builds a JSON webhook body from a template, validates it first, prints
//! the documentation snapshot, and shows an unknown modifier being reported
//! through `tracing`.

use serde::Deserialize;
use serde_json::json;
use templa::{
    AsString, Base64, Constant, Invocation, JsonSubString, LazyLoad, Lowercase, Node,
    ParameterPolicy, TemplaEngine, Uppercase, UrlEncode,
};

#[derive(Debug, Deserialize)]
struct Webhook {
    what_fruit: String,
    price: f64,
    price_label: String,
    email_upper_base64: String,
    phone: Option<String>,
    callback: String,
}

fn engine() -> TemplaEngine {
    let mut engine = TemplaEngine::new();
    engine
        .add_macro(
            "fruit",
            Constant::new("orange", "string").with_documentation("sold fruit name"),
        )
        .add_macro("price", Constant::new(2.75, "float"))
        .add_macro(
            "email",
            Constant::new("gagarin@cosmos.ru", "string|null").with_documentation("seller's email"),
        )
        .add_macro(
            "phone",
            Constant::new(None::<String>, "string|null").with_documentation("seller's phone"),
        )
        .add_macro(
            "click",
            LazyLoad::new(
                |call: &Invocation<'_>| match call.parameter {
                    Some("id") => json!("e5a754f3 9a91"),
                    Some("source") => json!("newsletter"),
                    _ => json!(null),
                },
                "string|null",
            )
            .with_parameters(ParameterPolicy::allow_only(["id", "source"]))
            .with_documentation("click attributes"),
        )
        .add_modifier("string", AsString)
        .add_modifier("base64", Base64)
        .add_modifier("lower", Lowercase)
        .add_modifier("upper", Uppercase)
        .add_modifier("url", UrlEncode);
    engine
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let engine = engine();

    let template = Node::from(json!({
        "what_fruit": "{{ fruit }}",
        "price": "{{ price }}",
        "price_label": "{{ price | string }} USD",
        "email_upper_base64": "{{ email | upper | base64 }}",
        "phone": "{{ phone | ?upper }}",
        "callback": "https://example.com/cb?click={{ click: id | url }}&src={{ click: source }}",
    }));

    let valid = engine.validate_node(&template, &["fruit", "price"])?;
    println!("Macros used: {:?}", valid.used_macros());

    let webhook: Webhook = engine.render(&template, &["fruit", "price"])?;
    println!(
        "{} at {} ({}), seller {}, phone {:?}, callback {}",
        webhook.what_fruit,
        webhook.price,
        webhook.price_label,
        webhook.email_upper_base64,
        webhook.phone,
        webhook.callback
    );

    // Errors carry the full path to the offending token
    let broken = Node::from(json!({"meta": {"click": "{{ click: referrer }}"}}));
    if let Err(errors) = engine.validate_node(&broken, &[]) {
        for error in &errors {
            println!("Validation error: {}", error);
        }
    }

    // Unknown modifiers are skipped and reported as warnings
    println!("Degraded: {}", engine.resolve_str("{{ fruit | shout }}"));

    // Escaping values for a raw JSON body
    let mut json_engine = TemplaEngine::builder()
        .with_final_string_modifier(JsonSubString)
        .build();
    json_engine.add_macro("note", Constant::new(r#"say "hi""#, "string"));
    println!(
        "JSON body: {}",
        json_engine.resolve_str(r#"{"note": "{{ note }}"}"#)
    );

    let documentation = engine.documentation();
    println!(
        "Documentation:\n{}",
        serde_json::to_string_pretty(&documentation)?
    );

    Ok(())
}
