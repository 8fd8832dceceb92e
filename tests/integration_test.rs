use parlor::config::{Config, TransportKind};
use parlor::render::{MarkdownRenderer, MarkupRenderer};

#[test]
fn test_config_validation_rejects_zero_poll_interval() {
    let config = Config {
        server_url: "http://localhost:5000".to_string(),
        transport: TransportKind::Poll,
        poll_interval_ms: 0,
    };

    assert!(config.validate().is_err());
}

#[test]
fn test_config_validation_rejects_plain_http_to_remote_host() {
    let config = Config {
        server_url: "http://chat.example.com".to_string(),
        transport: TransportKind::Push,
        poll_interval_ms: 3000,
    };

    assert!(config.validate().is_err());
}

#[test]
fn test_config_validation_allows_local_http() {
    let config = Config {
        server_url: "http://localhost:5000".to_string(),
        transport: TransportKind::Push,
        poll_interval_ms: 3000,
    };

    assert!(config.validate().is_ok());
}

#[test]
fn test_markdown_renderer_is_stateless_across_partial_renders() {
    // The engine re-renders the full accumulated source on every token, so
    // earlier partial renders must leave no residue in the renderer.
    let renderer = MarkdownRenderer;
    let expected = MarkdownRenderer.render("**4** is the answer");

    renderer.render("**4*");
    renderer.render("**4** is");
    let after_partials = renderer.render("**4** is the answer");

    assert_eq!(after_partials, expected);
    assert!(after_partials.contains("<strong>4</strong>"));
}

#[test]
fn test_markdown_renderer_escapes_untrusted_content() {
    let markup = MarkdownRenderer.render("<img src=x onerror=alert(1)>");
    assert!(!markup.contains("<img"));
    assert!(markup.contains("&lt;img"));
}
