//! Integration tests for the extended template directive
//!
//! Covers the three expansion branches (inline, shadow root, inert), their
//! deferred reconciliation, and the two conflict conditions.

use std::rc::Rc;

use html_include::test_utils::ScriptLog;
use html_include::{
    Diagnostic, DiagnosticLevel, Document, Error, MemoryFetcher, Polyfill, ShadowRootMode,
    TemplateState,
};
use pretty_assertions::assert_eq;

fn polyfill(fetcher: MemoryFetcher) -> Polyfill {
    Polyfill::builder().with_fetcher(fetcher).build().unwrap()
}

fn errors(diagnostics: &[Diagnostic]) -> Vec<&str> {
    diagnostics
        .iter()
        .filter(|d| d.level == DiagnosticLevel::Error)
        .map(|d| d.message.as_str())
        .collect()
}

#[test]
fn test_shadow_root_from_src() {
    let mut document = Document::parse(
        r#"<div id="host"><x-template shadowrootmode="open" src="/frag.html"></x-template></div>"#,
    )
    .unwrap();
    let mut polyfill = polyfill(MemoryFetcher::new().with_page("/frag.html", "<b>hi</b>"));

    polyfill.run(&mut document).unwrap();

    let host = document.get_element_by_id("host").unwrap();
    let shadow_root = document.shadow_root(host).unwrap();
    assert_eq!(document.shadow_root_mode(shadow_root), Some(ShadowRootMode::Open));
    assert_eq!(document.inner_html(shadow_root), "<b>hi</b>");
    assert_eq!(document.inner_html(host), "");
    assert_eq!(polyfill.pending_frames(), 0);

    let info = &polyfill.diagnostics()[0];
    assert_eq!(info.level, DiagnosticLevel::Info);
    assert_eq!(info.message, "Attaching shadow root with mode open");
}

#[test]
fn test_shadow_root_from_native_content_waits_for_frame() {
    let mut document = Document::parse(
        r#"<div id="host"><x-template id="t" shadowrootmode="closed"><p>native</p></x-template></div>"#,
    )
    .unwrap();
    let template = document.get_element_by_id("t").unwrap();
    let mut polyfill = polyfill(MemoryFetcher::new());

    polyfill.run(&mut document).unwrap();

    let host = document.get_element_by_id("host").unwrap();
    let shadow_root = document.shadow_root(host).unwrap();
    assert_eq!(document.shadow_root_mode(shadow_root), Some(ShadowRootMode::Closed));
    assert_eq!(document.inner_html(shadow_root), "");
    assert!(!document.is_connected(template));
    assert_eq!(polyfill.pending_frames(), 1);

    polyfill.run_frame(&mut document).unwrap();
    assert_eq!(document.inner_html(shadow_root), "<p>native</p>");
    assert_eq!(polyfill.template_state(template), Some(TemplateState::Expanded));
}

#[test]
fn test_deferred_shadow_content_skipped_when_host_detached() {
    let mut document = Document::parse(
        r#"<div id="host"><x-template shadowrootmode="open"><p>native</p></x-template></div>"#,
    )
    .unwrap();
    let mut polyfill = polyfill(MemoryFetcher::new());
    polyfill.run(&mut document).unwrap();

    let host = document.get_element_by_id("host").unwrap();
    let shadow_root = document.shadow_root(host).unwrap();
    document.remove(host);
    polyfill.run_frame(&mut document).unwrap();

    assert_eq!(document.inner_html(shadow_root), "");
}

#[test]
fn test_second_shadow_root_is_logged_and_skipped() {
    let mut document = Document::parse(
        r#"<div id="host"><x-template shadowrootmode="open" src="/one.html"></x-template><x-template id="second" shadowrootmode="open" src="/two.html"></x-template></div>"#,
    )
    .unwrap();
    let second = document.get_element_by_id("second").unwrap();
    let fetcher = Rc::new(
        MemoryFetcher::new()
            .with_page("/one.html", "<i>one</i>")
            .with_page("/two.html", "<i>two</i>"),
    );
    let mut polyfill = Polyfill::builder().with_fetcher(fetcher.clone()).build().unwrap();

    polyfill.load(&mut document).unwrap();

    let host = document.get_element_by_id("host").unwrap();
    let shadow_root = document.shadow_root(host).unwrap();
    assert_eq!(document.inner_html(shadow_root), "<i>one</i>");
    assert_eq!(polyfill.template_state(second), Some(TemplateState::Failed));
    assert_eq!(
        errors(polyfill.diagnostics()),
        vec!["Shadow host conflict: host element already has a declarative shadow root"]
    );
    assert_eq!(fetcher.requests(), vec!["/one.html"]);
}

#[test]
fn test_inline_and_shadow_root_conflict_is_fatal() {
    let source =
        r#"<div id="d"><x-template id="t" inlined shadowrootmode="open" src="/a.html"><b>x</b></x-template></div>"#;
    let mut document = Document::parse(source).unwrap();
    let before = document.to_html();
    let fetcher = Rc::new(MemoryFetcher::new().with_page("/a.html", "<p>a</p>"));
    let mut polyfill = Polyfill::builder().with_fetcher(fetcher.clone()).build().unwrap();

    let err = polyfill.run(&mut document).unwrap_err();

    assert!(matches!(err, Error::ConfigConflict(_)));
    assert!(err.is_fatal());
    assert_eq!(document.to_html(), before);
    assert!(fetcher.requests().is_empty());
    let template = document.get_element_by_id("t").unwrap();
    assert_eq!(polyfill.template_state(template), Some(TemplateState::Failed));
}

#[test]
fn test_inline_from_src_splices_in_place() {
    let mut document = Document::parse(
        r#"<ul id="list"><li>first</li><x-template inlined src="/items.html"></x-template><li>last</li></ul>"#,
    )
    .unwrap();
    let log = ScriptLog::new();
    document.set_script_runner(log.runner());
    let mut polyfill = polyfill(MemoryFetcher::new().with_page(
        "/items.html",
        "<li>two</li><script>inline script</script><li>three</li>",
    ));

    polyfill.load(&mut document).unwrap();

    let list = document.get_element_by_id("list").unwrap();
    assert_eq!(
        document.inner_html(list),
        "<li>first</li><li>two</li><script>inline script</script><li>three</li><li>last</li>"
    );
    assert_eq!(log.sources(), vec!["inline script"]);
    assert!(document.elements_by_tag_name("x-template").is_empty());
}

#[test]
fn test_inline_from_native_content() {
    let mut document = Document::parse(
        r#"<div id="d"><x-template inlined><em>native</em><script>native script</script></x-template></div>"#,
    )
    .unwrap();
    let log = ScriptLog::new();
    document.set_script_runner(log.runner());
    let mut polyfill = polyfill(MemoryFetcher::new());

    polyfill.run(&mut document).unwrap();

    let div = document.get_element_by_id("d").unwrap();
    assert_eq!(
        document.inner_html(div),
        "<em>native</em><script>native script</script>"
    );
    assert_eq!(log.sources(), vec!["native script"]);
    assert_eq!(polyfill.pending_frames(), 0);
}

#[test]
fn test_inert_template_from_src() {
    let mut document =
        Document::parse(r#"<div id="d"><x-template id="t" src="/card.html"></x-template></div>"#).unwrap();
    let log = ScriptLog::new();
    document.set_script_runner(log.runner());
    let template = document.get_element_by_id("t").unwrap();
    let mut polyfill = polyfill(
        MemoryFetcher::new().with_page("/card.html", "<article>card</article><script>never</script>"),
    );

    polyfill.load(&mut document).unwrap();

    assert!(document.is_connected(template));
    let content = polyfill.template_content(&document, template).unwrap();
    assert_eq!(
        document.inner_html(content),
        "<article>card</article><script>never</script>"
    );
    assert!(!document.is_connected(document.children(content)[0]));
    assert!(log.sources().is_empty());
    assert_eq!(polyfill.template_state(template), Some(TemplateState::Expanded));
}

#[test]
fn test_inert_template_native_content_waits_for_frame() {
    let mut document = Document::parse(
        r#"<x-template id="t"><p>stored</p><script>inert</script></x-template>"#,
    )
    .unwrap();
    let log = ScriptLog::new();
    document.set_script_runner(log.runner());
    let template = document.get_element_by_id("t").unwrap();
    let mut polyfill = polyfill(MemoryFetcher::new());

    polyfill.run(&mut document).unwrap();
    let content = polyfill.template_content(&document, template).unwrap();
    assert!(document.children(content).is_empty());

    polyfill.run_frame(&mut document).unwrap();
    assert_eq!(
        document.inner_html(content),
        "<p>stored</p><script>inert</script>"
    );
    assert!(log.sources().is_empty());
}

#[test]
fn test_inert_template_detached_before_frame() {
    let mut document = Document::parse(r#"<x-template id="t"><p>stored</p></x-template>"#).unwrap();
    let template = document.get_element_by_id("t").unwrap();
    let mut polyfill = polyfill(MemoryFetcher::new());

    polyfill.run(&mut document).unwrap();
    document.remove(template);
    polyfill.run_frame(&mut document).unwrap();

    let content = polyfill.template_content(&document, template).unwrap();
    assert!(document.children(content).is_empty());
}

#[test]
fn test_shadow_root_fetch_failure_leaves_empty_root() {
    let mut document = Document::parse(
        r#"<div id="host"><x-template shadowrootmode="open" src="/gone.html"></x-template></div>"#,
    )
    .unwrap();
    let mut polyfill = polyfill(MemoryFetcher::new().with_status("/gone.html", 404, "Not Found"));

    polyfill.load(&mut document).unwrap();

    let host = document.get_element_by_id("host").unwrap();
    let shadow_root = document.shadow_root(host).unwrap();
    assert_eq!(document.inner_html(shadow_root), "");
    assert_eq!(
        errors(polyfill.diagnostics()),
        vec!["Failed to fetch template src /gone.html: 404 Not Found"]
    );
}

#[test]
fn test_unrecognized_shadow_mode_is_inert() {
    let mut document = Document::parse(
        r#"<div id="host"><x-template id="t" shadowrootmode="sideways" src="/a.html"></x-template></div>"#,
    )
    .unwrap();
    let template = document.get_element_by_id("t").unwrap();
    let mut polyfill = polyfill(MemoryFetcher::new().with_page("/a.html", "<p>a</p>"));

    polyfill.load(&mut document).unwrap();

    let host = document.get_element_by_id("host").unwrap();
    assert_eq!(document.shadow_root(host), None);
    let content = polyfill.template_content(&document, template).unwrap();
    assert_eq!(document.inner_html(content), "<p>a</p>");
}

#[test]
fn test_directives_inside_shadow_roots_expand() {
    let mut document = Document::parse(
        r#"<div id="host"><x-template shadowrootmode="open" src="/shell.html"></x-template></div>"#,
    )
    .unwrap();
    let mut polyfill = polyfill(
        MemoryFetcher::new()
            .with_page("/shell.html", r#"<header><x-link rel="include" href="/logo.html"></x-link></header>"#)
            .with_page("/logo.html", "<img src=\"logo.png\">"),
    );

    polyfill.load(&mut document).unwrap();

    let host = document.get_element_by_id("host").unwrap();
    let shadow_root = document.shadow_root(host).unwrap();
    assert_eq!(
        document.inner_html(shadow_root),
        "<header><img src=\"logo.png\"></header>"
    );
}

#[test]
fn test_failed_directive_does_not_stop_the_pass() {
    let mut document = Document::parse(
        r#"<div id="host"><x-template shadowrootmode="open" src="/shell.html"></x-template></div><div id="d"><x-link rel="include" href="/a.html"></x-link></div>"#,
    )
    .unwrap();
    let mut polyfill = polyfill(
        MemoryFetcher::new()
            .with_page(
                "/shell.html",
                r#"<x-template id="nested" shadowrootmode="open" src="/b.html"></x-template><i>shell</i>"#,
            )
            .with_page("/b.html", "<b>b</b>")
            .with_page("/a.html", "<p>a</p>"),
    );

    polyfill.load(&mut document).unwrap();

    let d = document.get_element_by_id("d").unwrap();
    assert_eq!(document.inner_html(d), "<p>a</p>");
    let host = document.get_element_by_id("host").unwrap();
    let shadow_root = document.shadow_root(host).unwrap();
    assert_eq!(document.inner_html(shadow_root), "<i>shell</i>");
    assert_eq!(
        errors(polyfill.diagnostics()),
        vec!["DOM error: shadow roots can only be attached to elements"]
    );
}
