//! Behavioural properties of the template engine, exercised through the
//! public API only.

use std::fs;

use docweave::template::{Engine, MAX_PASSES, Params, builtins, from_fn};
use proptest::prelude::*;
use tempfile::TempDir;

fn render(engine: &mut Engine, text: &str) -> String {
    engine.render_string(text, &Params::new()).unwrap()
}

#[test]
fn fully_resolved_output_is_a_fixed_point() {
    let mut engine = Engine::new();
    engine.register_chunk("card", "<div>[[+title]]</div>");
    engine.set_placeholder("site", "Docs");

    let once = render(&mut engine, "[[+site]]: [[$card &title=`Intro`]]");
    assert_eq!(once, "Docs: <div>Intro</div>");
    assert_eq!(render(&mut engine, &once), once);
}

#[test]
fn unterminated_tag_is_literal() {
    let mut engine = Engine::new();
    engine.set_placeholder("x", "value");
    assert_eq!(render(&mut engine, "a [[+x b"), "a [[+x b");
    assert_eq!(render(&mut engine, "[[+x]] and [[$"), "value and [[$");
}

#[test]
fn params_shadow_placeholders_only_inside_the_chunk() {
    let mut engine = Engine::new();
    engine.register_chunk("show", "[[+who]]");
    engine.set_placeholder("who", "global");

    assert_eq!(
        render(&mut engine, "[[$show &who=`local`]] [[+who]]"),
        "local global"
    );
    assert_eq!(engine.placeholder("who"), Some("global"));
}

#[test]
fn deferred_tag_resolves_one_pass_later() {
    let mut plain = Engine::new();
    plain.set_placeholder("x", "v");
    assert_eq!(render(&mut plain, "[[+x]]"), "v");

    let mut deferred = Engine::new();
    deferred.set_placeholder("x", "v");
    assert_eq!(render(&mut deferred, "[[!+x]]"), "v");

    assert_eq!(deferred.stats().passes, plain.stats().passes + 1);
}

#[test]
fn self_including_chunk_terminates_with_remnant() {
    let mut engine = Engine::new();
    engine.register_chunk("loop", "x[[$loop]]");

    let out = render(&mut engine, "[[$loop]]");
    assert!(out.starts_with("xxx"));
    assert!(out.ends_with("[[$loop]]"), "{out}");
    assert_eq!(engine.stats().depth_limited, 1);
}

#[test]
fn cyclic_chunk_does_not_swallow_later_tags() {
    let mut engine = Engine::new();
    engine.register_chunk("loop", "[[$loop]]");
    engine.register_chunk("footer", "FOOTER");
    engine.register_snippet("year", from_fn(|_, _| Ok("2024".to_string())));

    let out = render(&mut engine, "[[$loop]]|[[$footer]]|[[year]]");
    assert!(out.contains("FOOTER"), "{out}");
    assert_eq!(out, "[[$loop]]|FOOTER|2024");
    assert_eq!(engine.stats().depth_limited, 1);
}

#[test]
fn self_reproducing_snippet_stops_at_pass_limit() {
    let mut engine = Engine::new();
    engine.register_snippet("again", from_fn(|_, _| Ok("[[again]]".to_string())));

    let out = render(&mut engine, "[[again]]");
    assert_eq!(out, "[[again]]");
    assert_eq!(engine.stats().passes, MAX_PASSES);
    assert_eq!(engine.stats().budget_exhausted, 1);
}

#[test]
fn nested_tags_in_parameters() {
    let mut engine = Engine::new();
    engine.register_chunk("greet", "Hello, [[+name]]!");
    engine.set_placeholder("user", "Ada");
    assert_eq!(
        render(&mut engine, "[[$greet &name=`[[+user]]`]]"),
        "Hello, Ada!"
    );
}

#[test]
fn placeholder_values_are_not_rescanned() {
    let mut engine = Engine::new();
    engine.set_placeholder("x", "[[+y]]");
    engine.set_placeholder("y", "boom");
    assert_eq!(render(&mut engine, "[[+x]]"), "[[+y]]");
}

#[test]
fn missing_chunk_is_remembered() {
    let tmp = TempDir::new().unwrap();
    let mut engine = Engine::new();
    engine.add_chunk_search_path(tmp.path());

    assert_eq!(render(&mut engine, "<[[$late]]>"), "<>");
    fs::write(tmp.path().join("late.html"), "here").unwrap();
    assert_eq!(render(&mut engine, "<[[$late]]>"), "<>");
    assert!(!engine.has_chunk("late"));
}

#[test]
fn chunks_from_disk_and_builtins() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join("badge.html"),
        "[[if &subject=`[[+count]]` &operator=`>` &operand=`9` &then=`many` &else=`[[+count]]`]]",
    )
    .unwrap();

    let mut engine = Engine::new();
    builtins::register(&mut engine);
    engine.add_chunk_search_path(tmp.path());

    assert_eq!(render(&mut engine, "[[$badge &count=`3`]]"), "3");
    assert_eq!(render(&mut engine, "[[$badge &count=`12`]]"), "many");
}

#[test]
fn forks_render_independently_in_parallel() {
    let mut base = Engine::new();
    base.register_chunk("page", "[[+n]]");

    let outputs: Vec<String> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..8)
            .map(|n| {
                let mut engine = base.fork();
                s.spawn(move || {
                    engine.set_placeholder("n", n.to_string());
                    engine.render_named_chunk("page", &Params::new()).unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let expected: Vec<String> = (0..8).map(|n| n.to_string()).collect();
    assert_eq!(outputs, expected);
    assert_eq!(base.placeholder("n"), None);
}

fn noisy_engine() -> Engine {
    let mut engine = Engine::new();
    engine.register_chunk("a", "[[$a]][[$b &x=`[[+x]]`]]");
    engine.register_chunk("b", "<[[+x]]|[[!$a]]>");
    engine.set_placeholder("x", "[[$a]]");
    engine
}

proptest! {
    /// Text without `[` comes back untouched.
    #[test]
    fn tag_free_text_is_unchanged(s in "[^\\[]*") {
        let mut engine = Engine::new();
        prop_assert_eq!(render(&mut engine, &s), s);
    }

    /// Arbitrary input, including recursive chunks, renders without
    /// panicking and returns.
    #[test]
    fn arbitrary_input_terminates(s in "\\PC*") {
        let mut engine = noisy_engine();
        prop_assert!(engine.render_string(&s, &Params::new()).is_ok());
    }

    /// Inputs dense in tag syntax hit every parser branch.
    #[test]
    fn tag_soup_terminates(s in "(\\[\\[|\\]\\]|[!$+*&=` ab x]){0,48}") {
        let mut engine = noisy_engine();
        let result = engine.render_string(&s, &Params::new());
        prop_assert!(result.is_ok());
        prop_assert_eq!(engine.placeholder("x"), Some("[[$a]]"));
    }
}
