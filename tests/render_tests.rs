//! End-to-end component rendering through markup tags.

use serde::Deserialize;
use std::error::Error;
use std::thread;
use viewkit::error::BoxError;
use viewkit::{
    ComponentContext, Context, MemoryLoader, Options, SetupHook, SetupOutcome, TemplateError, TemplateSet, Value,
};

fn set_with(templates: &[(&str, &str)]) -> TemplateSet {
    TemplateSet::new(templates.iter().copied().collect::<MemoryLoader>(), Options::default())
}

fn data(pairs: &[(&str, Value)]) -> Context {
    pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
}

fn render(set: &TemplateSet, source: &str, vars: Context) -> String {
    match set.render_string(source, vars) {
        Ok(html) => html,
        Err(err) => panic!("render failed: {}", err),
    }
}

fn compile_error(set: &TemplateSet, source: &str) -> String {
    match set.from_string(source) {
        Ok(_) => panic!("expected a compile error for {:?}", source),
        Err(err) => {
            assert!(matches!(err, TemplateError::Syntax { .. }), "not a syntax error: {}", err);
            err.to_string()
        }
    }
}

fn hook<F>(f: F) -> Option<SetupHook>
where
    F: Fn(&mut ComponentContext) -> Result<SetupOutcome, BoxError> + Send + Sync + 'static,
{
    Some(SetupHook::new(f))
}

#[test]
fn test_props_and_fallthrough_attributes() {
    let mut set = set_with(&[(
        "alert.html",
        r#"{% props kind="info" %}<div class="alert-{{ kind }}" {{ attributes }}>{{ slot }}</div>"#,
    )]);
    set.registry_mut().register_file("alert", "alert.html", &[], None);

    let out = render(
        &set,
        r#"<x-alert kind="warn" id="a" :data-n="n">Hi {{ who }}</x-alert>"#,
        data(&[("n", Value::Int(3)), ("who", Value::from("Ann"))]),
    );
    assert_eq!(out, r#"<div class="alert-warn" id="a" data-n="3">Hi Ann</div>"#);

    let out = render(&set, "<x-alert>x</x-alert>", Context::new());
    assert_eq!(out, r#"<div class="alert-info" >x</div>"#);
}

#[test]
fn test_registered_props_take_precedence() {
    let mut set = set_with(&[]);
    set.registry_mut()
        .register_inline("badge", "{% props ignored %}{{ label }}|{{ attributes }}", &["label"], None);

    let out = render(&set, r#"<x-badge label="New" ignored="1" />"#, Context::new());
    assert_eq!(out, r#"New|ignored="1""#);
}

#[test]
fn test_attribute_values_are_escaped() {
    let mut set = set_with(&[]);
    set.registry_mut().register_inline("link", "<a {{ attributes }}>{{ slot }}</a>", &[], None);

    let out = render(&set, r#"<x-link :title="t">Go</x-link>"#, data(&[("t", Value::from("\"x\" & <y>"))]));
    assert_eq!(out, r#"<a title="&#34;x&#34; &amp; &lt;y&gt;">Go</a>"#);
}

#[test]
fn test_attribute_helpers_in_component() {
    let mut set = set_with(&[]);
    set.registry_mut().register_inline(
        "link",
        "<a {{ attributes.default('class', 'link') }}>{{ slot }}</a>{% if attributes.has('target') %}*{% endif %}",
        &[],
        None,
    );

    let out = render(&set, r#"<x-link href="/x" class="big">Go</x-link>"#, Context::new());
    assert_eq!(out, r#"<a href="/x" class="link big">Go</a>"#);
    let out = render(&set, r#"<x-link target="_blank" />"#, Context::new());
    assert_eq!(out, r#"<a target="_blank" class="link"></a>*"#);
}

#[test]
fn test_setup_sets_defaults() {
    let mut set = set_with(&[]);
    set.registry_mut().register_inline(
        "greet",
        "Hello {{ name }}{{ punct }}",
        &["name"],
        hook(|ctx| {
            ctx.default("name", "stranger");
            ctx.set("punct", "!");
            Ok(SetupOutcome::Render)
        }),
    );

    assert_eq!(render(&set, "<x-greet />", Context::new()), "Hello stranger!");
    assert_eq!(render(&set, r#"<x-greet name="Bo" />"#, Context::new()), "Hello Bo!");
}

#[test]
fn test_setup_binds_typed_props() {
    #[derive(Deserialize)]
    struct Pager {
        page: i64,
        pages: i64,
    }

    let mut set = set_with(&[]);
    set.registry_mut().register_inline(
        "pager",
        "{{ page }}/{{ pages }}{% if has_next %} next{% endif %}",
        &["page", "pages"],
        hook(|ctx| {
            let pager: Pager = ctx.bind()?;
            ctx.update(&serde_json::json!({ "has_next": pager.page < pager.pages }))?;
            Ok(SetupOutcome::Render)
        }),
    );

    assert_eq!(
        render(&set, r#"<x-pager :page="2" :pages="5" />"#, Context::new()),
        "2/5 next"
    );
    assert_eq!(render(&set, r#"<x-pager :page="5" :pages="5" />"#, Context::new()), "5/5");
}

#[test]
fn test_setup_no_content_renders_nothing() {
    let mut set = set_with(&[]);
    set.registry_mut().register_inline(
        "maybe",
        "[{{ slot }}]",
        &["show"],
        hook(|ctx| {
            Ok(if ctx.get("show").is_some_and(Value::is_truthy) {
                SetupOutcome::Render
            } else {
                SetupOutcome::NoContent
            })
        }),
    );

    let source = r#"a<x-maybe :show="on">X</x-maybe>b"#;
    assert_eq!(render(&set, source, data(&[("on", Value::Bool(false))])), "ab");
    assert_eq!(render(&set, source, data(&[("on", Value::Bool(true))])), "a[X]b");
}

#[test]
fn test_setup_error_keeps_cause() {
    let mut set = set_with(&[("page.html", "before <x-broken /> after")]);
    set.registry_mut()
        .register_inline("broken", "never", &[], hook(|_| Err("database down".into())));

    let err = set.render("page", Context::new()).unwrap_err();
    assert!(matches!(err, TemplateError::Render { .. }));
    assert!(err.to_string().starts_with("page.html:1:8: "), "{}", err);
    assert!(err.to_string().contains("setup of component 'broken' failed"));
    assert_eq!(err.source().map(|e| e.to_string()).as_deref(), Some("database down"));
}

#[test]
fn test_named_and_default_slots() {
    let mut set = set_with(&[(
        "card.html",
        r#"<article><h2>{% slot "title" %}Untitled{% endslot %}</h2>{{ slot }}<footer>{% slot "footer" %}-{% endslot %}</footer></article>"#,
    )]);
    set.registry_mut().register_file("card", "card.html", &[], None);

    let source = "<x-card>\n  <x-slot name=\"title\">Report <b>{{ year }}</b></x-slot>\n  Body text\n</x-card>";
    let out = render(&set, source, data(&[("year", Value::Int(2024))]));
    assert_eq!(out, "<article><h2>Report <b>2024</b></h2>Body text<footer>-</footer></article>");

    let out = render(&set, "<x-card />", Context::new());
    insta::assert_snapshot!(out, @"<article><h2>Untitled</h2><footer>-</footer></article>");
}

#[test]
fn test_default_slot_collects_every_gap() {
    let mut set = set_with(&[]);
    set.registry_mut()
        .register_inline("box", r#"{{ slot }}|{% slot "a" %}{% endslot %}"#, &[], None);

    let out = render(
        &set,
        r#"<x-box>one <x-slot name="a">A</x-slot>two</x-box>"#,
        Context::new(),
    );
    assert_eq!(out, "one two|A");
}

#[test]
fn test_slots_render_in_caller_scope() {
    let mut set = set_with(&[]);
    set.registry_mut()
        .register_inline("secretive", "{% props secret %}[{{ slot }}:{{ secret }}]", &[], None);

    let source = r#"{% set secret = "outer" %}<x-secretive secret="inner">{{ secret }}</x-secretive>{{ secret }}"#;
    assert_eq!(render(&set, source, Context::new()), "[outer:inner]outer");
}

#[test]
fn test_slot_variables_stay_in_their_slot() {
    let mut set = set_with(&[]);
    set.registry_mut().register_inline(
        "box",
        r#"{% slot "a" %}{% endslot %}|{% slot "b" %}{% endslot %}|{{ slot }}"#,
        &[],
        None,
    );

    let source = r#"<x-box><x-slot name="a">{% set v = "leak" %}A</x-slot><x-slot name="b">[{{ v }}]</x-slot>[{{ v }}]</x-box>[{{ v }}]"#;
    assert_eq!(render(&set, source, Context::new()), "A|[]|[][]");
}

#[test]
fn test_negating_min_int_is_a_render_error() {
    let set = set_with(&[]);
    let err = set
        .render_string("{{ -m }}", data(&[("m", Value::Int(i64::MIN))]))
        .unwrap_err();
    assert!(matches!(err, TemplateError::Render { .. }), "not a render error: {}", err);
}

#[test]
fn test_component_does_not_see_caller_scope() {
    let mut set = set_with(&[]);
    set.registry_mut().register_inline("peek", "<{{ user }}>", &[], None);

    let out = render(&set, "<x-peek />", data(&[("user", Value::from("ann"))]));
    assert_eq!(out, "<>");
}

#[test]
fn test_slot_data_named() {
    let mut set = set_with(&[]);
    set.registry_mut()
        .register_inline("user", "<div>{{ slot }}</div>", &["name"], None);

    let out = render(
        &set,
        r#"<x-user name="Ann" id="x" slot-data="u">{{ u.name }}#{{ u.attributes.id }}</x-user>"#,
        Context::new(),
    );
    assert_eq!(out, "<div>Ann#x</div>");
}

#[test]
fn test_slot_data_destructured() {
    let mut set = set_with(&[]);
    set.registry_mut().register_inline(
        "row",
        r#"<tr>{% slot "cell" %}{% endslot %}</tr>"#,
        &["name"],
        hook(|ctx| {
            ctx.set("index", 4);
            Ok(SetupOutcome::Render)
        }),
    );

    let source = r#"<x-row name="Ann" slot-data="{name: who, index, missing}"><x-slot name="cell">{{ index }}:{{ who }}:{{ missing }}:{{ name }}</x-slot></x-row>"#;
    assert_eq!(render(&set, source, Context::new()), "<tr>4:Ann::</tr>");
}

#[test]
fn test_slot_data_invalid() {
    let mut set = set_with(&[]);
    set.registry_mut().register_inline("row", "{{ slot }}", &[], None);

    let err = compile_error(&set, r#"<x-row slot-data="{a b}"></x-row>"#);
    assert!(
        err.contains("value is invalid: invalid format: contains invalid characters or structure"),
        "{}",
        err
    );
}

#[test]
fn test_shared_context_keys() {
    let options = Options {
        shared_context_keys: vec!["csrf".to_string()],
        ..Options::default()
    };
    let mut set = TemplateSet::new(MemoryLoader::new(), options);
    set.registry_mut()
        .register_inline("form", r#"<form data-t="{{ csrf }}" data-u="{{ user }}">{{ slot }}</form>"#, &[], None);

    let out = render(
        &set,
        "<x-form>{{ csrf }}</x-form>",
        data(&[("csrf", Value::from("tok")), ("user", Value::from("ann"))]),
    );
    assert_eq!(out, r#"<form data-t="tok" data-u="">tok</form>"#);
}

#[test]
fn test_headless_component() {
    let mut set = set_with(&[]);
    set.registry_mut().register_headless(
        "feature",
        &["flag"],
        hook(|ctx| {
            Ok(if ctx.get("flag").is_some_and(Value::is_truthy) {
                SetupOutcome::Render
            } else {
                SetupOutcome::NoContent
            })
        }),
    );
    assert!(set.registry().resolve("feature").unwrap().is_headless());

    let source = r#"<x-feature :flag="beta" class="ignored">  <b>{{ label }}</b>  </x-feature>"#;
    let vars = data(&[("beta", Value::Bool(true)), ("label", Value::from("<new>"))]);
    assert_eq!(render(&set, source, vars), "<b>&lt;new&gt;</b>");
    assert_eq!(render(&set, source, Context::new()), "");
}

#[test]
fn test_nested_components() {
    let mut set = set_with(&[
        ("layout.html", "<main>{{ slot }}</main>"),
        ("card.html", "<section><x-badge :count=\"total\" />{{ slot }}</section>"),
        ("badge.html", "{% props count %}<span>{{ count }}</span>"),
    ]);
    let registry = set.registry_mut();
    registry.register_file("layout", "layout.html", &[], None);
    registry.register_file("card", "card.html", &["total"], None);
    registry.register_file("badge", "badge.html", &[], None);

    let out = render(
        &set,
        r#"<x-layout><x-card :total="n"><x-badge :count="-n" /></x-card></x-layout>"#,
        data(&[("n", Value::Int(7))]),
    );
    assert_eq!(out, "<main><section><span>7</span><span>-7</span></section></main>");
}

#[test]
fn test_three_levels_of_slots() {
    let mut set = set_with(&[]);
    let registry = set.registry_mut();
    registry.register_inline("a", "<a>{{ slot }}</a>", &[], None);
    registry.register_inline("b", "<b>{{ slot }}</b>", &[], None);
    registry.register_inline("c", "<c>{{ slot }}</c>", &[], None);

    let out = render(&set, "<x-a>1<x-b>2<x-c>{{ v }}</x-c></x-b></x-a>", data(&[("v", Value::from("<3>"))]));
    insta::assert_snapshot!(out, @"<a>1<b>2<c>&lt;3&gt;</c></b></a>");
}

#[test]
fn test_directory_components() {
    let mut set = set_with(&[
        (
            "components/ui/button.html",
            r#"{% props variant="primary" %}<button class="btn-{{ variant }}" {{ attributes }}>{{ slot }}</button>"#,
        ),
        ("components/icon.html", "<i>{{ slot }}</i>"),
        ("pages/index.html", "unrelated"),
    ]);
    assert_eq!(set.register_components_directory("components", "").unwrap(), 2);
    assert_eq!(set.registry().names(), vec!["icon", "ui.button"]);

    let out = render(
        &set,
        r#"<x-ui.button variant="ghost" type="submit">Go <x-icon>&gt;</x-icon></x-ui.button>"#,
        Context::new(),
    );
    assert_eq!(out, r#"<button class="btn-ghost" type="submit">Go <i>&gt;</i></button>"#);
}

#[test]
fn test_directory_prefix() {
    let mut set = set_with(&[("icons/check.html", "✓")]);
    set.register_components_directory("icons", "icon.").unwrap();
    assert!(set.registry().contains("icon.check"));
    assert_eq!(render(&set, "<x-icon.check />", Context::new()), "✓");
}

#[test]
fn test_unresolved_component() {
    let set = set_with(&[]);
    let err = compile_error(&set, "<x-missing />");
    assert_eq!(err, "<string>:1:1: component 'missing' can not be resolved.");
}

#[test]
fn test_component_without_template() {
    let mut set = set_with(&[]);
    set.registry_mut().register_file("empty", "", &[], None);
    let err = compile_error(&set, "<x-empty />");
    assert!(err.ends_with("component 'empty' has no template."), "{}", err);
}

#[test]
fn test_component_tag_argument_errors() {
    let mut set = set_with(&[]);
    set.registry_mut().register_inline("card", "{{ slot }}", &[], None);

    let cases = [
        ("{% component %}{% endcomponent %}", "component tag needs a component name as first argument."),
        (r#"{% component "card" bogus %}{% endcomponent %}"#, "Malformed 'component'-tag arguments."),
        (r#"{% component "card" withAttrs "a" %}{% endcomponent %}"#, "Expected '='."),
        (r#"{% component "card" withAttrs a="1" %}{% endcomponent %}"#, "Expected an identifier"),
        (r#"{% component "card" slotData %}{% endcomponent %}"#, "Expected '='."),
        (r#"{% component "card" slotData=x %}{% endcomponent %}"#, "property needs value."),
        (r#"{% component "card" %}{% endcomponent "card" %}"#, "Arguments not allowed here."),
        (r#"{% component "card" %}{% slot %}x{% endslot %}{% endcomponent %}"#, "slot tag needs a slot name as first argument."),
        (r#"{% component "card" %}{% slot "a" %}x{% endslot "a" %}{% endcomponent %}"#, "Arguments not allowed here."),
    ];
    for (source, message) in cases {
        let err = compile_error(&set, source);
        assert!(err.ends_with(message), "{:?}: {}", source, err);
    }
}

#[test]
fn test_unclosed_component() {
    let mut set = set_with(&[]);
    set.registry_mut().register_inline("card", "{{ slot }}", &[], None);
    let err = compile_error(&set, "<x-card>open");
    assert!(err.ends_with("expected one of: slot, endcomponent."), "{}", err);
}

#[test]
fn test_recursive_component_hits_depth_limit() {
    let options = Options {
        max_component_depth: 4,
        ..Options::default()
    };
    let mut set = TemplateSet::new(MemoryLoader::new(), options);
    set.registry_mut().register_inline("loop", "<x-loop />", &[], None);

    let err = compile_error(&set, "<x-loop />");
    assert!(err.ends_with("component 'loop' exceeds the maximum nesting depth of 4."), "{}", err);
}

#[test]
fn test_custom_tag_prefix() {
    let options = Options {
        tag_prefix: Some("c-".to_string()),
        ..Options::default()
    };
    let mut set = TemplateSet::new(MemoryLoader::new(), options);
    set.registry_mut().register_inline("chip", "({{ slot }})", &[], None);

    assert_eq!(render(&set, "<c-chip>a</c-chip><x-chip />", Context::new()), "(a)<x-chip />");
}

#[test]
fn test_prefix_disabled() {
    let options = Options {
        tag_prefix: None,
        ..Options::default()
    };
    let mut set = TemplateSet::new(MemoryLoader::new(), options);
    set.registry_mut().register_inline("chip", "({{ slot }})", &[], None);

    let out = render(&set, r#"<x-chip />{% component "chip" %}b{% endcomponent %}"#, Context::new());
    assert_eq!(out, "<x-chip />(b)");
}

#[test]
fn test_verbatim_markup_is_not_a_component() {
    let set = set_with(&[]);
    let out = render(&set, "{% verbatim %}<x-alert />{{ x }}{% endverbatim %}", Context::new());
    assert_eq!(out, "<x-alert />{{ x }}");
}

#[test]
fn test_registry_change_invalidates_cache() {
    let mut set = set_with(&[("page.html", "<x-who />")]);
    set.registry_mut().register_inline("who", "first", &[], None);
    assert_eq!(set.render("page", Context::new()).unwrap(), "first");

    set.registry_mut().register_inline("who", "second", &[], None);
    assert_eq!(set.render("page", Context::new()).unwrap(), "second");
}

#[test]
fn test_concurrent_renders() {
    let mut set = set_with(&[("page.html", r#"<x-item :n="n" />"#)]);
    set.registry_mut()
        .register_inline("item", "{% props n %}#{{ n }}", &[], None);
    let template = set.from_file("page").unwrap();

    thread::scope(|s| {
        for i in 0..4i64 {
            let template = &template;
            s.spawn(move || {
                let out = template.render(data(&[("n", Value::Int(i))])).unwrap();
                assert_eq!(out, format!("#{}", i));
            });
        }
    });
}
