//! End-to-end rendering against the in-memory document.
//!
//! Host call counts come from `Document::stats`, so each test asserts both the
//! resulting markup and how much work it took to get there.

use std::cell::Cell;
use std::rc::Rc;

use spark_reconciler::document::{BoolAttrs, Document, DomNode, HtmlHost, Namespace};
use spark_reconciler::{
    create_ref, each, h, show, Child, ChildList, DynamicMountPoint, Error, HostAdapter, Key, Kind,
    ListItem, MountState, Placement, Props, ReactiveList, Reconciler, Result, Value,
};
use spark_signals::signal;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn setup() -> (Document, DomNode, Reconciler<DomNode>) {
    init_tracing();
    let doc = Document::new();
    let root = doc.create_root("body");
    let reconciler = Reconciler::new(HtmlHost::new(&doc));
    (doc, root, reconciler)
}

fn keyed_texts(keys: Vec<&'static str>) -> Child {
    ChildList::keyed(keys, |k| *k, Child::from).into()
}

// =============================================================================
// Static trees
// =============================================================================

#[test]
fn test_render_static_tree() {
    let (_doc, root, rec) = setup();
    let tree = h(
        "div",
        Props::new().with("id", "app"),
        vec![
            h("p", Props::new(), vec!["hello".into()]).into(),
            h("p", Props::new(), vec![42.into()]).into(),
        ],
    );

    let handle = rec.render(tree, root.clone(), None).expect("render");
    assert_eq!(
        root.to_html(),
        "<body><div id=\"app\"><p>hello</p><p>42</p></div></body>"
    );
    assert_eq!(handle.state(), MountState::Mounted);

    handle.dispose().expect("dispose");
    assert_eq!(root.to_html(), "<body></body>", "dispose detaches the tree");
}

#[test]
fn test_render_before_existing_node() {
    let (doc, root, rec) = setup();
    let host = HtmlHost::new(&doc);
    let footer = host.create_element("footer").expect("create");
    host.insert_before(&root, &footer, None).expect("insert");

    let _handle = rec
        .render(h("main", Props::new(), Vec::new()), root.clone(), Some(footer))
        .expect("render");
    assert_eq!(root.to_html(), "<body><main></main><footer></footer></body>");
}

#[test]
fn test_empty_children_render_nothing() {
    let (_doc, root, rec) = setup();
    let tree = h(
        "p",
        Props::new(),
        vec![Child::from(false), "x".into(), Child::from(None::<&str>)],
    );
    let _handle = rec.render(tree, root.clone(), None).expect("render");
    assert_eq!(root.to_html(), "<body><p>x</p></body>");
}

#[test]
fn test_component_invoked_once_with_props() {
    let (_doc, root, rec) = setup();
    let calls = Rc::new(Cell::new(0));
    let calls_clone = calls.clone();

    let greeting = Kind::component(move |props| {
        calls_clone.set(calls_clone.get() + 1);
        let name = props.value("name").to_attribute().unwrap_or_default();
        h("span", Props::new(), vec![format!("hi {name}").into()]).into()
    });

    let _handle = rec
        .render(h(greeting, Props::new().with("name", "ada"), Vec::new()), root.clone(), None)
        .expect("render");
    assert_eq!(root.to_html(), "<body><span>hi ada</span></body>");
    assert_eq!(calls.get(), 1, "components run once per build");
}

// =============================================================================
// Fine-grained updates
// =============================================================================

#[test]
fn test_text_patched_in_place() {
    let (doc, root, rec) = setup();
    let label = signal(Child::from("a"));
    let _handle = rec
        .render(h("p", Props::new(), vec![label.clone().into()]), root.clone(), None)
        .expect("render");
    let text_node = root.children()[0].children()[0].clone();

    doc.reset_stats();
    label.set(Child::from("b"));

    assert_eq!(root.to_html(), "<body><p>b</p></body>");
    let stats = doc.stats();
    assert_eq!(stats.text_updates, 1);
    assert_eq!(stats.inserts + stats.removals + stats.texts_created, 0, "no remount for text");
    assert_eq!(root.children()[0].children()[0], text_node, "same text node");
}

#[test]
fn test_reactive_property_keeps_node() {
    let (doc, root, rec) = setup();
    let class = signal(Value::from("idle"));
    let node_ref = create_ref();
    let tree = h(
        "button",
        Props::new().with("class", class.clone()).node_ref(node_ref.clone()),
        vec!["go".into()],
    );
    let _handle = rec.render(tree, root.clone(), None).expect("render");
    let before = node_ref.get::<DomNode>().expect("ref set on mount");

    doc.reset_stats();
    class.set(Value::from("busy"));
    class.set(Value::from("done"));

    let after = node_ref.get::<DomNode>().expect("ref still set");
    assert_eq!(before, after, "the element is never recreated");
    assert_eq!(after.attribute("class").as_deref(), Some("done"));
    let stats = doc.stats();
    assert_eq!(stats.property_sets, 2, "one property set per change");
    assert_eq!(stats.elements_created, 0);
}

#[test]
fn test_getter_property_and_flag() {
    let (_doc, root, rec) = setup();
    let checked = signal(false);
    let checked_clone = checked.clone();
    let tree = h(
        "input",
        Props::new().with_getter("checked", move || Value::from(checked_clone.get())),
        Vec::new(),
    );
    let _handle = rec.render(tree, root.clone(), None).expect("render");
    let input = root.children()[0].clone();
    assert!(!input.has_flag(BoolAttrs::CHECKED));

    checked.set(true);
    assert!(input.has_flag(BoolAttrs::CHECKED));
    assert_eq!(root.to_html(), "<body><input checked></input></body>");
}

#[test]
fn test_cell_switches_shape() {
    let (_doc, root, rec) = setup();
    let content = signal(Child::from("text"));
    let _handle = rec
        .render(h("div", Props::new(), vec![content.clone().into()]), root.clone(), None)
        .expect("render");

    content.set(h("em", Props::new(), vec!["strong".into()]).into());
    assert_eq!(root.to_html(), "<body><div><em>strong</em></div></body>");

    content.set(Child::Empty);
    assert_eq!(root.to_html(), "<body><div></div></body>");

    content.set(Child::from(7));
    assert_eq!(root.to_html(), "<body><div>7</div></body>");
}

#[test]
fn test_late_child_inserted_at_logical_position() {
    let (_doc, root, rec) = setup();
    let visible = signal(false);
    let visible_clone = visible.clone();
    let middle = show(
        move || visible_clone.get(),
        || Child::from("b"),
        None::<fn() -> Child>,
    );

    let _handle = rec
        .render(h("p", Props::new(), vec!["a".into(), middle, "c".into()]), root.clone(), None)
        .expect("render");
    assert_eq!(root.to_html(), "<body><p>ac</p></body>");

    visible.set(true);
    assert_eq!(root.to_html(), "<body><p>abc</p></body>", "inserted before its next live sibling");

    visible.set(false);
    assert_eq!(root.to_html(), "<body><p>ac</p></body>");
}

#[test]
fn test_nested_list_anchors_to_outer_sibling() {
    let (_doc, root, rec) = setup();
    let inner = signal(Child::from(Vec::<Child>::new()));
    let _handle = rec
        .render(
            h("p", Props::new(), vec!["<".into(), inner.clone().into(), ">".into()]),
            root.clone(),
            None,
        )
        .expect("render");
    assert_eq!(root.children()[0].text_content(), "<>");

    inner.set(Child::from(vec![Child::from("x"), Child::from("y")]));
    assert_eq!(root.children()[0].text_content(), "<xy>");
}

// =============================================================================
// Keyed lists
// =============================================================================

#[test]
fn test_rotation_moves_one_entry() {
    let (doc, root, rec) = setup();
    let keys = signal(vec!["a", "b", "c", "d"]);
    let keys_clone = keys.clone();
    let list = Child::cell(move || keyed_texts(keys_clone.get()));
    let _handle = rec
        .render(h("ul", Props::new(), vec![list]), root.clone(), None)
        .expect("render");
    assert_eq!(root.children()[0].text_content(), "abcd");

    doc.reset_stats();
    keys.set(vec!["b", "c", "d", "a"]);

    assert_eq!(root.children()[0].text_content(), "bcda");
    let stats = doc.stats();
    assert_eq!((stats.removals, stats.inserts), (1, 1), "only `a` is reattached");
    assert_eq!(stats.texts_created, 0);
}

#[test]
fn test_swap_keeps_longest_increasing_run() {
    let (doc, root, rec) = setup();
    let keys = signal(vec!["A", "B", "C", "D"]);
    let keys_clone = keys.clone();
    let list = Child::cell(move || keyed_texts(keys_clone.get()));
    let _handle = rec
        .render(h("ol", Props::new(), vec![list]), root.clone(), None)
        .expect("render");
    let ol = root.children()[0].clone();
    let b = ol.children()[1].clone();
    let d = ol.children()[3].clone();

    doc.reset_stats();
    keys.set(vec!["B", "D", "A", "C"]);

    assert_eq!(ol.text_content(), "BDAC");
    assert_eq!(doc.stats().inserts, 2, "A and C move, B and D stay");
    assert_eq!(ol.children()[0], b);
    assert_eq!(ol.children()[1], d);
}

#[test]
fn test_identical_update_touches_nothing() {
    let (doc, root, rec) = setup();
    let items = ReactiveList::from_items(vec![ListItem::new(1, "one"), ListItem::new(2, "two")]);
    let tree = h("ul", Props::new().children(ChildList::observable(items.clone())), Vec::new());
    let _handle = rec.render(tree, root.clone(), None).expect("render");

    doc.reset_stats();
    items.replace(vec![ListItem::new(1, "one"), ListItem::new(2, "two")]);
    assert_eq!(doc.stats().total(), 0, "no host calls for an unchanged snapshot");
}

#[test]
fn test_reactive_list_mutations() {
    let (doc, root, rec) = setup();
    let items = ReactiveList::new();
    items.push("a", "A");
    items.push("b", "B");
    let tree = h("ul", Props::new().children(ChildList::observable(items.clone())), Vec::new());
    let _handle = rec.render(tree, root.clone(), None).expect("render");
    let ul = root.children()[0].clone();
    assert_eq!(ul.text_content(), "AB");

    doc.reset_stats();
    items.insert(1, "c", "C");
    assert_eq!(ul.text_content(), "ACB");
    assert_eq!((doc.stats().texts_created, doc.stats().inserts), (1, 1));

    items.move_item(0, 2);
    assert_eq!(ul.text_content(), "CBA");

    items.set(&Key::from("b"), "b!");
    assert_eq!(ul.text_content(), "Cb!A", "kept key rebound in place");

    items.remove_key(&Key::from("c"));
    items.clear();
    assert_eq!(ul.text_content(), "");
    assert!(rec.take_errors().is_empty());
}

#[test]
fn test_duplicate_keys_first_wins() {
    let (_doc, root, rec) = setup();
    let list = ChildList::from_items(vec![
        ListItem::new(1, "first"),
        ListItem::new(1, "second"),
        ListItem::new(2, "third"),
    ]);
    let _handle = rec
        .render(h("p", Props::new().children(list), Vec::new()), root.clone(), None)
        .expect("render");
    assert_eq!(root.children()[0].text_content(), "firstthird");
}

#[test]
fn test_each_updates_items_without_recreating() {
    #[derive(Clone, PartialEq)]
    struct Todo {
        id: i64,
        text: String,
    }

    let (doc, root, rec) = setup();
    let todos = signal(vec![
        Todo { id: 1, text: "a".into() },
        Todo { id: 2, text: "b".into() },
    ]);
    let todos_clone = todos.clone();
    let list = each(
        move || todos_clone.get(),
        |todo| todo.id,
        |todo, _key| {
            let text = todo.map(|t| Child::from(t.text));
            h("li", Props::new(), vec![Child::Cell(text)]).into()
        },
    );
    let _handle = rec
        .render(h("ul", Props::new(), vec![list]), root.clone(), None)
        .expect("render");
    assert_eq!(root.to_html(), "<body><ul><li>a</li><li>b</li></ul></body>");

    doc.reset_stats();
    todos.set(vec![
        Todo { id: 2, text: "B".into() },
        Todo { id: 1, text: "a".into() },
    ]);

    assert_eq!(root.to_html(), "<body><ul><li>B</li><li>a</li></ul></body>");
    let stats = doc.stats();
    assert_eq!(stats.elements_created, 0, "surviving keys are not re-rendered");
    assert_eq!(stats.text_updates, 1);
    assert_eq!(stats.inserts, 1, "one entry moves");
}

#[test]
fn test_unkeyed_rotation_moves_one_child() {
    let (doc, root, rec) = setup();
    let item = |label: &str| -> Child { h("i", Props::new(), vec![label.into()]).into() };
    let (a, b, c) = (item("a"), item("b"), item("c"));
    let children = signal(Child::from(vec![a.clone(), b.clone(), c.clone()]));
    let _handle = rec
        .render(h("div", Props::new(), vec![children.clone().into()]), root.clone(), None)
        .expect("render");
    let div = root.children()[0].clone();
    let first = div.children()[0].clone();

    doc.reset_stats();
    children.set(Child::from(vec![c, a, b]));

    assert_eq!(div.text_content(), "cab");
    let stats = doc.stats();
    assert_eq!(stats.inserts, 1, "only `c` is reattached");
    assert_eq!(stats.elements_created + stats.texts_created, 0, "nothing is rebuilt");
    assert_eq!(div.children()[1], first, "`a` keeps its element");
}

#[test]
fn test_nested_bindings_survive_parent_reemit() {
    let (_doc, root, rec) = setup();
    let class = signal(Value::from("a"));
    let label = signal(Child::from("x"));
    let first: Child = h(
        "li",
        Props::new().with("class", class.clone()),
        vec![label.clone().into()],
    )
    .into();
    let second: Child = h("li", Props::new(), vec!["y".into()]).into();

    let order = signal(vec![1, 2]);
    let order_clone = order.clone();
    let list = Child::cell(move || {
        let (first, second) = (first.clone(), second.clone());
        ChildList::keyed(order_clone.get(), |k| *k, move |k| {
            if k == 1 { first.clone() } else { second.clone() }
        })
        .into()
    });
    let _handle = rec
        .render(h("ul", Props::new(), vec![list]), root.clone(), None)
        .expect("render");

    order.set(vec![2, 1]);
    assert_eq!(
        root.to_html(),
        "<body><ul><li>y</li><li class=\"a\">x</li></ul></body>"
    );

    class.set(Value::from("b"));
    label.set(Child::from("X"));
    assert_eq!(
        root.to_html(),
        "<body><ul><li>y</li><li class=\"b\">X</li></ul></body>",
        "bindings inside the list outlive the reorder"
    );

    order.set(vec![1, 2]);
    assert_eq!(root.children()[0].text_content(), "Xy", "the parent cell is still live");
    assert!(rec.take_errors().is_empty());
}

#[test]
fn test_unchanged_getter_result_sets_nothing() {
    let (doc, root, rec) = setup();
    let n = signal(1);
    let n_clone = n.clone();
    let tree = h(
        "button",
        Props::new().with_getter("disabled", move || Value::from(n_clone.get() > 5)),
        Vec::new(),
    );
    let _handle = rec.render(tree, root.clone(), None).expect("render");

    doc.reset_stats();
    n.set(2);
    n.set(3);
    n.set(4);
    assert_eq!(doc.stats().property_sets, 0, "the getter result never changed");

    n.set(6);
    assert_eq!(doc.stats().property_sets, 1);
    assert!(root.children()[0].has_flag(BoolAttrs::DISABLED));
}

#[test]
fn test_reactive_list_items_stay_live_across_mutations() {
    let (doc, root, rec) = setup();
    let count = signal(Child::from(0));
    let items = ReactiveList::new();
    let tree = h("ul", Props::new().children(ChildList::observable(items.clone())), Vec::new());
    let _handle = rec.render(tree, root.clone(), None).expect("render");
    let ul = root.children()[0].clone();

    // Built inside the list's change notification.
    items.push("a", h("li", Props::new(), vec![count.clone().into()]));
    items.push("b", "B");
    items.move_item(0, 1);
    assert_eq!(ul.text_content(), "B0");

    doc.reset_stats();
    count.set(Child::from(5));
    assert_eq!(ul.text_content(), "B5");
    assert_eq!(doc.stats().text_updates, 1);

    items.insert(0, "c", "C");
    count.set(Child::from(6));
    assert_eq!(ul.text_content(), "CB6", "still live after further mutations");
    assert!(rec.take_errors().is_empty());
}

#[test]
fn test_list_observer_created_in_emission() {
    let (_doc, root, rec) = setup();
    let items = ReactiveList::new();
    let visible = signal(false);
    let visible_clone = visible.clone();
    let items_clone = items.clone();
    let list = show(
        move || visible_clone.get(),
        move || {
            h(
                "ul",
                Props::new().children(ChildList::observable(items_clone.clone())),
                Vec::new(),
            )
            .into()
        },
        None::<fn() -> Child>,
    );
    let _handle = rec
        .render(h("section", Props::new(), vec![list]), root.clone(), None)
        .expect("render");

    visible.set(true);
    items.push(1, "one");
    items.push(2, "two");
    assert_eq!(
        root.to_html(),
        "<body><section><ul>onetwo</ul></section></body>"
    );

    items.remove(0);
    assert_eq!(root.children()[0].text_content(), "two");
}

// =============================================================================
// Host contexts and refs
// =============================================================================

#[test]
fn test_svg_namespace_switch() {
    let (_doc, root, rec) = setup();
    let tree = h(
        "svg",
        Props::new(),
        vec![
            h("circle", Props::new().with("r", 4), Vec::new()).into(),
            h(
                "foreignObject",
                Props::new(),
                vec![h("div", Props::new(), Vec::new()).into()],
            )
            .into(),
        ],
    );
    let _handle = rec.render(tree, root.clone(), None).expect("render");

    let svg = root.children()[0].clone();
    let circle = svg.children()[0].clone();
    let foreign = svg.children()[1].clone();
    let div = foreign.children()[0].clone();
    assert_eq!(svg.namespace(), Some(Namespace::Svg));
    assert_eq!(circle.namespace(), Some(Namespace::Svg));
    assert_eq!(circle.attribute("r").as_deref(), Some("4"));
    assert_eq!(foreign.namespace(), Some(Namespace::Svg));
    assert_eq!(div.namespace(), Some(Namespace::Html), "foreignObject content is HTML");
}

#[test]
fn test_ref_cleared_on_dispose() {
    let (_doc, root, rec) = setup();
    let node_ref = create_ref();
    let handle = rec
        .render(
            h("input", Props::new().node_ref(node_ref.clone()), Vec::new()),
            root.clone(),
            None,
        )
        .expect("render");
    assert_eq!(node_ref.get::<DomNode>(), Some(root.children()[0].clone()));

    handle.dispose().expect("dispose");
    assert!(!node_ref.is_set());
}

// =============================================================================
// Lifecycle and errors
// =============================================================================

#[test]
fn test_mount_after_dispose_fails() {
    let (_doc, root, rec) = setup();
    let point = DynamicMountPoint::new(rec, "x".into()).expect("build");
    point.dispose();
    point.dispose();
    assert_eq!(point.state(), MountState::Disposed, "second dispose is a no-op");
    assert_eq!(point.mount(Placement::append_to(root)), Err(Error::Disposed));
}

#[test]
fn test_remount_moves_point() {
    let (doc, root, rec) = setup();
    let other = doc.create_root("aside");
    let point = DynamicMountPoint::new(rec, h("b", Props::new(), Vec::new()).into()).expect("build");
    point.mount(Placement::append_to(root.clone())).expect("mount");
    point.mount(Placement::append_to(other.clone())).expect("remount");
    assert_eq!(root.to_html(), "<body></body>");
    assert_eq!(other.to_html(), "<aside><b></b></aside>");
}

/// HTML host that refuses to create `<boom>`.
struct FailingHost {
    inner: HtmlHost,
}

impl HostAdapter<DomNode> for FailingHost {
    fn create_element(&self, tag: &str) -> Result<DomNode> {
        if tag == "boom" {
            return Err(Error::host("create_element", "unsupported tag"));
        }
        self.inner.create_element(tag)
    }

    fn create_text_node(&self, text: &str) -> Result<DomNode> {
        self.inner.create_text_node(text)
    }

    fn insert_before(&self, parent: &DomNode, child: &DomNode, before: Option<&DomNode>) -> Result<()> {
        self.inner.insert_before(parent, child, before)
    }

    fn remove_child(&self, parent: &DomNode, child: &DomNode) -> Result<()> {
        self.inner.remove_child(parent, child)
    }

    fn set_property(&self, node: &DomNode, name: &str, value: &Value) -> Result<()> {
        self.inner.set_property(node, name, value)
    }

    fn set_text_content(&self, node: &DomNode, text: &str) -> Result<()> {
        self.inner.set_text_content(node, text)
    }
}

#[test]
fn test_host_failure_propagates_from_render() {
    init_tracing();
    let doc = Document::new();
    let root = doc.create_root("body");
    let rec = Reconciler::new(FailingHost { inner: HtmlHost::new(&doc) });

    let tree = h("div", Props::new(), vec![h("boom", Props::new(), Vec::new()).into()]);
    let err = rec.render(tree, root.clone(), None).expect_err("boom cannot be created");
    assert!(err.is_host_error());
    assert_eq!(root.to_html(), "<body></body>", "nothing was attached");
}

#[test]
fn test_host_failure_in_notification_is_queued() {
    init_tracing();
    let doc = Document::new();
    let root = doc.create_root("body");
    let rec = Reconciler::new(FailingHost { inner: HtmlHost::new(&doc) });

    let content = signal(Child::from("ok"));
    let _handle = rec
        .render(h("div", Props::new(), vec![content.clone().into()]), root.clone(), None)
        .expect("render");

    content.set(h("boom", Props::new(), Vec::new()).into());
    let errors = rec.take_errors();
    assert_eq!(errors.len(), 1, "the failure has no caller, so it is queued");
    assert!(errors[0].is_host_error());
    assert!(rec.take_errors().is_empty(), "take_errors drains the queue");
}
