mod support;

use crossbeam_channel::bounded;

use newengine_window::editor::{EditorState, Selection, Snippet, TextRange};
use newengine_window::input::{InputEvent, KeyEvent, KeyName, Modifiers};
use newengine_window::ops::{Filter, InputHint, Op, Tag};
use newengine_window::semantic::{SemanticClass, SemanticDesc, SemanticId};
use newengine_window::{Event, FrameEvent, Ops, PlatformEvent, PointF, Rect};
use support::{frame_request, plain_config, Call, Harness};

fn next_frame(h: &mut Harness) -> FrameEvent {
    h.send(frame_request(200, 100));
    loop {
        match h.next() {
            Event::Frame(ev) => return ev,
            Event::Destroy(d) => panic!("destroyed: {:?}", d.err),
            _ => {}
        }
    }
}

fn button(label: &str) -> Op {
    Op::PushSemantic {
        id: SemanticId(1),
        desc: SemanticDesc {
            class: SemanticClass::Button,
            label: label.to_string(),
            bounds: Rect::new(0, 0, 50, 20),
            ..SemanticDesc::default()
        },
    }
}

#[test]
fn semantic_tree_follows_frames() {
    let mut h = Harness::new(plain_config());
    h.start();
    let mut ops = Ops::new();
    ops.add(button("ok")).add(Op::PopSemantic);
    next_frame(&mut h).frame(&mut ops);

    let (tx, rx) = bounded(1);
    h.call(move |cb, _| {
        let root = cb.semantic_root();
        let node = cb.lookup_semantic(SemanticId::ROOT);
        let at = cb.semantic_at(PointF::new(10.0, 10.0));
        let diffs = cb.semantic_diffs();
        tx.send((root, node, at, diffs)).unwrap();
    });
    let (root, node, at, diffs) = rx.recv().unwrap();
    assert_eq!(root, SemanticId::ROOT);
    let node = node.expect("root node");
    assert_eq!(node.desc.class, SemanticClass::Window);
    assert_eq!(node.children.len(), 1);
    assert_eq!(at, Some(SemanticId(1)));
    assert!(diffs.is_empty());

    ops.reset();
    ops.add(button("cancel")).add(Op::PopSemantic);
    next_frame(&mut h).frame(&mut ops);

    let (tx, rx) = bounded(1);
    h.call(move |cb, _| {
        let label = cb
            .lookup_semantic(SemanticId(1))
            .map(|n| n.desc.label.clone());
        tx.send((cb.semantic_diffs(), label)).unwrap();
    });
    let (diffs, label) = rx.recv().unwrap();
    assert_eq!(diffs, vec![SemanticId(1)]);
    assert_eq!(label.as_deref(), Some("cancel"));
    h.shutdown();
}

#[test]
fn editor_edits_reach_the_focused_handler() {
    let mut h = Harness::new(plain_config());
    h.start();
    let tag = Tag::next();
    let area = Rect::new(0, 0, 200, 40);
    let mut ops = Ops::new();
    ops.add(Op::InputArea {
        tag,
        rect: area,
        filter: Filter::TEXT | Filter::KEY,
    })
    .add(Op::Focusable { tag, rect: area })
    .add(Op::RequestFocus(tag))
    .add(Op::SoftKeyboard(true))
    .add(Op::InputHint(InputHint::Email))
    .add(Op::Editor(EditorState {
        selection: Selection {
            range: TextRange::caret(5),
            ..Selection::default()
        },
        snippet: Snippet {
            range: TextRange::new(0, 5),
            text: "hello".into(),
        },
    }));
    next_frame(&mut h).frame(&mut ops);
    h.sync();
    let calls = h.calls();
    assert!(calls.contains(&Call::ShowTextInput(true)));
    assert!(calls.contains(&Call::InputHint(InputHint::Email)));
    assert!(calls.contains(&Call::EditorChanged));

    let (tx, rx) = bounded(1);
    h.call(move |cb, d| {
        cb.editor_insert(d, "!");
        tx.send(cb.editor_state()).unwrap();
    });
    let ime = rx.recv().unwrap();
    assert_eq!(ime.editor.snippet.text, "hello!");
    assert_eq!(ime.editor.selection.range, TextRange::caret(6));

    let ev = next_frame(&mut h);
    assert_eq!(
        ev.source.events(tag),
        vec![
            InputEvent::Focus(true),
            InputEvent::Edit {
                range: TextRange::caret(5),
                text: "!".into(),
            },
            InputEvent::Snippet(TextRange::new(0, 6)),
            InputEvent::Selection(TextRange::caret(6)),
        ]
    );
    ev.frame(&mut ops);
    h.shutdown();
}

#[test]
fn tab_moves_focus_when_nobody_handles_it() {
    let mut h = Harness::new(plain_config());
    h.start();
    let (a, b) = (Tag::next(), Tag::next());
    let mut ops = Ops::new();
    ops.add(Op::Focusable {
        tag: a,
        rect: Rect::new(0, 0, 50, 20),
    })
    .add(Op::Focusable {
        tag: b,
        rect: Rect::new(0, 30, 50, 50),
    });
    next_frame(&mut h).frame(&mut ops);

    let tab = |m| PlatformEvent::Input(InputEvent::Key(KeyEvent::press(KeyName::Tab, m)));
    h.send(tab(Modifiers::empty()));
    let ev = next_frame(&mut h);
    assert!(ev.source.focused(a));
    ev.frame(&mut ops);

    h.send(tab(Modifiers::SHIFT));
    let ev = next_frame(&mut h);
    // Backward from the first wraps to the last.
    assert!(ev.source.focused(b));
    ev.frame(&mut ops);
    h.shutdown();
}

#[test]
fn accessibility_move_focus_requests_a_frame() {
    let mut h = Harness::new(plain_config());
    h.start();
    let a = Tag::next();
    let mut ops = Ops::new();
    ops.add(Op::Focusable {
        tag: a,
        rect: Rect::new(0, 0, 50, 20),
    });
    next_frame(&mut h).frame(&mut ops);

    h.call(|cb, d| cb.move_focus(d, newengine_window::router::FocusDirection::Forward));
    h.sync();
    assert!(h.calls().contains(&Call::Animating(true)));
    let ev = next_frame(&mut h);
    assert!(ev.source.focused(a));
    ev.frame(&mut ops);
    h.shutdown();
}
