//! Property tests for the pieces of the window engine that are pure state:
//!
//! 1. The pending frame deadline is the earliest one requested.
//! 2. Replacing text keeps positions outside the edit consistent, and
//!    putting a deleted span back restores text and selection.
//! 3. Rune and UTF-16 offsets convert back and forth.
//! 4. Deleted semantic nodes never show up as diffs.
//! 5. Nested dispatch keeps submission order.

use proptest::prelude::*;
use std::cell::RefCell;
use std::time::{Duration, Instant};

use newengine_window::anim::{Animation, FrameDeadline};
use newengine_window::dispatch::Dispatch;
use newengine_window::editor::{EditorState, ImeState, Selection, Snippet, TextRange};
use newengine_window::semantic::{SemanticDesc, SemanticId, SemanticTree, Semantics};

// ── Helpers ─────────────────────────────────────────────────────────────

fn deadline_strategy(base: Instant) -> impl Strategy<Value = FrameDeadline> {
    prop_oneof![
        1 => Just(FrameDeadline::Immediate),
        4 => (0u64..10_000).prop_map(move |ms| FrameDeadline::At(base + Duration::from_millis(ms))),
    ]
}

fn text_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop_oneof![
            Just('a'),
            Just('é'),
            Just('中'),
            Just('😀'),
            Just('𝄞'),
        ],
        0..24,
    )
    .prop_map(|cs| cs.into_iter().collect())
}

fn ime(text: &str, start: usize, sel: TextRange) -> ImeState {
    ImeState {
        editor: EditorState {
            selection: Selection {
                range: sel,
                ..Selection::default()
            },
            snippet: Snippet {
                range: TextRange::new(start, start + text.chars().count()),
                text: text.to_string(),
            },
        },
        compose: None,
    }
}

fn fill(tree: &mut SemanticTree, children: &[u64]) {
    let root = tree.push(SemanticId::ROOT, None, SemanticDesc::default());
    for &id in children {
        tree.push(SemanticId(id), Some(root), SemanticDesc::default());
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 1. Deadline is the minimum
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn pending_deadline_is_the_earliest(
        seq in prop::collection::vec(deadline_strategy(Instant::now()), 1..16)
    ) {
        let mut anim = Animation::default();
        for d in &seq {
            anim.set_next_frame(*d);
        }
        let min = seq.iter().copied().min();
        prop_assert_eq!(anim.next_frame(), min);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 2. Replace
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn replace_splices_text_and_shifts_positions(
        text in text_strategy(),
        insert in text_strategy(),
        a in 0usize..32,
        b in 0usize..32,
        p in 0usize..40,
    ) {
        let len = text.chars().count();
        let (a, b) = (a.min(len), b.min(len));
        let r = TextRange::new(a.min(b), a.max(b));
        // Positions inside the replaced span have no single right answer.
        prop_assume!(p <= r.start || p > r.end);

        let mut s = ime(&text, 0, TextRange::caret(p));
        s.replace(r, &insert);

        let chars: Vec<char> = text.chars().collect();
        let want: String = chars[..r.start]
            .iter()
            .chain(insert.chars().collect::<Vec<_>>().iter())
            .chain(chars[r.end..].iter())
            .collect();
        prop_assert_eq!(&s.editor.snippet.text, &want);
        prop_assert_eq!(s.editor.snippet.range, TextRange::new(0, want.chars().count()));

        let moved = if p <= r.start {
            p
        } else {
            p - r.end + r.start + insert.chars().count()
        };
        prop_assert_eq!(s.editor.selection.range, TextRange::caret(moved));
    }

    #[test]
    fn deleting_then_reinserting_restores_text_and_selection(
        text in text_strategy(),
        a in 0usize..32,
        b in 0usize..32,
        p in 0usize..40,
    ) {
        let len = text.chars().count();
        let (a, b) = (a.min(len), b.min(len));
        let r = TextRange::new(a.min(b), a.max(b));
        prop_assume!(p <= r.start || p > r.end);

        let orig = ime(&text, 0, TextRange::caret(p));
        let cut: String = text.chars().skip(r.start).take(r.end - r.start).collect();

        let mut s = orig.clone();
        s.replace(r, "");
        s.replace(TextRange::caret(r.start), &cut);

        prop_assert_eq!(&s.editor.snippet.text, &orig.editor.snippet.text);
        prop_assert_eq!(s.editor.snippet.range, orig.editor.snippet.range);
        prop_assert_eq!(s.editor.selection.range, orig.editor.selection.range);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 3. Offset conversions
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn utf16_and_rune_offsets_round_trip(
        text in text_strategy(),
        start in 0usize..8,
        extra in 0usize..4,
    ) {
        let s = ime(&text, start, TextRange::caret(start));
        let n = start + text.chars().count() + extra;
        for runes in 0..=n {
            let units = s.utf16_index(runes);
            prop_assert!(units >= runes);
            prop_assert_eq!(s.runes_index(units), runes);
        }
        let total: usize = text.chars().map(char::len_utf16).sum();
        prop_assert_eq!(s.utf16_index(start + text.chars().count()), start + total);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 4. Diffs
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn removed_nodes_are_not_reported(n in 1u64..8, gone in 0u64..8) {
        let gone = 1 + gone % n;
        let before: Vec<u64> = (1..=n).collect();
        let after: Vec<u64> = before.iter().copied().filter(|&id| id != gone).collect();

        let mut sem = Semantics::default();
        sem.update(|t| fill(t, &before));
        sem.invalidate();
        sem.update(|t| fill(t, &after));

        let diffs = sem.diffs();
        prop_assert!(!diffs.contains(&SemanticId(gone)));
        // The parent lost a child.
        prop_assert!(diffs.contains(&SemanticId::ROOT));
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 5. Dispatch order
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn nested_events_keep_submission_order(fanout in prop::collection::vec(0u32..4, 1..8)) {
        let d: Dispatch<(usize, u32)> = Dispatch::new();
        let seen = RefCell::new(Vec::new());
        let mut expected = Vec::new();
        for (i, &k) in fanout.iter().enumerate() {
            expected.push((i, 0));
            for j in 1..=k {
                expected.push((i, j));
            }
        }

        fn handle(
            d: &Dispatch<(usize, u32)>,
            seen: &RefCell<Vec<(usize, u32)>>,
            fanout: &[u32],
            e: (usize, u32),
        ) -> bool {
            seen.borrow_mut().push(e);
            if e.1 == 0 {
                for j in 1..=fanout[e.0] {
                    d.submit((e.0, j), |e| handle(d, seen, fanout, e), || {});
                }
                if e.0 + 1 < fanout.len() {
                    d.submit((e.0 + 1, 0), |e| handle(d, seen, fanout, e), || {});
                }
            }
            true
        }

        let r = d.submit((0, 0), |e| handle(&d, &seen, &fanout, e), || {});
        prop_assert_eq!(r, Some(true));
        prop_assert_eq!(&*seen.borrow(), &expected);
        prop_assert!(!d.is_busy());
    }
}
