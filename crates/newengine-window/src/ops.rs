//! Recorded frame operations.
//!
//! Clients record an [`Ops`] list per frame and hand it over with
//! `FrameEvent::frame`. The router reads the input/semantic ops, the GPU
//! device reads the paint ops.

use bitflags::bitflags;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use crate::driver::Actions;
use crate::editor::EditorState;
use crate::geom::{Point, Rect, Rgba};
use crate::semantic::{SemanticDesc, SemanticId};

/// Identity of an input handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Tag(pub u64);

impl Tag {
    /// Fresh process-unique tag.
    pub fn next() -> Tag {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Tag(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

bitflags! {
    /// Event kinds an input area wants.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Filter: u8 {
        const POINTER = 1 << 0;
        const KEY     = 1 << 1;
        const SCROLL  = 1 << 2;
        const TEXT    = 1 << 3;
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum CursorShape {
    #[default]
    Default,
    None,
    Text,
    Pointer,
    Crosshair,
    Grab,
    Grabbing,
    Move,
    NotAllowed,
    Wait,
    Progress,
    ResizeNs,
    ResizeEw,
    ResizeNwse,
    ResizeNesw,
}

/// Soft keyboard layout hint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum InputHint {
    #[default]
    Any,
    Text,
    Number,
    Decimal,
    Email,
    Url,
    Telephone,
    Password,
}

/// Window chrome drawn by the engine when the platform doesn't.
#[derive(Debug, Clone, PartialEq)]
pub enum DecorationOp {
    TitleBar { rect: Rect, title: String, maximized: bool },
    Button { rect: Rect, action: Actions },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    Fill { rect: Rect, color: Rgba },
    Decoration(DecorationOp),
    PushOffset(Point),
    PopOffset,
    InputArea { tag: Tag, rect: Rect, filter: Filter },
    Focusable { tag: Tag, rect: Rect },
    RequestFocus(Tag),
    Cursor { rect: Rect, cursor: CursorShape },
    /// Ask for a new frame at `at`, or as soon as possible.
    Invalidate { at: Option<Instant> },
    SoftKeyboard(bool),
    InputHint(InputHint),
    Editor(EditorState),
    WriteClipboard { mime: String, data: Vec<u8> },
    ReadClipboard,
    ActionArea { rect: Rect, actions: Actions },
    PushSemantic { id: SemanticId, desc: SemanticDesc },
    PopSemantic,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ops {
    list: Vec<Op>,
}

impl Ops {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear for reuse; keeps the allocation.
    #[inline]
    pub fn reset(&mut self) {
        self.list.clear();
    }

    #[inline]
    pub fn add(&mut self, op: Op) -> &mut Self {
        self.list.push(op);
        self
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.list.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, Op> {
        self.list.iter()
    }

    /// Visit every op except offset push/pop, with the offset in effect.
    pub fn walk<'a>(&'a self, base: Point, f: &mut dyn FnMut(Point, &'a Op)) {
        let mut stack: Vec<Point> = Vec::new();
        let mut cur = base;
        for op in &self.list {
            match op {
                Op::PushOffset(p) => {
                    stack.push(cur);
                    cur = cur.add(*p);
                }
                Op::PopOffset => {
                    if let Some(prev) = stack.pop() {
                        cur = prev;
                    }
                }
                other => f(cur, other),
            }
        }
    }
}

/// What gets drawn for one frame: engine decorations plus the client's ops,
/// the latter shifted below the decorations.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameContent<'a> {
    pub decorations: Option<&'a Ops>,
    pub body: Option<&'a Ops>,
    pub offset: Point,
}

impl<'a> FrameContent<'a> {
    /// Decorations first, then the body.
    pub fn walk(&self, mut f: impl FnMut(Point, &'a Op)) {
        if let Some(d) = self.decorations {
            d.walk(Point::ZERO, &mut f);
        }
        if let Some(b) = self.body {
            b.walk(self.offset, &mut f);
        }
    }

    #[inline]
    pub fn has_body(&self) -> bool {
        self.body.is_some()
    }
}
