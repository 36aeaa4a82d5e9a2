//! Input routing between the platform and the handlers recorded in a frame.

use log::{debug, trace};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use crate::anim::FrameDeadline;
use crate::driver::Actions;
use crate::editor::EditorState;
use crate::geom::{Point, PointF, Rect};
use crate::input::{InputEvent, PointerEvent, PointerKind};
use crate::ops::{CursorShape, Filter, FrameContent, InputHint, Op, Tag};
use crate::semantic::{SemanticClass, SemanticDesc, SemanticId, SemanticTree};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FocusDirection {
    Forward,
    Backward,
    Up,
    Down,
    Left,
    Right,
}

/// Pending soft keyboard change.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TextInputState {
    #[default]
    Keep,
    Open,
    Close,
}

#[derive(Debug, Clone, Copy)]
struct Area {
    tag: Tag,
    rect: Rect,
    filter: Filter,
}

#[derive(Debug, Clone)]
struct SemEntry {
    id: SemanticId,
    parent: Option<usize>,
    desc: SemanticDesc,
}

/// Handler areas, focus and per-frame requests of one window.
#[derive(Debug, Default)]
pub struct Router {
    areas: Vec<Area>,
    focusables: Vec<(Tag, Rect)>,
    cursors: Vec<(Rect, CursorShape)>,
    action_areas: Vec<(Rect, Actions)>,
    semantics: Vec<SemEntry>,
    size: Point,

    focus: Option<Tag>,
    pointer: PointF,
    queues: HashMap<Tag, VecDeque<InputEvent>>,

    wakeup: Option<FrameDeadline>,
    keyboard_shown: bool,
    text_input: TextInputState,
    hint: InputHint,
    hint_changed: bool,
    write_clipboard: Option<(String, Vec<u8>)>,
    read_clipboard: bool,
    editor: EditorState,
    actions: Actions,
}

impl Router {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Commit a drawn frame: handler areas, focusables and requests now
    /// come from `content`.
    pub fn frame(&mut self, content: &FrameContent<'_>, size: Point) {
        self.areas.clear();
        self.focusables.clear();
        self.cursors.clear();
        self.action_areas.clear();
        self.semantics.clear();
        self.size = size;

        let mut requested: Option<Tag> = None;
        let mut keyboard: Option<bool> = None;
        let mut sem_stack: Vec<usize> = Vec::new();

        content.walk(|off, op| match op {
            Op::InputArea { tag, rect, filter } => self.areas.push(Area {
                tag: *tag,
                rect: rect.translate(off),
                filter: *filter,
            }),
            Op::Focusable { tag, rect } => self.focusables.push((*tag, rect.translate(off))),
            Op::RequestFocus(tag) => requested = Some(*tag),
            Op::Cursor { rect, cursor } => self.cursors.push((rect.translate(off), *cursor)),
            Op::Invalidate { at } => {
                let dl = at.map_or(FrameDeadline::Immediate, FrameDeadline::At);
                self.wakeup = Some(self.wakeup.map_or(dl, |cur| cur.min(dl)));
            }
            Op::SoftKeyboard(show) => keyboard = Some(*show),
            Op::InputHint(h) => {
                if *h != self.hint {
                    self.hint = *h;
                    self.hint_changed = true;
                }
            }
            Op::Editor(state) => self.editor = state.clone(),
            Op::WriteClipboard { mime, data } => {
                self.write_clipboard = Some((mime.clone(), data.clone()));
            }
            Op::ReadClipboard => self.read_clipboard = true,
            Op::ActionArea { rect, actions } => self.action_areas.push((rect.translate(off), *actions)),
            Op::PushSemantic { id, desc } => {
                let mut desc = desc.clone();
                desc.bounds = desc.bounds.translate(off);
                self.semantics.push(SemEntry {
                    id: *id,
                    parent: sem_stack.last().copied(),
                    desc,
                });
                sem_stack.push(self.semantics.len() - 1);
            }
            Op::PopSemantic => {
                sem_stack.pop();
            }
            Op::Fill { .. } | Op::Decoration(_) | Op::PushOffset(_) | Op::PopOffset => {}
        });

        if let Some(show) = keyboard {
            if show != self.keyboard_shown {
                self.keyboard_shown = show;
                self.text_input = if show {
                    TextInputState::Open
                } else {
                    TextInputState::Close
                };
            }
        }

        if let Some(tag) = requested {
            self.set_focus(Some(tag));
        } else if let Some(f) = self.focus {
            let alive = self.focusables.iter().any(|(t, _)| *t == f) || self.areas.iter().any(|a| a.tag == f);
            if !alive {
                self.set_focus(None);
            }
        }

        let areas = &self.areas;
        self.queues.retain(|tag, q| !q.is_empty() && areas.iter().any(|a| a.tag == *tag));
        trace!(
            target: "window.router",
            "frame areas={} focusables={} semantics={}",
            self.areas.len(),
            self.focusables.len(),
            self.semantics.len()
        );
    }

    /// Route a platform event. Returns whether a handler took it.
    pub fn queue(&mut self, e: InputEvent) -> bool {
        match e {
            InputEvent::Key(_) => self.deliver_focused(Filter::KEY, e),
            InputEvent::Pointer(p) => self.queue_pointer(p),
            InputEvent::Edit { .. } | InputEvent::Selection(_) | InputEvent::Snippet(_) => {
                self.deliver_focused(Filter::TEXT, e)
            }
            InputEvent::Clipboard { .. } => self.deliver_focused(Filter::empty(), e),
            InputEvent::Scroll(d) => {
                self.scroll_focus(d);
                true
            }
            InputEvent::Focus(_) => false,
        }
    }

    fn queue_pointer(&mut self, p: PointerEvent) -> bool {
        self.pointer = p.position;
        if p.kind == PointerKind::Press {
            if let Some(actions) = self.action_at(p.position) {
                self.actions |= actions;
                return true;
            }
        }
        let want = if p.kind == PointerKind::Scroll {
            Filter::SCROLL
        } else {
            Filter::POINTER
        };
        let Some(tag) = self
            .areas
            .iter()
            .rev()
            .find(|a| a.filter.contains(want) && a.rect.contains(p.position))
            .map(|a| a.tag)
        else {
            return false;
        };
        if p.kind == PointerKind::Press && self.focusables.iter().any(|(t, _)| *t == tag) {
            self.set_focus(Some(tag));
        }
        self.push(tag, InputEvent::Pointer(p));
        true
    }

    fn deliver_focused(&mut self, want: Filter, e: InputEvent) -> bool {
        let Some(f) = self.focus else {
            return false;
        };
        let wants = self.areas.iter().any(|a| a.tag == f && a.filter.contains(want));
        if wants {
            self.push(f, e);
        }
        wants
    }

    #[inline]
    fn push(&mut self, tag: Tag, e: InputEvent) {
        self.queues.entry(tag).or_default().push_back(e);
    }

    fn set_focus(&mut self, tag: Option<Tag>) {
        if tag == self.focus {
            return;
        }
        if let Some(old) = self.focus {
            self.push(old, InputEvent::Focus(false));
        }
        if let Some(new) = tag {
            self.push(new, InputEvent::Focus(true));
        }
        debug!(target: "window.router", "focus {:?} -> {:?}", self.focus, tag);
        self.focus = tag;
    }

    #[inline]
    pub fn focused(&self) -> Option<Tag> {
        self.focus
    }

    fn focus_rect(&self) -> Option<Rect> {
        let f = self.focus?;
        self.focusables.iter().find(|(t, _)| *t == f).map(|(_, r)| *r)
    }

    /// Move keyboard focus. `false` when there is nowhere to go.
    pub fn move_focus(&mut self, dir: FocusDirection) -> bool {
        let n = self.focusables.len();
        if n == 0 {
            return false;
        }
        let cur = self
            .focus
            .and_then(|f| self.focusables.iter().position(|(t, _)| *t == f));
        let next = match (dir, cur) {
            (FocusDirection::Forward, None) => Some(0),
            (FocusDirection::Backward, None) => Some(n - 1),
            (FocusDirection::Forward, Some(i)) => Some((i + 1) % n),
            (FocusDirection::Backward, Some(i)) => Some((i + n - 1) % n),
            (_, None) => Some(0),
            (_, Some(i)) => self.nearest_in_direction(i, dir),
        };
        match next {
            Some(ix) if Some(ix) != cur => {
                let tag = self.focusables[ix].0;
                self.set_focus(Some(tag));
                true
            }
            _ => false,
        }
    }

    fn nearest_in_direction(&self, from: usize, dir: FocusDirection) -> Option<usize> {
        let c = self.focusables[from].1.center();
        self.focusables
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != from)
            .filter_map(|(i, (_, r))| {
                let p = r.center();
                let (along, across) = match dir {
                    FocusDirection::Right => (p.x - c.x, p.y - c.y),
                    FocusDirection::Left => (c.x - p.x, p.y - c.y),
                    FocusDirection::Down => (p.y - c.y, p.x - c.x),
                    FocusDirection::Up => (c.y - p.y, p.x - c.x),
                    FocusDirection::Forward | FocusDirection::Backward => return None,
                };
                (along > 0.0).then_some((i, along + 2.0 * across.abs()))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(i, _)| i)
    }

    /// Ask the scroll handler around the focus to bring it inside `viewport`.
    pub fn reveal_focus(&mut self, viewport: Rect) {
        let Some(r) = self.focus_rect() else {
            return;
        };
        if viewport.contains_rect(&r) {
            return;
        }
        let axis = |lo: i32, hi: i32, vlo: i32, vhi: i32| -> i32 {
            if lo < vlo {
                lo - vlo
            } else if hi > vhi {
                (hi - vhi).min(lo - vlo)
            } else {
                0
            }
        };
        let delta = Point::new(
            axis(r.min.x, r.max.x, viewport.min.x, viewport.max.x),
            axis(r.min.y, r.max.y, viewport.min.y, viewport.max.y),
        );
        self.scroll_focus(delta);
    }

    /// Send a scroll of `dist` pixels to the scroll handler around the focus.
    pub fn scroll_focus(&mut self, dist: Point) {
        if dist == Point::ZERO {
            return;
        }
        let Some(r) = self.focus_rect() else {
            return;
        };
        let c = r.center();
        let target = self
            .areas
            .iter()
            .rev()
            .find(|a| a.filter.contains(Filter::SCROLL) && a.rect.contains(c))
            .map(|a| a.tag);
        if let Some(tag) = target {
            trace!(target: "window.router", "scroll_focus tag={:?} dist={:?}", tag, dist);
            self.push(tag, InputEvent::Scroll(dist));
        }
    }

    /// Accessibility click on the focused handler.
    pub fn click_focus(&mut self) {
        let (Some(tag), Some(r)) = (self.focus, self.focus_rect()) else {
            return;
        };
        let at = r.center();
        self.push(tag, InputEvent::Pointer(PointerEvent::new(PointerKind::Press, at)));
        self.push(tag, InputEvent::Pointer(PointerEvent::new(PointerKind::Release, at)));
    }

    pub fn action_at(&self, p: PointF) -> Option<Actions> {
        self.action_areas
            .iter()
            .rev()
            .find(|(r, _)| r.contains(p))
            .map(|(_, a)| *a)
    }

    pub fn semantic_at(&self, p: PointF) -> Option<SemanticId> {
        self.semantics
            .iter()
            .rev()
            .find(|s| s.desc.bounds.contains(p))
            .map(|s| s.id)
    }

    /// Append this frame's semantic nodes into `tree`, root first.
    pub fn append_semantics(&self, tree: &mut SemanticTree) {
        let root = tree.push(
            SemanticId::ROOT,
            None,
            SemanticDesc {
                class: SemanticClass::Window,
                bounds: Rect::from_size(self.size),
                ..SemanticDesc::default()
            },
        );
        let mut ixs = Vec::with_capacity(self.semantics.len());
        for s in &self.semantics {
            let parent = s.parent.and_then(|p| ixs.get(p).copied()).unwrap_or(root);
            ixs.push(tree.push(s.id, Some(parent), s.desc.clone()));
        }
    }

    pub fn cursor(&self) -> CursorShape {
        self.cursors
            .iter()
            .rev()
            .find(|(r, _)| r.contains(self.pointer))
            .map(|(_, c)| *c)
            .unwrap_or_default()
    }

    #[inline]
    pub fn take_wakeup(&mut self) -> Option<FrameDeadline> {
        self.wakeup.take()
    }

    #[inline]
    pub fn take_text_input_state(&mut self) -> TextInputState {
        std::mem::take(&mut self.text_input)
    }

    #[inline]
    pub fn take_input_hint(&mut self) -> Option<InputHint> {
        std::mem::take(&mut self.hint_changed).then_some(self.hint)
    }

    #[inline]
    pub fn take_write_clipboard(&mut self) -> Option<(String, Vec<u8>)> {
        self.write_clipboard.take()
    }

    #[inline]
    pub fn take_read_clipboard(&mut self) -> bool {
        std::mem::take(&mut self.read_clipboard)
    }

    #[inline]
    pub fn take_actions(&mut self) -> Actions {
        std::mem::take(&mut self.actions)
    }

    #[inline]
    pub fn editor_state(&self) -> &EditorState {
        &self.editor
    }

    pub fn take_events(&mut self, tag: Tag) -> Vec<InputEvent> {
        self.queues
            .get_mut(&tag)
            .map(|q| q.drain(..).collect())
            .unwrap_or_default()
    }
}

/// Client-side view of the router, carried by `FrameEvent`.
#[derive(Clone)]
pub struct InputSource {
    router: Arc<Mutex<Router>>,
}

impl InputSource {
    #[inline]
    pub(crate) fn new(router: Arc<Mutex<Router>>) -> Self {
        Self { router }
    }

    /// Drain the events queued for `tag`.
    pub fn events(&self, tag: Tag) -> Vec<InputEvent> {
        self.router.lock().take_events(tag)
    }

    pub fn focused(&self, tag: Tag) -> bool {
        self.router.lock().focused() == Some(tag)
    }
}
