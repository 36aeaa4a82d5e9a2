use log::trace;
use parking_lot::Mutex;
use std::cell::{Cell, RefCell};
use std::sync::Arc;

use crate::dispatch::Dispatch;
use crate::driver::{Actions, Driver, Waker};
use crate::editor::{ImeState, TextRange};
use crate::event::PlatformEvent;
use crate::geom::PointF;
use crate::input::InputEvent;
use crate::router::{FocusDirection, Router};
use crate::semantic::{SemanticId, SemanticNode, Semantics};

use super::engine::{Side, WindowState};
use super::fabric::Fabric;
use super::WindowLink;

/// Entry points a platform backend calls on its own thread.
///
/// Every method taking a driver may be called again from inside a driver
/// method; such events are queued and handled once the outer call is done.
pub struct Callbacks {
    state: RefCell<WindowState>,
    semantic: RefCell<Semantics>,
    ime: RefCell<ImeState>,
    dispatch: Dispatch<PlatformEvent>,
    attached: Cell<bool>,
    fabric: Arc<Fabric>,
    router: Arc<Mutex<Router>>,
}

impl Callbacks {
    pub fn new(link: WindowLink) -> Self {
        let state = WindowState::new(
            link.fabric.clone(),
            link.router.clone(),
            link.devices.clone(),
            &link.config,
        );
        Self {
            state: RefCell::new(state),
            semantic: RefCell::new(Semantics::default()),
            ime: RefCell::new(ImeState::default()),
            dispatch: Dispatch::new(),
            attached: Cell::new(false),
            fabric: link.fabric,
            router: link.router,
        }
    }

    /// Attach (`Some`) or detach (`None`) the driver. The waker goes to the
    /// client so it can wake the native loop; the latest call wins if the
    /// client hasn't picked up the previous one.
    pub fn set_driver(&self, waker: Option<Waker>) {
        self.attached.set(waker.is_some());
        self.fabric.wakeup_funcs.replace(waker);
    }

    #[inline]
    pub fn is_destroyed(&self) -> bool {
        self.fabric.is_destroyed()
    }

    /// Feed a platform event. Returns whether it was handled; a nested call
    /// returns `true` and the event runs after the current one.
    ///
    /// # Panics
    ///
    /// When no driver is attached.
    pub fn event(&self, d: &mut dyn Driver, e: PlatformEvent) -> bool {
        assert!(self.attached.get(), "window event without an attached driver");
        let wakeup = matches!(e, PlatformEvent::Wakeup);
        let side = Side {
            semantic: &self.semantic,
            ime: &self.ime,
        };
        let d = RefCell::new(d);
        let mut settled = false;
        let handled = self.dispatch.submit(
            e,
            |e| {
                let mut d = d.borrow_mut();
                self.state.borrow_mut().process_event(&mut **d, e, &side)
            },
            || {
                if self.fabric.is_destroyed() {
                    return;
                }
                let mut d = d.borrow_mut();
                let mut st = self.state.borrow_mut();
                st.update_state(&mut **d);
                if wakeup && !settled {
                    settled = true;
                    st.apply_pending(&mut **d);
                }
            },
        );
        match handled {
            Some(h) => h,
            None => {
                trace!(target: "window", "event queued behind the current one");
                true
            }
        }
    }

    fn update_semantics(&self) {
        let router = self.router.lock();
        self.semantic
            .borrow_mut()
            .update(|tree| router.append_semantics(tree));
    }

    pub fn semantic_root(&self) -> SemanticId {
        self.update_semantics();
        self.semantic.borrow().root()
    }

    pub fn lookup_semantic(&self, id: SemanticId) -> Option<SemanticNode> {
        self.update_semantics();
        self.semantic.borrow().lookup(id).cloned()
    }

    /// Nodes changed since the previous tree generation.
    pub fn semantic_diffs(&self) -> Vec<SemanticId> {
        self.update_semantics();
        self.semantic.borrow().diffs()
    }

    pub fn semantic_at(&self, p: PointF) -> Option<SemanticId> {
        self.router.lock().semantic_at(p)
    }

    pub fn editor_state(&self) -> ImeState {
        self.ime.borrow().clone()
    }

    pub fn set_composing_region(&self, r: Option<TextRange>) {
        self.ime.borrow_mut().compose = r;
    }

    /// Replace the selection with `text` and put the caret after it.
    pub fn editor_insert(&self, d: &mut dyn Driver, text: &str) {
        let sel = self.ime.borrow().editor.selection.range;
        self.editor_replace(d, sel, text);
        let start = sel.normalized().start;
        self.set_editor_selection(d, TextRange::caret(start + text.chars().count()));
    }

    pub fn editor_replace(&self, d: &mut dyn Driver, r: TextRange, text: &str) {
        self.ime.borrow_mut().replace(r, text);
        self.event(
            d,
            PlatformEvent::Input(InputEvent::Edit {
                range: r,
                text: text.to_string(),
            }),
        );
        let snippet = self.ime.borrow().editor.snippet.range;
        self.event(d, PlatformEvent::Input(InputEvent::Snippet(snippet)));
    }

    pub fn set_editor_selection(&self, d: &mut dyn Driver, r: TextRange) {
        self.ime.borrow_mut().editor.selection.range = r;
        self.event(d, PlatformEvent::Input(InputEvent::Selection(r)));
    }

    /// Ask the editor to publish `r`; nothing happens if it already does.
    pub fn set_editor_snippet(&self, d: &mut dyn Driver, r: TextRange) {
        if self.ime.borrow().editor.snippet.range == r {
            return;
        }
        self.event(d, PlatformEvent::Input(InputEvent::Snippet(r)));
    }

    /// Accessibility click on the focused handler.
    pub fn click_focus(&self, d: &mut dyn Driver) {
        self.router.lock().click_focus();
        self.event(d, PlatformEvent::Redraw);
    }

    pub fn action_at(&self, p: PointF) -> Option<Actions> {
        self.router.lock().action_at(p)
    }

    pub fn move_focus(&self, d: &mut dyn Driver, dir: FocusDirection) {
        self.event(d, PlatformEvent::MoveFocus(dir));
    }
}
