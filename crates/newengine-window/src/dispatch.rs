use std::cell::{Cell, RefCell};
use std::collections::VecDeque;

/// Re-entrant event funnel for the platform thread.
///
/// A handler may submit more events while one is being processed; they are
/// appended and processed in order by the outermost `submit`.
pub struct Dispatch<E> {
    queue: RefCell<VecDeque<E>>,
    busy: Cell<bool>,
}

impl<E> Default for Dispatch<E> {
    fn default() -> Self {
        Self {
            queue: RefCell::new(VecDeque::new()),
            busy: Cell::new(false),
        }
    }
}

impl<E> Dispatch<E> {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn is_busy(&self) -> bool {
        self.busy.get()
    }

    #[inline]
    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }

    /// Queue `e`. The outermost call drains the queue through `handle`, then
    /// runs `settle` still marked busy, and returns the last `handle` result.
    /// Events submitted by `settle` are drained before returning. A nested
    /// call returns `None` right away.
    pub fn submit(
        &self,
        e: E,
        mut handle: impl FnMut(E) -> bool,
        mut settle: impl FnMut(),
    ) -> Option<bool> {
        self.queue.borrow_mut().push_back(e);
        if self.busy.get() {
            return None;
        }
        let _busy = BusyGuard::enter(&self.busy);
        let mut handled = false;
        loop {
            loop {
                let next = self.queue.borrow_mut().pop_front();
                let Some(e) = next else {
                    break;
                };
                handled = handle(e);
            }
            settle();
            if self.queue.borrow().is_empty() {
                return Some(handled);
            }
        }
    }
}

struct BusyGuard<'a>(&'a Cell<bool>);

impl<'a> BusyGuard<'a> {
    #[inline]
    fn enter(flag: &'a Cell<bool>) -> Self {
        flag.set(true);
        Self(flag)
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::panic::{catch_unwind, AssertUnwindSafe};

    #[test]
    fn nested_submissions_run_after_current_in_order() {
        let d: Dispatch<u32> = Dispatch::new();
        let log = RefCell::new(Vec::new());

        fn handle(d: &Dispatch<u32>, log: &RefCell<Vec<u32>>, e: u32) -> bool {
            log.borrow_mut().push(e);
            if e == 1 {
                assert_eq!(d.submit(2, |e| handle(d, log, e), || {}), None);
                assert_eq!(d.submit(3, |e| handle(d, log, e), || {}), None);
                // Not processed yet.
                assert_eq!(*log.borrow(), vec![1]);
            }
            e != 3
        }

        let r = d.submit(1, |e| handle(&d, &log, e), || {});
        assert_eq!(*log.borrow(), vec![1, 2, 3]);
        // Result of the last processed event.
        assert_eq!(r, Some(false));
        assert!(!d.is_busy());
        assert_eq!(d.pending(), 0);
    }

    #[test]
    fn busy_flag_resets_after_panic() {
        let d: Dispatch<u32> = Dispatch::new();
        let r = catch_unwind(AssertUnwindSafe(|| {
            d.submit(1, |_| panic!("handler failed"), || {});
        }));
        assert!(r.is_err());
        assert!(!d.is_busy());
        assert_eq!(d.submit(2, |_| true, || {}), Some(true));
    }

    #[test]
    fn settle_runs_once_per_drain_and_its_events_are_drained() {
        let d: Dispatch<u32> = Dispatch::new();
        let seen = RefCell::new(Vec::new());
        let settles = Cell::new(0);
        let r = d.submit(
            1,
            |e| {
                seen.borrow_mut().push(e);
                true
            },
            || {
                settles.set(settles.get() + 1);
                if settles.get() == 1 {
                    assert!(d.is_busy());
                    assert_eq!(d.submit(9, |_| false, || {}), None);
                }
            },
        );
        assert_eq!(r, Some(true));
        assert_eq!(*seen.borrow(), vec![1, 9]);
        assert_eq!(settles.get(), 2);
    }
}
