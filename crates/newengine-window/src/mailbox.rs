use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};

/// One logical channel of the window fabric.
///
/// Both ends live together; the window hands out `&Mailbox` to whichever side
/// needs it. Capacity 0 is a rendezvous, capacity 1 a coalescing slot.
pub struct Mailbox<T> {
    tx: Sender<T>,
    rx: Receiver<T>,
}

impl<T> Mailbox<T> {
    #[inline]
    pub fn new(cap: usize) -> Self {
        let (tx, rx) = bounded(cap);
        Self { tx, rx }
    }

    #[inline]
    pub fn sender(&self) -> &Sender<T> {
        &self.tx
    }

    #[inline]
    pub fn receiver(&self) -> &Receiver<T> {
        &self.rx
    }

    /// Non-blocking send. On a full slot (or no waiting receiver for a
    /// rendezvous) the value is dropped.
    #[inline]
    pub fn offer(&self, v: T) -> bool {
        self.tx.try_send(v).is_ok()
    }

    #[inline]
    pub fn try_take(&self) -> Option<T> {
        self.rx.try_recv().ok()
    }

    /// Overwrite whatever is pending.
    #[inline]
    pub fn replace(&self, v: T) {
        let _ = self.rx.try_recv();
        let _ = self.tx.try_send(v);
    }

    /// Put `v` into the slot, folding in a pending value with `fold(old, new)`
    /// instead of waiting for the consumer. Gives up once `closed` says so.
    pub fn merge(&self, mut v: T, closed: impl Fn() -> bool, fold: impl Fn(T, T) -> T) -> bool {
        loop {
            if closed() {
                return false;
            }
            match self.tx.try_send(v) {
                Ok(()) => return true,
                Err(TrySendError::Full(back)) => {
                    v = match self.rx.try_recv() {
                        Ok(old) => fold(old, back),
                        Err(_) => back,
                    };
                }
                Err(TrySendError::Disconnected(_)) => return false,
            }
        }
    }
}
