use crossbeam_channel::{bounded, select, Receiver, Select, Sender, TryRecvError};
use parking_lot::Mutex;
use std::time::Instant;

use crate::driver::{Actions, Driver, WindowOption, Waker};
use crate::event::Event;
use crate::mailbox::Mailbox;
use crate::ops::Ops;

pub(crate) type DriverFn = Box<dyn FnOnce(&mut dyn Driver) + Send>;

/// What travels on the outgoing rendezvous.
pub(crate) enum Outgoing {
    Event(Event),
    /// Sent when the engine stops waiting for the client; never surfaced.
    Flush,
}

/// Channels shared by the client and the platform side of one window.
pub(crate) struct Fabric {
    pub driver_funcs: Mailbox<DriverFn>,
    pub wakeups: Mailbox<()>,
    pub wakeup_funcs: Mailbox<Option<Waker>>,
    pub redraws: Mailbox<()>,
    pub immediate_redraws: Mailbox<()>,
    pub scheduled_redraws: Mailbox<Instant>,
    pub options: Mailbox<Vec<WindowOption>>,
    pub actions: Mailbox<Actions>,
    pub out: Mailbox<Outgoing>,
    pub frames: Mailbox<Ops>,
    pub frame_ack: Mailbox<Ops>,

    /// Options given before the native window exists.
    initial: Mutex<Option<Vec<WindowOption>>>,

    destroy_tx: Mutex<Option<Sender<()>>>,
    destroy_rx: Receiver<()>,
}

impl Fabric {
    pub fn new(initial: Vec<WindowOption>) -> Self {
        let (destroy_tx, destroy_rx) = bounded(0);
        Self {
            driver_funcs: Mailbox::new(1),
            wakeups: Mailbox::new(1),
            wakeup_funcs: Mailbox::new(1),
            redraws: Mailbox::new(1),
            immediate_redraws: Mailbox::new(0),
            scheduled_redraws: Mailbox::new(1),
            options: Mailbox::new(1),
            actions: Mailbox::new(1),
            out: Mailbox::new(0),
            frames: Mailbox::new(0),
            frame_ack: Mailbox::new(0),
            initial: Mutex::new(Some(initial)),
            destroy_tx: Mutex::new(Some(destroy_tx)),
            destroy_rx,
        }
    }

    /// Ready (disconnected) once the window is destroyed. Nothing is ever sent on it.
    #[inline]
    pub fn destroy(&self) -> &Receiver<()> {
        &self.destroy_rx
    }

    #[inline]
    pub fn is_destroyed(&self) -> bool {
        matches!(self.destroy_rx.try_recv(), Err(TryRecvError::Disconnected))
    }

    /// Returns `false` if it was already closed.
    pub fn close_destroy(&self) -> bool {
        self.destroy_tx.lock().take().is_some()
    }

    /// Hand the initial options to the creator. `None` once created.
    pub fn take_initial(&self) -> Option<Vec<WindowOption>> {
        self.initial.lock().take()
    }

    /// Append to the initial options if the window does not exist yet.
    /// Gives the options back otherwise.
    pub fn extend_initial(&self, opts: Vec<WindowOption>) -> Option<Vec<WindowOption>> {
        match self.initial.lock().as_mut() {
            Some(v) => {
                v.extend(opts);
                None
            }
            None => Some(opts),
        }
    }

    #[inline]
    pub fn wakeup(&self) {
        self.wakeups.offer(());
    }

    /// Blocking send that gives up when the window is destroyed.
    pub fn send_unless_closed<T>(&self, tx: &Sender<T>, v: T) -> Result<(), T> {
        let mut sel = Select::new();
        let send = sel.send(tx);
        sel.recv(&self.destroy_rx);
        let op = sel.select();
        if op.index() == send {
            op.send(tx, v).map_err(|e| e.into_inner())
        } else {
            let _ = op.recv(&self.destroy_rx);
            Err(v)
        }
    }

    /// Hand an event to the client. `false` if nobody will ever read it.
    pub fn deliver(&self, e: Event) -> bool {
        self.send_unless_closed(self.out.sender(), Outgoing::Event(e)).is_ok()
    }

    /// Client side of a frame: pass the ops over and wait for them back.
    pub fn submit_frame(&self, ops: &mut Ops) {
        let owned = std::mem::take(ops);
        if let Err(back) = self.send_unless_closed(self.frames.sender(), owned) {
            *ops = back;
            return;
        }
        select! {
            recv(self.frame_ack.receiver()) -> back => {
                if let Ok(back) = back {
                    *ops = back;
                }
            }
            recv(self.destroy_rx) -> _ => {}
        }
    }

    /// Engine side: the frame is consumed, return the buffer.
    pub fn ack(&self, ops: Ops) {
        let _ = self.send_unless_closed(self.frame_ack.sender(), ops);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::Op;
    use std::thread;

    #[test]
    fn destroy_is_a_one_shot_broadcast() {
        let f = Fabric::new(Vec::new());
        assert!(!f.is_destroyed());
        assert!(f.close_destroy());
        assert!(!f.close_destroy());
        assert!(f.is_destroyed());
        assert!(f.destroy().recv().is_err());
    }

    #[test]
    fn initial_options_accumulate_until_taken() {
        let f = Fabric::new(vec![WindowOption::Title("a".into())]);
        assert!(f.extend_initial(vec![WindowOption::Decorated(false)]).is_none());
        assert_eq!(f.take_initial().map(|v| v.len()), Some(2));
        let back = f.extend_initial(vec![WindowOption::Decorated(true)]);
        assert_eq!(back, Some(vec![WindowOption::Decorated(true)]));
        assert!(f.take_initial().is_none());
    }

    #[test]
    fn sends_give_up_after_destroy() {
        let f = Fabric::new(Vec::new());
        f.close_destroy();
        assert!(!f.deliver(Event::Stage(crate::stage::Stage::Running)));
        let mut ops = Ops::new();
        ops.add(Op::PopOffset);
        f.submit_frame(&mut ops);
        // Buffer stays with the client.
        assert_eq!(ops.len(), 1);
    }

    #[test]
    fn frame_buffer_round_trips() {
        let f = std::sync::Arc::new(Fabric::new(Vec::new()));
        let engine = {
            let f = f.clone();
            thread::spawn(move || {
                let mut got = f.frames.receiver().recv().unwrap();
                let n = got.len();
                got.reset();
                f.ack(got);
                n
            })
        };
        let mut ops = Ops::new();
        ops.add(Op::PopOffset).add(Op::PopOffset);
        f.submit_frame(&mut ops);
        assert_eq!(engine.join().unwrap(), 2);
        assert!(ops.is_empty());
    }
}
