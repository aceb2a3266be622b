// Copyright 2024 New Vector Ltd.
// Copyright 2022 The Matrix.org Foundation C.I.C.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

use std::collections::HashMap;
use std::rc::Rc;

use crate::events::{Event, EventName};

/// A subscriber. It gets mutable access to the object that fired the
/// event, so it can react by calling back into it.
pub type Listener<C> = Rc<dyn Fn(&mut C, &Event)>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

struct Registration<C> {
    id: ListenerId,
    listener: Listener<C>,
    once: bool,
}

/// Publish/subscribe registry keyed by [EventName].
///
/// Listeners run synchronously in the order they were registered. Each
/// firing works on a snapshot: listeners added while it runs wait for the
/// next firing, and listeners removed while it runs still get this one.
pub struct Dispatcher<C> {
    next_id: u64,
    listeners: HashMap<EventName, Vec<Registration<C>>>,
}

impl<C> Default for Dispatcher<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> Dispatcher<C> {
    pub fn new() -> Self {
        Self {
            next_id: 0,
            listeners: HashMap::new(),
        }
    }

    pub fn on(
        &mut self,
        name: EventName,
        listener: impl Fn(&mut C, &Event) + 'static,
    ) -> ListenerId {
        self.register(name, Rc::new(listener), false)
    }

    /// Like [Dispatcher::on], but the listener is dropped after its first
    /// call.
    pub fn once(
        &mut self,
        name: EventName,
        listener: impl Fn(&mut C, &Event) + 'static,
    ) -> ListenerId {
        self.register(name, Rc::new(listener), true)
    }

    /// Returns false if no listener has this id (any more).
    pub fn off(&mut self, id: ListenerId) -> bool {
        for registrations in self.listeners.values_mut() {
            if let Some(index) = registrations.iter().position(|r| r.id == id)
            {
                registrations.remove(index);
                return true;
            }
        }
        false
    }

    pub fn listener_count(&self, name: EventName) -> usize {
        self.listeners.get(&name).map_or(0, Vec::len)
    }

    /// The listeners to call for one firing of `name`. One-shot listeners
    /// are unregistered here.
    pub fn snapshot(&mut self, name: EventName) -> Vec<Listener<C>> {
        let Some(registrations) = self.listeners.get_mut(&name) else {
            return Vec::new();
        };
        let ret = registrations.iter().map(|r| r.listener.clone()).collect();
        registrations.retain(|r| !r.once);
        ret
    }

    fn register(
        &mut self,
        name: EventName,
        listener: Listener<C>,
        once: bool,
    ) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.entry(name).or_default().push(Registration {
            id,
            listener,
            once,
        });
        id
    }
}

/// Something that owns a [Dispatcher] for itself.
pub trait Dispatch: Sized {
    fn dispatcher(&mut self) -> &mut Dispatcher<Self>;
}

/// Deliver `event` to every listener `target` has for it.
pub fn fire<C: Dispatch>(target: &mut C, event: &Event) {
    let listeners = target.dispatcher().snapshot(event.name);
    log::trace!("Firing {} to {} listener(s)", event.name, listeners.len());
    for listener in listeners {
        listener(target, event);
    }
}

#[cfg(test)]
mod test {
    use std::cell::Cell;

    use speculoos::prelude::*;

    use super::*;

    #[derive(Default)]
    struct Recorder {
        dispatcher: Dispatcher<Recorder>,
        seen: Vec<String>,
    }

    impl Dispatch for Recorder {
        fn dispatcher(&mut self) -> &mut Dispatcher<Self> {
            &mut self.dispatcher
        }
    }

    fn load() -> Event {
        Event::new(EventName::Load)
    }

    #[test]
    fn listeners_run_in_registration_order() {
        let mut recorder = Recorder::default();
        recorder
            .dispatcher
            .on(EventName::Load, |r, _| r.seen.push(String::from("first")));
        recorder
            .dispatcher
            .on(EventName::Load, |r, _| r.seen.push(String::from("second")));
        recorder
            .dispatcher
            .on(EventName::Blur, |r, _| r.seen.push(String::from("blur")));

        fire(&mut recorder, &load());

        assert_eq!(recorder.seen, vec!["first", "second"]);
    }

    #[test]
    fn once_listeners_fire_a_single_time() {
        let mut recorder = Recorder::default();
        recorder
            .dispatcher
            .once(EventName::Load, |r, e| r.seen.push(e.name.to_string()));

        fire(&mut recorder, &load());
        fire(&mut recorder, &load());

        assert_eq!(recorder.seen, vec!["load"]);
        assert_eq!(recorder.dispatcher.listener_count(EventName::Load), 0);
    }

    #[test]
    fn off_unsubscribes() {
        let mut recorder = Recorder::default();
        let id = recorder
            .dispatcher
            .on(EventName::Load, |r, _| r.seen.push(String::from("x")));

        assert!(recorder.dispatcher.off(id));
        assert!(!recorder.dispatcher.off(id));
        fire(&mut recorder, &load());

        assert_that!(recorder.seen).is_empty();
    }

    #[test]
    fn listeners_added_while_firing_wait_for_the_next_firing() {
        let mut recorder = Recorder::default();
        recorder.dispatcher.once(EventName::Load, |r, _| {
            r.seen.push(String::from("outer"));
            r.dispatcher
                .on(EventName::Load, |r, _| r.seen.push(String::from("inner")));
        });

        fire(&mut recorder, &load());
        assert_eq!(recorder.seen, vec!["outer"]);

        fire(&mut recorder, &load());
        assert_eq!(recorder.seen, vec!["outer", "inner"]);
    }

    #[test]
    fn listeners_removed_while_firing_still_get_that_firing() {
        let mut recorder = Recorder::default();
        let second = Rc::new(Cell::new(None));
        let to_remove = second.clone();
        recorder.dispatcher.on(EventName::Load, move |r, _| {
            if let Some(id) = to_remove.get() {
                r.dispatcher.off(id);
            }
        });
        second.set(Some(
            recorder
                .dispatcher
                .on(EventName::Load, |r, _| r.seen.push(String::from("late"))),
        ));

        fire(&mut recorder, &load());
        fire(&mut recorder, &load());

        assert_eq!(recorder.seen, vec!["late"]);
    }

    #[test]
    fn listeners_can_fire_other_events() {
        let mut recorder = Recorder::default();
        recorder.dispatcher.on(EventName::BeforeLoad, |r, _| {
            r.seen.push(String::from("beforeload"));
            fire(r, &Event::new(EventName::Load));
        });
        recorder
            .dispatcher
            .on(EventName::Load, |r, _| r.seen.push(String::from("load")));

        fire(&mut recorder, &Event::new(EventName::BeforeLoad));

        assert_eq!(recorder.seen, vec!["beforeload", "load"]);
    }
}
