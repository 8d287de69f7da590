//! Bookkeeping for locally issued feedback events.

use ngf_proxy::Proplist;

use crate::event::{Event, EventState};

/// Outcome of binding a server id to a pending record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Bind {
    /// The server id was stored on the record.
    Bound,
    /// The record was removed before the reply arrived.
    Gone,
    /// Another record already carries this server id.
    Duplicate,
}

/// Ordered collection of tracked events.
///
/// Records are kept in creation order so that by-name lookup resolves to
/// the most recently created match when names repeat. Client ids are
/// handed out monotonically starting at 1 and are never reused; `0` is
/// reserved as the "no event" sentinel.
#[derive(Debug)]
pub(crate) struct EventRegistry {
    events: Vec<Event>,
    next_client_id: u32,
}

impl EventRegistry {
    pub fn new() -> Self {
        Self {
            events: Vec::new(),
            next_client_id: 1,
        }
    }

    /// Create a record in state `New` and return its client id.
    pub fn create(&mut self, name: &str, properties: Proplist) -> u32 {
        let client_id = self.next_client_id;
        self.next_client_id += 1;
        self.events.push(Event {
            client_id,
            server_id: 0,
            name: name.to_owned(),
            properties,
            state: EventState::New,
        });
        client_id
    }

    pub fn get(&self, client_id: u32) -> Option<&Event> {
        self.events.iter().find(|event| event.client_id == client_id)
    }

    /// Record carrying the given non-zero server id, if any.
    pub fn get_by_server_id(&mut self, server_id: u32) -> Option<&mut Event> {
        self.events
            .iter_mut()
            .find(|event| event.server_id == server_id)
    }

    /// Most recently created record with the given name.
    pub fn latest_by_name(&self, name: &str) -> Option<&Event> {
        self.events.iter().rev().find(|event| event.name == name)
    }

    /// Store the server-assigned id on a record still awaiting its reply.
    ///
    /// Refuses to introduce a second record with the same non-zero
    /// server id, keeping server-id lookup unambiguous.
    pub fn bind_server_id(&mut self, client_id: u32, server_id: u32) -> Bind {
        if self.events.iter().any(|event| event.server_id == server_id) {
            return Bind::Duplicate;
        }
        match self
            .events
            .iter_mut()
            .find(|event| event.client_id == client_id)
        {
            Some(event) => {
                event.server_id = server_id;
                Bind::Bound
            }
            None => Bind::Gone,
        }
    }

    /// Detach the play payload from a record.
    ///
    /// A play request is sent at most once per record, so the property
    /// map is moved out rather than copied. The record itself stays
    /// tracked.
    pub fn take_play_request(&mut self, client_id: u32) -> Option<(String, Proplist)> {
        let event = self
            .events
            .iter_mut()
            .find(|event| event.client_id == client_id)?;
        Some((event.name.clone(), std::mem::take(&mut event.properties)))
    }

    pub fn remove(&mut self, client_id: u32) -> Option<Event> {
        let index = self
            .events
            .iter()
            .position(|event| event.client_id == client_id)?;
        Some(self.events.remove(index))
    }

    pub fn remove_by_server_id(&mut self, server_id: u32) -> Option<Event> {
        let index = self
            .events
            .iter()
            .position(|event| event.server_id == server_id)?;
        Some(self.events.remove(index))
    }

    /// Take every record, oldest first, leaving the registry empty.
    pub fn drain(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_ids_start_at_one_and_increase() {
        let mut registry = EventRegistry::new();
        assert_eq!(registry.create("ringtone", Proplist::new()), 1);
        assert_eq!(registry.create("chat", Proplist::new()), 2);
        assert_eq!(registry.create("ringtone", Proplist::new()), 3);
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn removed_ids_are_not_reused() {
        let mut registry = EventRegistry::new();
        let first = registry.create("alert", Proplist::new());
        registry.remove(first);
        let second = registry.create("alert", Proplist::new());
        assert!(second > first);
    }

    #[test]
    fn new_records_have_no_server_id() {
        let mut registry = EventRegistry::new();
        let id = registry.create("ringtone", Proplist::new());
        let event = registry.get(id).unwrap();
        assert_eq!(event.server_id, 0);
        assert_eq!(event.state, EventState::New);
    }

    #[test]
    fn by_name_lookup_resolves_most_recent_match() {
        let mut registry = EventRegistry::new();
        let first = registry.create("alert", Proplist::new());
        let second = registry.create("alert", Proplist::new());
        assert_eq!(registry.latest_by_name("alert").unwrap().client_id, second);

        registry.remove(second);
        assert_eq!(registry.latest_by_name("alert").unwrap().client_id, first);
        assert!(registry.latest_by_name("battery_low").is_none());
    }

    #[test]
    fn bind_server_id_rejects_duplicates() {
        let mut registry = EventRegistry::new();
        let first = registry.create("ringtone", Proplist::new());
        let second = registry.create("ringtone", Proplist::new());

        assert_eq!(registry.bind_server_id(first, 42), Bind::Bound);
        assert_eq!(registry.bind_server_id(second, 42), Bind::Duplicate);
        assert_eq!(registry.get(second).unwrap().server_id, 0);
    }

    #[test]
    fn bind_server_id_reports_removed_records() {
        let mut registry = EventRegistry::new();
        let id = registry.create("ringtone", Proplist::new());
        registry.remove(id);
        assert_eq!(registry.bind_server_id(id, 42), Bind::Gone);
    }

    #[test]
    fn server_id_lookup_works_only_after_binding() {
        let mut registry = EventRegistry::new();
        let id = registry.create("ringtone", Proplist::new());
        assert!(registry.get_by_server_id(42).is_none());

        registry.bind_server_id(id, 42);
        assert_eq!(registry.get_by_server_id(42).unwrap().client_id, id);
        assert!(registry.remove_by_server_id(42).is_some());
        assert!(registry.is_empty());
    }

    #[test]
    fn take_play_request_moves_the_payload_out() {
        let mut registry = EventRegistry::new();
        let mut properties = Proplist::new();
        properties.insert(
            "media.role".to_owned(),
            zbus::zvariant::OwnedValue::try_from(zbus::zvariant::Value::from("camera")).unwrap(),
        );
        let id = registry.create("shutter", properties);

        let (name, taken) = registry.take_play_request(id).unwrap();
        assert_eq!(name, "shutter");
        assert_eq!(taken.len(), 1);

        // The record is still tracked, only its payload moved.
        assert_eq!(registry.get(id).unwrap().state, EventState::New);
        assert!(registry.get(id).unwrap().properties.is_empty());
        assert!(registry.take_play_request(77).is_none());
    }

    #[test]
    fn drain_returns_records_in_creation_order() {
        let mut registry = EventRegistry::new();
        registry.create("a", Proplist::new());
        registry.create("b", Proplist::new());
        registry.create("c", Proplist::new());

        let drained = registry.drain();
        let ids: Vec<u32> = drained.iter().map(|event| event.client_id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert!(registry.is_empty());
    }
}
