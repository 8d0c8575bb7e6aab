//! Typed, indexed events (§6 "Events"). Every state change emits one of
//! these; they are appended to the block result and never read back by
//! deterministic logic.

use cosmwasm_std::{Attribute, Event};

/// Builds a `cosmwasm_std::Event` tagged with `module` and `action`,
/// mirroring the teacher's `attr("action", ...)` convention but as a
/// first-class, named event rather than a loose attribute bag.
pub fn module_event(module: &str, action: &str, attrs: Vec<(&str, String)>) -> Event {
    let mut event = Event::new(format!("meridian.{module}"));
    event = event.add_attribute("action", action);
    for (key, value) in attrs {
        event = event.add_attribute(key, value);
    }
    event
}

/// Convenience for call sites that already built a `Vec<Attribute>`.
pub fn module_event_from_attrs(module: &str, action: &str, attrs: Vec<Attribute>) -> Event {
    let mut event = Event::new(format!("meridian.{module}")).add_attribute("action", action);
    for a in attrs {
        event = event.add_attribute(a.key, a.value);
    }
    event
}
