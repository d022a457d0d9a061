//! Platform-agnostic keyboard to intent mapping
use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::model::{ControlStore, Intent};

/// The physical keys the controller listens to, named after DOM `code` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ControlKey {
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    KeyW,
    KeyA,
    KeyS,
    KeyD,
}

impl ControlKey {
    pub const ALL: [ControlKey; 8] = [
        ControlKey::ArrowUp,
        ControlKey::ArrowDown,
        ControlKey::ArrowLeft,
        ControlKey::ArrowRight,
        ControlKey::KeyW,
        ControlKey::KeyA,
        ControlKey::KeyS,
        ControlKey::KeyD,
    ];

    /// Parse a DOM `KeyboardEvent.code`.
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.code() == code)
    }

    pub const fn code(self) -> &'static str {
        match self {
            ControlKey::ArrowUp => "ArrowUp",
            ControlKey::ArrowDown => "ArrowDown",
            ControlKey::ArrowLeft => "ArrowLeft",
            ControlKey::ArrowRight => "ArrowRight",
            ControlKey::KeyW => "KeyW",
            ControlKey::KeyA => "KeyA",
            ControlKey::KeyS => "KeyS",
            ControlKey::KeyD => "KeyD",
        }
    }
}

/// Key mapping configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyBindings {
    pub forward: Vec<ControlKey>,
    pub back: Vec<ControlKey>,
    pub left: Vec<ControlKey>,
    pub right: Vec<ControlKey>,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            forward: vec![ControlKey::ArrowUp, ControlKey::KeyW],
            back: vec![ControlKey::ArrowDown, ControlKey::KeyS],
            left: vec![ControlKey::ArrowLeft, ControlKey::KeyA],
            right: vec![ControlKey::ArrowRight, ControlKey::KeyD],
        }
    }
}

impl KeyBindings {
    pub fn keys_for(&self, intent: Intent) -> &[ControlKey] {
        match intent {
            Intent::MoveForward => &self.forward,
            Intent::MoveBack => &self.back,
            Intent::MoveLeft => &self.left,
            Intent::MoveRight => &self.right,
        }
    }

    /// First intent bound to `key`.
    pub fn intent_for(&self, key: ControlKey) -> Option<Intent> {
        Intent::ALL
            .into_iter()
            .find(|intent| self.keys_for(*intent).contains(&key))
    }
}

/// What releasing one of several keys bound to the same intent does.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReleasePolicy {
    /// The intent stays active while any of its keys is still held.
    #[default]
    AnyHeld,
    /// Every key event overwrites the intent; releasing any bound key clears
    /// it even if another bound key is still down.
    LastEvent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyDisposition {
    /// Bound key: the host should suppress its default action.
    Consumed(Intent),
    Ignored,
}

impl KeyDisposition {
    pub fn is_consumed(&self) -> bool {
        matches!(self, KeyDisposition::Consumed(_))
    }
}

/// Turns key-down/key-up events into intent flags on a control store.
#[derive(Debug, Clone)]
pub struct InputMapper {
    bindings: KeyBindings,
    policy: ReleasePolicy,
    held: HashSet<ControlKey>,
}

impl InputMapper {
    pub fn new(bindings: KeyBindings, policy: ReleasePolicy) -> Self {
        Self {
            bindings,
            policy,
            held: HashSet::new(),
        }
    }

    pub fn bindings(&self) -> &KeyBindings {
        &self.bindings
    }

    pub fn policy(&self) -> ReleasePolicy {
        self.policy
    }

    pub fn is_held(&self, key: ControlKey) -> bool {
        self.held.contains(&key)
    }

    pub fn key_down(&mut self, code: &str, store: &mut dyn ControlStore) -> KeyDisposition {
        let Some((key, intent)) = self.resolve(code) else {
            tracing::trace!(code, "ignoring unbound key");
            return KeyDisposition::Ignored;
        };
        self.held.insert(key);
        store.set(intent.flag(), true);
        KeyDisposition::Consumed(intent)
    }

    pub fn key_up(&mut self, code: &str, store: &mut dyn ControlStore) -> KeyDisposition {
        let Some((key, intent)) = self.resolve(code) else {
            return KeyDisposition::Ignored;
        };
        self.held.remove(&key);
        let still_held = match self.policy {
            ReleasePolicy::AnyHeld => self
                .bindings
                .keys_for(intent)
                .iter()
                .any(|k| self.held.contains(k)),
            ReleasePolicy::LastEvent => false,
        };
        store.set(intent.flag(), still_held);
        KeyDisposition::Consumed(intent)
    }

    /// Focus loss: forget every held key and clear all intents.
    pub fn release_all(&mut self, store: &mut dyn ControlStore) {
        self.held.clear();
        for intent in Intent::ALL {
            store.set(intent.flag(), false);
        }
    }

    fn resolve(&self, code: &str) -> Option<(ControlKey, Intent)> {
        let key = ControlKey::from_code(code)?;
        let intent = self.bindings.intent_for(key)?;
        Some((key, intent))
    }
}

impl Default for InputMapper {
    fn default() -> Self {
        Self::new(KeyBindings::default(), ReleasePolicy::default())
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub mod native {
    use winit::keyboard::{KeyCode, PhysicalKey};

    use super::ControlKey;

    /// DOM-style `code` string for a winit key, if it is one we bind.
    pub fn key_code(key: PhysicalKey) -> Option<&'static str> {
        let control = match key {
            PhysicalKey::Code(KeyCode::ArrowUp) => ControlKey::ArrowUp,
            PhysicalKey::Code(KeyCode::ArrowDown) => ControlKey::ArrowDown,
            PhysicalKey::Code(KeyCode::ArrowLeft) => ControlKey::ArrowLeft,
            PhysicalKey::Code(KeyCode::ArrowRight) => ControlKey::ArrowRight,
            PhysicalKey::Code(KeyCode::KeyW) => ControlKey::KeyW,
            PhysicalKey::Code(KeyCode::KeyA) => ControlKey::KeyA,
            PhysicalKey::Code(KeyCode::KeyS) => ControlKey::KeyS,
            PhysicalKey::Code(KeyCode::KeyD) => ControlKey::KeyD,
            _ => return None,
        };
        Some(control.code())
    }

}

#[cfg(target_arch = "wasm32")]
pub mod wasm {
    use std::cell::RefCell;
    use std::rc::Rc;

    use wasm_bindgen::closure::Closure;
    use wasm_bindgen::{JsCast, JsValue};
    use web_sys::{Document, Event, KeyboardEvent, Window};

    use super::InputMapper;
    use crate::model::SharedControls;

    /// Document/window key listeners, removed again when dropped.
    pub struct KeyListeners {
        document: Document,
        window: Window,
        keydown: Closure<dyn FnMut(KeyboardEvent)>,
        keyup: Closure<dyn FnMut(KeyboardEvent)>,
        blur: Closure<dyn FnMut(Event)>,
    }

    impl KeyListeners {
        pub fn attach(
            window: &Window,
            document: &Document,
            mapper: Rc<RefCell<InputMapper>>,
            controls: SharedControls,
        ) -> Result<Self, JsValue> {
            let keydown = {
                let mapper = mapper.clone();
                let controls = controls.clone();
                Closure::wrap(Box::new(move |e: KeyboardEvent| {
                    let disposition = mapper
                        .borrow_mut()
                        .key_down(&e.code(), &mut *controls.borrow_mut());
                    if disposition.is_consumed() {
                        e.prevent_default();
                    }
                }) as Box<dyn FnMut(KeyboardEvent)>)
            };

            let keyup = {
                let mapper = mapper.clone();
                let controls = controls.clone();
                Closure::wrap(Box::new(move |e: KeyboardEvent| {
                    mapper
                        .borrow_mut()
                        .key_up(&e.code(), &mut *controls.borrow_mut());
                }) as Box<dyn FnMut(KeyboardEvent)>)
            };

            // Focus loss - clear all keys
            let blur = Closure::wrap(Box::new(move |_e: Event| {
                mapper.borrow_mut().release_all(&mut *controls.borrow_mut());
            }) as Box<dyn FnMut(Event)>);

            // built before registering so a failed registration still unregisters on drop
            let listeners = Self {
                document: document.clone(),
                window: window.clone(),
                keydown,
                keyup,
                blur,
            };
            listeners.document.add_event_listener_with_callback(
                "keydown",
                listeners.keydown.as_ref().unchecked_ref(),
            )?;
            listeners.document.add_event_listener_with_callback(
                "keyup",
                listeners.keyup.as_ref().unchecked_ref(),
            )?;
            listeners
                .window
                .add_event_listener_with_callback("blur", listeners.blur.as_ref().unchecked_ref())?;
            tracing::debug!("key listeners attached");
            Ok(listeners)
        }
    }

    impl Drop for KeyListeners {
        fn drop(&mut self) {
            let _ = self.document.remove_event_listener_with_callback(
                "keydown",
                self.keydown.as_ref().unchecked_ref(),
            );
            let _ = self.document.remove_event_listener_with_callback(
                "keyup",
                self.keyup.as_ref().unchecked_ref(),
            );
            let _ = self
                .window
                .remove_event_listener_with_callback("blur", self.blur.as_ref().unchecked_ref());
            tracing::debug!("key listeners removed");
        }
    }
}
