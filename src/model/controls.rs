use std::cell::RefCell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

/// Sustained movement desire, decoupled from the keys that produce it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Intent {
    MoveForward,
    MoveBack,
    MoveLeft,
    MoveRight,
}

impl Intent {
    pub const ALL: [Intent; 4] = [
        Intent::MoveForward,
        Intent::MoveBack,
        Intent::MoveLeft,
        Intent::MoveRight,
    ];

    pub const fn flag(self) -> ControlFlag {
        match self {
            Intent::MoveForward => ControlFlag::MoveForward,
            Intent::MoveBack => ControlFlag::MoveBack,
            Intent::MoveLeft => ControlFlag::MoveLeft,
            Intent::MoveRight => ControlFlag::MoveRight,
        }
    }
}

/// Every boolean held by the control store: the four intents plus the two
/// UI-owned switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlFlag {
    MoveForward,
    MoveBack,
    MoveLeft,
    MoveRight,
    OrbitEnabled,
    ShowBounds,
}

const FLAG_COUNT: usize = 6;

impl ControlFlag {
    const fn index(self) -> usize {
        match self {
            ControlFlag::MoveForward => 0,
            ControlFlag::MoveBack => 1,
            ControlFlag::MoveLeft => 2,
            ControlFlag::MoveRight => 3,
            ControlFlag::OrbitEnabled => 4,
            ControlFlag::ShowBounds => 5,
        }
    }

    pub fn intent(self) -> Option<Intent> {
        match self {
            ControlFlag::MoveForward => Some(Intent::MoveForward),
            ControlFlag::MoveBack => Some(Intent::MoveBack),
            ControlFlag::MoveLeft => Some(Intent::MoveLeft),
            ControlFlag::MoveRight => Some(Intent::MoveRight),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

pub type ControlListener = Box<dyn FnMut(ControlFlag, bool)>;

/// Injected control-flag capability.
///
/// Listeners run synchronously inside `set` and must not call back into the
/// store they are registered on.
pub trait ControlStore {
    fn get(&self, flag: ControlFlag) -> bool;
    fn set(&mut self, flag: ControlFlag, value: bool);
    fn subscribe(&mut self, listener: ControlListener) -> SubscriptionId;
    fn unsubscribe(&mut self, id: SubscriptionId) -> bool;
}

pub type SharedControls = Rc<RefCell<dyn ControlStore>>;

/// In-memory store. Intents start released, orbit starts enabled and the
/// bounds overlay starts hidden.
pub struct ControlState {
    flags: [bool; FLAG_COUNT],
    listeners: Vec<(SubscriptionId, ControlListener)>,
    next_id: u64,
}

impl ControlState {
    pub fn new() -> Self {
        let mut flags = [false; FLAG_COUNT];
        flags[ControlFlag::OrbitEnabled.index()] = true;
        Self {
            flags,
            listeners: Vec::new(),
            next_id: 0,
        }
    }

    pub fn shared() -> SharedControls {
        Rc::new(RefCell::new(Self::new()))
    }
}

impl Default for ControlState {
    fn default() -> Self {
        Self::new()
    }
}

impl ControlStore for ControlState {
    fn get(&self, flag: ControlFlag) -> bool {
        self.flags[flag.index()]
    }

    fn set(&mut self, flag: ControlFlag, value: bool) {
        let slot = &mut self.flags[flag.index()];
        if *slot == value {
            return;
        }
        *slot = value;
        for (_, listener) in self.listeners.iter_mut() {
            listener(flag, value);
        }
    }

    fn subscribe(&mut self, listener: ControlListener) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, listener));
        id
    }

    fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sid, _)| *sid != id);
        self.listeners.len() != before
    }
}

/// Per-tick snapshot of the four intents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Intents {
    pub forward: bool,
    pub back: bool,
    pub left: bool,
    pub right: bool,
}

impl Intents {
    pub fn read(store: &dyn ControlStore) -> Self {
        Self {
            forward: store.get(ControlFlag::MoveForward),
            back: store.get(ControlFlag::MoveBack),
            left: store.get(ControlFlag::MoveLeft),
            right: store.get(ControlFlag::MoveRight),
        }
    }

    pub fn any(&self) -> bool {
        self.forward || self.back || self.left || self.right
    }

    /// +1 forward, -1 back, 0 when idle or both held.
    pub fn longitudinal(&self) -> f32 {
        (self.forward as i8 - self.back as i8) as f32
    }

    /// +1 left, -1 right, 0 when idle or both held.
    pub fn lateral(&self) -> f32 {
        (self.left as i8 - self.right as i8) as f32
    }
}
