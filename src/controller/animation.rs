use std::cell::Cell;
use std::rc::Rc;

use crate::model::{ControlFlag, ControlStore, Intent, SubscriptionId};

/// Clip the character should be playing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationCue {
    Run,
    Idle,
}

impl AnimationCue {
    pub fn as_str(self) -> &'static str {
        match self {
            AnimationCue::Run => "run",
            AnimationCue::Idle => "idle",
        }
    }
}

fn intent_bit(intent: Intent) -> u8 {
    match intent {
        Intent::MoveForward => 1,
        Intent::MoveBack => 1 << 1,
        Intent::MoveLeft => 1 << 2,
        Intent::MoveRight => 1 << 3,
    }
}

/// Play/stop trigger: run while any movement intent is held, idle otherwise.
/// Tracks the intents through a store subscription so it never needs to
/// borrow the store during a tick.
pub struct AnimationTrigger {
    held: Rc<Cell<u8>>,
    subscription: Option<SubscriptionId>,
    reported: AnimationCue,
}

impl AnimationTrigger {
    pub fn attach(store: &mut dyn ControlStore) -> Self {
        let initial = Intent::ALL
            .into_iter()
            .filter(|intent| store.get(intent.flag()))
            .fold(0u8, |mask, intent| mask | intent_bit(intent));
        let held = Rc::new(Cell::new(initial));

        let sink = Rc::clone(&held);
        let subscription = store.subscribe(Box::new(move |flag: ControlFlag, value: bool| {
            if let Some(intent) = flag.intent() {
                let bit = intent_bit(intent);
                let mask = if value { sink.get() | bit } else { sink.get() & !bit };
                sink.set(mask);
            }
        }));

        let mut trigger = Self {
            held,
            subscription: Some(subscription),
            reported: AnimationCue::Idle,
        };
        trigger.reported = trigger.cue();
        trigger
    }

    pub fn cue(&self) -> AnimationCue {
        if self.held.get() != 0 {
            AnimationCue::Run
        } else {
            AnimationCue::Idle
        }
    }

    /// The new cue if it changed since the last poll.
    pub fn poll(&mut self) -> Option<AnimationCue> {
        let cue = self.cue();
        if cue == self.reported {
            return None;
        }
        tracing::debug!(cue = cue.as_str(), "animation cue changed");
        self.reported = cue;
        Some(cue)
    }

    pub fn is_attached(&self) -> bool {
        self.subscription.is_some()
    }

    pub fn detach(&mut self, store: &mut dyn ControlStore) {
        if let Some(id) = self.subscription.take() {
            store.unsubscribe(id);
        }
    }
}
