use crate::sim::catalog::Tree;
use crate::sim::prestige::ResetKind;
use std::fmt;
use std::sync::Mutex;
use tokio::sync::Notify;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Work,
    Buy { tree: Tree, id: String },
    BuyWake(String),
    Reset(ResetKind),
    ToggleAuto,
    Focus,
    Wager,
    Save,
    Quit,
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Work => write!(f, "work"),
            Command::Buy { tree, id } => write!(f, "buy:{}:{id}", tree.key()),
            Command::BuyWake(id) => write!(f, "wake:{id}"),
            Command::Reset(ResetKind::Inspiration) => write!(f, "reset:inspiration"),
            Command::Reset(ResetKind::Concept) => write!(f, "reset:concepts"),
            Command::ToggleAuto => write!(f, "auto"),
            Command::Focus => write!(f, "focus"),
            Command::Wager => write!(f, "wager"),
            Command::Save => write!(f, "save"),
            Command::Quit => write!(f, "quit"),
        }
    }
}

/// Single pending value shared between the input task and the loop. A new post replaces an unread one.
#[derive(Debug)]
pub struct Mailbox<T> {
    slot: Mutex<Option<T>>,
    notify: Notify,
}

impl<T> Default for Mailbox<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Mailbox<T> {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(None),
            notify: Notify::new(),
        }
    }

    /// Returns the value it displaced, if the loop had not drained it yet.
    pub fn post(&self, value: T) -> Option<T> {
        let displaced = match self.slot.lock() {
            Ok(mut guard) => guard.replace(value),
            Err(poisoned) => poisoned.into_inner().replace(value),
        };
        self.notify.notify_one();
        displaced
    }

    pub fn take(&self) -> Option<T> {
        match self.slot.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        }
    }

    pub async fn notified(&self) {
        self.notify.notified().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_log_as_short_tokens() {
        let logged: Vec<String> = [
            Command::Work,
            Command::Buy {
                tree: Tree::Hall,
                id: "muse".to_string(),
            },
            Command::BuyWake("power_nap".to_string()),
            Command::Reset(ResetKind::Inspiration),
            Command::Reset(ResetKind::Concept),
            Command::ToggleAuto,
        ]
        .iter()
        .map(ToString::to_string)
        .collect();
        assert_eq!(
            logged,
            [
                "work",
                "buy:hall:muse",
                "wake:power_nap",
                "reset:inspiration",
                "reset:concepts",
                "auto"
            ]
        );
    }

    #[test]
    fn mailbox_needs_no_default_payload() {
        struct Opaque;
        let mailbox: Mailbox<Opaque> = Mailbox::new();
        assert!(mailbox.post(Opaque).is_none());
        assert!(mailbox.take().is_some());
    }

    #[test]
    fn mailbox_keeps_only_the_latest_value() {
        let mailbox = Mailbox::new();
        assert_eq!(mailbox.post(Command::Work), None);
        assert_eq!(mailbox.post(Command::Focus), Some(Command::Work));
        assert_eq!(mailbox.take(), Some(Command::Focus));
        assert_eq!(mailbox.take(), None);
    }
}
