//! Copy/Cut/Paste availability probe.

use serde::{Deserialize, Serialize};

use super::{MenuAction, MenuActionFinder};
use crate::resolver::ElementRef;

/// Which built-in actions the frontmost application currently offers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuAvailability {
    pub can_copy: bool,
    pub can_cut: bool,
    pub can_paste: bool,
}

impl MenuAvailability {
    pub fn get(&self, action: MenuAction) -> bool {
        match action {
            MenuAction::Copy => self.can_copy,
            MenuAction::Cut => self.can_cut,
            MenuAction::Paste => self.can_paste,
        }
    }

    fn set(&mut self, action: MenuAction, available: bool) {
        match action {
            MenuAction::Copy => self.can_copy = available,
            MenuAction::Cut => self.can_cut = available,
            MenuAction::Paste => self.can_paste = available,
        }
    }
}

/// Look up each action once. A failed lookup marks only that action
/// unavailable.
pub async fn probe_availability(finder: &MenuActionFinder, application: ElementRef) -> MenuAvailability {
    let mut availability = MenuAvailability::default();
    for action in MenuAction::ALL {
        let available = match finder.find_menu_item(application.clone(), action).await {
            Ok(_) => true,
            Err(e) => {
                tracing::debug!(%action, error = %e, "menu action unavailable");
                false
            }
        };
        availability.set(action, available);
    }
    availability
}
