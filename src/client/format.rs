//! Output formatting for CLI client commands.
//!
//! Selected text goes to stdout and metadata to stderr, so piping works
//! naturally (`xpopd client selection | pbcopy`).

use std::io::{self, Write};

use crate::input::Point;
use crate::ipc::protocol::{DaemonStatus, Message, SelectionPayload};
use crate::menu::{MenuAction, MenuAvailability};

/// Print a selection: metadata to stderr, text to stdout.
pub fn print_selection(selection: &SelectionPayload) -> Result<(), io::Error> {
    eprintln!("App:      {}", describe_app(selection));
    eprintln!("Strategy: {}", selection.strategy);
    eprintln!("Actions:  {}", format_actions(availability(selection)));
    eprintln!("---");
    let mut stdout = io::stdout().lock();
    stdout.write_all(selection.text.as_bytes())?;
    stdout.write_all(b"\n")
}

pub fn print_status(status: &DaemonStatus) {
    println!("Monitoring:  {}", yes_no(status.monitoring));
    println!("Force copy:  {}", yes_no(status.force_copy));
    println!("Subscribers: {}", status.subscribers);
    println!("Selection:   {}", yes_no(status.has_selection));
    println!("Last press:  {}", format_location(status.last_press));
    println!("Last release: {}", format_location(status.last_release));
}

/// Print one push as a single line.
pub fn print_push(message: &Message) {
    match message {
        Message::Selection { selection, .. } => println!(
            "selection {} [{}] from {} at {}: {:?}",
            selection.selection_id,
            selection.strategy,
            describe_app(selection),
            format_location(selection.release_location.or(selection.press_location)),
            selection.text,
        ),
        Message::Dismiss { .. } => println!("dismiss"),
        other => println!("unexpected push: {other:?}"),
    }
}

pub fn print_force_copy(enabled: bool) {
    println!("Force copy {}", if enabled { "enabled" } else { "disabled" });
}

pub fn print_performed(action: MenuAction) {
    println!("Performed {action}");
}

fn describe_app(selection: &SelectionPayload) -> String {
    match &selection.bundle_id {
        Some(bundle_id) => format!("{} ({bundle_id})", selection.app_name),
        None => selection.app_name.clone(),
    }
}

fn availability(selection: &SelectionPayload) -> MenuAvailability {
    MenuAvailability {
        can_copy: selection.can_copy,
        can_cut: selection.can_cut,
        can_paste: selection.can_paste,
    }
}

/// Available built-in actions as a comma-separated list.
fn format_actions(availability: MenuAvailability) -> String {
    let actions: Vec<&str> = MenuAction::ALL
        .into_iter()
        .filter(|a| availability.get(*a))
        .map(MenuAction::as_str)
        .collect();
    if actions.is_empty() {
        "-".to_string()
    } else {
        actions.join(",")
    }
}

fn format_location(point: Option<Point>) -> String {
    match point {
        Some(p) => format!("({:.0}, {:.0})", p.x, p.y),
        None => "-".to_string(),
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag { "yes" } else { "no" }
}
