//! Plain-English rendering of classified interactions.

use chrono::{DateTime, Utc};

use crate::models::{Context, Interaction, InteractionKind};

/// One sentence describing the interaction.
pub fn describe(interaction: &Interaction) -> String {
    let first = interaction.first_event();
    let button = first.button().map(|b| b.as_str()).unwrap_or("unknown");
    let at = format_position(first.position());
    let target = describe_target(interaction.context());

    match interaction.kind() {
        InteractionKind::Click => format!("Clicked the {button} button at {at}{target}."),
        InteractionKind::DoubleClick => {
            format!("Double-clicked the {button} button at {at}{target}.")
        }
        InteractionKind::Drag => {
            let to = format_position(interaction.last_event().position());
            format!("Dragged with the {button} button from {at} to {to}{target}.")
        }
        InteractionKind::Scroll => {
            let (dx, dy) = interaction.scroll_totals();
            format!("Scrolled vertically by {dy} and horizontally by {dx}{target}.")
        }
        InteractionKind::SingleKeyPress => {
            format!("Pressed {}{target}.", key_label(interaction))
        }
        InteractionKind::KeyHeld => format!(
            "Held {} for {:.1}s{target}.",
            key_label(interaction),
            interaction.duration_secs()
        ),
        InteractionKind::Typing => {
            format!("Typed \"{}\"{target}.", interaction.typed_text())
        }
    }
}

/// Describe a whole batch, one line per interaction, prefixed with the time
/// it started.
pub fn render(interactions: &[Interaction]) -> Vec<String> {
    interactions
        .iter()
        .map(|interaction| {
            format!(
                "[{}] {}",
                format_clock(interaction.start_timestamp()),
                describe(interaction)
            )
        })
        .collect()
}

fn key_label(interaction: &Interaction) -> String {
    match interaction.first_event().key() {
        Some(key) if key.char.is_some() => format!("\"{}\"", key.label()),
        Some(key) => format!("the {} key", key.label()),
        None => "an unknown key".to_string(),
    }
}

fn format_position(position: Option<(u32, u32)>) -> String {
    match position {
        Some((x, y)) => format!("({x}, {y})"),
        None => "(?, ?)".to_string(),
    }
}

fn describe_target(context: &Context) -> String {
    let mut target = String::new();
    if let Some(control) = &context.control_name {
        target.push_str(&format!(" on \"{control}\""));
    }
    match (&context.window_title, &context.process_name) {
        (Some(window), Some(process)) => {
            target.push_str(&format!(" in \"{window}\" ({process})"))
        }
        (Some(window), None) => target.push_str(&format!(" in \"{window}\"")),
        (None, Some(process)) => target.push_str(&format!(" in {process}")),
        (None, None) => {}
    }
    target
}

fn format_clock(timestamp: f64) -> String {
    let secs = timestamp.floor();
    let nanos = ((timestamp - secs) * 1e9) as u32;
    match DateTime::<Utc>::from_timestamp(secs as i64, nanos) {
        Some(time) => time.format("%H:%M:%S%.3f").to_string(),
        None => format!("{timestamp:.3}s"),
    }
}
