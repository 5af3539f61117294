//! Plain-text report rendering
//!
//! Rendering is pure: it only formats the snapshots it is given.
//!
//! ```text
//! Heating report
//! 10.03.2024 14:00:00 UTC
//!
//! Supply temperature: 54.3 °C, 1h average 52.1 °C (360/360 samples)
//! Boiler air temperature: 21.0 °C, average 20.8 °C, insufficient history (12/360 samples)
//! Return temperature: data unavailable
//! ```

use std::fmt::Write;

use chrono::{DateTime, Utc};

use crate::{aggregate::ChannelSnapshot, monitors::hysteresis::AlertState};

pub const UNAVAILABLE: &str = "data unavailable";
pub const INSUFFICIENT_HISTORY: &str = "insufficient history";
pub const ALARM: &str = "ALARM";

/// Render a report over the given channel snapshots
pub fn render(title: &str, now: DateTime<Utc>, channels: &[ChannelSnapshot]) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "{title}");
    let _ = writeln!(out, "{}", now.format("%d.%m.%Y %H:%M:%S UTC"));
    out.push('\n');

    if channels.is_empty() {
        out.push_str("no channels configured\n");
        return out;
    }

    for channel in channels {
        out.push_str(&render_line(channel));
        out.push('\n');
    }

    out
}

/// Single report line for one channel
pub fn render_line(channel: &ChannelSnapshot) -> String {
    let name = &channel.display_name;
    let unit = &channel.unit;

    let (Some(last), Some(average)) = (channel.last_value(), channel.average) else {
        return format!("{name}: {UNAVAILABLE}");
    };

    let mut line = if channel.has_full_history() {
        format!(
            "{name}: {last:.1} {unit}, 1h average {average:.1} {unit} ({}/{} samples)",
            channel.count, channel.capacity
        )
    } else {
        format!(
            "{name}: {last:.1} {unit}, average {average:.1} {unit}, {INSUFFICIENT_HISTORY} ({}/{} samples)",
            channel.count, channel.capacity
        )
    };

    if channel.alert_state == Some(AlertState::Tripped) {
        let _ = write!(line, " [{ALARM}]");
    }

    line
}
