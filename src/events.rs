/// One keystroke in a finished macro.
///
/// `time` is seconds from the start of playback. Within a macro, times are
/// non-decreasing; ties have already been staggered by chord rolling.
#[derive(Debug, Clone, PartialEq)]
pub struct MacroEvent {
    pub time: f64,
    pub key: String,
    pub pitch: u8,
    pub channel: u8,
}

/// Total playing time of a macro: the timestamp of its last event.
pub fn total_duration(events: &[MacroEvent]) -> f64 {
    events.last().map(|e| e.time).unwrap_or(0.0)
}
