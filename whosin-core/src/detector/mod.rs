// ABOUTME: Line-buffered console event detection for the game server's stdout
// ABOUTME: Accumulates raw chunks into lines, classifies each line, and dispatches notifications

pub mod accumulator;
pub mod dispatcher;
pub mod matcher;

pub use accumulator::LineAccumulator;
pub use dispatcher::{EventDispatcher, NotificationSink};
pub use matcher::{match_line, MatchedEvent};
