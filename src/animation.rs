/// Easing curves.
pub mod ease;
/// Ping-pong crop-window motion.
pub mod motion;
