// Playback: queue navigation and the player state it drives
pub mod playback;
pub mod queue;
