//! Pure notation arithmetic: durations, pitches and translation tables

pub mod duration;
pub mod pitch;
pub mod tables;

pub use duration::{BaseScaling, DurationType, Rational};
pub use pitch::{Pitch, PitchMode, Step};
