//! APU (Audio Processing Unit) building blocks.
//!
//! Reusable synthesis components for 8-bit era audio hardware. Each channel
//! and helper unit lives in its own module; a system crate assembles them
//! behind its register file and mixer.
//!
//! - **Pulse channel**: square wave with duty control, sweep, envelope and
//!   length counter
//! - **Triangle channel**: 32-step triangle wave with a linear counter
//! - **Noise channel**: 15-bit LFSR noise with envelope and length counter
//! - **DMC channel**: 1-bit delta-modulated sample playback
//! - **Envelope**: constant volume or 15-to-0 decay generator
//! - **Sweep unit**: pitch sweep with ones/twos-complement negate variants
//! - **Length counter**: note-duration down-counter with halt
//! - **Frame counter**: the quarter/half-frame sequencer driving the above

pub mod dmc;
pub mod envelope;
pub mod frame_counter;
pub mod length_counter;
pub mod noise;
pub mod pulse;
pub mod sweep;
pub mod triangle;

pub use dmc::DmcChannel;
pub use envelope::Envelope;
pub use frame_counter::FrameCounter;
pub use length_counter::{LengthCounter, LENGTH_TABLE};
pub use noise::NoiseChannel;
pub use pulse::PulseChannel;
pub use sweep::SweepUnit;
pub use triangle::TriangleChannel;
