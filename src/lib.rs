pub mod console_display;
pub mod context;
pub mod error;
pub mod export;
pub mod ingestion;
pub mod input;
pub mod line_source;
pub mod render_loop;
pub mod renderer;
pub mod ring_buffer;
pub mod sample_parser;
pub mod simulator;
pub mod types;
pub mod view_state;

#[cfg(feature = "hardware")]
pub mod serial_reader;
