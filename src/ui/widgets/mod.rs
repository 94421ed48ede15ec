pub mod controls;
pub mod help_view;
pub mod status_bar;
pub mod waveform;

pub use controls::render_controls;
pub use help_view::render_help_view;
pub use status_bar::render_status_bar;
pub use waveform::render_waveform;
