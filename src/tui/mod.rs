pub mod draw;
pub mod events;
pub mod input;
pub mod state;
pub mod view;

pub use draw::render_to_buffer;
pub use events::{handle_app_event, handle_key, run, AppEvent, Command};
pub use input::handle_composer_key;
pub use state::{App, Focus};
pub use view::ChatView;
