mod clipboard;
mod save;

pub use clipboard::Clipboard;
pub use save::SaveClient;
