pub mod directory;
mod path_parser;

pub use directory::{next_card_number, Directory, FindError, LoadError, Located, SaveError};
pub use path_parser::construct_lesson_path;
