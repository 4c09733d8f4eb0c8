mod history;

pub use history::*;
