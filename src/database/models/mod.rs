pub mod student;
pub mod mark;

pub use student::*;
pub use mark::*;
