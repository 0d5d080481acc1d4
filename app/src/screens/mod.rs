mod form;
mod list;

pub use form::{FormScreen, Submitted};
pub use list::StudentsScreen;
