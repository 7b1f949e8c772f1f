pub mod links;
pub mod short_code;

pub use links::LinkService;
