//! Locations (customer sites, terminals, yards) with their comments and
//! contacts.

pub mod comment;
pub mod contact;
pub mod model;

pub use comment::LocationComment;
pub use contact::LocationContact;
pub use model::Location;
