pub mod about;
pub mod check;
pub mod context;
pub mod link;
pub mod ls;
pub mod scan;
