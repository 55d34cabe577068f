//! Membership engines: team allocation, league joining, switching, and the
//! notification confirm/reject workflow

pub mod allocator;
pub mod join;
pub mod notify;
pub mod switch;
