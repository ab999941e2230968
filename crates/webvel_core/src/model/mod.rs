//! Story data shapes shared by repositories, services and callers.

pub mod story;
