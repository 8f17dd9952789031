//! Request and response bodies

pub mod company;
