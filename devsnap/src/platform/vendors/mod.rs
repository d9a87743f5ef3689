//! Built-in vendor platform definitions.

pub mod cisco_ios;
pub mod fortinet;
pub mod juniper;
pub mod linux;
