#![allow(dead_code)]

pub mod fakes;
pub mod logs;
pub mod strategies;

pub use fakes::*;
pub use logs::*;
pub use strategies::*;
