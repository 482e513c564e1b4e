mod client;
mod consumer;
mod dead_letter;
mod producer;

pub use client::*;
pub use consumer::*;
pub use dead_letter::*;
pub use producer::*;
