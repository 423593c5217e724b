//! Next-frame callbacks
//!
//! Work that must only happen after the current parse pass settles is
//! scheduled on a [`FrameQueue`] and runs when the embedder calls
//! [`Polyfill::run_frame`](crate::Polyfill::run_frame).

use std::fmt;

use crate::dom::Document;
use crate::error::Result;

pub type FrameCallback = Box<dyn FnOnce(&mut Document) -> Result<()>>;

#[derive(Default)]
pub struct FrameQueue {
    callbacks: Vec<FrameCallback>,
}

impl fmt::Debug for FrameQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameQueue")
            .field("pending", &self.callbacks.len())
            .finish()
    }
}

impl FrameQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule<F>(&mut self, callback: F)
    where
        F: FnOnce(&mut Document) -> Result<()> + 'static,
    {
        self.callbacks.push(Box::new(callback));
    }

    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }

    /// Run every callback scheduled so far, in scheduling order
    ///
    /// All callbacks run even if one fails; the first error is returned.
    pub fn run(&mut self, document: &mut Document) -> Result<()> {
        let mut first_error = None;
        for callback in std::mem::take(&mut self.callbacks) {
            if let Err(err) = callback(document) {
                first_error.get_or_insert(err);
            }
        }
        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}
