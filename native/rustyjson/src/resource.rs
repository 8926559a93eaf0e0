// ResourceArc wrapper for the stream driver
//
// This allows the stream state to persist across NIF calls.

use crate::stream::JsonStream;
use rustler::ResourceArc;
use std::sync::Mutex;

/// Wrapper for JsonStream that can be stored in a ResourceArc
pub struct JsonStreamResource {
    pub inner: Mutex<JsonStream>,
}

impl JsonStreamResource {
    pub fn new(buf: Vec<u8>) -> Self {
        JsonStreamResource {
            inner: Mutex::new(JsonStream::new(buf)),
        }
    }

    pub fn with_batch_size(buf: Vec<u8>, batch_size: usize) -> Self {
        JsonStreamResource {
            inner: Mutex::new(JsonStream::with_batch_size(buf, batch_size)),
        }
    }
}

/// Type alias for the ResourceArc
pub type JsonStreamRef = ResourceArc<JsonStreamResource>;
