//! Boundary around third-party codecs.
//!
//! The JPEG and PNG crates report malformed input through `Result`s, but a
//! decoder bug on adversarial input may still panic. Every call into them
//! goes through [`guard`], which turns both cases into an [`ImageError`]
//! instead of unwinding through (or aborting) the caller.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use crate::error::ImageError;

pub(crate) fn guard<T>(
    codec: &'static str,
    f: impl FnOnce() -> Result<T, ImageError>,
) -> Result<T, ImageError> {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            tracing::error!(codec, %message, "intercepted panic inside codec");
            Err(ImageError::codec(codec, message))
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "codec panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passes_results_through() {
        assert_eq!(guard("test", || Ok(7)).unwrap(), 7);
        let err = guard::<()>("test", || Err(ImageError::UnexpectedEof)).unwrap_err();
        assert!(matches!(err, ImageError::UnexpectedEof));
    }

    #[test]
    fn panic_becomes_codec_error() {
        let err = guard::<()>("test", || panic!("bad huffman table")).unwrap_err();
        match err {
            ImageError::Codec { codec, message } => {
                assert_eq!(codec, "test");
                assert!(message.contains("bad huffman table"));
            }
            other => panic!("expected Codec, got {other:?}"),
        }
    }
}
