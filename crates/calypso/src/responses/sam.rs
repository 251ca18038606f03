//! SAM response extractors

use bytes::Bytes;

use crate::{Error, Result};

fn exact(data: &[u8], length: u8, what: &'static str) -> Result<Bytes> {
    if data.len() != usize::from(length) {
        return Err(Error::MalformedResponse(what));
    }
    Ok(Bytes::copy_from_slice(data))
}

/// Challenge returned by Get Challenge
pub fn challenge(data: &[u8], length: u8) -> Result<Bytes> {
    exact(data, length, "SAM challenge length does not match the request")
}

/// Terminal half-signature returned by Digest Close
pub fn signature(data: &[u8], length: u8) -> Result<Bytes> {
    exact(data, length, "SAM signature length does not match the request")
}

/// Cryptogram returned by Card Generate Key
pub fn ciphered_key(data: &[u8]) -> Result<Bytes> {
    match data.len() {
        24 | 32 => Ok(Bytes::copy_from_slice(data)),
        _ => Err(Error::MalformedResponse("ciphered key must be 24 or 32 bytes")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lengths_are_checked() {
        assert_eq!(challenge(&[1, 2, 3, 4], 4).unwrap().as_ref(), &[1, 2, 3, 4]);
        assert!(matches!(challenge(&[1, 2, 3], 4), Err(Error::MalformedResponse(_))));
        assert!(signature(&[0; 8], 8).is_ok());
        assert!(signature(&[0; 8], 4).is_err());
        assert!(ciphered_key(&[0; 32]).is_ok());
        assert!(ciphered_key(&[0; 24]).is_ok());
        assert!(ciphered_key(&[0; 16]).is_err());
    }
}
