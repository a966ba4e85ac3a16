//! Codec module - SSH wire format and device payload conversion.
//!
//! - [`Cursor`] - bounds-checked reader used for every structured input
//! - [`decompress`] / [`build_ssh_public_key_blob`] - device point to SSH key blob
//! - [`encode_ssh_signature`] - device signature to SSH signature blob
//!
//! # Example
//!
//! ```
//! use ledger_ssh_agent::codec::{build_ssh_public_key_blob, Cursor};
//!
//! let blob = build_ssh_public_key_blob("ecdsa-sha2-nistp256", "nistp256", &[1; 32], &[2; 32]);
//! let mut cursor = Cursor::new(blob.as_bytes().to_vec());
//! assert_eq!(&cursor.read_string().unwrap()[..], b"ecdsa-sha2-nistp256");
//! ```

mod key;
mod signature;
mod wire;

pub use key::{
    build_ssh_public_key_blob, compressed_point_from_response, decompress, PublicKeyBlob,
    COORDINATE_SIZE, UNCOMPRESSED_MARKER,
};
pub use signature::{encode_ssh_signature, SignatureBlob};
pub use wire::{put_string, wrap_length, Cursor, OutOfBounds};
