//! Runtime-independent protocol pieces: framing, masking, keys, handshake.

pub mod frame;
pub mod handshake;
pub mod key;
pub mod mask;
pub mod opcode;
pub mod utf8;
pub mod validation;

pub use frame::{Frame, FrameHeader, MAX_CONTROL_FRAME_PAYLOAD, encode_frame, parse_header};
pub use handshake::{ValidatedHandshake, build_request, parse_response};
pub use key::{KeyPair, WS_GUID, compute_accept_key};
pub use mask::{MaskGenerator, apply_mask, apply_mask_fast};
pub use opcode::OpCode;
pub use utf8::TextDecoder;
pub use validation::FrameValidator;
