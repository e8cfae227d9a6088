//! Instruction set support for the system/privileged subset.
//!
//! The full decoder is an external collaborator; this module holds the seam
//! it plugs into and a reference implementation of the subset the control
//! path needs:
//! 1. **Opcodes:** Encoding constants and field extractors.
//! 2. **Decode:** The [`decode::InstDecoder`] trait and [`decode::SystemDecoder`].

/// Reference decoder and the decoder trait.
pub mod decode;

/// Opcode constants and field extractors.
pub mod opcodes;
