//! Read-only access to id Tech 3 map content: the BSP lump directory, the
//! entity text stored in it, and the engine's pk3/map checksums.
#![forbid(unsafe_code)]

pub mod bsp_q3;
pub mod checksum;
pub mod diagnostic;
pub mod entities;
