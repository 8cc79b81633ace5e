//! Native module ABI shared between the host and dynamically loaded modules.

pub mod abi;
