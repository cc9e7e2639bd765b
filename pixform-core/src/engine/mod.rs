//! One-shot execution: decode, load parameters, resolve, bind, execute, encode.

pub(crate) mod pipeline;
