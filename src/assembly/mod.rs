//! Record Assembly module
//!
//! Translation between stored student documents and domain students.

mod assembler;

pub use assembler::{to_record, RecordAssembler};
