//! Academy records as the REST backend returns and accepts them.

mod page;
mod records;

pub use page::Page;
pub use records::{
    Batch, BatchInput, BatchType, BatchTypeInput, Class, ClassInput, Mentor, MentorInput,
    MentorSession, MentorSessionInput, Record, Student, StudentInput,
};
