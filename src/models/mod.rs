pub mod admission;
pub mod bed;
pub mod clinician;
pub mod enums;
pub mod invoice;
pub mod notification;
pub mod patient;

pub use admission::*;
pub use bed::*;
pub use clinician::*;
pub use invoice::*;
pub use notification::*;
pub use patient::*;
