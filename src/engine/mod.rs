// Pure scheduling and progression logic, no I/O

pub mod recurrence;
pub mod progression;
