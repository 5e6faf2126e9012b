pub mod lookup;
pub mod resume;
pub mod run;
