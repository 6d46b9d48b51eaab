pub mod dbs;
pub mod eeg;
pub mod markers;
