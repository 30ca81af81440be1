// tests/property/mod.rs

mod delay;
mod scheduler;
