mod common;
mod usage;
