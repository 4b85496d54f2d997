mod common;
mod explanation;
mod recommendations;
mod registry;
