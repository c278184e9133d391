pub mod pipeline;
pub mod shatter_commands;
