mod loop_mode;
mod play;
mod shards;

pub use loop_mode::LoopCommand;
pub use play::PlayCommand;
pub use shards::ShardsCommand;
