pub mod bundles;
pub mod counter;
pub mod digits;
pub mod logging;
pub mod relay;
pub mod scoreboard;
pub mod side;
pub mod timer_set;

pub mod drawing_support {
    pub const MAX_STRINGABLE_SECS: u16 = 5999;
    pub const MAX_CLOCK_MINUTES: u8 = 99;
    pub const MAX_SCORE: u8 = 99;
}

pub use relay::InstanceId;
