pub mod waterfall;

pub use waterfall::RepaymentAllocator;
