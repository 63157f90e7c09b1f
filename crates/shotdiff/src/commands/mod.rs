mod compare;
mod init;
mod insight;
mod test;

pub use self::compare::compare;
pub use self::init::init;
pub use self::insight::{InsightArgs, insight};
pub use self::test::test;
