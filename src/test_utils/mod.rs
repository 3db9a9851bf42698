//! Test doubles shared by the inline test modules.

pub(crate) mod spy;
pub(crate) use spy::{Call, Mode, SpyExecutor};

use crate::error::TaskError;
use crate::tasks::{TaskContext, Work};

/// Completes with its value.
pub(crate) struct Value(pub(crate) u32);

impl Work for Value {
    type Output = u32;

    fn name(&self) -> &str {
        "value"
    }

    fn execute(&self, ctx: &TaskContext<u32>) -> Result<(), TaskError> {
        ctx.mark_as_done(Ok(self.0))?;
        Ok(())
    }
}

/// Returns without completing.
pub(crate) struct Idle;

impl Work for Idle {
    type Output = u32;

    fn name(&self) -> &str {
        "idle"
    }

    fn execute(&self, _ctx: &TaskContext<u32>) -> Result<(), TaskError> {
        Ok(())
    }
}

/// Returns an error without completing.
pub(crate) struct Broken(pub(crate) &'static str);

impl Work for Broken {
    type Output = u32;

    fn name(&self) -> &str {
        "broken"
    }

    fn execute(&self, _ctx: &TaskContext<u32>) -> Result<(), TaskError> {
        Err(TaskError::fail(self.0))
    }
}
