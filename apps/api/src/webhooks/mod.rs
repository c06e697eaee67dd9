// Identity-provider webhooks. Only Clerk is wired up.

pub mod clerk;
pub mod handlers;
