
mod continue_scope;
mod gc;
mod liveness;
mod pipeline;
